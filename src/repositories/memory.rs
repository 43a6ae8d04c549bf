use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use regex::RegexBuilder;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::{CommentStore, PostFilter, PostStore, StoreError, StoreResult, UserStore};
use crate::models::{Comment, Post, User};

/// Record plus its insertion sequence, used to break timestamp ties.
#[derive(Debug, Clone)]
struct Sequenced<T> {
    seq: u64,
    record: T,
}

/// Process-local store for tests and demo runs. Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<Uuid, User>>,
    user_ids_by_email: Arc<DashMap<String, Uuid>>,
    posts: Arc<DashMap<Uuid, Sequenced<Post>>>,
    comments: Arc<DashMap<Uuid, Sequenced<Comment>>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        let seq = self.next_seq();
        self.posts.insert(post.id, Sequenced { seq, record: post.clone() });
        Ok(())
    }

    async fn get_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.posts.get(&post_id).map(|entry| entry.record.clone()))
    }

    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<(Vec<Post>, u64)> {
        let pattern = match &filter.title_pattern {
            Some(pattern) => Some(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| StoreError::InvalidQuery(e.to_string()))?,
            ),
            None => None,
        };

        let mut matching: Vec<Sequenced<Post>> = self
            .posts
            .iter()
            .filter(|entry| {
                let post = &entry.record;
                filter.category.map_or(true, |c| post.category == c)
                    && pattern.as_ref().map_or(true, |re| re.is_match(&post.title))
            })
            .map(|entry| entry.value().clone())
            .collect();

        matching.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matching.len() as u64;
        let posts = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .map(|s| s.record)
            .collect();
        Ok((posts, total))
    }

    async fn update_post(&self, post: &Post) -> StoreResult<Option<Post>> {
        Ok(self.posts.get_mut(&post.id).map(|mut entry| {
            let stored = &mut entry.record;
            stored.title = post.title.clone();
            stored.content = post.content.clone();
            stored.category = post.category;
            stored.updated_at = post.updated_at;
            stored.clone()
        }))
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<u64> {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.record.post_id != post_id);
        }
        Ok(removed as u64)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        let seq = self.next_seq();
        self.comments
            .insert(comment.id, Sequenced { seq, record: comment.clone() });
        Ok(())
    }

    async fn get_comment(&self, comment_id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.comments.get(&comment_id).map(|entry| entry.record.clone()))
    }

    async fn list_comments_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let mut comments: Vec<Sequenced<Comment>> = self
            .comments
            .iter()
            .filter(|entry| entry.record.post_id == post_id)
            .map(|entry| entry.value().clone())
            .collect();
        comments.sort_by(|a, b| {
            a.record
                .created_at
                .cmp(&b.record.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        Ok(comments.into_iter().map(|s| s.record).collect())
    }

    async fn update_comment_content(
        &self,
        comment_id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Comment>> {
        Ok(self.comments.get_mut(&comment_id).map(|mut entry| {
            let stored = &mut entry.record;
            stored.content = content.to_string();
            stored.is_edited = true;
            stored.updated_at = updated_at;
            stored.clone()
        }))
    }

    async fn delete_comments(&self, comment_ids: &[Uuid]) -> StoreResult<u64> {
        let unique: HashSet<&Uuid> = comment_ids.iter().collect();
        let removed = unique
            .into_iter()
            .filter(|id| self.comments.remove(*id).is_some())
            .count();
        Ok(removed as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        match self.user_ids_by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("email")),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(())
            }
        }
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user_id = match self.user_ids_by_email.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_user(user_id).await
    }

    async fn get_users(&self, user_ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.clone()))
            .collect())
    }
}
