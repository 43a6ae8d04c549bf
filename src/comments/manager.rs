use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::tree::{depth_of, subtree_ids, CommentTree};
use crate::constants::{MAX_COMMENT_CONTENT_LENGTH, MAX_COMMENT_DEPTH};
use crate::errors::AppError;
use crate::models::Comment;
use crate::repositories::{load_authors, Store};
use crate::utils::{self, normalize_text, TextError};

/// Owns the comment lifecycle on a post: validated creation, author-only edits,
/// cascading deletes and nested retrieval.
///
/// Holds no state of its own beyond the store handle; every call works on a fresh
/// read of the post's comments.
#[derive(Clone)]
pub struct CommentTreeManager {
    store: Arc<dyn Store>,
    max_depth: usize,
}

impl CommentTreeManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            max_depth: MAX_COMMENT_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Comment, AppError> {
        let content = comment_content(content)?;

        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        if let Some(parent_id) = parent_id {
            let parent = self
                .store
                .get_comment(parent_id)
                .await?
                .ok_or_else(|| AppError::not_found("Parent comment"))?;
            if parent.post_id != post_id {
                return Err(AppError::invalid("Parent comment belongs to a different post"));
            }

            let siblings = self.store.list_comments_for_post(post_id).await?;
            let parent_depth = depth_of(parent.id, &siblings, self.max_depth)?;
            if parent_depth + 1 >= self.max_depth {
                return Err(AppError::invalid(format!(
                    "Replies cannot be nested more than {} levels deep",
                    self.max_depth
                )));
            }
        }

        let now = utils::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            content,
            author_id,
            post_id,
            parent_id,
            created_at: now,
            updated_at: now,
            is_edited: false,
        };
        self.store.insert_comment(&comment).await?;

        info!(comment_id = %comment.id, post_id = %post_id, parent_id = ?parent_id, "Created comment");
        Ok(comment)
    }

    pub async fn get_comment(&self, comment_id: Uuid) -> Result<Comment, AppError> {
        self.store
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    pub async fn edit_comment(
        &self,
        comment_id: Uuid,
        requester_id: Uuid,
        new_content: &str,
    ) -> Result<Comment, AppError> {
        let existing = self.get_comment(comment_id).await?;
        if existing.author_id != requester_id {
            return Err(AppError::forbidden());
        }
        let content = comment_content(new_content)?;

        let updated = self
            .store
            .update_comment_content(comment_id, &content, utils::now())
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))?;

        info!(comment_id = %comment_id, "Edited comment");
        Ok(updated)
    }

    /// Deletes the comment and all replies below it. Returns how many comments were removed.
    pub async fn delete_comment(&self, comment_id: Uuid, requester_id: Uuid) -> Result<u64, AppError> {
        let existing = self.get_comment(comment_id).await?;
        if existing.author_id != requester_id {
            return Err(AppError::forbidden());
        }

        let comments = self.store.list_comments_for_post(existing.post_id).await?;
        let doomed = subtree_ids(comment_id, &comments);
        let removed = self.store.delete_comments(&doomed).await?;

        info!(comment_id = %comment_id, removed, "Deleted comment subtree");
        Ok(removed)
    }

    /// Rebuilds the reply tree of a post from one read of its comments.
    pub async fn get_comments_for_post(&self, post_id: Uuid) -> Result<CommentTree, AppError> {
        if self.store.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        let comments = self.store.list_comments_for_post(post_id).await?;
        if comments.is_empty() {
            return Ok(CommentTree::default());
        }

        let authors = load_authors(self.store.as_ref(), comments.iter().map(|c| c.author_id)).await?;

        debug!(post_id = %post_id, comments = comments.len(), "Building comment tree");
        Ok(CommentTree::build_with_limit(comments, &authors, self.max_depth)?)
    }
}

fn comment_content(content: &str) -> Result<String, AppError> {
    normalize_text(content, MAX_COMMENT_CONTENT_LENGTH).map_err(|e| match e {
        TextError::Empty => AppError::invalid("Content is required"),
        TextError::TooLong(max) => {
            AppError::invalid(format!("Content exceeds maximum length of {} characters", max))
        }
    })
}
