use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthorSummary, Category, Comment, Post, User};

pub mod comment_repository;
pub mod memory;
pub mod post_repository;
pub mod user_repository;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter and window for a post listing.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Case-insensitive regular expression matched against titles.
    pub title_pattern: Option<String>,
    pub category: Option<Category>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &Post) -> StoreResult<()>;
    async fn get_post(&self, post_id: Uuid) -> StoreResult<Option<Post>>;
    /// Returns the requested window, newest first, and the total number of matches.
    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<(Vec<Post>, u64)>;
    /// Overwrites title, content, category and `updated_at`. `None` if the post is gone.
    async fn update_post(&self, post: &Post) -> StoreResult<Option<Post>>;
    /// Deletes the post and every comment on it. Returns the number of posts removed.
    async fn delete_post(&self, post_id: Uuid) -> StoreResult<u64>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn get_comment(&self, comment_id: Uuid) -> StoreResult<Option<Comment>>;
    /// All comments of a post in creation order.
    async fn list_comments_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>>;
    /// Replaces the content and marks the comment edited. `None` if the comment is gone.
    async fn update_comment_content(
        &self,
        comment_id: Uuid,
        content: &str,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<Option<Comment>>;
    /// Removes exactly the given comments. Returns how many existed.
    async fn delete_comments(&self, comment_ids: &[Uuid]) -> StoreResult<u64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Duplicate("email")` when the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Batch lookup; unknown ids are skipped.
    async fn get_users(&self, user_ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

/// Everything the API needs from persistence.
pub trait Store: PostStore + CommentStore + UserStore {}

impl<T: PostStore + CommentStore + UserStore> Store for T {}

/// Resolves author ids to display summaries with one batch lookup. Unknown ids are absent.
pub async fn load_authors<S: UserStore + ?Sized>(
    users: &S,
    author_ids: impl IntoIterator<Item = Uuid>,
) -> StoreResult<HashMap<Uuid, AuthorSummary>> {
    let unique: Vec<Uuid> = author_ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
    let found = users.get_users(&unique).await?;
    Ok(found
        .iter()
        .map(|user| (user.id, AuthorSummary::from(user)))
        .collect())
}

/// Postgres-backed store. The query implementations live in the `*_repository` modules.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub fn make_store(pool: Option<PgPool>) -> Arc<dyn Store> {
    match pool {
        Some(pool) => {
            tracing::info!("Using Postgres store");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

// SQLSTATE invalid_regular_expression
const INVALID_REGULAR_EXPRESSION: &str = "2201B";

/// Maps a search pattern Postgres refuses to compile to `StoreError::InvalidQuery`.
/// Its regex dialect differs from the `regex` crate, so a pattern validated up front
/// can still be rejected here.
pub(crate) fn map_pattern_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some(INVALID_REGULAR_EXPRESSION) =>
        {
            StoreError::InvalidQuery(db_err.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// Maps a unique-constraint violation to `StoreError::Duplicate`.
pub(crate) fn map_unique_violation(err: sqlx::Error, field: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate(field),
        _ => StoreError::Database(err),
    }
}
