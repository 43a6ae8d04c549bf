use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CommentStore, PgStore, StoreResult};
use crate::models::Comment;

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, content, author_id, post_id, parent_id, created_at, updated_at, is_edited)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(comment.id)
        .bind(&comment.content)
        .bind(comment.author_id)
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .bind(comment.is_edited)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn get_comment(&self, comment_id: Uuid) -> StoreResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, author_id, post_id, parent_id, created_at, updated_at, is_edited
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(comment_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(comment)
    }

    async fn list_comments_for_post(&self, post_id: Uuid) -> StoreResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, author_id, post_id, parent_id, created_at, updated_at, is_edited
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await?;
        Ok(comments)
    }

    async fn update_comment_content(
        &self,
        comment_id: Uuid,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Comment>> {
        let updated = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $1, is_edited = TRUE, updated_at = $2
            WHERE id = $3
            RETURNING id, content, author_id, post_id, parent_id, created_at, updated_at, is_edited
            "#,
        )
        .bind(content)
        .bind(updated_at)
        .bind(comment_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(updated)
    }

    async fn delete_comments(&self, comment_ids: &[Uuid]) -> StoreResult<u64> {
        if comment_ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
            .bind(comment_ids)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
