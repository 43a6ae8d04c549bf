use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{map_pattern_error, PgStore, PostFilter, PostStore, StoreResult};
use crate::models::Post;

/// LIMIT/OFFSET bind as BIGINT; larger windows just return nothing.
fn window_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

const POST_COLUMNS: &str = "id, title, content, author_id, category, created_at, updated_at";

/// Appends the WHERE clause shared by the listing and its count.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    let mut prefix = " WHERE ";
    if let Some(pattern) = &filter.title_pattern {
        builder.push(prefix).push("title ~* ").push_bind(pattern.clone());
        prefix = " AND ";
    }
    if let Some(category) = filter.category {
        builder.push(prefix).push("category = ").push_bind(category);
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: &Post) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, author_id, category, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id)
        .bind(post.category)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn get_post(&self, post_id: Uuid) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(post)
    }

    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<(Vec<Post>, u64)> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_pattern_error)?;

        let mut list_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut list_query, filter);
        list_query
            .push(" ORDER BY created_at DESC, seq DESC LIMIT ")
            .push_bind(window_bound(filter.limit))
            .push(" OFFSET ")
            .push_bind(window_bound(filter.offset));
        let posts = list_query
            .build_query_as::<Post>()
            .fetch_all(self.pool())
            .await
            .map_err(map_pattern_error)?;

        Ok((posts, total.max(0) as u64))
    }

    async fn update_post(&self, post: &Post) -> StoreResult<Option<Post>> {
        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = $1, content = $2, category = $3, updated_at = $4
            WHERE id = $5
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.category)
        .bind(post.updated_at)
        .bind(post.id)
        .fetch_optional(self.pool())
        .await?;
        Ok(updated)
    }

    async fn delete_post(&self, post_id: Uuid) -> StoreResult<u64> {
        // comments go with it through the foreign key cascade
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
