use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    constants::{MAX_POST_CONTENT_LENGTH, MAX_POST_TITLE_LENGTH},
    errors::AppError,
    models::{AuthorSummary, Category, Post, PostDetail, PostPage, PostView},
    repositories::{load_authors, PostFilter},
    utils::{self, normalize_text, ListPostsParams, TextError},
    AppState,
};

#[derive(Deserialize)]
pub struct PostPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    category: Option<String>,
}

struct ValidPost {
    title: String,
    content: String,
    category: Option<Category>,
}

impl PostPayload {
    fn validate(&self) -> Result<ValidPost, AppError> {
        let required = |e: TextError, field: &str| match e {
            TextError::Empty => AppError::invalid("Title and content are required"),
            TextError::TooLong(max) => {
                AppError::invalid(format!("{} exceeds maximum length of {} characters", field, max))
            }
        };
        let title = normalize_text(&self.title, MAX_POST_TITLE_LENGTH).map_err(|e| required(e, "Title"))?;
        let content =
            normalize_text(&self.content, MAX_POST_CONTENT_LENGTH).map_err(|e| required(e, "Content"))?;
        let category = parse_category(self.category.as_deref())?;
        Ok(ValidPost { title, content, category })
    }
}

fn parse_category(raw: Option<&str>) -> Result<Option<Category>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse::<Category>().map(Some).map_err(AppError::InvalidArgument),
        None => Ok(None),
    }
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<PostPayload>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let valid = payload.validate()?;
    let post = Post {
        id: Uuid::new_v4(),
        title: valid.title,
        content: valid.content,
        author_id: user.0,
        category: valid.category.unwrap_or_default(),
        created_at: utils::now(),
        updated_at: None,
    };
    state.store.insert_post(&post).await?;

    info!(post_id = %post.id, author_id = %user.0, "Created post");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<PostPage>, AppError> {
    let title_pattern = match params.search() {
        Some(pattern) => {
            Regex::new(pattern).map_err(|_| AppError::invalid("Invalid search pattern"))?;
            Some(pattern.to_string())
        }
        None => None,
    };
    let filter = PostFilter {
        title_pattern,
        category: parse_category(params.category())?,
        limit: params.limit(),
        offset: params.offset(),
    };
    debug!(?filter, "Listing posts");

    let (posts, total) = state.store.list_posts(&filter).await?;
    let authors = load_authors(state.store.as_ref(), posts.iter().map(|p| p.author_id)).await?;
    let posts = posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .unwrap_or_else(|| AuthorSummary::deleted(post.author_id));
            PostView { post, author }
        })
        .collect();

    Ok(Json(PostPage {
        posts,
        total_pages: params.total_pages(total),
    }))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<PostDetail>, AppError> {
    let post = state
        .store
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    let author = state
        .store
        .get_user(post.author_id)
        .await?
        .map(|user| AuthorSummary::from(&user))
        .unwrap_or_else(|| AuthorSummary::deleted(post.author_id));
    let comments = state.comments().get_comments_for_post(post_id).await?;

    Ok(Json(PostDetail {
        post,
        author,
        comments: comments.into_roots(),
    }))
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<PostPayload>,
) -> Result<Json<Post>, AppError> {
    // Fetch post to check ownership
    let existing = state
        .store
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    if existing.author_id != user.0 {
        return Err(AppError::forbidden());
    }

    let valid = payload.validate()?;
    let changed = Post {
        title: valid.title,
        content: valid.content,
        category: valid.category.unwrap_or(existing.category),
        updated_at: Some(utils::now()),
        ..existing
    };
    let post = state
        .store
        .update_post(&changed)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;

    info!(post_id = %post_id, "Updated post");
    Ok(Json(post))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<StatusCode, AppError> {
    let existing = state
        .store
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post"))?;
    if existing.author_id != user.0 {
        return Err(AppError::forbidden());
    }

    state.store.delete_post(post_id).await?;
    info!(post_id = %post_id, "Deleted post and its comments");
    Ok(StatusCode::NO_CONTENT)
}
