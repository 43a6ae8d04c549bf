use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::AppError,
    models::{Comment, CommentNode},
    AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentPayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateCommentPayload {
    #[serde(default)]
    content: String,
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<CommentNode>>, AppError> {
    let tree = state.comments().get_comments_for_post(post_id).await?;
    Ok(Json(tree.into_roots()))
}

pub async fn create_comment_handler(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCommentPayload>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let comment = state
        .comments()
        .create_comment(post_id, user.0, &payload.content, payload.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment_handler(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateCommentPayload>,
) -> Result<Json<Comment>, AppError> {
    let comments = state.comments();
    ensure_on_post(&comments.get_comment(comment_id).await?, post_id)?;

    let comment = comments.edit_comment(comment_id, user.0, &payload.content).await?;
    Ok(Json(comment))
}

pub async fn delete_comment_handler(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> Result<StatusCode, AppError> {
    let comments = state.comments();
    ensure_on_post(&comments.get_comment(comment_id).await?, post_id)?;

    comments.delete_comment(comment_id, user.0).await?;
    Ok(StatusCode::NO_CONTENT)
}

// A comment addressed through the wrong post does not exist at that path.
fn ensure_on_post(comment: &Comment, post_id: Uuid) -> Result<(), AppError> {
    if comment.post_id != post_id {
        return Err(AppError::not_found("Comment"));
    }
    Ok(())
}
