use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser, errors::AppError, models::UserProfile, AppState,
};

pub async fn get_user_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(UserProfile::from(&user)))
}
