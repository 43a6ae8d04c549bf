use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{hash_password, verify_password, AuthenticatedUser},
    constants::MIN_PASSWORD_LENGTH,
    errors::AppError,
    models::{AuthResponse, User, UserProfile},
    repositories::StoreError,
    utils, AppState,
};

#[derive(Deserialize)]
pub struct SignUpPayload {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct SignInPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Emails are matched case-insensitively.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue_response(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let token = state.tokens.issue(user).map_err(|e| {
        error!(user_id = %user.id, error = %e, "Failed to sign token");
        AppError::Internal(e.to_string())
    })?;
    Ok(AuthResponse {
        token,
        user: UserProfile::from(user),
    })
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignUpPayload>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = payload.name.trim().to_string();
    let email = normalize_email(&payload.email);
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(AppError::invalid("Name, email and password are required"));
    }
    if !email.contains('@') {
        return Err(AppError::invalid("Invalid email address"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let cost = state.bcrypt_cost;
    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash,
        created_at: utils::now(),
    };
    match state.store.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => {
            warn!(email = %user.email, "Sign-up with registered email");
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, "Registered user");
    Ok((StatusCode::CREATED, Json(issue_response(&state, &user)?)))
}

pub async fn signin_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignInPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let rejected = || AppError::Unauthenticated("Invalid email or password".to_string());

    let user = state
        .store
        .get_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or_else(rejected)?;

    let password = payload.password;
    let password_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !matches {
        return Err(rejected());
    }

    info!(user_id = %user.id, "User signed in");
    Ok(Json(issue_response(&state, &user)?))
}

pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .store
        .get_user(user.0)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(UserProfile::from(&user)))
}
