use thiserror::Error;
use tracing::info;

use crate::auth::{hash_password, DEMO_USER_EMAIL, DEMO_USER_ID, DEMO_USER_NAME, DEMO_USER_PASSWORD};
use crate::models::User;
use crate::repositories::{StoreError, UserStore};
use crate::utils;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to hash demo password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Ensure the demo account exists.
///
/// Idempotent: returns `false` when the account (or another account with its
/// email) is already present.
pub async fn seed_demo_user<S: UserStore + ?Sized>(store: &S, bcrypt_cost: u32) -> Result<bool, SeedError> {
    if store.get_user(DEMO_USER_ID).await?.is_some() {
        info!("Demo user already present");
        return Ok(false);
    }

    let user = User {
        id: DEMO_USER_ID,
        name: DEMO_USER_NAME.to_string(),
        email: DEMO_USER_EMAIL.to_string(),
        password_hash: hash_password(DEMO_USER_PASSWORD, bcrypt_cost)?,
        created_at: utils::now(),
    };
    match store.insert_user(&user).await {
        Ok(()) => {
            info!(user_id = %DEMO_USER_ID, "Created demo user");
            Ok(true)
        }
        Err(StoreError::Duplicate(_)) => {
            info!(email = DEMO_USER_EMAIL, "Demo email already registered");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}
