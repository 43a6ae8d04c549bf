use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod auth;
pub mod comments;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod seeder;
pub mod utils;

use auth::{IdentityProvider, JwtIdentityProvider, TokenIssuer};
use comments::CommentTreeManager;
use config::Config;
use handlers::{
    auth_handlers::{me_handler, signin_handler, signup_handler},
    comment_handlers::{
        create_comment_handler, delete_comment_handler, list_comments_handler, update_comment_handler,
    },
    post_handlers::{
        create_post_handler, delete_post_handler, get_post_handler, list_posts_handler, update_post_handler,
    },
    user_handlers::get_user_handler,
};
use repositories::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_hours);
        let identity = JwtIdentityProvider::new(tokens.clone(), config.demo_token.clone());
        Self {
            store,
            identity: Arc::new(identity),
            tokens,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub fn comments(&self) -> CommentTreeManager {
        CommentTreeManager::new(self.store.clone())
    }
}

pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/signin", post(signin_handler))
        .route("/auth/me", get(me_handler))
        .route("/users/:id", get(get_user_handler))
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route(
            "/posts/:post_id",
            get(get_post_handler).put(update_post_handler).delete(delete_post_handler),
        )
        .route(
            "/posts/:post_id/comments",
            get(list_comments_handler).post(create_comment_handler),
        )
        .route(
            "/posts/:post_id/comments/:comment_id",
            put(update_comment_handler).delete(delete_comment_handler),
        );

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .with_state(app_state)
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
        .layer(cors_layer(config.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!("CORS_ORIGIN is not a valid header value, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

async fn root() -> &'static str {
    "Welcome to the Blog API!"
}
