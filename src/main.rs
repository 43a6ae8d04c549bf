use std::net::SocketAddr;

use blog_server::config::{Config, StorageBackend};
use blog_server::repositories::make_store;
use blog_server::{create_router, seeder, AppState};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,blog_server=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(&config.database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Database connection pool established, migrations applied");
            Some(pool)
        }
        StorageBackend::Memory => None,
    };
    let store = make_store(pool);

    // DEMO_TOKEN signs in as the demo user
    if config.demo_token.is_some() {
        seeder::seed_demo_user(store.as_ref(), config.bcrypt_cost).await?;
    }

    let app = create_router(AppState::new(store, &config), &config);

    let addr = SocketAddr::new(config.bind_address, config.http_port);
    info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
