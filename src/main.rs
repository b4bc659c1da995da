// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use placement_backend::config::Config;
use placement_backend::models::user::NewUser;
use placement_backend::routes;
use placement_backend::services::feedback::provider_from_config;
use placement_backend::state::{AppState, SharedStore};
use placement_backend::store::{MemoryStore, PgStore, UserStore};
use placement_backend::utils::hash::hash_password;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await;

            tracing::info!("Running migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations applied successfully.");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new())
        }
    };

    // Seed Admin User
    if let Err(e) = seed_admin_user(&store, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let feedback = provider_from_config(&config);
    let state = AppState::new(store, config.clone(), feedback);

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

/// Connects to Postgres, retrying while the database comes up.
async fn connect_with_retry(database_url: &str) -> PgPool {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                tracing::info!("Database connected...");
                return pool;
            }
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}

async fn seed_admin_user(store: &SharedStore, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
        let email = email.trim().to_lowercase();
        if store.find_user_by_email(&email).await?.is_none() {
            tracing::info!("Seeding admin user: {}", email);
            let hashed_password = hash_password(password)?;

            store
                .create_user(NewUser {
                    email,
                    name: "Administrator".to_string(),
                    password: hashed_password,
                    role: "admin".to_string(),
                })
                .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
