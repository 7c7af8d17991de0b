use std::{net::SocketAddr, sync::Arc};

use gym_member_service::{
    adapters::{
        database::{memory::MemoryDatabase, postgres::PostgresDatabase},
        storage::{memory::MemoryStorage, supabase::SupabaseStorage},
    },
    commands::DomainLogic,
    config::Config,
    http::{self, AppState, SharedDatabase, SharedStorage},
};
use tokio::net::TcpListener;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gym_member_service=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let database: Arc<SharedDatabase> = match &config.database_url {
        Some(database_url) => {
            let database =
                PostgresDatabase::connect(database_url, config.database_max_connections).await?;
            tracing::info!("using PostgreSQL member store");
            Arc::new(database)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, members are kept in memory");
            Arc::new(MemoryDatabase::default())
        }
    };

    let storage: Arc<SharedStorage> = match &config.storage {
        Some(storage) => {
            tracing::info!(bucket = %config.avatar_bucket, "using Supabase Storage for photos");
            Arc::new(SupabaseStorage::new(
                reqwest::Client::new(),
                &storage.url,
                &storage.service_role_key,
                &config.avatar_bucket,
            ))
        }
        None => {
            tracing::warn!("SUPABASE_URL not set, photos are kept in memory");
            Arc::new(MemoryStorage::new(&config.avatar_bucket))
        }
    };

    let app = http::router(AppState::new(DomainLogic::new(database, storage)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
