/// Keeper Service Main Entry Point
///
/// Starts, in one process:
/// - HTTP API server (axum)
/// - gRPC server (tonic) with the standard health service
///
/// Storage is PostgreSQL when `DATABASE_URL` is set, in-memory otherwise.
use anyhow::{Context, Result};
use crypto_core::GrpcCorrelationExtractor;
use keeper_service::{
    config::Settings,
    db::{
        CredentialStore, MemoryStore, PostgresCredentialStore, PostgresUserDirectory,
        UserDirectory,
    },
    grpc::{keeper::vault::keeper_service_server::KeeperServiceServer, KeeperGrpcServer},
    http::{start_http_server, HttpServerState},
    security::{PasswordHasher, TokenService},
    KeeperOperations, KeeperService,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::watch};
use tonic::transport::Server;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "keeper_service=info,info".into()),
        )
        .with_target(false)
        .json()
        .init();

    info!("Starting Keeper Service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let tokens = Arc::new(
        TokenService::new(settings.jwt.secret.as_bytes())
            .context("Failed to initialize token service")?,
    );
    let hasher = Arc::new(
        PasswordHasher::new(settings.password_hash)
            .context("Failed to initialize password hasher")?,
    );
    info!("Token service and password hasher initialized");

    let (users, credentials): (Arc<dyn UserDirectory>, Arc<dyn CredentialStore>) =
        match &settings.database.url {
            Some(url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.database.max_connections)
                    .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
                    .connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?;

                info!(
                    "Database pool initialized with {} max connections",
                    settings.database.max_connections
                );

                // Run database migrations
                sqlx::migrate!("./migrations")
                    .run(&db_pool)
                    .await
                    .context("Failed to run database migrations")?;
                info!("Database migrations completed");

                let users: Arc<dyn UserDirectory> =
                    Arc::new(PostgresUserDirectory::new(db_pool.clone()));
                let credentials: Arc<dyn CredentialStore> =
                    Arc::new(PostgresCredentialStore::new(db_pool));
                (users, credentials)
            }
            None => {
                warn!("DATABASE_URL not configured; running with in-memory storage");
                let store = Arc::new(MemoryStore::new());
                let users: Arc<dyn UserDirectory> = store.clone();
                let credentials: Arc<dyn CredentialStore> = store;
                (users, credentials)
            }
        };

    let keeper: Arc<dyn KeeperOperations> = Arc::new(KeeperService::new(
        users,
        credentials,
        hasher,
        Arc::clone(&tokens),
    ));

    // One signal fans out to both servers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let http_state = HttpServerState {
        keeper: Arc::clone(&keeper),
        session_ttl: time::Duration::seconds(tokens.validity().num_seconds()),
        cookie_secure: settings.server.cookie_secure,
    };
    let http_server = start_http_server(
        http_state,
        &settings.server.host,
        settings.server.http_port,
        wait_for_shutdown(shutdown_rx.clone()),
    );

    let grpc_addr = format!("{}:{}", settings.server.host, settings.server.grpc_port)
        .parse()
        .context("Invalid gRPC server address")?;

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<KeeperServiceServer<KeeperGrpcServer>>()
        .await;

    info!("Starting gRPC server on {}", grpc_addr);

    let grpc_server = async {
        Server::builder()
            .add_service(health_service)
            .add_service(KeeperServiceServer::with_interceptor(
                KeeperGrpcServer::new(keeper),
                GrpcCorrelationExtractor,
            ))
            .serve_with_shutdown(grpc_addr, wait_for_shutdown(shutdown_rx))
            .await
            .context("gRPC server error")
    };

    tokio::try_join!(http_server, grpc_server)?;

    info!("Keeper service shutdown complete");

    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutting down gracefully...");
}
