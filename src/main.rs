use affils_service::{
    auth::user::ensure_admin,
    config::Config,
    database::setup_database,
    router::{create_router, shutdown_signal},
};
use axum_login::tower_sessions::ExpiredDeletion;
use tokio::net::TcpListener;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (db, pool) = setup_database(&config.database_url).await?;

    let session_store = PostgresStore::new(pool);
    session_store.migrate().await?;

    let deletion_task = tokio::task::spawn(
        session_store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(60)),
    );

    match config.admin_credentials() {
        Some((username, password)) => {
            ensure_admin(&db, username, password).await?;
        }
        None => warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; no admin account bootstrapped"),
    }

    let app = create_router(db, &config, session_store).await?;

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(deletion_task.abort_handle()))
        .await?;

    // The deletion task is aborted on shutdown.
    match deletion_task.await {
        Ok(result) => result?,
        Err(err) if err.is_cancelled() => {}
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
