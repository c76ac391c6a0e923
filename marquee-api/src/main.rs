use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use marquee_api::{app, serve, AppState, RateLimit};
use marquee_booking::ReservationEngine;
use marquee_catalog::{CatalogRepository, SeatCatalog};
use marquee_core::{Clock, RandomCodeGenerator, ReservationLedger, SystemClock};
use marquee_store::app_config::Config;
use marquee_store::{DbClient, MemoryLedger, PgCatalogRepository, PgReservationLedger, RedisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,marquee_booking=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    info!("Starting Marquee API on port {}", config.server.port);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Store
    let (db, catalog, ledger) = match &config.database {
        Some(db_config) => {
            let db = DbClient::new(db_config).await.context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            let catalog: Arc<dyn CatalogRepository> = Arc::new(PgCatalogRepository::new(db.pool.clone()));
            let ledger: Arc<dyn ReservationLedger> = Arc::new(PgReservationLedger::new(db.pool.clone()));
            (Some(db), catalog, ledger)
        }
        None => {
            warn!("No database configured, holds live in memory with the sample venue");
            let catalog: Arc<dyn CatalogRepository> = Arc::new(SeatCatalog::sample(clock.now()));
            let ledger: Arc<dyn ReservationLedger> = Arc::new(MemoryLedger::new());
            (None, catalog, ledger)
        }
    };

    // Redis, for rate limiting only
    let rate_limit = match &config.redis {
        Some(redis_config) => {
            let redis = RedisClient::new(&redis_config.url)
                .await
                .context("Failed to connect to Redis")?;
            Some(RateLimit {
                redis: Arc::new(redis),
                per_minute: redis_config.rate_limit_per_minute,
            })
        }
        None => None,
    };

    // SSE Broadcast Channel
    let (sse_tx, _) = tokio::sync::broadcast::channel(100);

    let engine = Arc::new(
        ReservationEngine::new(catalog, ledger, clock, Arc::new(RandomCodeGenerator))
            .with_events(sse_tx.clone()),
    );

    let shutdown = CancellationToken::new();
    let sweeper = engine
        .sweeper()
        .spawn(config.reservation.sweep_interval(), shutdown.clone());

    let app = app(AppState {
        engine,
        sse_tx,
        rate_limit,
        shutdown: shutdown.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        signal.cancel();
    });

    let grace = config.server.shutdown_grace();
    serve(listener, app, shutdown.clone(), grace)
        .await
        .context("Server error")?;

    // The sweeper finishes any pass in flight before it exits
    shutdown.cancel();
    match tokio::time::timeout(grace, sweeper).await {
        Ok(Ok(())) => info!("Expiry sweeper stopped"),
        Ok(Err(e)) => error!("Expiry sweeper task failed: {}", e),
        Err(_) => warn!("Expiry sweeper still running after {:?}, abandoning it", grace),
    }

    if let Some(db) = db {
        db.close().await;
    }

    info!("Marquee API shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
