use axum::{http::Method, Router};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod bookings;
pub mod error;
pub mod health;
pub mod holds;
pub mod middleware;
pub mod movies;
pub mod seats;
pub mod state;
pub mod stream;

pub use state::{AppState, RateLimit};

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let mut router = Router::new()
        .merge(health::routes())
        .merge(movies::routes())
        .merge(seats::routes())
        .merge(holds::routes())
        .merge(bookings::routes())
        .merge(stream::routes());

    // Needs ConnectInfo, so only installed when serving with a limiter configured
    if state.rate_limit.is_some() {
        router = router.layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router` until `shutdown` is cancelled, then drain open requests for
/// at most `grace` before returning.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
    grace: Duration,
) -> std::io::Result<()> {
    let server = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();

    let deadline = async {
        shutdown.cancelled().await;
        info!("Draining requests...");
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result,
        _ = deadline => {
            warn!("Requests still open after {:?}, dropping them", grace);
            Ok(())
        }
    }
}
