use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use marquee_booking::ReservationEngine;
use marquee_shared::ReservationEvent;
use marquee_store::RedisClient;

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReservationEngine>,
    /// Same channel the engine publishes to; stream handlers subscribe here.
    pub sse_tx: broadcast::Sender<ReservationEvent>,
    pub rate_limit: Option<RateLimit>,
    /// Cancelled at shutdown; ends every open seat stream.
    pub shutdown: CancellationToken,
}
