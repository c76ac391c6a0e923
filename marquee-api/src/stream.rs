use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::stream::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use marquee_shared::ReservationEvent;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/shows/{show_id}/stream", get(show_stream))
}

/// Seat-map change notifications for one show. Events carry identifiers only;
/// clients re-read `/api/seats` to learn the new statuses.
async fn show_stream(
    State(state): State<AppState>,
    Path(show_id): Path<i64>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.engine.show(show_id).await?.is_none() {
        return Err(AppError::NotFoundError(format!("Unknown show {}", show_id)));
    }

    debug!(show_id, "Seat stream subscribed");
    let rx = state.sse_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            // Sweeps are not show-scoped, so every subscriber hears them
            Ok(event) if event.show_id().map_or(true, |id| id == show_id) => to_sse(&event),
            Ok(_) => None,
            Err(e) => {
                warn!(show_id, "Seat stream lagged: {}", e);
                None
            }
        }
    });
    // The event channel outlives the server, so streams stop on shutdown instead
    let stream = stream.take_until(state.shutdown.clone().cancelled_owned());

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse(event: &ReservationEvent) -> Option<Result<Event, Infallible>> {
    Event::default()
        .event(event.name())
        .json_data(event)
        .ok()
        .map(Ok)
}
