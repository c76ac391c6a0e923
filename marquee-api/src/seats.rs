use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use marquee_booking::SeatAvailability;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    show_id: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/seats", get(show_seats))
}

/// Seat map of a show, recomputed from the ledger on every call.
async fn show_seats(
    State(state): State<AppState>,
    Query(query): Query<SeatsQuery>,
) -> Result<Json<Vec<SeatAvailability>>, AppError> {
    let now = state.engine.now();
    Ok(Json(state.engine.resolve_status(query.show_id, now).await?))
}
