use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct HoldSeatsRequest {
    show_id: i64,
    seat_ids: Vec<i64>,
    user_email: String,
}

#[derive(Debug, Serialize)]
struct HoldSeatsResponse {
    booking_id: Uuid,
    expires_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/hold-seats", post(hold_seats))
}

async fn hold_seats(
    State(state): State<AppState>,
    Json(req): Json<HoldSeatsRequest>,
) -> Result<Json<HoldSeatsResponse>, AppError> {
    let receipt = state
        .engine
        .create_hold(req.show_id, &req.seat_ids, &req.user_email)
        .await?;

    Ok(Json(HoldSeatsResponse {
        booking_id: receipt.booking_id,
        expires_at: receipt.expires_at,
    }))
}
