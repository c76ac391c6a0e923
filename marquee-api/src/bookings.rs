use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ConfirmBookingRequest {
    booking_id: Uuid,
}

#[derive(Debug, Serialize)]
struct ConfirmBookingResponse {
    status: &'static str,
    booking_code: String,
    movie_title: String,
    seats: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MyBookingsQuery {
    user_email: String,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: Uuid,
    booking_code: String,
    movie_title: String,
    seats: Vec<String>,
    date: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/confirm-booking", post(confirm_booking))
        .route("/api/my-bookings", get(my_bookings))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Json(req): Json<ConfirmBookingRequest>,
) -> Result<Json<ConfirmBookingResponse>, AppError> {
    let receipt = state.engine.confirm_hold(req.booking_id).await?;

    Ok(Json(ConfirmBookingResponse {
        status: "confirmed",
        booking_code: receipt.booking_code,
        movie_title: receipt.movie_title,
        seats: receipt.seats,
    }))
}

async fn my_bookings(
    State(state): State<AppState>,
    Query(query): Query<MyBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state.engine.list_bookings(&query.user_email).await?;

    Ok(Json(
        bookings
            .into_iter()
            .map(|b| BookingResponse {
                booking_id: b.booking_id,
                booking_code: b.booking_code,
                movie_title: b.movie_title,
                seats: b.seats,
                date: b.created_at,
            })
            .collect(),
    ))
}
