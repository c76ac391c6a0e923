use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use marquee_core::SeatStatus;

/// One seat of a show's hall with its status as of the read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatAvailability {
    pub id: i64,
    pub row: String,
    pub number: i32,
    pub category: String,
    pub price: f64,
    pub status: SeatStatus,
}

/// The caller has until `expires_at` to confirm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldReceipt {
    pub booking_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationReceipt {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub movie_title: String,
    /// Seat labels in the order they were held, e.g. `["A1", "A2"]`.
    pub seats: Vec<String>,
}

/// A confirmed booking as listed under "my bookings".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSummary {
    pub booking_id: Uuid,
    pub booking_code: String,
    pub movie_title: String,
    pub seats: Vec<String>,
    pub created_at: DateTime<Utc>,
}
