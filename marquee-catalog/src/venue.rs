use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    /// Running time in minutes
    pub duration: i32,
    pub poster_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hall {
    pub id: i64,
    pub name: String,
    pub total_rows: i32,
    pub total_cols: i32,
}

/// A screening of a movie in a hall. The hall's seat map is the unit of contention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: i64,
    pub movie_id: i64,
    pub hall_id: i64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatCategory {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

/// Physical seat. Immutable once the catalog is set up; bookings only reference it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seat {
    pub id: i64,
    pub hall_id: i64,
    pub row_label: String,
    pub number: i32,
    pub category_id: i64,
}

impl Seat {
    pub fn label(&self) -> String {
        format!("{}{}", self.row_label, self.number)
    }
}

/// Seat joined with its category, as served to the status resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatDetails {
    pub id: i64,
    pub hall_id: i64,
    pub row_label: String,
    pub number: i32,
    pub category: String,
    pub price: f64,
}

impl SeatDetails {
    pub fn label(&self) -> String {
        format!("{}{}", self.row_label, self.number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieListing {
    pub id: i64,
    pub title: String,
    pub duration: i32,
    pub poster_url: String,
    pub show_id: i64,
}
