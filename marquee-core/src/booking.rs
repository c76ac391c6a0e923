use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

/// How long an unconfirmed hold keeps its seats.
pub const HOLD_TTL_SECONDS: i64 = 300;

pub fn hold_ttl() -> Duration {
    Duration::seconds(HOLD_TTL_SECONDS)
}

/// Bookings created after this instant are still inside the TTL window at `now`.
pub fn live_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - hold_ttl()
}

/// The instant a hold created at `created_at` stops being live.
pub fn expires_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + hold_ttl()
}

/// A hold is live while it is `HELD` and younger than the TTL.
pub fn is_live_hold(status: BookingStatus, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == BookingStatus::Held && created_at > live_cutoff(now)
}

/// Whether a booking currently keeps its seats away from everyone else.
///
/// This is the one predicate shared by the status resolver, the hold conflict
/// check and the confirmation check. SQL stores express it as
/// `status = 'CONFIRMED' OR (status = 'HELD' AND created_at > live_cutoff(now))`.
pub fn claims_seats(status: BookingStatus, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == BookingStatus::Confirmed || is_live_hold(status, created_at, now)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Held,
    Confirmed,
    Expired,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Held => "HELD",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Expired => "EXPIRED",
        }
    }

    /// `CONFIRMED` and `EXPIRED` never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Expired)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HELD" => Ok(BookingStatus::Held),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "EXPIRED" => Ok(BookingStatus::Expired),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Seat availability as seen by clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
}

impl SeatStatus {
    /// Status a single booking imposes on the seats it references, as of `now`.
    pub fn imposed_by(status: BookingStatus, created_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        match status {
            BookingStatus::Confirmed => SeatStatus::Sold,
            BookingStatus::Held if is_live_hold(status, created_at, now) => SeatStatus::Held,
            _ => SeatStatus::Available,
        }
    }

    /// Precedence when several bookings reference one seat: sold beats held beats available.
    pub fn strongest(self, other: SeatStatus) -> SeatStatus {
        fn rank(s: SeatStatus) -> u8 {
            match s {
                SeatStatus::Available => 0,
                SeatStatus::Held => 1,
                SeatStatus::Sold => 2,
            }
        }
        if rank(other) > rank(self) { other } else { self }
    }
}

/// A hold or booking. One record covers both lifecycle phases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub show_id: i64,
    pub contact: String,
    pub status: BookingStatus,
    /// Assigned at creation, meaningful once confirmed.
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
    /// Fixed at creation, in request order.
    pub seat_ids: Vec<i64>,
}

impl Booking {
    pub fn expires_at(&self) -> DateTime<Utc> {
        expires_at(self.created_at)
    }

    pub fn is_live_hold(&self, now: DateTime<Utc>) -> bool {
        is_live_hold(self.status, self.created_at, now)
    }

    pub fn claims_seats(&self, now: DateTime<Utc>) -> bool {
        claims_seats(self.status, self.created_at, now)
    }

    /// Stale holds are `HELD` records the sweeper may move to `EXPIRED`.
    pub fn is_stale_hold(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Held && !self.is_live_hold(now)
    }
}

/// A hold about to be written. Built by the hold engine after validation.
#[derive(Debug, Clone)]
pub struct NewHold {
    pub id: Uuid,
    pub show_id: i64,
    pub contact: String,
    pub confirmation_code: String,
    pub created_at: DateTime<Utc>,
    pub seat_ids: Vec<i64>,
}

impl NewHold {
    pub fn into_booking(self) -> Booking {
        Booking {
            id: self.id,
            show_id: self.show_id,
            contact: self.contact,
            status: BookingStatus::Held,
            confirmation_code: self.confirmation_code,
            created_at: self.created_at,
            seat_ids: self.seat_ids,
        }
    }
}

/// A seat of a show referenced by a booking that currently claims it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatClaim {
    pub seat_id: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_hold_live_within_ttl() {
        let created = t0();
        assert!(is_live_hold(BookingStatus::Held, created, created));
        assert!(is_live_hold(BookingStatus::Held, created, created + Duration::seconds(299)));
    }

    #[test]
    fn test_hold_dead_at_ttl_boundary() {
        let created = t0();
        assert!(!is_live_hold(BookingStatus::Held, created, created + Duration::seconds(300)));
        assert!(!is_live_hold(BookingStatus::Held, created, created + Duration::seconds(301)));
    }

    #[test]
    fn test_confirmed_claims_forever() {
        let created = t0();
        let much_later = created + Duration::days(30);
        assert!(claims_seats(BookingStatus::Confirmed, created, much_later));
        assert!(!claims_seats(BookingStatus::Expired, created, created));
        assert!(!is_live_hold(BookingStatus::Confirmed, created, created));
    }

    #[test]
    fn test_seat_status_derivation() {
        let created = t0();
        let now = created + Duration::seconds(60);

        assert_eq!(SeatStatus::imposed_by(BookingStatus::Confirmed, created, now), SeatStatus::Sold);
        assert_eq!(SeatStatus::imposed_by(BookingStatus::Held, created, now), SeatStatus::Held);
        assert_eq!(SeatStatus::imposed_by(BookingStatus::Expired, created, now), SeatStatus::Available);

        let stale = created + Duration::seconds(301);
        assert_eq!(SeatStatus::imposed_by(BookingStatus::Held, created, stale), SeatStatus::Available);
    }

    #[test]
    fn test_seat_status_precedence() {
        assert_eq!(SeatStatus::Available.strongest(SeatStatus::Held), SeatStatus::Held);
        assert_eq!(SeatStatus::Sold.strongest(SeatStatus::Held), SeatStatus::Sold);
        assert_eq!(SeatStatus::Held.strongest(SeatStatus::Available), SeatStatus::Held);
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [BookingStatus::Held, BookingStatus::Confirmed, BookingStatus::Expired] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("PENDING".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_expiry_instant() {
        let booking = NewHold {
            id: Uuid::new_v4(),
            show_id: 7,
            contact: "a@example.com".to_string(),
            confirmation_code: "ABCD1234".to_string(),
            created_at: t0(),
            seat_ids: vec![1, 2],
        }
        .into_booking();

        assert_eq!(booking.status, BookingStatus::Held);
        assert_eq!(booking.expires_at(), t0() + Duration::minutes(5));
        assert!(booking.is_stale_hold(t0() + Duration::minutes(5)));
        assert!(!booking.is_stale_hold(t0() + Duration::minutes(4)));
    }
}
