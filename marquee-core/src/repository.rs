use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::error::Error;
use uuid::Uuid;
use crate::booking::{Booking, BookingStatus, NewHold, SeatClaim};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Another booking already carries this confirmation code. Nothing was written.
    #[error("Confirmation code already in use")]
    DuplicateCode,

    #[error("Ledger store failure: {0}")]
    Store(#[source] Box<dyn Error + Send + Sync>),
}

impl LedgerError {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Store(err.into())
    }
}

/// Result of an atomic conflict-check-then-insert.
#[derive(Debug, Clone, PartialEq)]
pub enum HoldInsert {
    Created(Booking),
    /// Requested seats already claimed by a live booking. The ledger is untouched.
    Conflict(Vec<i64>),
}

/// The reservation ledger: source of truth for holds and bookings.
///
/// Every method is all-or-nothing. Implementations must serialize
/// `insert_hold` against every other hold touching the same seat of the
/// same show, so two concurrent holds can never both pass the conflict check.
/// `now` is supplied by the caller so one snapshot of time drives each decision.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Seats of `show_id` referenced by a booking that claims them at `now`.
    async fn live_claims(
        &self,
        show_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatClaim>, LedgerError>;

    /// Check every seat of `hold` against live bookings of its show and, if all
    /// are free, record the hold with all its seats in one committed step.
    async fn insert_hold(
        &self,
        hold: &NewHold,
        now: DateTime<Utc>,
    ) -> Result<HoldInsert, LedgerError>;

    /// Conditional `HELD -> CONFIRMED` for a hold still live at `now`.
    /// `None` when the booking is missing, not `HELD`, or past its TTL.
    async fn confirm_hold(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, LedgerError>;

    /// Bulk `HELD -> EXPIRED` for holds past their TTL at `now`. Returns the number moved.
    async fn expire_stale_holds(&self, now: DateTime<Utc>) -> Result<u64, LedgerError>;

    async fn booking(&self, booking_id: Uuid) -> Result<Option<Booking>, LedgerError>;

    /// Bookings of a contact in the given status, newest first.
    async fn bookings_by_contact(
        &self,
        contact: &str,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, LedgerError>;
}
