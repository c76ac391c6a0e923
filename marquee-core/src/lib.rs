pub mod booking;
pub mod clock;
pub mod code;
pub mod repository;

pub use booking::{Booking, BookingStatus, NewHold, SeatClaim, SeatStatus, HOLD_TTL_SECONDS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use code::{CodeGenerator, RandomCodeGenerator};
pub use repository::{HoldInsert, LedgerError, ReservationLedger};

use marquee_catalog::CatalogError;
use std::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    /// Malformed request, rejected before the ledger is touched.
    #[error("Validation failed: {0}")]
    ValidationError(String),
    /// Seats taken or booking not confirmable. Re-read status and retry.
    #[error("Conflict: {0}")]
    ConflictError(String),
    /// Store unavailable or transaction failed. Nothing was half-applied.
    #[error("Store failure: {0}")]
    StoreError(#[source] Box<dyn Error + Send + Sync>),
}

impl From<LedgerError> for ReservationError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Store(source) => ReservationError::StoreError(source),
            other => ReservationError::StoreError(Box::new(other)),
        }
    }
}

impl From<CatalogError> for ReservationError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Store(source) => ReservationError::StoreError(source),
        }
    }
}

pub type ReservationResult<T> = Result<T, ReservationError>;
