pub mod models;
pub mod resolver;
pub mod hold;
pub mod confirm;
pub mod sweeper;
pub mod engine;

pub use models::{BookingSummary, ConfirmationReceipt, HoldReceipt, SeatAvailability};
pub use resolver::StatusResolver;
pub use hold::HoldEngine;
pub use confirm::ConfirmationEngine;
pub use sweeper::ExpirySweeper;
pub use engine::ReservationEngine;
