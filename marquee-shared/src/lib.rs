pub mod models;
pub mod pii;

pub use models::events::ReservationEvent;
pub use pii::Masked;
