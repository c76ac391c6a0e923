pub mod venue;
pub mod pricing;
pub mod catalog;
pub mod repository;

pub use venue::{Hall, Movie, MovieListing, Seat, SeatCategory, SeatDetails, Show};
pub use pricing::CategoryPricing;
pub use catalog::SeatCatalog;
pub use repository::{CatalogError, CatalogRepository};
