use async_trait::async_trait;
use std::error::Error;
use crate::venue::{Movie, MovieListing, SeatDetails, Show};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog store failure: {0}")]
    Store(#[source] Box<dyn Error + Send + Sync>),
}

impl CatalogError {
    pub fn store<E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Store(err.into())
    }
}

/// Read-only access to the seat catalog. Safe to call from any request worker.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn show(&self, show_id: i64) -> Result<Option<Show>, CatalogError>;

    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, CatalogError>;

    /// Every seat of the hall, ordered by row label then seat number.
    async fn hall_seats(&self, hall_id: i64) -> Result<Vec<SeatDetails>, CatalogError>;

    async fn list_movies(&self) -> Result<Vec<MovieListing>, CatalogError>;
}
