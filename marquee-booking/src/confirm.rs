use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use marquee_catalog::CatalogRepository;
use marquee_core::{Booking, Clock, ReservationError, ReservationLedger, ReservationResult};
use crate::models::ConfirmationReceipt;

const NOT_CONFIRMABLE: &str = "Hold expired or invalid";

pub struct ConfirmationEngine {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn ReservationLedger>,
    clock: Arc<dyn Clock>,
}

impl ConfirmationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn ReservationLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { catalog, ledger, clock }
    }

    /// Promote a live hold to `CONFIRMED`.
    ///
    /// The catalog is read before the transition so a catalog failure leaves
    /// the hold untouched. The transition itself is the ledger's single
    /// conditional update, evaluated against one `now`.
    pub async fn confirm_hold(&self, booking_id: Uuid) -> ReservationResult<(Booking, ConfirmationReceipt)> {
        let current = match self.ledger.booking(booking_id).await? {
            Some(b) if !b.status.is_terminal() => b,
            _ => {
                warn!(%booking_id, "Confirmation rejected");
                return Err(ReservationError::ConflictError(NOT_CONFIRMABLE.to_string()));
            }
        };

        let (movie_title, seats) = describe(self.catalog.as_ref(), current.show_id, &current.seat_ids).await?;

        let now = self.clock.now();
        let Some(booking) = self.ledger.confirm_hold(booking_id, now).await? else {
            warn!(%booking_id, "Confirmation rejected, hold no longer live");
            return Err(ReservationError::ConflictError(NOT_CONFIRMABLE.to_string()));
        };

        info!(%booking_id, code = %booking.confirmation_code, show_id = booking.show_id, "Booking confirmed");

        let receipt = ConfirmationReceipt {
            booking_id,
            booking_code: booking.confirmation_code.clone(),
            movie_title,
            seats,
        };
        Ok((booking, receipt))
    }
}

/// Movie title and seat labels (in `seat_ids` order) for a booking's show.
pub(crate) async fn describe(
    catalog: &dyn CatalogRepository,
    show_id: i64,
    seat_ids: &[i64],
) -> ReservationResult<(String, Vec<String>)> {
    let show = catalog
        .show(show_id)
        .await?
        .ok_or_else(|| ReservationError::ValidationError(format!("Unknown show {}", show_id)))?;

    let title = catalog
        .movie(show.movie_id)
        .await?
        .map(|m| m.title)
        .unwrap_or_default();

    let labels: HashMap<i64, String> = catalog
        .hall_seats(show.hall_id)
        .await?
        .into_iter()
        .map(|s| (s.id, s.label()))
        .collect();

    let seats = seat_ids
        .iter()
        .map(|id| labels.get(id).cloned().unwrap_or_else(|| id.to_string()))
        .collect();

    Ok((title, seats))
}
