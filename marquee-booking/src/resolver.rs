use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use marquee_catalog::CatalogRepository;
use marquee_core::{ReservationError, ReservationLedger, ReservationResult, SeatStatus};
use crate::models::SeatAvailability;

/// Derives every seat's status for a show from the ledger, as of `now`.
///
/// Nothing is cached between calls. An unswept hold past its TTL reads as
/// available because liveness is recomputed from its timestamp here.
pub struct StatusResolver {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn ReservationLedger>,
}

impl StatusResolver {
    pub fn new(catalog: Arc<dyn CatalogRepository>, ledger: Arc<dyn ReservationLedger>) -> Self {
        Self { catalog, ledger }
    }

    pub async fn resolve(&self, show_id: i64, now: DateTime<Utc>) -> ReservationResult<Vec<SeatAvailability>> {
        let show = self
            .catalog
            .show(show_id)
            .await?
            .ok_or_else(|| ReservationError::ValidationError(format!("Unknown show {}", show_id)))?;

        let seats = self.catalog.hall_seats(show.hall_id).await?;
        let claims = self.ledger.live_claims(show_id, now).await?;

        let mut statuses: HashMap<i64, SeatStatus> = HashMap::with_capacity(claims.len());
        for claim in claims {
            let imposed = SeatStatus::imposed_by(claim.status, claim.created_at, now);
            statuses
                .entry(claim.seat_id)
                .and_modify(|s| *s = s.strongest(imposed))
                .or_insert(imposed);
        }

        Ok(seats
            .into_iter()
            .map(|seat| SeatAvailability {
                status: statuses.get(&seat.id).copied().unwrap_or(SeatStatus::Available),
                id: seat.id,
                row: seat.row_label,
                number: seat.number,
                category: seat.category,
                price: seat.price,
            })
            .collect())
    }
}
