use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use marquee_catalog::CatalogRepository;
use marquee_core::{
    Booking, Clock, CodeGenerator, HoldInsert, LedgerError, NewHold, ReservationError,
    ReservationLedger, ReservationResult,
};
use marquee_shared::Masked;
use crate::models::HoldReceipt;

/// Attempts per hold before a run of code collisions becomes a store failure.
const MAX_CODE_ATTEMPTS: usize = 3;

pub struct HoldEngine {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn ReservationLedger>,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
}

impl HoldEngine {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn ReservationLedger>,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self { catalog, ledger, clock, codes }
    }

    /// Claim every seat in `seat_ids` for `contact`, or none of them.
    ///
    /// Validation runs against the catalog only; the ledger is not read until
    /// the request is well formed.
    pub async fn create_hold(
        &self,
        show_id: i64,
        seat_ids: &[i64],
        contact: &str,
    ) -> ReservationResult<(Booking, HoldReceipt)> {
        self.validate(show_id, seat_ids, contact).await?;

        let contact = contact.trim();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let now = self.clock.now();
            let hold = NewHold {
                id: Uuid::new_v4(),
                show_id,
                contact: contact.to_string(),
                confirmation_code: self.codes.generate(),
                created_at: now,
                seat_ids: seat_ids.to_vec(),
            };

            match self.ledger.insert_hold(&hold, now).await {
                Ok(HoldInsert::Created(booking)) => {
                    info!(
                        booking_id = %booking.id,
                        show_id,
                        seats = ?booking.seat_ids,
                        contact = %Masked(contact),
                        "Seats held"
                    );
                    let receipt = HoldReceipt {
                        booking_id: booking.id,
                        expires_at: booking.expires_at(),
                    };
                    return Ok((booking, receipt));
                }
                Ok(HoldInsert::Conflict(taken)) => {
                    warn!(show_id, taken = ?taken, "Hold rejected, seats already claimed");
                    return Err(ReservationError::ConflictError(format!(
                        "Seats no longer available: {}",
                        join_ids(&taken)
                    )));
                }
                Err(LedgerError::DuplicateCode) if attempts < MAX_CODE_ATTEMPTS => {
                    debug!(attempt = attempts, "Confirmation code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn validate(&self, show_id: i64, seat_ids: &[i64], contact: &str) -> ReservationResult<()> {
        if seat_ids.is_empty() {
            return Err(ReservationError::ValidationError("No seats selected".to_string()));
        }
        if contact.trim().is_empty() {
            return Err(ReservationError::ValidationError("Contact is required".to_string()));
        }

        let mut seen = HashSet::with_capacity(seat_ids.len());
        let duplicates: Vec<i64> = seat_ids.iter().copied().filter(|id| !seen.insert(*id)).collect();
        if !duplicates.is_empty() {
            return Err(ReservationError::ValidationError(format!(
                "Duplicate seats: {}",
                join_ids(&duplicates)
            )));
        }

        let show = self
            .catalog
            .show(show_id)
            .await?
            .ok_or_else(|| ReservationError::ValidationError(format!("Unknown show {}", show_id)))?;

        let hall: HashSet<i64> = self
            .catalog
            .hall_seats(show.hall_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let foreign: Vec<i64> = seat_ids.iter().copied().filter(|id| !hall.contains(id)).collect();
        if !foreign.is_empty() {
            return Err(ReservationError::ValidationError(format!(
                "Seats not in this show's hall: {}",
                join_ids(&foreign)
            )));
        }

        Ok(())
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
