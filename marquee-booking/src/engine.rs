use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;
use marquee_catalog::{CatalogRepository, MovieListing, Show};
use marquee_core::{
    BookingStatus, Clock, CodeGenerator, ReservationError, ReservationLedger, ReservationResult,
};
use marquee_shared::models::events::{BookingConfirmedEvent, SeatsHeldEvent};
use marquee_shared::ReservationEvent;
use crate::confirm::{describe, ConfirmationEngine};
use crate::hold::HoldEngine;
use crate::models::{BookingSummary, ConfirmationReceipt, HoldReceipt, SeatAvailability};
use crate::resolver::StatusResolver;
use crate::sweeper::ExpirySweeper;

/// Entry point for everything that reads or changes reservations.
///
/// Holds its collaborators explicitly; build one at startup and share it
/// behind an `Arc`. Every operation is safe to call concurrently.
pub struct ReservationEngine {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn ReservationLedger>,
    clock: Arc<dyn Clock>,
    resolver: StatusResolver,
    holds: HoldEngine,
    confirmations: ConfirmationEngine,
    events: Option<broadcast::Sender<ReservationEvent>>,
}

impl ReservationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        ledger: Arc<dyn ReservationLedger>,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            resolver: StatusResolver::new(catalog.clone(), ledger.clone()),
            holds: HoldEngine::new(catalog.clone(), ledger.clone(), clock.clone(), codes),
            confirmations: ConfirmationEngine::new(catalog.clone(), ledger.clone(), clock.clone()),
            catalog,
            ledger,
            clock,
            events: None,
        }
    }

    /// Publish seat-map changes to `events` after each successful mutation.
    pub fn with_events(mut self, events: broadcast::Sender<ReservationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// A sweeper over the same ledger, clock and event channel.
    pub fn sweeper(&self) -> ExpirySweeper {
        let sweeper = ExpirySweeper::new(self.ledger.clone(), self.clock.clone());
        match &self.events {
            Some(tx) => sweeper.with_events(tx.clone()),
            None => sweeper,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn resolve_status(&self, show_id: i64, now: DateTime<Utc>) -> ReservationResult<Vec<SeatAvailability>> {
        self.resolver.resolve(show_id, now).await
    }

    pub async fn create_hold(&self, show_id: i64, seat_ids: &[i64], contact: &str) -> ReservationResult<HoldReceipt> {
        let (booking, receipt) = self.holds.create_hold(show_id, seat_ids, contact).await?;

        self.publish(ReservationEvent::SeatsHeld(SeatsHeldEvent {
            show_id,
            booking_id: booking.id,
            seat_ids: booking.seat_ids,
            held_at: booking.created_at.timestamp(),
            expires_at: receipt.expires_at.timestamp(),
        }));

        Ok(receipt)
    }

    pub async fn confirm_hold(&self, booking_id: Uuid) -> ReservationResult<ConfirmationReceipt> {
        let (booking, receipt) = self.confirmations.confirm_hold(booking_id).await?;

        self.publish(ReservationEvent::BookingConfirmed(BookingConfirmedEvent {
            show_id: booking.show_id,
            booking_id,
            seat_ids: booking.seat_ids,
            timestamp: self.clock.now().timestamp(),
        }));

        Ok(receipt)
    }

    pub async fn run_expiry_sweep(&self, now: DateTime<Utc>) -> ReservationResult<u64> {
        self.sweeper().sweep(now).await
    }

    /// Confirmed bookings made under `contact`, newest first.
    pub async fn list_bookings(&self, contact: &str) -> ReservationResult<Vec<BookingSummary>> {
        let contact = contact.trim();
        if contact.is_empty() {
            return Err(ReservationError::ValidationError("Contact is required".to_string()));
        }

        let bookings = self.ledger.bookings_by_contact(contact, BookingStatus::Confirmed).await?;

        let mut summaries = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let (movie_title, seats) = describe(self.catalog.as_ref(), booking.show_id, &booking.seat_ids).await?;
            summaries.push(BookingSummary {
                booking_id: booking.id,
                booking_code: booking.confirmation_code,
                movie_title,
                seats,
                created_at: booking.created_at,
            });
        }
        Ok(summaries)
    }

    pub async fn show(&self, show_id: i64) -> ReservationResult<Option<Show>> {
        Ok(self.catalog.show(show_id).await?)
    }

    pub async fn list_movies(&self) -> ReservationResult<Vec<MovieListing>> {
        Ok(self.catalog.list_movies().await?)
    }

    fn publish(&self, event: ReservationEvent) {
        if let Some(tx) = &self.events {
            // Nobody listening is not an error
            let _ = tx.send(event);
        }
    }
}
