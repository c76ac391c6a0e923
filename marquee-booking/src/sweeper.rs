use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use marquee_core::{Clock, ReservationLedger, ReservationResult};
use marquee_shared::models::events::HoldsExpiredEvent;
use marquee_shared::ReservationEvent;

/// Periodically moves holds past their TTL to `EXPIRED`.
///
/// Seat status never depends on this running; it only keeps the ledger tidy.
pub struct ExpirySweeper {
    ledger: Arc<dyn ReservationLedger>,
    clock: Arc<dyn Clock>,
    events: Option<broadcast::Sender<ReservationEvent>>,
}

impl ExpirySweeper {
    pub fn new(ledger: Arc<dyn ReservationLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock, events: None }
    }

    pub fn with_events(mut self, events: broadcast::Sender<ReservationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// One bulk pass. Idempotent: a second pass at the same `now` expires nothing.
    pub async fn sweep(&self, now: DateTime<Utc>) -> ReservationResult<u64> {
        let expired = self.ledger.expire_stale_holds(now).await?;

        if expired > 0 {
            info!(expired, "Expired stale holds");
            if let Some(tx) = &self.events {
                // No subscribers is fine
                let _ = tx.send(ReservationEvent::HoldsExpired(HoldsExpiredEvent {
                    expired_count: expired,
                    timestamp: now.timestamp(),
                }));
            }
        } else {
            debug!("No stale holds");
        }

        Ok(expired)
    }

    /// Sweep every `interval` until `shutdown` fires. The first pass runs
    /// immediately; a pass already in progress always completes.
    pub fn spawn(self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(interval, shutdown).await })
    }

    async fn run(&self, interval: Duration, shutdown: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Expiry sweeper started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Expiry sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(self.clock.now()).await {
                        error!("Expiry sweep failed: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;
    use marquee_core::{BookingStatus, ManualClock, NewHold};
    use marquee_store::MemoryLedger;

    async fn seed_hold(ledger: &MemoryLedger, seat_id: i64, code: &str, created_at: DateTime<Utc>) -> Uuid {
        let hold = NewHold {
            id: Uuid::new_v4(),
            show_id: 7,
            contact: "fan@example.com".to_string(),
            confirmation_code: code.to_string(),
            created_at,
            seat_ids: vec![seat_id],
        };
        ledger.insert_hold(&hold, created_at).await.unwrap();
        hold.id
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let ledger = Arc::new(MemoryLedger::new());
        let stale = seed_hold(&ledger, 1, "00000001", start).await;
        let confirmed = seed_hold(&ledger, 2, "00000002", start).await;
        ledger.confirm_hold(confirmed, start).await.unwrap().unwrap();

        let (tx, mut rx) = broadcast::channel(8);
        let sweeper = ExpirySweeper::new(ledger.clone(), Arc::new(clock.clone())).with_events(tx);

        let now = start + ChronoDuration::seconds(301);
        assert_eq!(sweeper.sweep(now).await.unwrap(), 1);
        assert_eq!(sweeper.sweep(now).await.unwrap(), 0);

        assert_eq!(ledger.booking(stale).await.unwrap().unwrap().status, BookingStatus::Expired);
        assert_eq!(ledger.booking(confirmed).await.unwrap().unwrap().status, BookingStatus::Confirmed);

        match rx.try_recv().unwrap() {
            ReservationEvent::HoldsExpired(e) => assert_eq!(e.expired_count, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_live_hold_survives_sweep() {
        let start = Utc::now();
        let ledger = Arc::new(MemoryLedger::new());
        let live = seed_hold(&ledger, 3, "00000003", start).await;

        let sweeper = ExpirySweeper::new(ledger.clone(), Arc::new(ManualClock::new(start)));
        assert_eq!(sweeper.sweep(start + ChronoDuration::seconds(299)).await.unwrap(), 0);
        assert_eq!(ledger.booking(live).await.unwrap().unwrap().status, BookingStatus::Held);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_sweeper_runs_until_cancelled() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let ledger = Arc::new(MemoryLedger::new());
        let first = seed_hold(&ledger, 4, "00000004", start).await;

        clock.advance(ChronoDuration::seconds(301));
        let shutdown = CancellationToken::new();
        let handle = ExpirySweeper::new(ledger.clone(), Arc::new(clock.clone()))
            .spawn(Duration::from_secs(60), shutdown.clone());

        // First tick fires immediately
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(ledger.booking(first).await.unwrap().unwrap().status, BookingStatus::Expired);

        let second = seed_hold(&ledger, 5, "00000005", clock.now()).await;
        clock.advance(ChronoDuration::seconds(301));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(ledger.booking(second).await.unwrap().unwrap().status, BookingStatus::Expired);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
