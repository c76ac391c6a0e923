use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;
use marquee_core::{
    Booking, BookingStatus, HoldInsert, LedgerError, NewHold, ReservationLedger, SeatClaim,
};

#[derive(Debug, Default)]
struct LedgerState {
    bookings: HashMap<Uuid, Booking>,
    codes: HashSet<String>,
}

/// Process-local ledger. One lock serializes every read-modify-write, which
/// trivially linearizes holds, confirmations and sweeps.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records ever written, in any status.
    pub async fn len(&self) -> usize {
        self.state.lock().await.bookings.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every record, for audits and tests.
    pub async fn all_bookings(&self) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self.state.lock().await.bookings.values().cloned().collect();
        bookings.sort_by_key(|b| b.created_at);
        bookings
    }
}

#[async_trait]
impl ReservationLedger for MemoryLedger {
    async fn live_claims(
        &self,
        show_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatClaim>, LedgerError> {
        let state = self.state.lock().await;

        let claims = state
            .bookings
            .values()
            .filter(|b| b.show_id == show_id && b.claims_seats(now))
            .flat_map(|b| {
                b.seat_ids.iter().map(move |&seat_id| SeatClaim {
                    seat_id,
                    status: b.status,
                    created_at: b.created_at,
                })
            })
            .collect();

        Ok(claims)
    }

    async fn insert_hold(
        &self,
        hold: &NewHold,
        now: DateTime<Utc>,
    ) -> Result<HoldInsert, LedgerError> {
        let mut state = self.state.lock().await;

        let conflicts: BTreeSet<i64> = state
            .bookings
            .values()
            .filter(|b| b.show_id == hold.show_id && b.claims_seats(now))
            .flat_map(|b| b.seat_ids.iter().copied())
            .filter(|seat_id| hold.seat_ids.contains(seat_id))
            .collect();

        if !conflicts.is_empty() {
            return Ok(HoldInsert::Conflict(conflicts.into_iter().collect()));
        }

        if state.codes.contains(&hold.confirmation_code) {
            return Err(LedgerError::DuplicateCode);
        }

        let booking = hold.clone().into_booking();
        state.codes.insert(booking.confirmation_code.clone());
        state.bookings.insert(booking.id, booking.clone());

        Ok(HoldInsert::Created(booking))
    }

    async fn confirm_hold(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, LedgerError> {
        let mut state = self.state.lock().await;

        match state.bookings.get_mut(&booking_id) {
            Some(booking) if booking.is_live_hold(now) => {
                booking.status = BookingStatus::Confirmed;
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn expire_stale_holds(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut state = self.state.lock().await;

        let mut expired = 0;
        for booking in state.bookings.values_mut() {
            if booking.is_stale_hold(now) {
                booking.status = BookingStatus::Expired;
                expired += 1;
            }
        }

        Ok(expired)
    }

    async fn booking(&self, booking_id: Uuid) -> Result<Option<Booking>, LedgerError> {
        Ok(self.state.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn bookings_by_contact(
        &self,
        contact: &str,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, LedgerError> {
        let state = self.state.lock().await;

        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.contact == contact && b.status == status)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hold(show_id: i64, seats: &[i64], code: &str, created_at: DateTime<Utc>) -> NewHold {
        NewHold {
            id: Uuid::new_v4(),
            show_id,
            contact: "guest@example.com".to_string(),
            confirmation_code: code.to_string(),
            created_at,
            seat_ids: seats.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_overlapping_hold_conflicts() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();

        let first = ledger.insert_hold(&hold(7, &[1, 2], "AAAA0001", now), now).await.unwrap();
        assert!(matches!(first, HoldInsert::Created(_)));

        let second = ledger.insert_hold(&hold(7, &[2, 3], "AAAA0002", now), now).await.unwrap();
        assert_eq!(second, HoldInsert::Conflict(vec![2]));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_other_show_does_not_conflict() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();

        ledger.insert_hold(&hold(7, &[1], "AAAA0001", now), now).await.unwrap();
        let other = ledger.insert_hold(&hold(8, &[1], "AAAA0002", now), now).await.unwrap();

        assert!(matches!(other, HoldInsert::Created(_)));
    }

    #[tokio::test]
    async fn test_duplicate_code_writes_nothing() {
        let ledger = MemoryLedger::new();
        let now = Utc::now();

        ledger.insert_hold(&hold(7, &[1], "SAMECODE", now), now).await.unwrap();
        let err = ledger.insert_hold(&hold(7, &[2], "SAMECODE", now), now).await.unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateCode));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_hold_frees_seats_without_sweep() {
        let ledger = MemoryLedger::new();
        let t0 = Utc::now();

        ledger.insert_hold(&hold(7, &[5], "AAAA0001", t0), t0).await.unwrap();

        let later = t0 + Duration::seconds(301);
        assert!(ledger.live_claims(7, later).await.unwrap().is_empty());

        let retake = ledger.insert_hold(&hold(7, &[5], "AAAA0002", later), later).await.unwrap();
        assert!(matches!(retake, HoldInsert::Created(_)));
    }

    #[tokio::test]
    async fn test_confirm_only_live_holds() {
        let ledger = MemoryLedger::new();
        let t0 = Utc::now();

        let HoldInsert::Created(booking) =
            ledger.insert_hold(&hold(7, &[1], "AAAA0001", t0), t0).await.unwrap()
        else {
            panic!("hold should be created");
        };

        let late = t0 + Duration::seconds(300);
        assert!(ledger.confirm_hold(booking.id, late).await.unwrap().is_none());

        let in_time = t0 + Duration::seconds(60);
        let confirmed = ledger.confirm_hold(booking.id, in_time).await.unwrap().unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        assert!(ledger.confirm_hold(booking.id, in_time).await.unwrap().is_none());
        assert!(ledger.confirm_hold(Uuid::new_v4(), in_time).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_leaves_terminal_records() {
        let ledger = MemoryLedger::new();
        let t0 = Utc::now();

        let HoldInsert::Created(kept) =
            ledger.insert_hold(&hold(7, &[1], "AAAA0001", t0), t0).await.unwrap()
        else {
            panic!("hold should be created");
        };
        ledger.confirm_hold(kept.id, t0).await.unwrap();
        ledger.insert_hold(&hold(7, &[2], "AAAA0002", t0), t0).await.unwrap();

        let later = t0 + Duration::minutes(10);
        assert_eq!(ledger.expire_stale_holds(later).await.unwrap(), 1);
        assert_eq!(ledger.expire_stale_holds(later).await.unwrap(), 0);

        let kept = ledger.booking(kept.id).await.unwrap().unwrap();
        assert_eq!(kept.status, BookingStatus::Confirmed);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_bookings_by_contact_newest_first() {
        let ledger = MemoryLedger::new();
        let t0 = Utc::now();

        for (i, seat) in [1_i64, 2, 3].iter().enumerate() {
            let at = t0 + Duration::seconds(i as i64);
            let HoldInsert::Created(b) = ledger
                .insert_hold(&hold(7, &[*seat], &format!("CODE000{}", i), at), at)
                .await
                .unwrap()
            else {
                panic!("hold should be created");
            };
            ledger.confirm_hold(b.id, at).await.unwrap();
        }

        let bookings = ledger
            .bookings_by_contact("guest@example.com", BookingStatus::Confirmed)
            .await
            .unwrap();
        let seats: Vec<i64> = bookings.iter().map(|b| b.seat_ids[0]).collect();
        assert_eq!(seats, vec![3, 2, 1]);

        let none = ledger
            .bookings_by_contact("someone@else.com", BookingStatus::Confirmed)
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
