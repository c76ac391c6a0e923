use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatsHeldEvent {
    pub show_id: i64,
    pub booking_id: Uuid,
    pub seat_ids: Vec<i64>,
    pub held_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub show_id: i64,
    pub booking_id: Uuid,
    pub seat_ids: Vec<i64>,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct HoldsExpiredEvent {
    pub expired_count: u64,
    pub timestamp: i64,
}

/// Seat-map change notification fanned out to stream subscribers.
///
/// Events only carry identifiers. Subscribers re-read seat status rather than
/// trusting the payload, since liveness is always derived at read time.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReservationEvent {
    SeatsHeld(SeatsHeldEvent),
    BookingConfirmed(BookingConfirmedEvent),
    HoldsExpired(HoldsExpiredEvent),
}

impl ReservationEvent {
    /// SSE event name for this notification.
    pub fn name(&self) -> &'static str {
        match self {
            ReservationEvent::SeatsHeld(_) => "seats_held",
            ReservationEvent::BookingConfirmed(_) => "booking_confirmed",
            ReservationEvent::HoldsExpired(_) => "holds_expired",
        }
    }

    /// The show this event concerns. Sweeps span every show.
    pub fn show_id(&self) -> Option<i64> {
        match self {
            ReservationEvent::SeatsHeld(e) => Some(e.show_id),
            ReservationEvent::BookingConfirmed(e) => Some(e.show_id),
            ReservationEvent::HoldsExpired(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = ReservationEvent::HoldsExpired(HoldsExpiredEvent {
            expired_count: 3,
            timestamp: 0,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "holds_expired");
        assert_eq!(json["expired_count"], 3);
        assert_eq!(event.name(), "holds_expired");
        assert_eq!(event.show_id(), None);
    }

    #[test]
    fn test_show_scoping() {
        let event = ReservationEvent::SeatsHeld(SeatsHeldEvent {
            show_id: 7,
            booking_id: Uuid::new_v4(),
            seat_ids: vec![1, 2],
            held_at: 0,
            expires_at: 300,
        });

        assert_eq!(event.show_id(), Some(7));
        assert_eq!(event.name(), "seats_held");
    }
}
