//! Postgres ledger tests. Need a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p marquee-store -- --ignored`

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use marquee_core::{
    BookingStatus, CodeGenerator, HoldInsert, NewHold, RandomCodeGenerator, ReservationLedger,
};
use marquee_store::app_config::DatabaseConfig;
use marquee_store::{DbClient, PgReservationLedger};

/// A fresh show on the seeded hall, so runs never see each other's bookings.
async fn setup() -> (PgPool, PgReservationLedger, i64, Vec<i64>) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = DbClient::new(&DatabaseConfig { url, max_connections: 10 }).await.unwrap();
    db.migrate().await.unwrap();

    let show_id: i64 = sqlx::query_scalar(
        "INSERT INTO shows (movie_id, hall_id, start_time) SELECT movie_id, hall_id, NOW() FROM shows ORDER BY id LIMIT 1 RETURNING id",
    )
    .fetch_one(&db.pool)
    .await
    .unwrap();

    let seats: Vec<i64> = sqlx::query_scalar(
        "SELECT s.id FROM seats s JOIN shows sh ON sh.hall_id = s.hall_id WHERE sh.id = $1 ORDER BY s.row_label, s.number",
    )
    .bind(show_id)
    .fetch_all(&db.pool)
    .await
    .unwrap();

    (db.pool.clone(), PgReservationLedger::new(db.pool.clone()), show_id, seats)
}

fn hold(show_id: i64, seat_ids: Vec<i64>, created_at: DateTime<Utc>) -> NewHold {
    NewHold {
        id: Uuid::new_v4(),
        show_id,
        contact: format!("{}@example.com", Uuid::new_v4().simple()),
        confirmation_code: RandomCodeGenerator.generate(),
        created_at,
        seat_ids,
    }
}

#[tokio::test]
#[ignore]
async fn test_hold_conflict_and_confirm() {
    let (_pool, ledger, show_id, seats) = setup().await;
    let now = Utc::now();

    let first = hold(show_id, vec![seats[0], seats[1]], now);
    assert!(matches!(ledger.insert_hold(&first, now).await.unwrap(), HoldInsert::Created(_)));

    let overlapping = hold(show_id, vec![seats[1], seats[2]], now);
    assert_eq!(
        ledger.insert_hold(&overlapping, now).await.unwrap(),
        HoldInsert::Conflict(vec![seats[1]])
    );
    assert!(ledger.booking(overlapping.id).await.unwrap().is_none());

    let confirmed = ledger.confirm_hold(first.id, now + Duration::seconds(60)).await.unwrap().unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.seat_ids, vec![seats[0], seats[1]]);
    assert!(ledger.confirm_hold(first.id, now + Duration::seconds(61)).await.unwrap().is_none());

    let listed = ledger.bookings_by_contact(&first.contact, BookingStatus::Confirmed).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[ignore]
async fn test_expiry_is_derived_and_swept() {
    let (_pool, ledger, show_id, seats) = setup().await;
    let created = Utc::now() - Duration::seconds(400);

    let stale = hold(show_id, vec![seats[3]], created);
    ledger.insert_hold(&stale, created).await.unwrap();

    let now = Utc::now();
    assert!(ledger.live_claims(show_id, now).await.unwrap().is_empty());
    assert!(ledger.confirm_hold(stale.id, now).await.unwrap().is_none());

    assert!(ledger.expire_stale_holds(now).await.unwrap() >= 1);
    assert_eq!(ledger.expire_stale_holds(now).await.unwrap(), 0);
    assert_eq!(ledger.booking(stale.id).await.unwrap().unwrap().status, BookingStatus::Expired);

    let retake = hold(show_id, vec![seats[3]], now);
    assert!(matches!(ledger.insert_hold(&retake, now).await.unwrap(), HoldInsert::Created(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_concurrent_holds_single_winner() {
    let (_pool, ledger, show_id, seats) = setup().await;
    let ledger = Arc::new(ledger);
    let contested = seats[5];

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = ledger.clone();
            let request = hold(show_id, vec![seats[10 + i], contested], Utc::now());
            tokio::spawn(async move { ledger.insert_hold(&request, request.created_at).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if let HoldInsert::Created(_) = handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let claims = ledger.live_claims(show_id, Utc::now()).await.unwrap();
    assert_eq!(claims.iter().filter(|c| c.seat_id == contested).count(), 1);
}
