use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;
use marquee_core::booking::live_cutoff;
use marquee_core::{
    Booking, BookingStatus, HoldInsert, LedgerError, NewHold, ReservationLedger, SeatClaim,
};

const BOOKING_CODE_CONSTRAINT: &str = "bookings_booking_code_key";

/// Postgres-backed ledger.
///
/// Holds lock the requested seat rows (in id order, so concurrent holds never
/// deadlock) before running the conflict check, which serializes every pair of
/// holds sharing a seat while leaving disjoint seat sets fully parallel.
/// Confirmation and expiry are single conditional `UPDATE`s.
pub struct PgReservationLedger {
    pool: PgPool,
}

impl PgReservationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    show_id: i64,
    user_email: String,
    status: String,
    booking_code: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BookingSeatRow {
    booking_id: Uuid,
    seat_id: i64,
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    seat_id: i64,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(raw: &str) -> Result<BookingStatus, LedgerError> {
    raw.parse::<BookingStatus>().map_err(LedgerError::store)
}

impl BookingRow {
    fn into_booking(self, seat_ids: Vec<i64>) -> Result<Booking, LedgerError> {
        Ok(Booking {
            id: self.id,
            show_id: self.show_id,
            contact: self.user_email,
            status: parse_status(&self.status)?,
            confirmation_code: self.booking_code,
            created_at: self.created_at,
            seat_ids,
        })
    }
}

fn is_code_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(BOOKING_CODE_CONSTRAINT)
        }
        _ => false,
    }
}

async fn seats_of<'e, E>(executor: E, booking_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<i64>>, LedgerError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, BookingSeatRow>(
        r#"
        SELECT booking_id, seat_id
        FROM booking_seats
        WHERE booking_id = ANY($1)
        ORDER BY booking_id, position
        "#,
    )
    .bind(booking_ids)
    .fetch_all(executor)
    .await
    .map_err(LedgerError::store)?;

    let mut seats: HashMap<Uuid, Vec<i64>> = HashMap::new();
    for row in rows {
        seats.entry(row.booking_id).or_default().push(row.seat_id);
    }
    Ok(seats)
}

#[async_trait]
impl ReservationLedger for PgReservationLedger {
    async fn live_claims(
        &self,
        show_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<SeatClaim>, LedgerError> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT bs.seat_id, b.status, b.created_at
            FROM booking_seats bs
            JOIN bookings b ON bs.booking_id = b.id
            WHERE b.show_id = $1
              AND (b.status = 'CONFIRMED' OR (b.status = 'HELD' AND b.created_at > $2))
            "#,
        )
        .bind(show_id)
        .bind(live_cutoff(now))
        .fetch_all(&self.pool)
        .await
        .map_err(LedgerError::store)?;

        rows.into_iter()
            .map(|row| -> Result<SeatClaim, LedgerError> {
                Ok(SeatClaim {
                    seat_id: row.seat_id,
                    status: parse_status(&row.status)?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }

    async fn insert_hold(
        &self,
        hold: &NewHold,
        now: DateTime<Utc>,
    ) -> Result<HoldInsert, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(LedgerError::store)?;

        // Row locks on the seats serialize concurrent holds per seat.
        sqlx::query("SELECT id FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(&hold.seat_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(LedgerError::store)?;

        let conflicts: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT bs.seat_id
            FROM booking_seats bs
            JOIN bookings b ON bs.booking_id = b.id
            WHERE b.show_id = $1
              AND bs.seat_id = ANY($2)
              AND (b.status = 'CONFIRMED' OR (b.status = 'HELD' AND b.created_at > $3))
            ORDER BY bs.seat_id
            "#,
        )
        .bind(hold.show_id)
        .bind(&hold.seat_ids)
        .bind(live_cutoff(now))
        .fetch_all(&mut *tx)
        .await
        .map_err(LedgerError::store)?;

        if !conflicts.is_empty() {
            debug!(show_id = hold.show_id, ?conflicts, "Seats already claimed, rolling back hold");
            tx.rollback().await.map_err(LedgerError::store)?;
            return Ok(HoldInsert::Conflict(conflicts));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO bookings (id, show_id, user_email, status, booking_code, created_at)
            VALUES ($1, $2, $3, 'HELD', $4, $5)
            "#,
        )
        .bind(hold.id)
        .bind(hold.show_id)
        .bind(&hold.contact)
        .bind(&hold.confirmation_code)
        .bind(hold.created_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_code_collision(&e) {
                warn!(booking_id = %hold.id, "Confirmation code collision");
                return Err(LedgerError::DuplicateCode);
            }
            return Err(LedgerError::store(e));
        }

        sqlx::query(
            r#"
            INSERT INTO booking_seats (booking_id, seat_id, position)
            SELECT $1, seat_id, ord::INTEGER
            FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(seat_id, ord)
            "#,
        )
        .bind(hold.id)
        .bind(&hold.seat_ids)
        .execute(&mut *tx)
        .await
        .map_err(LedgerError::store)?;

        tx.commit().await.map_err(LedgerError::store)?;

        Ok(HoldInsert::Created(hold.clone().into_booking()))
    }

    async fn confirm_hold(
        &self,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Booking>, LedgerError> {
        let mut tx = self.pool.begin().await.map_err(LedgerError::store)?;

        // Status and TTL are re-checked by the same statement that flips the status.
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET status = 'CONFIRMED'
            WHERE id = $1
              AND status = 'HELD'
              AND created_at > $2
            RETURNING id, show_id, user_email, status, booking_code, created_at
            "#,
        )
        .bind(booking_id)
        .bind(live_cutoff(now))
        .fetch_optional(&mut *tx)
        .await
        .map_err(LedgerError::store)?;

        let Some(row) = row else {
            tx.rollback().await.map_err(LedgerError::store)?;
            return Ok(None);
        };

        let mut seats = seats_of(&mut *tx, &[row.id]).await?;
        tx.commit().await.map_err(LedgerError::store)?;

        let seat_ids = seats.remove(&row.id).unwrap_or_default();
        row.into_booking(seat_ids).map(Some)
    }

    async fn expire_stale_holds(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'EXPIRED'
            WHERE status = 'HELD'
              AND created_at <= $1
            "#,
        )
        .bind(live_cutoff(now))
        .execute(&self.pool)
        .await
        .map_err(LedgerError::store)?;

        Ok(result.rows_affected())
    }

    async fn booking(&self, booking_id: Uuid) -> Result<Option<Booking>, LedgerError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, show_id, user_email, status, booking_code, created_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(LedgerError::store)?;

        match row {
            Some(row) => {
                let mut seats = seats_of(&self.pool, &[row.id]).await?;
                let seat_ids = seats.remove(&row.id).unwrap_or_default();
                row.into_booking(seat_ids).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn bookings_by_contact(
        &self,
        contact: &str,
        status: BookingStatus,
    ) -> Result<Vec<Booking>, LedgerError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, show_id, user_email, status, booking_code, created_at
            FROM bookings
            WHERE user_email = $1 AND status = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(contact)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(LedgerError::store)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut seats = seats_of(&self.pool, &ids).await?;

        rows.into_iter()
            .map(|row| {
                let seat_ids = seats.remove(&row.id).unwrap_or_default();
                row.into_booking(seat_ids)
            })
            .collect()
    }
}
