use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use marquee_catalog::{CatalogError, CatalogRepository, Movie, MovieListing, SeatDetails, Show};

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ShowRow {
    id: i64,
    movie_id: i64,
    hall_id: i64,
    start_time: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    id: i64,
    title: String,
    duration: i32,
    poster_url: String,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: i64,
    hall_id: i64,
    row_label: String,
    number: i32,
    category: String,
    price: f64,
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: i64,
    title: String,
    duration: i32,
    poster_url: String,
    show_id: i64,
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn show(&self, show_id: i64) -> Result<Option<Show>, CatalogError> {
        let row = sqlx::query_as::<_, ShowRow>(
            "SELECT id, movie_id, hall_id, start_time FROM shows WHERE id = $1",
        )
        .bind(show_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CatalogError::store)?;

        Ok(row.map(|r| Show {
            id: r.id,
            movie_id: r.movie_id,
            hall_id: r.hall_id,
            start_time: r.start_time,
        }))
    }

    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, CatalogError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, duration, poster_url FROM movies WHERE id = $1",
        )
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(CatalogError::store)?;

        Ok(row.map(|r| Movie {
            id: r.id,
            title: r.title,
            duration: r.duration,
            poster_url: r.poster_url,
        }))
    }

    async fn hall_seats(&self, hall_id: i64) -> Result<Vec<SeatDetails>, CatalogError> {
        let rows = sqlx::query_as::<_, SeatRow>(
            r#"
            SELECT s.id, s.hall_id, s.row_label, s.number, c.name AS category, c.price
            FROM seats s
            JOIN seat_categories c ON s.category_id = c.id
            WHERE s.hall_id = $1
            ORDER BY s.row_label, s.number
            "#,
        )
        .bind(hall_id)
        .fetch_all(&self.pool)
        .await
        .map_err(CatalogError::store)?;

        Ok(rows
            .into_iter()
            .map(|r| SeatDetails {
                id: r.id,
                hall_id: r.hall_id,
                row_label: r.row_label,
                number: r.number,
                category: r.category,
                price: r.price,
            })
            .collect())
    }

    async fn list_movies(&self) -> Result<Vec<MovieListing>, CatalogError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT m.id, m.title, m.duration, m.poster_url, s.id AS show_id
            FROM movies m
            JOIN shows s ON m.id = s.movie_id
            ORDER BY m.id, s.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(CatalogError::store)?;

        Ok(rows
            .into_iter()
            .map(|r| MovieListing {
                id: r.id,
                title: r.title,
                duration: r.duration,
                poster_url: r.poster_url,
                show_id: r.show_id,
            })
            .collect())
    }
}
