use std::collections::HashMap;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crate::pricing::CategoryPricing;
use crate::repository::{CatalogError, CatalogRepository};
use crate::venue::{Hall, Movie, MovieListing, Seat, SeatCategory, SeatDetails, Show};

/// In-memory seat catalog. Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SeatCatalog {
    movies: HashMap<i64, Movie>,
    halls: HashMap<i64, Hall>,
    shows: HashMap<i64, Show>,
    seats: HashMap<i64, Seat>,
    pricing: CategoryPricing,
    next_id: i64,
}

impl SeatCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_movie(&mut self, title: &str, duration: i32, poster_url: &str) -> i64 {
        let id = self.allocate_id();
        self.movies.insert(id, Movie {
            id,
            title: title.to_string(),
            duration,
            poster_url: poster_url.to_string(),
        });
        id
    }

    pub fn add_hall(&mut self, name: &str, total_rows: i32, total_cols: i32) -> i64 {
        let id = self.allocate_id();
        self.halls.insert(id, Hall { id, name: name.to_string(), total_rows, total_cols });
        id
    }

    pub fn add_show(&mut self, movie_id: i64, hall_id: i64, start_time: DateTime<Utc>) -> i64 {
        let id = self.allocate_id();
        self.shows.insert(id, Show { id, movie_id, hall_id, start_time });
        id
    }

    pub fn add_category(&mut self, name: &str, price: f64) -> i64 {
        let id = self.allocate_id();
        self.pricing.insert(SeatCategory { id, name: name.to_string(), price });
        id
    }

    pub fn add_seat(&mut self, hall_id: i64, row_label: &str, number: i32, category_id: i64) -> i64 {
        let id = self.allocate_id();
        self.seats.insert(id, Seat {
            id,
            hall_id,
            row_label: row_label.to_string(),
            number,
            category_id,
        });
        id
    }

    /// Look a seat up by hall and label, e.g. `(hall, "A1")`.
    pub fn find_seat(&self, hall_id: i64, label: &str) -> Option<&Seat> {
        self.seats
            .values()
            .find(|s| s.hall_id == hall_id && s.label() == label)
    }

    pub fn shows(&self) -> impl Iterator<Item = &Show> {
        self.shows.values()
    }

    /// Seats of a hall sorted by row label, then number.
    pub fn seats_in_hall(&self, hall_id: i64) -> Vec<SeatDetails> {
        let mut seats: Vec<SeatDetails> = self
            .seats
            .values()
            .filter(|s| s.hall_id == hall_id)
            .filter_map(|s| self.pricing.describe(s))
            .collect();
        seats.sort_by(|a, b| a.row_label.cmp(&b.row_label).then(a.number.cmp(&b.number)));
        seats
    }

    /// The sample venue: one IMAX hall, three movies with one show each.
    ///
    /// Rows A-E are Silver, F-H Gold and I Recliner. Row A has 10 seats,
    /// row I has 6, every other row 8.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let mut catalog = Self::new();

        let movies = [
            ("Inception", 148, "https://m.media-amazon.com/images/M/MV5BMjExMjkwNTQ0Nl5BMl5BanBnXkFtZTcwNTY0OTk1Mw@@._V1_.jpg"),
            ("The Dark Knight", 152, "https://image.tmdb.org/t/p/w500/qJ2tW6WMUDux911r6m7haRef0WH.jpg"),
            ("Interstellar", 169, "https://image.tmdb.org/t/p/w500/gEU2QniE6E77NI6lCU6MxlNBvIx.jpg"),
        ];
        let movie_ids: Vec<i64> = movies
            .iter()
            .map(|(title, duration, poster)| catalog.add_movie(title, *duration, poster))
            .collect();

        let hall_id = catalog.add_hall("IMAX Hall", 9, 10);

        for movie_id in movie_ids {
            catalog.add_show(movie_id, hall_id, now + Duration::hours(24));
        }

        let silver = catalog.add_category("Silver", 10.0);
        let gold = catalog.add_category("Gold", 15.0);
        let recliner = catalog.add_category("Recliner", 25.0);

        for row in ["A", "B", "C", "D", "E", "F", "G", "H", "I"] {
            let category = match row {
                "F" | "G" | "H" => gold,
                "I" => recliner,
                _ => silver,
            };
            let seat_count = match row {
                "A" => 10,
                "I" => 6,
                _ => 8,
            };
            for number in 1..=seat_count {
                catalog.add_seat(hall_id, row, number, category);
            }
        }

        catalog
    }
}

#[async_trait]
impl CatalogRepository for SeatCatalog {
    async fn show(&self, show_id: i64) -> Result<Option<Show>, CatalogError> {
        Ok(self.shows.get(&show_id).cloned())
    }

    async fn movie(&self, movie_id: i64) -> Result<Option<Movie>, CatalogError> {
        Ok(self.movies.get(&movie_id).cloned())
    }

    async fn hall_seats(&self, hall_id: i64) -> Result<Vec<SeatDetails>, CatalogError> {
        Ok(self.seats_in_hall(hall_id))
    }

    async fn list_movies(&self) -> Result<Vec<MovieListing>, CatalogError> {
        let mut listings: Vec<MovieListing> = self
            .shows
            .values()
            .filter_map(|show| {
                self.movies.get(&show.movie_id).map(|m| MovieListing {
                    id: m.id,
                    title: m.title.clone(),
                    duration: m.duration,
                    poster_url: m.poster_url.clone(),
                    show_id: show.id,
                })
            })
            .collect();
        listings.sort_by_key(|l| (l.id, l.show_id));
        Ok(listings)
    }
}
