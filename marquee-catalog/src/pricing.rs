use std::collections::HashMap;
use crate::venue::{Seat, SeatCategory, SeatDetails};

/// Category price list. A seat's price is always derived from its category.
#[derive(Debug, Clone, Default)]
pub struct CategoryPricing {
    categories: HashMap<i64, SeatCategory>,
}

impl CategoryPricing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: SeatCategory) {
        self.categories.insert(category.id, category);
    }

    pub fn category(&self, category_id: i64) -> Option<&SeatCategory> {
        self.categories.get(&category_id)
    }

    pub fn price_of(&self, seat: &Seat) -> Option<f64> {
        self.category(seat.category_id).map(|c| c.price)
    }

    /// Join a seat with its category. `None` when the category is unknown.
    pub fn describe(&self, seat: &Seat) -> Option<SeatDetails> {
        let category = self.category(seat.category_id)?;
        Some(SeatDetails {
            id: seat.id,
            hall_id: seat.hall_id,
            row_label: seat.row_label.clone(),
            number: seat.number,
            category: category.name.clone(),
            price: category.price,
        })
    }
}
