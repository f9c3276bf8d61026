//! Inventory domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A vehicle classification (Sedan, SUV, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub classification_id: i32,
    pub classification_name: String,
}

/// A vehicle joined with its classification name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub inv_id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    pub image: String,
    pub thumbnail: String,
    pub price: f64,
    pub miles: i32,
    pub color: String,
    pub classification_id: i32,
    pub classification_name: String,
}

impl Vehicle {
    /// "2019 Jeep Wrangler" style title.
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}

/// Validated vehicle fields, used for both insert and update.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleForm {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub description: String,
    pub image: String,
    pub thumbnail: String,
    pub price: f64,
    pub miles: i32,
    pub color: String,
    pub classification_id: i32,
}

/// A saved vehicle on an account's favorites list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub inv_id: i32,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub thumbnail: String,
    pub classification_name: String,
    pub created_at: DateTime<Utc>,
}
