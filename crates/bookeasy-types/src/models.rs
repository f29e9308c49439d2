use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a registered user. Password hash and confirmation token
/// never leave the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub model: String,
    /// Daily rate.
    pub price: i64,
    pub rating: f64,
    pub category: String,
    pub brand: String,
}

impl Car {
    pub fn new(model: &str, price: i64, rating: f64, category: &str, brand: &str) -> Self {
        Self {
            model: model.to_string(),
            price,
            rating,
            category: category.to_string(),
            brand: brand.to_string(),
        }
    }
}
