use serde::{Deserialize, Serialize};

use crate::models::Car;

// -- Envelope --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    /// The request was at fault.
    Fail,
    /// The server was at fault.
    Error,
}

/// `{"status": ..., "message": ...}` body used for every reply that carries
/// no data of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty()
            && !self.last_name.is_empty()
            && !self.email.is_empty()
            && !self.password.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    pub email: Option<String>,
}

// -- Messages --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    pub message: String,
}

// -- Cars --

#[derive(Debug, Default, Deserialize)]
pub struct CarQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sort: Option<String>,
    /// Kept as text so that garbage falls back to page 1 instead of a 400.
    pub page: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CarPage {
    pub cars: Vec<Car>,
    pub total_pages: usize,
    pub current_page: usize,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCarRequest {
    pub model: String,
    pub price: i64,
    #[serde(default)]
    pub rating: f64,
    pub category: String,
    pub brand: String,
}

impl From<AddCarRequest> for Car {
    fn from(req: AddCarRequest) -> Self {
        Car {
            model: req.model,
            price: req.price,
            rating: req.rating,
            category: req.category,
            brand: req.brand,
        }
    }
}
