use std::sync::RwLock;

use axum::{
    Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use bookeasy_types::api::{AddCarRequest, CarPage, CarQuery};
use bookeasy_types::models::Car;

use crate::error::{ApiError, Result};
use crate::state::AppState;

pub const CARS_PER_PAGE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Cheapest first.
    Price,
    /// Best rated first.
    Rating,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price" => Some(SortKey::Price),
            "rating" => Some(SortKey::Rating),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CarFilter<'a> {
    pub category: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub sort: Option<SortKey>,
}

/// In-memory car list shared by all requests.
pub struct Catalog {
    cars: RwLock<Vec<Car>>,
}

impl Catalog {
    pub fn new(cars: Vec<Car>) -> Self {
        Self {
            cars: RwLock::new(cars),
        }
    }

    pub fn seeded() -> Self {
        Self::new(seed_cars())
    }

    pub fn all(&self) -> Vec<Car> {
        self.cars.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn add(&self, car: Car) {
        self.cars.write().unwrap_or_else(|e| e.into_inner()).push(car);
    }

    pub fn page(&self, filter: &CarFilter<'_>, page: usize) -> CarPage {
        let cars = self.cars.read().unwrap_or_else(|e| e.into_inner());
        select(&cars, filter, page)
    }
}

/// Filters, sorts (stable) and cuts one page out of `cars`. `page` is 1-based.
pub fn select(cars: &[Car], filter: &CarFilter<'_>, page: usize) -> CarPage {
    let mut matching: Vec<Car> = cars
        .iter()
        .filter(|car| filter.category.is_none_or(|c| car.category == c))
        .filter(|car| filter.brand.is_none_or(|b| car.brand == b))
        .cloned()
        .collect();

    match filter.sort {
        Some(SortKey::Price) => matching.sort_by_key(|car| car.price),
        Some(SortKey::Rating) => matching.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        None => {}
    }

    let page = page.max(1);
    let total_pages = matching.len().div_ceil(CARS_PER_PAGE);
    let start = (page - 1).saturating_mul(CARS_PER_PAGE).min(matching.len());
    let end = (start + CARS_PER_PAGE).min(matching.len());

    CarPage {
        cars: matching.drain(start..end).collect(),
        total_pages,
        current_page: page,
    }
}

/// Missing, unparsable and non-positive values all mean page 1.
fn parse_page(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<i64>().ok())
        .filter(|p| *p > 0)
        .map_or(1, |p| p as usize)
}

/// GET /cars?category=&brand=&sort=&page=
pub async fn list_cars(
    State(state): State<AppState>,
    params: std::result::Result<Query<CarQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params?;
    let filter = CarFilter {
        category: params.category.as_deref().filter(|c| !c.is_empty()),
        brand: params.brand.as_deref().filter(|b| !b.is_empty()),
        sort: params.sort.as_deref().and_then(SortKey::parse),
    };
    let page = parse_page(params.page.as_deref());

    Ok(Json(state.catalog.page(&filter, page)))
}

/// GET /api/cars
pub async fn all_cars(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.all())
}

/// POST /api/cars/add
pub async fn add_car(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddCarRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    if req.model.trim().is_empty() {
        return Err(ApiError::BadRequest("Model is required".into()));
    }
    if req.price < 0 {
        return Err(ApiError::BadRequest("Price must not be negative".into()));
    }
    if !(0.0..=5.0).contains(&req.rating) {
        return Err(ApiError::BadRequest("Rating must be between 0 and 5".into()));
    }

    let car = Car::from(req);
    state.catalog.add(car.clone());
    info!("Added {} to the catalog", car.model);

    Ok((StatusCode::CREATED, Json(car)))
}

fn seed_cars() -> Vec<Car> {
    vec![
        Car::new("Toyota Corolla", 50, 4.5, "Sedan", "Toyota"),
        Car::new("Ford Explorer", 80, 4.0, "SUV", "Ford"),
        Car::new("Tesla Model 3", 120, 5.0, "Electric", "Tesla"),
        Car::new("Honda Civic", 40, 4.2, "Sedan", "Honda"),
        Car::new("BMW XM", 200, 5.0, "SUV", "BMW"),
        Car::new("Cadillac Escalade", 150, 4.8, "SUV", "Cadillac"),
        Car::new("Rolls Royce Cullinan", 5000, 5.0, "SUV", "Rolls Royce"),
        Car::new("Mercedes G63", 300, 4.9, "SUV", "Mercedes"),
        Car::new("Mercedes GLE53", 150, 4.5, "SUV", "Mercedes"),
        Car::new("GMC SLT", 100, 4.0, "SUV", "GMC"),
        Car::new("Porsche Macan", 300, 4.7, "SUV", "Porsche"),
        Car::new("Nissan Patrol", 100, 4.2, "SUV", "Nissan"),
        Car::new("BMW M4 Competition", 200, 4.8, "Sedan", "BMW"),
        Car::new("Audi RS3", 220, 4.6, "Sedan", "Audi"),
        Car::new("Audi RS5", 270, 4.7, "Sedan", "Audi"),
        Car::new("Audi S8", 300, 4.9, "Sedan", "Audi"),
        Car::new("BMW 730LI", 290, 4.6, "Sedan", "BMW"),
        Car::new("Mercedes EQE 350", 120, 4.5, "Electric", "Mercedes"),
        Car::new("Tesla Model 3", 120, 5.0, "Electric", "Tesla"),
        Car::new("Porsche 718", 4718, 4.9, "Sports", "Porsche"),
        Car::new("Porsche 911 Turbo S", 9000, 5.0, "Sports", "Porsche"),
        Car::new("Ferrari F8 Tributo", 9999, 5.0, "Sports", "Ferrari"),
        Car::new("Audi R8", 2000, 4.8, "Sports", "Audi"),
        Car::new("Audi RS6", 300, 4.7, "Sports", "Audi"),
        Car::new("Mercedes V250", 2500, 4.6, "Van", "Mercedes"),
    ]
}
