pub mod auth;
pub mod cars;
pub mod error;
pub mod messages;
pub mod profile;
pub mod state;
pub mod storage;
pub mod support;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

pub use state::{AppState, AppStateInner};

/// All JSON endpoints. Static files and tracing are layered on by the binary.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/register", post(auth::register))
        .route("/confirm", get(auth::confirm))
        .route("/login", post(auth::login))
        .route("/profile", get(profile::get_profile))
        .route(
            "/send-support-message",
            post(support::send_support_message)
                .layer(DefaultBodyLimit::max(support::MAX_SUPPORT_BODY)),
        )
        .route("/send-chat-message", post(messages::send_message))
        .route("/contact", post(messages::send_message))
        .route("/messages", get(messages::get_messages))
        .route("/messages/{id}", get(messages::get_message))
        .route("/clear-messages", post(messages::clear_messages))
        .route("/cars", get(cars::list_cars))
        .route("/api/cars", get(cars::all_cars))
        .route("/api/cars/add", post(cars::add_car))
        .layer(cors)
        .with_state(state)
}
