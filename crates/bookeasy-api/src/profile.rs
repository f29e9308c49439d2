use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

use bookeasy_types::api::ProfileQuery;
use bookeasy_types::models::UserProfile;

use crate::error::{ApiError, Result};
use crate::state::{AppState, query};

pub async fn get_profile(
    State(state): State<AppState>,
    params: std::result::Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params?;
    let email = params
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email not provided".into()))?;

    let user = query(&state, "Database error", move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(UserProfile {
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
    }))
}
