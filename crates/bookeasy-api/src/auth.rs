use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, info};

use bookeasy_db::NewUser;
use bookeasy_mail::compose;
use bookeasy_types::api::{ConfirmQuery, LoginRequest, RegisterRequest, StatusResponse};

use crate::error::{ApiError, Result, internal};
use crate::state::{AppState, query};

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    if !req.is_complete() {
        return Err(ApiError::BadRequest("Invalid form data".into()));
    }
    let email = req.email.clone();

    // Check if email is taken
    let lookup = email.clone();
    if query(&state, "Failed to save data", move |db| db.get_user_by_email(&lookup))
        .await?
        .is_some()
    {
        return Err(email_taken());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(internal("Failed to save data"))?
        .to_string();

    let token = generate_confirmation_token();

    let stored_token = token.clone();
    let inserted = query(&state, "Failed to save data", move |db| {
        db.create_user(&NewUser {
            first_name: &req.first_name,
            last_name: &req.last_name,
            email: &req.email,
            password_hash: &password_hash,
            confirmation_token: &stored_token,
        })
    })
    .await?;

    // Lost a race with a concurrent registration of the same email
    let Some(user_id) = inserted else {
        return Err(email_taken());
    };

    state
        .mailer
        .send(compose::confirmation(&email, &state.public_url, &token))
        .await
        .map_err(|e| {
            error!("Failed to send confirmation mail to {}: {}", email, e);
            ApiError::Internal("Failed to send email".into())
        })?;

    info!("Registered user {} <{}>", user_id, email);

    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::success(
            "User registered. Check your email to confirm the registration.",
        )),
    ))
}

pub async fn confirm(
    State(state): State<AppState>,
    params: std::result::Result<Query<ConfirmQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params?;
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Token not provided".into()))?;

    let confirmed = query(&state, "Database error", move |db| db.confirm_user(&token)).await?;
    if !confirmed {
        return Err(ApiError::BadRequest("Invalid token".into()));
    }

    Ok(Json(StatusResponse::success(
        "Registration confirmed. You can now log in.",
    )))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("Invalid form data".into()));
    }

    let email = req.email.clone();
    let user = query(&state, "Database error", move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(internal("Database error"))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Wrong password".into()))?;

    if !user.is_confirmed {
        return Err(ApiError::Forbidden("Confirm your email before logging in".into()));
    }

    Ok(Json(StatusResponse::success("Logged in successfully")))
}

/// 32 random bytes as lowercase hex.
pub fn generate_confirmation_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn email_taken() -> ApiError {
    ApiError::Conflict("A user with this email already exists".into())
}
