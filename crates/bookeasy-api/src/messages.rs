use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use bookeasy_db::models::MessageRow;
use bookeasy_types::api::{SendMessageRequest, StatusResponse};
use bookeasy_types::models::Message;

use crate::error::{ApiError, Result};
use crate::state::{AppState, query};

/// POST /send-chat-message and POST /contact
pub async fn send_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Invalid form data".into()));
    }

    let id = query(&state, "Failed to save message", move |db| db.insert_message(&req.message)).await?;
    info!("Stored message {}", id);

    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::success("Message sent successfully")),
    ))
}

pub async fn get_messages(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rows = query(&state, "Failed to load messages", |db| db.get_messages()).await?;
    let messages: Vec<Message> = rows.into_iter().map(to_message).collect();
    Ok(Json(messages))
}

pub async fn get_message(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(id) = path?;

    let row = query(&state, "Failed to load messages", move |db| db.get_message(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Message {} not found", id)))?;

    Ok(Json(to_message(row)))
}

pub async fn clear_messages(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let removed = query(&state, "Failed to clear messages", |db| db.clear_messages()).await?;
    info!("Cleared {} messages", removed);

    Ok(Json(StatusResponse::success(format!(
        "Messages cleared ({} removed)",
        removed
    ))))
}

fn to_message(row: MessageRow) -> Message {
    let created_at = parse_timestamp(&row.created_at).unwrap_or_else(|| {
        warn!("Corrupt created_at '{}' on message {}", row.created_at, row.id);
        DateTime::default()
    });

    Message {
        id: row.id,
        content: row.content,
        created_at,
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}
