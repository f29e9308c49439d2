use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    response::IntoResponse,
};
use tracing::{error, info};

use bookeasy_mail::{MailAttachment, compose};
use bookeasy_types::api::StatusResponse;

use crate::error::{ApiError, Result, internal};
use crate::state::AppState;

/// Body limit for the support form, attachment included.
pub const MAX_SUPPORT_BODY: usize = 10 * 1024 * 1024;

struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// POST /send-support-message: multipart form with `email`, `message` and an
/// optional `attachment` file. The attachment is kept in the upload directory
/// and forwarded with the mail to the support mailbox.
pub async fn send_support_message(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut multipart = multipart?;

    let mut email = String::new();
    let mut message = String::new();
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("email") => email = field.text().await?,
            Some("message") => message = field.text().await?,
            Some("attachment") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                // Browsers submit an empty part when no file was picked
                if !data.is_empty() {
                    upload = Some(Upload {
                        filename,
                        content_type,
                        data: data.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let email = email.trim().to_string();
    if email.is_empty() || message.trim().is_empty() {
        return Err(ApiError::BadRequest("Email and message are required".into()));
    }

    let attachment = match upload {
        Some(upload) => {
            let stored = state
                .uploads
                .save_attachment(upload.filename.as_deref(), &upload.data)
                .await
                .map_err(internal("Failed to save file"))?;

            Some(MailAttachment {
                filename: upload.filename.unwrap_or_else(|| stored.clone()),
                content_type: upload
                    .content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                data: upload.data,
            })
        }
        None => None,
    };

    state
        .mailer
        .send(compose::support_request(
            &state.support_mailbox,
            &email,
            &message,
            attachment,
        ))
        .await
        .map_err(|e| {
            error!("Failed to send support mail from {}: {}", email, e);
            ApiError::Internal("Failed to send email".into())
        })?;

    info!("Support request from {} forwarded", email);

    Ok(Json(StatusResponse::success("Message sent successfully")))
}
