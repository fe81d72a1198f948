//! The assistant chat endpoint.
//!
//! POST /chat accepts a multipart form with `userId`, an optional `message`,
//! and an optional `image` (size-capped, image mime types only). Each
//! request is one-shot: load history, assemble context, call the model,
//! persist the extended history.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::db::Turn;
use crate::services::ImageAttachment;
use crate::{Error, Result};

use super::AssistantState;

/// Build the assistant routes.
pub fn routes(max_upload_size: usize) -> Router<AssistantState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        // Leave headroom for the multipart framing around the image.
        .layer(DefaultBodyLimit::max(max_upload_size + 64 * 1024))
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

async fn health(State(state): State<AssistantState>) -> Json<serde_json::Value> {
    let llm_error = state.llm.get_error_info().await;

    Json(json!({
        "status": "healthy",
        "llm": {
            "available": state.llm.is_available(),
            "last_error": llm_error.as_ref().map(|(msg, _)| msg),
            "consecutive_errors": llm_error.map(|(_, count)| count).unwrap_or(0),
        }
    }))
}

/// Parsed multipart form for a chat request.
#[derive(Debug, Default)]
struct ChatForm {
    user_id: Option<String>,
    message: Option<String>,
    image: Option<ImageAttachment>,
}

async fn parse_chat_form(
    mut multipart: Multipart,
    max_image_size: usize,
) -> Result<ChatForm> {
    let mut form = ChatForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "userId" | "user_id" => {
                form.user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| Error::InvalidInput(format!("Invalid userId field: {}", e)))?,
                );
            }
            "message" => {
                form.message = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| Error::InvalidInput(format!("Invalid message field: {}", e)))?,
                );
            }
            "image" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_default();

                if !content_type.starts_with("image/") {
                    return Err(Error::InvalidFileType(content_type));
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::InvalidInput(format!("Failed to read image: {}", e)))?;

                if data.len() > max_image_size {
                    return Err(Error::FileTooLarge {
                        max_size: max_image_size,
                    });
                }

                form.image = Some(ImageAttachment {
                    mime_type: content_type,
                    data: data.to_vec(),
                });
            }
            _ => continue,
        }
    }

    Ok(form)
}

/// Handle one chat request.
#[axum::debug_handler]
async fn chat(
    State(state): State<AssistantState>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>> {
    let form = parse_chat_form(multipart, state.max_image_size).await?;

    let user_id = form
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::Validation("userId is required".to_string()))?;

    let message = form.message.unwrap_or_default();
    if message.trim().is_empty() && form.image.is_none() {
        return Err(Error::Validation(
            "Either a message or an image is required".to_string(),
        ));
    }

    // Load (or seed) the conversation and assemble grounding context.
    let mut history = state.history.load(&user_id).await;
    let context = state.fetcher.build_context(&user_id, &message).await;

    info!(
        user_id = %user_id,
        intents = ?context.intents,
        used_fallback = context.used_fallback,
        has_image = form.image.is_some(),
        "Handling chat request"
    );

    // The persisted turn is text-only; the image rides along on the model
    // call and is noted as an attachment.
    let mut turn_text = if message.trim().is_empty() {
        "[image attached]".to_string()
    } else if form.image.is_some() {
        format!("{}\n[image attached]", message)
    } else {
        message.clone()
    };
    turn_text.push_str(&format!("\n\n---\nCampus data:\n{}", context.text));

    history.push(Turn::user(turn_text));

    let reply = state.llm.chat(&history, form.image.as_ref()).await?;

    history.push(Turn::model(reply.clone()));
    state.history.save(&user_id, &history).await?;

    Ok(Json(ChatResponse { response: reply }))
}
