use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use clubhouse_types::api::{
    CounterpartQuery, MarkedResponse, MessageResponse, SendMessageRequest, UpdatedResponse,
};
use clubhouse_types::{Message, PrincipalRef};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::{AppState, principal, run_blocking};

fn name_of(names: &HashMap<PrincipalRef, String>, who: PrincipalRef) -> String {
    names.get(&who).cloned().unwrap_or_else(|| "unknown".to_string())
}

fn to_response(msg: Message, names: &HashMap<PrincipalRef, String>) -> MessageResponse {
    MessageResponse {
        message_id: msg.message_id,
        sender_id: msg.sender.id,
        sender_type: msg.sender.kind,
        sender_name: name_of(names, msg.sender),
        receiver_id: msg.receiver.id,
        receiver_type: msg.receiver.kind,
        receiver_name: name_of(names, msg.receiver),
        message_text: msg.text,
        sent_at: msg.sent_at,
        is_read: msg.read_at.is_some(),
        read_at: msg.read_at,
    }
}

/// POST /messages
pub async fn send_message(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sender = principal(&req.sender_type, req.sender_id)?;
    let receiver = principal(&req.receiver_type, req.receiver_id)?;
    let text = req.message_text;

    let (message, names) = run_blocking(&state, move |db| {
        let message = db.append_message(sender, receiver, &text)?;
        let names = db.display_names(&[sender, receiver])?;
        Ok((message, names))
    })
    .await?;

    info!("Message {} sent: {} -> {}", message.message_id, sender, receiver);
    Ok((StatusCode::CREATED, Json(to_response(message, &names))))
}

/// GET /messages/{kind}/{id}?otherID=&otherType=: the thread between the
/// path principal and the query principal, oldest first.
pub async fn get_thread(
    State(state): State<AppState>,
    ApiPath((kind, id)): ApiPath<(String, i64)>,
    ApiQuery(query): ApiQuery<CounterpartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = principal(&kind, id)?;
    let other = principal(&query.other_type, query.other_id)?;

    let (thread, names) = run_blocking(&state, move |db| {
        let thread = db.list_between(viewer, other)?;
        let names = db.display_names(&[viewer, other])?;
        Ok((thread, names))
    })
    .await?;

    let messages: Vec<MessageResponse> = thread
        .into_iter()
        .map(|msg| to_response(msg, &names))
        .collect();
    Ok(Json(messages))
}

/// PUT /messages/{kind}/{id}/read?otherID=&otherType=: marks everything the
/// query principal sent to the path principal as read.
pub async fn mark_thread_read(
    State(state): State<AppState>,
    ApiPath((kind, id)): ApiPath<(String, i64)>,
    ApiQuery(query): ApiQuery<CounterpartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = principal(&kind, id)?;
    let other = principal(&query.other_type, query.other_id)?;

    let marked = run_blocking(&state, move |db| db.mark_read(viewer, other)).await?;
    Ok(Json(MarkedResponse { marked }))
}

/// PUT /messages/{kind}/{id}/read/{message_id}
pub async fn mark_message_read(
    State(state): State<AppState>,
    ApiPath((kind, id, message_id)): ApiPath<(String, i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = principal(&kind, id)?;

    let updated = run_blocking(&state, move |db| db.mark_message_read(viewer, message_id)).await?;
    Ok(Json(UpdatedResponse { updated }))
}
