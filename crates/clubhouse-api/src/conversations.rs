use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use clubhouse_types::PrincipalRef;
use clubhouse_types::api::ConversationResponse;

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::{AppState, principal, run_blocking};

/// GET /conversations/{kind}/{id}
pub async fn list_conversations(
    State(state): State<AppState>,
    ApiPath((kind, id)): ApiPath<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = principal(&kind, id)?;

    let (summaries, names) = run_blocking(&state, move |db| {
        let summaries = db.list_conversations(viewer)?;
        let others: Vec<PrincipalRef> = summaries.iter().map(|s| s.other).collect();
        let names = db.display_names(&others)?;
        Ok((summaries, names))
    })
    .await?;

    let conversations: Vec<ConversationResponse> = summaries
        .into_iter()
        .map(|s| ConversationResponse {
            other_user_id: s.other.id,
            other_user_type: s.other.kind,
            other_user_name: names
                .get(&s.other)
                .cloned()
                .unwrap_or_else(|| "unknown".to_string()),
            last_message_id: s.last_message_id,
            last_message: s.last_message_text,
            last_message_time: s.last_message_at,
            unread_count: s.unread_count,
        })
        .collect();

    Ok(Json(conversations))
}
