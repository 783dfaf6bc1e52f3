use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use clubhouse_db::NamedRelation;
use clubhouse_types::api::{AddBookmarkRequest, BookmarkResponse, RemovedResponse};
use clubhouse_types::{Bookmark, PrincipalRef};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, run_blocking};

fn to_response(row: NamedRelation<Bookmark>) -> BookmarkResponse {
    BookmarkResponse {
        bookmark: row.relation,
        club_name: row.club_name,
    }
}

/// GET /students/{student_id}/bookmarks
pub async fn list_bookmarks(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(&state, move |db| db.bookmarks().list_for_student(student_id)).await?;
    let bookmarks: Vec<BookmarkResponse> = rows.into_iter().map(to_response).collect();
    Ok(Json(bookmarks))
}

/// POST /students/{student_id}/bookmarks: 201 for a new bookmark, 200 with
/// the existing row if the club was already bookmarked.
pub async fn add_bookmark(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
    ApiJson(req): ApiJson<AddBookmarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let club_id = req.club_id;
    let (outcome, club_name) = run_blocking(&state, move |db| {
        let outcome = db.bookmarks().add(student_id, club_id)?;
        let club_name = db.display_name(PrincipalRef::club(club_id))?;
        Ok((outcome, club_name))
    })
    .await?;

    let status = if outcome.created {
        info!("Student {} bookmarked club {}", student_id, club_id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(BookmarkResponse {
            bookmark: outcome.relation,
            club_name,
        }),
    ))
}

/// DELETE /students/{student_id}/bookmarks/{club_id}: never fails for an
/// absent bookmark; reports `removed: false` instead.
pub async fn remove_bookmark(
    State(state): State<AppState>,
    ApiPath((student_id, club_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = run_blocking(&state, move |db| db.bookmarks().remove(student_id, club_id)).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// DELETE /bookmarks/{bookmark_id}
pub async fn remove_bookmark_by_id(
    State(state): State<AppState>,
    ApiPath(bookmark_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = run_blocking(&state, move |db| db.bookmarks().remove_by_id(bookmark_id)).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("bookmark {} not found", bookmark_id)));
    }
    Ok(Json(RemovedResponse { removed }))
}
