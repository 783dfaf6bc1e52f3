use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use clubhouse_db::NamedRelation;
use clubhouse_types::api::{JoinClubRequest, MembershipResponse, RelationshipStatus, RemovedResponse};
use clubhouse_types::{Membership, PrincipalKind, PrincipalRef};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::{AppState, run_blocking};

fn to_response(row: NamedRelation<Membership>) -> MembershipResponse {
    MembershipResponse {
        membership: row.relation,
        student_name: row.student_name,
        club_name: row.club_name,
    }
}

/// GET /clubs/{club_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    ApiPath(club_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(&state, move |db| db.memberships().list_for_club(club_id)).await?;
    let members: Vec<MembershipResponse> = rows.into_iter().map(to_response).collect();
    Ok(Json(members))
}

/// GET /students/{student_id}/memberships
pub async fn list_student_memberships(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_blocking(&state, move |db| db.memberships().list_for_student(student_id)).await?;
    let memberships: Vec<MembershipResponse> = rows.into_iter().map(to_response).collect();
    Ok(Json(memberships))
}

/// POST /clubs/{club_id}/members: joining twice returns the existing
/// membership with 200 instead of 201.
pub async fn join_club(
    State(state): State<AppState>,
    ApiPath(club_id): ApiPath<i64>,
    ApiJson(req): ApiJson<JoinClubRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student_id = req.student_id;
    let (outcome, mut names) = run_blocking(&state, move |db| {
        let outcome = db.memberships().add(student_id, club_id)?;
        let names = db.display_names(&[PrincipalRef::student(student_id), PrincipalRef::club(club_id)])?;
        Ok((outcome, names))
    })
    .await?;

    let status = if outcome.created {
        info!("Student {} joined club {}", student_id, club_id);
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let student_name = names
        .remove(&PrincipalRef::student(student_id))
        .unwrap_or_else(|| "unknown".to_string());
    let club_name = names
        .remove(&PrincipalRef::club(club_id))
        .unwrap_or_else(|| "unknown".to_string());

    Ok((
        status,
        Json(MembershipResponse {
            membership: outcome.relation,
            student_name,
            club_name,
        }),
    ))
}

/// DELETE /clubs/{club_id}/members/{student_id}
pub async fn leave_club(
    State(state): State<AppState>,
    ApiPath((club_id, student_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = run_blocking(&state, move |db| db.memberships().remove(student_id, club_id)).await?;
    if removed {
        info!("Student {} left club {}", student_id, club_id);
    }
    Ok(Json(RemovedResponse { removed }))
}

/// DELETE /members/{membership_id}
pub async fn leave_club_by_id(
    State(state): State<AppState>,
    ApiPath(membership_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = run_blocking(&state, move |db| db.memberships().remove_by_id(membership_id)).await?;
    if !removed {
        return Err(ApiError::NotFound(format!("membership {} not found", membership_id)));
    }
    Ok(Json(RemovedResponse { removed }))
}

/// GET /students/{student_id}/clubs/{club_id}: membership and bookmark
/// state in one call, so clients do not rescan member lists.
pub async fn relationship_status(
    State(state): State<AppState>,
    ApiPath((student_id, club_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let status = run_blocking(&state, move |db| {
        db.resolve(PrincipalKind::Student, student_id)?;
        db.resolve(PrincipalKind::Club, club_id)?;
        Ok(RelationshipStatus {
            is_member: db.memberships().contains(student_id, club_id)?,
            is_bookmarked: db.bookmarks().contains(student_id, club_id)?,
        })
    })
    .await?;

    Ok(Json(status))
}
