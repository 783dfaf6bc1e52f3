use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;
use crate::{bookmarks, conversations, members, messages, utility};

/// Every engine route, nested under `/api`. Cross-cutting layers (CORS,
/// tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(utility::health))
        .route("/stats", get(utility::stats))
        // Bookmarks
        .route(
            "/students/{student_id}/bookmarks",
            get(bookmarks::list_bookmarks).post(bookmarks::add_bookmark),
        )
        .route(
            "/students/{student_id}/bookmarks/{club_id}",
            delete(bookmarks::remove_bookmark),
        )
        .route("/bookmarks/{bookmark_id}", delete(bookmarks::remove_bookmark_by_id))
        // Memberships
        .route(
            "/students/{student_id}/memberships",
            get(members::list_student_memberships),
        )
        .route(
            "/students/{student_id}/clubs/{club_id}",
            get(members::relationship_status),
        )
        .route(
            "/clubs/{club_id}/members",
            get(members::list_members).post(members::join_club),
        )
        .route(
            "/clubs/{club_id}/members/{student_id}",
            delete(members::leave_club),
        )
        .route("/members/{membership_id}", delete(members::leave_club_by_id))
        // Messaging
        .route("/conversations/{kind}/{id}", get(conversations::list_conversations))
        .route("/messages", post(messages::send_message))
        .route("/messages/{kind}/{id}", get(messages::get_thread))
        .route("/messages/{kind}/{id}/read", put(messages::mark_thread_read))
        .route(
            "/messages/{kind}/{id}/read/{message_id}",
            put(messages::mark_message_read),
        )
        .with_state(state);

    Router::new().nest("/api", api)
}
