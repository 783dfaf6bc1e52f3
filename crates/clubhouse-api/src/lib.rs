//! Relationship Query Façade: HTTP handlers over the clubhouse store.
//!
//! Handlers translate path/body identifiers into `PrincipalRef`s, call the
//! store on a blocking thread, and map store errors onto HTTP statuses.
//! No business rules live here.

pub mod bookmarks;
pub mod conversations;
pub mod error;
pub mod extract;
pub mod members;
pub mod messages;
pub mod routes;
pub mod state;
pub mod utility;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
