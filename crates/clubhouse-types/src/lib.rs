pub mod api;
pub mod models;

pub use models::{
    Bookmark, ConversationSummary, Membership, Message, ParseKindError, PrincipalKind,
    PrincipalRef,
};
