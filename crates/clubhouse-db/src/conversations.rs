//! Conversation Aggregator: folds the message log into per-counterpart
//! summaries for one viewer. Holds no state of its own.

use std::collections::HashMap;

use clubhouse_types::{ConversationSummary, Message, PrincipalRef};

use crate::Database;
use crate::error::StoreResult;
use crate::messages::query_involving;
use crate::principals::resolve_in;

/// Group `messages` by the participant other than `viewer` and summarize each
/// group. Messages not involving `viewer` are ignored.
///
/// The last message of a group is the one with the greatest id. Output is
/// ordered by last message time descending, then by counterpart
/// `(kind, id)` ascending.
pub fn summarize(viewer: PrincipalRef, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut groups: HashMap<PrincipalRef, ConversationSummary> = HashMap::new();

    for msg in messages {
        let Some(other) = msg.counterpart_of(viewer) else {
            continue;
        };
        let unread = u32::from(msg.is_unread_by(viewer));

        groups
            .entry(other)
            .and_modify(|summary| {
                if msg.message_id > summary.last_message_id {
                    summary.last_message_id = msg.message_id;
                    summary.last_message_text.clone_from(&msg.text);
                    summary.last_message_at = msg.sent_at;
                }
                summary.unread_count += unread;
            })
            .or_insert_with(|| ConversationSummary {
                other,
                last_message_id: msg.message_id,
                last_message_text: msg.text.clone(),
                last_message_at: msg.sent_at,
                unread_count: unread,
            });
    }

    let mut summaries: Vec<ConversationSummary> = groups.into_values().collect();
    summaries.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.other.cmp(&b.other))
    });
    summaries
}

impl Database {
    /// Conversations for `viewer`, newest first. `NotFound` if the viewer
    /// does not resolve. Reads straight from the log, so appends and read
    /// marks are visible immediately.
    pub fn list_conversations(&self, viewer: PrincipalRef) -> StoreResult<Vec<ConversationSummary>> {
        let messages = self.with_conn(|conn| {
            resolve_in(conn, viewer.kind, viewer.id)?;
            query_involving(conn, viewer)
        })?;

        Ok(summarize(viewer, &messages))
    }
}
