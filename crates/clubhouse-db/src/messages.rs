//! Message Log: append-only direct messages between any two principals.

use chrono::{DateTime, Utc};
use clubhouse_types::{Message, PrincipalRef};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::Database;
use crate::error::{StoreError, StoreResult};
use crate::models::{MessageRow, format_timestamp, parse_timestamp};
use crate::principals::resolve_in;

/// Longest accepted message body, in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Validate and normalize a message body. Returns the trimmed text.
pub fn validate_text(text: &str) -> StoreResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("message text must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(StoreError::Validation(format!(
            "message text exceeds {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(trimmed)
}

impl Database {
    /// Store a new message. Validation runs before anything is resolved or
    /// written; resolution and insert share one transaction.
    ///
    /// `sent_at` never goes backwards: if the wall clock is behind the newest
    /// stored message, the new message reuses that timestamp, and the
    /// strictly increasing id breaks the tie.
    pub fn append_message(
        &self,
        sender: PrincipalRef,
        receiver: PrincipalRef,
        text: &str,
    ) -> StoreResult<Message> {
        let body = validate_text(text)?;
        if sender == receiver {
            return Err(StoreError::Validation(
                "sender and receiver must be different principals".into(),
            ));
        }

        let message = self.transact(|conn| {
            resolve_in(conn, sender.kind, sender.id)?;
            resolve_in(conn, receiver.kind, receiver.id)?;

            let sent_at = next_sent_at(conn, Utc::now())?;
            conn.execute(
                "INSERT INTO messages (sender_kind, sender_id, receiver_kind, receiver_id, body, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    sender.kind.as_str(),
                    sender.id,
                    receiver.kind.as_str(),
                    receiver.id,
                    body,
                    format_timestamp(sent_at),
                ],
            )?;

            let id = conn.last_insert_rowid();
            query_message(conn, id)?
                .ok_or_else(|| StoreError::InvalidData(format!("message {} missing after insert", id)))
        })?;

        debug!("Message {} appended: {} -> {}", message.message_id, sender, receiver);
        Ok(message)
    }

    /// Mark every unread message from `other` to `viewer` as read. Returns
    /// how many changed; a repeat call with nothing new returns 0.
    pub fn mark_read(&self, viewer: PrincipalRef, other: PrincipalRef) -> StoreResult<usize> {
        let marked = self.transact(|conn| {
            resolve_in(conn, viewer.kind, viewer.id)?;
            resolve_in(conn, other.kind, other.id)?;

            Ok(conn.execute(
                "UPDATE messages SET read_at = ?1
                 WHERE receiver_kind = ?2 AND receiver_id = ?3
                   AND sender_kind = ?4 AND sender_id = ?5
                   AND read_at IS NULL",
                params![
                    format_timestamp(Utc::now()),
                    viewer.kind.as_str(),
                    viewer.id,
                    other.kind.as_str(),
                    other.id,
                ],
            )?)
        })?;

        debug!("{} marked {} message(s) from {} read", viewer, marked, other);
        Ok(marked)
    }

    /// Mark one message read on behalf of its receiver. `NotFound` if the
    /// message does not exist or `viewer` did not receive it. Returns whether
    /// `read_at` changed.
    pub fn mark_message_read(&self, viewer: PrincipalRef, message_id: i64) -> StoreResult<bool> {
        self.transact(|conn| {
            let message = query_message(conn, message_id)?
                .filter(|m| m.receiver == viewer)
                .ok_or_else(|| {
                    StoreError::NotFound(format!("message {} for {}", message_id, viewer))
                })?;

            if message.read_at.is_some() {
                return Ok(false);
            }

            conn.execute(
                "UPDATE messages SET read_at = ?1 WHERE id = ?2 AND read_at IS NULL",
                params![format_timestamp(Utc::now()), message_id],
            )?;
            Ok(true)
        })
    }

    /// The full thread between `a` and `b` in both directions, oldest first.
    pub fn list_between(&self, a: PrincipalRef, b: PrincipalRef) -> StoreResult<Vec<Message>> {
        self.with_conn(|conn| {
            resolve_in(conn, a.kind, a.id)?;
            resolve_in(conn, b.kind, b.id)?;

            let sql = format!(
                "SELECT {} FROM messages
                 WHERE (sender_kind = ?1 AND sender_id = ?2 AND receiver_kind = ?3 AND receiver_id = ?4)
                    OR (sender_kind = ?3 AND sender_id = ?4 AND receiver_kind = ?1 AND receiver_id = ?2)
                 ORDER BY id ASC",
                MessageRow::COLUMNS
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt
                .query_map(
                    params![a.kind.as_str(), a.id, b.kind.as_str(), b.id],
                    MessageRow::from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter().map(Message::try_from).collect()
        })
    }

    pub fn get_message(&self, message_id: i64) -> StoreResult<Option<Message>> {
        self.with_conn(|conn| query_message(conn, message_id))
    }
}

/// `max(now, newest stored sent_at)`.
fn next_sent_at(conn: &Connection, now: DateTime<Utc>) -> StoreResult<DateTime<Utc>> {
    let latest: Option<String> = conn
        .query_row("SELECT sent_at FROM messages ORDER BY id DESC LIMIT 1", [], |r| r.get(0))
        .optional()?;

    match latest {
        Some(ts) => Ok(now.max(parse_timestamp(&ts)?)),
        None => Ok(now),
    }
}

fn query_message(conn: &Connection, id: i64) -> StoreResult<Option<Message>> {
    let sql = format!("SELECT {} FROM messages WHERE id = ?1", MessageRow::COLUMNS);
    let row = conn
        .prepare_cached(&sql)?
        .query_row([id], MessageRow::from_row)
        .optional()?;

    row.map(Message::try_from).transpose()
}

pub(crate) fn query_involving(conn: &Connection, viewer: PrincipalRef) -> StoreResult<Vec<Message>> {
    let sql = format!(
        "SELECT {} FROM messages
         WHERE (sender_kind = ?1 AND sender_id = ?2)
            OR (receiver_kind = ?1 AND receiver_id = ?2)
         ORDER BY id ASC",
        MessageRow::COLUMNS
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt
        .query_map(params![viewer.kind.as_str(), viewer.id], MessageRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(Message::try_from).collect()
}
