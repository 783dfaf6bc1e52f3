//! Database row types: these map directly to SQLite rows.
//! Conversion into clubhouse-types values happens after the statement is done,
//! so decode failures surface as `StoreError::InvalidData` rather than SQLite errors.

use chrono::{DateTime, SecondsFormat, Utc};
use clubhouse_types::{Message, PrincipalKind, PrincipalRef};

use crate::error::{StoreError, StoreResult};

pub struct RelationRow {
    pub id: i64,
    pub student_id: i64,
    pub club_id: i64,
    pub created_at: String,
    pub student_name: String,
    pub club_name: String,
}

pub struct MessageRow {
    pub id: i64,
    pub sender_kind: String,
    pub sender_id: i64,
    pub receiver_kind: String,
    pub receiver_id: i64,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
}

impl MessageRow {
    pub const COLUMNS: &'static str =
        "id, sender_kind, sender_id, receiver_kind, receiver_id, body, sent_at, read_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender_kind: row.get(1)?,
            sender_id: row.get(2)?,
            receiver_kind: row.get(3)?,
            receiver_id: row.get(4)?,
            body: row.get(5)?,
            sent_at: row.get(6)?,
            read_at: row.get(7)?,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> StoreResult<Self> {
        Ok(Message {
            message_id: row.id,
            sender: PrincipalRef {
                kind: parse_kind(&row.sender_kind)?,
                id: row.sender_id,
            },
            receiver: PrincipalRef {
                kind: parse_kind(&row.receiver_kind)?,
                id: row.receiver_id,
            },
            text: row.body,
            sent_at: parse_timestamp(&row.sent_at)?,
            read_at: row.read_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_kind(s: &str) -> StoreResult<PrincipalKind> {
    s.parse()
        .map_err(|e| StoreError::InvalidData(format!("{}", e)))
}

/// Timestamps are stored as RFC 3339 UTC text with microsecond precision,
/// which sorts lexicographically in time order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_round_trip_at_microsecond_precision() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn corrupt_kind_is_invalid_data() {
        let row = MessageRow {
            id: 1,
            sender_kind: "faculty".into(),
            sender_id: 1,
            receiver_kind: "club".into(),
            receiver_id: 1,
            body: "x".into(),
            sent_at: "2024-01-01T00:00:00.000000Z".into(),
            read_at: None,
        };
        assert!(matches!(Message::try_from(row), Err(StoreError::InvalidData(_))));
    }
}
