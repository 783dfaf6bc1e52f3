use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two kinds of addressable actors. Declaration order is the sort order
/// used when breaking ties between principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Student,
    Club,
}

impl PrincipalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Club => "club",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown principal kind '{0}' (expected 'student' or 'club')")]
pub struct ParseKindError(pub String);

impl FromStr for PrincipalKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "club" => Ok(Self::Club),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// A student or a club, identified by kind and numeric id.
///
/// Ordering is `(kind, id)` ascending, which the conversation list relies on
/// for deterministic tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: i64,
}

impl PrincipalRef {
    pub fn student(id: i64) -> Self {
        Self { kind: PrincipalKind::Student, id }
    }

    pub fn club(id: i64) -> Self {
        Self { kind: PrincipalKind::Club, id }
    }
}

impl fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A student's membership in a club. At most one per (student, club).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "membershipID")]
    pub membership_id: i64,
    #[serde(rename = "studentID")]
    pub student_id: i64,
    #[serde(rename = "clubID")]
    pub club_id: i64,
    #[serde(rename = "joinedAt")]
    pub joined_at: DateTime<Utc>,
}

/// A student's bookmark on a club. Same shape as [`Membership`], independent lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "bookmarkID")]
    pub bookmark_id: i64,
    #[serde(rename = "studentID")]
    pub student_id: i64,
    #[serde(rename = "clubID")]
    pub club_id: i64,
    #[serde(rename = "bookmarkedAt")]
    pub bookmarked_at: DateTime<Utc>,
}

/// A direct message. Immutable once stored, except `read_at` going from
/// unset to set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "messageID")]
    pub message_id: i64,
    pub sender: PrincipalRef,
    pub receiver: PrincipalRef,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// The participant that is not `viewer`, or `None` if `viewer` is not part
    /// of this message.
    pub fn counterpart_of(&self, viewer: PrincipalRef) -> Option<PrincipalRef> {
        if self.sender == viewer {
            Some(self.receiver)
        } else if self.receiver == viewer {
            Some(self.sender)
        } else {
            None
        }
    }

    pub fn is_unread_by(&self, viewer: PrincipalRef) -> bool {
        self.receiver == viewer && self.read_at.is_none()
    }
}

/// Derived view of one conversation from a viewer's perspective. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub other: PrincipalRef,
    pub last_message_id: i64,
    pub last_message_text: String,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_known_values_only() {
        assert_eq!("student".parse::<PrincipalKind>(), Ok(PrincipalKind::Student));
        assert_eq!("club".parse::<PrincipalKind>(), Ok(PrincipalKind::Club));
        assert!("Club".parse::<PrincipalKind>().is_err());
        assert!("".parse::<PrincipalKind>().is_err());
    }

    #[test]
    fn principal_refs_order_by_kind_then_id() {
        let mut refs = vec![
            PrincipalRef::club(1),
            PrincipalRef::student(9),
            PrincipalRef::student(2),
        ];
        refs.sort();
        assert_eq!(
            refs,
            vec![PrincipalRef::student(2), PrincipalRef::student(9), PrincipalRef::club(1)]
        );
    }

    #[test]
    fn counterpart_is_the_other_side() {
        let msg = Message {
            message_id: 1,
            sender: PrincipalRef::club(3),
            receiver: PrincipalRef::student(7),
            text: "hi".into(),
            sent_at: Utc::now(),
            read_at: None,
        };
        assert_eq!(msg.counterpart_of(PrincipalRef::student(7)), Some(PrincipalRef::club(3)));
        assert_eq!(msg.counterpart_of(PrincipalRef::club(3)), Some(PrincipalRef::student(7)));
        assert_eq!(msg.counterpart_of(PrincipalRef::club(4)), None);
        assert!(msg.is_unread_by(PrincipalRef::student(7)));
        assert!(!msg.is_unread_by(PrincipalRef::club(3)));
    }

    #[test]
    fn principal_serializes_as_lowercase_kind() {
        let json = serde_json::to_value(PrincipalRef::club(5)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "club", "id": 5 }));
    }
}
