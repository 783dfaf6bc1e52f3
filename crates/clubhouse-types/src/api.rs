use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bookmark, Membership, PrincipalKind};

// -- Relations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBookmarkRequest {
    #[serde(rename = "clubID")]
    pub club_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinClubRequest {
    #[serde(rename = "studentID")]
    pub student_id: i64,
}

/// A bookmark as listed for a student, with the bookmarked club's name.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    pub club_name: String,
}

/// A membership row as shown on a club's member list or a student's club list.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    #[serde(flatten)]
    pub membership: Membership,
    pub student_name: String,
    pub club_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipStatus {
    pub is_member: bool,
    pub is_bookmarked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    #[serde(rename = "senderID")]
    pub sender_id: i64,
    #[serde(rename = "senderType")]
    pub sender_type: String,
    #[serde(rename = "receiverID")]
    pub receiver_id: i64,
    #[serde(rename = "receiverType")]
    pub receiver_type: String,
    #[serde(rename = "messageText")]
    pub message_text: String,
}

/// Identifies the other side of a thread in query strings.
#[derive(Debug, Deserialize)]
pub struct CounterpartQuery {
    #[serde(rename = "otherID")]
    pub other_id: i64,
    #[serde(rename = "otherType")]
    pub other_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(rename = "messageID")]
    pub message_id: i64,
    #[serde(rename = "senderID")]
    pub sender_id: i64,
    #[serde(rename = "senderType")]
    pub sender_type: PrincipalKind,
    #[serde(rename = "senderName")]
    pub sender_name: String,
    #[serde(rename = "receiverID")]
    pub receiver_id: i64,
    #[serde(rename = "receiverType")]
    pub receiver_type: PrincipalKind,
    #[serde(rename = "receiverName")]
    pub receiver_name: String,
    #[serde(rename = "messageText")]
    pub message_text: String,
    #[serde(rename = "sentAt")]
    pub sent_at: DateTime<Utc>,
    #[serde(rename = "readAt")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(rename = "isRead")]
    pub is_read: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    #[serde(rename = "otherUserID")]
    pub other_user_id: i64,
    #[serde(rename = "otherUserType")]
    pub other_user_type: PrincipalKind,
    #[serde(rename = "otherUserName")]
    pub other_user_name: String,
    #[serde(rename = "lastMessageID")]
    pub last_message_id: i64,
    #[serde(rename = "lastMessage")]
    pub last_message: String,
    #[serde(rename = "lastMessageTime")]
    pub last_message_time: DateTime<Utc>,
    #[serde(rename = "unreadCount")]
    pub unread_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkedResponse {
    pub marked: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

// -- Utility --

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_students: u64,
    pub total_clubs: u64,
    pub total_memberships: u64,
    pub total_bookmarks: u64,
    pub total_messages: u64,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
