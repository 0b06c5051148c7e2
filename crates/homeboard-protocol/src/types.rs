use serde::{Deserialize, Serialize};

/// The server keeps only the newest 50 notifications; the client mirrors that.
pub const MAX_NOTIFICATIONS: usize = 50;

/// Severity of a notification. Unknown kinds from newer servers map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Info,
    Warning,
    Success,
    Error,
    #[serde(other)]
    Other,
}

/// A server-owned notification record.
///
/// The only client-side mutation is flipping `read` after the "mark read"
/// request has been fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// ISO-8601 timestamp as sent by the server.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
}

/// Body of `GET /api/notifications`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationList {
    #[serde(default)]
    pub notifications: Vec<Notification>,
}
