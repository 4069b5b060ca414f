use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification category enumeration
///
/// Categories drive toast presentation (icon, severity, duration) but never
/// behavior. Unknown wire values decode to `Other` so that new server-side
/// categories cannot break an older client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    /// Account lifecycle events (registration, profile changes)
    Account,
    /// Appointment bookings, reschedules, cancellations
    Appointment,
    /// Lab/medical report availability
    Report,
    /// Security-relevant events (logins, password changes)
    Security,
    /// Anything else
    #[serde(other)]
    Other,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Account => "account",
            NotificationType::Appointment => "appointment",
            NotificationType::Report => "report",
            NotificationType::Security => "security",
            NotificationType::Other => "other",
        }
    }
}

/// Core notification model
///
/// Arrives either via bulk load (REST) or via push (STOMP message frame);
/// both paths carry the same camelCase JSON encoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique within the store's held collection, stable across load and push
    pub id: i64,

    /// Owning user (opaque identifier, also used for channel addressing)
    pub recipient_user_id: String,

    /// Notification category
    #[serde(rename = "type")]
    pub kind: NotificationType,

    /// Short display string
    pub subject: String,

    /// Optional longer display string
    #[serde(default)]
    pub message: Option<String>,

    /// Read status, mutated only via mark-read / mark-all-read
    pub is_read: bool,

    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Text shown in the toast cue: prefers the long message, falls back to
    /// the subject.
    pub fn display_text(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.subject)
    }
}

/// Envelope for list endpoints (`{ "data": [...] }`)
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Notification>,
}

/// Envelope for the unread-count endpoint (`{ "count": n }`)
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}
