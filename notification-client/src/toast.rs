/// Toast cues for inbound notifications
///
/// Every notification accepted by the channel manager produces a toast cue
/// before it is forwarded to the consumer. The cue carries presentation
/// hints only; how it is rendered is up to the embedding UI.
use crate::models::{Notification, NotificationType};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToastCue {
    pub level: ToastLevel,
    pub icon: &'static str,
    pub duration: Duration,
    pub message: String,
}

impl ToastCue {
    /// Styling is selected by notification category; security events get a
    /// longer, error-styled toast.
    pub fn for_notification(notification: &Notification) -> Self {
        let message = notification.display_text().to_string();
        match notification.kind {
            NotificationType::Account => Self {
                level: ToastLevel::Success,
                icon: "👤",
                duration: Duration::from_secs(5),
                message,
            },
            NotificationType::Appointment => Self {
                level: ToastLevel::Info,
                icon: "📅",
                duration: Duration::from_secs(5),
                message,
            },
            NotificationType::Report => Self {
                level: ToastLevel::Success,
                icon: "📄",
                duration: Duration::from_secs(5),
                message,
            },
            NotificationType::Security => Self {
                level: ToastLevel::Error,
                icon: "🔒",
                duration: Duration::from_secs(6),
                message,
            },
            NotificationType::Other => Self {
                level: ToastLevel::Neutral,
                icon: "🔔",
                duration: Duration::from_secs(4),
                message,
            },
        }
    }
}

/// Rendering seam for toast cues
pub trait ToastSink: Send + Sync {
    fn show(&self, cue: ToastCue);
}

/// Default sink: logs the cue through tracing
pub struct TracingToastSink;

impl ToastSink for TracingToastSink {
    fn show(&self, cue: ToastCue) {
        tracing::info!(
            icon = cue.icon,
            level = ?cue.level,
            duration_ms = cue.duration.as_millis() as u64,
            "toast: {}",
            cue.message
        );
    }
}
