pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod toast;

pub use api::{NotificationApi, RestNotificationApi};
pub use channel::{ChannelManager, ConnectionState};
pub use config::Config;
pub use error::{AppError, Result};
pub use models::{Notification, NotificationType};
pub use store::{NotificationStore, StoreSnapshot};
pub use toast::{ToastCue, ToastLevel, ToastSink, TracingToastSink};
