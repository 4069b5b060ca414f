/// Client-side notification cache
///
/// Single authoritative cache of a user's notifications, unread subset and
/// unread count, reconciled against the remote API. The server stays the
/// source of truth: every mutation calls the API first and touches local
/// state only on confirmed success, and the unread count is replaced
/// wholesale whenever the authoritative value is fetched.
use crate::api::NotificationApi;
use crate::error::Result;
use crate::models::Notification;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Point-in-time copy of the store handed to presentation code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub notifications: Vec<Notification>,
    pub unread: Vec<Notification>,
    pub unread_count: u64,
    pub loading: bool,
    pub last_error: Option<String>,
}

#[derive(Default)]
struct StoreState {
    notifications: Vec<Notification>,
    unread: Vec<Notification>,
    unread_count: u64,
    loading: bool,
    last_error: Option<String>,
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notifications: self.notifications.clone(),
            unread: self.unread.clone(),
            unread_count: self.unread_count,
            loading: self.loading,
            last_error: self.last_error.clone(),
        }
    }
}

pub struct NotificationStore {
    api: Arc<dyn NotificationApi>,
    state: RwLock<StoreState>,
    updates: watch::Sender<StoreSnapshot>,
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        let (updates, _) = watch::channel(StoreSnapshot::default());
        Self {
            api,
            state: RwLock::new(StoreState::default()),
            updates,
        }
    }

    /// Fetch the full list and replace the held one wholesale. The unread
    /// count is untouched; it has its own authoritative endpoint. On
    /// failure the list keeps its last-known value and the error is both
    /// stored for rendering and returned.
    pub async fn load(&self, user_id: &str) -> Result<()> {
        self.set_loading(true).await;
        match self.api.fetch_notifications(user_id).await {
            Ok(notifications) => {
                let mut state = self.state.write().await;
                state.notifications = notifications;
                state.loading = false;
                state.last_error = None;
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.loading = false;
                state.last_error = Some(e.to_string());
                self.publish(&state);
                tracing::warn!(%user_id, error = %e, "failed to load notifications");
                Err(e)
            }
        }
    }

    /// Fetch the unread subset and replace the held one wholesale
    pub async fn load_unread(&self, user_id: &str) -> Result<()> {
        match self.api.fetch_unread(user_id).await {
            Ok(unread) => {
                let mut state = self.state.write().await;
                state.unread = unread;
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.last_error = Some(e.to_string());
                self.publish(&state);
                tracing::warn!(%user_id, error = %e, "failed to load unread notifications");
                Err(e)
            }
        }
    }

    /// Fetch the authoritative unread count and replace the held one
    pub async fn load_unread_count(&self, user_id: &str) -> Result<()> {
        match self.api.fetch_unread_count(user_id).await {
            Ok(count) => {
                let mut state = self.state.write().await;
                state.unread_count = count;
                self.publish(&state);
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.last_error = Some(e.to_string());
                self.publish(&state);
                tracing::warn!(%user_id, error = %e, "failed to load unread count");
                Err(e)
            }
        }
    }

    /// Merge one pushed notification: prepend (most-recent-first) and bump
    /// the unread count if it arrived unread. Local only; the server
    /// originated the event and already knows about it.
    pub async fn insert(&self, notification: Notification) {
        let mut state = self.state.write().await;
        if !notification.is_read {
            state.unread.insert(0, notification.clone());
            state.unread_count += 1;
        }
        state.notifications.insert(0, notification);
        self.publish(&state);
    }

    /// Mark one notification read: API first, reconcile on success only.
    /// The count decrement is floored at zero and applied even when the
    /// local copy was already read; the next count load corrects any drift.
    pub async fn mark_read(&self, id: i64) -> Result<()> {
        self.api.mark_read(id).await?;
        let mut state = self.state.write().await;
        if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
            n.is_read = true;
        }
        state.unread.retain(|n| n.id != id);
        state.unread_count = state.unread_count.saturating_sub(1);
        self.publish(&state);
        Ok(())
    }

    /// Mark everything read: API first, then flip every held notification
    /// and zero the count.
    pub async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        self.api.mark_all_read(user_id).await?;
        let mut state = self.state.write().await;
        for n in &mut state.notifications {
            n.is_read = true;
        }
        state.unread.clear();
        state.unread_count = 0;
        self.publish(&state);
        Ok(())
    }

    /// Delete one notification: API first, remove locally only after the
    /// server confirms. An unread removal decrements the count (floored).
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.api.delete(id).await?;
        let mut state = self.state.write().await;
        let removed_unread = state
            .notifications
            .iter()
            .find(|n| n.id == id)
            .map(|n| !n.is_read)
            .unwrap_or(false);
        state.notifications.retain(|n| n.id != id);
        if removed_unread {
            state.unread.retain(|n| n.id != id);
            state.unread_count = state.unread_count.saturating_sub(1);
        }
        self.publish(&state);
        Ok(())
    }

    /// Local session-end reset (logout, user switch)
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        *state = StoreState::default();
        self.publish(&state);
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.read().await.notifications.clone()
    }

    pub async fn unread_count(&self) -> u64 {
        self.state.read().await.unread_count
    }

    /// Subscribe/render contract for presentation components: yields a
    /// fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.updates.subscribe()
    }

    async fn set_loading(&self, loading: bool) {
        let mut state = self.state.write().await;
        state.loading = loading;
        state.last_error = None;
        self.publish(&state);
    }

    fn publish(&self, state: &StoreState) {
        let _ = self.updates.send(state.snapshot());
    }
}
