/// Realtime push channel
///
/// Owns at most one live STOMP subscription pair per session and forwards
/// every inbound notification to the consumer through an unbounded channel.
///
/// Architecture:
/// 1. ChannelManager: idempotent connect/disconnect lifecycle
/// 2. Supervisor task: negotiate, subscribe, read loop, fixed-delay reconnect
/// 3. DedupWindow: drops duplicate delivery across the queue/topic pair
/// 4. ToastSink side effect on every accepted notification
pub mod stomp;
pub mod transport;

use crate::config::ChannelConfig;
use crate::error::{AppError, Result};
use crate::models::Notification;
use crate::toast::{ToastCue, ToastSink};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use stomp::Frame;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use transport::{Transport, WebSocketTransport};

/// Observable connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Last-N-seen notification ids
///
/// The server may deliver the same logical event on both the per-user queue
/// and the per-user topic; the window filters the second copy.
struct DedupWindow {
    capacity: usize,
    order: VecDeque<i64>,
    seen: HashSet<i64>,
}

impl DedupWindow {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Returns false if the id was already in the window
    fn insert(&mut self, id: i64) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        true
    }
}

struct ActiveSession {
    user_id: String,
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

/// Manages the single push subscription pair for a session
///
/// An owned service value: construct one per session context and pass it to
/// whatever needs the notification stream. Dropping or `disconnect()`ing it
/// tears the transport down.
pub struct ChannelManager {
    config: ChannelConfig,
    transport: Arc<dyn Transport>,
    toasts: Arc<dyn ToastSink>,
    active: Mutex<Option<ActiveSession>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ChannelManager {
    pub fn new(config: ChannelConfig, toasts: Arc<dyn ToastSink>) -> Self {
        Self::with_transport(config, Arc::new(WebSocketTransport), toasts)
    }

    /// Construct with a custom transport (tests use an in-memory one)
    pub fn with_transport(
        config: ChannelConfig,
        transport: Arc<dyn Transport>,
        toasts: Arc<dyn ToastSink>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            transport,
            toasts,
            active: Mutex::new(None),
            state_tx,
        }
    }

    /// Open the push channel for `user_id` and hand back the notification
    /// stream.
    ///
    /// Returns `Ok(None)` when a connection is already active: repeated
    /// mount/lifecycle events in the consuming UI must not stack
    /// subscriptions. The stream ends when `disconnect` is called.
    pub async fn connect(
        &self,
        user_id: &str,
    ) -> Result<Option<mpsc::UnboundedReceiver<Notification>>> {
        if user_id.is_empty() {
            return Err(AppError::EmptyUserId);
        }

        let mut active = self.active.lock().await;
        if let Some(session) = active.as_ref() {
            tracing::debug!(
                user_id = %session.user_id,
                "push channel already connected, ignoring connect"
            );
            return Ok(None);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_session(
            self.transport.clone(),
            self.config.clone(),
            user_id.to_string(),
            tx,
            self.toasts.clone(),
            self.state_tx.clone(),
            shutdown_rx,
        ));
        *active = Some(ActiveSession {
            user_id: user_id.to_string(),
            task,
            shutdown,
        });
        Ok(Some(rx))
    }

    /// Tear down the subscription pair and cancel any pending reconnect.
    /// No-op when not connected. Must be called on logout or user switch so
    /// the previous user's channels are not leaked.
    ///
    /// While the transport is still up the supervisor says goodbye
    /// (UNSUBSCRIBE for both destinations, then DISCONNECT) before it
    /// exits; a supervisor that does not wind down in time is aborted.
    pub async fn disconnect(&self) {
        let mut active = self.active.lock().await;
        if let Some(session) = active.take() {
            let _ = session.shutdown.send(true);
            let mut task = session.task;
            if tokio::time::timeout(Duration::from_secs(1), &mut task)
                .await
                .is_err()
            {
                task.abort();
            }
            let _ = self.state_tx.send(ConnectionState::Disconnected);
            tracing::info!(user_id = %session.user_id, "push channel disconnected");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Watch the connection lifecycle (Disconnected/Connecting/Connected/
    /// Reconnecting)
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }
}

fn queue_destination(user_id: &str) -> String {
    format!("/user/{user_id}/queue/notifications")
}

fn topic_destination(user_id: &str) -> String {
    format!("/topic/notifications/{user_id}")
}

/// Best-effort vhost for the CONNECT frame, taken from the websocket URL
fn stomp_host(ws_url: &str) -> &str {
    let without_scheme = ws_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(ws_url);
    let authority = without_scheme.split('/').next().unwrap_or(without_scheme);
    authority.split(':').next().unwrap_or(authority)
}

/// Supervisor loop: one iteration per transport connection
///
/// Transport failures never escape to the caller; they flip the state to
/// Reconnecting and retry after the configured fixed delay under the same
/// user id.
async fn run_session(
    transport: Arc<dyn Transport>,
    config: ChannelConfig,
    user_id: String,
    tx: mpsc::UnboundedSender<Notification>,
    toasts: Arc<dyn ToastSink>,
    state_tx: watch::Sender<ConnectionState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut dedup = DedupWindow::new(config.dedup_window);
    loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        match serve_connection(
            &*transport,
            &config,
            &user_id,
            &tx,
            &*toasts,
            &state_tx,
            &mut dedup,
            &mut shutdown,
        )
        .await
        {
            Ok(true) => {
                tracing::info!(%user_id, "push channel shut down");
                return;
            }
            Ok(false) => tracing::info!(%user_id, "push channel closed by peer"),
            Err(e) => tracing::warn!(%user_id, error = %e, "push channel failure"),
        }
        let _ = state_tx.send(ConnectionState::Reconnecting);
        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(Duration::from_millis(config.reconnect_delay_ms)) => {}
        }
    }
}

/// One transport connection from negotiation to teardown. `Ok(true)` means
/// shutdown was requested and the goodbye frames went out; `Ok(false)`
/// means the peer closed.
#[allow(clippy::too_many_arguments)]
async fn serve_connection(
    transport: &dyn Transport,
    config: &ChannelConfig,
    user_id: &str,
    tx: &mpsc::UnboundedSender<Notification>,
    toasts: &dyn ToastSink,
    state_tx: &watch::Sender<ConnectionState>,
    dedup: &mut DedupWindow,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<bool> {
    let mut conn = transport.open(&config.ws_url).await?;

    conn.send(Frame::connect(stomp_host(&config.ws_url), config.heartbeat_ms))
        .await?;
    match conn.recv().await? {
        Some(frame) if frame.command == stomp::CONNECTED => {}
        Some(frame) => {
            return Err(AppError::Transport(format!(
                "expected CONNECTED, got {}",
                frame.command
            )))
        }
        None => return Err(AppError::Transport("closed during negotiation".into())),
    }

    // Both destinations on purpose: the server may route a notification to
    // either one, and the dedup window absorbs double delivery.
    conn.send(Frame::subscribe("sub-0", &queue_destination(user_id)))
        .await?;
    conn.send(Frame::subscribe("sub-1", &topic_destination(user_id)))
        .await?;

    let _ = state_tx.send(ConnectionState::Connected);
    tracing::info!(%user_id, "push channel connected");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = conn.send(Frame::unsubscribe("sub-0")).await;
                let _ = conn.send(Frame::unsubscribe("sub-1")).await;
                let _ = conn.send(Frame::disconnect()).await;
                return Ok(true);
            }
            received = conn.recv() => match received? {
                Some(frame) => match frame.command.as_str() {
                    stomp::MESSAGE => deliver(&frame, dedup, toasts, tx),
                    stomp::ERROR => {
                        return Err(AppError::Transport(format!(
                            "server error frame: {}",
                            frame.header("message").unwrap_or("unspecified")
                        )))
                    }
                    other => tracing::debug!(command = other, "ignoring frame"),
                },
                None => return Ok(false),
            },
        }
    }
}

/// Parse one MESSAGE frame body and forward it. A malformed payload must
/// never take the channel down: it is logged and dropped.
fn deliver(
    frame: &Frame,
    dedup: &mut DedupWindow,
    toasts: &dyn ToastSink,
    tx: &mpsc::UnboundedSender<Notification>,
) {
    let notification: Notification = match serde_json::from_str(&frame.body) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed notification payload");
            return;
        }
    };

    if !dedup.insert(notification.id) {
        tracing::debug!(id = notification.id, "dropping duplicate delivery");
        return;
    }

    toasts.show(ToastCue::for_notification(&notification));

    // Toast was already emitted; a dropped consumer only loses the stream.
    if tx.send(notification).is_err() {
        tracing::debug!("notification consumer gone, delivered toast only");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_window_rejects_repeats() {
        let mut window = DedupWindow::new(4);
        assert!(window.insert(1));
        assert!(window.insert(2));
        assert!(!window.insert(1));
        assert!(!window.insert(2));
    }

    #[test]
    fn test_dedup_window_evicts_oldest() {
        let mut window = DedupWindow::new(2);
        assert!(window.insert(1));
        assert!(window.insert(2));
        assert!(window.insert(3)); // evicts 1
        assert!(window.insert(1));
        assert!(!window.insert(3));
    }

    #[test]
    fn test_destinations() {
        assert_eq!(queue_destination("42"), "/user/42/queue/notifications");
        assert_eq!(topic_destination("42"), "/topic/notifications/42");
    }

    #[test]
    fn test_stomp_host_extraction() {
        assert_eq!(stomp_host("ws://localhost:8086/ws"), "localhost");
        assert_eq!(stomp_host("wss://push.hospital.example/ws"), "push.hospital.example");
        assert_eq!(stomp_host("localhost"), "localhost");
    }
}
