use anyhow::Context;
use notification_client::{
    ChannelManager, Config, NotificationStore, RestNotificationApi, TracingToastSink,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Headless notification session: loads the current state, keeps the push
/// channel open and folds pushed notifications into the store until ctrl-c.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let user_id = std::env::var("HMS_USER_ID").context("HMS_USER_ID must be set")?;

    tracing::info!(%user_id, api = %config.api.base_url, "starting notification session");

    let api = Arc::new(RestNotificationApi::new(config.api.base_url.clone()));
    let store = Arc::new(NotificationStore::new(api));
    let channel = ChannelManager::new(config.channel.clone(), Arc::new(TracingToastSink));

    // Initial synchronization: full list plus the authoritative unread count
    if let Err(e) = store.load(&user_id).await {
        tracing::warn!(error = %e, "initial notification load failed");
    }
    if let Err(e) = store.load_unread_count(&user_id).await {
        tracing::warn!(error = %e, "initial unread count load failed");
    }

    let mut pushed = channel
        .connect(&user_id)
        .await?
        .expect("no prior connection exists at startup");

    let pump_store = store.clone();
    let pump = tokio::spawn(async move {
        while let Some(notification) = pushed.recv().await {
            tracing::info!(id = notification.id, "push received");
            pump_store.insert(notification).await;
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    tracing::info!("shutting down");

    channel.disconnect().await;
    pump.abort();

    let snapshot = store.snapshot().await;
    tracing::info!(
        held = snapshot.notifications.len(),
        unread = snapshot.unread_count,
        "session ended"
    );
    store.clear().await;
    Ok(())
}
