/// Store reconciliation scenario tests
///
/// Exercises the notification store end to end against an in-memory API
/// fake: initial load + count, push insertion, mark-read, delete, and the
/// no-desync guarantee when the API refuses a mutation.
use async_trait::async_trait;
use chrono::Utc;
use notification_client::api::NotificationApi;
use notification_client::error::{AppError, Result};
use notification_client::models::{Notification, NotificationType};
use notification_client::NotificationStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_test::assert_ok;

fn notification(id: i64, is_read: bool) -> Notification {
    Notification {
        id,
        recipient_user_id: "42".into(),
        kind: NotificationType::Appointment,
        subject: format!("notification {id}"),
        message: None,
        is_read,
        created_at: Utc::now(),
    }
}

/// In-memory API: serves a fixed list/count, mutations succeed unless the
/// failure switch is flipped.
#[derive(Default)]
struct FakeApi {
    list: Vec<Notification>,
    count: u64,
    fail_mutations: AtomicBool,
}

impl FakeApi {
    fn check_mutation(&self) -> Result<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            Err(AppError::Api {
                status: 503,
                message: "service unavailable".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationApi for FakeApi {
    async fn fetch_notifications(&self, _user_id: &str) -> Result<Vec<Notification>> {
        Ok(self.list.clone())
    }

    async fn fetch_unread(&self, _user_id: &str) -> Result<Vec<Notification>> {
        Ok(self.list.iter().filter(|n| !n.is_read).cloned().collect())
    }

    async fn fetch_unread_count(&self, _user_id: &str) -> Result<u64> {
        Ok(self.count)
    }

    async fn mark_read(&self, _id: i64) -> Result<()> {
        self.check_mutation()
    }

    async fn mark_all_read(&self, _user_id: &str) -> Result<()> {
        self.check_mutation()
    }

    async fn delete(&self, _id: i64) -> Result<()> {
        self.check_mutation()
    }
}

/// The full lifecycle: load [1 unread, 2 read] with count 1, push id 3,
/// mark 3 read, delete 1.
#[tokio::test]
async fn test_load_insert_mark_delete_scenario() {
    let api = Arc::new(FakeApi {
        list: vec![notification(1, false), notification(2, true)],
        count: 1,
        ..FakeApi::default()
    });
    let store = NotificationStore::new(api);

    assert_ok!(store.load("42").await);
    assert_ok!(store.load_unread_count("42").await);
    assert_eq!(store.unread_count().await, 1);

    store.insert(notification(3, false)).await;
    let ids: Vec<i64> = store.notifications().await.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert_eq!(store.unread_count().await, 2);

    store.mark_read(3).await.unwrap();
    let snapshot = store.snapshot().await;
    assert!(snapshot.notifications.iter().find(|n| n.id == 3).unwrap().is_read);
    assert_eq!(snapshot.unread_count, 1);

    store.delete(1).await.unwrap();
    let snapshot = store.snapshot().await;
    let ids: Vec<i64> = snapshot.notifications.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(snapshot.unread_count, 0);
}

#[tokio::test]
async fn test_load_unread_replaces_unread_subset() {
    let api = Arc::new(FakeApi {
        list: vec![notification(1, false), notification(2, true), notification(3, false)],
        count: 2,
        ..FakeApi::default()
    });
    let store = NotificationStore::new(api);

    store.load_unread("42").await.unwrap();
    let snapshot = store.snapshot().await;
    let unread_ids: Vec<i64> = snapshot.unread.iter().map(|n| n.id).collect();
    assert_eq!(unread_ids, vec![1, 3]);
}

#[tokio::test]
async fn test_refused_mutations_never_desync() {
    let api = Arc::new(FakeApi {
        list: vec![notification(1, false), notification(2, false)],
        count: 2,
        ..FakeApi::default()
    });
    let store = NotificationStore::new(api.clone());
    store.load("42").await.unwrap();
    store.load_unread_count("42").await.unwrap();

    api.fail_mutations.store(true, Ordering::SeqCst);
    let before = store.snapshot().await;

    assert!(store.mark_read(1).await.is_err());
    assert!(store.mark_all_read("42").await.is_err());
    assert!(store.delete(2).await.is_err());
    assert_eq!(store.snapshot().await, before);

    // once the API recovers the same mutations apply
    api.fail_mutations.store(false, Ordering::SeqCst);
    store.mark_all_read("42").await.unwrap();
    assert_eq!(store.unread_count().await, 0);
}

#[tokio::test]
async fn test_insert_count_tracks_push_volume() {
    let store = NotificationStore::new(Arc::new(FakeApi::default()));
    store.load("42").await.unwrap();
    let base = store.notifications().await.len();

    for id in 0..10 {
        store.insert(notification(id, id % 2 == 0)).await;
    }
    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.notifications.len(), base + 10);
    assert_eq!(snapshot.unread_count, 5);
    // pushed items are most-recent-first
    assert_eq!(snapshot.notifications[0].id, 9);
}
