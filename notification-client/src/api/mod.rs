/// REST client for the notification API
///
/// The store talks to the server exclusively through the `NotificationApi`
/// trait so that reconciliation logic can be tested against a mock. The
/// real implementation is a thin reqwest wrapper over the six endpoints
/// under `/api/notifications`.
use crate::error::{AppError, Result};
use crate::models::{CountResponse, ListResponse, Notification};
use async_trait::async_trait;

const NOTIFICATION_BASE_PATH: &str = "/api/notifications";

/// Remote operations consumed by the notification store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Full notification list for a user, server-ordered
    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>>;

    /// Unread subset for a user
    async fn fetch_unread(&self, user_id: &str) -> Result<Vec<Notification>>;

    /// Authoritative unread count for a user
    async fn fetch_unread_count(&self, user_id: &str) -> Result<u64>;

    /// Mark one notification read
    async fn mark_read(&self, id: i64) -> Result<()>;

    /// Mark every notification for a user read
    async fn mark_all_read(&self, user_id: &str) -> Result<()>;

    /// Delete one notification
    async fn delete(&self, id: i64) -> Result<()>;
}

/// reqwest-backed implementation of [`NotificationApi`]
pub struct RestNotificationApi {
    http: reqwest::Client,
    base_url: String,
}

impl RestNotificationApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}{}{}", self.base_url, NOTIFICATION_BASE_PATH, suffix)
    }

    /// Maps non-2xx responses to `AppError::Api` with the response body as
    /// the message, so callers can render the server's own wording.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl NotificationApi for RestNotificationApi {
    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let response = self.http.get(self.url(&format!("/user/{user_id}"))).send().await?;
        let body: ListResponse = Self::check(response).await?.json().await?;
        Ok(body.data)
    }

    async fn fetch_unread(&self, user_id: &str) -> Result<Vec<Notification>> {
        let response = self
            .http
            .get(self.url(&format!("/user/{user_id}/unread")))
            .send()
            .await?;
        let body: ListResponse = Self::check(response).await?.json().await?;
        Ok(body.data)
    }

    async fn fetch_unread_count(&self, user_id: &str) -> Result<u64> {
        let response = self
            .http
            .get(self.url(&format!("/user/{user_id}/count")))
            .send()
            .await?;
        let body: CountResponse = Self::check(response).await?.json().await?;
        Ok(body.count)
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        let response = self.http.put(self.url(&format!("/{id}/read"))).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        let response = self
            .http
            .put(self.url(&format!("/user/{user_id}/read-all")))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let response = self.http.delete(self.url(&format!("/{id}"))).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let api = RestNotificationApi::new("http://localhost:8086");
        assert_eq!(
            api.url("/user/42/count"),
            "http://localhost:8086/api/notifications/user/42/count"
        );
        assert_eq!(api.url("/7/read"), "http://localhost:8086/api/notifications/7/read");
    }
}
