use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::client::api::AitsClient;
use crate::client::error::ClientError;
use crate::client::router::{issue_route, Route};
use crate::core::config::NotificationConfig;
use crate::models::notifications::{unread_count, Notification};

/// Client-side copy of the caller's notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    inner: Arc<RwLock<Vec<Notification>>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Notification>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Notification>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read().clone()
    }

    pub fn unread_count(&self) -> i64 {
        unread_count(&self.read())
    }

    pub fn replace(&self, notifications: Vec<Notification>) {
        *self.write() = notifications;
    }

    fn mark_read_locally(&self, notification_id: i64) {
        if let Some(notification) = self
            .write()
            .iter_mut()
            .find(|notification| notification.id == notification_id)
        {
            notification.is_read = true;
        }
    }

    /// Pulls the latest list from the server.
    pub async fn refresh(&self, client: &AitsClient) -> Result<(), ClientError> {
        let list = client.notifications().await?;
        self.replace(list.notifications);
        Ok(())
    }

    /// Marks the notification read and returns the issue view it links to, if any.
    pub async fn open(
        &self,
        client: &AitsClient,
        notification_id: i64,
    ) -> Result<Option<Route>, ClientError> {
        let notification = client.mark_notification_read(notification_id).await?;
        self.mark_read_locally(notification_id);

        let role = client.sessions().role().ok_or(ClientError::NotAuthenticated)?;
        Ok(notification
            .issue_id
            .map(|issue_id| issue_route(role, issue_id)))
    }

    pub async fn mark_all_read(&self, client: &AitsClient) -> Result<(), ClientError> {
        client.mark_all_notifications_read().await?;
        for notification in self.write().iter_mut() {
            notification.is_read = true;
        }
        Ok(())
    }

    pub async fn delete(&self, client: &AitsClient, notification_id: i64) -> Result<(), ClientError> {
        client.delete_notification(notification_id).await?;
        self.write()
            .retain(|notification| notification.id != notification_id);
        Ok(())
    }

    pub async fn clear_all(&self, client: &AitsClient) -> Result<(), ClientError> {
        client.clear_notifications().await?;
        self.write().clear();
        Ok(())
    }
}

/// Background refresh of a [`NotificationStore`] while a dashboard is on screen.
/// The task stops on [`NotificationPoller::stop`], on drop, or once the session is gone.
#[derive(Debug)]
pub struct NotificationPoller {
    handle: JoinHandle<()>,
}

impl NotificationPoller {
    pub fn start(client: AitsClient, store: NotificationStore, config: &NotificationConfig) -> Self {
        let period = config.poll_interval();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // a late tick is replaced by the next one rather than bursting
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match store.refresh(&client).await {
                    Ok(()) => {}
                    Err(ClientError::Unauthorized) | Err(ClientError::NotAuthenticated) => {
                        tracing::info!("Session ended, notification polling stopped");
                        break;
                    }
                    Err(e) => tracing::warn!("Notification refresh failed: {}", e),
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for NotificationPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
