//! Notification Center
//!
//! Queues user-facing notifications, fans them out to every sink and to the
//! front-end update channel.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::messages::TrackerUpdate;
use crate::ports::{Notification, NotifierPort};

pub const NOTIFICATION_TITLE: &str = "Lemora Wallet Tracker";

pub fn default_retention() -> Duration {
    Duration::hours(24)
}

pub struct NotificationCenter {
    sinks: Vec<Arc<dyn NotifierPort>>,
    queue: Vec<Notification>,
    retention: Duration,
    updates: Option<broadcast::Sender<TrackerUpdate>>,
    last_id_ms: i64,
    same_ms_count: u32,
}

impl NotificationCenter {
    pub fn new(retention: Duration) -> Self {
        Self {
            sinks: Vec::new(),
            queue: Vec::new(),
            retention,
            updates: None,
            last_id_ms: 0,
            same_ms_count: 0,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotifierPort>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Arc<dyn NotifierPort>) {
        self.sinks.push(sink);
    }

    pub fn set_updates(&mut self, updates: broadcast::Sender<TrackerUpdate>) {
        self.updates = Some(updates);
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// `notification_<ms>`, suffixed `-n` when several share a millisecond
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let ms = now.timestamp_millis();
        if ms == self.last_id_ms {
            self.same_ms_count += 1;
            format!("notification_{}-{}", ms, self.same_ms_count)
        } else {
            self.last_id_ms = ms;
            self.same_ms_count = 0;
            format!("notification_{}", ms)
        }
    }

    pub async fn notify(&mut self, message: impl Into<String>, flags: Vec<String>) -> Notification {
        self.notify_at(message, flags, Utc::now()).await
    }

    pub async fn notify_at(
        &mut self,
        message: impl Into<String>,
        flags: Vec<String>,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification {
            id: self.next_id(now),
            title: NOTIFICATION_TITLE.to_string(),
            message: message.into(),
            flags,
            created_at: now,
        };

        self.queue.push(notification.clone());

        for sink in &self.sinks {
            if let Err(e) = sink.notify(&notification).await {
                warn!("Failed to deliver notification {}: {}", notification.id, e);
            }
        }

        if let Some(updates) = &self.updates {
            // No receivers is fine
            let _ = updates.send(TrackerUpdate::Notification(notification.clone()));
        }

        notification
    }

    /// Drop notifications older than the retention period; returns how many
    pub fn cleanup(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.queue.len();
        let retention = self.retention;
        self.queue.retain(|n| now - n.created_at < retention);
        let removed = before - self.queue.len();
        if removed > 0 {
            debug!("Cleaned up {} notifications", removed);
        }
        removed
    }

    pub fn pending(&self) -> &[Notification] {
        &self.queue
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(default_retention())
    }
}
