use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::common::to_datetime;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    IssueCreated,
    IssueUpdated,
    IssueResolved,
    IssueAssigned,
    CommentAdded,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::IssueCreated => "issue_created",
            NotificationType::IssueUpdated => "issue_updated",
            NotificationType::IssueResolved => "issue_resolved",
            NotificationType::IssueAssigned => "issue_assigned",
            NotificationType::CommentAdded => "comment_added",
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue_created" => Ok(NotificationType::IssueCreated),
            "issue_updated" => Ok(NotificationType::IssueUpdated),
            "issue_resolved" => Ok(NotificationType::IssueResolved),
            "issue_assigned" => Ok(NotificationType::IssueAssigned),
            "comment_added" => Ok(NotificationType::CommentAdded),
            other => Err(format!("Invalid notification type: {}", other)),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub recipient_id: i64,
    pub notification_type: String,
    pub issue_id: Option<i64>,
    pub message: String,
    pub is_read: i64,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub issue_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = String;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            message: row.message,
            notification_type: row.notification_type.parse()?,
            is_read: row.is_read != 0,
            issue_id: row.issue_id,
            created_at: to_datetime(row.created_at),
        })
    }
}

/// A notification waiting to be written for one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: i64,
    pub notification_type: NotificationType,
    pub issue_id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct UnreadCount {
    pub count: i64,
}

pub fn unread_count(notifications: &[Notification]) -> i64 {
    notifications.iter().filter(|n| !n.is_read).count() as i64
}
