use serde::{Deserialize, Serialize};

use super::issues::IssueStatus;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub closed: i64,
    pub unread_notifications: i64,
}

impl DashboardStats {
    pub fn from_status_counts(counts: &[(String, i64)], unread_notifications: i64) -> Self {
        let mut stats = DashboardStats {
            unread_notifications,
            ..Default::default()
        };
        for (status, count) in counts {
            match status.parse::<IssueStatus>() {
                Ok(IssueStatus::Open) => stats.open += count,
                Ok(IssueStatus::InProgress) => stats.in_progress += count,
                Ok(IssueStatus::Resolved) => stats.resolved += count,
                Ok(IssueStatus::Closed) => stats.closed += count,
                Err(_) => continue,
            }
            stats.total += count;
        }
        stats
    }
}
