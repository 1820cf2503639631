//! Who hears about what when an issue moves through its lifecycle.

use crate::models::issues::{Issue, IssueStatus};
use crate::models::notifications::{NewNotification, NotificationType};
use crate::models::users::Role;

fn notification(
    recipient_id: i64,
    notification_type: NotificationType,
    issue: &Issue,
    message: String,
) -> NewNotification {
    NewNotification {
        recipient_id,
        notification_type,
        issue_id: Some(issue.id),
        message,
    }
}

fn status_label(status: IssueStatus) -> String {
    status.as_str().replace('_', " ")
}

/// Registrars learn about every new issue; a lecturer picked on the form is told it is theirs.
pub fn issue_created(issue: &Issue, registrar_ids: &[i64]) -> Vec<NewNotification> {
    let mut notifications: Vec<_> = registrar_ids
        .iter()
        .map(|registrar_id| {
            notification(
                *registrar_id,
                NotificationType::IssueCreated,
                issue,
                format!(
                    "New issue submitted by {}: {}",
                    issue.student_name, issue.title
                ),
            )
        })
        .collect();

    if let Some(lecturer_id) = issue.assigned_to {
        notifications.push(notification(
            lecturer_id,
            NotificationType::IssueAssigned,
            issue,
            format!("You have been assigned a new issue: {}", issue.title),
        ));
    }
    notifications
}

pub fn issue_assigned(issue: &Issue) -> Vec<NewNotification> {
    let Some(lecturer_id) = issue.assigned_to else {
        return Vec::new();
    };
    let lecturer_name = issue.lecturer_name.as_deref().unwrap_or("a lecturer");

    vec![
        notification(
            lecturer_id,
            NotificationType::IssueAssigned,
            issue,
            format!("You have been assigned issue: {}", issue.title),
        ),
        notification(
            issue.student_id,
            NotificationType::IssueUpdated,
            issue,
            format!(
                "Your issue '{}' has been assigned to {}",
                issue.title, lecturer_name
            ),
        ),
    ]
}

/// `issue` carries the new status. The assigned lecturer hears about registrar moves too.
pub fn status_changed(issue: &Issue, changed_by: Role) -> Vec<NewNotification> {
    let mut notifications = vec![if issue.status == IssueStatus::Resolved {
        notification(
            issue.student_id,
            NotificationType::IssueResolved,
            issue,
            format!("Your issue '{}' has been resolved", issue.title),
        )
    } else {
        notification(
            issue.student_id,
            NotificationType::IssueUpdated,
            issue,
            format!(
                "Your issue '{}' is now {}",
                issue.title,
                status_label(issue.status)
            ),
        )
    }];

    if changed_by == Role::Registrar {
        if let Some(lecturer_id) = issue.assigned_to {
            notifications.push(notification(
                lecturer_id,
                NotificationType::IssueUpdated,
                issue,
                format!(
                    "The registrar moved issue '{}' to {}",
                    issue.title,
                    status_label(issue.status)
                ),
            ));
        }
    }
    notifications
}

pub fn issue_edited(issue: &Issue) -> Vec<NewNotification> {
    issue
        .assigned_to
        .map(|lecturer_id| {
            notification(
                lecturer_id,
                NotificationType::IssueUpdated,
                issue,
                format!("{} updated issue '{}'", issue.student_name, issue.title),
            )
        })
        .into_iter()
        .collect()
}
