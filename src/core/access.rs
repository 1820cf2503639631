use crate::core::{AppError, AppErrorType};
use crate::models::issues::{Issue, IssueStatus};
use crate::models::users::Role;

use crate::models::issues::IssueStatus::{Closed, InProgress, Open, Resolved};

/// Which issues a role can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueScope {
    Own,
    Assigned,
    All,
}

#[derive(Debug)]
pub struct RolePolicy {
    pub role: Role,
    pub scope: IssueScope,
    pub can_create: bool,
    pub can_assign: bool,
    pub can_delete_any: bool,
    pub transitions: &'static [(IssueStatus, IssueStatus)],
}

pub const ROLE_POLICIES: [RolePolicy; 3] = [
    RolePolicy {
        role: Role::Student,
        scope: IssueScope::Own,
        can_create: true,
        can_assign: false,
        can_delete_any: false,
        transitions: &[],
    },
    RolePolicy {
        role: Role::Lecturer,
        scope: IssueScope::Assigned,
        can_create: false,
        can_assign: false,
        can_delete_any: false,
        transitions: &[
            (Open, InProgress),
            (InProgress, Resolved),
            (Resolved, InProgress),
        ],
    },
    RolePolicy {
        role: Role::Registrar,
        scope: IssueScope::All,
        can_create: false,
        can_assign: true,
        can_delete_any: true,
        transitions: &[
            (Open, InProgress),
            (Open, Closed),
            (InProgress, Resolved),
            (InProgress, Open),
            (Resolved, Closed),
            (Resolved, InProgress),
            (Closed, Open),
        ],
    },
];

pub fn policy_for(role: Role) -> &'static RolePolicy {
    match role {
        Role::Student => &ROLE_POLICIES[0],
        Role::Lecturer => &ROLE_POLICIES[1],
        Role::Registrar => &ROLE_POLICIES[2],
    }
}

impl RolePolicy {
    pub fn can_transition(&self, from: IssueStatus, to: IssueStatus) -> bool {
        self.transitions.contains(&(from, to))
    }

    pub fn can_read(&self, user_id: i64, issue: &Issue) -> bool {
        match self.scope {
            IssueScope::Own => issue.student_id == user_id,
            IssueScope::Assigned => issue.assigned_to == Some(user_id),
            IssueScope::All => true,
        }
    }

    /// Students may edit their own issues while nobody has started on them.
    pub fn can_edit(&self, user_id: i64, issue: &Issue) -> bool {
        self.role == Role::Student && issue.student_id == user_id && issue.status == Open
    }

    pub fn can_delete(&self, user_id: i64, issue: &Issue) -> bool {
        self.can_delete_any || self.can_edit(user_id, issue)
    }
}

pub fn ensure_can_read(role: Role, user_id: i64, issue: &Issue) -> Result<(), AppError> {
    if policy_for(role).can_read(user_id, issue) {
        return Ok(());
    }
    Err(AppError::forbidden_error(
        "You do not have permission to view this issue",
    ))
}

pub fn ensure_can_edit(role: Role, user_id: i64, issue: &Issue) -> Result<(), AppError> {
    let policy = policy_for(role);
    if policy.can_edit(user_id, issue) {
        return Ok(());
    }
    if role == Role::Student && issue.student_id == user_id {
        return Err(AppError::forbidden_error(
            "Only open issues can be edited",
        ));
    }
    Err(AppError::forbidden_error(
        "You do not have permission to edit this issue",
    ))
}

pub fn ensure_can_delete(role: Role, user_id: i64, issue: &Issue) -> Result<(), AppError> {
    if policy_for(role).can_delete(user_id, issue) {
        return Ok(());
    }
    Err(AppError::forbidden_error(
        "You do not have permission to delete this issue",
    ))
}

/// Checks scope first (a lecturer only moves issues assigned to them), then the transition table.
pub fn ensure_can_transition(
    role: Role,
    user_id: i64,
    issue: &Issue,
    to: IssueStatus,
) -> Result<(), AppError> {
    let policy = policy_for(role);
    if policy.transitions.is_empty() || !policy.can_read(user_id, issue) {
        return Err(AppError::forbidden_error(
            "You do not have permission to change the status of this issue",
        ));
    }
    if issue.status == to {
        return Err(AppError {
            error_type: AppErrorType::InvalidTransition,
            message: Some(format!("Issue is already {}", to)),
            cause: None,
        });
    }
    if !policy.can_transition(issue.status, to) {
        return Err(AppError {
            error_type: AppErrorType::InvalidTransition,
            message: Some(format!(
                "A {} cannot move an issue from {} to {}",
                role, issue.status, to
            )),
            cause: None,
        });
    }
    Ok(())
}
