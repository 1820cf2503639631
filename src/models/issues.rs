use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;
use validator::{Validate, ValidationError};

use super::common::to_datetime;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "Invalid {}: {}",
                        stringify!($name),
                        other
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(IssueCategory {
    Academic => "academic",
    Technical => "technical",
    Administrative => "administrative",
    Examination => "examination",
    Registration => "registration",
    Other => "other",
});

string_enum!(IssuePriority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

string_enum!(IssueStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

impl IssueCategory {
    /// Priority used when a student does not pick one.
    pub fn default_priority(&self) -> IssuePriority {
        match self {
            IssueCategory::Academic | IssueCategory::Examination => IssuePriority::High,
            IssueCategory::Registration | IssueCategory::Technical => IssuePriority::Medium,
            IssueCategory::Administrative | IssueCategory::Other => IssuePriority::Low,
        }
    }
}

/// Row shape of `tbl_issues` joined with the owner, assignee and department names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IssueRow {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub course_unit: String,
    pub year_of_study: i64,
    pub semester: i64,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub student_id: i64,
    pub student_name: String,
    pub assigned_to: Option<i64>,
    pub lecturer_name: Option<String>,
    pub department_name: Option<String>,
    pub attachment_name: Option<String>,
    pub attachment_path: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    pub category: IssueCategory,
    pub course_unit: String,
    pub year_of_study: i64,
    pub semester: i64,
    pub description: String,
    pub priority: IssuePriority,
    pub status: IssueStatus,
    pub student_id: i64,
    pub student_name: String,
    pub assigned_to: Option<i64>,
    pub lecturer_name: Option<String>,
    pub department: Option<String>,
    /// Original file name of the attachment, if one was uploaded.
    pub attachment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<IssueRow> for Issue {
    type Error = String;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        Ok(Issue {
            id: row.id,
            title: row.title,
            category: row.category.parse()?,
            course_unit: row.course_unit,
            year_of_study: row.year_of_study,
            semester: row.semester,
            description: row.description,
            priority: row.priority.parse()?,
            status: row.status.parse()?,
            student_id: row.student_id,
            student_name: row.student_name,
            assigned_to: row.assigned_to,
            lecturer_name: row.lecturer_name,
            department: row.department_name,
            attachment: row.attachment_name,
            created_at: to_datetime(row.created_at),
            updated_at: to_datetime(row.updated_at),
        })
    }
}

pub const MAX_TITLE_GRAPHEMES: usize = 200;
pub const MAX_COURSE_UNIT_GRAPHEMES: usize = 20;
pub const MAX_DESCRIPTION_GRAPHEMES: usize = 5000;

/// Required free text, measured after trimming.
fn required_text(value: &str, label: &str, max: usize) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some(format!("{} is required", label).into());
        return Err(error);
    }
    if trimmed.graphemes(true).count() > max {
        let mut error = ValidationError::new("length");
        error.message = Some(format!("{} must be at most {} characters", label, max).into());
        return Err(error);
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    required_text(title, "Title", MAX_TITLE_GRAPHEMES)
}

fn validate_course_unit(course_unit: &str) -> Result<(), ValidationError> {
    required_text(course_unit, "Course unit", MAX_COURSE_UNIT_GRAPHEMES)
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    required_text(description, "Description", MAX_DESCRIPTION_GRAPHEMES)
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone)]
pub struct CreateIssueRequest {
    #[validate(custom = "validate_title")]
    pub title: String,
    pub category: IssueCategory,
    #[validate(custom = "validate_course_unit")]
    pub course_unit: String,
    #[validate(range(min = 1, max = 3, message = "Year of study must be between 1 and 3"))]
    pub year_of_study: i64,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2"))]
    pub semester: i64,
    #[validate(custom = "validate_description")]
    pub description: String,
    pub priority: Option<IssuePriority>,
    pub lecturer_id: Option<i64>,
}

impl CreateIssueRequest {
    pub fn effective_priority(&self) -> IssuePriority {
        self.priority
            .unwrap_or_else(|| self.category.default_priority())
    }
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone, Default)]
pub struct UpdateIssueRequest {
    #[validate(custom = "validate_title")]
    pub title: Option<String>,
    pub category: Option<IssueCategory>,
    #[validate(custom = "validate_course_unit")]
    pub course_unit: Option<String>,
    #[validate(range(min = 1, max = 3, message = "Year of study must be between 1 and 3"))]
    pub year_of_study: Option<i64>,
    #[validate(range(min = 1, max = 2, message = "Semester must be 1 or 2"))]
    pub semester: Option<i64>,
    #[validate(custom = "validate_description")]
    pub description: Option<String>,
    pub priority: Option<IssuePriority>,
}

impl UpdateIssueRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.course_unit.is_none()
            && self.year_of_study.is_none()
            && self.semester.is_none()
            && self.description.is_none()
            && self.priority.is_none()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UpdateStatusRequest {
    pub status: IssueStatus,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssignIssueRequest {
    pub lecturer_id: i64,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub category: Option<IssueCategory>,
    pub department: Option<String>,
    pub search: Option<String>,
}

/// Where an uploaded attachment ended up on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAttachment {
    pub file_name: String,
    pub relative_path: String,
}
