use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::common::to_datetime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DepartmentRow {
    pub id: i64,
    pub name: String,
    pub faculty: String,
    pub head_of_department: Option<String>,
    pub staff_count: i64,
    pub student_count: i64,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub faculty: String,
    pub head_of_department: Option<String>,
    pub staff_count: i64,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Department {
            id: row.id,
            name: row.name,
            faculty: row.faculty,
            head_of_department: row.head_of_department,
            staff_count: row.staff_count,
            student_count: row.student_count,
            created_at: to_datetime(row.created_at),
        }
    }
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 100, message = "Department name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Faculty is required"))]
    pub faculty: String,
    #[validate(length(max = 255))]
    pub head_of_department: Option<String>,
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone, Default)]
pub struct UpdateDepartmentRequest {
    #[validate(length(min = 1, max = 100, message = "Department name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Faculty cannot be empty"))]
    pub faculty: Option<String>,
    #[validate(length(max = 255))]
    pub head_of_department: Option<String>,
}
