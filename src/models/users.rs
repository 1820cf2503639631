use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationError};

use super::common::to_datetime;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Lecturer,
    #[serde(alias = "academic_registrar")]
    Registrar,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Lecturer, Role::Registrar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Lecturer => "lecturer",
            Role::Registrar => "registrar",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "lecturer" => Ok(Role::Lecturer),
            "registrar" | "academic_registrar" => Ok(Role::Registrar),
            _ => Err(format!(
                "Invalid role: {}. Must be one of: student, lecturer, registrar",
                s
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape of `tbl_users`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub role: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub college: Option<String>,
    pub course: Option<String>,
    pub year_of_study: Option<String>,
    pub password: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub department_id: Option<i64>,
    pub department: Option<String>,
    pub college: Option<String>,
    pub course: Option<String>,
    pub year_of_study: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            username: row.username,
            role: row.role.parse()?,
            department_id: row.department_id,
            department: row.department_name,
            college: row.college,
            course: row.course,
            year_of_study: row.year_of_study,
            created_at: to_datetime(row.created_at),
        })
    }
}

/// Profile fields a student supplies at registration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StudentData {
    pub college: String,
    pub department: String,
    pub course: String,
    pub year_of_study: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LecturerData {
    pub department: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RegistrarData {
    pub college: String,
    pub department: String,
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub role: Role,
    pub student_data: Option<StudentData>,
    pub lecturer_data: Option<LecturerData>,
    pub registrar_data: Option<RegistrarData>,
}

pub const COLLEGES: [&str; 4] = [
    "College of Computing",
    "College Of Humanity And Social Sciences",
    "College Of Engineering",
    "College Of Education",
];

pub const COURSES: [&str; 4] = [
    "Computer Science",
    "Software Engineering",
    "Library and Information",
    "Information Technology",
];

pub const YEARS_OF_STUDY: [&str; 3] = ["First Year", "Second Year", "Third Year"];

/// Department names accepted at registration and the faculty each belongs to.
pub const DEPARTMENT_FACULTIES: [(&str, &str); 4] = [
    ("Department of Computer Science", "College of Computing"),
    ("Department Of Software Engineering", "College of Computing"),
    (
        "Department of Library And Information System",
        "College Of Humanity And Social Sciences",
    ),
    ("Department Of Information Technology", "College of Computing"),
];

/// Role-specific profile, resolved from whichever `*_data` block matches the role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleProfile {
    pub department: &'static str,
    pub faculty: &'static str,
    pub college: Option<String>,
    pub course: Option<String>,
    pub year_of_study: Option<String>,
}

impl RegisterRequest {
    pub fn role_profile(&self) -> Result<RoleProfile, ValidationError> {
        let (department, college, course, year_of_study) = match self.role {
            Role::Student => {
                let data = self
                    .student_data
                    .as_ref()
                    .ok_or_else(|| field_error("student_data", "Student details are required"))?;
                one_of(&data.college, &COLLEGES, "college")?;
                one_of(&data.course, &COURSES, "course")?;
                one_of(&data.year_of_study, &YEARS_OF_STUDY, "year_of_study")?;
                (
                    data.department.as_str(),
                    Some(data.college.clone()),
                    Some(data.course.clone()),
                    Some(data.year_of_study.clone()),
                )
            }
            Role::Lecturer => {
                let data = self
                    .lecturer_data
                    .as_ref()
                    .ok_or_else(|| field_error("lecturer_data", "Lecturer details are required"))?;
                (data.department.as_str(), None, None, None)
            }
            Role::Registrar => {
                let data = self.registrar_data.as_ref().ok_or_else(|| {
                    field_error("registrar_data", "Registrar details are required")
                })?;
                one_of(&data.college, &COLLEGES, "college")?;
                (data.department.as_str(), Some(data.college.clone()), None, None)
            }
        };

        let (department, faculty) = DEPARTMENT_FACULTIES
            .iter()
            .find(|(name, _)| *name == department)
            .copied()
            .ok_or_else(|| field_error("department", "Invalid department"))?;

        Ok(RoleProfile {
            department,
            faculty,
            college,
            course,
            year_of_study,
        })
    }
}

fn one_of(value: &str, choices: &[&str], field: &'static str) -> Result<(), ValidationError> {
    if choices.contains(&value) {
        return Ok(());
    }
    Err(field_error(
        field,
        &format!("Invalid {}. Must be one of: {}", field, choices.join(", ")),
    ))
}

fn field_error(code: &'static str, message: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_string().into());
    error
}

#[derive(Validate, Debug, Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    /// Email address or username.
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct DepartmentFilter {
    pub department: Option<String>,
}

#[derive(Validate, Debug, Deserialize, Serialize, Default, Clone)]
pub struct UpdateLecturerRequest {
    #[validate(length(min = 1, max = 255, message = "Full name cannot be empty"))]
    pub full_name: Option<String>,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    pub department_id: Option<i64>,
}
