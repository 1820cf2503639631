use crate::core::AppError;
use crate::db::departments;
use crate::models::common::now_timestamp;
use crate::models::users::{
    RegisterRequest, Role, RoleProfile, UpdateLecturerRequest, UserProfile, UserRow,
};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use sqlx::SqlitePool;

const USER_SELECT: &str = r#"
    SELECT u.id, u.full_name, u.email, u.username, u.role, u.department_id,
           d.name AS department_name, u.college, u.course, u.year_of_study,
           u.password, u.created_at, u.updated_at
    FROM tbl_users u
    LEFT JOIN tbl_departments d ON d.id = u.department_id
"#;

fn to_profile(row: UserRow) -> Result<UserProfile, AppError> {
    UserProfile::try_from(row).map_err(AppError::internal_error)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::internal_error("Failed to hash password"))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::internal_error("Invalid password hash"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn create_user(
    pool: &SqlitePool,
    request: &RegisterRequest,
    profile: &RoleProfile,
) -> Result<UserProfile, AppError> {
    let now = now_timestamp();
    let password_hash = hash_password(&request.password)?;

    let mut tx = pool.begin().await?;

    let department_id =
        departments::get_or_create_by_name(&mut *tx, profile.department, profile.faculty).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_users (full_name, email, username, role, department_id, college,
                               course, year_of_study, password, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request.full_name.trim())
    .bind(request.email.trim().to_lowercase())
    .bind(request.username.trim())
    .bind(request.role.as_str())
    .bind(department_id)
    .bind(profile.college.clone())
    .bind(profile.course.clone())
    .bind(profile.year_of_study.clone())
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_user_by_id(pool, result.last_insert_rowid()).await
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<UserProfile, AppError> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.id = ?", USER_SELECT))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    to_profile(row)
}

/// Looks a user up by email (case-insensitive) or username.
pub async fn find_user_for_login(
    pool: &SqlitePool,
    login: &str,
) -> Result<Option<UserRow>, AppError> {
    let login = login.trim();
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "{} WHERE u.email = ? OR u.username = ?",
        USER_SELECT
    ))
    .bind(login.to_lowercase())
    .bind(login)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_users WHERE email = ?")
        .bind(email.trim().to_lowercase())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tbl_users WHERE username = ?")
        .bind(username.trim())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn list_users_by_role(
    pool: &SqlitePool,
    role: Role,
    department: Option<&str>,
) -> Result<Vec<UserProfile>, AppError> {
    let rows = match department.filter(|d| !d.trim().is_empty()) {
        Some(department) => {
            sqlx::query_as::<_, UserRow>(&format!(
                "{} WHERE u.role = ? AND d.name = ? ORDER BY u.full_name",
                USER_SELECT
            ))
            .bind(role.as_str())
            .bind(department.trim())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, UserRow>(&format!(
                "{} WHERE u.role = ? ORDER BY u.full_name",
                USER_SELECT
            ))
            .bind(role.as_str())
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter().map(to_profile).collect()
}

pub async fn user_ids_by_role(pool: &SqlitePool, role: Role) -> Result<Vec<i64>, AppError> {
    let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM tbl_users WHERE role = ? ORDER BY id")
        .bind(role.as_str())
        .fetch_all(pool)
        .await?;

    Ok(ids)
}

pub async fn get_lecturer(pool: &SqlitePool, lecturer_id: i64) -> Result<UserProfile, AppError> {
    let user = get_user_by_id(pool, lecturer_id)
        .await
        .map_err(|_| AppError::not_found("Lecturer not found"))?;

    if user.role != Role::Lecturer {
        return Err(AppError::not_found("Lecturer not found"));
    }
    Ok(user)
}

pub async fn update_lecturer(
    pool: &SqlitePool,
    lecturer_id: i64,
    request: &UpdateLecturerRequest,
) -> Result<UserProfile, AppError> {
    let current = get_lecturer(pool, lecturer_id).await?;

    if let Some(department_id) = request.department_id {
        departments::get_department(pool, department_id).await?;
    }

    let full_name = request
        .full_name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.full_name)
        .to_string();
    let email = request
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|| current.email.clone());
    let department_id = request.department_id.or(current.department_id);

    sqlx::query(
        r#"
        UPDATE tbl_users
        SET full_name = ?, email = ?, department_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(department_id)
    .bind(now_timestamp())
    .bind(lecturer_id)
    .execute(pool)
    .await?;

    get_user_by_id(pool, lecturer_id).await
}

/// Removes a lecturer; issues they held go back to the unassigned pool.
pub async fn delete_lecturer(pool: &SqlitePool, lecturer_id: i64) -> Result<u64, AppError> {
    get_lecturer(pool, lecturer_id).await?;

    let mut tx = pool.begin().await?;

    let unassigned = sqlx::query(
        "UPDATE tbl_issues SET assigned_to = NULL, updated_at = ? WHERE assigned_to = ?",
    )
    .bind(now_timestamp())
    .bind(lecturer_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM tbl_notifications WHERE recipient_id = ?")
        .bind(lecturer_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tbl_users WHERE id = ?")
        .bind(lecturer_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(unassigned)
}
