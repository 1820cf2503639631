use crate::core::AppError;
use crate::models::common::now_timestamp;
use crate::models::departments::{
    CreateDepartmentRequest, Department, DepartmentRow, UpdateDepartmentRequest,
};
use sqlx::{SqliteConnection, SqlitePool};

const DEPARTMENT_SELECT: &str = r#"
    SELECT d.id, d.name, d.faculty, d.head_of_department,
           (SELECT COUNT(*) FROM tbl_users s
             WHERE s.department_id = d.id AND s.role = 'lecturer') AS staff_count,
           (SELECT COUNT(*) FROM tbl_users s
             WHERE s.department_id = d.id AND s.role = 'student') AS student_count,
           d.created_at
    FROM tbl_departments d
"#;

/// Resolves a department by name, creating it under `faculty` on first use.
pub async fn get_or_create_by_name(
    conn: &mut SqliteConnection,
    name: &str,
    faculty: &str,
) -> Result<i64, AppError> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM tbl_departments WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let now = now_timestamp();
    let result = sqlx::query(
        "INSERT INTO tbl_departments (name, faculty, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(faculty)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_departments(
    pool: &SqlitePool,
    faculty: Option<&str>,
) -> Result<Vec<Department>, AppError> {
    let rows = match faculty.filter(|f| !f.trim().is_empty()) {
        Some(faculty) => {
            sqlx::query_as::<_, DepartmentRow>(&format!(
                "{} WHERE d.faculty = ? ORDER BY d.name",
                DEPARTMENT_SELECT
            ))
            .bind(faculty.trim())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, DepartmentRow>(&format!("{} ORDER BY d.name", DEPARTMENT_SELECT))
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows.into_iter().map(Department::from).collect())
}

pub async fn get_department(pool: &SqlitePool, department_id: i64) -> Result<Department, AppError> {
    let row = sqlx::query_as::<_, DepartmentRow>(&format!(
        "{} WHERE d.id = ?",
        DEPARTMENT_SELECT
    ))
    .bind(department_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Department not found"))?;

    Ok(Department::from(row))
}

async fn name_taken(pool: &SqlitePool, name: &str, except_id: i64) -> Result<bool, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tbl_departments WHERE name = ? AND id <> ?")
            .bind(name)
            .bind(except_id)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

pub async fn create_department(
    pool: &SqlitePool,
    request: &CreateDepartmentRequest,
) -> Result<Department, AppError> {
    let name = request.name.trim();
    if name_taken(pool, name, 0).await? {
        return Err(AppError::conflict("A department with this name already exists"));
    }

    let now = now_timestamp();
    let result = sqlx::query(
        r#"
        INSERT INTO tbl_departments (name, faculty, head_of_department, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(request.faculty.trim())
    .bind(request.head_of_department.clone())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_department(pool, result.last_insert_rowid()).await
}

pub async fn update_department(
    pool: &SqlitePool,
    department_id: i64,
    request: &UpdateDepartmentRequest,
) -> Result<Department, AppError> {
    let current = get_department(pool, department_id).await?;

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.name)
        .to_string();
    if name != current.name && name_taken(pool, &name, department_id).await? {
        return Err(AppError::conflict("A department with this name already exists"));
    }
    let faculty = request
        .faculty
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.faculty)
        .to_string();
    let head_of_department = request
        .head_of_department
        .clone()
        .or(current.head_of_department);

    sqlx::query(
        r#"
        UPDATE tbl_departments
        SET name = ?, faculty = ?, head_of_department = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(faculty)
    .bind(head_of_department)
    .bind(now_timestamp())
    .bind(department_id)
    .execute(pool)
    .await?;

    get_department(pool, department_id).await
}

/// Deletes a department; users referencing it keep their accounts with no department.
pub async fn delete_department(pool: &SqlitePool, department_id: i64) -> Result<(), AppError> {
    get_department(pool, department_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE tbl_users SET department_id = NULL, updated_at = ? WHERE department_id = ?")
        .bind(now_timestamp())
        .bind(department_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tbl_departments WHERE id = ?")
        .bind(department_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}
