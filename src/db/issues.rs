use crate::core::access::IssueScope;
use crate::core::AppError;
use crate::db::like_pattern;
use crate::models::common::now_timestamp;
use crate::models::issues::{
    CreateIssueRequest, Issue, IssueFilter, IssueRow, IssueStatus, StoredAttachment,
    UpdateIssueRequest,
};
use crate::models::pagination::PaginationQuery;
use sqlx::SqlitePool;

const ISSUE_SELECT: &str = r#"
    SELECT i.id, i.title, i.category, i.course_unit, i.year_of_study, i.semester,
           i.description, i.priority, i.status, i.student_id, s.full_name AS student_name,
           i.assigned_to, l.full_name AS lecturer_name, d.name AS department_name,
           i.attachment_name, i.attachment_path, i.created_at, i.updated_at
    FROM tbl_issues i
    JOIN tbl_users s ON s.id = i.student_id
    LEFT JOIN tbl_users l ON l.id = i.assigned_to
    LEFT JOIN tbl_departments d ON d.id = s.department_id
"#;

const ISSUE_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM tbl_issues i
    JOIN tbl_users s ON s.id = i.student_id
    LEFT JOIN tbl_departments d ON d.id = s.department_id
"#;

fn to_issue(row: IssueRow) -> Result<Issue, AppError> {
    Issue::try_from(row).map_err(AppError::internal_error)
}

enum Bind {
    Int(i64),
    Text(String),
}

/// WHERE clause for a role-scoped, filtered issue list, with its binds in order.
fn where_clause(scope: IssueScope, user_id: i64, filter: &IssueFilter) -> (String, Vec<Bind>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    match scope {
        IssueScope::Own => {
            conditions.push("i.student_id = ?".to_string());
            binds.push(Bind::Int(user_id));
        }
        IssueScope::Assigned => {
            conditions.push("i.assigned_to = ?".to_string());
            binds.push(Bind::Int(user_id));
        }
        IssueScope::All => {}
    }

    if let Some(status) = filter.status {
        conditions.push("i.status = ?".to_string());
        binds.push(Bind::Text(status.as_str().to_string()));
    }
    if let Some(category) = filter.category {
        conditions.push("i.category = ?".to_string());
        binds.push(Bind::Text(category.as_str().to_string()));
    }
    if let Some(department) = filter.department.as_deref().map(str::trim) {
        if !department.is_empty() {
            conditions.push("d.name = ?".to_string());
            binds.push(Bind::Text(department.to_string()));
        }
    }
    if let Some(search) = filter.search.as_deref().map(str::trim) {
        if !search.is_empty() {
            conditions.push(
                "(i.title LIKE ? ESCAPE '!' OR i.description LIKE ? ESCAPE '!' \
                 OR i.course_unit LIKE ? ESCAPE '!')"
                    .to_string(),
            );
            let pattern = like_pattern(search);
            binds.push(Bind::Text(pattern.clone()));
            binds.push(Bind::Text(pattern.clone()));
            binds.push(Bind::Text(pattern));
        }
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

/// Lists issues visible in `scope`, newest first. Returns the page and the total match count.
pub async fn list_issues(
    pool: &SqlitePool,
    scope: IssueScope,
    user_id: i64,
    filter: &IssueFilter,
    page: Option<PaginationQuery>,
) -> Result<(Vec<Issue>, i64), AppError> {
    let (where_sql, binds) = where_clause(scope, user_id, filter);

    let mut sql = format!(
        "{}{} ORDER BY i.created_at DESC, i.id DESC",
        ISSUE_SELECT, where_sql
    );
    if page.is_some() {
        sql.push_str(" LIMIT ? OFFSET ?");
    }

    let mut query = sqlx::query_as::<_, IssueRow>(&sql);
    for bind in &binds {
        query = match bind {
            Bind::Int(value) => query.bind(*value),
            Bind::Text(value) => query.bind(value.clone()),
        };
    }
    if let Some(page) = page {
        query = query.bind(page.per_page).bind(page.offset());
    }

    let issues = query
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(to_issue)
        .collect::<Result<Vec<_>, _>>()?;

    let total = match page {
        None => issues.len() as i64,
        Some(_) => {
            let count_sql = format!("{}{}", ISSUE_COUNT, where_sql);
            let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
            for bind in &binds {
                count_query = match bind {
                    Bind::Int(value) => count_query.bind(*value),
                    Bind::Text(value) => count_query.bind(value.clone()),
                };
            }
            count_query.fetch_one(pool).await?
        }
    };

    Ok((issues, total))
}

pub async fn get_issue(pool: &SqlitePool, issue_id: i64) -> Result<Issue, AppError> {
    let row = sqlx::query_as::<_, IssueRow>(&format!("{} WHERE i.id = ?", ISSUE_SELECT))
        .bind(issue_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Issue not found"))?;

    to_issue(row)
}

pub async fn get_attachment(
    pool: &SqlitePool,
    issue_id: i64,
) -> Result<Option<StoredAttachment>, AppError> {
    let row: Option<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT attachment_name, attachment_path FROM tbl_issues WHERE id = ?",
    )
    .bind(issue_id)
    .fetch_optional(pool)
    .await?;

    match row {
        None => Err(AppError::not_found("Issue not found")),
        Some((Some(file_name), Some(relative_path))) => Ok(Some(StoredAttachment {
            file_name,
            relative_path,
        })),
        Some(_) => Ok(None),
    }
}

pub async fn create_issue(
    pool: &SqlitePool,
    student_id: i64,
    request: &CreateIssueRequest,
    attachment: Option<&StoredAttachment>,
) -> Result<Issue, AppError> {
    let now = now_timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO tbl_issues (title, category, course_unit, year_of_study, semester,
                                description, priority, status, student_id, assigned_to,
                                attachment_name, attachment_path, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request.title.trim())
    .bind(request.category.as_str())
    .bind(request.course_unit.trim())
    .bind(request.year_of_study)
    .bind(request.semester)
    .bind(request.description.trim())
    .bind(request.effective_priority().as_str())
    .bind(IssueStatus::Open.as_str())
    .bind(student_id)
    .bind(request.lecturer_id)
    .bind(attachment.map(|a| a.file_name.clone()))
    .bind(attachment.map(|a| a.relative_path.clone()))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_issue(pool, result.last_insert_rowid()).await
}

/// Applies the fields present in `request`. A new attachment replaces the old one.
pub async fn update_issue(
    pool: &SqlitePool,
    issue_id: i64,
    request: &UpdateIssueRequest,
    attachment: Option<&StoredAttachment>,
) -> Result<Issue, AppError> {
    let current = get_issue(pool, issue_id).await?;

    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.title)
        .to_string();
    let course_unit = request
        .course_unit
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.course_unit)
        .to_string();
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.description)
        .to_string();
    let category = request.category.unwrap_or(current.category);
    let priority = request.priority.unwrap_or(current.priority);

    sqlx::query(
        r#"
        UPDATE tbl_issues
        SET title = ?, category = ?, course_unit = ?, year_of_study = ?, semester = ?,
            description = ?, priority = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(title)
    .bind(category.as_str())
    .bind(course_unit)
    .bind(request.year_of_study.unwrap_or(current.year_of_study))
    .bind(request.semester.unwrap_or(current.semester))
    .bind(description)
    .bind(priority.as_str())
    .bind(now_timestamp())
    .bind(issue_id)
    .execute(pool)
    .await?;

    if let Some(attachment) = attachment {
        sqlx::query("UPDATE tbl_issues SET attachment_name = ?, attachment_path = ? WHERE id = ?")
            .bind(attachment.file_name.clone())
            .bind(attachment.relative_path.clone())
            .bind(issue_id)
            .execute(pool)
            .await?;
    }

    get_issue(pool, issue_id).await
}

/// Moves an issue from `from` to `to`. Fails with a conflict if the stored status
/// is no longer `from`, so a transition is only applied to the state it was checked against.
pub async fn update_status(
    pool: &SqlitePool,
    issue_id: i64,
    from: IssueStatus,
    to: IssueStatus,
) -> Result<Issue, AppError> {
    let updated = sqlx::query(
        "UPDATE tbl_issues SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(now_timestamp())
    .bind(issue_id)
    .bind(from.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        get_issue(pool, issue_id).await?;
        return Err(AppError::conflict(
            "Issue status changed in the meantime, reload and try again",
        ));
    }

    get_issue(pool, issue_id).await
}

pub async fn assign_issue(
    pool: &SqlitePool,
    issue_id: i64,
    lecturer_id: i64,
) -> Result<Issue, AppError> {
    sqlx::query("UPDATE tbl_issues SET assigned_to = ?, updated_at = ? WHERE id = ?")
        .bind(lecturer_id)
        .bind(now_timestamp())
        .bind(issue_id)
        .execute(pool)
        .await?;

    get_issue(pool, issue_id).await
}

/// Deletes an issue. Notifications that pointed at it stay, unlinked.
/// Returns the stored attachment so the caller can remove the file.
pub async fn delete_issue(
    pool: &SqlitePool,
    issue_id: i64,
) -> Result<Option<StoredAttachment>, AppError> {
    let attachment = get_attachment(pool, issue_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE tbl_notifications SET issue_id = NULL WHERE issue_id = ?")
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM tbl_issues WHERE id = ?")
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(attachment)
}

pub async fn status_counts(
    pool: &SqlitePool,
    scope: IssueScope,
    user_id: i64,
) -> Result<Vec<(String, i64)>, AppError> {
    let (where_sql, binds) = where_clause(scope, user_id, &IssueFilter::default());
    let sql = format!(
        "SELECT i.status, COUNT(*) FROM tbl_issues i{} GROUP BY i.status",
        where_sql
    );

    let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
    for bind in &binds {
        query = match bind {
            Bind::Int(value) => query.bind(*value),
            Bind::Text(value) => query.bind(value.clone()),
        };
    }

    Ok(query.fetch_all(pool).await?)
}
