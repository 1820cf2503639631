use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::core::access::{self, policy_for};
use crate::core::config::AttachmentConfig;
use crate::core::jwt_auth::AuthUser;
use crate::core::{issue_events, AppError, AppSuccessResponse};
use crate::db::{issues, notifications, users};
use crate::models::issues::{AssignIssueRequest, IssueFilter, UpdateStatusRequest};
use crate::models::pagination::{PaginationMeta, PaginationQuery};
use crate::models::users::Role;
use crate::routes::issue_payload::{
    attachment_path, discard_on_error, read_create_payload, read_update_payload,
    remove_attachment, store_attachment,
};

/// Notification failures never undo the change that triggered them.
async fn deliver(pool: &SqlitePool, pending: Vec<crate::models::notifications::NewNotification>) {
    if let Err(e) = notifications::insert_many(pool, &pending).await {
        tracing::error!("Failed to store {} notifications: {:?}", pending.len(), e);
    }
}

async fn list_for_role(
    pool: &SqlitePool,
    user: &AuthUser,
    role: Role,
    filter: &IssueFilter,
    page: Option<PaginationQuery>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[role])?;
    let scope = policy_for(role).scope;

    let (issues, total) = issues::list_issues(pool, scope, user.user_id, filter, page).await?;

    let mut response = AppSuccessResponse::new(issues, "Issues retrieved successfully");
    response.pagination = page.map(|p| PaginationMeta::new(p.page, p.per_page, total));
    Ok(HttpResponse::Ok().json(response))
}

async fn detail_for_role(
    pool: &SqlitePool,
    user: &AuthUser,
    role: Role,
    issue_id: i64,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[role])?;

    let issue = issues::get_issue(pool, issue_id).await?;
    access::ensure_can_read(user.role, user.user_id, &issue)?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(issue, "Issue retrieved successfully")))
}

#[tracing::instrument(name = "List Student Issues", skip(pool, user))]
#[get("/issues")]
pub async fn list_student_issues(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    filter: web::Query<IssueFilter>,
) -> Result<HttpResponse, AppError> {
    list_for_role(&pool, &user, Role::Student, &filter, None).await
}

#[tracing::instrument(name = "Get Student Issue", skip(pool, user))]
#[get("/issues/{issue_id}")]
pub async fn get_student_issue(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    detail_for_role(&pool, &user, Role::Student, path.into_inner()).await
}

#[tracing::instrument(name = "List Lecturer Issues", skip(pool, user))]
#[get("/issues")]
pub async fn list_lecturer_issues(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    filter: web::Query<IssueFilter>,
) -> Result<HttpResponse, AppError> {
    list_for_role(&pool, &user, Role::Lecturer, &filter, None).await
}

#[tracing::instrument(name = "Get Lecturer Issue", skip(pool, user))]
#[get("/issues/{issue_id}")]
pub async fn get_lecturer_issue(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    detail_for_role(&pool, &user, Role::Lecturer, path.into_inner()).await
}

#[tracing::instrument(name = "List Registrar Issues", skip(pool, user))]
#[get("/issues")]
pub async fn list_registrar_issues(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    filter: web::Query<IssueFilter>,
    pagination: web::Query<PaginationQuery>,
) -> Result<HttpResponse, AppError> {
    let mut pagination = pagination.into_inner();
    pagination.validate();

    list_for_role(&pool, &user, Role::Registrar, &filter, Some(pagination)).await
}

#[tracing::instrument(name = "Get Registrar Issue", skip(pool, user))]
#[get("/issues/{issue_id}")]
pub async fn get_registrar_issue(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    detail_for_role(&pool, &user, Role::Registrar, path.into_inner()).await
}

#[tracing::instrument(name = "Create Issue", skip(pool, attachments, user, req, payload))]
#[post("/issues")]
pub async fn create_issue(
    pool: web::Data<SqlitePool>,
    attachments: web::Data<AttachmentConfig>,
    user: AuthUser,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Student])?;

    let body = read_create_payload(&req, payload, &attachments).await?;
    body.data.validate()?;

    if let Some(lecturer_id) = body.data.lecturer_id {
        users::get_lecturer(&pool, lecturer_id)
            .await
            .map_err(|_| AppError::bad_request("lecturer_id: no such lecturer"))?;
    }

    let stored = body
        .attachment
        .as_ref()
        .map(|file| store_attachment(&attachments, file))
        .transpose()?;

    let created = issues::create_issue(&pool, user.user_id, &body.data, stored.as_ref()).await;
    let issue = discard_on_error(&attachments, stored.as_ref(), created)?;

    let registrars = users::user_ids_by_role(&pool, Role::Registrar).await?;
    deliver(&pool, issue_events::issue_created(&issue, &registrars)).await;

    tracing::info!(issue_id = issue.id, "issue created");
    Ok(HttpResponse::Created().json(AppSuccessResponse::new(issue, "Issue created successfully")))
}

#[tracing::instrument(name = "Update Issue", skip(pool, attachments, user, req, payload))]
#[patch("/issues/{issue_id}")]
pub async fn update_issue(
    pool: web::Data<SqlitePool>,
    attachments: web::Data<AttachmentConfig>,
    user: AuthUser,
    path: web::Path<i64>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Student])?;
    let issue_id = path.into_inner();

    let current = issues::get_issue(&pool, issue_id).await?;
    access::ensure_can_edit(user.role, user.user_id, &current)?;

    let body = read_update_payload(&req, payload, &attachments).await?;
    body.data.validate()?;
    if body.data.is_empty() && body.attachment.is_none() {
        return Err(AppError::bad_request("No changes were provided"));
    }

    let previous = issues::get_attachment(&pool, issue_id).await?;
    let stored = body
        .attachment
        .as_ref()
        .map(|file| store_attachment(&attachments, file))
        .transpose()?;

    let updated = issues::update_issue(&pool, issue_id, &body.data, stored.as_ref()).await;
    let issue = discard_on_error(&attachments, stored.as_ref(), updated)?;

    if let (Some(_), Some(previous)) = (&stored, &previous) {
        remove_attachment(&attachments, previous);
    }

    deliver(&pool, issue_events::issue_edited(&issue)).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(issue, "Issue updated successfully")))
}

#[tracing::instrument(name = "Update Issue Status", skip(pool, user, request))]
#[patch("/{issue_id}/update")]
pub async fn update_issue_status(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let issue_id = path.into_inner();

    let current = issues::get_issue(&pool, issue_id).await?;
    access::ensure_can_transition(user.role, user.user_id, &current, request.status)?;

    let issue = issues::update_status(&pool, issue_id, current.status, request.status).await?;
    deliver(&pool, issue_events::status_changed(&issue, user.role)).await;

    tracing::info!(
        issue_id,
        from = %current.status,
        to = %issue.status,
        "issue status changed"
    );
    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        issue,
        "Issue status updated successfully",
    )))
}

#[tracing::instrument(name = "Assign Issue", skip(pool, user, request))]
#[patch("/{issue_id}/assign")]
pub async fn assign_issue(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<AssignIssueRequest>,
) -> Result<HttpResponse, AppError> {
    if !policy_for(user.role).can_assign {
        return Err(AppError::forbidden_error(
            "Only registrars can assign issues",
        ));
    }
    let issue_id = path.into_inner();

    issues::get_issue(&pool, issue_id).await?;
    users::get_lecturer(&pool, request.lecturer_id).await?;

    let issue = issues::assign_issue(&pool, issue_id, request.lecturer_id).await?;
    deliver(&pool, issue_events::issue_assigned(&issue)).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(issue, "Issue assigned successfully")))
}

#[tracing::instrument(name = "Delete Issue", skip(pool, attachments, user))]
#[delete("/{issue_id}/delete")]
pub async fn delete_issue(
    pool: web::Data<SqlitePool>,
    attachments: web::Data<AttachmentConfig>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let issue_id = path.into_inner();

    let issue = issues::get_issue(&pool, issue_id).await?;
    access::ensure_can_delete(user.role, user.user_id, &issue)?;

    if let Some(stored) = issues::delete_issue(&pool, issue_id).await? {
        remove_attachment(&attachments, &stored);
    }

    tracing::info!(issue_id, deleted_by = user.user_id, "issue deleted");
    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": issue_id }),
        "Issue deleted successfully",
    )))
}

#[tracing::instrument(name = "Download Attachment", skip(pool, attachments, user))]
#[get("/{issue_id}/attachment")]
pub async fn download_attachment(
    pool: web::Data<SqlitePool>,
    attachments: web::Data<AttachmentConfig>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<NamedFile, AppError> {
    let issue_id = path.into_inner();

    let issue = issues::get_issue(&pool, issue_id).await?;
    access::ensure_can_read(user.role, user.user_id, &issue)?;

    let stored = issues::get_attachment(&pool, issue_id)
        .await?
        .ok_or_else(|| AppError::not_found("This issue has no attachment"))?;

    let file = NamedFile::open(attachment_path(&attachments, &stored)).map_err(|e| {
        tracing::error!("Attachment {} is missing on disk: {:?}", stored.relative_path, e);
        AppError::not_found("Attachment file not found")
    })?;

    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(stored.file_name)],
    }))
}
