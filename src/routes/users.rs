use actix_web::{delete, get, patch, web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::core::jwt_auth::AuthUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::users;
use crate::models::users::{DepartmentFilter, Role, UpdateLecturerRequest};

#[tracing::instrument(name = "List Lecturers", skip(pool, user))]
#[get("")]
pub async fn list_lecturers(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    filter: web::Query<DepartmentFilter>,
) -> Result<HttpResponse, AppError> {
    // students pick a lecturer on the issue form
    user.require_role(&[Role::Registrar, Role::Student])?;

    let lecturers =
        users::list_users_by_role(&pool, Role::Lecturer, filter.department.as_deref()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        lecturers,
        "Lecturers retrieved successfully",
    )))
}

#[tracing::instrument(name = "Update Lecturer", skip(pool, user, request))]
#[patch("/{lecturer_id}")]
pub async fn update_lecturer(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<UpdateLecturerRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Registrar])?;
    request.validate()?;

    let lecturer = users::update_lecturer(&pool, path.into_inner(), &request).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        lecturer,
        "Lecturer updated successfully",
    )))
}

#[tracing::instrument(name = "Delete Lecturer", skip(pool, user))]
#[delete("/{lecturer_id}")]
pub async fn delete_lecturer(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Registrar])?;
    let lecturer_id = path.into_inner();

    let unassigned = users::delete_lecturer(&pool, lecturer_id).await?;
    tracing::info!(lecturer_id, unassigned, "lecturer deleted");

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": lecturer_id, "unassigned_issues": unassigned }),
        "Lecturer deleted successfully",
    )))
}

#[tracing::instrument(name = "List Students", skip(pool, user))]
#[get("")]
pub async fn list_students(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    filter: web::Query<DepartmentFilter>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Registrar, Role::Lecturer])?;

    let students =
        users::list_users_by_role(&pool, Role::Student, filter.department.as_deref()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        students,
        "Students retrieved successfully",
    )))
}
