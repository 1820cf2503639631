use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::core::jwt_auth::AuthUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::departments;
use crate::models::departments::{CreateDepartmentRequest, UpdateDepartmentRequest};
use crate::models::users::Role;

#[derive(Debug, Deserialize)]
pub struct FacultyFilter {
    pub faculty: Option<String>,
}

#[tracing::instrument(name = "List Departments", skip(pool, _user))]
#[get("")]
pub async fn list_departments(
    pool: web::Data<SqlitePool>,
    _user: AuthUser,
    filter: web::Query<FacultyFilter>,
) -> Result<HttpResponse, AppError> {
    let departments = departments::list_departments(&pool, filter.faculty.as_deref()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        departments,
        "Departments retrieved successfully",
    )))
}

#[tracing::instrument(name = "Create Department", skip(pool, user, request))]
#[post("")]
pub async fn create_department(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    request: web::Json<CreateDepartmentRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Registrar])?;
    request.validate()?;

    let department = departments::create_department(&pool, &request).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        department,
        "Department created successfully",
    )))
}

#[tracing::instrument(name = "Update Department", skip(pool, user, request))]
#[patch("/{department_id}")]
pub async fn update_department(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
    request: web::Json<UpdateDepartmentRequest>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Registrar])?;
    request.validate()?;

    let department = departments::update_department(&pool, path.into_inner(), &request).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        department,
        "Department updated successfully",
    )))
}

#[tracing::instrument(name = "Delete Department", skip(pool, user))]
#[delete("/{department_id}")]
pub async fn delete_department(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    user.require_role(&[Role::Registrar])?;
    let department_id = path.into_inner();

    departments::delete_department(&pool, department_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": department_id }),
        "Department deleted successfully",
    )))
}
