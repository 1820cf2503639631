use actix_web::{delete, get, post, web, HttpResponse};
use sqlx::SqlitePool;

use crate::core::jwt_auth::AuthUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::notifications;
use crate::models::notifications::{unread_count, NotificationList, UnreadCount};

#[tracing::instrument(name = "List Notifications", skip(pool, user), fields(user_id = user.user_id))]
#[get("")]
pub async fn list_notifications(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let notifications = notifications::list_for_recipient(&pool, user.user_id).await?;
    let unread_count = unread_count(&notifications);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        NotificationList {
            notifications,
            unread_count,
        },
        "Notifications retrieved successfully",
    )))
}

#[tracing::instrument(name = "Unread Notification Count", skip(pool, user), fields(user_id = user.user_id))]
#[get("/unread-count")]
pub async fn get_unread_count(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let count = notifications::unread_count(&pool, user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        UnreadCount { count },
        "Unread count retrieved successfully",
    )))
}

#[tracing::instrument(name = "Mark Notification Read", skip(pool, user), fields(user_id = user.user_id))]
#[post("/{notification_id}/mark-read")]
pub async fn mark_read(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let notification = notifications::mark_read(&pool, user.user_id, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        notification,
        "Notification marked as read",
    )))
}

#[tracing::instrument(name = "Mark All Notifications Read", skip(pool, user), fields(user_id = user.user_id))]
#[post("/mark-all-read")]
pub async fn mark_all_read(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let updated = notifications::mark_all_read(&pool, user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "updated": updated }),
        "All notifications marked as read",
    )))
}

#[tracing::instrument(name = "Delete Notification", skip(pool, user), fields(user_id = user.user_id))]
#[delete("/{notification_id}/delete")]
pub async fn delete_notification(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let notification_id = path.into_inner();
    notifications::delete(&pool, user.user_id, notification_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "id": notification_id }),
        "Notification deleted successfully",
    )))
}

#[tracing::instrument(name = "Clear Notifications", skip(pool, user), fields(user_id = user.user_id))]
#[delete("/clear-all")]
pub async fn clear_all(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let deleted = notifications::clear_all(&pool, user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        serde_json::json!({ "deleted": deleted }),
        "All notifications cleared",
    )))
}
