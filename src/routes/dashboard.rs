use actix_web::{get, web, HttpResponse};
use sqlx::SqlitePool;

use crate::core::access::policy_for;
use crate::core::jwt_auth::AuthUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::db::{issues, notifications};
use crate::models::dashboard::DashboardStats;

/// Issue counts over whatever the caller's role can see.
#[tracing::instrument(name = "Dashboard Stats", skip(pool, user), fields(user_id = user.user_id, role = %user.role))]
#[get("/stats")]
pub async fn dashboard_stats(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let scope = policy_for(user.role).scope;
    let counts = issues::status_counts(&pool, scope, user.user_id).await?;
    let unread = notifications::unread_count(&pool, user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        DashboardStats::from_status_counts(&counts, unread),
        "Dashboard statistics retrieved successfully",
    )))
}
