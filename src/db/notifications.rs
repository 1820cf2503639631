use crate::core::AppError;
use crate::models::common::now_timestamp;
use crate::models::notifications::{NewNotification, Notification, NotificationRow};
use sqlx::SqlitePool;

const NOTIFICATION_SELECT: &str = r#"
    SELECT id, recipient_id, notification_type, issue_id, message, is_read, created_at
    FROM tbl_notifications
"#;

fn to_notification(row: NotificationRow) -> Result<Notification, AppError> {
    Notification::try_from(row).map_err(AppError::internal_error)
}

pub async fn insert_many(pool: &SqlitePool, notifications: &[NewNotification]) -> Result<(), AppError> {
    if notifications.is_empty() {
        return Ok(());
    }

    let now = now_timestamp();
    let mut tx = pool.begin().await?;

    for notification in notifications {
        sqlx::query(
            r#"
            INSERT INTO tbl_notifications (recipient_id, notification_type, issue_id, message,
                                           is_read, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.notification_type.as_str())
        .bind(notification.issue_id)
        .bind(notification.message.clone())
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn list_for_recipient(
    pool: &SqlitePool,
    recipient_id: i64,
) -> Result<Vec<Notification>, AppError> {
    sqlx::query_as::<_, NotificationRow>(&format!(
        "{} WHERE recipient_id = ? ORDER BY created_at DESC, id DESC",
        NOTIFICATION_SELECT
    ))
    .bind(recipient_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(to_notification)
    .collect()
}

pub async fn unread_count(pool: &SqlitePool, recipient_id: i64) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tbl_notifications WHERE recipient_id = ? AND is_read = 0",
    )
    .bind(recipient_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Another recipient's notification is reported as missing.
pub async fn get_for_recipient(
    pool: &SqlitePool,
    recipient_id: i64,
    notification_id: i64,
) -> Result<Notification, AppError> {
    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        "{} WHERE id = ? AND recipient_id = ?",
        NOTIFICATION_SELECT
    ))
    .bind(notification_id)
    .bind(recipient_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Notification not found"))?;

    to_notification(row)
}

pub async fn mark_read(
    pool: &SqlitePool,
    recipient_id: i64,
    notification_id: i64,
) -> Result<Notification, AppError> {
    get_for_recipient(pool, recipient_id, notification_id).await?;

    sqlx::query("UPDATE tbl_notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?")
        .bind(notification_id)
        .bind(recipient_id)
        .execute(pool)
        .await?;

    get_for_recipient(pool, recipient_id, notification_id).await
}

pub async fn mark_all_read(pool: &SqlitePool, recipient_id: i64) -> Result<u64, AppError> {
    let updated = sqlx::query(
        "UPDATE tbl_notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
    )
    .bind(recipient_id)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(updated)
}

pub async fn delete(pool: &SqlitePool, recipient_id: i64, notification_id: i64) -> Result<(), AppError> {
    let deleted = sqlx::query("DELETE FROM tbl_notifications WHERE id = ? AND recipient_id = ?")
        .bind(notification_id)
        .bind(recipient_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(())
}

pub async fn clear_all(pool: &SqlitePool, recipient_id: i64) -> Result<u64, AppError> {
    let deleted = sqlx::query("DELETE FROM tbl_notifications WHERE recipient_id = ?")
        .bind(recipient_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(deleted)
}
