use crate::helpers::{data, spawn_app, COMPUTER_SCIENCE};
use aits::models::dashboard::DashboardStats;
use serde_json::json;

#[tokio::test]
async fn stats_follow_what_each_role_can_see() {
    // Arrange
    let app = spawn_app().await;
    let student = app.student().await;
    let other_student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;

    let assigned = app.create_issue(&student, Some(lecturer.id)).await;
    app.create_issue(&student, None).await;
    app.create_issue(&other_student, None).await;
    app.patch_json(
        &format!("/issues/{}/update", assigned),
        &lecturer,
        &json!({ "status": "in_progress" }),
    )
    .await;

    // Act
    let student_stats: DashboardStats = data(app.get("/dashboard/stats", &student).await).await;
    let lecturer_stats: DashboardStats = data(app.get("/dashboard/stats", &lecturer).await).await;
    let registrar_stats: DashboardStats =
        data(app.get("/dashboard/stats", &registrar).await).await;

    // Assert
    assert_eq!(student_stats.total, 2);
    assert_eq!(student_stats.open, 1);
    assert_eq!(student_stats.in_progress, 1);
    assert_eq!(student_stats.unread_notifications, 1);

    assert_eq!(lecturer_stats.total, 1);
    assert_eq!(lecturer_stats.in_progress, 1);

    assert_eq!(registrar_stats.total, 3);
    assert_eq!(registrar_stats.open, 2);
    assert_eq!(registrar_stats.unread_notifications, 3);
}
