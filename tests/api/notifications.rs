use crate::helpers::{data, error_message, spawn_app, TestApp, TestUser, COMPUTER_SCIENCE};
use aits::models::notifications::{Notification, NotificationList, NotificationType, UnreadCount};
use reqwest::Method;
use serde_json::json;

async fn notifications(app: &TestApp, user: &TestUser) -> NotificationList {
    let response = app.get("/notifications", user).await;
    assert_eq!(200, response.status().as_u16());
    data(response).await
}

async fn unread(app: &TestApp, user: &TestUser) -> i64 {
    let count: UnreadCount = data(app.get("/notifications/unread-count", user).await).await;
    count.count
}

#[tokio::test]
async fn new_issue_notifies_every_registrar_and_the_chosen_lecturer() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let first_registrar = app.registrar().await;
    let second_registrar = app.registrar().await;

    let id = app.create_issue(&student, Some(lecturer.id)).await;

    for registrar in [&first_registrar, &second_registrar] {
        let list = notifications(&app, registrar).await;
        assert_eq!(list.unread_count, 1);
        assert_eq!(list.notifications[0].notification_type, NotificationType::IssueCreated);
        assert_eq!(list.notifications[0].issue_id, Some(id));
    }

    let list = notifications(&app, &lecturer).await;
    assert_eq!(list.notifications.len(), 1);
    assert_eq!(list.notifications[0].notification_type, NotificationType::IssueAssigned);

    assert!(notifications(&app, &student).await.notifications.is_empty());
}

#[tokio::test]
async fn assignment_and_resolution_reach_the_student() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, None).await;

    app.patch_json(
        &format!("/issues/{}/assign", id),
        &registrar,
        &json!({ "lecturer_id": lecturer.id }),
    )
    .await;
    for status in ["in_progress", "resolved"] {
        let response = app
            .patch_json(&format!("/issues/{}/update", id), &lecturer, &json!({ "status": status }))
            .await;
        assert_eq!(200, response.status().as_u16());
    }

    let list = notifications(&app, &student).await;
    let types: Vec<_> = list
        .notifications
        .iter()
        .map(|n| n.notification_type)
        .collect();
    // newest first
    assert_eq!(
        types,
        vec![
            NotificationType::IssueResolved,
            NotificationType::IssueUpdated,
            NotificationType::IssueUpdated,
        ]
    );
    assert!(list.notifications[0].message.contains("has been resolved"));
    assert_eq!(unread(&app, &student).await, 3);

    // only the assignment reached the lecturer; their own moves do not echo back
    let list = notifications(&app, &lecturer).await;
    assert_eq!(list.notifications.len(), 1);
}

#[tokio::test]
async fn registrar_status_changes_reach_the_assigned_lecturer() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, Some(lecturer.id)).await;

    app.patch_json(
        &format!("/issues/{}/update", id),
        &registrar,
        &json!({ "status": "closed" }),
    )
    .await;

    let list = notifications(&app, &lecturer).await;
    assert_eq!(list.notifications.len(), 2);
    assert!(list.notifications[0].message.contains("closed"));
}

#[tokio::test]
async fn notifications_can_be_read_and_removed() {
    let app = spawn_app().await;
    let student = app.student().await;
    let registrar = app.registrar().await;
    for _ in 0..3 {
        app.create_issue(&student, None).await;
    }
    let list = notifications(&app, &registrar).await;
    assert_eq!(list.unread_count, 3);
    let first = list.notifications[0].id;

    // mark one read
    let response = app
        .request(
            Method::POST,
            &format!("/notifications/{}/mark-read", first),
            Some(&registrar.token),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let notification: Notification = data(response).await;
    assert!(notification.is_read);
    assert_eq!(unread(&app, &registrar).await, 2);

    // delete one
    let response = app
        .delete(&format!("/notifications/{}/delete", first), &registrar)
        .await;
    assert_eq!(200, response.status().as_u16());
    assert_eq!(notifications(&app, &registrar).await.notifications.len(), 2);

    // mark all read
    let response = app
        .request(Method::POST, "/notifications/mark-all-read", Some(&registrar.token))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    assert_eq!(unread(&app, &registrar).await, 0);

    // clear
    let response = app.delete("/notifications/clear-all", &registrar).await;
    assert_eq!(200, response.status().as_u16());
    assert!(notifications(&app, &registrar).await.notifications.is_empty());
}

#[tokio::test]
async fn notifications_of_other_users_are_invisible() {
    let app = spawn_app().await;
    let student = app.student().await;
    let registrar = app.registrar().await;
    app.create_issue(&student, None).await;

    let theirs = notifications(&app, &registrar).await.notifications[0].id;

    let response = app
        .request(
            Method::POST,
            &format!("/notifications/{}/mark-read", theirs),
            Some(&student.token),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
    assert_eq!(error_message(response).await, "Notification not found");

    let response = app
        .delete(&format!("/notifications/{}/delete", theirs), &student)
        .await;
    assert_eq!(404, response.status().as_u16());

    assert_eq!(unread(&app, &registrar).await, 1);
}

#[tokio::test]
async fn notifications_require_authentication() {
    let app = spawn_app().await;

    let response = app
        .request(Method::GET, "/notifications", None)
        .send()
        .await
        .unwrap();

    assert_eq!(401, response.status().as_u16());
}
