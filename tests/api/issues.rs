use crate::helpers::{
    data, error_message, issue_body, spawn_app, TestApp, TestUser, COMPUTER_SCIENCE,
};
use aits::models::issues::{Issue, IssuePriority, IssueStatus};
use aits::models::notifications::NotificationList;
use aits::models::pagination::PaginationMeta;
use claims::{assert_none, assert_some_eq};
use reqwest::multipart;
use reqwest::Method;
use serde_json::{json, Value};

async fn fetch(app: &TestApp, prefix: &str, user: &TestUser, id: i64) -> Issue {
    let response = app.get(&format!("/{}/issues/{}", prefix, id), user).await;
    assert_eq!(200, response.status().as_u16());
    data(response).await
}

async fn set_status(
    app: &TestApp,
    user: &TestUser,
    id: i64,
    status: &str,
) -> reqwest::Response {
    app.patch_json(&format!("/issues/{}/update", id), user, &json!({ "status": status }))
        .await
}

#[tokio::test]
async fn student_creates_an_open_issue_with_default_priority() {
    let app = spawn_app().await;
    let student = app.student().await;

    let response = app
        .post_json("/student/issues", Some(&student), &issue_body())
        .await;
    assert_eq!(201, response.status().as_u16());

    let issue: Issue = data(response).await;
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.priority, IssuePriority::High);
    assert_eq!(issue.student_id, student.id);
    assert_some_eq!(issue.department.as_deref(), COMPUTER_SCIENCE);
    assert_none!(issue.assigned_to);
    assert_none!(issue.attachment);
}

#[tokio::test]
async fn explicit_priority_wins_over_the_category_default() {
    let app = spawn_app().await;
    let student = app.student().await;

    let mut body = issue_body();
    body["category"] = json!("administrative");
    let issue: Issue = data(app.post_json("/student/issues", Some(&student), &body).await).await;
    assert_eq!(issue.priority, IssuePriority::Low);

    body["priority"] = json!("medium");
    let issue: Issue = data(app.post_json("/student/issues", Some(&student), &body).await).await;
    assert_eq!(issue.priority, IssuePriority::Medium);
}

#[tokio::test]
async fn create_issue_returns_400_for_invalid_data() {
    let app = spawn_app().await;
    let student = app.student().await;
    let other_student = app.student().await;

    let mut blank_title = issue_body();
    blank_title["title"] = json!("   ");
    let mut bad_year = issue_body();
    bad_year["year_of_study"] = json!(5);
    let mut bad_category = issue_body();
    bad_category["category"] = json!("gossip");
    let mut not_a_lecturer = issue_body();
    not_a_lecturer["lecturer_id"] = json!(other_student.id);
    let mut blank_course_unit = issue_body();
    blank_course_unit["course_unit"] = json!("   ");
    let mut blank_description = issue_body();
    blank_description["description"] = json!(" \n ");

    let test_cases = vec![
        (blank_title, "title"),
        (blank_course_unit, "course_unit"),
        (blank_description, "description"),
        (bad_year, "year_of_study"),
        (bad_category, "Invalid JSON"),
        (not_a_lecturer, "lecturer_id"),
    ];

    for (body, expected) in test_cases {
        let response = app.post_json("/student/issues", Some(&student), &body).await;
        assert_eq!(400, response.status().as_u16(), "accepted a bad {}", expected);
        let message = error_message(response).await;
        assert!(message.contains(expected), "`{}` lacks {}", message, expected);
    }

    let issues: Vec<Issue> = data(app.get("/student/issues", &student).await).await;
    assert!(issues.is_empty());
}

#[tokio::test]
async fn only_students_create_issues() {
    let app = spawn_app().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;

    let response = app
        .post_json("/student/issues", Some(&lecturer), &issue_body())
        .await;
    assert_eq!(403, response.status().as_u16());

    let response = app
        .request(Method::POST, "/student/issues", None)
        .json(&issue_body())
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn students_only_see_their_own_issues() {
    let app = spawn_app().await;
    let alice = app.student().await;
    let bob = app.student().await;

    let alices_issue = app.create_issue(&alice, None).await;
    app.create_issue(&bob, None).await;

    let issues: Vec<Issue> = data(app.get("/student/issues", &alice).await).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, alices_issue);

    let response = app.get(&format!("/student/issues/{}", alices_issue), &bob).await;
    assert_eq!(403, response.status().as_u16());

    let response = app.get("/student/issues/9999", &alice).await;
    assert_eq!(404, response.status().as_u16());
    assert_eq!(error_message(response).await, "Issue not found");
}

#[tokio::test]
async fn role_views_reject_other_roles() {
    let app = spawn_app().await;
    let student = app.student().await;

    for path in ["/lecturer/issues", "/registrar/issues"] {
        let response = app.get(path, &student).await;
        assert_eq!(403, response.status().as_u16(), "{} was not guarded", path);
    }
}

#[tokio::test]
async fn lecturers_only_see_assigned_issues() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let other_lecturer = app.lecturer(COMPUTER_SCIENCE).await;

    let assigned = app.create_issue(&student, Some(lecturer.id)).await;
    app.create_issue(&student, None).await;

    let issues: Vec<Issue> = data(app.get("/lecturer/issues", &lecturer).await).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, assigned);
    assert_some_eq!(issues[0].assigned_to, lecturer.id);

    let issues: Vec<Issue> = data(app.get("/lecturer/issues", &other_lecturer).await).await;
    assert!(issues.is_empty());

    let response = app
        .get(&format!("/lecturer/issues/{}", assigned), &other_lecturer)
        .await;
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn registrar_list_is_paginated_and_filterable() {
    let app = spawn_app().await;
    let student = app.student().await;
    let registrar = app.registrar().await;

    for _ in 0..3 {
        app.create_issue(&student, None).await;
    }
    let mut body = issue_body();
    body["title"] = json!("Transcript printing fee");
    body["category"] = json!("administrative");
    app.post_json("/student/issues", Some(&student), &body).await;

    let response = app.get("/registrar/issues?page=2&per_page=3", &registrar).await;
    assert_eq!(200, response.status().as_u16());
    let envelope: Value = response.json().await.unwrap();
    let pagination: PaginationMeta = serde_json::from_value(envelope["pagination"].clone()).unwrap();
    assert_eq!(pagination.total_items, 4);
    assert_eq!(pagination.total_pages, 2);
    assert_eq!(envelope["data"].as_array().unwrap().len(), 1);

    let issues: Vec<Issue> =
        data(app.get("/registrar/issues?category=administrative", &registrar).await).await;
    assert_eq!(issues.len(), 1);

    let issues: Vec<Issue> =
        data(app.get("/registrar/issues?search=transcript", &registrar).await).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].title, "Transcript printing fee");

    let issues: Vec<Issue> =
        data(app.get("/registrar/issues?status=resolved", &registrar).await).await;
    assert!(issues.is_empty());
}

#[tokio::test]
async fn issue_moves_through_its_lifecycle() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, None).await;

    // Arrange: registrar assigns
    let response = app
        .patch_json(
            &format!("/issues/{}/assign", id),
            &registrar,
            &json!({ "lecturer_id": lecturer.id }),
        )
        .await;
    assert_eq!(200, response.status().as_u16());
    let issue: Issue = data(response).await;
    assert_some_eq!(issue.assigned_to, lecturer.id);

    // Act: lecturer works it
    assert_eq!(200, set_status(&app, &lecturer, id, "in_progress").await.status().as_u16());
    assert_eq!(200, set_status(&app, &lecturer, id, "resolved").await.status().as_u16());

    // Assert
    let issue = fetch(&app, "student", &student, id).await;
    assert_eq!(issue.status, IssueStatus::Resolved);

    let response = set_status(&app, &lecturer, id, "closed").await;
    assert_eq!(400, response.status().as_u16());

    assert_eq!(200, set_status(&app, &registrar, id, "closed").await.status().as_u16());
    let issue = fetch(&app, "registrar", &registrar, id).await;
    assert_eq!(issue.status, IssueStatus::Closed);
}

#[tokio::test]
async fn invalid_status_changes_are_rejected() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, Some(lecturer.id)).await;

    let response = set_status(&app, &student, id, "in_progress").await;
    assert_eq!(403, response.status().as_u16());

    let response = set_status(&app, &registrar, id, "resolved").await;
    assert_eq!(400, response.status().as_u16());

    let response = set_status(&app, &registrar, id, "open").await;
    assert_eq!(400, response.status().as_u16());
    assert_eq!(error_message(response).await, "Issue is already open");

    let response = set_status(&app, &registrar, id, "pending").await;
    assert_eq!(400, response.status().as_u16());

    let response = set_status(&app, &registrar, 9999, "closed").await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn competing_status_changes_from_open_apply_only_once() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, Some(lecturer.id)).await;

    let (start, close) = tokio::join!(
        set_status(&app, &lecturer, id, "in_progress"),
        set_status(&app, &registrar, id, "closed"),
    );
    let statuses = [start.status().as_u16(), close.status().as_u16()];

    // the loser either lost the race at write time (409) or saw the new state (400)
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1, "{:?}", statuses);
    assert!(statuses.iter().any(|s| *s == 409 || *s == 400), "{:?}", statuses);

    let issue = fetch(&app, "registrar", &registrar, id).await;
    let expected = if statuses[0] == 200 {
        IssueStatus::InProgress
    } else {
        IssueStatus::Closed
    };
    assert_eq!(issue.status, expected);
}

#[tokio::test]
async fn only_registrars_assign_and_only_to_lecturers() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, None).await;
    let path = format!("/issues/{}/assign", id);

    let response = app
        .patch_json(&path, &lecturer, &json!({ "lecturer_id": lecturer.id }))
        .await;
    assert_eq!(403, response.status().as_u16());
    assert_eq!(
        error_message(response).await,
        "Only registrars can assign issues"
    );

    let response = app
        .patch_json(&path, &registrar, &json!({ "lecturer_id": student.id }))
        .await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn students_edit_only_while_the_issue_is_open() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let id = app.create_issue(&student, Some(lecturer.id)).await;
    let path = format!("/student/issues/{}", id);

    let response = app
        .patch_json(&path, &student, &json!({ "title": "Exam mark missing", "semester": 2 }))
        .await;
    assert_eq!(200, response.status().as_u16());
    let issue: Issue = data(response).await;
    assert_eq!(issue.title, "Exam mark missing");
    assert_eq!(issue.semester, 2);
    assert_eq!(issue.course_unit, "CSC2100");

    let response = app.patch_json(&path, &student, &json!({})).await;
    assert_eq!(400, response.status().as_u16());
    assert_eq!(error_message(response).await, "No changes were provided");

    let response = app
        .patch_json(&path, &student, &json!({ "description": "   " }))
        .await;
    assert_eq!(400, response.status().as_u16());
    assert!(error_message(response).await.contains("description"));

    set_status(&app, &lecturer, id, "in_progress").await;
    let response = app
        .patch_json(&path, &student, &json!({ "title": "Too late" }))
        .await;
    assert_eq!(403, response.status().as_u16());
    assert_eq!(
        error_message(response).await,
        "Only open issues can be edited"
    );
}

#[tokio::test]
async fn deleting_an_issue_keeps_notifications_but_unlinks_them() {
    let app = spawn_app().await;
    let student = app.student().await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, None).await;

    let response = app.delete(&format!("/issues/{}/delete", id), &student).await;
    assert_eq!(200, response.status().as_u16());

    let issues: Vec<Issue> = data(app.get("/student/issues", &student).await).await;
    assert!(issues.is_empty());

    let response = app.get(&format!("/registrar/issues/{}", id), &registrar).await;
    assert_eq!(404, response.status().as_u16());

    let list: NotificationList = data(app.get("/notifications", &registrar).await).await;
    assert_eq!(list.notifications.len(), 1);
    assert_none!(list.notifications[0].issue_id);
}

#[tokio::test]
async fn started_issues_can_only_be_deleted_by_registrars() {
    let app = spawn_app().await;
    let student = app.student().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;
    let registrar = app.registrar().await;
    let id = app.create_issue(&student, Some(lecturer.id)).await;
    set_status(&app, &lecturer, id, "in_progress").await;

    let path = format!("/issues/{}/delete", id);
    assert_eq!(403, app.delete(&path, &student).await.status().as_u16());
    assert_eq!(403, app.delete(&path, &lecturer).await.status().as_u16());
    assert_eq!(200, app.delete(&path, &registrar).await.status().as_u16());
}

#[tokio::test]
async fn multipart_issue_keeps_its_attachment() {
    let app = spawn_app().await;
    let student = app.student().await;
    let registrar = app.registrar().await;
    let contents = b"%PDF-1.4 results slip".to_vec();

    let mut form = multipart::Form::new();
    for (name, value) in issue_body().as_object().unwrap() {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        form = form.text(name.clone(), value);
    }
    form = form.part(
        "attachment",
        multipart::Part::bytes(contents.clone()).file_name("results slip.pdf"),
    );

    let response = app
        .request(Method::POST, "/student/issues", Some(&student.token))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(201, response.status().as_u16());
    let issue: Issue = data(response).await;
    assert_some_eq!(issue.attachment.as_deref(), "results slip.pdf");
    assert_eq!(issue.year_of_study, 2);

    let response = app
        .get(&format!("/issues/{}/attachment", issue.id), &registrar)
        .await;
    assert_eq!(200, response.status().as_u16());
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert_eq!(response.bytes().await.unwrap().to_vec(), contents);

    let other = app.student().await;
    let response = app
        .get(&format!("/issues/{}/attachment", issue.id), &other)
        .await;
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn oversized_attachments_are_rejected() {
    let app = spawn_app().await;
    let student = app.student().await;

    let form = multipart::Form::new()
        .text("title", "Huge upload")
        .text("category", "technical")
        .text("course_unit", "CSC1100")
        .text("year_of_study", "1")
        .text("semester", "1")
        .text("description", "Attaching a very large file")
        .part(
            "attachment",
            multipart::Part::bytes(vec![0u8; 1024 * 1024 + 1]).file_name("big.bin"),
        );

    let response = app
        .request(Method::POST, "/student/issues", Some(&student.token))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    let issues: Vec<Issue> = data(app.get("/student/issues", &student).await).await;
    assert!(issues.is_empty());
}
