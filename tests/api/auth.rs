use crate::helpers::{
    data, error_message, lecturer_body, registrar_body, spawn_app, student_body, COMPUTER_SCIENCE,
};
use aits::models::users::{LoginResponse, Role, UserProfile};
use claims::{assert_none, assert_some_eq};
use reqwest::Method;
use serde_json::json;

#[tokio::test]
async fn register_returns_a_session_for_each_role() {
    let app = spawn_app().await;

    for (body, role) in [
        (student_body(), Role::Student),
        (lecturer_body(COMPUTER_SCIENCE), Role::Lecturer),
        (registrar_body(), Role::Registrar),
    ] {
        let response = app.register(&body).await;
        assert_eq!(201, response.status().as_u16());

        let session: LoginResponse = data(response).await;
        assert!(!session.token.is_empty());
        assert_eq!(session.user.role, role);
        assert_some_eq!(session.user.department.as_deref(), COMPUTER_SCIENCE);
    }
}

#[tokio::test]
async fn student_registration_keeps_academic_details() {
    let app = spawn_app().await;

    let session: LoginResponse = data(app.register(&student_body()).await).await;

    assert_some_eq!(session.user.course.as_deref(), "Computer Science");
    assert_some_eq!(session.user.year_of_study.as_deref(), "Second Year");
    assert_some_eq!(session.user.college.as_deref(), "College of Computing");
}

#[tokio::test]
async fn register_returns_400_for_invalid_payloads() {
    let app = spawn_app().await;

    let mut missing_details = student_body();
    missing_details["student_data"] = serde_json::Value::Null;

    let mut bad_email = student_body();
    bad_email["email"] = json!("not-an-email");

    let mut mismatched = lecturer_body(COMPUTER_SCIENCE);
    mismatched["confirm_password"] = json!("something-else");

    let unknown_department = lecturer_body("Department of Alchemy");

    let mut unknown_role = student_body();
    unknown_role["role"] = json!("dean");

    let test_cases = vec![
        (missing_details, "student_data"),
        (bad_email, "email"),
        (mismatched, "confirm_password"),
        (unknown_department, "department"),
        (unknown_role, "Invalid JSON"),
    ];

    for (body, expected) in test_cases {
        let response = app.register(&body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not reject a payload about {}",
            expected
        );
        let message = error_message(response).await;
        assert!(
            message.contains(expected),
            "`{}` does not mention {}",
            message,
            expected
        );
    }
}

#[tokio::test]
async fn duplicate_email_or_username_is_a_conflict() {
    let app = spawn_app().await;
    let first = student_body();
    assert_eq!(201, app.register(&first).await.status().as_u16());

    let mut same_email = student_body();
    same_email["email"] = first["email"].clone();
    let response = app.register(&same_email).await;
    assert_eq!(409, response.status().as_u16());
    assert_eq!(
        error_message(response).await,
        "A user with this email already exists"
    );

    let mut same_username = student_body();
    same_username["username"] = first["username"].clone();
    let response = app.register(&same_username).await;
    assert_eq!(409, response.status().as_u16());
}

#[tokio::test]
async fn login_accepts_username_or_email() {
    let app = spawn_app().await;
    let body = student_body();
    app.register(&body).await;

    for login in [&body["username"], &body["email"]] {
        let response = app
            .post_json(
                "/login",
                None,
                &json!({ "username": login, "password": body["password"] }),
            )
            .await;
        assert_eq!(200, response.status().as_u16());

        let session: LoginResponse = data(response).await;
        assert_eq!(session.user.username, body["username"].as_str().unwrap());
    }
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = spawn_app().await;
    let student = app.student().await;

    let response = app
        .post_json(
            "/login",
            None,
            &json!({ "username": student.username, "password": "wrong-password" }),
        )
        .await;

    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_message(response).await, "Invalid credentials");

    let response = app
        .post_json(
            "/login",
            None,
            &json!({ "username": "nobody-here", "password": "whatever" }),
        )
        .await;
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn profile_requires_a_valid_token() {
    let app = spawn_app().await;

    let response = app
        .request(Method::GET, "/profile", None)
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    let response = app
        .request(Method::GET, "/profile", Some("not.a.token"))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
}

#[tokio::test]
async fn profile_returns_the_caller() {
    let app = spawn_app().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;

    let response = app.get("/profile", &lecturer).await;
    assert_eq!(200, response.status().as_u16());

    let profile: UserProfile = data(response).await;
    assert_eq!(profile.id, lecturer.id);
    assert_eq!(profile.role, Role::Lecturer);
    assert_none!(profile.course);
}

#[tokio::test]
async fn staff_registrations_get_their_own_ids_and_no_student_details() {
    let app = spawn_app().await;

    let first: LoginResponse = data(app.register(&lecturer_body(COMPUTER_SCIENCE)).await).await;
    let second: LoginResponse = data(app.register(&registrar_body()).await).await;

    assert!(first.user.id > 0);
    assert_ne!(first.user.id, second.user.id);
    assert_eq!(first.user.department_id, second.user.department_id);
    assert_none!(first.user.college);
    assert_none!(first.user.course);
    assert_none!(first.user.year_of_study);
}
