use crate::helpers::{data, error_message, spawn_app, COMPUTER_SCIENCE, SOFTWARE_ENGINEERING};
use aits::models::departments::Department;
use aits::models::users::UserProfile;
use claims::{assert_none, assert_some_eq};
use serde_json::json;

#[tokio::test]
async fn registration_creates_departments_with_member_counts() {
    let app = spawn_app().await;
    let student = app.student().await;
    app.lecturer(COMPUTER_SCIENCE).await;
    app.lecturer(SOFTWARE_ENGINEERING).await;
    app.registrar().await;

    let departments: Vec<Department> = data(app.get("/departments", &student).await).await;
    assert_eq!(departments.len(), 2);

    let cs = departments
        .iter()
        .find(|d| d.name == COMPUTER_SCIENCE)
        .expect("Computer Science was not created");
    assert_eq!(cs.faculty, "College of Computing");
    assert_eq!(cs.staff_count, 1);
    assert_eq!(cs.student_count, 1);

    let se = departments
        .iter()
        .find(|d| d.name == SOFTWARE_ENGINEERING)
        .unwrap();
    assert_eq!(se.staff_count, 1);
    assert_eq!(se.student_count, 0);
}

#[tokio::test]
async fn departments_can_be_filtered_by_faculty() {
    let app = spawn_app().await;
    let registrar = app.registrar().await;

    let response = app
        .post_json(
            "/departments",
            Some(&registrar),
            &json!({ "name": "Department of History", "faculty": "College Of Humanity And Social Sciences" }),
        )
        .await;
    assert_eq!(201, response.status().as_u16());

    let departments: Vec<Department> = data(
        app.get(
            "/departments?faculty=College%20Of%20Humanity%20And%20Social%20Sciences",
            &registrar,
        )
        .await,
    )
    .await;
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].name, "Department of History");
}

#[tokio::test]
async fn only_registrars_manage_departments() {
    let app = spawn_app().await;
    let lecturer = app.lecturer(COMPUTER_SCIENCE).await;

    let response = app
        .post_json(
            "/departments",
            Some(&lecturer),
            &json!({ "name": "Department of Physics", "faculty": "College Of Engineering" }),
        )
        .await;

    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn department_names_are_unique() {
    let app = spawn_app().await;
    let registrar = app.registrar().await;

    let response = app
        .post_json(
            "/departments",
            Some(&registrar),
            &json!({ "name": COMPUTER_SCIENCE, "faculty": "College of Computing" }),
        )
        .await;

    assert_eq!(409, response.status().as_u16());
    assert_eq!(
        error_message(response).await,
        "A department with this name already exists"
    );
}

#[tokio::test]
async fn department_update_merges_fields() {
    let app = spawn_app().await;
    let registrar = app.registrar().await;
    let departments: Vec<Department> = data(app.get("/departments", &registrar).await).await;
    let id = departments[0].id;

    let response = app
        .patch_json(
            &format!("/departments/{}", id),
            &registrar,
            &json!({ "head_of_department": "Dr. Okello" }),
        )
        .await;
    assert_eq!(200, response.status().as_u16());

    let department: Department = data(response).await;
    assert_eq!(department.name, COMPUTER_SCIENCE);
    assert_some_eq!(department.head_of_department.as_deref(), "Dr. Okello");

    let response = app
        .patch_json("/departments/9999", &registrar, &json!({ "name": "Ghost" }))
        .await;
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn deleting_a_department_detaches_its_members() {
    let app = spawn_app().await;
    let registrar = app.registrar().await;
    let student = app.student().await;
    let departments: Vec<Department> = data(app.get("/departments", &registrar).await).await;

    let response = app
        .delete(&format!("/departments/{}", departments[0].id), &registrar)
        .await;
    assert_eq!(200, response.status().as_u16());

    let profile: UserProfile = data(app.get("/profile", &student).await).await;
    assert_none!(profile.department_id);
    assert_none!(profile.department);

    let departments: Vec<Department> = data(app.get("/departments", &registrar).await).await;
    assert!(departments.is_empty());
}
