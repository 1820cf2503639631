use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;
use auth::{get_profile, login, register};
use dashboard::dashboard_stats;
use departments::{create_department, delete_department, list_departments, update_department};
use issues::{
    assign_issue, create_issue, delete_issue, download_attachment, get_lecturer_issue,
    get_registrar_issue, get_student_issue, list_lecturer_issues, list_registrar_issues,
    list_student_issues, update_issue, update_issue_status,
};
use notifications::{
    clear_all, delete_notification, get_unread_count, list_notifications, mark_all_read,
    mark_read,
};
use users::{delete_lecturer, list_lecturers, list_students, update_lecturer};
mod auth;
mod dashboard;
mod departments;
mod health_check;
mod issue_payload;
mod issues;
mod notifications;
mod users;

use crate::routes::health_check::*;

fn util_routes() -> Scope {
    scope("")
        .service(health_check)
        .service(register)
        .service(login)
        .service(get_profile)
}

fn student_routes() -> Scope {
    scope("student")
        .service(list_student_issues)
        .service(create_issue)
        .service(get_student_issue)
        .service(update_issue)
}

fn lecturer_routes() -> Scope {
    scope("lecturer")
        .service(list_lecturer_issues)
        .service(get_lecturer_issue)
}

fn registrar_routes() -> Scope {
    scope("registrar")
        .service(list_registrar_issues)
        .service(get_registrar_issue)
}

fn issues_routes() -> Scope {
    scope("issues")
        .service(update_issue_status)
        .service(assign_issue)
        .service(delete_issue)
        .service(download_attachment)
}

fn notifications_routes() -> Scope {
    scope("notifications")
        .service(list_notifications)
        .service(get_unread_count)
        .service(mark_all_read)
        .service(clear_all)
        .service(mark_read)
        .service(delete_notification)
}

fn lecturers_routes() -> Scope {
    scope("lecturers")
        .service(list_lecturers)
        .service(update_lecturer)
        .service(delete_lecturer)
}

fn students_routes() -> Scope {
    scope("students").service(list_students)
}

fn departments_routes() -> Scope {
    scope("departments")
        .service(list_departments)
        .service(create_department)
        .service(update_department)
        .service(delete_department)
}

fn dashboard_routes() -> Scope {
    scope("dashboard").service(dashboard_stats)
}

pub fn aits_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(student_routes())
            .service(lecturer_routes())
            .service(registrar_routes())
            .service(issues_routes())
            .service(notifications_routes())
            .service(lecturers_routes())
            .service(students_routes())
            .service(departments_routes())
            .service(dashboard_routes())
            .service(util_routes()),
    );
}
