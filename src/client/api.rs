use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::client::error::{ClientError, FieldError};
use crate::client::router::{issue_list_for, Route};
use crate::client::session::{Session, SessionStore};
use crate::core::{AppErrorResponse, AppSuccessResponse};
use crate::models::dashboard::DashboardStats;
use crate::models::departments::Department;
use crate::models::issues::{
    AssignIssueRequest, CreateIssueRequest, Issue, IssueCategory, IssueFilter, IssuePriority,
    IssueStatus, UpdateIssueRequest, UpdateStatusRequest,
};
use crate::models::notifications::{Notification, NotificationList, UnreadCount};
use crate::models::users::{LoginRequest, LoginResponse, RegisterRequest, Role, UserProfile};

/// A file picked for upload with an issue.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The create-issue form as the student fills it in.
#[derive(Debug, Clone, Default)]
pub struct IssueDraft {
    pub title: String,
    pub category: Option<IssueCategory>,
    pub course_unit: String,
    pub year_of_study: Option<i64>,
    pub semester: Option<i64>,
    pub lecturer_id: Option<i64>,
    pub description: String,
    pub priority: Option<IssuePriority>,
    pub attachment: Option<AttachmentUpload>,
}

impl IssueDraft {
    /// Checks every required field and reports all that are missing at once.
    pub fn validate(&self) -> Result<CreateIssueRequest, ClientError> {
        let mut errors = Vec::new();

        if self.category.is_none() {
            errors.push(FieldError::new("category", "Please select a category"));
        }
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.course_unit.trim().is_empty() {
            errors.push(FieldError::new("course_unit", "Course unit is required"));
        }
        match self.year_of_study {
            None => errors.push(FieldError::new("year_of_study", "Please select a year of study")),
            Some(year) if !(1..=3).contains(&year) => errors.push(FieldError::new(
                "year_of_study",
                "Year of study must be between 1 and 3",
            )),
            Some(_) => {}
        }
        match self.semester {
            None => errors.push(FieldError::new("semester", "Please select a semester")),
            Some(semester) if !(1..=2).contains(&semester) => {
                errors.push(FieldError::new("semester", "Semester must be 1 or 2"))
            }
            Some(_) => {}
        }
        if self.lecturer_id.is_none() {
            errors.push(FieldError::new("lecturer", "Please select a lecturer"));
        }
        if self.description.trim().is_empty() {
            errors.push(FieldError::new("description", "Description is required"));
        }

        match (self.category, self.year_of_study, self.semester) {
            (Some(category), Some(year_of_study), Some(semester)) if errors.is_empty() => {
                Ok(CreateIssueRequest {
                    title: self.title.trim().to_string(),
                    category,
                    course_unit: self.course_unit.trim().to_string(),
                    year_of_study,
                    semester,
                    description: self.description.trim().to_string(),
                    priority: self.priority,
                    lecturer_id: self.lecturer_id,
                })
            }
            _ => Err(ClientError::Validation(errors)),
        }
    }
}

fn issue_form(request: &CreateIssueRequest, attachment: &AttachmentUpload) -> Form {
    let mut form = Form::new()
        .text("title", request.title.clone())
        .text("category", request.category.as_str())
        .text("course_unit", request.course_unit.clone())
        .text("year_of_study", request.year_of_study.to_string())
        .text("semester", request.semester.to_string())
        .text("description", request.description.clone());
    if let Some(priority) = request.priority {
        form = form.text("priority", priority.as_str());
    }
    if let Some(lecturer_id) = request.lecturer_id {
        form = form.text("lecturer_id", lecturer_id.to_string());
    }
    form.part("attachment", attachment_part(attachment))
}

fn update_form(request: &UpdateIssueRequest, attachment: &AttachmentUpload) -> Form {
    let mut form = Form::new();
    if let Some(title) = &request.title {
        form = form.text("title", title.clone());
    }
    if let Some(category) = request.category {
        form = form.text("category", category.as_str());
    }
    if let Some(course_unit) = &request.course_unit {
        form = form.text("course_unit", course_unit.clone());
    }
    if let Some(year_of_study) = request.year_of_study {
        form = form.text("year_of_study", year_of_study.to_string());
    }
    if let Some(semester) = request.semester {
        form = form.text("semester", semester.to_string());
    }
    if let Some(description) = &request.description {
        form = form.text("description", description.clone());
    }
    if let Some(priority) = request.priority {
        form = form.text("priority", priority.as_str());
    }
    form.part("attachment", attachment_part(attachment))
}

fn attachment_part(attachment: &AttachmentUpload) -> Part {
    Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone())
}

/// HTTP client for the AITs API. Attaches the session token to every call and
/// drops the session when the server answers 401 or 403.
#[derive(Debug, Clone)]
pub struct AitsClient {
    http: reqwest::Client,
    base_url: String,
    sessions: SessionStore,
}

impl AitsClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8000`.
    pub fn new(base_url: impl Into<String>, sessions: SessionStore) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn role(&self) -> Result<Role, ClientError> {
        self.sessions.role().ok_or(ClientError::NotAuthenticated)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        clear_on_auth_failure: bool,
    ) -> Result<AppSuccessResponse<T>, ClientError> {
        let request = match self.sessions.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!("Request failed without a response: {}", e);
            ClientError::NoResponse(e)
        })?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<AppSuccessResponse<T>>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }

        if clear_on_auth_failure
            && (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN)
        {
            self.sessions.clear();
            return Err(ClientError::Unauthorized);
        }

        let message = match response.json::<AppErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        Ok(self.execute(request, true).await?.data)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(request.json(body)).await
    }

    async fn start_session(&self, request: RequestBuilder) -> Result<Session, ClientError> {
        let login: LoginResponse = self.execute(request, false).await?.data;
        let session = Session::from(login);
        self.sessions.set(session.clone())?;
        Ok(session)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.start_session(self.http.post(self.url("/login")).json(&body))
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClientError> {
        self.start_session(self.http.post(self.url("/register")).json(request))
            .await
    }

    pub fn logout(&self) {
        self.sessions.clear();
    }

    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        self.send(self.http.get(self.url("/profile"))).await
    }

    fn issues_path(role: Role) -> &'static str {
        match role {
            Role::Student => "/student/issues",
            Role::Lecturer => "/lecturer/issues",
            Role::Registrar => "/registrar/issues",
        }
    }

    /// Issues visible to the logged-in role.
    pub async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, ClientError> {
        let path = Self::issues_path(self.role()?);
        self.send(self.http.get(self.url(path)).query(filter)).await
    }

    pub async fn get_issue(&self, issue_id: i64) -> Result<Issue, ClientError> {
        let path = format!("{}/{}", Self::issues_path(self.role()?), issue_id);
        match self.send(self.http.get(self.url(&path))).await {
            Err(ClientError::NotFound(_)) => Err(ClientError::NotFound("Issue not found".into())),
            other => other,
        }
    }

    /// Validates locally first; nothing is sent when a required field is missing.
    pub async fn create_issue(&self, draft: &IssueDraft) -> Result<Issue, ClientError> {
        let request = draft.validate()?;
        let builder = self.http.post(self.url("/student/issues"));

        match &draft.attachment {
            Some(attachment) => {
                self.send(builder.multipart(issue_form(&request, attachment)))
                    .await
            }
            None => self.send_json(builder, &request).await,
        }
    }

    pub async fn update_issue(
        &self,
        issue_id: i64,
        request: &UpdateIssueRequest,
        attachment: Option<&AttachmentUpload>,
    ) -> Result<Issue, ClientError> {
        let builder = self
            .http
            .patch(self.url(&format!("/student/issues/{}", issue_id)));

        match attachment {
            Some(attachment) => {
                self.send(builder.multipart(update_form(request, attachment)))
                    .await
            }
            None => self.send_json(builder, request).await,
        }
    }

    /// Changes the status, then re-reads the issue.
    pub async fn update_status(
        &self,
        issue_id: i64,
        status: IssueStatus,
    ) -> Result<Issue, ClientError> {
        let _: Issue = self
            .send_json(
                self.http
                    .patch(self.url(&format!("/issues/{}/update", issue_id))),
                &UpdateStatusRequest { status },
            )
            .await?;
        self.get_issue(issue_id).await
    }

    /// Assigns a lecturer, then re-reads the issue.
    pub async fn assign(&self, issue_id: i64, lecturer_id: i64) -> Result<Issue, ClientError> {
        let _: Issue = self
            .send_json(
                self.http
                    .patch(self.url(&format!("/issues/{}/assign", issue_id))),
                &AssignIssueRequest { lecturer_id },
            )
            .await?;
        self.get_issue(issue_id).await
    }

    /// Deletes once the user has confirmed. Returns the list route to go back to.
    pub async fn delete_issue(&self, issue_id: i64, confirmed: bool) -> Result<Route, ClientError> {
        if !confirmed {
            return Err(ClientError::ConfirmationRequired);
        }
        let role = self.role()?;
        let _: serde_json::Value = self
            .send(
                self.http
                    .delete(self.url(&format!("/issues/{}/delete", issue_id))),
            )
            .await?;
        Ok(issue_list_for(role))
    }

    pub async fn download_attachment(&self, issue_id: i64) -> Result<Vec<u8>, ClientError> {
        let mut request = self
            .http
            .get(self.url(&format!("/issues/{}/attachment", issue_id)));
        if let Some(token) = self.sessions.token() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(ClientError::NoResponse)?;
        match response.status() {
            status if status.is_success() => Ok(response
                .bytes()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()))?
                .to_vec()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.sessions.clear();
                Err(ClientError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound("Attachment not found".into())),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: "Failed to download attachment".into(),
            }),
        }
    }

    pub async fn notifications(&self) -> Result<NotificationList, ClientError> {
        self.send(self.http.get(self.url("/notifications"))).await
    }

    pub async fn unread_count(&self) -> Result<i64, ClientError> {
        let count: UnreadCount = self
            .send(self.http.get(self.url("/notifications/unread-count")))
            .await?;
        Ok(count.count)
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: i64,
    ) -> Result<Notification, ClientError> {
        self.send(
            self.http
                .post(self.url(&format!("/notifications/{}/mark-read", notification_id))),
        )
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .send(self.http.post(self.url("/notifications/mark-all-read")))
            .await?;
        Ok(())
    }

    pub async fn delete_notification(&self, notification_id: i64) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .send(
                self.http
                    .delete(self.url(&format!("/notifications/{}/delete", notification_id))),
            )
            .await?;
        Ok(())
    }

    pub async fn clear_notifications(&self) -> Result<(), ClientError> {
        let _: serde_json::Value = self
            .send(self.http.delete(self.url("/notifications/clear-all")))
            .await?;
        Ok(())
    }

    pub async fn lecturers(&self, department: Option<&str>) -> Result<Vec<UserProfile>, ClientError> {
        let mut request = self.http.get(self.url("/lecturers"));
        if let Some(department) = department {
            request = request.query(&[("department", department)]);
        }
        self.send(request).await
    }

    pub async fn students(&self) -> Result<Vec<UserProfile>, ClientError> {
        self.send(self.http.get(self.url("/students"))).await
    }

    pub async fn departments(&self) -> Result<Vec<Department>, ClientError> {
        self.send(self.http.get(self.url("/departments"))).await
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.send(self.http.get(self.url("/dashboard/stats"))).await
    }
}
