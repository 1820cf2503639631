use crate::client::error::ClientError;
use crate::client::session::{Session, SessionStore};
use crate::models::issues::{Issue, IssueStatus};
use crate::models::users::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Login,
    Signup,
    Dashboard,
    AddIssue,
    IssueDetail(i64),
    EditIssue(i64),
    LecturerDashboard,
    LecturerIssues,
    LecturerStudents,
    LecturerIssueDetail(i64),
    RegistrarDashboard,
    RegistrarIssues,
    RegistrarStudents,
    RegistrarLecturers,
    Departments,
    RegistrarIssueDetail(i64),
    Notifications,
    Profile,
    Settings,
}

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

const STUDENT: &[Role] = &[Role::Student];
const LECTURER: &[Role] = &[Role::Lecturer];
const REGISTRAR: &[Role] = &[Role::Registrar];

impl Route {
    pub fn access(&self) -> Access {
        match self {
            Route::Landing | Route::Login | Route::Signup => Access::Public,
            Route::Dashboard | Route::AddIssue | Route::IssueDetail(_) | Route::EditIssue(_) => {
                Access::Roles(STUDENT)
            }
            Route::LecturerDashboard
            | Route::LecturerIssues
            | Route::LecturerStudents
            | Route::LecturerIssueDetail(_) => Access::Roles(LECTURER),
            Route::RegistrarDashboard
            | Route::RegistrarIssues
            | Route::RegistrarStudents
            | Route::RegistrarLecturers
            | Route::Departments
            | Route::RegistrarIssueDetail(_) => Access::Roles(REGISTRAR),
            Route::Notifications | Route::Profile | Route::Settings => Access::Authenticated,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".into(),
            Route::Login => "/login".into(),
            Route::Signup => "/signup".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::AddIssue => "/add-issue".into(),
            Route::IssueDetail(id) => format!("/issue/{}", id),
            Route::EditIssue(id) => format!("/issue/{}/edit", id),
            Route::LecturerDashboard => "/lecturer-dashboard".into(),
            Route::LecturerIssues => "/lecturer-issues".into(),
            Route::LecturerStudents => "/lecturer-students".into(),
            Route::LecturerIssueDetail(id) => format!("/lecturer/issue/{}", id),
            Route::RegistrarDashboard => "/registrar-dashboard".into(),
            Route::RegistrarIssues => "/registrar-issues".into(),
            Route::RegistrarStudents => "/registrar-students".into(),
            Route::RegistrarLecturers => "/registrar-lecturers".into(),
            Route::Departments => "/departments".into(),
            Route::RegistrarIssueDetail(id) => format!("/registrar/issue/{}", id),
            Route::Notifications => "/notifications".into(),
            Route::Profile => "/profile".into(),
            Route::Settings => "/settings".into(),
        }
    }

    pub fn allows(&self, session: Option<&Session>) -> bool {
        match (self.access(), session) {
            (Access::Public, _) => true,
            (_, None) => false,
            (Access::Authenticated, Some(_)) => true,
            (Access::Roles(roles), Some(session)) => roles.contains(&session.role()),
        }
    }
}

pub fn home_for(role: Role) -> Route {
    match role {
        Role::Student => Route::Dashboard,
        Role::Lecturer => Route::LecturerDashboard,
        Role::Registrar => Route::RegistrarDashboard,
    }
}

/// Detail view of an issue as seen by `role`.
pub fn issue_route(role: Role, issue_id: i64) -> Route {
    match role {
        Role::Student => Route::IssueDetail(issue_id),
        Role::Lecturer => Route::LecturerIssueDetail(issue_id),
        Role::Registrar => Route::RegistrarIssueDetail(issue_id),
    }
}

/// Where a role lands after deleting an issue.
pub fn issue_list_for(role: Role) -> Route {
    match role {
        Role::Student => Route::Dashboard,
        Role::Lecturer => Route::LecturerIssues,
        Role::Registrar => Route::RegistrarIssues,
    }
}

/// Target when the session may not open `target`: login when logged out, else the role's home.
pub fn resolve(session: Option<&Session>, target: Route) -> Route {
    if target.allows(session) {
        return target;
    }
    match session {
        None => Route::Login,
        Some(session) => home_for(session.role()),
    }
}

/// Only the owning student gets the edit form, and only while the issue is open.
pub fn guard_edit(session: Option<&Session>, issue: &Issue) -> Result<Route, ClientError> {
    let session = session.ok_or(ClientError::NotAuthenticated)?;
    if session.role() != Role::Student || session.user.id != issue.student_id {
        return Err(ClientError::Forbidden(
            "You are not authorized to edit this issue".into(),
        ));
    }
    if issue.status != IssueStatus::Open {
        return Err(ClientError::Forbidden(
            "Only open issues can be edited".into(),
        ));
    }
    Ok(Route::EditIssue(issue.id))
}

/// Navigation state over a shared session.
#[derive(Debug, Clone)]
pub struct Router {
    sessions: SessionStore,
    current: Route,
}

impl Router {
    /// Starts at the role's home, or at login when nothing is stored.
    pub fn new(sessions: SessionStore) -> Self {
        let current = match sessions.role() {
            Some(role) => home_for(role),
            None => Route::Login,
        };
        Self { sessions, current }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn navigate(&mut self, target: Route) -> Route {
        let session = self.sessions.current();
        self.current = resolve(session.as_ref(), target);
        self.current
    }

    pub fn open_edit(&mut self, issue: &Issue) -> Result<Route, ClientError> {
        let route = guard_edit(self.sessions.current().as_ref(), issue)?;
        self.current = route;
        Ok(route)
    }
}
