//! Typed client for the AITs API: session handling, role routing, request
//! wrapper and notification polling.

pub mod api;
pub mod error;
pub mod notifications;
pub mod router;
pub mod session;

pub use api::{AitsClient, AttachmentUpload, IssueDraft};
pub use error::{ClientError, FieldError};
pub use notifications::{NotificationPoller, NotificationStore};
pub use router::{Route, Router};
pub use session::{Session, SessionStore};
