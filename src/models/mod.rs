pub mod common;
pub mod dashboard;
pub mod departments;
pub mod issues;
pub mod notifications;
pub mod pagination;
pub mod users;
