pub mod access;
pub mod config;
pub mod issue_events;
pub mod jwt_auth;
mod responses;
mod telemetry;

pub use self::config::AppConfig;
pub use responses::*;
pub use telemetry::*;
