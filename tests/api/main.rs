mod auth;
mod dashboard;
mod departments;
mod health_check;
mod issues;
mod notifications;
