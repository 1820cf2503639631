pub mod aits_web_server;
pub mod client;
pub mod core;
pub mod db;
pub mod models;
pub mod routes;
