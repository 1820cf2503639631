use crate::core::config::{AttachmentConfig, JwtAuthConfig};
use crate::core::{AppConfig, AppError};
use crate::db;
use crate::routes::aits_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{dev::Server, web, web::Data, App, HttpServer};
use sqlx::SqlitePool;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct AitsWebServer {
    port: u16,
    server: Server,
}

impl AitsWebServer {
    /// Connects the pool, applies migrations and binds the listener. Port 0 picks a free port.
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );

        let pool = db::connect(&configuration.database)?;
        db::migrate(&pool).await?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, pool, configuration).await?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub async fn run(
    listener: TcpListener,
    pool: SqlitePool,
    configuration: AppConfig,
) -> Result<Server, anyhow::Error> {
    let pool = Data::new(pool);
    let jwt_config: Data<JwtAuthConfig> = Data::new(configuration.jwt_auth_config.clone());
    let attachments: Data<AttachmentConfig> = Data::new(configuration.attachments.clone());

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::bad_request(format!("Invalid JSON: {}", err)).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::bad_request(format!("Invalid query: {}", err)).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                AppError::not_found(format!("Invalid path: {}", err)).into()
            }))
            .configure(aits_routes)
            .app_data(pool.clone())
            .app_data(jwt_config.clone())
            .app_data(attachments.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
