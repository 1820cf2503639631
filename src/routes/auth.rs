use actix_web::{get, post, web, HttpResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::core::config::JwtAuthConfig;
use crate::core::jwt_auth::{generate_jwt_token, AuthUser};
use crate::core::{AppError, AppSuccessResponse};
use crate::db::users;
use crate::models::users::{LoginRequest, LoginResponse, RegisterRequest, UserProfile};

fn issue_token(config: &JwtAuthConfig, user: UserProfile) -> Result<LoginResponse, AppError> {
    let (token, expires_at) = generate_jwt_token(config, &user)?;
    Ok(LoginResponse {
        token,
        user,
        expires_at,
    })
}

#[tracing::instrument(name = "Register User", skip(pool, jwt_config, request), fields(email = %request.email, role = %request.role))]
#[post("register")]
pub async fn register(
    pool: web::Data<SqlitePool>,
    jwt_config: web::Data<JwtAuthConfig>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let profile = request.role_profile().map_err(|error| match &error.message {
        Some(message) => AppError::bad_request(format!("{}: {}", error.code, message)),
        None => AppError::bad_request(format!("{}: invalid value", error.code)),
    })?;

    if users::email_exists(&pool, &request.email).await? {
        return Err(AppError::conflict("A user with this email already exists"));
    }
    if users::username_exists(&pool, &request.username).await? {
        return Err(AppError::conflict("This username is already taken"));
    }

    let user = users::create_user(&pool, &request, &profile).await?;
    tracing::info!(user_id = user.id, "user registered");

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        issue_token(&jwt_config, user)?,
        "Registration successful",
    )))
}

#[tracing::instrument(name = "Login", skip(pool, jwt_config, request), fields(login = %request.username))]
#[post("login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    jwt_config: web::Data<JwtAuthConfig>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate()?;

    let invalid = || AppError::unauthorized("Invalid credentials");

    let row = users::find_user_for_login(&pool, &request.username)
        .await?
        .ok_or_else(invalid)?;
    if !users::verify_password(&request.password, &row.password)? {
        return Err(invalid());
    }

    let user = UserProfile::try_from(row).map_err(AppError::internal_error)?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        issue_token(&jwt_config, user)?,
        "Login successful",
    )))
}

#[tracing::instrument(name = "Get Profile", skip(pool, user), fields(user_id = user.user_id))]
#[get("profile")]
pub async fn get_profile(
    pool: web::Data<SqlitePool>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let profile = users::get_user_by_id(&pool, user.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        profile,
        "Profile retrieved successfully",
    )))
}
