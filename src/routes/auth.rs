use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::routes::AppState;
use crate::services::{hash_password, verify_password, NewUser, ProfileStore, UserStore};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/auth/register", web::post().to(register))
        .route("/auth/login", web::post().to(login));
}

/// Register endpoint
///
/// POST /api/v1/auth/register
///
/// Creates the user and its empty profile together.
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    let req = req.into_inner();

    let password_hash = hash_password(&req.password)?;
    let (user, profile) = state
        .store
        .create_user(NewUser {
            name: req.name,
            email: req.email,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, profile_id = profile.id, "Registered user");

    Ok(HttpResponse::Created().json(RegisterResponse {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}

/// Login endpoint
///
/// POST /api/v1/auth/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .store
        .find_user_by_email(&req.email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let profile = state
        .store
        .find_profile_by_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let access_token = state.tokens.issue(&user, &profile)?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl_secs(),
    }))
}
