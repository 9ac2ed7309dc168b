use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::AppError;
use crate::models::{MeResponse, MessageResponse, ProfilePatch, SubscribeResponse, UpdateProfileRequest, ViewerContext};
use crate::routes::AppState;
use crate::services::{ProfileStore, UserStore};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/me", web::get().to(me))
        .route("/me", web::put().to(update_profile))
        .route("/subscribe", web::post().to(subscribe));
}

/// GET /api/v1/me
async fn me(state: web::Data<AppState>, ctx: ViewerContext) -> Result<HttpResponse, AppError> {
    let user = state
        .store
        .find_user_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let profile = state
        .store
        .find_profile_by_user(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let subscription = state.subscriptions.latest(ctx.user_id).await?;
    let is_premium = state.subscriptions.is_active(ctx.user_id).await?;

    Ok(HttpResponse::Ok().json(MeResponse {
        user,
        profile,
        subscription,
        is_premium,
    }))
}

/// PUT /api/v1/me
///
/// Only the caller's own profile can be updated; absent fields are kept.
async fn update_profile(
    state: web::Data<AppState>,
    ctx: ViewerContext,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;
    let req = req.into_inner();

    let patch = ProfilePatch {
        description: req.description,
        picture: req.picture,
    };
    if patch.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let profile = state
        .store
        .find_profile_by_user(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    state.store.update_profile(profile.id, &patch).await?;

    tracing::info!(profile_id = profile.id, "Profile updated");

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Profile updated".to_string(),
    }))
}

/// POST /api/v1/subscribe
async fn subscribe(state: web::Data<AppState>, ctx: ViewerContext) -> Result<HttpResponse, AppError> {
    let subscription = state.subscriptions.purchase(ctx.user_id).await?;

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        message: format!(
            "Successfully purchased premium valid until {}",
            subscription.valid_until.to_rfc3339()
        ),
        valid_until: subscription.valid_until,
    }))
}
