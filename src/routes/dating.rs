use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::AppError;
use crate::models::{FeedPick, MatchListResponse, SwipeOutcome, SwipeRequest, SwipeResponse, ViewerContext};
use crate::routes::AppState;
use crate::services::MatchStore;

/// Configure feed, swipe and match routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/profiles/next", web::get().to(next_profile))
        .route("/swipe", web::post().to(swipe))
        .route("/matches", web::get().to(match_list));
}

/// Next profile endpoint
///
/// GET /api/v1/profiles/next
///
/// 403 once a non-premium viewer has used today's quota, 404 when no
/// unseen profile is left.
async fn next_profile(state: web::Data<AppState>, ctx: ViewerContext) -> Result<HttpResponse, AppError> {
    let profile = state.feed.next_profile(&ctx).await?;

    Ok(HttpResponse::Ok().json(profile))
}

/// Swipe endpoint
///
/// POST /api/v1/swipe
///
/// Request body:
/// ```json
/// {
///   "profile_id": 42,
///   "swipe": true
/// }
/// ```
///
/// The swipe is always processed; the next profile is attached only while
/// the daily quota allows it.
async fn swipe(
    state: web::Data<AppState>,
    ctx: ViewerContext,
    req: web::Json<SwipeRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let result = state.swipes.process_swipe(&ctx, req.profile_id, req.swipe).await?;

    if result.outcome.is_conflict() {
        let message = match result.outcome {
            SwipeOutcome::AlreadyMatched => "Already matched",
            _ => "Already swiped",
        };
        return Err(AppError::Conflict(message.to_string()));
    }

    let (next_profile, daily_limit_reached) = match state.feed.pick(&ctx).await? {
        FeedPick::Served(profile) => (Some(profile), false),
        FeedPick::Exhausted => (None, false),
        FeedPick::LimitReached => (None, true),
    };

    Ok(HttpResponse::Ok().json(SwipeResponse {
        outcome: result.outcome,
        record: result.record,
        next_profile,
        daily_limit_reached,
    }))
}

/// GET /api/v1/matches
async fn match_list(state: web::Data<AppState>, ctx: ViewerContext) -> Result<HttpResponse, AppError> {
    let matches = state.store.list_matched_profiles(ctx.profile_id).await?;

    Ok(HttpResponse::Ok().json(MatchListResponse {
        total: matches.len(),
        matches,
    }))
}
