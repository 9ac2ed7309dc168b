use std::sync::Arc;

use crate::core::clock::Clock;
use crate::core::limits::DailyLimit;
use crate::error::AppError;
use crate::models::{FeedPick, Profile, ViewerContext};
use crate::services::ViewLogStore;

/// Picks the next profile to show a viewer
///
/// The daily quota check, the selection and the view log happen in one
/// store operation, so concurrent fetches cannot overrun the limit and the
/// view is recorded before the profile is handed back.
#[derive(Clone)]
pub struct FeedSelector {
    views: Arc<dyn ViewLogStore>,
    limits: DailyLimit,
    clock: Arc<dyn Clock>,
}

impl FeedSelector {
    pub fn new(views: Arc<dyn ViewLogStore>, limits: DailyLimit, clock: Arc<dyn Clock>) -> Self {
        Self { views, limits, clock }
    }

    /// # Errors
    /// * `Forbidden` once a non-premium viewer has used today's quota
    /// * `NotFound` when no eligible profile is left today
    pub async fn next_profile(&self, ctx: &ViewerContext) -> Result<Profile, AppError> {
        match self.pick(ctx).await? {
            FeedPick::Served(profile) => Ok(profile),
            FeedPick::LimitReached => Err(AppError::Forbidden("Daily limit reached".to_string())),
            FeedPick::Exhausted => Err(AppError::NotFound("No more profiles to show today".to_string())),
        }
    }

    pub async fn pick(&self, ctx: &ViewerContext) -> Result<FeedPick, AppError> {
        let quota = self.limits.quota_for(ctx).await?;
        let picked = self
            .views
            .take_unseen_profile(ctx.profile_id, self.clock.today(), self.clock.now_utc(), quota)
            .await?;

        match &picked {
            FeedPick::Served(profile) => {
                tracing::debug!(viewer_id = ctx.profile_id, profile_id = profile.id, "Served profile")
            }
            FeedPick::Exhausted => tracing::info!(viewer_id = ctx.profile_id, "Feed exhausted for today"),
            FeedPick::LimitReached => tracing::info!(viewer_id = ctx.profile_id, ?quota, "Daily limit reached"),
        }

        Ok(picked)
    }
}
