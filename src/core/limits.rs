use chrono::{DateTime, Months, Utc};
use std::sync::Arc;

use crate::core::clock::Clock;
use crate::error::AppError;
use crate::models::{Subscription, ViewerContext};
use crate::services::{SubscriptionStore, ViewLogStore};

/// Premium subscription policy
#[derive(Clone)]
pub struct Subscriptions {
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
    period_months: u32,
}

impl Subscriptions {
    pub fn new(store: Arc<dyn SubscriptionStore>, clock: Arc<dyn Clock>, period_months: u32) -> Self {
        Self { store, clock, period_months }
    }

    pub async fn latest(&self, user_id: i64) -> Result<Option<Subscription>, AppError> {
        Ok(self.store.latest_subscription(user_id).await?)
    }

    /// Whether the user's latest subscription is still valid now
    pub async fn is_active(&self, user_id: i64) -> Result<bool, AppError> {
        let now = self.clock.now_utc();
        Ok(self
            .latest(user_id)
            .await?
            .is_some_and(|s| s.is_active_at(now)))
    }

    /// Start a new subscription period; refused while one is still active
    pub async fn purchase(&self, user_id: i64) -> Result<Subscription, AppError> {
        if self.is_active(user_id).await? {
            return Err(AppError::BadRequest("You already have an active subscription".to_string()));
        }

        let now = self.clock.now_utc();
        let valid_until = period_end(now, self.period_months)?;
        let subscription = self.store.create_subscription(user_id, valid_until, now).await?;

        tracing::info!(user_id, valid_until = %subscription.valid_until, "Premium purchased");

        Ok(subscription)
    }
}

fn period_end(from: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, AppError> {
    from.checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::Internal(format!("subscription end overflows for {months} months")))
}

/// Daily feed quota for non-premium viewers
#[derive(Clone)]
pub struct DailyLimit {
    subscriptions: Subscriptions,
    views: Arc<dyn ViewLogStore>,
    clock: Arc<dyn Clock>,
    daily_view_limit: u32,
}

impl DailyLimit {
    pub fn new(
        subscriptions: Subscriptions,
        views: Arc<dyn ViewLogStore>,
        clock: Arc<dyn Clock>,
        daily_view_limit: u32,
    ) -> Self {
        Self {
            subscriptions,
            views,
            clock,
            daily_view_limit,
        }
    }

    /// Daily cap for this viewer: `None` for premium, otherwise the configured
    /// limit. The store counts against it atomically with the feed pick.
    pub async fn quota_for(&self, ctx: &ViewerContext) -> Result<Option<u32>, AppError> {
        if self.subscriptions.is_active(ctx.user_id).await? {
            return Ok(None);
        }
        Ok(Some(self.daily_view_limit))
    }

    /// Premium viewers are unlimited; everyone else gets `daily_view_limit`
    /// fresh profiles per server-local calendar day.
    pub async fn has_remaining_views(&self, ctx: &ViewerContext) -> Result<bool, AppError> {
        let Some(limit) = self.quota_for(ctx).await? else {
            return Ok(true);
        };

        let viewed = self.views.count_views(ctx.profile_id, self.clock.today()).await?;

        tracing::debug!(profile_id = ctx.profile_id, viewed, limit, "Checked daily view quota");

        Ok(viewed < i64::from(limit))
    }
}
