use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::reconcile::Swipe;
use crate::models::{DayWindow, FeedPick, Match, Profile, ProfilePatch, Reconciliation, Subscription, User};

/// Errors surfaced by every store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Unavailable(err),
        }
    }
}

/// Account fields needed to register a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the user and its empty profile atomically
    async fn create_user(&self, user: NewUser) -> Result<(User, Profile), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, profile_id: i64) -> Result<Option<Profile>, StoreError>;

    async fn find_profile_by_user(&self, user_id: i64) -> Result<Option<Profile>, StoreError>;

    async fn update_profile(&self, profile_id: i64, patch: &ProfilePatch) -> Result<Profile, StoreError>;
}

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Load both directions of the pair, plan the swipe and apply it as one atomic unit
    async fn reconcile_swipe(&self, swipe: Swipe, at: DateTime<Utc>) -> Result<Reconciliation, StoreError>;

    /// The live (non-rejected) row between two profiles in either direction
    async fn find_active_between(&self, a: i64, b: i64) -> Result<Option<Match>, StoreError>;

    /// Partner profiles of every accepted match involving `profile_id`
    async fn list_matched_profiles(&self, profile_id: i64) -> Result<Vec<Profile>, StoreError>;
}

#[async_trait]
pub trait ViewLogStore: Send + Sync {
    async fn count_views(&self, viewer_id: i64, window: DayWindow) -> Result<i64, StoreError>;

    /// Pick a random eligible profile and log the view before returning it
    ///
    /// Eligible: not the viewer, not viewed inside `window`, not accepted with
    /// the viewer, not liked by the viewer, not rejected by the viewer.
    ///
    /// With `quota = Some(n)` the views already logged inside `window` are
    /// counted in the same atomic unit as the pick; at `n` or more nothing is
    /// logged and `LimitReached` is returned. `None` means unlimited.
    async fn take_unseen_profile(
        &self,
        viewer_id: i64,
        window: DayWindow,
        at: DateTime<Utc>,
        quota: Option<u32>,
    ) -> Result<FeedPick, StoreError>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Row with the greatest `valid_until` for the user
    async fn latest_subscription(&self, user_id: i64) -> Result<Option<Subscription>, StoreError>;

    async fn create_subscription(
        &self,
        user_id: i64,
        valid_until: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Subscription, StoreError>;
}

/// Everything the service needs from a backing store
#[async_trait]
pub trait DatingStore: UserStore + ProfileStore + MatchStore + ViewLogStore + SubscriptionStore {
    async fn health_check(&self) -> Result<bool, StoreError>;
}
