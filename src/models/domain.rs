use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public dating profile, one per user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub picture: String,
}

/// Partial profile update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub description: Option<String>,
    pub picture: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.picture.is_none()
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(description) = &self.description {
            profile.description = description.clone();
        }
        if let Some(picture) = &self.picture {
            profile.picture = picture.clone();
        }
    }
}

/// Lifecycle state of a directional match row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
}

impl MatchStatus {
    /// Rejected rows are history; everything else is a live relationship
    pub fn is_active(self) -> bool {
        !matches!(self, MatchStatus::Rejected)
    }
}

/// Directional match row: `initiator_id` swiped right on `target_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: i64,
    pub initiator_id: i64,
    pub target_id: i64,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// The other side of the match as seen from `profile_id`
    pub fn partner_of(&self, profile_id: i64) -> Option<i64> {
        if self.initiator_id == profile_id {
            Some(self.target_id)
        } else if self.target_id == profile_id {
            Some(self.initiator_id)
        } else {
            None
        }
    }
}

/// A single feed impression
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ViewLog {
    pub id: i64,
    pub viewer_id: i64,
    pub profile_id: i64,
    pub viewed_at: DateTime<Utc>,
}

/// Premium subscription validity window
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until > now
    }
}

/// Identity of the caller, resolved from the bearer token upstream of every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
    pub user_id: i64,
    pub profile_id: i64,
    pub name: String,
    pub email: String,
}

/// Result of reconciling one swipe against the stored match rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// Left swipe with nothing pending from the other side
    NoOp,
    /// Left swipe declined the other side's pending like
    Rejected,
    /// Viewer already liked the target and is still waiting
    AlreadyPending,
    /// The pair is already mutually matched
    AlreadyMatched,
    /// Mutual like: the target's pending row was accepted
    MatchCreated,
    /// One-sided like recorded, awaiting reciprocation
    MatchPending,
}

impl SwipeOutcome {
    /// Outcomes that report a repeated action rather than a state change
    pub fn is_conflict(self) -> bool {
        matches!(self, SwipeOutcome::AlreadyPending | SwipeOutcome::AlreadyMatched)
    }
}

/// Swipe outcome with the match row it produced or found, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub outcome: SwipeOutcome,
    #[serde(rename = "match")]
    pub record: Option<Match>,
}

/// Result of one feed fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPick {
    /// Profile served and logged as viewed
    Served(Profile),
    /// Nothing eligible is left today
    Exhausted,
    /// The viewer used today's quota before this fetch
    LimitReached,
}

/// Half-open `[start, end)` interval covering one server-local calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}
