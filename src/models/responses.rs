use serde::{Deserialize, Serialize};
use crate::models::domain::{Match, Profile, Subscription, SwipeOutcome, User};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Freshly registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// The caller's account with its profile and latest subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub profile: Profile,
    pub subscription: Option<Subscription>,
    pub is_premium: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub message: String,
    pub valid_until: chrono::DateTime<chrono::Utc>,
}

/// Swipe result plus the next candidate when the daily limit allows one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub outcome: SwipeOutcome,
    #[serde(rename = "match")]
    pub record: Option<Match>,
    pub next_profile: Option<Profile>,
    pub daily_limit_reached: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchListResponse {
    pub matches: Vec<Profile>,
    pub total: usize,
}
