use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create an account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Request to exchange credentials for an access token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub picture: Option<String>,
}

/// A like (`swipe: true`) or pass (`swipe: false`) on another profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(range(min = 1))]
    pub profile_id: i64,
    pub swipe: bool,
}
