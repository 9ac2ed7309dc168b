// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{DayWindow, FeedPick, Match, MatchStatus, Profile, ProfilePatch, Reconciliation, Subscription, SwipeOutcome, User, ViewLog, ViewerContext};
pub use requests::{LoginRequest, RegisterRequest, SwipeRequest, UpdateProfileRequest};
pub use responses::{ErrorResponse, HealthResponse, LoginResponse, MatchListResponse, MeResponse, MessageResponse, RegisterResponse, SubscribeResponse, SwipeResponse};
