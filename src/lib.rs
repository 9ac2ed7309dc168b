//! Swipe Match - backend for a swipe-based dating app
//!
//! Accounts and profiles, a daily-limited random profile feed, premium
//! subscriptions and the match reconciliation state machine that turns
//! swipes into pending, accepted or rejected matches.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{plan_swipe, DailyLimit, FeedSelector, Swipe, SwipeEngine};
pub use error::AppError;
pub use models::{Match, MatchStatus, Profile, Reconciliation, SwipeOutcome, ViewerContext};
pub use services::{DatingStore, MemoryStore, PostgresStore, StoreError};
