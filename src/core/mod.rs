// Core matching exports
pub mod clock;
pub mod engine;
pub mod feed;
pub mod limits;
pub mod reconcile;

pub use clock::{day_window, Clock, FixedClock, SystemClock};
pub use engine::SwipeEngine;
pub use feed::FeedSelector;
pub use limits::{DailyLimit, Subscriptions};
pub use reconcile::{pair_lock_key, plan_swipe, MatchAction, MatchEvent, Swipe, SwipePlan};
