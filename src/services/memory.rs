use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::Mutex;

use crate::core::reconcile::{plan_swipe, MatchAction, Swipe};
use crate::models::{DayWindow, FeedPick, Match, MatchStatus, Profile, ProfilePatch, Reconciliation, Subscription, SwipeOutcome, User, ViewLog};
use crate::services::store::{
    DatingStore, MatchStore, NewUser, ProfileStore, StoreError, SubscriptionStore, UserStore, ViewLogStore,
};

/// Process-local store
///
/// Every operation takes the single state lock for its whole duration, which
/// gives compound operations the same atomicity the PostgreSQL store gets
/// from its transactions.
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

struct MemoryState {
    users: Vec<User>,
    profiles: Vec<Profile>,
    matches: Vec<Match>,
    views: Vec<ViewLog>,
    subscriptions: Vec<Subscription>,
    next_id: i64,
    rng: StdRng,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn active_directed(&self, initiator_id: i64, target_id: i64) -> Option<&Match> {
        self.matches
            .iter()
            .rev()
            .find(|m| m.initiator_id == initiator_id && m.target_id == target_id && m.status.is_active())
    }

    fn active_between(&self, a: i64, b: i64) -> Option<&Match> {
        self.matches.iter().rev().find(|m| {
            m.status.is_active()
                && ((m.initiator_id == a && m.target_id == b) || (m.initiator_id == b && m.target_id == a))
        })
    }

    /// Profiles the feed must never offer `viewer_id` again
    fn excluded_by_matches(&self, viewer_id: i64, candidate_id: i64) -> bool {
        self.matches.iter().any(|m| match m.status {
            MatchStatus::Accepted => m.partner_of(viewer_id) == Some(candidate_id),
            MatchStatus::Pending => m.initiator_id == viewer_id && m.target_id == candidate_id,
            MatchStatus::Rejected => m.initiator_id == candidate_id && m.target_id == viewer_id,
        })
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic feed order, for tests
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                users: Vec::new(),
                profiles: Vec::new(),
                matches: Vec::new(),
                views: Vec::new(),
                subscriptions: Vec::new(),
                next_id: 0,
                rng,
            }),
        }
    }

    /// Every stored match row, oldest first
    pub async fn match_rows(&self) -> Vec<Match> {
        self.state.lock().await.matches.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<(User, Profile), StoreError> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict(format!("email {} is already registered", user.email)));
        }

        let now = Utc::now();
        let created = User {
            id: state.allocate_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        let profile = Profile {
            id: state.allocate_id(),
            user_id: created.id,
            description: String::new(),
            picture: String::new(),
        };

        state.users.push(created.clone());
        state.profiles.push(profile.clone());

        Ok((created, profile))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, profile_id: i64) -> Result<Option<Profile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.profiles.iter().find(|p| p.id == profile_id).cloned())
    }

    async fn find_profile_by_user(&self, user_id: i64) -> Result<Option<Profile>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn update_profile(&self, profile_id: i64, patch: &ProfilePatch) -> Result<Profile, StoreError> {
        let mut state = self.state.lock().await;
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {profile_id}")))?;

        patch.apply(profile);
        Ok(profile.clone())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn reconcile_swipe(&self, swipe: Swipe, at: DateTime<Utc>) -> Result<Reconciliation, StoreError> {
        if swipe.viewer_id == swipe.target_id {
            return Err(StoreError::InvalidInput("a profile cannot swipe on itself".to_string()));
        }

        let mut state = self.state.lock().await;

        let forward = state.active_directed(swipe.viewer_id, swipe.target_id).cloned();
        let reverse = state.active_directed(swipe.target_id, swipe.viewer_id).cloned();
        let plan = plan_swipe(&swipe, forward.as_ref(), reverse.as_ref());

        let record = match plan.action {
            MatchAction::None => match plan.outcome {
                SwipeOutcome::NoOp => None,
                _ => forward.or(reverse),
            },
            MatchAction::Insert { initiator_id, target_id } => {
                if state.active_between(initiator_id, target_id).is_some() {
                    return Err(StoreError::Conflict(format!(
                        "profiles {initiator_id} and {target_id} already have a live match"
                    )));
                }
                let inserted = Match {
                    id: state.allocate_id(),
                    initiator_id,
                    target_id,
                    status: MatchStatus::Pending,
                    created_at: at,
                    updated_at: at,
                };
                state.matches.push(inserted.clone());
                Some(inserted)
            }
            MatchAction::Transition { match_id, from, to } => {
                let row = state
                    .matches
                    .iter_mut()
                    .find(|m| m.id == match_id && m.status == from)
                    .ok_or_else(|| StoreError::Conflict(format!("match {match_id} is no longer {from:?}")))?;
                row.status = to;
                row.updated_at = at;
                Some(row.clone())
            }
        };

        Ok(Reconciliation { outcome: plan.outcome, record })
    }

    async fn find_active_between(&self, a: i64, b: i64) -> Result<Option<Match>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.active_between(a, b).cloned())
    }

    async fn list_matched_profiles(&self, profile_id: i64) -> Result<Vec<Profile>, StoreError> {
        let state = self.state.lock().await;

        let mut accepted: Vec<&Match> = state
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Accepted)
            .filter(|m| m.partner_of(profile_id).is_some())
            .collect();
        accepted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let profiles = accepted
            .into_iter()
            .filter_map(|m| m.partner_of(profile_id))
            .filter_map(|partner| state.profiles.iter().find(|p| p.id == partner).cloned())
            .collect();

        Ok(profiles)
    }
}

#[async_trait]
impl ViewLogStore for MemoryStore {
    async fn count_views(&self, viewer_id: i64, window: DayWindow) -> Result<i64, StoreError> {
        let state = self.state.lock().await;
        let count = state
            .views
            .iter()
            .filter(|v| v.viewer_id == viewer_id && window.contains(v.viewed_at))
            .count();
        Ok(count as i64)
    }

    async fn take_unseen_profile(
        &self,
        viewer_id: i64,
        window: DayWindow,
        at: DateTime<Utc>,
        quota: Option<u32>,
    ) -> Result<FeedPick, StoreError> {
        let mut state = self.state.lock().await;

        if let Some(limit) = quota {
            let viewed = state
                .views
                .iter()
                .filter(|v| v.viewer_id == viewer_id && window.contains(v.viewed_at))
                .count();
            if viewed >= limit as usize {
                return Ok(FeedPick::LimitReached);
            }
        }

        let candidates: Vec<Profile> = state
            .profiles
            .iter()
            .filter(|p| p.id != viewer_id)
            .filter(|p| {
                !state
                    .views
                    .iter()
                    .any(|v| v.viewer_id == viewer_id && v.profile_id == p.id && window.contains(v.viewed_at))
            })
            .filter(|p| !state.excluded_by_matches(viewer_id, p.id))
            .cloned()
            .collect();

        let picked = {
            let state = &mut *state;
            candidates.choose(&mut state.rng).cloned()
        };

        let Some(profile) = picked else {
            return Ok(FeedPick::Exhausted);
        };

        let id = state.allocate_id();
        state.views.push(ViewLog {
            id,
            viewer_id,
            profile_id: profile.id,
            viewed_at: at,
        });

        Ok(FeedPick::Served(profile))
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn latest_subscription(&self, user_id: i64) -> Result<Option<Subscription>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.valid_until)
            .cloned())
    }

    async fn create_subscription(
        &self,
        user_id: i64,
        valid_until: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Subscription, StoreError> {
        let mut state = self.state.lock().await;
        let subscription = Subscription {
            id: state.allocate_id(),
            user_id,
            valid_until,
            created_at: at,
            updated_at: at,
        };
        state.subscriptions.push(subscription.clone());
        Ok(subscription)
    }
}

#[async_trait]
impl DatingStore for MemoryStore {
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tokio_test::assert_ok;

    async fn seed_profiles(store: &MemoryStore, count: usize) -> Vec<Profile> {
        let mut profiles = Vec::new();
        for i in 0..count {
            let (_, profile) = store
                .create_user(NewUser {
                    name: format!("User {i}"),
                    email: format!("user{i}@example.com"),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            profiles.push(profile);
        }
        profiles
    }

    fn window_around(at: DateTime<Utc>) -> DayWindow {
        DayWindow {
            start: at - Duration::hours(1),
            end: at + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::with_seed(1);
        seed_profiles(&store, 1).await;

        let err = store
            .create_user(NewUser {
                name: "Again".to_string(),
                email: "USER0@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_feed_never_repeats_within_window() {
        let store = MemoryStore::with_seed(7);
        let profiles = seed_profiles(&store, 4).await;
        let viewer = profiles[0].id;
        let now = Utc::now();
        let window = window_around(now);

        let mut served = Vec::new();
        while let FeedPick::Served(profile) = assert_ok!(store.take_unseen_profile(viewer, window, now, None).await) {
            served.push(profile.id);
        }

        served.sort();
        let mut expected: Vec<i64> = profiles[1..].iter().map(|p| p.id).collect();
        expected.sort();
        assert_eq!(served, expected);
        assert_eq!(assert_ok!(store.count_views(viewer, window).await), 3);
    }

    #[tokio::test]
    async fn test_feed_skips_liked_and_matched_profiles() {
        let store = MemoryStore::with_seed(3);
        let profiles = seed_profiles(&store, 3).await;
        let (viewer, liked, other) = (profiles[0].id, profiles[1].id, profiles[2].id);
        let now = Utc::now();

        assert_ok!(
            store
                .reconcile_swipe(Swipe { viewer_id: viewer, target_id: liked, liked: true }, now)
                .await
        );

        let first = assert_ok!(store.take_unseen_profile(viewer, window_around(now), now, None).await);
        assert!(matches!(first, FeedPick::Served(p) if p.id == other));
        let second = assert_ok!(store.take_unseen_profile(viewer, window_around(now), now, None).await);
        assert_eq!(second, FeedPick::Exhausted);
    }

    #[tokio::test]
    async fn test_quota_is_checked_before_logging() {
        let store = MemoryStore::with_seed(5);
        let profiles = seed_profiles(&store, 5).await;
        let viewer = profiles[0].id;
        let now = Utc::now();
        let window = window_around(now);

        for _ in 0..2 {
            let pick = assert_ok!(store.take_unseen_profile(viewer, window, now, Some(2)).await);
            assert!(matches!(pick, FeedPick::Served(_)));
        }

        let pick = assert_ok!(store.take_unseen_profile(viewer, window, now, Some(2)).await);
        assert_eq!(pick, FeedPick::LimitReached);
        assert_eq!(assert_ok!(store.count_views(viewer, window).await), 2);

        // Unlimited viewers keep going
        let pick = assert_ok!(store.take_unseen_profile(viewer, window, now, None).await);
        assert!(matches!(pick, FeedPick::Served(_)));
    }

    #[tokio::test]
    async fn test_latest_subscription_wins() {
        let store = MemoryStore::with_seed(1);
        let now = Utc::now();

        assert_ok!(store.create_subscription(5, now + Duration::days(30), now).await);
        assert_ok!(store.create_subscription(5, now - Duration::days(1), now).await);

        let latest = assert_ok!(store.latest_subscription(5).await).unwrap();
        assert_eq!(latest.valid_until, now + Duration::days(30));
        assert!(assert_ok!(store.latest_subscription(6).await).is_none());
    }
}
