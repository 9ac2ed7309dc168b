use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use std::time::Duration;

use crate::core::reconcile::{pair_lock_key, plan_swipe, MatchAction, Swipe};
use crate::models::{DayWindow, FeedPick, Match, MatchStatus, Profile, ProfilePatch, Reconciliation, Subscription, SwipeOutcome, User};
use crate::services::store::{
    DatingStore, MatchStore, NewUser, ProfileStore, StoreError, SubscriptionStore, UserStore, ViewLogStore,
};

const MATCH_COLUMNS: &str = "id, initiator_id, target_id, status, created_at, updated_at";

const COUNT_VIEWS: &str = "SELECT COUNT(*) FROM profile_view_logs \
     WHERE viewer_id = $1 AND viewed_at >= $2 AND viewed_at < $3";

/// PostgreSQL-backed store
///
/// Compound operations (swipe reconciliation, feed selection) run inside a
/// single transaction guarded by a transaction-scoped advisory lock, and the
/// partial unique index on live match pairs backstops the one-relationship
/// invariant.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect, then run embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;

        Ok(store)
    }

    /// Create a store from the optional settings values
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!(max_connections = ?max_connections, "Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations in `migrations/`
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

async fn fetch_active_directed(
    conn: &mut PgConnection,
    initiator_id: i64,
    target_id: i64,
) -> Result<Option<Match>, StoreError> {
    let query = format!(
        "SELECT {MATCH_COLUMNS} FROM matches \
         WHERE initiator_id = $1 AND target_id = $2 AND status <> 'rejected' \
         ORDER BY id DESC LIMIT 1"
    );

    let record = sqlx::query_as::<_, Match>(&query)
        .bind(initiator_id)
        .bind(target_id)
        .fetch_optional(conn)
        .await?;

    Ok(record)
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<(User, Profile), StoreError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict(format!("email {} is already registered", user.email)),
            other => other,
        })?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            RETURNING id, user_id, description, picture
            "#,
        )
        .bind(created.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(user_id = created.id, profile_id = profile.id, "Created user and profile");

        Ok((created, profile))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn find_profile(&self, profile_id: i64) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, description, picture FROM profiles WHERE id = $1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn find_profile_by_user(&self, user_id: i64) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, description, picture FROM profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn update_profile(&self, profile_id: i64, patch: &ProfilePatch) -> Result<Profile, StoreError> {
        let query = r#"
            UPDATE profiles
            SET description = COALESCE($2, description),
                picture = COALESCE($3, picture)
            WHERE id = $1
            RETURNING id, user_id, description, picture
        "#;

        sqlx::query_as::<_, Profile>(query)
            .bind(profile_id)
            .bind(patch.description.as_deref())
            .bind(patch.picture.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile {profile_id}")))
    }
}

#[async_trait]
impl MatchStore for PostgresStore {
    async fn reconcile_swipe(&self, swipe: Swipe, at: DateTime<Utc>) -> Result<Reconciliation, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Serializes both directions of the pair until commit
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(pair_lock_key(swipe.viewer_id, swipe.target_id))
            .execute(&mut *tx)
            .await?;

        let forward = fetch_active_directed(&mut *tx, swipe.viewer_id, swipe.target_id).await?;
        let reverse = fetch_active_directed(&mut *tx, swipe.target_id, swipe.viewer_id).await?;

        let plan = plan_swipe(&swipe, forward.as_ref(), reverse.as_ref());

        let record = match plan.action {
            MatchAction::None => match plan.outcome {
                SwipeOutcome::NoOp => None,
                _ => forward.or(reverse),
            },
            MatchAction::Insert { initiator_id, target_id } => {
                let query = format!(
                    "INSERT INTO matches (initiator_id, target_id, status, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $4) RETURNING {MATCH_COLUMNS}"
                );
                let inserted = sqlx::query_as::<_, Match>(&query)
                    .bind(initiator_id)
                    .bind(target_id)
                    .bind(MatchStatus::Pending)
                    .bind(at)
                    .fetch_one(&mut *tx)
                    .await?;
                Some(inserted)
            }
            MatchAction::Transition { match_id, from, to } => {
                let query = format!(
                    "UPDATE matches SET status = $2, updated_at = $3 \
                     WHERE id = $1 AND status = $4 RETURNING {MATCH_COLUMNS}"
                );
                let updated = sqlx::query_as::<_, Match>(&query)
                    .bind(match_id)
                    .bind(to)
                    .bind(at)
                    .bind(from)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or_else(|| StoreError::Conflict(format!("match {match_id} is no longer {from:?}")))?;
                Some(updated)
            }
        };

        tx.commit().await?;

        tracing::debug!(
            viewer_id = swipe.viewer_id,
            target_id = swipe.target_id,
            outcome = ?plan.outcome,
            "Reconciled swipe"
        );

        Ok(Reconciliation { outcome: plan.outcome, record })
    }

    async fn find_active_between(&self, a: i64, b: i64) -> Result<Option<Match>, StoreError> {
        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM matches \
             WHERE ((initiator_id = $1 AND target_id = $2) OR (initiator_id = $2 AND target_id = $1)) \
               AND status <> 'rejected' \
             ORDER BY id DESC LIMIT 1"
        );

        let record = sqlx::query_as::<_, Match>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list_matched_profiles(&self, profile_id: i64) -> Result<Vec<Profile>, StoreError> {
        let query = r#"
            SELECT p.id, p.user_id, p.description, p.picture
            FROM matches m
            JOIN profiles p
              ON p.id = CASE WHEN m.initiator_id = $1 THEN m.target_id ELSE m.initiator_id END
            WHERE (m.initiator_id = $1 OR m.target_id = $1)
              AND m.status = 'accepted'
            ORDER BY m.updated_at DESC
        "#;

        let profiles = sqlx::query_as::<_, Profile>(query)
            .bind(profile_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(profile_id, count = profiles.len(), "Loaded matched profiles");

        Ok(profiles)
    }
}

#[async_trait]
impl ViewLogStore for PostgresStore {
    async fn count_views(&self, viewer_id: i64, window: DayWindow) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(COUNT_VIEWS)
            .bind(viewer_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn take_unseen_profile(
        &self,
        viewer_id: i64,
        window: DayWindow,
        at: DateTime<Utc>,
        quota: Option<u32>,
    ) -> Result<FeedPick, StoreError> {
        let mut tx = self.pool.begin().await?;

        // One feed fetch per viewer at a time: the quota count, the pick and
        // the view log all happen under this lock.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended('feed:' || $1::text, 0))")
            .bind(viewer_id)
            .execute(&mut *tx)
            .await?;

        if let Some(limit) = quota {
            let viewed = sqlx::query_scalar::<_, i64>(COUNT_VIEWS)
                .bind(viewer_id)
                .bind(window.start)
                .bind(window.end)
                .fetch_one(&mut *tx)
                .await?;

            if viewed >= i64::from(limit) {
                tx.commit().await?;
                tracing::debug!(viewer_id, viewed, limit, "Daily view quota used up");
                return Ok(FeedPick::LimitReached);
            }
        }

        let query = r#"
            SELECT p.id, p.user_id, p.description, p.picture
            FROM profiles p
            WHERE p.id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM profile_view_logs v
                  WHERE v.viewer_id = $1 AND v.profile_id = p.id
                    AND v.viewed_at >= $2 AND v.viewed_at < $3
              )
              AND NOT EXISTS (
                  SELECT 1 FROM matches m
                  WHERE (m.status = 'accepted'
                         AND ((m.initiator_id = $1 AND m.target_id = p.id)
                              OR (m.initiator_id = p.id AND m.target_id = $1)))
                     OR (m.status = 'pending' AND m.initiator_id = $1 AND m.target_id = p.id)
                     OR (m.status = 'rejected' AND m.initiator_id = p.id AND m.target_id = $1)
              )
            ORDER BY RANDOM()
            LIMIT 1
        "#;

        let picked = sqlx::query_as::<_, Profile>(query)
            .bind(viewer_id)
            .bind(window.start)
            .bind(window.end)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(profile) = picked else {
            tx.commit().await?;
            return Ok(FeedPick::Exhausted);
        };

        sqlx::query("INSERT INTO profile_view_logs (viewer_id, profile_id, viewed_at) VALUES ($1, $2, $3)")
            .bind(viewer_id)
            .bind(profile.id)
            .bind(at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(FeedPick::Served(profile))
    }
}

#[async_trait]
impl SubscriptionStore for PostgresStore {
    async fn latest_subscription(&self, user_id: i64) -> Result<Option<Subscription>, StoreError> {
        let query = r#"
            SELECT id, user_id, valid_until, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY valid_until DESC
            LIMIT 1
        "#;

        let subscription = sqlx::query_as::<_, Subscription>(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subscription)
    }

    async fn create_subscription(
        &self,
        user_id: i64,
        valid_until: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Subscription, StoreError> {
        let query = r#"
            INSERT INTO subscriptions (user_id, valid_until, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, user_id, valid_until, created_at, updated_at
        "#;

        let subscription = sqlx::query_as::<_, Subscription>(query)
            .bind(user_id)
            .bind(valid_until)
            .bind(at)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(user_id, valid_until = %subscription.valid_until, "Created subscription");

        Ok(subscription)
    }
}

#[async_trait]
impl DatingStore for PostgresStore {
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
