use std::sync::Arc;

use crate::core::clock::Clock;
use crate::core::reconcile::Swipe;
use crate::error::AppError;
use crate::models::{MatchStatus, Reconciliation, SwipeOutcome, ViewerContext};
use crate::services::{MatchStore, ProfileStore, StoreError};

/// Match reconciliation engine
///
/// Validates a swipe, hands it to the store for atomic reconciliation and
/// folds a lost insert race back into a regular outcome.
#[derive(Clone)]
pub struct SwipeEngine {
    profiles: Arc<dyn ProfileStore>,
    matches: Arc<dyn MatchStore>,
    clock: Arc<dyn Clock>,
}

impl SwipeEngine {
    pub fn new(profiles: Arc<dyn ProfileStore>, matches: Arc<dyn MatchStore>, clock: Arc<dyn Clock>) -> Self {
        Self { profiles, matches, clock }
    }

    /// Process a like (`liked = true`) or pass from the viewer on `target_profile_id`
    ///
    /// # Errors
    /// * `BadRequest` when the viewer swipes on their own profile
    /// * `NotFound` when either profile does not exist
    /// * `Storage` when the store fails; nothing is retried
    pub async fn process_swipe(
        &self,
        ctx: &ViewerContext,
        target_profile_id: i64,
        liked: bool,
    ) -> Result<Reconciliation, AppError> {
        if ctx.profile_id == target_profile_id {
            return Err(AppError::BadRequest("A profile cannot swipe on itself".to_string()));
        }

        if self.profiles.find_profile(ctx.profile_id).await?.is_none() {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }
        if self.profiles.find_profile(target_profile_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Profile {target_profile_id} not found")));
        }

        let swipe = Swipe {
            viewer_id: ctx.profile_id,
            target_id: target_profile_id,
            liked,
        };

        let result = match self.matches.reconcile_swipe(swipe, self.clock.now_utc()).await {
            Ok(result) => result,
            Err(StoreError::Conflict(reason)) => {
                tracing::warn!(
                    viewer_id = swipe.viewer_id,
                    target_id = swipe.target_id,
                    %reason,
                    "Swipe lost a race on the match pair"
                );
                self.resolve_conflict(swipe).await?
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(
            viewer_id = swipe.viewer_id,
            target_id = swipe.target_id,
            liked,
            outcome = ?result.outcome,
            "Processed swipe"
        );

        Ok(result)
    }

    /// Report whatever relationship won the race
    async fn resolve_conflict(&self, swipe: Swipe) -> Result<Reconciliation, AppError> {
        // A pass that lost its pending row has nothing left to reject
        if !swipe.liked {
            return Ok(Reconciliation {
                outcome: SwipeOutcome::NoOp,
                record: None,
            });
        }

        let live = self
            .matches
            .find_active_between(swipe.viewer_id, swipe.target_id)
            .await?;

        let outcome = match &live {
            Some(m) if m.status == MatchStatus::Accepted => SwipeOutcome::AlreadyMatched,
            _ => SwipeOutcome::AlreadyPending,
        };

        Ok(Reconciliation { outcome, record: live })
    }
}
