use crate::models::{Match, MatchStatus, SwipeOutcome};

/// Events that move a match row between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// The target liked the initiator back
    Accept,
    /// The target passed on the initiator
    Reject,
}

impl MatchStatus {
    /// Transition table for match rows
    ///
    /// | from     | event  | to       |
    /// |----------|--------|----------|
    /// | Pending  | Accept | Accepted |
    /// | Pending  | Reject | Rejected |
    ///
    /// Every other combination is illegal and yields `None`.
    pub fn transition(self, event: MatchEvent) -> Option<MatchStatus> {
        match (self, event) {
            (MatchStatus::Pending, MatchEvent::Accept) => Some(MatchStatus::Accepted),
            (MatchStatus::Pending, MatchEvent::Reject) => Some(MatchStatus::Rejected),
            _ => None,
        }
    }
}

/// One swipe from `viewer_id` on `target_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swipe {
    pub viewer_id: i64,
    pub target_id: i64,
    pub liked: bool,
}

/// Storage mutation required to realise a swipe outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchAction {
    None,
    Insert { initiator_id: i64, target_id: i64 },
    Transition { match_id: i64, from: MatchStatus, to: MatchStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipePlan {
    pub outcome: SwipeOutcome,
    pub action: MatchAction,
}

impl SwipePlan {
    fn unchanged(outcome: SwipeOutcome) -> Self {
        Self { outcome, action: MatchAction::None }
    }
}

/// Decide the outcome of a swipe from the live rows between the pair
///
/// `forward` is the live row initiated by the viewer, `reverse` the live row
/// initiated by the target. Rejected rows passed in are ignored. The caller
/// must load both rows and apply the returned action under one lock on the
/// pair, otherwise two concurrent likes can both plan an insert.
pub fn plan_swipe(swipe: &Swipe, forward: Option<&Match>, reverse: Option<&Match>) -> SwipePlan {
    let forward = forward.filter(|m| m.status.is_active());
    let reverse = reverse.filter(|m| m.status.is_active());

    if !swipe.liked {
        return match reverse {
            Some(pending) => transition(pending, MatchEvent::Reject, SwipeOutcome::Rejected)
                .unwrap_or_else(|| SwipePlan::unchanged(SwipeOutcome::NoOp)),
            None => SwipePlan::unchanged(SwipeOutcome::NoOp),
        };
    }

    if let Some(existing) = forward {
        return SwipePlan::unchanged(match existing.status {
            MatchStatus::Accepted => SwipeOutcome::AlreadyMatched,
            _ => SwipeOutcome::AlreadyPending,
        });
    }

    if let Some(theirs) = reverse {
        return transition(theirs, MatchEvent::Accept, SwipeOutcome::MatchCreated)
            .unwrap_or_else(|| SwipePlan::unchanged(SwipeOutcome::AlreadyMatched));
    }

    SwipePlan {
        outcome: SwipeOutcome::MatchPending,
        action: MatchAction::Insert {
            initiator_id: swipe.viewer_id,
            target_id: swipe.target_id,
        },
    }
}

fn transition(record: &Match, event: MatchEvent, outcome: SwipeOutcome) -> Option<SwipePlan> {
    let to = record.status.transition(event)?;
    Some(SwipePlan {
        outcome,
        action: MatchAction::Transition {
            match_id: record.id,
            from: record.status,
            to,
        },
    })
}

/// Advisory-lock key shared by both directions of a profile pair
pub fn pair_lock_key(a: i64, b: i64) -> i64 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    (low << 32) ^ high
}
