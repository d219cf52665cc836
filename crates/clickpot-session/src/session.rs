//! Per-match session state machine.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  start   ┌─────────┐  finish   ┌───────┐
//!   │ WAITING ├─────────▶│ RUNNING ├──────────▶│ ENDED │
//!   └─────────┘          └─────────┘           └───────┘
//! ```
//!
//! `finish` is idempotent: the second caller (a countdown tick racing a
//! disconnect) gets `None` and must not settle again. After ENDED the
//! session accepts no further events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clickpot_types::{BetRecord, ConnectionId, IdentityId, RoomId};

/// The lifecycle state of a match session.
///
/// Transitions are **monotonic**: `Waiting → Running → Ended`, each taken
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Room formed, countdown not yet started.
    Waiting,
    /// Clicks are being counted.
    Running,
    /// Settled and about to be discarded. Terminal.
    Ended,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "WAITING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Ended => write!(f, "ENDED"),
        }
    }
}

/// One participant's live state inside a session.
#[derive(Debug, Clone)]
pub struct ParticipantState {
    /// The connection this participant plays on.
    pub connection: ConnectionId,
    /// Accepted clicks so far.
    pub clicks: u32,
}

/// Final scores, sorted by clicks descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// `None` on a strict tie with no forfeit.
    pub winner: Option<IdentityId>,
    /// `(identity, clicks)` sorted by clicks descending.
    pub scores: Vec<(IdentityId, u32)>,
}

/// The live instance of one match between two paired participants.
pub struct MatchSession {
    id: RoomId,
    status: SessionStatus,
    participants: BTreeMap<IdentityId, ParticipantState>,
    started_at: Option<DateTime<Utc>>,
    duration_ms: u64,
    bet: BetRecord,
}

impl MatchSession {
    /// Create a session in WAITING state around an attached bet.
    #[must_use]
    pub fn new(
        id: RoomId,
        bet: BetRecord,
        duration_ms: u64,
        participants: &[(IdentityId, ConnectionId)],
    ) -> Self {
        let participants = participants
            .iter()
            .map(|&(identity_id, connection)| {
                (
                    identity_id,
                    ParticipantState {
                        connection,
                        clicks: 0,
                    },
                )
            })
            .collect();
        Self {
            id,
            status: SessionStatus::Waiting,
            participants,
            started_at: None,
            duration_ms,
            bet,
        }
    }

    #[must_use]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    #[must_use]
    pub fn bet(&self) -> &BetRecord {
        &self.bet
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Whether the identity plays in this session.
    #[must_use]
    pub fn contains(&self, identity_id: IdentityId) -> bool {
        self.participants.contains_key(&identity_id)
    }

    /// Iterate participants in deterministic (identity) order.
    pub fn participants(&self) -> impl Iterator<Item = (IdentityId, &ParticipantState)> {
        self.participants.iter().map(|(&id, state)| (id, state))
    }

    /// Begin the countdown. Only acts on a WAITING session.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.status != SessionStatus::Waiting {
            return;
        }
        self.status = SessionStatus::Running;
        self.started_at = Some(now);
        tracing::debug!(room = %self.id, "session running");
    }

    /// Remaining time at `now`: `max(0, duration − elapsed)`. A session
    /// that never started reports the full duration; an ended one, zero.
    #[must_use]
    pub fn time_left_ms(&self, now: DateTime<Utc>) -> u64 {
        match (self.status, self.started_at) {
            (SessionStatus::Running, Some(started_at)) => {
                let elapsed = now
                    .signed_duration_since(started_at)
                    .num_milliseconds()
                    .max(0);
                self.duration_ms.saturating_sub(elapsed.unsigned_abs())
            }
            (SessionStatus::Waiting, _) => self.duration_ms,
            _ => 0,
        }
    }

    /// Count one accepted click and return the full snapshot to broadcast.
    /// Clicks from non-members or outside RUNNING are dropped silently —
    /// expected under network latency, not an error.
    pub fn record_click(&mut self, identity_id: IdentityId) -> Option<BTreeMap<IdentityId, u32>> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let state = self.participants.get_mut(&identity_id)?;
        state.clicks += 1;
        Some(self.click_snapshot())
    }

    /// Current clicks per participant.
    #[must_use]
    pub fn click_snapshot(&self) -> BTreeMap<IdentityId, u32> {
        self.participants
            .iter()
            .map(|(&id, state)| (id, state.clicks))
            .collect()
    }

    /// End the session and compute the standings.
    ///
    /// The winner is the strictly highest scorer; a strict tie (including
    /// 0–0) yields no winner — unless `forfeiting` names a participant, in
    /// which case the **other** participant wins regardless of score.
    ///
    /// Idempotent: a second call returns `None`, guarding against a tick
    /// racing a disconnect.
    pub fn finish(&mut self, forfeiting: Option<IdentityId>) -> Option<Standings> {
        if self.status == SessionStatus::Ended {
            return None;
        }
        self.status = SessionStatus::Ended;

        let mut scores: Vec<(IdentityId, u32)> = self
            .participants
            .iter()
            .map(|(&id, state)| (id, state.clicks))
            .collect();
        scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let winner = if let Some(forfeiter) = forfeiting {
            scores
                .iter()
                .map(|&(id, _)| id)
                .find(|&id| id != forfeiter)
        } else {
            match scores.as_slice() {
                [(leader, top), (_, second), ..] if top > second => Some(*leader),
                _ => None,
            }
        };

        Some(Standings { winner, scores })
    }
}
