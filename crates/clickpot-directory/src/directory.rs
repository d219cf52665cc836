//! The session directory — top-level orchestrator.
//!
//! Owns every piece of mutable state (balances, escrows, queue, sessions,
//! ranking) and binds the identity/connection lifecycle to them. Each
//! inbound event (`register`, `queue-join`, `click`, `disconnect`, tick)
//! runs to completion before the next one starts; under the tokio runtime
//! the whole directory sits behind one coarse lock, because settlement and
//! room formation touch cross-room state (global balances, the shared
//! queue) atomically.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clickpot_escrow::{BalanceBook, EscrowLedger, MatchmakingQueue, QueueOutcome};
use clickpot_session::{ClickDecision, ClickRateLimiter, MatchSession, SessionArena};
use clickpot_settlement::SettlementEngine;
use clickpot_types::{
    ClickpotError, ClientMessage, ConnectionId, DirectoryConfig, FinishReason, IdentityId,
    OpponentSummary, QueueStatus, RankingEntry, Result, ResultRecord, RoomId, ServerMessage,
    TransactionLogEntry, constants,
};
use rust_decimal::Decimal;

use crate::connection::ConnectionSink;
use crate::verifier::IdentityVerifier;

/// What the periodic tick driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep ticking.
    Continue,
    /// The session is gone or just finished; cancel the timer.
    Stop,
}

/// A registered player identity. Balances live in the balance book;
/// this is the directory's view of who is connected as whom.
struct Identity {
    display_name: String,
    /// The identity's current live connection. Replaced on re-registration.
    connection: ConnectionId,
}

/// Per-connection state, created on connect and destroyed on disconnect.
struct ConnectionEntry {
    sink: Box<dyn ConnectionSink>,
    /// Set once registration succeeds.
    identity: Option<IdentityId>,
    /// The room this connection is playing in, if any.
    room: Option<RoomId>,
    limiter: ClickRateLimiter,
}

/// Top-level orchestrator for registration, matchmaking, sessions, and
/// settlement.
pub struct SessionDirectory<V: IdentityVerifier> {
    config: DirectoryConfig,
    verifier: V,
    connections: HashMap<ConnectionId, ConnectionEntry>,
    identities: HashMap<IdentityId, Identity>,
    book: BalanceBook,
    ledger: EscrowLedger,
    queue: MatchmakingQueue,
    arena: SessionArena,
    engine: SettlementEngine,
}

impl<V: IdentityVerifier> SessionDirectory<V> {
    /// Create a directory with the given configuration and proof verifier.
    #[must_use]
    pub fn new(mut config: DirectoryConfig, verifier: V) -> Self {
        config.allowed_stakes.sort();
        let ledger = EscrowLedger::new(config.house_cut_rate, config.transaction_log_cap);
        let engine = SettlementEngine::new(config.result_log_cap);
        Self {
            config,
            verifier,
            connections: HashMap::new(),
            identities: HashMap::new(),
            book: BalanceBook::new(),
            ledger,
            queue: MatchmakingQueue::new(),
            arena: SessionArena::new(),
            engine,
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // Connection lifecycle
    // -----------------------------------------------------------------

    /// Accept a new connection. The transport calls this once per socket.
    pub fn connect(&mut self, sink: Box<dyn ConnectionSink>) -> ConnectionId {
        let conn = ConnectionId::new();
        self.connections.insert(
            conn,
            ConnectionEntry {
                sink,
                identity: None,
                room: None,
                limiter: ClickRateLimiter::new(
                    self.config.min_click_interval_ms,
                    self.config.click_window_ms,
                    self.config.max_clicks_per_window,
                ),
            },
        );
        tracing::debug!(%conn, "connection accepted");
        conn
    }

    /// Handle a raw JSON frame from a connection. Malformed payloads are
    /// rejected back to the sender without touching any state.
    ///
    /// Returns the room id if this event formed a new room (the tick
    /// driver starts a timer for it).
    pub fn handle_raw(
        &mut self,
        conn: ConnectionId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Option<RoomId> {
        match serde_json::from_str::<ClientMessage>(raw) {
            Ok(message) => self.handle_message(conn, message, now),
            Err(err) => {
                self.send_error(
                    conn,
                    &ClickpotError::MalformedMessage {
                        reason: err.to_string(),
                    },
                );
                None
            }
        }
    }

    /// Dispatch one decoded inbound message.
    pub fn handle_message(
        &mut self,
        conn: ConnectionId,
        message: ClientMessage,
        now: DateTime<Utc>,
    ) -> Option<RoomId> {
        match message {
            ClientMessage::Register { proof } => {
                self.register(conn, &proof, now);
                None
            }
            ClientMessage::QueueJoin { amount } => self.queue_join(conn, amount, now),
            ClientMessage::Click => {
                self.click(conn, now);
                None
            }
        }
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    /// Verify an identity proof and bind the connection to the identity.
    ///
    /// A failed proof terminates the connection. A second live connection
    /// for the same identity forcibly closes the first and takes over its
    /// room, if any.
    pub fn register(&mut self, conn: ConnectionId, proof: &str, _now: DateTime<Utc>) {
        if !self.connections.contains_key(&conn) {
            tracing::warn!(%conn, "register from unknown connection");
            return;
        }

        let verified = match self.verifier.verify(proof) {
            Ok(verified) => verified,
            Err(err) => {
                self.send_error(conn, &err);
                if let Some(entry) = self.connections.get(&conn) {
                    entry.sink.close();
                }
                return;
            }
        };

        let identity_id = IdentityId::from_external(&verified.external_id);
        let display_name = sanitize_display_name(&verified.display_name);

        // Dedupe: close the identity's previous connection and hand any
        // live room over to this one.
        let mut takeover_room = None;
        if let Some(existing) = self.identities.get(&identity_id) {
            let prev_conn = existing.connection;
            if prev_conn != conn {
                if let Some(prev_entry) = self.connections.remove(&prev_conn) {
                    prev_entry.sink.close();
                    takeover_room = prev_entry.room;
                    tracing::info!(
                        identity = %identity_id.short(),
                        %prev_conn,
                        "closed previous connection on re-registration"
                    );
                }
            }
        }

        // The starting balance is granted exactly once per identity.
        if !self.book.contains(identity_id) {
            self.book.credit(identity_id, self.config.starting_balance);
            self.engine.record_grant(self.config.starting_balance);
        }

        self.identities.insert(
            identity_id,
            Identity {
                display_name: display_name.clone(),
                connection: conn,
            },
        );

        let balance = self.book.balance(identity_id);
        if let Some(entry) = self.connections.get_mut(&conn) {
            entry.identity = Some(identity_id);
            if takeover_room.is_some() {
                entry.room = takeover_room;
            }
        }

        self.send(
            conn,
            &ServerMessage::RegisterAck {
                identity_id,
                display_name: display_name.clone(),
                balance,
                allowed_stakes: self.config.allowed_stakes.clone(),
                house_cut_rate: self.config.house_cut_rate,
            },
        );
        tracing::info!(
            identity = %identity_id.short(),
            name = %display_name,
            %balance,
            "registered"
        );
    }

    // -----------------------------------------------------------------
    // Queueing
    // -----------------------------------------------------------------

    /// Commit a stake to the matchmaking queue.
    ///
    /// Returns the room id if the stake matched and a room was formed.
    pub fn queue_join(
        &mut self,
        conn: ConnectionId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Option<RoomId> {
        match self.try_queue_join(conn, amount, now) {
            Ok(room) => room,
            Err(err) => {
                self.send_error(conn, &err);
                None
            }
        }
    }

    fn try_queue_join(
        &mut self,
        conn: ConnectionId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Option<RoomId>> {
        let entry = self
            .connections
            .get(&conn)
            .ok_or(ClickpotError::NotRegistered)?;
        if let Some(room) = entry.room {
            return Err(ClickpotError::AlreadyInSession(room));
        }
        let identity_id = entry.identity.ok_or(ClickpotError::NotRegistered)?;
        let display_name = self
            .identities
            .get(&identity_id)
            .map(|i| i.display_name.clone())
            .ok_or(ClickpotError::UnknownIdentity(identity_id))?;

        if !self.config.stake_allowed(amount) {
            return Err(ClickpotError::InvalidStake { amount });
        }
        if self.ledger.has_escrow(identity_id) {
            return Err(ClickpotError::AlreadyLocked(identity_id));
        }

        // Atomic debit + lock: a failure here leaves the balance untouched.
        self.ledger.lock(&mut self.book, identity_id, amount, now)?;
        self.send(
            conn,
            &ServerMessage::BalanceUpdate {
                balance: self.book.balance(identity_id),
            },
        );

        let outcome = self.queue.queue_stake(identity_id, amount, now);
        let status = match outcome {
            QueueOutcome::Matched { .. } => QueueStatus::Matched,
            QueueOutcome::Waiting => QueueStatus::Waiting,
        };

        let pot = amount * Decimal::from(2);
        self.send(
            conn,
            &ServerMessage::QueueJoined {
                status,
                amount,
                pot,
                house_fee: pot * self.config.house_cut_rate,
            },
        );
        tracing::info!(
            identity = %identity_id.short(),
            name = %display_name,
            %amount,
            matched = status == QueueStatus::Matched,
            "stake queued"
        );

        if let QueueOutcome::Matched { opponent } = outcome {
            self.ledger.mark_matched(identity_id)?;
            self.ledger.mark_matched(opponent)?;
            return Ok(self.create_room([identity_id, opponent], amount, now));
        }
        Ok(None)
    }

    /// Form a room for two matched stakes, verifying both connections are
    /// still live. If either vanished, both escrows are released and no
    /// session is created — the survivors may simply requeue.
    fn create_room(
        &mut self,
        participants: [IdentityId; 2],
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Option<RoomId> {
        let mut live: Vec<(IdentityId, ConnectionId)> = Vec::with_capacity(2);
        for &identity_id in &participants {
            let conn = self
                .identities
                .get(&identity_id)
                .map(|identity| identity.connection)
                .filter(|conn| self.connections.contains_key(conn));
            match conn {
                Some(conn) => live.push((identity_id, conn)),
                None => break,
            }
        }

        if live.len() != participants.len() {
            let released = self
                .ledger
                .release_many(&participants, "opponent offline", now);
            for payout in released {
                let balance = self.book.credit(payout.identity_id, payout.amount);
                self.send_to_identity(
                    payout.identity_id,
                    &ServerMessage::BalanceUpdate { balance },
                );
            }
            tracing::warn!("room formation aborted: participant offline, stakes released");
            return None;
        }

        let room_id = RoomId::new();
        let bet = self.ledger.attach_room(room_id, amount, &participants, now);
        let session = MatchSession::new(room_id, bet.clone(), self.config.game_duration_ms, &live);
        self.arena.insert(session);

        for &(identity_id, conn) in &live {
            if let Some(entry) = self.connections.get_mut(&conn) {
                entry.room = Some(room_id);
                entry.limiter.reset();
            }
            let opponent = live
                .iter()
                .find(|&&(other, _)| other != identity_id)
                .map(|&(other, _)| OpponentSummary {
                    identity_id: other,
                    display_name: self.display_name(other),
                });
            if let Some(opponent) = opponent {
                self.send(
                    conn,
                    &ServerMessage::MatchFound {
                        room_id,
                        bet: bet.clone(),
                        opponent,
                    },
                );
            }
        }
        tracing::info!(
            room = %room_id,
            a = %participants[0].short(),
            b = %participants[1].short(),
            "room formed"
        );

        self.start_game(room_id, now);
        Some(room_id)
    }

    fn start_game(&mut self, room_id: RoomId, now: DateTime<Utc>) {
        let Some(session) = self.arena.get_mut(room_id) else {
            return;
        };
        session.start(now);
        let bet = session.bet().clone();
        let duration_ms = session.duration_ms();
        let participants: Vec<IdentityId> = session.participants().map(|(id, _)| id).collect();

        for identity_id in participants {
            self.send_to_identity(
                identity_id,
                &ServerMessage::GameStart {
                    room_id,
                    duration_ms,
                    time_left_ms: duration_ms,
                    bet: bet.clone(),
                },
            );
        }
    }

    // -----------------------------------------------------------------
    // Clicks
    // -----------------------------------------------------------------

    /// Process one click. Silently dropped unless the connection is inside
    /// a running session — stale clicks are expected under network
    /// latency, not an error.
    pub fn click(&mut self, conn: ConnectionId, now: DateTime<Utc>) {
        let Some(entry) = self.connections.get_mut(&conn) else {
            return;
        };
        let (Some(identity_id), Some(room_id)) = (entry.identity, entry.room) else {
            return;
        };
        let Some(session) = self.arena.get_mut(room_id) else {
            return;
        };
        if !session.is_running() || !session.contains(identity_id) {
            return;
        }

        let now_ms = timestamp_ms(now);
        match entry.limiter.check(now_ms) {
            ClickDecision::Accepted => {}
            ClickDecision::TooSoon => return,
            ClickDecision::WindowExceeded => {
                entry.sink.send(&ServerMessage::Warning {
                    message: "Too many clicks. Breathe :)".to_string(),
                });
                return;
            }
        }

        let Some(clicks) = session.record_click(identity_id) else {
            return;
        };
        let participants: Vec<IdentityId> = session.participants().map(|(id, _)| id).collect();
        let update = ServerMessage::GameUpdate { clicks };
        for identity_id in participants {
            self.send_to_identity(identity_id, &update);
        }
    }

    // -----------------------------------------------------------------
    // Ticks
    // -----------------------------------------------------------------

    /// One countdown tick for a room. The timer driver calls this until it
    /// returns [`TickOutcome::Stop`] — which happens exactly once, when the
    /// session ends or has already been discarded.
    pub fn tick(&mut self, room_id: RoomId, now: DateTime<Utc>) -> TickOutcome {
        // Re-fetch by id: the session may have been settled and removed
        // since the timer fired.
        let Some(session) = self.arena.get(room_id) else {
            return TickOutcome::Stop;
        };
        if !session.is_running() {
            return TickOutcome::Stop;
        }

        let time_left_ms = session.time_left_ms(now);
        let participants: Vec<IdentityId> = session.participants().map(|(id, _)| id).collect();
        for identity_id in participants {
            self.send_to_identity(identity_id, &ServerMessage::GameTick { time_left_ms });
        }

        if time_left_ms == 0 {
            self.finish_room(room_id, FinishReason::Time, None, now);
            return TickOutcome::Stop;
        }
        TickOutcome::Continue
    }

    // -----------------------------------------------------------------
    // Disconnects
    // -----------------------------------------------------------------

    /// Handle a dropped connection: refund any pending stake, and forfeit
    /// a running session in favor of the opponent.
    pub fn disconnect(&mut self, conn: ConnectionId, now: DateTime<Utc>) {
        let Some(entry) = self.connections.remove(&conn) else {
            return;
        };
        let Some(identity_id) = entry.identity else {
            tracing::debug!(%conn, "unregistered connection dropped");
            return;
        };
        tracing::info!(identity = %identity_id.short(), %conn, "disconnected");

        self.queue.cancel(identity_id);
        let refund = self.ledger.cancel_waiting(identity_id, "disconnect", now);
        if refund > Decimal::ZERO {
            self.book.credit(identity_id, refund);
        }

        if let Some(room_id) = entry.room {
            self.finish_room(room_id, FinishReason::Disconnect, Some(identity_id), now);
        }
    }

    // -----------------------------------------------------------------
    // Finishing
    // -----------------------------------------------------------------

    /// End a session and settle it. Safe to call from both the tick path
    /// and the disconnect path: the session's own `finish` is idempotent,
    /// so the second caller exits without settling again.
    fn finish_room(
        &mut self,
        room_id: RoomId,
        reason: FinishReason,
        forfeiting: Option<IdentityId>,
        now: DateTime<Utc>,
    ) {
        let Some(session) = self.arena.get_mut(room_id) else {
            return;
        };
        let Some(standings) = session.finish(forfeiting) else {
            return;
        };

        let display_names: HashMap<IdentityId, String> = standings
            .scores
            .iter()
            .map(|&(identity_id, _)| (identity_id, self.display_name(identity_id)))
            .collect();

        let settlement = match self.engine.settle_room(
            &mut self.book,
            &mut self.ledger,
            room_id,
            &standings,
            reason,
            &display_names,
            now,
        ) {
            Ok(settlement) => settlement,
            Err(err) => {
                // Conservation violation: halt this room without a result
                // broadcast; the supervising layer restarts the process.
                tracing::error!(room = %room_id, %err, "settlement halted");
                self.cleanup_room(room_id, &standings.scores);
                return;
            }
        };

        if let Some(bet) = settlement.bet.clone() {
            let result = ServerMessage::GameResult {
                room_id,
                winner: settlement.winner,
                participants: settlement.participants.clone(),
                payouts: settlement.payouts.clone(),
                bet,
                house_balance: settlement.house_balance,
            };
            for &(identity_id, _) in &standings.scores {
                self.send_to_identity(identity_id, &result);
            }
            for payout in &settlement.payouts {
                let balance = self.book.balance(payout.identity_id);
                self.send_to_identity(
                    payout.identity_id,
                    &ServerMessage::BalanceUpdate { balance },
                );
            }
        }

        tracing::info!(
            room = %room_id,
            winner = settlement
                .winner
                .map(|w| w.short())
                .unwrap_or_else(|| "tie".into()),
            %reason,
            "result"
        );
        self.cleanup_room(room_id, &standings.scores);
    }

    /// Clear per-connection room references and discard the session.
    fn cleanup_room(&mut self, room_id: RoomId, scores: &[(IdentityId, u32)]) {
        for &(identity_id, _) in scores {
            if let Some(conn) = self.identities.get(&identity_id).map(|i| i.connection) {
                if let Some(entry) = self.connections.get_mut(&conn) {
                    if entry.room == Some(room_id) {
                        entry.room = None;
                        entry.limiter.reset();
                    }
                }
            }
        }
        self.arena.remove(room_id);
    }

    // -----------------------------------------------------------------
    // Read models
    // -----------------------------------------------------------------

    /// Top `n` ranking rows: wins descending, then credits earned.
    #[must_use]
    pub fn ranking(&self, n: usize) -> Vec<RankingEntry> {
        self.engine.ranking(n)
    }

    /// The most recent results, newest first.
    #[must_use]
    pub fn recent_results(&self, limit: usize) -> Vec<ResultRecord> {
        self.engine.recent_results(limit)
    }

    /// The most recent ledger transactions, newest first.
    #[must_use]
    pub fn recent_transactions(&self, limit: usize) -> Vec<TransactionLogEntry> {
        self.ledger.recent_transactions(limit)
    }

    /// Credits retained by the house so far.
    #[must_use]
    pub fn house_balance(&self) -> Decimal {
        self.engine.house_balance()
    }

    /// An identity's available balance.
    #[must_use]
    pub fn balance(&self, identity_id: IdentityId) -> Decimal {
        self.book.balance(identity_id)
    }

    /// Number of live connections.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn live_session_count(&self) -> usize {
        self.arena.len()
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn display_name(&self, identity_id: IdentityId) -> String {
        self.identities
            .get(&identity_id)
            .map_or_else(|| "Anon".to_string(), |i| i.display_name.clone())
    }

    fn send(&self, conn: ConnectionId, message: &ServerMessage) {
        if let Some(entry) = self.connections.get(&conn) {
            entry.sink.send(message);
        }
    }

    fn send_to_identity(&self, identity_id: IdentityId, message: &ServerMessage) {
        if let Some(identity) = self.identities.get(&identity_id) {
            self.send(identity.connection, message);
        }
    }

    fn send_error(&self, conn: ConnectionId, err: &ClickpotError) {
        self.send(
            conn,
            &ServerMessage::Error {
                message: err.to_string(),
            },
        );
    }
}

/// Trim and bound a display name, falling back to the default when empty.
fn sanitize_display_name(raw: &str) -> String {
    let trimmed: String = raw.trim().chars().take(constants::DISPLAY_NAME_CAP).collect();
    if trimmed.is_empty() {
        constants::FALLBACK_DISPLAY_NAME.to_string()
    } else {
        trimmed
    }
}

/// Milliseconds since the UNIX epoch, clamped at zero.
fn timestamp_ms(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp_millis()).unwrap_or_default()
}
