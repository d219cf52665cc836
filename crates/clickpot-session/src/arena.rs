//! Arena of live sessions, indexed by room id.
//!
//! Timer callbacks never hold a session reference across await points or
//! tick firings: each tick re-fetches by id and checks liveness, so a
//! session deleted between two firings is simply absent — never a stale
//! pointer.

use std::collections::HashMap;

use clickpot_types::RoomId;

use crate::session::MatchSession;

/// Owns every live [`MatchSession`], keyed by room id.
pub struct SessionArena {
    sessions: HashMap<RoomId, MatchSession>,
}

impl SessionArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Insert a freshly created session.
    pub fn insert(&mut self, session: MatchSession) {
        self.sessions.insert(session.id(), session);
    }

    /// Fetch a session by id.
    #[must_use]
    pub fn get(&self, room_id: RoomId) -> Option<&MatchSession> {
        self.sessions.get(&room_id)
    }

    /// Fetch a session mutably by id.
    pub fn get_mut(&mut self, room_id: RoomId) -> Option<&mut MatchSession> {
        self.sessions.get_mut(&room_id)
    }

    /// Discard a settled session.
    pub fn remove(&mut self, room_id: RoomId) -> Option<MatchSession> {
        self.sessions.remove(&room_id)
    }

    /// Whether the room is still live.
    #[must_use]
    pub fn contains(&self, room_id: RoomId) -> bool {
        self.sessions.contains_key(&room_id)
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clickpot_types::{BetRecord, ConnectionId, IdentityId};
    use rust_decimal::Decimal;

    fn make_session() -> MatchSession {
        let a = IdentityId::from_external("a");
        let b = IdentityId::from_external("b");
        let room = RoomId::new();
        let bet = BetRecord::new(
            room,
            Decimal::ONE,
            vec![a, b],
            Decimal::new(1, 1),
            Utc::now(),
        );
        MatchSession::new(
            room,
            bet,
            10_000,
            &[(a, ConnectionId::new()), (b, ConnectionId::new())],
        )
    }

    #[test]
    fn insert_get_remove() {
        let mut arena = SessionArena::new();
        let session = make_session();
        let room = session.id();

        arena.insert(session);
        assert!(arena.contains(room));
        assert_eq!(arena.len(), 1);
        assert!(arena.get(room).is_some());

        arena.remove(room);
        assert!(!arena.contains(room));
        assert!(arena.is_empty());
    }

    #[test]
    fn get_after_remove_is_none() {
        let mut arena = SessionArena::new();
        let session = make_session();
        let room = session.id();
        arena.insert(session);
        arena.remove(room);
        // A tick firing after deletion finds nothing — by construction
        // there is no stale reference to act on.
        assert!(arena.get(room).is_none());
        assert!(arena.get_mut(room).is_none());
    }

    #[test]
    fn unknown_room_is_absent() {
        let arena = SessionArena::new();
        assert!(arena.get(RoomId::new()).is_none());
    }
}
