//! Tokio driver for the session directory.
//!
//! The directory itself is synchronous; this module gives it a clock.
//! All shared state sits behind **one** coarse `Mutex` — settlement and
//! room formation touch cross-room state (global balances, the shared
//! queue), so fine-grained per-room locking would be unsafe.
//!
//! Every live session gets one interval task. The task never holds a
//! session reference: each firing locks the directory, re-fetches the
//! session by id inside [`SessionDirectory::tick`], and stops on
//! [`TickOutcome::Stop`] — so the timer is cancelled exactly once, and a
//! tick that fires after settlement finds nothing to act on. No blocking
//! work ever happens under the lock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use clickpot_types::{ConnectionId, RoomId};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::directory::{SessionDirectory, TickOutcome};
use crate::verifier::IdentityVerifier;

/// The directory as shared by the transport and the tick tasks.
pub type SharedDirectory<V> = Arc<Mutex<SessionDirectory<V>>>;

/// Wrap a directory for use by the tokio runtime.
#[must_use]
pub fn shared<V: IdentityVerifier>(directory: SessionDirectory<V>) -> SharedDirectory<V> {
    Arc::new(Mutex::new(directory))
}

/// Install a global `tracing` subscriber honoring `RUST_LOG`, defaulting
/// to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Feed one raw inbound frame into the directory. If the frame formed a
/// new room, its countdown ticker is spawned here.
pub fn handle_frame<V>(directory: &SharedDirectory<V>, conn: ConnectionId, raw: &str)
where
    V: IdentityVerifier + 'static,
{
    let new_room = {
        let mut dir = directory.lock().expect("directory lock poisoned");
        dir.handle_raw(conn, raw, Utc::now())
    };
    if let Some(room_id) = new_room {
        spawn_session_ticker(Arc::clone(directory), room_id);
    }
}

/// Report a dropped connection to the directory.
pub fn handle_disconnect<V>(directory: &SharedDirectory<V>, conn: ConnectionId)
where
    V: IdentityVerifier,
{
    let mut dir = directory.lock().expect("directory lock poisoned");
    dir.disconnect(conn, Utc::now());
}

/// Spawn the periodic countdown task for one room. The task exits when
/// [`SessionDirectory::tick`] reports [`TickOutcome::Stop`].
pub fn spawn_session_ticker<V>(directory: SharedDirectory<V>, room_id: RoomId) -> JoinHandle<()>
where
    V: IdentityVerifier + 'static,
{
    let interval_ms = {
        let dir = directory.lock().expect("directory lock poisoned");
        dir.config().tick_interval_ms
    };
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let outcome = {
                let mut dir = directory.lock().expect("directory lock poisoned");
                dir.tick(room_id, Utc::now())
            };
            if outcome == TickOutcome::Stop {
                break;
            }
        }
        tracing::debug!(room = %room_id, "ticker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::RecordingSink;
    use crate::verifier::PlainVerifier;
    use clickpot_types::{DirectoryConfig, ServerMessage};
    use rust_decimal::Decimal;

    fn register(
        directory: &SharedDirectory<PlainVerifier>,
        proof: &str,
    ) -> (ConnectionId, RecordingSink) {
        let sink = RecordingSink::new();
        let conn = {
            let mut dir = directory.lock().unwrap();
            dir.connect(Box::new(sink.clone()))
        };
        handle_frame(directory, conn, &format!(r#"{{"type":"register","proof":"{proof}"}}"#));
        (conn, sink)
    }

    #[tokio::test]
    async fn ticker_stops_after_disconnect_forfeit() {
        let directory = shared(SessionDirectory::new(
            DirectoryConfig::default(),
            PlainVerifier,
        ));
        let (conn_a, _sink_a) = register(&directory, "u1:Ann");
        let (conn_b, sink_b) = register(&directory, "u2:Bo");

        handle_frame(&directory, conn_a, r#"{"type":"queue-join","amount":"5"}"#);
        handle_frame(&directory, conn_b, r#"{"type":"queue-join","amount":"5"}"#);

        {
            let dir = directory.lock().unwrap();
            assert_eq!(dir.live_session_count(), 1);
        }

        // A disconnects mid-session: B wins by forfeit immediately,
        // long before the 10s duration elapses.
        handle_disconnect(&directory, conn_a);

        {
            let dir = directory.lock().unwrap();
            assert_eq!(dir.live_session_count(), 0);
            // Winner by forfeit takes pot - fee: 20 - 5 + 9 = 24.
            let b = clickpot_types::IdentityId::from_external("u2");
            assert_eq!(dir.balance(b), Decimal::new(24, 0));
        }

        let b = clickpot_types::IdentityId::from_external("u2");
        assert!(sink_b.sent().iter().any(|m| matches!(
            m,
            ServerMessage::GameResult { winner, .. } if *winner == Some(b)
        )));

        // The next tick firing observes the missing session and stops the
        // task cleanly; nothing panics.
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    #[tokio::test]
    async fn full_match_settles_on_time_expiry() {
        let config = DirectoryConfig {
            game_duration_ms: 200,
            tick_interval_ms: 50,
            ..DirectoryConfig::default()
        };
        let directory = shared(SessionDirectory::new(config, PlainVerifier));
        let (conn_a, sink_a) = register(&directory, "u1:Ann");
        let (conn_b, _sink_b) = register(&directory, "u2:Bo");

        handle_frame(&directory, conn_a, r#"{"type":"queue-join","amount":"1"}"#);
        handle_frame(&directory, conn_b, r#"{"type":"queue-join","amount":"1"}"#);

        // Nobody clicks: after the 200ms duration the ticker finishes the
        // session as a 0-0 tie and refunds both stakes.
        tokio::time::sleep(Duration::from_millis(600)).await;

        let dir = directory.lock().unwrap();
        assert_eq!(dir.live_session_count(), 0);
        let a = clickpot_types::IdentityId::from_external("u1");
        let b = clickpot_types::IdentityId::from_external("u2");
        assert_eq!(dir.balance(a), Decimal::new(20, 0));
        assert_eq!(dir.balance(b), Decimal::new(20, 0));
        assert_eq!(dir.house_balance(), Decimal::ZERO);

        let result = sink_a
            .sent()
            .into_iter()
            .find(|m| matches!(m, ServerMessage::GameResult { .. }));
        match result {
            Some(ServerMessage::GameResult { winner, .. }) => assert_eq!(winner, None),
            other => panic!("expected GameResult, got {other:?}"),
        }
    }
}
