//! Bounded, newest-first history of settled matches.

use std::collections::VecDeque;

use clickpot_types::ResultRecord;

/// Append-only ring of the most recent results.
pub struct ResultLog {
    /// Front = oldest, back = newest.
    records: VecDeque<ResultRecord>,
    cap: usize,
}

impl ResultLog {
    /// Create a log retaining at most `cap` results.
    ///
    /// # Panics
    /// Panics if `cap` is zero.
    #[must_use]
    pub fn new(cap: usize) -> Self {
        assert!(cap > 0, "ResultLog cap must be > 0");
        Self {
            records: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a settled match, evicting the oldest past capacity.
    pub fn push(&mut self, record: ResultRecord) {
        if self.records.len() >= self.cap {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// The most recent results, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<ResultRecord> {
        self.records.iter().rev().take(limit).cloned().collect()
    }

    /// Number of retained results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no results are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clickpot_types::{BetRecord, FinishReason, IdentityId, RoomId};
    use rust_decimal::Decimal;

    fn record(winner: Option<&str>) -> ResultRecord {
        let a = IdentityId::from_external("a");
        let b = IdentityId::from_external("b");
        let room = RoomId::new();
        ResultRecord {
            room_id: room,
            winner: winner.map(IdentityId::from_external),
            reason: FinishReason::Time,
            participants: Vec::new(),
            bet: BetRecord::new(room, Decimal::ONE, vec![a, b], Decimal::new(1, 1), Utc::now()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn newest_first() {
        let mut log = ResultLog::new(25);
        log.push(record(Some("a")));
        log.push(record(None));

        let recent = log.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].winner, None);
        assert_eq!(recent[1].winner, Some(IdentityId::from_external("a")));
    }

    #[test]
    fn bounded_evicts_oldest() {
        let mut log = ResultLog::new(3);
        for _ in 0..5 {
            log.push(record(Some("a")));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.recent(100).len(), 3);
    }

    #[test]
    #[should_panic(expected = "cap must be > 0")]
    fn zero_cap_panics() {
        let _ = ResultLog::new(0);
    }
}
