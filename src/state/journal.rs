//! Per-bot execution history

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

use super::bot::TradeAction;

/// Retained entries per bot; oldest are evicted first.
pub const EXECUTION_LOG_CAP: usize = 100;

/// One recorded trade attempt (or feed/handling incident, logged as a
/// failed hold).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    pub bot_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: TradeAction,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Bounded append-only execution log, sharded per bot. Entries for one
/// bot arrive in decision order; no ordering holds across bots.
#[derive(Default)]
pub struct ExecutionJournal {
    logs: DashMap<Uuid, VecDeque<ExecutionLogEntry>>,
}

impl ExecutionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: ExecutionLogEntry) {
        let mut log = self.logs.entry(entry.bot_id).or_default();
        log.push_back(entry);
        while log.len() > EXECUTION_LOG_CAP {
            log.pop_front();
        }
    }

    /// All retained entries for one bot, oldest first.
    pub fn for_bot(&self, bot_id: Uuid) -> Vec<ExecutionLogEntry> {
        self.logs
            .get(&bot_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove(&self, bot_id: Uuid) {
        self.logs.remove(&bot_id);
    }

    /// Seed the journal from persisted logs, respecting the cap.
    pub fn restore(&self, logs: HashMap<Uuid, Vec<ExecutionLogEntry>>) {
        for (bot_id, entries) in logs {
            let skip = entries.len().saturating_sub(EXECUTION_LOG_CAP);
            self.logs
                .insert(bot_id, entries.into_iter().skip(skip).collect());
        }
    }

    pub fn total_entries(&self) -> usize {
        self.logs.iter().map(|log| log.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(bot_id: Uuid, price: f64) -> ExecutionLogEntry {
        ExecutionLogEntry {
            bot_id,
            timestamp: Utc::now(),
            action: TradeAction::Buy,
            price,
            amount: Some("1".into()),
            tx_hash: None,
            success: true,
            error: None,
        }
    }

    #[test]
    fn appends_in_order_per_bot() {
        let journal = ExecutionJournal::new();
        let bot_id = Uuid::new_v4();

        for i in 0..5 {
            journal.append(entry(bot_id, i as f64));
        }

        let log = journal.for_bot(bot_id);
        assert_eq!(log.len(), 5);
        assert_eq!(log[0].price, 0.0);
        assert_eq!(log[4].price, 4.0);
    }

    #[test]
    fn caps_at_one_hundred_entries_per_bot() {
        let journal = ExecutionJournal::new();
        let bot_id = Uuid::new_v4();

        for i in 0..101 {
            journal.append(entry(bot_id, i as f64));
        }

        let log = journal.for_bot(bot_id);
        assert_eq!(log.len(), EXECUTION_LOG_CAP);
        // Oldest entry evicted, order preserved.
        assert_eq!(log[0].price, 1.0);
        assert_eq!(log[99].price, 100.0);
    }

    #[test]
    fn bots_do_not_share_logs() {
        let journal = ExecutionJournal::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        journal.append(entry(a, 1.0));
        journal.append(entry(b, 2.0));

        assert_eq!(journal.for_bot(a).len(), 1);
        assert_eq!(journal.for_bot(b).len(), 1);
        assert_eq!(journal.total_entries(), 2);

        journal.remove(a);
        assert!(journal.for_bot(a).is_empty());
        assert_eq!(journal.for_bot(b).len(), 1);
    }

    #[test]
    fn restore_truncates_to_cap() {
        let journal = ExecutionJournal::new();
        let bot_id = Uuid::new_v4();
        let entries: Vec<_> = (0..150).map(|i| entry(bot_id, i as f64)).collect();

        journal.restore(HashMap::from([(bot_id, entries)]));

        let log = journal.for_bot(bot_id);
        assert_eq!(log.len(), EXECUTION_LOG_CAP);
        assert_eq!(log[0].price, 50.0);
    }
}
