//! Trade executor
//!
//! Turns a buy/sell decision into a swap submission and records the
//! outcome: journal entry, bot counters, cooldown state, persistence.
//! Every attempt is logged, success or failure; a failure of any kind
//! (reported, thrown, or timed out) puts the bot into cooldown.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::feed::PriceTick;
use crate::relay::{SwapApi, SwapOutcome};
use crate::state::{
    Bot, CooldownTracker, ExecutionJournal, ExecutionLogEntry, TradeAction, RETRY_DELAY_MS,
};
use crate::storage::BotStore;

pub struct TradeExecutor {
    swap: Arc<dyn SwapApi>,
    store: Arc<dyn BotStore>,
    journal: Arc<ExecutionJournal>,
    cooldowns: Arc<CooldownTracker>,
    swap_timeout: Duration,
}

impl TradeExecutor {
    pub fn new(
        swap: Arc<dyn SwapApi>,
        store: Arc<dyn BotStore>,
        journal: Arc<ExecutionJournal>,
        cooldowns: Arc<CooldownTracker>,
        swap_timeout: Duration,
    ) -> Self {
        Self {
            swap,
            store,
            journal,
            cooldowns,
            swap_timeout,
        }
    }

    /// Submit the swap for a buy/sell decision. A hold is a no-op.
    pub async fn execute(&self, bot: &Arc<RwLock<Bot>>, action: TradeAction, tick: &PriceTick) {
        let (bot_id, bot_name, request) = {
            let b = bot.read();
            let request = match action {
                TradeAction::Buy => b.swap_config.clone(),
                TradeAction::Sell => b.swap_config.mirrored(),
                TradeAction::Hold => return,
            };
            (b.id, b.name.clone(), request)
        };

        info!(bot = %bot_name, %action, price = tick.price, "💱 executing trade");

        let outcome = match timeout(self.swap_timeout, self.swap.execute_swap(&request)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => SwapOutcome {
                success: false,
                error: Some(format!("{err:#}")),
                ..Default::default()
            },
            Err(_) => SwapOutcome {
                success: false,
                error: Some(format!(
                    "swap timed out after {}s",
                    self.swap_timeout.as_secs()
                )),
                ..Default::default()
            },
        };

        let now = Utc::now();
        if outcome.success {
            {
                let mut b = bot.write();
                b.execution_count += 1;
                b.last_execution_at = Some(now);
            }
            self.cooldowns.clear(bot_id);
            info!(bot = %bot_name, %action, tx = ?outcome.tx_hash, "✅ trade executed");
        } else {
            self.cooldowns.record_failure(bot_id, now);
            warn!(
                bot = %bot_name,
                %action,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "❌ trade failed, entering {}s cooldown",
                RETRY_DELAY_MS / 1000
            );
        }

        let entry = ExecutionLogEntry {
            bot_id,
            timestamp: now,
            action,
            price: tick.price,
            amount: Some(request.amount.clone()),
            tx_hash: outcome.tx_hash.clone(),
            success: outcome.success,
            error: outcome.error.clone(),
        };
        self.journal.append(entry.clone());
        self.flush(bot, entry);
    }

    /// Persist the bot snapshot and log entry fire-and-forget; storage
    /// trouble must never stall the tick path.
    fn flush(&self, bot: &Arc<RwLock<Bot>>, entry: ExecutionLogEntry) {
        let snapshot = bot.read().clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.save_bot(&snapshot).await {
                warn!("failed to persist bot state: {err:#}");
            }
            if let Err(err) = store.append_log(&entry).await {
                warn!("failed to persist execution log: {err:#}");
            }
        });
    }
}
