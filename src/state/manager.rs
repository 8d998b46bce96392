//! Bot registry
//!
//! Orchestration root: owns every bot record plus the shared runtime
//! state (price history, cooldowns, journal) and wires a feed
//! subscription, the evaluator, and the executor together per active
//! bot. Collaborators are injected at construction; there is no ambient
//! state.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::runner::{run_bot, RunnerContext};
use crate::engine::TradeExecutor;
use crate::feed::{PriceFeed, PriceTick};
use crate::relay::{validate_swap_config, SwapApi};
use crate::storage::BotStore;

use super::bot::{Bot, Strategy, SwapConfig};
use super::cooldown::CooldownTracker;
use super::history::PriceHistory;
use super::journal::{ExecutionJournal, ExecutionLogEntry};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Bot {0} not found")]
    BotNotFound(Uuid),

    #[error("Invalid swap configuration: {}", .0.join(", "))]
    InvalidSwapConfig(Vec<String>),
}

/// Everything needed to create a bot. Also the on-disk shape for seed
/// definitions loaded at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBotRequest {
    pub name: String,
    #[serde(default)]
    pub target_coin: Option<String>,
    pub strategy: Strategy,
    pub swap_config: SwapConfig,
    /// Activate immediately after creation.
    #[serde(default)]
    pub auto_start: bool,
}

#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_bots: usize,
    pub active_bots: usize,
    pub total_executions: u64,
    pub logged_entries: usize,
}

pub struct BotRegistry {
    bots: DashMap<Uuid, Arc<RwLock<Bot>>>,
    runners: DashMap<Uuid, JoinHandle<()>>,
    journal: Arc<ExecutionJournal>,
    cooldowns: Arc<CooldownTracker>,
    history: Arc<PriceHistory>,
    executor: Arc<TradeExecutor>,
    feed: Arc<dyn PriceFeed>,
    store: Arc<dyn BotStore>,
    default_coin: String,
}

impl BotRegistry {
    pub fn new(
        feed: Arc<dyn PriceFeed>,
        swap: Arc<dyn SwapApi>,
        store: Arc<dyn BotStore>,
        default_coin: impl Into<String>,
        swap_timeout: Duration,
    ) -> Self {
        let journal = Arc::new(ExecutionJournal::new());
        let cooldowns = Arc::new(CooldownTracker::new());
        let executor = Arc::new(TradeExecutor::new(
            swap,
            store.clone(),
            journal.clone(),
            cooldowns.clone(),
            swap_timeout,
        ));

        Self {
            bots: DashMap::new(),
            runners: DashMap::new(),
            journal,
            cooldowns,
            history: Arc::new(PriceHistory::new()),
            executor,
            feed,
            store,
            default_coin: default_coin.into(),
        }
    }

    /// Load persisted bots and logs, then bring every bot that was
    /// active at shutdown back online. Returns the reactivated count;
    /// individual failures are logged and skipped.
    pub async fn restore(&self) -> usize {
        let bots = match self.store.load_bots().await {
            Ok(bots) => bots,
            Err(err) => {
                warn!("failed to load bots from storage: {err:#}");
                Vec::new()
            }
        };
        match self.store.load_logs().await {
            Ok(logs) => self.journal.restore(logs),
            Err(err) => warn!("failed to load execution logs: {err:#}"),
        }

        let mut to_reactivate = Vec::new();
        for mut bot in bots {
            if bot.is_active {
                // The stored flag records intent; the subscription is
                // re-established through the normal activation path.
                bot.is_active = false;
                to_reactivate.push(bot.id);
            }
            info!(bot = %bot.name, id = %bot.id, "📥 loaded bot from storage");
            self.bots.insert(bot.id, Arc::new(RwLock::new(bot)));
        }

        let mut reactivated = 0;
        for bot_id in to_reactivate {
            match self.activate_bot(bot_id).await {
                Ok(()) => reactivated += 1,
                Err(err) => error!(id = %bot_id, "failed to reactivate bot: {err}"),
            }
        }
        reactivated
    }

    pub async fn create_bot(&self, request: NewBotRequest) -> Result<Bot, RegistryError> {
        let problems = validate_swap_config(&request.swap_config);
        if !problems.is_empty() {
            return Err(RegistryError::InvalidSwapConfig(problems));
        }

        let bot = Bot::new(
            request.name,
            request
                .target_coin
                .unwrap_or_else(|| self.default_coin.clone()),
            request.strategy,
            request.swap_config,
        );

        info!(bot = %bot.name, id = %bot.id, coin = %bot.target_coin, "🤖 bot created");
        self.bots
            .insert(bot.id, Arc::new(RwLock::new(bot.clone())));
        if let Err(err) = self.store.save_bot(&bot).await {
            warn!("failed to persist new bot: {err:#}");
        }
        Ok(bot)
    }

    /// Start streaming ticks into the bot. Re-activating an active bot
    /// is a no-op.
    pub async fn activate_bot(&self, bot_id: Uuid) -> Result<(), RegistryError> {
        let bot = self.shared_bot(bot_id)?;
        {
            let mut b = bot.write();
            if b.is_active {
                info!(bot = %b.name, "bot is already active");
                return Ok(());
            }
            b.is_active = true;
        }
        self.persist(&bot).await;

        let ctx = RunnerContext {
            bot: bot.clone(),
            feed: self.feed.clone(),
            history: self.history.clone(),
            cooldowns: self.cooldowns.clone(),
            journal: self.journal.clone(),
            executor: self.executor.clone(),
        };
        let handle = tokio::spawn(run_bot(ctx));
        self.runners.insert(bot_id, handle);

        info!(bot = %bot.read().name, "🚀 bot activated");
        Ok(())
    }

    /// Stop evaluation and tear down the feed subscription. Accumulated
    /// state (counters, logs, history) is retained. Returns only after
    /// the runner task has fully stopped, so no trade can start once
    /// deactivation completes.
    pub async fn deactivate_bot(&self, bot_id: Uuid) -> Result<(), RegistryError> {
        let bot = self.shared_bot(bot_id)?;
        {
            let mut b = bot.write();
            if !b.is_active {
                info!(bot = %b.name, "bot is already inactive");
                return Ok(());
            }
            b.is_active = false;
        }

        if let Some((_, handle)) = self.runners.remove(&bot_id) {
            handle.abort();
            let _ = handle.await;
        }
        self.persist(&bot).await;

        info!(bot = %bot.read().name, "⏹️ bot deactivated");
        Ok(())
    }

    /// Remove the bot and its journal. An active bot is deactivated
    /// first; deletion never races a live runner.
    pub async fn delete_bot(&self, bot_id: Uuid) -> Result<(), RegistryError> {
        self.deactivate_bot(bot_id).await?;

        let name = self
            .bots
            .remove(&bot_id)
            .map(|(_, bot)| bot.read().name.clone())
            .unwrap_or_default();
        self.journal.remove(bot_id);
        self.cooldowns.clear(bot_id);
        if let Err(err) = self.store.remove_bot(bot_id).await {
            warn!("failed to remove bot from storage: {err:#}");
        }

        info!(bot = %name, "🗑️ bot deleted");
        Ok(())
    }

    pub fn get_bot(&self, bot_id: Uuid) -> Result<Bot, RegistryError> {
        Ok(self.shared_bot(bot_id)?.read().clone())
    }

    pub fn all_bots(&self) -> Vec<Bot> {
        self.bots.iter().map(|b| b.value().read().clone()).collect()
    }

    pub fn active_bots(&self) -> Vec<Bot> {
        self.all_bots().into_iter().filter(|b| b.is_active).collect()
    }

    pub fn bot_logs(&self, bot_id: Uuid) -> Result<Vec<ExecutionLogEntry>, RegistryError> {
        self.shared_bot(bot_id)?;
        Ok(self.journal.for_bot(bot_id))
    }

    /// Copy of the shared tick history, oldest first.
    pub fn price_history(&self) -> Vec<PriceTick> {
        self.history.snapshot()
    }

    pub fn recent_prices(&self, n: usize) -> Vec<PriceTick> {
        self.history.recent(n)
    }

    pub fn stats(&self) -> RegistryStats {
        let bots = self.all_bots();
        RegistryStats {
            total_bots: bots.len(),
            active_bots: bots.iter().filter(|b| b.is_active).count(),
            total_executions: bots.iter().map(|b| b.execution_count).sum(),
            logged_entries: self.journal.total_entries(),
        }
    }

    /// Deactivate every active bot, flushing state on the way down.
    pub async fn shutdown(&self) {
        let active: Vec<Uuid> = self
            .bots
            .iter()
            .filter(|b| b.value().read().is_active)
            .map(|b| *b.key())
            .collect();
        for bot_id in active {
            if let Err(err) = self.deactivate_bot(bot_id).await {
                warn!(id = %bot_id, "failed to deactivate during shutdown: {err}");
            }
        }
    }

    fn shared_bot(&self, bot_id: Uuid) -> Result<Arc<RwLock<Bot>>, RegistryError> {
        self.bots
            .get(&bot_id)
            .map(|entry| entry.value().clone())
            .ok_or(RegistryError::BotNotFound(bot_id))
    }

    async fn persist(&self, bot: &Arc<RwLock<Bot>>) {
        let snapshot = bot.read().clone();
        if let Err(err) = self.store.save_bot(&snapshot).await {
            warn!(bot = %snapshot.name, "failed to persist bot state: {err:#}");
        }
    }
}
