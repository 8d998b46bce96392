//! Per-bot tick loop
//!
//! One task per active bot, owning its feed subscription. Ticks for a
//! bot are handled strictly in sequence: a trade in flight blocks the
//! next tick for that bot only. Different bots run in their own tasks
//! and never wait on each other.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::feed::{FeedEvent, PriceFeed};
use crate::state::{
    Bot, CooldownTracker, ExecutionJournal, ExecutionLogEntry, PriceHistory, TradeAction,
};

use super::evaluator::evaluate;
use super::executor::TradeExecutor;

/// Everything a runner task needs, wired by the registry.
pub(crate) struct RunnerContext {
    pub bot: Arc<RwLock<Bot>>,
    pub feed: Arc<dyn PriceFeed>,
    pub history: Arc<PriceHistory>,
    pub cooldowns: Arc<CooldownTracker>,
    pub journal: Arc<ExecutionJournal>,
    pub executor: Arc<TradeExecutor>,
}

pub(crate) async fn run_bot(ctx: RunnerContext) {
    let (bot_id, bot_name, symbol) = {
        let b = ctx.bot.read();
        (b.id, b.name.clone(), b.target_coin.clone())
    };

    let mut subscription = match ctx.feed.subscribe(&symbol).await {
        Ok(subscription) => subscription,
        Err(err) => {
            error!(bot = %bot_name, %symbol, "feed subscription failed: {err}");
            ctx.journal
                .append(feed_incident(bot_id, format!("feed subscription failed: {err}")));
            return;
        }
    };

    info!(bot = %bot_name, %symbol, "📡 streaming ticks");

    while let Some(event) = subscription.next_event().await {
        match event {
            FeedEvent::Tick(tick) => {
                ctx.history.record(tick.clone());

                let now = Utc::now();
                if let Some(remaining) = ctx.cooldowns.remaining_ms(bot_id, now) {
                    debug!(
                        bot = %bot_name,
                        "⏳ in cooldown for {}s after previous failure",
                        (remaining + 999) / 1000
                    );
                    continue;
                }

                let action = {
                    let b = ctx.bot.read();
                    // Deactivation may have flipped the flag while this
                    // tick was queued; never trade past it.
                    if !b.is_active {
                        break;
                    }
                    evaluate(&b.strategy, &tick, b.last_execution_at, now)
                };

                if action != TradeAction::Hold {
                    ctx.executor.execute(&ctx.bot, action, &tick).await;
                }
            }
            FeedEvent::Terminated(err) => {
                // The bot stays active but feedless; callers observe the
                // degraded state through the journal.
                error!(bot = %bot_name, %symbol, "price feed terminated: {err}");
                ctx.journal
                    .append(feed_incident(bot_id, format!("price feed terminated: {err}")));
                break;
            }
        }
    }

    debug!(bot = %bot_name, "tick loop ended");
}

fn feed_incident(bot_id: Uuid, error: String) -> ExecutionLogEntry {
    ExecutionLogEntry {
        bot_id,
        timestamp: Utc::now(),
        action: TradeAction::Hold,
        price: 0.0,
        amount: None,
        tx_hash: None,
        success: false,
        error: Some(error),
    }
}
