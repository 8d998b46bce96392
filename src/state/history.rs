//! Process-wide rolling price history

use parking_lot::RwLock;
use std::collections::VecDeque;

use crate::feed::PriceTick;

/// Maximum retained ticks; oldest are evicted first.
pub const PRICE_HISTORY_CAP: usize = 1000;

/// Bounded, append-only tick buffer shared by all bots. Single writer
/// (the feed side), many readers; readers always get owned snapshots so
/// an in-flight evaluation never observes a mid-update view.
pub struct PriceHistory {
    ticks: RwLock<VecDeque<PriceTick>>,
    cap: usize,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::with_capacity(PRICE_HISTORY_CAP)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            ticks: RwLock::new(VecDeque::with_capacity(cap.min(PRICE_HISTORY_CAP))),
            cap,
        }
    }

    pub fn record(&self, tick: PriceTick) {
        let mut ticks = self.ticks.write();
        ticks.push_back(tick);
        while ticks.len() > self.cap {
            ticks.pop_front();
        }
    }

    /// The last `n` ticks in time order, or fewer if unavailable.
    pub fn recent(&self, n: usize) -> Vec<PriceTick> {
        let ticks = self.ticks.read();
        let skip = ticks.len().saturating_sub(n);
        ticks.iter().skip(skip).cloned().collect()
    }

    /// Full copy of the buffer in time order.
    pub fn snapshot(&self) -> Vec<PriceTick> {
        self.ticks.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ticks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.read().is_empty()
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new()
    }
}
