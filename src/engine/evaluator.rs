//! Strategy evaluation
//!
//! A pure decision function: (strategy, tick, last execution, now) in,
//! buy/sell/hold out. Cooldown suppression happens in the runner before
//! this is called, keeping the function directly unit-testable. Missing
//! optional thresholds mean the condition never triggers; nothing here
//! errors for normal inputs.

use chrono::{DateTime, Utc};

use crate::feed::PriceTick;
use crate::state::{Strategy, TradeAction};

pub fn evaluate(
    strategy: &Strategy,
    tick: &PriceTick,
    last_execution_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TradeAction {
    match strategy {
        // Buy check first: when both sides could match at once, the
        // accumulate-on-dips bias wins.
        Strategy::PriceThreshold {
            buy_threshold,
            sell_threshold,
        } => {
            if matches!(buy_threshold, Some(buy) if tick.price <= *buy) {
                TradeAction::Buy
            } else if matches!(sell_threshold, Some(sell) if tick.price >= *sell) {
                TradeAction::Sell
            } else {
                TradeAction::Hold
            }
        }

        Strategy::PriceRange {
            min_price,
            max_price,
        } => {
            if matches!(min_price, Some(min) if tick.price <= *min) {
                TradeAction::Buy
            } else if matches!(max_price, Some(max) if tick.price >= *max) {
                TradeAction::Sell
            } else {
                TradeAction::Hold
            }
        }

        // Interval bots always buy (dollar-cost averaging); they never
        // alternate into sells. A bot that has not executed yet is due
        // on its first tick.
        Strategy::Interval { interval } => {
            let due = match last_execution_at {
                None => true,
                Some(last) => {
                    let elapsed = now.signed_duration_since(last).num_milliseconds();
                    elapsed >= interval.as_millis() as i64
                }
            };
            if due {
                TradeAction::Buy
            } else {
                TradeAction::Hold
            }
        }

        Strategy::Custom => TradeAction::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::IntervalSpec;
    use chrono::Duration;

    fn tick(price: f64) -> PriceTick {
        PriceTick {
            timestamp: Utc::now(),
            price,
            symbol: "ETH".into(),
        }
    }

    fn threshold(buy: Option<f64>, sell: Option<f64>) -> Strategy {
        Strategy::PriceThreshold {
            buy_threshold: buy,
            sell_threshold: sell,
        }
    }

    #[test]
    fn buys_at_or_below_the_buy_threshold() {
        let strategy = threshold(Some(3000.0), Some(4000.0));
        let now = Utc::now();

        assert_eq!(
            evaluate(&strategy, &tick(2999.0), None, now),
            TradeAction::Buy
        );
        assert_eq!(
            evaluate(&strategy, &tick(3000.0), None, now),
            TradeAction::Buy
        );
        assert_eq!(
            evaluate(&strategy, &tick(3500.0), None, now),
            TradeAction::Hold
        );
    }

    #[test]
    fn sells_at_or_above_the_sell_threshold() {
        let strategy = threshold(Some(3000.0), Some(4000.0));
        let now = Utc::now();

        assert_eq!(
            evaluate(&strategy, &tick(4000.0), None, now),
            TradeAction::Sell
        );
        assert_eq!(
            evaluate(&strategy, &tick(4500.0), None, now),
            TradeAction::Sell
        );
    }

    #[test]
    fn missing_thresholds_never_trigger() {
        let now = Utc::now();

        // No sell threshold: high prices hold.
        assert_eq!(
            evaluate(&threshold(Some(3000.0), None), &tick(3001.0), None, now),
            TradeAction::Hold
        );
        // No buy threshold: low prices hold.
        assert_eq!(
            evaluate(&threshold(None, Some(4000.0)), &tick(100.0), None, now),
            TradeAction::Hold
        );
        // Neither: always hold.
        assert_eq!(
            evaluate(&threshold(None, None), &tick(100.0), None, now),
            TradeAction::Hold
        );
    }

    #[test]
    fn buy_wins_when_both_thresholds_match() {
        // Overlapping thresholds: a price satisfying both sides buys.
        let strategy = threshold(Some(3000.0), Some(2500.0));
        assert_eq!(
            evaluate(&strategy, &tick(2800.0), None, Utc::now()),
            TradeAction::Buy
        );
    }

    #[test]
    fn range_buys_low_and_sells_high() {
        let strategy = Strategy::PriceRange {
            min_price: Some(100.0),
            max_price: Some(200.0),
        };
        let now = Utc::now();

        assert_eq!(evaluate(&strategy, &tick(95.0), None, now), TradeAction::Buy);
        assert_eq!(
            evaluate(&strategy, &tick(150.0), None, now),
            TradeAction::Hold
        );
        assert_eq!(
            evaluate(&strategy, &tick(210.0), None, now),
            TradeAction::Sell
        );
    }

    #[test]
    fn interval_fires_exactly_on_the_boundary() {
        let strategy = Strategy::Interval {
            interval: IntervalSpec::Millis(60_000),
        };
        let t0 = Utc::now();

        assert_eq!(
            evaluate(
                &strategy,
                &tick(100.0),
                Some(t0),
                t0 + Duration::milliseconds(59_999)
            ),
            TradeAction::Hold
        );
        assert_eq!(
            evaluate(
                &strategy,
                &tick(100.0),
                Some(t0),
                t0 + Duration::milliseconds(60_000)
            ),
            TradeAction::Buy
        );
    }

    #[test]
    fn interval_is_due_on_first_tick_after_activation() {
        let strategy = Strategy::Interval {
            interval: IntervalSpec::Text("1h".into()),
        };
        assert_eq!(
            evaluate(&strategy, &tick(100.0), None, Utc::now()),
            TradeAction::Buy
        );
    }

    #[test]
    fn interval_never_sells() {
        let strategy = Strategy::Interval {
            interval: IntervalSpec::Millis(1),
        };
        let t0 = Utc::now();
        // Even wildly overdue, the action is a buy.
        assert_eq!(
            evaluate(&strategy, &tick(100.0), Some(t0), t0 + Duration::hours(5)),
            TradeAction::Buy
        );
    }

    #[test]
    fn unparseable_interval_uses_the_one_minute_default() {
        let strategy = Strategy::Interval {
            interval: IntervalSpec::Text("banana".into()),
        };
        let t0 = Utc::now();

        assert_eq!(
            evaluate(
                &strategy,
                &tick(100.0),
                Some(t0),
                t0 + Duration::milliseconds(59_000)
            ),
            TradeAction::Hold
        );
        assert_eq!(
            evaluate(
                &strategy,
                &tick(100.0),
                Some(t0),
                t0 + Duration::milliseconds(60_000)
            ),
            TradeAction::Buy
        );
    }

    #[test]
    fn custom_strategies_always_hold() {
        assert_eq!(
            evaluate(&Strategy::Custom, &tick(0.01), None, Utc::now()),
            TradeAction::Hold
        );
    }
}
