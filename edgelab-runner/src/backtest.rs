//! Candle-replay backtest runner.
//!
//! Replays a candle series through the same `process_signal` pipeline the
//! live loop uses, simulating fills with a simple cost model (taker fee,
//! slippage, half-spread). Signal-driven entries and exits can optionally
//! fill at the next candle's open instead of the current close; price-
//! triggered exits (stops, targets, ROI) always fill on the tick that
//! reached them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edgelab_core::config::StrategyConfig;
use edgelab_core::domain::{Candle, Direction, ExitReason, Position, PositionSide, Trade};
use edgelab_core::error::SignalError;
use edgelab_core::lifecycle::{evaluate_tick, open_position};
use edgelab_core::pipeline::{process_signal, PipelineContext};
use edgelab_core::signal::{build_detector, StrategyRegistry};
use edgelab_core::state::{MemoryStateStore, StateStore};

use crate::metrics::Metrics;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("no candles supplied")]
    NoCandles,
    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// Execution parameters for a simulated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_equity: f64,
    /// Taker fee as a fraction of notional, charged per side.
    pub fee_rate: f64,
    /// Adverse fill deviation as a fraction of price, per side.
    pub slippage_pct: f64,
    /// Full bid-ask spread in basis points; each fill pays half.
    pub spread_bps: f64,
    /// When true, signal fills happen at the next candle's open.
    pub execute_on_next_open: bool,
    /// Fraction of current equity committed per entry, before any
    /// risk-gate size reduction.
    pub position_size_pct: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_equity: 10_000.0,
            fee_rate: 0.001,
            slippage_pct: 0.0005,
            spread_bps: 0.0,
            execute_on_next_open: false,
            position_size_pct: 1.0,
        }
    }
}

/// One mark-to-market sample, taken at every candle close.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub equity: f64,
}

/// Everything produced by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: StrategyConfig,
    pub backtest: BacktestConfig,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
}

/// A signal-driven action waiting for the next candle's open.
#[derive(Debug, Clone, Copy)]
enum PendingAction {
    Open { side: PositionSide, size_ratio: f64 },
    Close,
}

/// Drives candle windows through the signal pipeline and the position
/// lifecycle, producing a trade ledger, equity curve, and metrics.
pub struct BacktestRunner<'a> {
    registry: &'a StrategyRegistry,
    config: BacktestConfig,
}

impl<'a> BacktestRunner<'a> {
    pub fn new(registry: &'a StrategyRegistry, config: BacktestConfig) -> Self {
        Self { registry, config }
    }

    /// Replay `candles` under `strategy`, returning the full result.
    ///
    /// Any open position at the end of the series is force-closed at the
    /// final close so the ledger always balances.
    pub fn run(
        &self,
        symbol: &str,
        candles: &[Candle],
        strategy: &StrategyConfig,
    ) -> Result<BacktestResult, BacktestError> {
        if candles.is_empty() {
            return Err(BacktestError::NoCandles);
        }
        let state = MemoryStateStore::new();
        let detector = build_detector(strategy, self.registry)?;

        let mut equity = self.config.initial_equity;
        let mut position: Option<Position> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(candles.len());
        let mut pending: Option<PendingAction> = None;

        for i in 0..candles.len() {
            let candle = &candles[i];
            let now = candle.close_time;

            // Fill any action queued on the previous candle at this open.
            match pending.take() {
                Some(PendingAction::Open { side, size_ratio }) if position.is_none() => {
                    position = Some(self.open(
                        symbol,
                        side,
                        candle.open,
                        size_ratio,
                        equity,
                        candle.open_time,
                        strategy,
                    ));
                }
                Some(PendingAction::Close) => {
                    if let Some(pos) = position.take() {
                        let trade = self.close(
                            &pos,
                            candle.open,
                            candle.open_time,
                            ExitReason::ExitSignal,
                            &state,
                        );
                        equity += trade.pnl;
                        trades.push(trade);
                    }
                }
                _ => {}
            }

            let ctx = PipelineContext {
                registry: self.registry,
                state: &state,
                current_side: position.as_ref().map(|p| p.side),
                held: None,
                pivots: None,
                externals: Default::default(),
            };
            let window = &candles[..=i];
            let outcome = process_signal(symbol, window, strategy, &ctx, &trades)?;

            if let Some(mut pos) = position.take() {
                let custom_exit = outcome
                    .indicators
                    .as_ref()
                    .and_then(|snap| detector.should_exit(&pos, candle.close, snap));
                if let Some(reason) = &custom_exit {
                    log::debug!("{} strategy exit: {reason}", pos.symbol);
                }
                let signal_exit = matches!(
                    (pos.side, outcome.signal.direction),
                    (PositionSide::Long, Direction::Sell)
                        | (PositionSide::Short, Direction::Cover)
                );

                if custom_exit.is_some() || signal_exit {
                    if self.config.execute_on_next_open && i + 1 < candles.len() {
                        pending = Some(PendingAction::Close);
                        position = Some(pos);
                    } else {
                        let trade = self.close(&pos, candle.close, now, ExitReason::ExitSignal, &state);
                        equity += trade.pnl;
                        trades.push(trade);
                    }
                } else if let Some(trigger) = evaluate_tick(&mut pos, candle.close, now, strategy)
                {
                    // Price-triggered exits never wait for the next open.
                    let trade = self.close(&pos, trigger.price, now, trigger.reason, &state);
                    equity += trade.pnl;
                    trades.push(trade);
                } else {
                    position = Some(pos);
                }
            } else if outcome.opens_position() {
                let side = match outcome.signal.direction {
                    Direction::Short => PositionSide::Short,
                    _ => PositionSide::Long,
                };
                let size_ratio = outcome.risk.size_ratio;
                if self.config.execute_on_next_open {
                    if i + 1 < candles.len() {
                        pending = Some(PendingAction::Open { side, size_ratio });
                    }
                } else {
                    position = Some(self.open(
                        symbol,
                        side,
                        candle.close,
                        size_ratio,
                        equity,
                        now,
                        strategy,
                    ));
                }
            }

            equity_curve.push(EquityPoint {
                time: now,
                equity: equity + position.as_ref().map_or(0.0, |p| unrealized(p, candle.close)),
            });
        }

        if let Some(pos) = position.take() {
            // Forced liquidation at the end of the series.
            let last = &candles[candles.len() - 1];
            let trade = self.close(&pos, last.close, last.close_time, ExitReason::Forced, &state);
            equity += trade.pnl;
            trades.push(trade);
            if let Some(point) = equity_curve.last_mut() {
                point.equity = equity;
            }
        }

        let metrics = Metrics::compute(&trades, self.config.initial_equity, &equity_curve);
        Ok(BacktestResult {
            symbol: symbol.to_string(),
            strategy: strategy.clone(),
            backtest: self.config.clone(),
            trades,
            equity_curve,
            metrics,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn open(
        &self,
        symbol: &str,
        side: PositionSide,
        price: f64,
        size_ratio: f64,
        equity: f64,
        time: DateTime<Utc>,
        strategy: &StrategyConfig,
    ) -> Position {
        let fill = self.fill_price(price, matches!(side, PositionSide::Long));
        let notional = equity * self.config.position_size_pct * size_ratio.clamp(0.0, 1.0);
        let quantity = if fill > 0.0 { notional / fill } else { 0.0 };
        open_position(symbol, side, fill, quantity, time, strategy)
    }

    fn close(
        &self,
        position: &Position,
        price: f64,
        time: DateTime<Utc>,
        reason: ExitReason,
        state: &dyn StateStore,
    ) -> Trade {
        // Closing a long sells, closing a short buys back.
        let fill = self.fill_price(price, matches!(position.side, PositionSide::Short));
        let fees = self.config.fee_rate
            * position.quantity
            * (position.entry_price + fill);
        let trade = Trade::from_exit(
            &position.symbol,
            position.side,
            position.entry_time,
            position.entry_price,
            time,
            fill,
            position.quantity,
            fees,
            reason,
        );
        // Strategies can read the running loss streak during detection.
        if trade.is_winner() {
            state.set(&trade.symbol, "loss_streak", 0.0);
        } else {
            state.increment(&trade.symbol, "loss_streak", 1.0);
        }
        trade
    }

    /// Slippage and half-spread always move the fill against the taker.
    fn fill_price(&self, price: f64, is_buy: bool) -> f64 {
        let adverse = self.config.slippage_pct + self.config.spread_bps / 2.0 / 10_000.0;
        if is_buy {
            price * (1.0 + adverse)
        } else {
            price * (1.0 - adverse)
        }
    }
}

fn unrealized(position: &Position, price: f64) -> f64 {
    match position.side {
        PositionSide::Long => (price - position.entry_price) * position.quantity,
        PositionSide::Short => (position.entry_price - price) * position.quantity,
    }
}
