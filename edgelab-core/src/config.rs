//! Strategy configuration.
//!
//! All knobs consumed by the pipeline live here as plain structs with
//! defaults. Loading and merging of configuration files is an external
//! collaborator's job; the pipeline only ever sees a resolved
//! `StrategyConfig`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Indicator lookback periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub short_ma: usize,
    pub long_ma: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            short_ma: 7,
            long_ma: 25,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorConfig {
    /// Bars needed before a snapshot (with previous-period values) exists.
    ///
    /// MACD needs `slow + signal` closes to seed both EMAs, RSI needs
    /// `period + 1` closes, and the previous-period copy costs one more bar.
    pub fn warmup(&self) -> usize {
        self.long_ma
            .max(self.rsi_period + 1)
            .max(self.macd_slow + self.macd_signal)
            + 1
    }
}

/// Regime classifier configuration.
///
/// The trend/reversal partitions decide which rule-condition names survive
/// `TrendOnly` / `ReversalOnly` filter modes. Defaults cover the built-in
/// condition set; configs may override either list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub enabled: bool,
    pub trend_conditions: Vec<String>,
    pub reversal_conditions: Vec<String>,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trend_conditions: vec![
                "golden_cross".into(),
                "death_cross".into(),
                "macd_bullish".into(),
                "macd_bearish".into(),
                "histogram_expansion".into(),
                "ma_uptrend".into(),
                "ma_downtrend".into(),
            ],
            reversal_conditions: vec![
                "rsi_oversold".into(),
                "rsi_overbought".into(),
                "below_vwap_lower".into(),
                "above_vwap_upper".into(),
                "below_vwap_lower_2".into(),
                "above_vwap_upper_2".into(),
                "stretched_below_vwap".into(),
                "stretched_above_vwap".into(),
            ],
        }
    }
}

/// Trailing-stop behavior.
///
/// With a positive `offset_pct`, the stop trails at `callback_pct` until
/// unrealized profit reaches the offset, then switches to the tighter
/// `armed_callback_pct`. `only_offset_is_reached` suppresses trailing exits
/// entirely until that transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailingConfig {
    pub enabled: bool,
    pub callback_pct: f64,
    pub offset_pct: f64,
    pub armed_callback_pct: f64,
    pub only_offset_is_reached: bool,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            callback_pct: 0.03,
            offset_pct: 0.0,
            armed_callback_pct: 0.015,
            only_offset_is_reached: false,
        }
    }
}

/// Behavioral circuit breakers, all measured in candle widths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionConfig {
    pub enabled: bool,
    /// Candles with no new entries for a symbol after its own stop-loss.
    pub cooldown_candles: usize,
    /// Stop-loss count that trips the global guard.
    pub max_stop_losses: usize,
    /// Window, in candles, over which stop-losses are counted.
    pub lookback_candles: usize,
    /// Candles to block entries once the guard has tripped.
    pub guard_cooldown_candles: usize,
    /// Count stop-losses across all symbols, not just the candidate.
    pub all_symbols: bool,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_candles: 3,
            max_stop_losses: 3,
            lookback_candles: 48,
            guard_cooldown_candles: 12,
            all_symbols: true,
        }
    }
}

/// Risk-reward and correlation gate thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Minimum reward/risk ratio for entries; `<= 0` disables the gate.
    pub min_rr: f64,
    /// Correlation above which size is halved against held symbols.
    pub correlation_threshold: f64,
    /// Candle window for support/resistance estimation.
    pub sr_window: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_rr: 1.5,
            correlation_threshold: 0.8,
            sr_window: 20,
        }
    }
}

/// One ensemble member: a registry id plus a voting weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleMember {
    pub id: String,
    pub weight: f64,
}

/// Ensemble voting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    pub members: Vec<EnsembleMember>,
    /// Normalized score a direction must reach to win.
    pub threshold: f64,
    /// Require all non-abstaining members to agree before the threshold check.
    pub unanimous: bool,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            threshold: 0.5,
            unanimous: false,
        }
    }
}

/// How signals are produced for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StrategyMode {
    /// Named boolean conditions ANDed per direction.
    RuleBased,
    /// A pluggable strategy resolved from the registry by id.
    Plugin { id: String },
    /// Weighted vote over several registry strategies.
    Ensemble(EnsembleConfig),
}

impl Default for StrategyMode {
    fn default() -> Self {
        Self::RuleBased
    }
}

/// The resolved configuration consumed by every pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub indicators: IndicatorConfig,
    pub mode: StrategyMode,

    /// Rule-condition names per direction; all must hold for a direction
    /// to fire.
    pub buy_conditions: Vec<String>,
    pub sell_conditions: Vec<String>,
    pub short_conditions: Vec<String>,
    pub cover_conditions: Vec<String>,
    pub enable_short: bool,

    pub regime: RegimeConfig,
    pub risk: RiskConfig,
    pub protection: ProtectionConfig,
    pub trailing: TrailingConfig,

    /// Static stop-loss distance as a fraction of entry; `<= 0` disables.
    pub stop_loss_pct: f64,
    /// Static take-profit distance as a fraction of entry; `<= 0` disables.
    pub take_profit_pct: f64,
    /// Minimal-ROI table: minutes held -> required profit fraction.
    /// Lookup is greatest key <= elapsed minutes.
    pub minimal_roi: BTreeMap<u32, f64>,
    /// Force-close after this many minutes; `0` disables.
    pub max_hold_minutes: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfig::default(),
            mode: StrategyMode::RuleBased,
            buy_conditions: vec!["golden_cross".into(), "rsi_oversold".into()],
            sell_conditions: vec!["death_cross".into()],
            short_conditions: Vec::new(),
            cover_conditions: Vec::new(),
            enable_short: false,
            regime: RegimeConfig::default(),
            risk: RiskConfig::default(),
            protection: ProtectionConfig::default(),
            trailing: TrailingConfig::default(),
            stop_loss_pct: 0.05,
            take_profit_pct: 0.10,
            minimal_roi: BTreeMap::new(),
            max_hold_minutes: 0,
        }
    }
}
