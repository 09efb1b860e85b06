//! Domain types: candles, signals, positions, trades.

pub mod candle;
pub mod position;
pub mod signal;
pub mod trade;

pub use candle::Candle;
pub use position::{Position, PositionSide, TrailingStopState};
pub use signal::{Direction, Signal};
pub use trade::{ExitReason, Trade};
