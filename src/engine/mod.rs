// 8.0: settlement engine. owns the pool, its ledgers and its tokens, and runs every operation
// on them: liquidity, margin, trades, funding, liquidations and staking.
// deterministic and event-driven with no external I/O. each call commits whole or not at all.

mod config;
mod core;
mod funding;
mod liquidations;
mod liquidity;
mod margin;
mod positions;
mod results;
mod staking;
mod tokens;
mod trading;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{
    AddLiquidityResult, EngineError, LiquidationResult, MarginResult, RemoveLiquidityResult, TradeResult,
};
