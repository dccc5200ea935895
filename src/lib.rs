// perps-pool: perpetual futures settlement against a pooled-liquidity vault.
// solvency-first: liquidity plus trader margin only moves by fees and boundary rounding.
// all arithmetic is 18-decimal fixed point on 256-bit integers, no floats anywhere.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Fixed, Address, Timestamp, rescaling, keccak
//   2.x  oracle.rs: signed price verification (secp256k1 recovery, freshness window)
//   3.x  token.rs: fungible token ledger for collateral, stake and shares
//   4.x  position.rs: position record, cost basis algorithm
//   4.5  position_ledger.rs: one position per owner, arena storage
//   5.x  funding.rs: pluggable funding model, cumulative funding index
//   6.x  margin.rs: initial/maintenance/pool margin checks
//   6.0  liquidation.rs: liquidation detection and settlement math
//   6.1  qualifier.rs: stake-ranked liquidation rights
//   7.x  config.rs: pool params, token specs, TOML loading, presets
//   8.x  engine/: settlement engine: liquidity, margin, trades, funding, liquidations
//   8.x  pool.rs: pool state and one-time initialization
//   9.1  factory.rs: clone factory for pool templates
//   9.3  liquidity_ledger.rs: LP share token
//   9.4  api.rs: command/query message surface
//   9.5  service.rs: tokio actor owning the engine
//   11.x events.rs: state transition events for audit

// settlement core
pub mod engine;
pub mod events;
pub mod funding;
pub mod liquidation;
pub mod margin;
pub mod pool;
pub mod position;
pub mod types;

// ledgers and collaborators
pub mod factory;
pub mod liquidity_ledger;
pub mod oracle;
pub mod position_ledger;
pub mod qualifier;
pub mod token;

// integration modules
pub mod api;
pub mod config;
pub mod service;

// re exports for convenience
pub use engine::*;
pub use events::*;
pub use funding::*;
pub use liquidation::*;
pub use margin::*;
pub use pool::*;
pub use position::*;
pub use types::*;
pub use api::{ApiError, ApiResponse, Command, ErrorCode, Query};
pub use config::{ConfigError, PoolConfig, PoolParams};
pub use factory::CloneFactory;
pub use liquidity_ledger::LiquidityLedger;
pub use oracle::{OracleError, OracleSignature, OracleSigner, OracleVerifier, SignedPrice};
pub use position_ledger::{PositionLedger, PositionLedgerError};
pub use qualifier::{LiquidatorQualifier, QualifierError};
pub use service::{PoolHandle, ServiceError};
pub use token::{TokenError, TokenLedger, TokenSpec};
