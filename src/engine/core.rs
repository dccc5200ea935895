// 8.0 engine/core.rs: main engine. deploys one pool with its tokens and ledgers and owns them all.
// every state-changing call runs through `atomically`: all or nothing, events on commit only.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::config::{PoolConfig, PoolParams};
use crate::events::{Event, EventId, EventPayload, PoolInitializedEvent, PositionLifecycleEvent};
use crate::factory::CloneFactory;
use crate::funding::{FundingModel, LinearFunding};
use crate::liquidity_ledger::LiquidityLedger;
use crate::oracle::OracleVerifier;
use crate::pool::{PerpetualPool, PoolAddresses, PoolError, StateValues};
use crate::position::Position;
use crate::position_ledger::PositionLedger;
use crate::qualifier::LiquidatorQualifier;
use crate::token::{TokenLedger, TokenSpec};
use crate::types::{Address, Fixed, Timestamp};
use tracing::{debug, info, warn};

/// Everything a call may mutate. cloned before each call and restored if it fails.
#[derive(Debug, Clone)]
pub(super) struct Ledgers {
    pub(super) pool: PerpetualPool,
    pub(super) collateral: TokenLedger,
    pub(super) stake: TokenLedger,
    pub(super) positions: PositionLedger,
    pub(super) shares: LiquidityLedger,
    pub(super) qualifier: LiquidatorQualifier,
}

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) admin: Address,
    pub(super) params: PoolParams,
    pub(super) ledgers: Ledgers,
    pub(super) factory: CloneFactory,
    pub(super) oracle: OracleVerifier,
    pub(super) funding_model: Box<dyn FundingModel>,
    pub(super) events: Vec<Event>,
    pub(super) pending: Vec<EventPayload>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

fn derive(symbol: &str, role: &str) -> Address {
    Address::derive(&format!("{}/{}", symbol, role))
}

impl Engine {
    pub fn new(config: EngineConfig, pool_config: PoolConfig) -> Result<Self, EngineError> {
        Self::with_funding_model(config, pool_config, Box::new(LinearFunding))
    }

    // 8.1.1: deployment. tokens, a pool cloned from the template, ledgers controlled by the pool
    pub fn with_funding_model(
        config: EngineConfig,
        pool_config: PoolConfig,
        funding_model: Box<dyn FundingModel>,
    ) -> Result<Self, EngineError> {
        pool_config.validate()?;
        let PoolConfig {
            symbol,
            admin,
            oracle_signer,
            collateral,
            stake,
            liquidity_share,
            params,
        } = pool_config;

        let mut factory = CloneFactory::new(derive(&symbol, "factory"));
        let template = PerpetualPool::template(derive(&symbol, "pool-template"));
        let mut pool = factory.clone_template(&template);
        let pool_address = pool.address();

        let collateral = TokenLedger::new(derive(&symbol, "collateral"), collateral, admin);
        let stake = TokenLedger::new(derive(&symbol, "stake"), stake, admin);
        let positions = PositionLedger::new(derive(&symbol, "positions"), pool_address);
        let TokenSpec {
            name: share_name,
            symbol: share_symbol,
            ..
        } = liquidity_share;
        let shares = LiquidityLedger::new(derive(&symbol, "shares"), share_name, share_symbol, pool_address);
        let qualifier = LiquidatorQualifier::new(derive(&symbol, "qualifier"), admin, stake.address());

        let addresses = PoolAddresses {
            collateral: collateral.address(),
            position_ledger: positions.address(),
            liquidity_ledger: shares.address(),
            oracle_signer,
            liquidator_qualifier: qualifier.address(),
        };
        pool.initialize(symbol.clone(), addresses, params.clone(), config.start_time)?;

        info!(
            pool = %pool_address,
            symbol = %symbol,
            funding_model = funding_model.name(),
            "pool deployed"
        );

        let oracle = OracleVerifier::new(symbol.clone(), oracle_signer, params.price_delay_allowance);
        let current_time = config.start_time;
        let mut engine = Self {
            config,
            admin,
            params,
            ledgers: Ledgers {
                pool,
                collateral,
                stake,
                positions,
                shares,
                qualifier,
            },
            factory,
            oracle,
            funding_model,
            events: Vec::new(),
            pending: Vec::new(),
            next_event_id: 1,
            current_time,
        };
        engine.emit_event(EventPayload::PoolInitialized(PoolInitializedEvent {
            pool: pool_address,
            symbol,
            addresses,
        }));
        Ok(engine)
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.plus(secs);
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn params(&self) -> &PoolParams {
        &self.params
    }

    pub fn symbol(&self) -> &str {
        self.oracle.symbol()
    }

    pub fn pool_address(&self) -> Address {
        self.ledgers.pool.address()
    }

    pub fn factory(&self) -> &CloneFactory {
        &self.factory
    }

    pub fn addresses(&self) -> Result<PoolAddresses, EngineError> {
        Ok(self.ledgers.pool.addresses()?)
    }

    pub fn funding_model_name(&self) -> &'static str {
        self.funding_model.name()
    }

    // 8.2: read surface

    pub fn state_values(&self) -> StateValues {
        self.ledgers.pool.state_values()
    }

    pub fn dynamic_equity(&self, price: Fixed) -> Result<Fixed, EngineError> {
        Ok(self.ledgers.pool.dynamic_equity(price)?)
    }

    pub fn position(&self, owner: Address) -> Option<Position> {
        self.ledgers.positions.get(owner).copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = (Address, &Position)> {
        self.ledgers.positions.iter()
    }

    pub fn position_ledger(&self) -> &PositionLedger {
        &self.ledgers.positions
    }

    pub fn share_balance(&self, owner: Address) -> Fixed {
        self.ledgers.shares.balance_of(owner)
    }

    pub fn total_shares(&self) -> Fixed {
        self.ledgers.shares.total_supply()
    }

    pub fn share_ledger(&self) -> &LiquidityLedger {
        &self.ledgers.shares
    }

    pub fn collateral(&self) -> &TokenLedger {
        &self.ledgers.collateral
    }

    pub fn stake_token(&self) -> &TokenLedger {
        &self.ledgers.stake
    }

    pub fn qualifier(&self) -> &LiquidatorQualifier {
        &self.ledgers.qualifier
    }

    pub fn is_qualified(&self, liquidator: Address) -> bool {
        self.ledgers.qualifier.is_qualified(liquidator)
    }

    /// Collateral balance of `owner` in 18-decimal units.
    pub fn collateral_balance(&self, owner: Address) -> Fixed {
        Fixed::from_token_units(self.ledgers.collateral.balance_of(owner), self.collateral_decimals())
    }

    /// Liquidity plus every margin. matches the pool's collateral holdings up to dust.
    pub fn total_value_locked(&self) -> Fixed {
        self.ledgers.pool.liquidity() + self.ledgers.positions.iter().map(|(_, p)| p.margin).sum::<Fixed>()
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    // 8.3: call plumbing

    pub(super) fn collateral_decimals(&self) -> u32 {
        self.ledgers.collateral.decimals()
    }

    pub(super) fn atomically<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let snapshot = self.ledgers.clone();
        self.pending.clear();

        match f(self) {
            Ok(value) => {
                let pending = std::mem::take(&mut self.pending);
                let emitted = pending.len();
                for payload in pending {
                    self.emit_event(payload);
                }
                debug!(op, emitted, time = %self.current_time, "committed");
                Ok(value)
            }
            Err(err) => {
                self.ledgers = snapshot;
                self.pending.clear();
                warn!(op, error = %err, time = %self.current_time, "rejected");
                Err(err)
            }
        }
    }

    /// Rounds an inbound amount to collateral precision and requires it positive.
    pub(super) fn inbound_amount(&self, what: &'static str, amount: Fixed) -> Result<Fixed, EngineError> {
        let amount = amount.round_to_native(self.collateral_decimals());
        if !amount.is_positive() {
            return Err(PoolError::NonPositiveAmount { what, amount }.into());
        }
        Ok(amount)
    }

    fn collateral_units(&self, what: &'static str, amount: Fixed) -> Result<u128, EngineError> {
        amount
            .to_token_units(self.collateral_decimals())
            .ok_or_else(|| PoolError::UnrepresentableAmount { what, amount }.into())
    }

    /// Collateral from `owner` into the pool. needs the owner's allowance.
    pub(super) fn pull_collateral(&mut self, owner: Address, amount: Fixed) -> Result<(), EngineError> {
        let units = self.collateral_units("deposit", amount)?;
        let pool = self.pool_address();
        self.ledgers.collateral.transfer_from(pool, owner, pool, units)?;
        Ok(())
    }

    pub(super) fn push_collateral(&mut self, to: Address, amount: Fixed) -> Result<(), EngineError> {
        let units = self.collateral_units("payout", amount)?;
        let pool = self.pool_address();
        self.ledgers.collateral.transfer(pool, to, units)?;
        Ok(())
    }

    pub(super) fn burn_if_empty(&mut self, owner: Address) -> Result<bool, EngineError> {
        let empty = self.ledgers.positions.get(owner).is_some_and(|p| p.is_empty());
        if empty {
            let pool = self.pool_address();
            self.ledgers.positions.burn(pool, owner)?;
            self.pending.push(EventPayload::PositionBurned(PositionLifecycleEvent { owner }));
        }
        Ok(empty)
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.config.verbose {
            info!(id = event.id.0, kind = event.payload.kind(), payload = ?event.payload, "event");
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
