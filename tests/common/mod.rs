//! Shared setup for the integration tests: a BTCUSD pool, a signing oracle and funded accounts.

#![allow(dead_code)]

use perps_pool::*;

pub const ORACLE_SECRET: [u8; 32] = [0x11; 32];
pub const START: u64 = 1_600_000_000;
// native USDT units each funded account starts with
pub const REVENUE: i64 = 1_000_000;

pub fn fx(value: i64) -> Fixed {
    Fixed::from_int(value)
}

pub struct Harness {
    pub engine: Engine,
    pub signer: OracleSigner,
    pub admin: Address,
    pub price: Fixed,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_params(PoolParams::btcusd())
    }

    pub fn with_params(params: PoolParams) -> Self {
        let signer = OracleSigner::from_secret(&ORACLE_SECRET).unwrap();
        let admin = Address::derive("account1");
        let mut config = PoolConfig::btcusd(admin, signer.address());
        config.params = params;
        let engine = Engine::new(
            EngineConfig {
                start_time: Timestamp::from_secs(START),
                ..EngineConfig::default()
            },
            config,
        )
        .unwrap();
        Self {
            engine,
            signer,
            admin,
            price: fx(10_000),
        }
    }

    /// Oracle price at the engine clock.
    pub fn signed(&self) -> SignedPrice {
        self.signer.sign(self.engine.symbol(), self.engine.time(), self.price)
    }

    pub fn set_price(&mut self, price: i64) {
        self.price = fx(price);
    }

    /// Address with REVENUE collateral and an open allowance to the pool.
    pub fn account(&mut self, label: &str) -> Address {
        let account = Address::derive(label);
        self.engine.mint_collateral(self.admin, account, fx(REVENUE)).unwrap();
        self.engine.approve_collateral(account, fx(1_000_000_000_000)).unwrap();
        account
    }

    pub fn stake(&mut self, staker: Address, amount: u128) -> Result<u128, EngineError> {
        self.engine.mint_stake(self.admin, staker, amount)?;
        let allowance = self.engine.stake_token().allowance(staker, self.engine.qualifier().address());
        self.engine.approve_stake(staker, allowance + amount)?;
        self.engine.stake(staker, amount)
    }

    pub fn add_liquidity(&mut self, who: Address, amount: Fixed) -> Result<AddLiquidityResult, EngineError> {
        let signed = self.signed();
        self.engine.add_liquidity(who, amount, &signed)
    }

    pub fn remove_liquidity(&mut self, who: Address, shares: Fixed) -> Result<RemoveLiquidityResult, EngineError> {
        let signed = self.signed();
        self.engine.remove_liquidity(who, shares, &signed)
    }

    pub fn deposit_margin(&mut self, who: Address, amount: Fixed) -> Result<MarginResult, EngineError> {
        let signed = self.signed();
        self.engine.deposit_margin(who, amount, &signed)
    }

    pub fn withdraw_margin(&mut self, who: Address, amount: Fixed) -> Result<MarginResult, EngineError> {
        let signed = self.signed();
        self.engine.withdraw_margin(who, amount, &signed)
    }

    pub fn trade(&mut self, who: Address, volume: Fixed) -> Result<TradeResult, EngineError> {
        let signed = self.signed();
        self.engine.trade(who, volume, &signed)
    }

    pub fn trade_with_margin(&mut self, who: Address, volume: Fixed, margin: Fixed) -> Result<TradeResult, EngineError> {
        let signed = self.signed();
        self.engine.trade_with_margin(who, volume, margin, &signed)
    }

    pub fn liquidate(&mut self, liquidator: Address, owner: Address) -> Result<LiquidationResult, EngineError> {
        let signed = self.signed();
        self.engine.liquidate(liquidator, owner, &signed)
    }

    pub fn pool_balance(&self) -> Fixed {
        self.engine.collateral_balance(self.engine.pool_address())
    }

    pub fn margin_of(&self, who: Address) -> Fixed {
        self.engine.position(who).map(|p| p.margin).unwrap_or(Fixed::ZERO)
    }
}

/// Everything a pool-level assertion compares before and after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub state: StateValues,
    pub position: Position,
    pub account_balance: Fixed,
    pub pool_balance: Fixed,
    pub shares: Fixed,
    pub total_shares: Fixed,
}

pub fn snapshot(h: &Harness, who: Address) -> Snapshot {
    Snapshot {
        state: h.engine.state_values(),
        position: h.engine.position(who).unwrap_or_default(),
        account_balance: h.engine.collateral_balance(who),
        pool_balance: h.pool_balance(),
        shares: h.engine.share_balance(who),
        total_shares: h.engine.total_shares(),
    }
}
