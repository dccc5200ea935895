//! Perpetual pool simulation.
//!
//! Runs the settlement engine through liquidity provision, trading against the pool, funding
//! accrual and a liquidation race between stakers. Set RUST_LOG=perps_pool=debug to watch
//! every commit and rejection.

use perps_pool::*;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

struct Sim {
    engine: Engine,
    signer: OracleSigner,
    admin: Address,
}

impl Sim {
    fn new() -> Result<Self, EngineError> {
        let signer = OracleSigner::from_secret(&[0x42; 32])?;
        let admin = Address::derive("admin");
        let engine = Engine::new(
            EngineConfig {
                start_time: Timestamp::now(),
                ..EngineConfig::default()
            },
            PoolConfig::btcusd(admin, signer.address()),
        )?;
        Ok(Self { engine, signer, admin })
    }

    fn price(&self, price: i64) -> SignedPrice {
        self.signer.sign(self.engine.symbol(), self.engine.time(), Fixed::from_int(price))
    }

    fn fund(&mut self, who: Address, amount: i64) -> Result<(), EngineError> {
        self.engine.mint_collateral(self.admin, who, Fixed::from_int(amount))?;
        self.engine.approve_collateral(who, Fixed::from_int(amount))
    }
}

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("perps_pool=warn")))
        .init();

    println!("Perpetual Pool Settlement Simulation");
    println!("BTCUSD, pooled liquidity counterparty, signed oracle prices\n");

    scenario_1_liquidity()?;
    scenario_2_trading()?;
    scenario_3_funding()?;
    scenario_4_liquidation_race()?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

/// Two providers share the pool, one leaves early and pays the redemption fee.
fn scenario_1_liquidity() -> Result<(), EngineError> {
    println!("Scenario 1: Liquidity Provision\n");

    let mut sim = Sim::new()?;
    let alice = Address::derive("alice");
    let bob = Address::derive("bob");
    sim.fund(alice, 10_000)?;
    sim.fund(bob, 5_000)?;

    let added = sim.engine.add_liquidity(alice, Fixed::from_int(10_000), &sim.price(10_000))?;
    println!("  Alice adds {} for {} shares", added.amount, added.shares);
    let added = sim.engine.add_liquidity(bob, Fixed::from_int(5_000), &sim.price(10_000))?;
    println!("  Bob adds {} for {} shares", added.amount, added.shares);

    let removed = sim.engine.remove_liquidity(bob, Fixed::from_int(2_000), &sim.price(10_000))?;
    println!(
        "  Bob redeems {} shares: receives {}, fee {} stays in the pool",
        removed.shares, removed.amount, removed.redemption_fee
    );

    let state = sim.engine.state_values();
    println!("  Pool liquidity {}, total shares {}\n", state.liquidity, sim.engine.total_shares());
    Ok(())
}

/// Open, reduce and flip a position while the price moves.
fn scenario_2_trading() -> Result<(), EngineError> {
    println!("Scenario 2: Trading Against the Pool\n");

    let mut sim = Sim::new()?;
    let lp = Address::derive("lp");
    let trader = Address::derive("trader");
    sim.fund(lp, 10_000)?;
    sim.fund(trader, 1_000)?;
    sim.engine.add_liquidity(lp, Fixed::from_int(10_000), &sim.price(10_000))?;
    sim.engine.deposit_margin(trader, Fixed::from_int(1_000), &sim.price(10_000))?;

    let steps: [(i64, i64); 4] = [(111, 10_000), (-100, 12_000), (-33, 12_000), (22, 12_000)];
    for (volume, price) in steps {
        let result = sim.engine.trade(trader, Fixed::from_int(volume), &sim.price(price))?;
        let position = result.position.unwrap_or_default();
        println!(
            "  Trade {:>4} @ {}: fee {}, realized {}, volume {}, cost {}, margin {}",
            volume, price, result.fee, result.realized_cost, position.volume, position.cost, position.margin
        );
    }

    let state = sim.engine.state_values();
    println!(
        "  Pool: liquidity {}, net volume {}, net cost {}",
        state.liquidity, state.traders_net_volume, state.traders_net_cost
    );
    println!("  Pool dynamic equity @ 12000: {}\n", sim.engine.dynamic_equity(Fixed::from_int(12_000))?);
    Ok(())
}

/// A lone long pays funding into liquidity as time passes.
fn scenario_3_funding() -> Result<(), EngineError> {
    println!("Scenario 3: Funding Accrual\n");

    let mut sim = Sim::new()?;
    let lp = Address::derive("lp");
    let trader = Address::derive("trader");
    sim.fund(lp, 100_000)?;
    sim.fund(trader, 10_000)?;
    sim.engine.add_liquidity(lp, Fixed::from_int(100_000), &sim.price(10_000))?;
    sim.engine.trade_with_margin(trader, Fixed::from_int(100), Fixed::from_int(1_000), &sim.price(10_000))?;

    let margin_before = sim.engine.position(trader).unwrap_or_default().margin;
    println!(
        "  Long 100 contracts @ 10000, margin {}, {} funding",
        margin_before,
        sim.engine.funding_model_name()
    );

    for minute in 1..=3 {
        sim.engine.advance_time(60);
        let result = sim.engine.deposit_margin(trader, Fixed::from_decimal(dec!(0.000001)), &sim.price(10_000))?;
        let state = sim.engine.state_values();
        println!(
            "  Minute {}: funding paid {}, cumulative rate {}",
            minute, result.funding_paid, state.cumulative_funding_rate
        );
    }

    let margin_after = sim.engine.position(trader).unwrap_or_default().margin;
    println!("  Margin {} -> {}, pool liquidity {}\n", margin_before, margin_after, sim.engine.state_values().liquidity);
    Ok(())
}

/// Only the single largest staker may liquidate.
fn scenario_4_liquidation_race() -> Result<(), EngineError> {
    println!("Scenario 4: Liquidation Race\n");

    let mut sim = Sim::new()?;
    let lp = Address::derive("lp");
    let trader = Address::derive("trader");
    let keeper_a = Address::derive("keeper-a");
    let keeper_b = Address::derive("keeper-b");
    sim.fund(lp, 10_000)?;
    sim.fund(trader, 100)?;
    sim.engine.add_liquidity(lp, Fixed::from_int(10_000), &sim.price(10_000))?;

    let one = 10u128.pow(18);
    for (keeper, stake) in [(keeper_a, 1_000 * one), (keeper_b, 2_000 * one)] {
        sim.engine.mint_stake(sim.admin, keeper, stake)?;
        sim.engine.approve_stake(keeper, stake)?;
        sim.engine.stake(keeper, stake)?;
    }
    println!("  keeper-a stakes 1000, keeper-b stakes 2000");

    sim.engine.trade_with_margin(trader, Fixed::from_int(500), Fixed::from_int(100), &sim.price(10_000))?;
    println!("  Trader opens 500 long @ 10000 on 100 margin");

    let crash = sim.price(5_000);
    match sim.engine.liquidate(keeper_a, trader, &crash) {
        Ok(_) => println!("  keeper-a liquidated (unexpected)"),
        Err(err) => println!("  keeper-a rejected: {}", err),
    }

    let result = sim.engine.liquidate(keeper_b, trader, &crash)?;
    println!(
        "  keeper-b liquidates @ {}: remaining margin {}, reward {}, shortfall {}",
        result.price, result.remaining_margin, result.reward, result.shortfall
    );
    println!(
        "  Pool liquidity {}, keeper-b collateral {}",
        sim.engine.state_values().liquidity,
        sim.engine.collateral_balance(keeper_b)
    );
    Ok(())
}
