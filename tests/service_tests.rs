//! Tests for the pool service task: commands from many handles are applied in order and
//! the engine comes back intact once every handle is gone.

mod common;

use common::*;
use perps_pool::*;

fn signed(h: &Harness, time: Timestamp) -> SignedPrice {
    h.signer.sign(h.engine.symbol(), time, h.price)
}

#[tokio::test]
async fn commands_round_trip_through_the_service() {
    let mut h = Harness::new();
    let lp = h.account("lp");
    let trader = h.account("trader");
    let price = signed(&h, h.engine.time());
    let (handle, task) = service::spawn(h.engine, 16);

    let added = handle
        .execute(Command::AddLiquidity {
            provider: lp,
            amount: fx(10_000),
            price: price.clone(),
        })
        .await
        .unwrap();
    assert!(matches!(added, ApiResponse::LiquidityAdded(ref r) if r.shares == fx(10_000)));

    let traded = handle
        .execute(Command::TradeWithMargin {
            owner: trader,
            volume: fx(100),
            margin: fx(1_000),
            price: price.clone(),
        })
        .await
        .unwrap();
    let trade = match traded {
        ApiResponse::Trade(trade) => trade,
        other => panic!("expected a trade response, got {other:?}"),
    };
    assert_eq!(trade.fee, Fixed::from_ratio(25, 1_000));

    let position = handle.query(Query::Position { owner: trader }).await.unwrap();
    let position = match position {
        ApiResponse::Position(Some(position)) => position,
        other => panic!("expected an open position, got {other:?}"),
    };
    assert_eq!(position.volume, fx(100));

    drop(handle);
    let engine = task.await.unwrap();
    assert_eq!(engine.state_values().liquidity, fx(10_000) + trade.paid);
    assert_eq!(engine.position(trader), Some(position));
}

#[tokio::test]
async fn rejections_come_back_as_api_errors() {
    let mut h = Harness::new();
    let trader = h.account("trader");
    let now = h.engine.time();
    let fresh = signed(&h, now);
    let stale = signed(&h, Timestamp::from_secs(now.as_secs() - 1_000));
    let (handle, task) = service::spawn(h.engine, 4);

    let err = handle
        .execute(Command::DepositMargin {
            owner: trader,
            amount: fx(10),
            price: stale,
        })
        .await
        .unwrap_err();
    let err = match err {
        ServiceError::Api(err) => err,
        other => panic!("expected an api error, got {other:?}"),
    };
    assert_eq!(err.code, ErrorCode::OracleRejected);

    let err = handle
        .execute(Command::WithdrawMargin {
            owner: trader,
            amount: fx(10),
            price: fresh,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Api(ApiError { code: ErrorCode::PositionState, .. })));

    drop(handle);
    let engine = task.await.unwrap();
    assert!(engine.position(trader).is_none());
    assert_eq!(engine.collateral_balance(trader), fx(REVENUE));
}

#[tokio::test]
async fn concurrent_handles_are_serialized() {
    let mut h = Harness::new();
    let lp = h.account("lp");
    let traders: Vec<Address> = (0..8).map(|i| h.account(&format!("trader{i}"))).collect();
    let price = signed(&h, h.engine.time());
    let (handle, task) = service::spawn(h.engine, 2);

    handle
        .execute(Command::AddLiquidity {
            provider: lp,
            amount: fx(100_000),
            price: price.clone(),
        })
        .await
        .unwrap();

    let mut calls = Vec::new();
    for trader in &traders {
        let handle = handle.clone();
        let price = price.clone();
        let owner = *trader;
        calls.push(tokio::spawn(async move {
            handle
                .execute(Command::TradeWithMargin {
                    owner,
                    volume: fx(10),
                    margin: fx(100),
                    price,
                })
                .await
        }));
    }
    for call in calls {
        call.await.unwrap().unwrap();
    }

    let count = handle.query(Query::TotalPositions).await.unwrap();
    assert_eq!(count, ApiResponse::Count(8));
    let state = handle.query(Query::StateValues).await.unwrap();
    let state = match state {
        ApiResponse::StateValues(state) => state,
        other => panic!("expected state values, got {other:?}"),
    };
    assert_eq!(state.traders_net_volume, fx(80));

    assert!(!handle.is_closed());
    drop(handle);
    let engine = task.await.unwrap();
    let margins: Fixed = engine.positions().map(|(_, p)| p.margin).sum();
    assert_eq!(
        engine.collateral_balance(engine.pool_address()),
        engine.state_values().liquidity + margins
    );
}

#[tokio::test]
async fn time_commands_move_the_engine_clock() {
    let h = Harness::new();
    let (handle, task) = service::spawn(h.engine, 1);

    handle.execute(Command::AdvanceTime { secs: 30 }).await.unwrap();
    let time = handle.query(Query::Time).await.unwrap();
    assert_eq!(time, ApiResponse::Time(Timestamp::from_secs(START + 30)));

    handle
        .execute(Command::SetTime {
            timestamp: Timestamp::from_secs(START + 500),
        })
        .await
        .unwrap();

    drop(handle);
    let engine = task.await.unwrap();
    assert_eq!(engine.time(), Timestamp::from_secs(START + 500));
}

#[tokio::test]
async fn clock_at_its_limit_keeps_the_service_alive() {
    let h = Harness::new();
    let (handle, task) = service::spawn(h.engine, 1);

    handle.execute(Command::AdvanceTime { secs: u64::MAX }).await.unwrap();
    handle.execute(Command::AdvanceTime { secs: 1 }).await.unwrap();
    let time = handle.query(Query::Time).await.unwrap();
    assert_eq!(time, ApiResponse::Time(Timestamp::from_secs(u64::MAX)));
    assert!(!handle.is_closed());

    drop(handle);
    let engine = task.await.unwrap();
    assert_eq!(engine.time(), Timestamp::from_secs(u64::MAX));
}
