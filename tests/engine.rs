//! End-to-end tests for the order book engine.
//!
//! These drive the engine exactly as the transport receive loop does:
//! parsed frames in, sorted snapshots and subscription requests out. The
//! "exchange" checksums are computed over the book state each message
//! should produce, which is what the real feed does.

use std::sync::Arc;
use std::time::Duration;

use ftx_feed::orderbook::{checksum, BookSnapshot, OrderBookEngine};
use ftx_feed::types::messages::{BookAction, Channel, DataMsg, OrderBookData, WsCommand};

/// Checksum the exchange would attach for the given post-apply book
fn signed(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> u32 {
    checksum::checksum(&BookSnapshot {
        bids: bids.to_vec(),
        asks: asks.to_vec(),
    })
}

fn message(
    action: BookAction,
    bids: &[[f64; 2]],
    asks: &[[f64; 2]],
    time: f64,
    checksum: u32,
) -> OrderBookData {
    OrderBookData {
        action,
        time,
        checksum,
        bids: bids.to_vec(),
        asks: asks.to_vec(),
    }
}

#[test]
fn snapshot_then_delta_then_divergence() {
    let (engine, mut requests) = OrderBookEngine::new();

    // Full snapshot for market M.
    let msg = message(
        BookAction::Snapshot,
        &[[100.0, 1.0], [99.0, 2.0]],
        &[[101.0, 1.0]],
        1000.0,
        signed(&[(100.0, 1.0), (99.0, 2.0)], &[(101.0, 1.0)]),
    );
    assert!(engine.apply("M", &msg).unwrap());

    let book = engine.order_book("M");
    assert_eq!(book.bids, vec![(100.0, 1.0), (99.0, 2.0)]);
    assert_eq!(book.asks, vec![(101.0, 1.0)]);
    assert_eq!(engine.timestamp("M"), Some(1000.0));

    // Delta removing the best bid.
    let msg = message(
        BookAction::Update,
        &[[100.0, 0.0]],
        &[],
        1001.0,
        signed(&[(99.0, 2.0)], &[(101.0, 1.0)]),
    );
    assert!(engine.apply("M", &msg).unwrap());

    let book = engine.order_book("M");
    assert_eq!(book.bids, vec![(99.0, 2.0)]);
    assert_eq!(book.asks, vec![(101.0, 1.0)]);

    // Delta with a wrong checksum: book empties, one unsubscribe then one
    // subscribe goes out for (orderbook, M).
    let msg = message(BookAction::Update, &[[98.0, 1.0]], &[], 1002.0, 0xBAD);
    assert!(!engine.apply("M", &msg).unwrap());

    let book = engine.order_book("M");
    assert!(book.bids.is_empty() && book.asks.is_empty());
    assert_eq!(
        requests.try_recv().unwrap(),
        WsCommand::unsubscribe(Channel::Orderbook, "M")
    );
    assert_eq!(
        requests.try_recv().unwrap(),
        WsCommand::subscribe(Channel::Orderbook, "M")
    );
    assert!(requests.try_recv().is_err());

    // The fresh snapshot restores service.
    let msg = message(
        BookAction::Snapshot,
        &[[98.0, 1.0]],
        &[[99.5, 2.0]],
        1003.0,
        signed(&[(98.0, 1.0)], &[(99.5, 2.0)]),
    );
    assert!(engine.apply("M", &msg).unwrap());
    assert_eq!(engine.order_book("M").bids, vec![(98.0, 1.0)]);
    assert_eq!(engine.timestamp("M"), Some(1003.0));
}

#[test]
fn markets_do_not_interfere() {
    let (engine, _requests) = OrderBookEngine::new();

    let btc = message(
        BookAction::Snapshot,
        &[[20000.0, 1.0]],
        &[],
        1.0,
        signed(&[(20000.0, 1.0)], &[]),
    );
    let eth = message(
        BookAction::Snapshot,
        &[[1500.0, 3.0]],
        &[],
        2.0,
        signed(&[(1500.0, 3.0)], &[]),
    );
    assert!(engine.apply("BTC-PERP", &btc).unwrap());
    assert!(engine.apply("ETH-PERP", &eth).unwrap());

    // Diverge BTC only.
    let bad = message(BookAction::Update, &[[19999.0, 1.0]], &[], 3.0, 1);
    assert!(!engine.apply("BTC-PERP", &bad).unwrap());

    assert!(engine.order_book("BTC-PERP").bids.is_empty());
    assert_eq!(engine.order_book("ETH-PERP").bids, vec![(1500.0, 3.0)]);
    assert_eq!(engine.timestamp("ETH-PERP"), Some(2.0));
}

#[test]
fn wire_frame_round_trip() {
    let (engine, _requests) = OrderBookEngine::new();

    let expected = signed(&[(20000.0, 1.5)], &[(20001.0, 2.0)]);
    let json = format!(
        r#"{{
            "type": "partial",
            "channel": "orderbook",
            "market": "BTC-PERP",
            "data": {{
                "action": "partial",
                "time": 1656364800.123,
                "checksum": {expected},
                "bids": [[20000.0, 1.5]],
                "asks": [[20001.0, 2.0]]
            }}
        }}"#
    );

    let msg: ftx_feed::types::WsMessage = serde_json::from_str(&json).unwrap();
    let frame = match msg {
        ftx_feed::types::WsMessage::Data(frame) => frame,
        other => panic!("expected data frame, got {other:?}"),
    };

    assert!(engine.handle_message(&frame).unwrap());
    let book = engine.order_book("BTC-PERP");
    assert_eq!(book.bids, vec![(20000.0, 1.5)]);
    assert_eq!(book.asks, vec![(20001.0, 2.0)]);
}

#[test]
fn non_orderbook_frames_are_ignored() {
    let (engine, _requests) = OrderBookEngine::new();
    let frame = DataMsg {
        channel: Channel::Trades,
        market: Some("BTC-PERP".to_string()),
        data: serde_json::json!([
            {"price": 20000.0, "size": 0.5, "side": "buy", "time": "2022-06-27T00:00:00Z"}
        ]),
    };
    assert!(!engine.handle_message(&frame).unwrap());
    assert!(engine.order_book("BTC-PERP").bids.is_empty());
    assert_eq!(engine.timestamp("BTC-PERP"), None);
}

#[tokio::test]
async fn blocked_readers_wake_on_verified_update() {
    let (engine, _requests) = OrderBookEngine::new();
    let engine = Arc::new(engine);
    engine.track("M");

    // Two readers blocked on the same market; both must wake on one signal.
    let waiters: Vec<_> = (0..2)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .wait_for_update("M", Some(Duration::from_secs(5)))
                    .await
            })
        })
        .collect();
    tokio::task::yield_now().await;

    let msg = message(
        BookAction::Snapshot,
        &[[100.0, 1.0]],
        &[],
        1.0,
        signed(&[(100.0, 1.0)], &[]),
    );
    assert!(engine.apply("M", &msg).unwrap());

    for waiter in waiters {
        assert!(waiter.await.unwrap());
    }
}

#[tokio::test(start_paused = true)]
async fn wait_on_silent_market_times_out() {
    let (engine, _requests) = OrderBookEngine::new();

    // No message ever received for N: the wait returns after the timeout
    // and the timestamp still reports "never updated".
    let signaled = engine
        .wait_for_update("N", Some(Duration::from_millis(100)))
        .await;
    assert!(!signaled);
    assert_eq!(engine.timestamp("N"), None);
}
