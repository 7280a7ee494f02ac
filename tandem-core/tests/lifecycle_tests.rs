//! Order lifecycle edge cases seen through the engine
//!
//! Duplicate and late venue messages, synchronous gateway failures, venue
//! errors for quotes and hedges.

use tandem_core::config::{EngineConfig, HedgeMode};
use tandem_core::core::{ClientOrderId, GatewayError, OrderState, Side};
use tandem_core::events::Event;
use tandem_core::execution::Command;
use tandem_core::testing::{
    create_engine_with, hedges, order_filled, order_status, primary_book, reference_book,
    submits, MockVenue,
};

fn timer_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.hedge.mode = HedgeMode::Timer;
    config
}

#[test]
fn test_missing_reference_side_suppresses_quote() {
    let mut engine = create_engine_with(timer_config());

    engine.handle(&reference_book(1, 9_900, 0));
    engine.handle(&primary_book(1, 0, 0));
    let sent = submits(engine.gateway());
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], Command::Submit { side: Side::Buy, price: 9_800, .. }));

    // The ask comes back
    engine.handle(&reference_book(2, 9_900, 10_000));
    engine.handle(&primary_book(2, 0, 0));
    assert_eq!(engine.reconciler().resting(Side::Sell).unwrap().price, 10_100);
}

#[test]
fn test_live_quote_kept_when_reference_side_disappears() {
    let mut engine = create_engine_with(timer_config());
    let mut venue = MockVenue::new();

    engine.handle(&reference_book(1, 9_900, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    venue.settle(&mut engine);

    engine.handle(&reference_book(2, 9_900, 0));
    engine.handle(&primary_book(2, 0, 0));
    assert!(engine.gateway().commands().is_empty());
    assert_eq!(engine.reconciler().slot_state(Side::Sell), OrderState::Live);
}

#[test]
fn test_duplicate_final_status_changes_nothing() {
    let mut engine = create_engine_with(timer_config());

    engine.handle(&reference_book(1, 0, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    let ask = engine.reconciler().resting(Side::Sell).unwrap().id;

    engine.handle(&order_status(ask, 0, 50));
    engine.handle(&order_filled(ask, 10_100, 50));
    let fees = Event::OrderStatus {
        id: ask,
        filled_volume: 50,
        remaining_volume: 0,
        fees: 12,
    };
    engine.handle(&fees);
    engine.handle(&fees);

    let stats = engine.stats();
    assert_eq!(stats.primary_position, -50);
    assert_eq!(stats.fees, 12);
    assert_eq!(stats.active_orders, 0);

    // A repeated fill is late, not a second trade on a live order
    engine.handle(&order_filled(ask, 10_100, 5));
    assert_eq!(engine.stats().late_fills, 1);
    assert_eq!(engine.reconciler().slot_state(Side::Sell), OrderState::None);
}

#[test]
fn test_fees_of_rejected_order_booked_once() {
    let mut engine = create_engine_with(timer_config());

    engine.handle(&reference_book(1, 0, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    let ask = engine.reconciler().resting(Side::Sell).unwrap().id;

    let status = |fees| Event::OrderStatus {
        id: ask,
        filled_volume: 0,
        remaining_volume: 50,
        fees,
    };
    engine.handle(&status(4));
    engine.handle(&Event::Error {
        id: ask,
        message: "self trade".to_string(),
    });
    assert!(engine.reconciler().is_retired(ask));
    assert_eq!(engine.stats().fees, 4);

    // Straggling statuses for the rejected order book only the change
    engine.handle(&status(4));
    assert_eq!(engine.stats().fees, 4);
    engine.handle(&status(6));
    assert_eq!(engine.stats().fees, 6);
}

#[test]
fn test_fill_for_unknown_order_ignored() {
    let mut engine = create_engine_with(timer_config());
    engine.handle(&order_filled(ClientOrderId::new(999), 10_000, 10));
    engine.handle(&order_status(ClientOrderId::new(999), 10, 0));

    let stats = engine.stats();
    assert_eq!(stats.primary_position, 0);
    assert_eq!(stats.late_fills, 0);
    assert_eq!(stats.events_processed, 2);
}

#[test]
fn test_synchronous_submit_failure_frees_side() {
    let mut engine = create_engine_with(timer_config());
    engine.gateway_mut().fail_next(GatewayError::Rejected {
        id: ClientOrderId::new(1),
        reason: "price band".to_string(),
    });

    engine.handle(&reference_book(1, 9_900, 10_000));
    engine.handle(&primary_book(1, 0, 0));

    // Bids go first and fail; the ask still goes out
    assert_eq!(engine.reconciler().slot_state(Side::Buy), OrderState::None);
    assert_eq!(engine.reconciler().slot_state(Side::Sell), OrderState::PendingNew);
    assert_eq!(engine.gateway().commands().len(), 1);
    assert!(!engine.reconciler().is_active(ClientOrderId::new(1)));

    // Next update retries with a fresh id
    engine.handle(&primary_book(2, 0, 0));
    let bid = engine.reconciler().resting(Side::Buy).unwrap();
    assert_eq!(bid.id, ClientOrderId::new(3));
}

#[test]
fn test_disconnected_gateway_sends_nothing() {
    let mut engine = create_engine_with(timer_config());
    engine.gateway_mut().set_disconnected(true);

    engine.handle(&reference_book(1, 9_900, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    assert!(engine.gateway().commands().is_empty());
    assert_eq!(engine.reconciler().active_count(), 0);

    engine.gateway_mut().set_disconnected(false);
    engine.handle(&primary_book(2, 0, 0));
    assert_eq!(engine.reconciler().active_count(), 2);
}

#[test]
fn test_error_during_cancel_replace_drops_replacement() {
    let mut engine = create_engine_with(timer_config());
    let mut venue = MockVenue::new();

    engine.handle(&reference_book(1, 0, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    venue.settle(&mut engine);
    let ask = engine.reconciler().resting(Side::Sell).unwrap().id;

    venue.set_silent(true);
    engine.handle(&reference_book(2, 0, 10_200));
    engine.handle(&primary_book(2, 0, 0));
    venue.settle(&mut engine);

    engine.handle(&Event::Error {
        id: ask,
        message: "cancel failed".to_string(),
    });
    assert_eq!(engine.reconciler().slot_state(Side::Sell), OrderState::None);
    assert_eq!(engine.stats().rejects, 1);
    assert_eq!(engine.stats().quotes.replacements_submitted, 0);
}

#[test]
fn test_hedge_error_clears_pending_and_retries() {
    let mut config = timer_config();
    config.hedge.max_unhedged_ticks = 2;
    let mut engine = create_engine_with(config);
    let mut venue = MockVenue::new();

    engine.handle(&reference_book(1, 0, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    venue.settle(&mut engine);
    let ask = engine.reconciler().resting(Side::Sell).unwrap().id;
    venue.fill(ask, 50);
    venue.settle(&mut engine);

    for seq in 2..=4 {
        engine.handle(&primary_book(seq, 0, 0));
    }
    let sent = hedges(engine.gateway());
    assert_eq!(sent.len(), 1);
    let hedge_id = sent[0].id();
    assert!(engine.hedging().has_pending());

    engine.handle(&Event::Error {
        id: hedge_id,
        message: "no liquidity".to_string(),
    });
    assert!(!engine.hedging().has_pending());
    assert_eq!(engine.stats().rejects, 0);
    assert_eq!(engine.stats().hedges.hedges_failed, 1);

    // Still unhedged: another hedge once the timer runs out again
    for seq in 5..=7 {
        engine.handle(&primary_book(seq, 0, 0));
    }
    assert_eq!(hedges(engine.gateway()).len(), 2);
}

#[test]
fn test_late_hedge_fill_after_expiry_is_booked() {
    let mut config = timer_config();
    config.hedge.max_unhedged_ticks = 2;
    let mut engine = create_engine_with(config);
    let mut venue = MockVenue::new();

    engine.handle(&reference_book(1, 0, 10_000));
    engine.handle(&primary_book(1, 0, 0));
    venue.settle(&mut engine);
    let ask = engine.reconciler().resting(Side::Sell).unwrap().id;
    venue.fill(ask, 50);
    venue.settle(&mut engine);

    for seq in 2..=4 {
        engine.handle(&primary_book(seq, 0, 0));
    }
    let hedge_id = hedges(engine.gateway())[0].id();

    // No fill for longer than max_unhedged_ticks: marker expires
    for seq in 5..=7 {
        engine.handle(&primary_book(seq, 0, 0));
    }
    assert_eq!(engine.stats().hedges.hedges_expired, 1);

    engine.handle(&Event::HedgeFilled {
        id: hedge_id,
        price: 10_000,
        volume: 50,
    });
    assert_eq!(engine.position().hedge(), 50);
}

#[test]
fn test_unrelated_hedge_fill_ignored() {
    let mut engine = create_engine_with(timer_config());
    engine.handle(&Event::HedgeFilled {
        id: ClientOrderId::new(77),
        price: 10_000,
        volume: 5,
    });
    assert_eq!(engine.position().hedge(), 0);
}
