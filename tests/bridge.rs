// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{MockStack, Panicking, Recorder, Reply, Request};
use nfc_wlc_bridge::event::MODE_NON_AUTONOMOUS_WLCP;
use nfc_wlc_bridge::{BridgeConfig, Error, Status, WlcBridge, WlcEvent};

fn enabled_bridge(config: BridgeConfig) -> (MockStack, WlcBridge<MockStack>) {
    let stack = MockStack::new();
    let bridge = WlcBridge::new(stack.clone(), config);
    bridge.enable_module().unwrap();
    (stack, bridge)
}

#[test]
fn enable_then_start_session() {
    let stack = MockStack::new();
    let bridge = WlcBridge::new(stack.clone(), BridgeConfig::default());
    assert!(!bridge.is_enabled());

    assert_eq!(bridge.enable_module(), Ok(()));
    assert!(bridge.is_enabled());

    assert_eq!(bridge.start_wlc_poller(MODE_NON_AUTONOMOUS_WLCP), Ok(true));
    assert!(bridge.is_poller_started());
    assert_eq!(
        stack.requests(),
        vec![
            Request::Enable,
            Request::StartSession(MODE_NON_AUTONOMOUS_WLCP)
        ]
    );
}

#[test]
fn enable_rejected_does_not_block() {
    let stack = MockStack::new();
    stack.push_reply(Reply::Reject(Status::FAILED));
    let bridge = WlcBridge::new(stack, BridgeConfig::unbounded());

    assert_eq!(bridge.enable_module(), Err(Error::Rejected(Status::FAILED)));
    assert!(!bridge.is_enabled());
}

#[test]
fn enable_failure_result() {
    let stack = MockStack::new();
    stack.push_reply(Reply::Accept(Some(WlcEvent::EnableResult {
        status: Status::NOT_INITIALIZED,
    })));
    let bridge = WlcBridge::new(stack, BridgeConfig::default());

    assert_eq!(
        bridge.enable_module(),
        Err(Error::Failed(Status::NOT_INITIALIZED))
    );
    assert!(!bridge.is_enabled());
}

#[test]
fn poller_rejected_returns_immediately() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::unbounded());
    assert_eq!(bridge.start_wlc_poller(1), Ok(true));

    stack.push_reply(Reply::Reject(Status::REJECTED));
    let start = Instant::now();
    assert_eq!(
        bridge.start_wlc_poller(1),
        Err(Error::Rejected(Status::REJECTED))
    );
    assert!(start.elapsed() < Duration::from_secs(1));

    // Earlier success does not leak into the rejected call
    assert!(!bridge.is_poller_started());
}

#[test]
fn poller_failure_result_returns_false() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    stack.push_reply(Reply::Accept(Some(WlcEvent::StartResult {
        status: Status::FAILED,
    })));

    assert_eq!(bridge.start_wlc_poller(2), Ok(false));
    assert!(!bridge.is_poller_started());
    assert_eq!(stack.requests().last(), Some(&Request::StartSession(2)));
}

#[test]
fn charging_masks_power_and_ignores_result_status() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    stack.push_reply(Reply::Accept(Some(WlcEvent::StartWptResult {
        status: Status::FAILED,
    })));

    assert_eq!(bridge.start_charging_listener(300, 50), Ok(()));
    assert_eq!(
        stack.requests().last(),
        Some(&Request::StartPowerTransfer(300, 50))
    );

    assert_eq!(bridge.start_charging_listener(0x0003_012C, 50), Ok(()));
    assert_eq!(
        stack.requests().last(),
        Some(&Request::StartPowerTransfer(300, 50))
    );
}

#[test]
fn charging_does_not_touch_started_flag() {
    let (_stack, bridge) = enabled_bridge(BridgeConfig::default());
    assert_eq!(bridge.start_wlc_poller(MODE_NON_AUTONOMOUS_WLCP), Ok(true));
    assert_eq!(bridge.start_charging_listener(100, 20), Ok(()));
    assert!(bridge.is_poller_started());
}

#[test]
fn charging_rejected() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::unbounded());
    stack.push_reply(Reply::Reject(Status::FAILED));

    assert_eq!(
        bridge.start_charging_listener(300, 50),
        Err(Error::Rejected(Status::FAILED))
    );

    // Serialization lock was released
    assert_eq!(bridge.start_charging_listener(300, 50), Ok(()));
}

#[test]
fn session_and_charging_requests_serialize() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    let bridge = Arc::new(bridge);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || {
                for _ in 0..4 {
                    if i % 2 == 0 {
                        assert_eq!(bridge.start_wlc_poller(MODE_NON_AUTONOMOUS_WLCP), Ok(true));
                    } else {
                        assert_eq!(bridge.start_charging_listener(300, 50), Ok(()));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(stack.requests().len(), 1 + 8 * 4);
    assert_eq!(stack.peak_outstanding(), 1);
}

#[test]
fn wait_times_out_and_late_result_is_discarded() {
    let config = BridgeConfig::default().with_response_timeout(Some(Duration::from_millis(50)));
    let (stack, bridge) = enabled_bridge(config);

    assert_eq!(bridge.start_wlc_poller(1), Ok(true));
    stack.push_reply(Reply::Accept(None));
    assert_eq!(bridge.start_wlc_poller(1), Err(Error::Timeout));
    assert!(!bridge.is_poller_started());

    // The answer to the timed out request turns up late
    stack.emit(WlcEvent::StartResult { status: Status::OK });
    assert!(!bridge.is_poller_started());

    assert_eq!(bridge.start_wlc_poller(1), Ok(true));
}

#[test]
fn late_result_after_next_request_is_armed() {
    let config = BridgeConfig::default().with_response_timeout(Some(Duration::from_millis(100)));
    let (stack, bridge) = enabled_bridge(config);

    stack.push_reply(Reply::Accept(None));
    assert_eq!(bridge.start_wlc_poller(1), Err(Error::Timeout));

    // Second request is waiting when the first one's result arrives, ahead
    // of its own
    stack.push_reply(Reply::Accept(None));
    let emitter = stack.clone();
    let late = thread::spawn(move || {
        emitter.wait_for_requests(3);
        thread::sleep(Duration::from_millis(2));
        emitter.emit(WlcEvent::StartResult {
            status: Status::FAILED,
        });
        emitter.emit(WlcEvent::StartResult { status: Status::OK });
    });

    assert_eq!(bridge.start_wlc_poller(1), Ok(true));
    assert!(bridge.is_poller_started());
    late.join().unwrap();
}

#[test]
fn lost_result_does_not_stall_later_requests() {
    let config = BridgeConfig::default().with_response_timeout(Some(Duration::from_millis(200)));
    let (stack, bridge) = enabled_bridge(config);

    // First result never arrives
    stack.push_reply(Reply::Accept(None));
    assert_eq!(bridge.start_wlc_poller(1), Err(Error::Timeout));

    // Second request's own result is dropped in its place
    stack.push_reply(Reply::Accept(None));
    let emitter = stack.clone();
    let own = thread::spawn(move || {
        emitter.wait_for_requests(3);
        emitter.emit(WlcEvent::StartResult { status: Status::OK });
    });
    assert_eq!(bridge.start_wlc_poller(1), Err(Error::Timeout));
    own.join().unwrap();

    assert_eq!(bridge.start_wlc_poller(1), Ok(true));
    assert_eq!(bridge.start_charging_listener(300, 50), Ok(()));
}

#[test]
fn unsolicited_charging_result_reaches_listener_once() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    let recorder = Arc::new(Recorder::default());
    assert!(bridge.attach_listener(recorder.clone()).is_none());
    assert!(bridge.has_listener());

    let emitter = stack.clone();
    thread::spawn(move || emitter.emit(WlcEvent::ChargingResult { end_condition: 0x02 }))
        .join()
        .unwrap();

    assert_eq!(recorder.seen(), vec![2]);
}

#[test]
fn charging_result_without_listener_is_dropped() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    stack.emit(WlcEvent::ChargingResult { end_condition: 0x00 });

    let recorder = Arc::new(Recorder::default());
    bridge.attach_listener(recorder.clone());
    bridge.detach_listener();
    stack.emit(WlcEvent::ChargingResult { end_condition: 0x01 });
    assert!(recorder.seen().is_empty());

    // Bridge still serves requests
    assert_eq!(bridge.start_wlc_poller(1), Ok(true));
}

#[test]
fn panicking_listener_does_not_reach_stack_thread() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    bridge.attach_listener(Arc::new(Panicking));

    let emitter = stack.clone();
    let result =
        thread::spawn(move || emitter.emit(WlcEvent::ChargingResult { end_condition: 0x03 }))
            .join();
    assert!(result.is_ok());

    assert!(!bridge.notify_completion(0x00));
}

#[test]
fn unknown_event_is_ignored() {
    let (stack, bridge) = enabled_bridge(BridgeConfig::default());
    stack.emit(WlcEvent::from_raw(0x20, 0x00));
    assert_eq!(bridge.start_wlc_poller(1), Ok(true));
}
