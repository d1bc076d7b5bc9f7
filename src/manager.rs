//! Runtime-facing entry points.
//!
//! [`WlcManager`] exposes the bridge the way a managed runtime calls it:
//! enabling returns nothing, the session operations return a plain `bool`,
//! and every failure is reported through the log only.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::sync::Arc;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::Error;
use crate::bridge::{BridgeConfig, WlcBridge};
use crate::listener::ChargingListener;
use crate::stack::WlcStack;

/// Boolean/void facade over a [`WlcBridge`].
pub struct WlcManager<S: WlcStack> {
    bridge: WlcBridge<S>,
}

impl<S: WlcStack> WlcManager<S> {
    pub fn new(stack: S, config: BridgeConfig) -> Self {
        Self::from_bridge(WlcBridge::new(stack, config))
    }

    pub fn from_bridge(bridge: WlcBridge<S>) -> Self {
        Self { bridge }
    }

    /// Enable the WLC module.  Blocks until the stack confirms, refuses, or
    /// the enable timeout expires.
    pub fn enable_module(&self) {
        if let Err(e) = self.bridge.enable_module() {
            error!("Enable WLC module failed: {e}");
        }
    }

    /// Returns true iff the stack reported the poller session started.
    pub fn start_wlc_poller(&self, mode: i32) -> bool {
        match self.bridge.start_wlc_poller(mode) {
            Ok(started) => started,
            Err(e) => {
                log_failure("start WLC poller", e);
                false
            }
        }
    }

    /// Returns true iff the stack accepted the power transfer request and
    /// reported its start, regardless of the eventual transfer outcome.
    pub fn start_charging_listener(&self, power_adj_req: i32, wpt_time_int_ms: i32) -> bool {
        match self
            .bridge
            .start_charging_listener(power_adj_req, wpt_time_int_ms)
        {
            Ok(()) => true,
            Err(e) => {
                log_failure("start power transfer", e);
                false
            }
        }
    }

    pub fn attach_listener(&self, listener: Arc<dyn ChargingListener>) {
        if self.bridge.attach_listener(listener).is_some() {
            debug!("Replaced charging listener");
        }
    }

    pub fn detach_listener(&self) {
        self.bridge.detach_listener();
    }

    pub fn bridge(&self) -> &WlcBridge<S> {
        &self.bridge
    }
}

fn log_failure(what: &str, e: Error) {
    match e {
        Error::Timeout => warn!("Failed to {what}: {e}"),
        _ => error!("Failed to {what}: {e}"),
    }
}
