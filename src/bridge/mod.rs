//! Session bridge between callers and the WLC stack's event callback.
//!
//! See [`WlcBridge`] for the blocking bridge, and [`AsyncWlcBridge`] for the
//! async version.
//!
//! Both share a [`Dispatcher`], which is the only state the stack's callback
//! touches.  The callback captures an `Arc` of the dispatcher, not the bridge,
//! so the stack holding its callback does not keep the bridge alive.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

#[cfg(feature = "async")]
pub mod futures;
pub mod sync;

#[cfg(feature = "async")]
pub use self::futures::{AsyncDelay, AsyncWlcBridge, AsyncWlcStack};
pub use self::sync::WlcBridge;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::event::{EndCondition, Status, WlcEvent};
use crate::listener::{ChargingListener, ListenerSlot};
use crate::stack::EventCallback;
use crate::sync_event::SyncEvent;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for creating a bridge.
///
/// A timeout of `None` waits for the stack's event forever.  If the stack
/// never sends it the calling thread is blocked for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Bound on waiting for the enable result
    pub enable_timeout: Option<Duration>,
    /// Bound on waiting for the session and power transfer start results
    pub response_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enable_timeout: Some(DEFAULT_TIMEOUT),
            response_timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl BridgeConfig {
    /// Configuration which never times out.
    pub const fn unbounded() -> Self {
        Self {
            enable_timeout: None,
            response_timeout: None,
        }
    }

    /// Set the bound on waiting for the enable result.
    pub fn with_enable_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.enable_timeout = timeout;
        self
    }

    /// Set the bound on waiting for session and power transfer start results.
    pub fn with_response_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.response_timeout = timeout;
        self
    }
}

/// Receives the stack's events and routes them to waiting requesters or to
/// the charging listener.
pub(crate) struct Dispatcher {
    pub(crate) enable_event: SyncEvent<Status>,
    pub(crate) session_event: SyncEvent<Status>,
    pub(crate) wpt_event: SyncEvent<Status>,
    started: AtomicBool,
    enabled: AtomicBool,
    listener: ListenerSlot,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self {
            enable_event: SyncEvent::new("enable"),
            session_event: SyncEvent::new("session start"),
            wpt_event: SyncEvent::new("power transfer start"),
            started: AtomicBool::new(false),
            enabled: AtomicBool::new(false),
            listener: ListenerSlot::default(),
        }
    }

    /// Build the callback to register with the stack.
    pub(crate) fn callback(self: &Arc<Self>) -> EventCallback {
        let dispatcher = Arc::clone(self);
        Box::new(move |event| dispatcher.dispatch(event))
    }

    pub(crate) fn dispatch(&self, event: WlcEvent) {
        match event {
            WlcEvent::EnableResult { status } => {
                debug!("Enable result: status = {status}");
                if self.enable_event.notify(status) {
                    self.enabled.store(status.is_ok(), Ordering::Release);
                }
            }
            WlcEvent::StartResult { status } => {
                debug!("Start result: status = {status}");
                // A late result for a timed out request says nothing about
                // the current session
                if self.session_event.notify(status) {
                    self.started.store(status.is_ok(), Ordering::Release);
                }
            }
            WlcEvent::StartWptResult { status } => {
                debug!("Start WPT result: status = {status}");
                self.wpt_event.notify(status);
            }
            WlcEvent::ChargingResult { end_condition } => {
                debug!(
                    "Charging result: end condition = {end_condition:#04X} ({})",
                    EndCondition::from(end_condition)
                );
                self.notify_completion(end_condition);
            }
            WlcEvent::Unknown(code) => {
                debug!("Unhandled event {code:#04X}");
            }
        }
    }

    pub(crate) fn notify_completion(&self, end_condition: u8) -> bool {
        self.listener.notify(end_condition)
    }

    pub(crate) fn set_started(&self, started: bool) {
        self.started.store(started, Ordering::Release);
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn attach_listener(
        &self,
        listener: Arc<dyn ChargingListener>,
    ) -> Option<Arc<dyn ChargingListener>> {
        self.listener.attach(listener)
    }

    pub(crate) fn detach_listener(&self) -> Option<Arc<dyn ChargingListener>> {
        self.listener.detach()
    }

    pub(crate) fn has_listener(&self) -> bool {
        self.listener.is_attached()
    }
}

// Helper functions

/// Mask the runtime's power adjustment request to the 16 bits the stack
/// accepts.
pub(crate) fn mask_power_adj_req(power_adj_req: i32) -> u16 {
    (power_adj_req & 0xFFFF) as u16
}

fn check_request(what: &str, status: Status) -> crate::Result<()> {
    if status.is_ok() {
        Ok(())
    } else {
        error!("Failed to {what}; error = {status}");
        Err(crate::Error::Rejected(status))
    }
}

fn log_charging_start_status(status: Status) {
    // Success is reported once the start result arrives.  Its status is not
    // consulted.
    if !status.is_ok() {
        warn!("Power transfer start result reported {status}");
    }
}
