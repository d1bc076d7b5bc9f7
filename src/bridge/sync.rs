//! Blocking bridge - typically called from the runtime's request threads.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::sync::{Arc, Mutex, PoisonError};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::Result;
use crate::bridge::{
    BridgeConfig, Dispatcher, check_request, log_charging_start_status, mask_power_adj_req,
};
use crate::listener::ChargingListener;
use crate::stack::WlcStack;

/// Blocking, serialized request/response calls over a [`WlcStack`].
///
/// Each operation issues a request, then blocks the calling thread until the
/// stack reports the matching result event, or the configured timeout
/// expires.  Session start and power transfer start share one serialization
/// lock, so only one of them is ever outstanding against the stack.
///
/// Example usage:
///
/// ```rust,ignore
/// use nfc_wlc_bridge::bridge::{BridgeConfig, WlcBridge};
/// use nfc_wlc_bridge::event::MODE_NON_AUTONOMOUS_WLCP;
///
/// let stack = ...; // implement WlcStack
/// let bridge = WlcBridge::new(stack, BridgeConfig::default());
/// bridge.enable_module()?;
/// if bridge.start_wlc_poller(MODE_NON_AUTONOMOUS_WLCP)? {
///     bridge.start_charging_listener(power_adj_req, wpt_time_int)?;
/// }
/// ```
pub struct WlcBridge<S: WlcStack> {
    stack: S,
    config: BridgeConfig,
    dispatcher: Arc<Dispatcher>,
    request_lock: Mutex<()>,
}

impl<S: WlcStack> WlcBridge<S> {
    /// Create a new bridge.  Nothing is sent to the stack until
    /// [`Self::enable_module()`].
    ///
    /// Arguments:
    /// - `stack`: The WLC stack to drive
    /// - `config`: Timeouts for the blocking waits
    pub fn new(stack: S, config: BridgeConfig) -> Self {
        Self {
            stack,
            config,
            dispatcher: Arc::new(Dispatcher::new()),
            request_lock: Mutex::new(()),
        }
    }

    /// Enable the WLC module, registering this bridge's event callback with
    /// the stack, and wait for the enable result.
    ///
    /// Returns:
    /// - `Ok(())`: The stack reported the module enabled
    /// - `Err(Error::Rejected)`: The stack refused the request, nothing was
    ///   waited for
    /// - `Err(Error::Failed)`: The enable result carried a failure status
    /// - `Err(Error::Timeout)`: No enable result in time
    ///
    /// Intended to be called once, before any session operation.
    pub fn enable_module(&self) -> Result<()> {
        debug!("Enabling WLC module");

        let guard = self.dispatcher.enable_event.guard();
        let status = self.stack.enable(self.dispatcher.callback());
        check_request("enable WLC module", status)?;

        let status = guard.wait(self.config.enable_timeout)?;
        if status.is_ok() {
            info!("WLC module enabled");
            Ok(())
        } else {
            error!("WLC module enable result: {status}");
            Err(crate::Error::Failed(status))
        }
    }

    /// Start a WLC poller session, and wait for the stack to report whether
    /// it started.
    ///
    /// Returns:
    /// - `Ok(started)`: Whether the session start result reported success
    /// - `Err(Error::Rejected)`: The stack refused the request
    /// - `Err(Error::Timeout)`: No start result in time.  The late result is
    ///   dropped when it arrives, and cannot complete a later request
    ///
    /// Any error clears [`Self::is_poller_started()`].
    pub fn start_wlc_poller(&self, mode: i32) -> Result<bool> {
        debug!("Starting WLC poller, mode {mode}");

        let _serial = self.serialize();
        let guard = self.dispatcher.session_event.guard();

        let status = self.stack.start_session(mode);
        if let Err(e) = check_request("start WLC poller", status) {
            self.dispatcher.set_started(false);
            return Err(e);
        }

        debug!("Started WLC poller, waiting for confirmation");
        match guard.wait(self.config.response_timeout) {
            Ok(status) => Ok(status.is_ok()),
            Err(e) => {
                self.dispatcher.set_started(false);
                Err(e)
            }
        }
    }

    /// Start wireless power transfer, and wait for the stack to report the
    /// transfer start.
    ///
    /// `power_adj_req` is masked to its low 16 bits before it is sent.
    ///
    /// Success means the request was accepted and its start result arrived.
    /// The start result's status is logged but does not fail the call, and
    /// the transfer's eventual outcome is delivered separately to the
    /// [`ChargingListener`].
    pub fn start_charging_listener(&self, power_adj_req: i32, wpt_time_int: i32) -> Result<()> {
        debug!("Starting power transfer, wpt_time_int = {wpt_time_int}");

        let _serial = self.serialize();
        let guard = self.dispatcher.wpt_event.guard();

        let status = self
            .stack
            .start_power_transfer(mask_power_adj_req(power_adj_req), wpt_time_int);
        check_request("start power transfer", status)?;

        debug!("Started power transfer, waiting for confirmation");
        let status = guard.wait(self.config.response_timeout)?;
        log_charging_start_status(status);
        Ok(())
    }

    /// Forward an end-of-power-transfer condition to the attached listener,
    /// as the stack's callback does for
    /// [`crate::event::WlcEvent::ChargingResult`].
    ///
    /// Returns whether a listener accepted it.  Never panics.
    pub fn notify_completion(&self, end_condition: u8) -> bool {
        self.dispatcher.notify_completion(end_condition)
    }

    /// Attach the listener for charging completion.  Returns the listener it
    /// replaces, if any.
    pub fn attach_listener(
        &self,
        listener: Arc<dyn ChargingListener>,
    ) -> Option<Arc<dyn ChargingListener>> {
        self.dispatcher.attach_listener(listener)
    }

    /// Detach the charging completion listener.  Subsequent completions are
    /// dropped.
    pub fn detach_listener(&self) -> Option<Arc<dyn ChargingListener>> {
        self.dispatcher.detach_listener()
    }

    /// Whether a charging completion listener is attached.
    pub fn has_listener(&self) -> bool {
        self.dispatcher.has_listener()
    }

    /// Whether the last enable result reported success.
    pub fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    /// Whether the last poller session start succeeded.
    pub fn is_poller_started(&self) -> bool {
        self.dispatcher.is_started()
    }

    /// Configuration the bridge was created with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The stack this bridge drives.
    pub fn stack(&self) -> &S {
        &self.stack
    }
}

// Internal functions
impl<S: WlcStack> WlcBridge<S> {
    fn serialize(&self) -> std::sync::MutexGuard<'_, ()> {
        self.request_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
