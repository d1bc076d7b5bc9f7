//! Traits for the external WLC stack this crate drives.
//!
//! The stack owns the WLC protocol engine, NCI encoding and the controller
//! itself.  From this crate's point of view it offers three request calls,
//! each returning an immediate [`Status`], and reports the outcome of
//! accepted requests later by invoking a single callback with a
//! [`WlcEvent`].
//!
//! # Possible implementations
//!
//! - FFI shims over a vendor NFA library, converting its tagged event
//!   structures with [`WlcEvent::from_raw()`]
//! - A HAL client which sends NCI commands over a channel and decodes
//!   notifications on its reader thread
//! - Scripted fakes for testing
//!
//! # Threading
//!
//! Events must be delivered from a thread other than the one issuing the
//! request.  A stack which invokes the callback from inside `enable()`,
//! `start_session()` or `start_power_transfer()` will deadlock the blocking
//! [`crate::bridge::WlcBridge`], which holds the correlation lock across the
//! request call.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::sync::Arc;

use crate::event::{Status, WlcEvent};

/// Callback registered with the stack by [`WlcStack::enable()`].
pub type EventCallback = Box<dyn Fn(WlcEvent) + Send + Sync + 'static>;

/// Blocking-call view of the WLC stack.
pub trait WlcStack: Send + Sync {
    /// Enable the WLC module and register the event callback.
    ///
    /// An accepted request is followed by a [`WlcEvent::EnableResult`].
    fn enable(&self, callback: EventCallback) -> Status;

    /// Start a WLC poller session in the given mode.
    ///
    /// An accepted request is followed by a [`WlcEvent::StartResult`].
    fn start_session(&self, mode: i32) -> Status;

    /// Start wireless power transfer.
    ///
    /// # Arguments
    ///
    /// * `power_adj_req` - Power adjustment request, already masked to
    ///   16 bits by the caller
    /// * `wpt_time_int` - WPT time interval requested by the listener
    ///
    /// An accepted request is followed by a [`WlcEvent::StartWptResult`], and
    /// once the power transfer phase ends, by a [`WlcEvent::ChargingResult`].
    fn start_power_transfer(&self, power_adj_req: u16, wpt_time_int: i32) -> Status;
}

impl<S: WlcStack + ?Sized> WlcStack for Arc<S> {
    fn enable(&self, callback: EventCallback) -> Status {
        (**self).enable(callback)
    }

    fn start_session(&self, mode: i32) -> Status {
        (**self).start_session(mode)
    }

    fn start_power_transfer(&self, power_adj_req: u16, wpt_time_int: i32) -> Status {
        (**self).start_power_transfer(power_adj_req, wpt_time_int)
    }
}
