//! Synchronous session bridge for NFC Wireless Charging (WLC).
//!
//! This crate sits between callers which want blocking request/response
//! calls, typically a managed runtime's request threads, and an NFC
//! controller's WLC stack, which accepts requests immediately and reports
//! their outcome later through a single event callback.  It enables the WLC
//! module, starts WLC poller (WLCP) sessions, starts wireless power transfer
//! (WPT), and forwards the unsolicited end-of-charging event back to the
//! runtime.
//!
//! The WLC protocol engine, NCI encoding and controller firmware all live in
//! the external stack.  This crate only reproduces the adapter around it.
//!
//! ## Architecture
//!
//! Each operation:
//! 1. Takes the serialization lock (session and power transfer start only),
//!    so only one request is ever outstanding against the stack
//! 2. Arms the [`sync_event::SyncEvent`] for its result category
//! 3. Issues the request to the stack, which either refuses it synchronously
//!    or accepts it
//! 4. If accepted, blocks until the stack's callback signals the result
//!    event, or the configured timeout expires
//!
//! The stack's callback is owned by a dispatcher shared by all operations.
//! Result events signal the matching waiter.  The charging result event has
//! no waiter, and is pushed to the attached [`listener::ChargingListener`]
//! instead.
//!
//! ## Modules
//!
//! - [`bridge`] - The blocking [`bridge::WlcBridge`], its configuration, and
//!   (with the `async` feature) [`bridge::AsyncWlcBridge`]
//! - [`manager`] - Runtime-facing entry points returning `bool`/`()`, logging
//!   failures
//! - [`stack`] - Traits for the external WLC stack
//! - [`event`] - Status codes, events and end conditions exchanged with the
//!   stack
//! - [`listener`] - Charging completion listener
//! - [`sync_event`] - The correlation primitive
//!
//! ## Getting Started
//!
//! 1. Implement [`stack::WlcStack`] over your controller's WLC API
//! 2. Create a [`bridge::WlcBridge`] (or [`manager::WlcManager`]) with a
//!    [`bridge::BridgeConfig`]
//! 3. Attach a [`listener::ChargingListener`]
//! 4. Call `enable_module()` once
//! 5. Call `start_wlc_poller()`, then `start_charging_listener()` for each
//!    power transfer phase
//!
//! ## Timeouts
//!
//! By default each wait is bounded, returning [`Error::Timeout`].  Use
//! [`bridge::BridgeConfig::unbounded()`] to wait forever, in which case a
//! stack that never reports a result blocks the caller for good.
//!
//! ## Features
//!
//! Default features:
//! - `async` - Enable [`bridge::AsyncWlcBridge`] and the
//!   [`bridge::AsyncWlcStack`] trait.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

pub mod bridge;
pub mod event;
pub mod listener;
pub mod manager;
pub mod stack;
pub mod sync_event;

pub use bridge::{BridgeConfig, WlcBridge};
pub use event::{EndCondition, Status, WlcEvent};
pub use listener::{ChargingListener, ListenerResult};
pub use manager::WlcManager;
pub use stack::{EventCallback, WlcStack};

/// Bridge errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Stack refused the request synchronously
    #[error("request rejected by WLC stack: {0}")]
    Rejected(Status),
    /// Result event reported a failure
    #[error("WLC stack reported failure: {0}")]
    Failed(Status),
    /// Timeout waiting for the result event
    #[error("timed out waiting for WLC stack event")]
    Timeout,
}

/// Type to represent the result of a bridge operation
pub type Result<T> = core::result::Result<T, Error>;
