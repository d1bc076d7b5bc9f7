//! Asynchronous bridge - for runtimes which cannot block a thread on the
//! stack.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::bridge::{
    BridgeConfig, Dispatcher, check_request, log_charging_start_status, mask_power_adj_req,
};
use crate::event::Status;
use crate::listener::ChargingListener;
use crate::stack::EventCallback;
use crate::sync_event::SyncEvent;
use crate::{Error, Result};

/// Async view of the WLC stack, for stacks whose requests are themselves
/// asynchronous, such as a HAL reached over a channel.
///
/// Semantics match [`crate::stack::WlcStack`].  Events are still delivered
/// through the registered [`EventCallback`].
#[async_trait(?Send)]
pub trait AsyncWlcStack {
    /// Enable the WLC module and register the event callback
    async fn enable(&self, callback: EventCallback) -> Status;

    /// Start a WLC poller session in the given mode
    async fn start_session(&self, mode: i32) -> Status;

    /// Start wireless power transfer
    async fn start_power_transfer(&self, power_adj_req: u16, wpt_time_int: i32) -> Status;
}

/// Yield delay for async polling loops.
///
/// Application must provide an implementation of this trait in order for the
/// async bridge to be able to yield while waiting for the stack's result
/// event.
///
/// This trait keeps `nfc-wlc-bridge` free of any specific async runtime.
///
/// Example:
///
/// ```rust,ignore
/// use embassy_time::{Duration, Timer};
/// struct Delay;
/// impl AsyncDelay for Delay {
///     async fn delay() {
///         Timer::after(Duration::from_millis(5)).await;
///     }
/// }
/// ```
pub trait AsyncDelay {
    fn delay() -> impl Future<Output = ()>;
}

/// Async version of [`crate::bridge::WlcBridge`].
///
/// Waits poll the result events between [`AsyncDelay::delay()`] yields, so no
/// lock is held across an `.await`.  Session start and power transfer start
/// are still serialized: a second request waits, yielding, for the first to
/// finish.
pub struct AsyncWlcBridge<S: AsyncWlcStack, D: AsyncDelay> {
    stack: S,
    config: BridgeConfig,
    dispatcher: Arc<Dispatcher>,
    in_flight: AtomicBool,
    _delay: core::marker::PhantomData<D>,
}

impl<S: AsyncWlcStack, D: AsyncDelay> AsyncWlcBridge<S, D> {
    /// Create a new AsyncWlcBridge
    ///
    /// Arguments:
    /// - `stack`: The WLC stack to drive
    /// - `config`: Timeouts for the waits
    pub fn new(stack: S, config: BridgeConfig) -> Self {
        Self {
            stack,
            config,
            dispatcher: Arc::new(Dispatcher::new()),
            in_flight: AtomicBool::new(false),
            _delay: core::marker::PhantomData,
        }
    }

    /// Enable the WLC module and wait for the enable result.
    ///
    /// See [`crate::bridge::WlcBridge::enable_module()`].
    pub async fn enable_module(&self) -> Result<()> {
        debug!("Enabling WLC module");

        self.dispatcher.enable_event.arm();
        let status = self.stack.enable(self.dispatcher.callback()).await;
        check_request("enable WLC module", status)?;

        let status = self
            .wait_for(&self.dispatcher.enable_event, self.config.enable_timeout)
            .await?;
        if status.is_ok() {
            info!("WLC module enabled");
            Ok(())
        } else {
            error!("WLC module enable result: {status}");
            Err(Error::Failed(status))
        }
    }

    /// Start a WLC poller session.
    ///
    /// See [`crate::bridge::WlcBridge::start_wlc_poller()`].
    pub async fn start_wlc_poller(&self, mode: i32) -> Result<bool> {
        debug!("Starting WLC poller, mode {mode}");

        let _in_flight = self.acquire().await;
        self.dispatcher.session_event.arm();

        let status = self.stack.start_session(mode).await;
        if let Err(e) = check_request("start WLC poller", status) {
            self.dispatcher.set_started(false);
            return Err(e);
        }

        match self
            .wait_for(&self.dispatcher.session_event, self.config.response_timeout)
            .await
        {
            Ok(status) => Ok(status.is_ok()),
            Err(e) => {
                self.dispatcher.set_started(false);
                Err(e)
            }
        }
    }

    /// Start wireless power transfer.
    ///
    /// See [`crate::bridge::WlcBridge::start_charging_listener()`].
    pub async fn start_charging_listener(
        &self,
        power_adj_req: i32,
        wpt_time_int: i32,
    ) -> Result<()> {
        debug!("Starting power transfer, wpt_time_int = {wpt_time_int}");

        let _in_flight = self.acquire().await;
        self.dispatcher.wpt_event.arm();

        let status = self
            .stack
            .start_power_transfer(mask_power_adj_req(power_adj_req), wpt_time_int)
            .await;
        check_request("start power transfer", status)?;

        let status = self
            .wait_for(&self.dispatcher.wpt_event, self.config.response_timeout)
            .await?;
        log_charging_start_status(status);
        Ok(())
    }

    /// Forward an end condition to the attached listener.  See
    /// [`crate::bridge::WlcBridge::notify_completion()`].
    pub fn notify_completion(&self, end_condition: u8) -> bool {
        self.dispatcher.notify_completion(end_condition)
    }

    /// Attach the charging completion listener, returning the one it
    /// replaces.
    pub fn attach_listener(
        &self,
        listener: Arc<dyn ChargingListener>,
    ) -> Option<Arc<dyn ChargingListener>> {
        self.dispatcher.attach_listener(listener)
    }

    /// Detach the charging completion listener.
    pub fn detach_listener(&self) -> Option<Arc<dyn ChargingListener>> {
        self.dispatcher.detach_listener()
    }

    /// Whether the last enable result reported success.
    pub fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    /// Whether the last poller session start succeeded.
    pub fn is_poller_started(&self) -> bool {
        self.dispatcher.is_started()
    }

    /// The stack this bridge drives.
    pub fn stack(&self) -> &S {
        &self.stack
    }
}

// Internal functions
impl<S: AsyncWlcStack, D: AsyncDelay> AsyncWlcBridge<S, D> {
    async fn acquire(&self) -> InFlight<'_> {
        while self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            D::delay().await;
        }
        InFlight(&self.in_flight)
    }

    async fn wait_for(
        &self,
        event: &SyncEvent<Status>,
        timeout: Option<Duration>,
    ) -> Result<Status> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        debug!("Waiting for {} result", event.name());

        loop {
            if let Some(status) = event.try_take() {
                return Ok(status);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                // Arrived since the last poll, or dropped when it does
                return match event.abandon() {
                    Some(status) => Ok(status),
                    None => {
                        warn!("{}: no completion after {timeout:?}", event.name());
                        Err(Error::Timeout)
                    }
                };
            }

            // Yield with reasonable delay to avoid spinning too fast
            D::delay().await;
        }
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
