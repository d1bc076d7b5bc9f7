//! Push path for the end of a power transfer phase.
//!
//! The runtime registers a [`ChargingListener`] with the bridge.  When the
//! stack reports [`crate::event::WlcEvent::ChargingResult`] the end condition
//! is forwarded to it on the stack's callback thread.  Nothing is queued: with
//! no listener attached the notification is logged and dropped.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Result of delivering a notification to a listener.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Runtime-side receiver of charging completion notifications.
pub trait ChargingListener: Send + Sync {
    /// Called once per completed power transfer phase with the controller's
    /// end condition byte.  See [`crate::event::EndCondition`].
    ///
    /// An error returned here, or a panic, is logged and discarded.
    fn on_charging_complete(&self, end_condition: u8) -> ListenerResult;
}

#[derive(Default)]
pub(crate) struct ListenerSlot {
    listener: RwLock<Option<Arc<dyn ChargingListener>>>,
}

impl ListenerSlot {
    /// Returns the previously attached listener, if any.
    pub(crate) fn attach(
        &self,
        listener: Arc<dyn ChargingListener>,
    ) -> Option<Arc<dyn ChargingListener>> {
        self.listener
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(listener)
    }

    pub(crate) fn detach(&self) -> Option<Arc<dyn ChargingListener>> {
        self.listener
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Deliver `end_condition` to the attached listener.  Returns whether it
    /// was accepted.
    pub(crate) fn notify(&self, end_condition: u8) -> bool {
        // Clone out so a listener may detach itself without deadlocking.
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some(listener) = listener else {
            error!("No charging listener attached, dropping end condition {end_condition:#04X}");
            return false;
        };

        debug!("Notifying charging complete, end condition {end_condition:#04X}");
        match catch_unwind(AssertUnwindSafe(|| {
            listener.on_charging_complete(end_condition)
        })) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                error!("Charging listener failed: {e}");
                false
            }
            Err(_) => {
                error!("Charging listener panicked");
                false
            }
        }
    }
}
