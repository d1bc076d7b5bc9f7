//! Vocabulary shared with the WLC stack: status codes, events, and the
//! end-of-power-transfer condition.

// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

use core::fmt;

/// Raw event code: WLC module enable result
pub const ENABLE_RESULT: u8 = 0x00;
/// Raw event code: WLC poller session start result
pub const START_RESULT: u8 = 0x01;
/// Raw event code: wireless power transfer start result
pub const START_WPT_RESULT: u8 = 0x02;
/// Raw event code: power transfer phase completed
pub const CHARGING_RESULT: u8 = 0x03;

/// Poller mode in which the host drives each WLC protocol step.
pub const MODE_NON_AUTONOMOUS_WLCP: i32 = 0;

/// Status code reported by the WLC stack, either as the immediate result of
/// issuing a request, or inside a result event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub u8);

impl Status {
    pub const OK: Status = Status(0x00);
    pub const REJECTED: Status = Status(0x01);
    pub const FAILED: Status = Status(0x03);
    pub const NOT_INITIALIZED: Status = Status(0x04);

    pub const fn is_ok(self) -> bool {
        self.0 == Self::OK.0
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Status(value)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Status::OK => write!(f, "OK"),
            Status::REJECTED => write!(f, "REJECTED"),
            Status::FAILED => write!(f, "FAILED"),
            Status::NOT_INITIALIZED => write!(f, "NOT_INITIALIZED"),
            Status(other) => write!(f, "{other:#04X}"),
        }
    }
}

/// Event delivered by the WLC stack to the registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WlcEvent {
    /// Whether the WLC module was enabled
    EnableResult { status: Status },
    /// Whether the WLC poller session started
    StartResult { status: Status },
    /// Whether wireless power transfer started
    StartWptResult { status: Status },
    /// Power transfer phase completed, unsolicited
    ChargingResult { end_condition: u8 },
    /// Event code this crate does not handle
    Unknown(u8),
}

impl WlcEvent {
    /// Build an event from the raw code and its single data byte, which is
    /// a status for the result events and the end condition for
    /// [`CHARGING_RESULT`].
    pub fn from_raw(code: u8, value: u8) -> Self {
        match code {
            ENABLE_RESULT => WlcEvent::EnableResult {
                status: Status(value),
            },
            START_RESULT => WlcEvent::StartResult {
                status: Status(value),
            },
            START_WPT_RESULT => WlcEvent::StartWptResult {
                status: Status(value),
            },
            CHARGING_RESULT => WlcEvent::ChargingResult {
                end_condition: value,
            },
            other => WlcEvent::Unknown(other),
        }
    }

    /// Raw event code
    pub fn code(&self) -> u8 {
        match self {
            WlcEvent::EnableResult { .. } => ENABLE_RESULT,
            WlcEvent::StartResult { .. } => START_RESULT,
            WlcEvent::StartWptResult { .. } => START_WPT_RESULT,
            WlcEvent::ChargingResult { .. } => CHARGING_RESULT,
            WlcEvent::Unknown(code) => *code,
        }
    }
}

/// Why a power transfer phase ended.
///
/// Listeners receive the raw byte; this is a convenience for interpreting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCondition {
    /// WPT duration elapsed
    TimeCompleted,
    /// Foreign object detected, or the listener device was removed
    FodOrRemoval,
    /// Any other value, treated as an error by the controller
    Error(u8),
}

impl From<u8> for EndCondition {
    fn from(value: u8) -> Self {
        match value {
            0x00 => EndCondition::TimeCompleted,
            0x01 => EndCondition::FodOrRemoval,
            other => EndCondition::Error(other),
        }
    }
}

impl fmt::Display for EndCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndCondition::TimeCompleted => write!(f, "time completed"),
            EndCondition::FodOrRemoval => write!(f, "FOD detection or removal"),
            EndCondition::Error(value) => write!(f, "error ({value:#04X})"),
        }
    }
}
