use crate::discovery::DiscoveryPhase;
use crate::pin::PinMode;
use crate::query::QueryKind;
use thiserror::Error;

/// Errors that can occur when driving a Maestro through the board interface.
///
/// Configuration and capability errors are returned synchronously before any
/// command reaches the device. Transport errors and timeouts are delivered to
/// the callbacks of pending queries.
#[derive(Error, Debug)]
pub enum Error {
    /// Construction parameters do not describe a usable board.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Pin index is outside the discovered pin table.
    #[error("Pin {pin} out of range (board has {count} pins)")]
    PinOutOfRange {
        /// The requested pin index.
        pin: u8,
        /// Number of pins in the table.
        count: usize,
    },
    /// The pin does not support the mode an operation needs.
    #[error("Pin {pin} does not support {mode} mode: {reason}")]
    Capability {
        /// The pin the operation targeted.
        pin: u8,
        /// The mode the operation needs.
        mode: PinMode,
        /// Human readable constraint.
        reason: String,
    },
    /// Function argument cannot be expressed in device units.
    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),
    /// The controller has no protocol support for the operation.
    #[error("Feature not supported by the Maestro: {0}")]
    UnsupportedFeature(String),
    /// Discovery has not completed, or the board failed.
    #[error("Board is not ready")]
    NotReady,
    /// Another query of the same kind is still awaiting its response.
    #[error("A {0} query is already in flight")]
    QueryInFlight(QueryKind),
    /// The device did not answer a query in time.
    #[error("Timeout waiting for device response")]
    Timeout,
    /// The serial link reported an error.
    #[error("Transport error {code}: {message}")]
    Transport {
        /// Error code reported by the protocol client.
        code: i32,
        /// Error message reported by the protocol client.
        message: String,
    },
    /// A device response could not be interpreted.
    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),
    /// A discovery step was skipped or repeated.
    #[error("Invalid discovery transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Phase the sequencer was in.
        from: DiscoveryPhase,
        /// Phase that was requested.
        to: DiscoveryPhase,
    },
    /// Serial port enumeration failed.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type alias for board operations.
pub type Result<T> = std::result::Result<T, Error>;

// Helpers for the errors raised from several call sites
pub(crate) fn non_pwm_port(pin: u8) -> Error {
    Error::Capability {
        pin,
        mode: PinMode::Pwm,
        reason: "non-PWM port".to_string(),
    }
}

pub(crate) fn unsupported_i2c(method: &str) -> Error {
    Error::UnsupportedFeature(format!("{} (the Maestro has no I2C bus)", method))
}
