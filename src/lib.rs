//! # maestro-ioboard
//!
//! A Rust crate that drives a Pololu Maestro USB servo controller through a
//! generic digital/analog I/O board interface ([`IoBoard`]), so automation
//! code written for other boards can use a Maestro unchanged.
//!
//! The crate is the adaptation layer only. The Maestro command protocol and
//! its serial transport sit behind the [`MaestroClient`] trait.
//!
//! ## Features
//!
//! *   Port discovery: pairing the command port with its companion TTL port (`resolve_ttl_port`, `SystemPorts`).
//! *   Capability detection from the device's capability dump script (`MaestroBoard::discover`),
//!     or from an explicit layout (`MaestroBoard::with_client`).
//! *   Per-pin capability validation before any command is sent.
//! *   Unit conversion:
//!     *   Servo degrees (0-180) to quarter-microsecond targets (640-2304).
//!     *   Analog levels (0-255) to PWM on-times (0-1024, period 4800).
//! *   Asynchronous queries (version, firmware, analog/digital reads) with
//!     per-kind correlation and configurable timeouts.
//!
//! ## Device Support & Limitations
//!
//! *   **Serial mode:** the Maestro must be set to **USB Dual Port** with the Maestro Control Center.
//! *   **Port pairing** assumes the TTL port is enumerated right after the command port.
//!     This is platform dependent and best-effort; if no companion port is found the TTL
//!     side falls back to the null device and a warning is logged.
//! *   **PWM:** only one channel can emit hardware PWM (channel 8 on the Mini Maestro 12,
//!     channel 12 on the Mini Maestro 18/24). `analog_write` on any other pin fails with
//!     a "non-PWM port" capability error.
//! *   **Analog inputs** exist on channels 0-11 only; higher channels are digital inputs.
//! *   **Queries** use device-resident script subroutines: 0 = version, 1 = firmware,
//!     2 = capability dump. The script must implement them.
//! *   Only one query of each kind may be in flight, since responses are untagged.
//! *   I2C, steppers, pin reporting and reset are not supported.
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! maestro-ioboard = "0.1.0" # Replace with the latest version
//! log = "0.4"               # Optional, for logging
//!
//! [dev-dependencies]
//! env_logger = "0.11"
//! ```
//!
//! ## Basic Usage
//!
//! ```no_run
//! use maestro_ioboard::{
//!     BoardConfig, IoBoard, MaestroBoard, MaestroClient, PortPair, Result, SystemPorts,
//! };
//!
//! fn run<C: MaestroClient>(open: impl FnOnce(&PortPair) -> Result<C>) -> Result<()> {
//!     // Optional: Initialize logging
//!     // env_logger::init();
//!
//!     let mut board = MaestroBoard::discover(
//!         "/dev/ttyACM0",
//!         &SystemPorts,
//!         open,
//!         || println!("Maestro ready"),
//!         BoardConfig::default(),
//!     )?;
//!
//!     // Drive the event loop until the capability dump has arrived.
//!     while !board.is_ready() {
//!         board.process_events();
//!     }
//!
//!     board.servo_write(0, 90.0)?;
//!     board.analog_read(1, Box::new(|level| println!("Pin 1 reads {:?}", level)))?;
//!     Ok(())
//! }
//! ```
//!
//! ## License
//!
//! This project is licensed under the WTFPL - see the [LICENSE](LICENSE) file for details.

// Keep internal helpers private, re-export public types
pub mod board;
pub mod client;
mod config;
pub mod consts;
pub mod discovery;
mod error;
mod maestro;
pub mod pin;
pub mod ports;
mod query;
pub mod units;
mod validate;

pub use board::{Callback, IoBoard, PulseInOptions, StepperConfig, StepperMove};
pub use client::{ClientEvent, MaestroClient, Responder, SerialMode};
pub use config::BoardConfig;
pub use consts::{HIGH, LOW};
pub use discovery::DiscoveryPhase;
pub use error::{Error, Result};
pub use maestro::MaestroBoard;
pub use pin::{build_capability_table, DeviceVariant, InitialModes, ModeSet, Pin, PinMode};
pub use ports::{resolve_ttl_port, PortEnumerator, PortPair, SerialPortEntry, SystemPorts};
pub use query::QueryKind;
pub use validate::validate;
