//! The generic I/O board contract.
//!
//! Automation code written against [`IoBoard`] can drive any board adapter.
//! Boards implement every method; operations their hardware cannot perform
//! are either logged no-ops or return [`Error::UnsupportedFeature`](crate::Error::UnsupportedFeature).

use crate::consts::stepper::{Direction, StepperType};
use crate::error::Result;
use crate::pin::PinMode;
use std::time::Duration;

/// Receives the outcome of an asynchronous read or query exactly once.
///
/// If the method that took the callback returns an error, the callback is
/// dropped without being called. A response the client delivered before
/// failing still counts: the callback gets it and the method returns `Ok`.
pub type Callback<T> = Box<dyn FnOnce(Result<T>)>;

/// Parameters of a `pulse_in` measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseInOptions {
    pub pin: u8,
    /// Level of the pulse to time.
    pub value: u8,
    /// Level driven on the pin before measuring.
    pub pulse_out: Option<u8>,
    pub timeout: Duration,
}

/// Stepper wiring passed to `stepper_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepperConfig {
    /// Stepper slot (0-5).
    pub device_num: u8,
    pub stepper_type: StepperType,
    pub steps_per_rev: u16,
    /// Direction/step pins for a driver, otherwise motor pins 1-4.
    pub pins: Vec<u8>,
}

/// A stepper move passed to `stepper_step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepperMove {
    pub device_num: u8,
    pub direction: Direction,
    pub steps: u32,
    /// Speed in 0.01 rad/s.
    pub speed: u16,
    /// Acceleration and deceleration in 0.01 rad/s^2.
    pub accel: Option<(u16, u16)>,
}

/// Operations every board adapter provides.
pub trait IoBoard {
    /// Whether discovery finished and the board accepts operations.
    fn is_ready(&self) -> bool;

    /// Indices of pins that can be read as analog inputs.
    fn analog_pins(&self) -> Vec<u8>;

    /// Reports the board's protocol version.
    fn report_version(&mut self, callback: Callback<u8>) -> Result<()>;

    /// Reports the board's firmware identification bytes.
    fn query_firmware(&mut self, callback: Callback<Vec<u8>>) -> Result<()>;

    fn analog_read(&mut self, pin: u8, callback: Callback<u16>) -> Result<()>;

    /// Writes an 8-bit analog level (0-255) as a PWM duty cycle.
    fn analog_write(&mut self, pin: u8, value: u8) -> Result<()>;

    /// Moves a servo to `degrees` (0-180).
    fn servo_write(&mut self, pin: u8, degrees: f64) -> Result<()>;

    /// Sets a pin mode.
    fn pin_mode(&mut self, pin: u8, mode: PinMode);

    /// Writes a digital level; any non-zero value is high.
    fn digital_write(&mut self, pin: u8, value: u8) -> Result<()>;

    fn digital_read(&mut self, pin: u8, callback: Callback<bool>) -> Result<()>;

    fn query_capabilities(&mut self, callback: Callback<()>);

    fn query_analog_mapping(&mut self, callback: Callback<()>);

    fn query_pin_state(&mut self, pin: u8, callback: Callback<PinMode>);

    fn set_sampling_interval(&mut self, interval: Duration);

    fn report_analog_pin(&mut self, pin: u8, enable: bool);

    fn report_digital_pin(&mut self, pin: u8, enable: bool);

    fn pulse_in(&mut self, options: PulseInOptions, callback: Callback<u32>);

    fn stepper_config(&mut self, config: StepperConfig);

    fn stepper_step(&mut self, step: StepperMove, callback: Callback<()>);

    /// Resets the board.
    fn reset(&mut self);

    fn send_i2c_config(&mut self, delay_us: u16) -> Result<()>;

    fn send_i2c_write_request(&mut self, address: u8, data: &[u8]) -> Result<()>;

    fn send_i2c_read_request(
        &mut self,
        address: u8,
        len: usize,
        callback: Callback<Vec<u8>>,
    ) -> Result<()>;
}
