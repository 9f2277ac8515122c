//! Shared board constants and Maestro protocol constants.
//!
//! The generic I/O board contract exposes a handful of constant namespaces
//! (`MODES`, `I2C_MODES`, `STEPPER`, `HIGH`, `LOW`). They are plain values
//! here; `PinMode` in [`crate::pin`] carries the `MODES` codes.

/// Logic high level for `digital_write`.
pub const HIGH: u8 = 1;
/// Logic low level for `digital_write`.
pub const LOW: u8 = 0;

/// I2C request modes. The Maestro has no I2C support; these exist so callers
/// written against the generic board contract still compile.
pub mod i2c_modes {
    pub const WRITE: u8 = 0x00;
    pub const READ: u8 = 0x01;
    pub const CONTINUOUS_READ: u8 = 0x02;
    pub const STOP_READING: u8 = 0x03;
}

/// Stepper constants of the generic board contract.
pub mod stepper {
    /// Stepper driver wiring.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StepperType {
        /// Step/direction driver (e.g. EasyDriver).
        Driver = 1,
        TwoWire = 2,
        FourWire = 4,
    }

    /// Stepper run state as reported by boards that support steppers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RunState {
        Stop = 0,
        Accel = 1,
        Decel = 2,
        Run = 3,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Direction {
        /// Counter-clockwise.
        Ccw = 0,
        /// Clockwise.
        Cw = 1,
    }
}

// --- Maestro protocol constants ---
pub mod protocol {
    /// Servo target for 0 degrees, in quarter-microseconds.
    pub const SERVO_TARGET_MIN: u16 = 640;
    /// Servo target for 180 degrees, in quarter-microseconds.
    pub const SERVO_TARGET_MAX: u16 = 2304;
    pub const SERVO_DEGREES_MAX: f64 = 180.0;

    /// Largest logical level accepted by `analog_write`.
    pub const ANALOG_LEVEL_MAX: u8 = 255;
    /// PWM on-time corresponding to `ANALOG_LEVEL_MAX`.
    pub const PWM_ON_TIME_MAX: u16 = 1024;
    /// PWM period sent with every `set_pwm` command.
    pub const PWM_PERIOD: u16 = 4800;

    /// Low three bits of a reported pin byte carry its mode code.
    pub const RAW_MODE_MASK: u8 = 0x07;
    /// Analog sensing is only wired on the first 12 channels.
    pub const ANALOG_CHANNEL_LIMIT: u8 = 12;

    // Script subroutines used as queries. These indices are burned into the
    // device-resident script and must not be renumbered.
    pub const SUBROUTINE_VERSION: u8 = 0;
    pub const SUBROUTINE_FIRMWARE: u8 = 1;
    pub const SUBROUTINE_CAPABILITIES: u8 = 2;
}

/// Default time a query may stay unanswered before its callback receives
/// `Error::Timeout`.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 1000;

/// Device path used when no companion TTL port can be paired.
#[cfg(windows)]
pub const NULL_DEVICE: &str = "NUL";
/// Device path used when no companion TTL port can be paired.
#[cfg(not(windows))]
pub const NULL_DEVICE: &str = "/dev/null";
