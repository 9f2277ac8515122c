//! The protocol client seam.
//!
//! A [`MaestroClient`] owns the serial link and turns method calls into
//! Maestro command bytes. The board depends on exactly this surface and never
//! touches the serial ports itself.

use crate::error::Result;

/// Receives the single response to an asynchronous client request.
///
/// A client may invoke it synchronously from inside the primitive that
/// issued the request or later, when the response bytes arrive. A primitive
/// that returns `Err` should not have invoked its responder; if it did, the
/// board keeps the delivered response and ignores the error.
pub type Responder<T> = Box<dyn FnOnce(T)>;

/// Link-level events reported by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Both ports are open and the device accepts commands.
    Ready,
    /// The serial link failed.
    Error {
        /// Client specific error code.
        code: i32,
        /// Description of the failure.
        message: String,
    },
}

/// Serial mode configured on the device with the Maestro Control Center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialMode {
    /// Command port plus TTL port. Required by the board.
    UsbDualPort,
    /// Command port chained to the TTL serial line.
    UsbChained,
    /// TTL serial only, baud rate detected from the first byte.
    UartDetectBaudRate,
    /// TTL serial only, fixed baud rate.
    UartFixedBaudRate,
}

/// Maestro command protocol client.
pub trait MaestroClient {
    /// Serial mode the connected device runs in.
    fn serial_mode(&self) -> SerialMode;

    /// Returns the next pending link event, if any.
    fn next_event(&mut self) -> Option<ClientEvent>;

    /// Sets the target of `channel` in quarter-microseconds.
    fn set_target(&mut self, channel: u8, target: u16) -> Result<()>;

    /// Drives the hardware PWM channel with the given on-time and period.
    fn set_pwm(&mut self, on_time: u16, period: u16) -> Result<()>;

    /// Sets an 8-bit target (Mini SSC style command).
    fn set_8bit_target(&mut self, channel: u8, value: u8) -> Result<()>;

    fn digital_write(&mut self, channel: u8, level: bool) -> Result<()>;

    fn digital_read(&mut self, channel: u8, respond: Responder<bool>) -> Result<()>;

    /// Reads a 10-bit analog input (0-1023).
    fn analog_read(&mut self, channel: u8, respond: Responder<u16>) -> Result<()>;

    /// Restarts the device script at `subroutine` and responds with the bytes
    /// the script sends back.
    fn restart_script_at_subroutine(
        &mut self,
        subroutine: u8,
        respond: Responder<Vec<u8>>,
    ) -> Result<()>;
}
