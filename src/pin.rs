//! Pin modes, per-pin capability sets and the capability table builder.

use crate::consts::protocol;
use crate::error::{Error, Result};
use log::{debug, warn};
use std::fmt;

/// Pin mode codes of the generic board contract (`MODES`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Digital input.
    Input = 0x00,
    /// Digital output.
    Output = 0x01,
    /// Analog input.
    Analog = 0x02,
    /// Hardware PWM output.
    Pwm = 0x03,
    /// Servo pulse output.
    Servo = 0x04,
}

impl PinMode {
    /// All modes, in code order.
    pub const ALL: [PinMode; 5] = [
        PinMode::Input,
        PinMode::Output,
        PinMode::Analog,
        PinMode::Pwm,
        PinMode::Servo,
    ];

    /// Returns the mode for a protocol code, or `None` for codes 5-255.
    pub fn from_code(code: u8) -> Option<Self> {
        PinMode::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Returns the protocol code of the mode.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self.code()
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinMode::Input => "input",
            PinMode::Output => "output",
            PinMode::Analog => "analog",
            PinMode::Pwm => "PWM",
            PinMode::Servo => "servo",
        };
        f.write_str(name)
    }
}

/// Set of modes a pin supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeSet(u8);

impl ModeSet {
    /// An empty set.
    pub const fn empty() -> Self {
        ModeSet(0)
    }

    /// Returns the set with `mode` added.
    #[must_use]
    pub fn with(mut self, mode: PinMode) -> Self {
        self.insert(mode);
        self
    }

    pub fn insert(&mut self, mode: PinMode) {
        self.0 |= mode.bit();
    }

    pub fn contains(&self, mode: PinMode) -> bool {
        self.0 & mode.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterates the contained modes in code order.
    pub fn iter(&self) -> impl Iterator<Item = PinMode> + '_ {
        PinMode::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

impl FromIterator<PinMode> for ModeSet {
    fn from_iter<I: IntoIterator<Item = PinMode>>(iter: I) -> Self {
        iter.into_iter().fold(ModeSet::empty(), ModeSet::with)
    }
}

/// Channel layout of a Maestro model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceVariant {
    channels: u8,
}

impl DeviceVariant {
    /// Micro Maestro 6.
    pub const MICRO_6: DeviceVariant = DeviceVariant { channels: 6 };
    /// Mini Maestro 12.
    pub const MINI_12: DeviceVariant = DeviceVariant { channels: 12 };
    /// Mini Maestro 18.
    pub const MINI_18: DeviceVariant = DeviceVariant { channels: 18 };
    /// Mini Maestro 24.
    pub const MINI_24: DeviceVariant = DeviceVariant { channels: 24 };

    /// Creates a variant for any channel count, e.g. one reported by the device.
    pub const fn new(channels: u8) -> Self {
        DeviceVariant { channels }
    }

    /// Number of channels.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// The one channel that can emit hardware PWM, if the model has one.
    pub fn pwm_channel(&self) -> Option<u8> {
        match self.channels {
            12 => Some(8),
            18 | 24 => Some(12),
            _ => None,
        }
    }

    /// Whether channel `index` is wired for analog sensing.
    #[inline]
    pub fn is_analog_capable(&self, index: u8) -> bool {
        index < protocol::ANALOG_CHANNEL_LIMIT
    }

    /// Supported modes of channel `index` on this model.
    pub fn supported_modes(&self, index: u8) -> ModeSet {
        let mut modes = ModeSet::empty().with(PinMode::Output).with(PinMode::Servo);
        if self.pwm_channel() == Some(index) {
            modes.insert(PinMode::Pwm);
        }
        if self.is_analog_capable(index) {
            modes.insert(PinMode::Analog);
        } else {
            modes.insert(PinMode::Input);
        }
        modes
    }
}

/// One addressable channel of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    index: u8,
    mode: PinMode,
    supported: ModeSet,
    value: u16,
    report: bool,
}

impl Pin {
    #[inline]
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Modes detected at discovery. Never changes afterwards.
    #[inline]
    pub fn supported_modes(&self) -> ModeSet {
        self.supported
    }

    #[inline]
    pub fn supports(&self, mode: PinMode) -> bool {
        self.supported.contains(mode)
    }

    /// Last known value in logical units.
    #[inline]
    pub fn value(&self) -> u16 {
        self.value
    }

    #[inline]
    pub fn report_enabled(&self) -> bool {
        self.report
    }

    pub(crate) fn set_mode(&mut self, mode: PinMode) -> Result<()> {
        if !self.supports(mode) {
            let supported: Vec<PinMode> = self.supported.iter().collect();
            return Err(Error::Capability {
                pin: self.index,
                mode,
                reason: format!("supported modes are {:?}", supported),
            });
        }
        self.mode = mode;
        Ok(())
    }

    pub(crate) fn set_value(&mut self, value: u16) {
        self.value = value;
    }
}

/// Source of the initial pin modes for [`build_capability_table`].
#[derive(Debug, Clone, Copy)]
pub enum InitialModes<'a> {
    /// Raw per-channel bytes from a capability dump; the mode is the low 3 bits.
    Reported(&'a [u8]),
    /// Caller supplied modes; `None` means output.
    Configured(&'a [Option<PinMode>]),
}

/// Builds the pin table for `variant`.
///
/// This is the only place pins are created. Configured modes must be in the
/// pin's supported set, otherwise the build fails with
/// [`Error::Configuration`].
///
/// Reported modes are an exception to the rule that a pin's mode is one of
/// its supported modes: they are kept exactly as the device states them,
/// with a warning when the layout rules do not list them. A 3-channel dump
/// `[1, 2, 3]` therefore yields Output, Analog and Pwm pins even though no
/// 3-channel layout has a PWM channel. Writes still only move a pin into a
/// supported mode.
pub fn build_capability_table(
    variant: DeviceVariant,
    initial: InitialModes<'_>,
) -> Result<Vec<Pin>> {
    let count = variant.channels() as usize;
    match initial {
        InitialModes::Reported(raw) if raw.len() < count => {
            return Err(Error::InvalidResponse(format!(
                "capability dump lists {} channels but carries {} mode bytes",
                count,
                raw.len()
            )));
        }
        InitialModes::Configured(modes) if modes.len() != count => {
            return Err(Error::Configuration(format!(
                "pin mode array has {} entries, device variant has {} channels",
                modes.len(),
                count
            )));
        }
        _ => {}
    }

    let mut pins = Vec::with_capacity(count);
    for index in 0..variant.channels() {
        let supported = variant.supported_modes(index);
        let mode = match initial {
            InitialModes::Reported(raw) => {
                let code = raw[index as usize] & protocol::RAW_MODE_MASK;
                match PinMode::from_code(code) {
                    Some(mode) => {
                        if !supported.contains(mode) {
                            warn!(
                                "Device reports pin {} in {} mode, which its layout does not list",
                                index, mode
                            );
                        }
                        mode
                    }
                    None => {
                        warn!(
                            "Device reports unknown mode code {} for pin {}, assuming output",
                            code, index
                        );
                        PinMode::Output
                    }
                }
            }
            InitialModes::Configured(modes) => {
                let mode = modes[index as usize].unwrap_or(PinMode::Output);
                if !supported.contains(mode) {
                    return Err(Error::Configuration(format!(
                        "pin {} cannot be configured as {} on a {}-channel device",
                        index,
                        mode,
                        variant.channels()
                    )));
                }
                mode
            }
        };
        pins.push(Pin {
            index,
            mode,
            supported,
            value: 0,
            report: true,
        });
    }
    debug!(
        "Built capability table for {} channels (PWM channel: {:?})",
        count,
        variant.pwm_channel()
    );
    Ok(pins)
}
