//! Capability checks run before any command is sent to the device.

use crate::error::{non_pwm_port, Error, Result};
use crate::pin::{Pin, PinMode};

/// Checks that `pin` exists and supports `required`.
pub fn validate(pins: &[Pin], pin: u8, required: PinMode) -> Result<&Pin> {
    let entry = pins.get(pin as usize).ok_or(Error::PinOutOfRange {
        pin,
        count: pins.len(),
    })?;
    if entry.supports(required) {
        return Ok(entry);
    }
    Err(match required {
        PinMode::Pwm => non_pwm_port(pin),
        mode => Error::Capability {
            pin,
            mode,
            reason: format!("pin {} has no {} capability on this device", pin, mode),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::{build_capability_table, DeviceVariant, InitialModes};

    fn configured(variant: DeviceVariant) -> Vec<Pin> {
        let modes = vec![None; variant.channels() as usize];
        build_capability_table(variant, InitialModes::Configured(&modes)).unwrap()
    }

    #[test]
    fn test_pwm_rejection_names_non_pwm_port() {
        let pins = configured(DeviceVariant::MINI_12);
        assert!(validate(&pins, 8, PinMode::Pwm).is_ok());
        match validate(&pins, 0, PinMode::Pwm) {
            Err(Error::Capability { pin, mode, reason }) => {
                assert_eq!(pin, 0);
                assert_eq!(mode, PinMode::Pwm);
                assert_eq!(reason, "non-PWM port");
            }
            other => panic!("Expected Capability error, got: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_pin() {
        let pins = configured(DeviceVariant::MINI_12);
        match validate(&pins, 12, PinMode::Servo) {
            Err(Error::PinOutOfRange { pin, count }) => {
                assert_eq!(pin, 12);
                assert_eq!(count, 12);
            }
            other => panic!("Expected PinOutOfRange error, got: {:?}", other),
        }
    }

    #[test]
    fn test_digital_input_only_above_analog_channels() {
        let pins = configured(DeviceVariant::MINI_24);
        assert!(validate(&pins, 20, PinMode::Input).is_ok());
        assert!(validate(&pins, 3, PinMode::Analog).is_ok());
        assert!(matches!(
            validate(&pins, 3, PinMode::Input),
            Err(Error::Capability {
                pin: 3,
                mode: PinMode::Input,
                ..
            })
        ));
        assert!(matches!(
            validate(&pins, 20, PinMode::Analog),
            Err(Error::Capability {
                mode: PinMode::Analog,
                ..
            })
        ));
    }
}
