//! Conversions between logical board units and Maestro device units.
//!
//! Device commands take integral units, so mapped values are rounded to the
//! nearest integer (half away from zero).

use crate::consts::protocol;
use crate::error::{Error, Result};
use log::trace;

/// Linear range conversion.
pub fn map_range(value: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

fn to_device_units(mapped: f64, what: &str, input: f64) -> Result<u16> {
    let rounded = mapped.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > u16::MAX as f64 {
        return Err(Error::ArgumentOutOfRange(format!(
            "{} {} maps to {} device units, outside 0-{}",
            what,
            input,
            rounded,
            u16::MAX
        )));
    }
    Ok(rounded as u16)
}

/// Converts servo degrees (0-180) to a target in quarter-microseconds (640-2304).
///
/// Degrees outside 0-180 are not clamped; they map outside the nominal pulse
/// range and are sent as-is as long as they fit the protocol's integer.
pub fn degrees_to_target(degrees: f64) -> Result<u16> {
    let mapped = map_range(
        degrees,
        0.0,
        protocol::SERVO_DEGREES_MAX,
        protocol::SERVO_TARGET_MIN as f64,
        protocol::SERVO_TARGET_MAX as f64,
    );
    let target = to_device_units(mapped, "Servo angle", degrees)?;
    trace!("{} degrees -> target {}", degrees, target);
    Ok(target)
}

/// Converts a servo target back to degrees.
pub fn target_to_degrees(target: u16) -> f64 {
    map_range(
        target as f64,
        protocol::SERVO_TARGET_MIN as f64,
        protocol::SERVO_TARGET_MAX as f64,
        0.0,
        protocol::SERVO_DEGREES_MAX,
    )
}

/// Converts an analog level (0-255) to a PWM on-time (0-1024) for the fixed
/// period `protocol::PWM_PERIOD`.
pub fn level_to_pwm_on_time(level: u8) -> Result<u16> {
    let mapped = map_range(
        level as f64,
        0.0,
        protocol::ANALOG_LEVEL_MAX as f64,
        0.0,
        protocol::PWM_ON_TIME_MAX as f64,
    );
    let on_time = to_device_units(mapped, "Analog level", level as f64)?;
    trace!("level {} -> PWM on-time {}", level, on_time);
    Ok(on_time)
}

/// Converts a PWM on-time back to an analog level.
pub fn pwm_on_time_to_level(on_time: u16) -> f64 {
    map_range(
        on_time as f64,
        0.0,
        protocol::PWM_ON_TIME_MAX as f64,
        0.0,
        protocol::ANALOG_LEVEL_MAX as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_servo_endpoints() {
        assert_eq!(degrees_to_target(0.0).unwrap(), 640);
        assert_eq!(degrees_to_target(180.0).unwrap(), 2304);
        assert_eq!(degrees_to_target(90.0).unwrap(), 1472);
    }

    #[test]
    fn test_pwm_endpoints() {
        assert_eq!(level_to_pwm_on_time(0).unwrap(), 0);
        assert_eq!(level_to_pwm_on_time(255).unwrap(), 1024);
        // 128 * 1024 / 255 = 514.0078...
        assert_eq!(level_to_pwm_on_time(128).unwrap(), 514);
    }

    #[test]
    fn test_inverse_mappings() {
        for degrees in [0.0, 45.0, 90.0, 135.0, 180.0] {
            let mapped = map_range(degrees, 0.0, 180.0, 640.0, 2304.0);
            assert_relative_eq!(
                map_range(mapped, 640.0, 2304.0, 0.0, 180.0),
                degrees,
                epsilon = 1e-9
            );
        }
        assert_relative_eq!(target_to_degrees(640), 0.0);
        assert_relative_eq!(target_to_degrees(2304), 180.0);
        assert_relative_eq!(pwm_on_time_to_level(0), 0.0);
        assert_relative_eq!(pwm_on_time_to_level(1024), 255.0);
        // Rounding keeps every level within one unit of its origin.
        for level in 0..=255u8 {
            let on_time = level_to_pwm_on_time(level).unwrap();
            assert_relative_eq!(pwm_on_time_to_level(on_time), level as f64, epsilon = 0.5);
        }
    }

    #[test]
    fn test_out_of_range_degrees_pass_through() {
        // 190 degrees is beyond the nominal range but still representable.
        let target = degrees_to_target(190.0).unwrap();
        assert!(target > 2304);
        // Far negative angles cannot be expressed as an unsigned target.
        assert!(matches!(
            degrees_to_target(-100.0),
            Err(Error::ArgumentOutOfRange(_))
        ));
        assert!(degrees_to_target(f64::NAN).is_err());
    }
}
