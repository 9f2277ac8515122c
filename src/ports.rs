//! Serial port enumeration and command/TTL port pairing.
//!
//! In "USB Dual Port" serial mode the Maestro shows up as two serial devices:
//! the command port and the TTL port. Nothing in the enumeration ties the two
//! together, so the TTL port is taken to be the entry listed right after the
//! command port.
//!
//! **Best-effort:** enumeration order is decided by the OS and is not
//! guaranteed to be stable across reboots or re-plugging. Check
//! [`PortPair::is_paired`] and the link readiness rather than trusting the
//! pairing blindly.

use crate::error::Result;
use log::{debug, trace, warn};

/// One serial device as listed by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortEntry {
    /// Port name, e.g. `/dev/ttyACM0` or `COM3`.
    pub name: String,
    /// Position in the OS listing.
    pub order: usize,
}

impl SerialPortEntry {
    pub fn new(name: impl Into<String>, order: usize) -> Self {
        SerialPortEntry {
            name: name.into(),
            order,
        }
    }
}

/// Lists the serial devices currently attached.
pub trait PortEnumerator {
    fn list_ports(&self) -> Result<Vec<SerialPortEntry>>;
}

/// [`PortEnumerator`] backed by `serialport::available_ports`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn list_ports(&self) -> Result<Vec<SerialPortEntry>> {
        let ports = serialport::available_ports()?;
        Ok(ports
            .into_iter()
            .enumerate()
            .map(|(order, info)| {
                trace!("Found serial port {}: {:?}", info.port_name, info.port_type);
                SerialPortEntry::new(info.port_name, order)
            })
            .collect())
    }
}

/// The two serial endpoints of a dual-port Maestro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPair {
    /// Port carrying protocol commands.
    pub command: String,
    /// Companion TTL port, or the null device when none was found.
    pub ttl: String,
    null_device: String,
}

impl PortPair {
    pub fn new(
        command: impl Into<String>,
        ttl: impl Into<String>,
        null_device: impl Into<String>,
    ) -> Self {
        PortPair {
            command: command.into(),
            ttl: ttl.into(),
            null_device: null_device.into(),
        }
    }

    /// `false` when the TTL side fell back to the null device.
    pub fn is_paired(&self) -> bool {
        self.ttl != self.null_device
    }
}

/// Returns the name of the port listed after `command_port`.
///
/// Entries are considered in `order`. Falls back to `null_device` (with a
/// warning) when the command port is missing or listed last.
pub fn resolve_ttl_port(
    command_port: &str,
    ports: &[SerialPortEntry],
    null_device: &str,
) -> String {
    let mut ordered: Vec<&SerialPortEntry> = ports.iter().collect();
    ordered.sort_by_key(|p| p.order);

    let position = ordered.iter().position(|p| p.name == command_port);
    match position.and_then(|i| ordered.get(i + 1)) {
        Some(ttl) => {
            debug!(
                "Paired command port {} with TTL port {}",
                command_port, ttl.name
            );
            ttl.name.clone()
        }
        None => {
            if position.is_some() {
                warn!(
                    "Command port {} is the last enumerated port, no TTL port to pair; using {}",
                    command_port, null_device
                );
            } else {
                warn!(
                    "Command port {} not found among {} serial ports; using {}",
                    command_port,
                    ports.len(),
                    null_device
                );
            }
            null_device.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Vec<SerialPortEntry> {
        vec![
            SerialPortEntry::new("A", 0),
            SerialPortEntry::new("B", 1),
            SerialPortEntry::new("C", 2),
        ]
    }

    #[test]
    fn test_pairs_with_next_port() {
        assert_eq!(resolve_ttl_port("B", &abc(), "/dev/null"), "C");
        assert_eq!(resolve_ttl_port("A", &abc(), "/dev/null"), "B");
    }

    #[test]
    fn test_last_port_falls_back() {
        assert_eq!(resolve_ttl_port("C", &abc(), "/dev/null"), "/dev/null");
    }

    #[test]
    fn test_unknown_port_falls_back() {
        assert_eq!(resolve_ttl_port("Z", &abc(), "NUL"), "NUL");
        assert_eq!(resolve_ttl_port("A", &[], "NUL"), "NUL");
    }

    #[test]
    fn test_uses_enumeration_order() {
        let ports = vec![
            SerialPortEntry::new("C", 2),
            SerialPortEntry::new("A", 0),
            SerialPortEntry::new("B", 1),
        ];
        assert_eq!(resolve_ttl_port("A", &ports, "/dev/null"), "B");
    }

    #[test]
    fn test_pair_reports_fallback() {
        assert!(PortPair::new("B", "C", "/dev/null").is_paired());
        assert!(!PortPair::new("C", "/dev/null", "/dev/null").is_paired());
    }
}
