//! Discovery state machine and capability dump parsing.

use crate::error::{Error, Result};
use crate::pin::DeviceVariant;
use log::{debug, trace};

/// Phases of board discovery.
///
/// `Unstarted -> PortsEnumerated -> Connecting -> AwaitingCapabilityResponse -> Ready`,
/// with `Failed` reachable from every other phase. `Failed` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    Unstarted,
    PortsEnumerated,
    Connecting,
    AwaitingCapabilityResponse,
    Ready,
    Failed,
}

impl DiscoveryPhase {
    fn successor(self) -> Option<DiscoveryPhase> {
        match self {
            DiscoveryPhase::Unstarted => Some(DiscoveryPhase::PortsEnumerated),
            DiscoveryPhase::PortsEnumerated => Some(DiscoveryPhase::Connecting),
            DiscoveryPhase::Connecting => Some(DiscoveryPhase::AwaitingCapabilityResponse),
            DiscoveryPhase::AwaitingCapabilityResponse => Some(DiscoveryPhase::Ready),
            DiscoveryPhase::Ready | DiscoveryPhase::Failed => None,
        }
    }

    /// Moves to `next`, refusing skipped, repeated or backward steps.
    pub fn advance(&mut self, next: DiscoveryPhase) -> Result<()> {
        let legal = match next {
            DiscoveryPhase::Failed => *self != DiscoveryPhase::Failed,
            _ => self.successor() == Some(next),
        };
        if !legal {
            return Err(Error::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        debug!("Discovery phase {:?} -> {:?}", self, next);
        *self = next;
        Ok(())
    }

    #[inline]
    pub fn is_ready(self) -> bool {
        self == DiscoveryPhase::Ready
    }
}

/// Splits a capability dump into the device variant and its raw mode bytes.
///
/// Byte 0 is the channel count; one mode byte per channel follows.
pub fn parse_capability_dump(data: &[u8]) -> Result<(DeviceVariant, &[u8])> {
    let (&count, rest) = data
        .split_first()
        .ok_or_else(|| Error::InvalidResponse("empty capability dump".to_string()))?;
    if rest.len() < count as usize {
        return Err(Error::InvalidResponse(format!(
            "capability dump lists {} channels but carries {} mode bytes",
            count,
            rest.len()
        )));
    }
    if rest.len() > count as usize {
        trace!(
            "Ignoring {} trailing bytes in capability dump",
            rest.len() - count as usize
        );
    }
    Ok((DeviceVariant::new(count), &rest[..count as usize]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut phase = DiscoveryPhase::Unstarted;
        for next in [
            DiscoveryPhase::PortsEnumerated,
            DiscoveryPhase::Connecting,
            DiscoveryPhase::AwaitingCapabilityResponse,
            DiscoveryPhase::Ready,
        ] {
            phase.advance(next).unwrap();
        }
        assert!(phase.is_ready());
        // Ready is entered at most once.
        assert!(phase.advance(DiscoveryPhase::Ready).is_err());
    }

    #[test]
    fn test_skipping_is_rejected() {
        let mut phase = DiscoveryPhase::PortsEnumerated;
        match phase.advance(DiscoveryPhase::AwaitingCapabilityResponse) {
            Err(Error::InvalidTransition { from, to }) => {
                assert_eq!(from, DiscoveryPhase::PortsEnumerated);
                assert_eq!(to, DiscoveryPhase::AwaitingCapabilityResponse);
            }
            other => panic!("Expected InvalidTransition error, got: {:?}", other),
        }
        assert_eq!(phase, DiscoveryPhase::PortsEnumerated);
    }

    #[test]
    fn test_failed_is_final() {
        let mut phase = DiscoveryPhase::Ready;
        phase.advance(DiscoveryPhase::Failed).unwrap();
        assert!(phase.advance(DiscoveryPhase::Failed).is_err());
        assert!(phase.advance(DiscoveryPhase::Unstarted).is_err());
    }

    #[test]
    fn test_parse_dump() {
        let (variant, modes) = parse_capability_dump(&[3, 0x01, 0x02, 0x03, 0xFF]).unwrap();
        assert_eq!(variant.channels(), 3);
        assert_eq!(modes, &[0x01, 0x02, 0x03]);

        assert!(matches!(parse_capability_dump(&[]), Err(Error::InvalidResponse(_))));
        assert!(matches!(
            parse_capability_dump(&[4, 1, 1]),
            Err(Error::InvalidResponse(_))
        ));
    }
}
