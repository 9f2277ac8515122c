//! Board configuration.

use crate::consts;
use std::time::Duration;

/// Tunables of a [`MaestroBoard`](crate::MaestroBoard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    /// How long a query may wait for its response. `None` waits forever.
    pub query_timeout: Option<Duration>,
    /// Device path used for the TTL side when pairing finds no companion port.
    pub null_device: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            query_timeout: Some(Duration::from_millis(consts::DEFAULT_QUERY_TIMEOUT_MS)),
            null_device: consts::NULL_DEVICE.to_string(),
        }
    }
}

impl BoardConfig {
    #[must_use]
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Never expire queries; a device that does not answer leaves the
    /// callback pending for the lifetime of the board.
    #[must_use]
    pub fn without_query_timeout(mut self) -> Self {
        self.query_timeout = None;
        self
    }

    #[must_use]
    pub fn with_null_device(mut self, path: impl Into<String>) -> Self {
        self.null_device = path.into();
        self
    }
}
