//! Agent configuration.

use std::time::Duration;

use zvariant::OwnedObjectPath;

use crate::Result;
use crate::api::models::BusKind;
use crate::types::constants::{AGENT_PATH, timeouts};

/// Settings for bringing the agent up.
///
/// # Example
///
/// ```
/// use connman_agent::{AgentConfig, BusKind};
/// use std::time::Duration;
///
/// let config = AgentConfig::new()
///     .with_bus(BusKind::Session)
///     .with_register_timeout(Duration::from_secs(5));
/// assert_eq!(config.bus, BusKind::Session);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Bus to connect to.
    pub bus: BusKind,
    /// Object path the agent is exported at and registered under.
    pub agent_path: String,
    /// How long to wait for the manager to answer `RegisterAgent`.
    pub register_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::System,
            agent_path: AGENT_PATH.to_string(),
            register_timeout: timeouts::register_timeout(),
        }
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bus(mut self, bus: BusKind) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_agent_path(mut self, path: impl Into<String>) -> Self {
        self.agent_path = path.into();
        self
    }

    pub fn with_register_timeout(mut self, timeout: Duration) -> Self {
        self.register_timeout = timeout;
        self
    }

    /// Parses the configured agent path.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::InvalidPath` if the path is not a valid D-Bus
    /// object path.
    pub fn object_path(&self) -> Result<OwnedObjectPath> {
        Ok(OwnedObjectPath::try_from(self.agent_path.as_str())?)
    }
}
