//! A ConnMan input agent over D-Bus.
//!
//! ConnMan asks a registered agent for input it cannot supply itself, such
//! as a WiFi passphrase, and reports connection errors to it. This crate
//! provides that agent:
//!
//! - Decoding the agent's loosely typed call arguments ([`decode`])
//! - Dispatching `net.connman.Agent` methods ([`Agent`])
//! - Registering with the ConnMan manager ([`register`], [`unregister`])
//! - Serving calls on the system bus ([`AgentService`])
//!
//! # Example
//!
//! ```no_run
//! use connman_agent::{AgentConfig, AgentService};
//!
//! # async fn example() -> connman_agent::Result<()> {
//! let service = AgentService::connect(AgentConfig::default()).await?;
//! let shutdown = service.run().await?;
//! println!("agent stopped: {shutdown:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Decoding without a bus
//!
//! ```
//! use connman_agent::{Agent, AgentReply, Payload, decode};
//! use zvariant::OwnedObjectPath;
//!
//! let service = OwnedObjectPath::try_from("/net/connman/service/wifi_x").unwrap();
//! let req = decode(&[Payload::from(service), Payload::from("invalid-key")]);
//! assert_eq!(req.error_message.as_deref(), Some("invalid-key"));
//!
//! let reply = Agent::new().handle(None, "ReportError", &req);
//! assert_eq!(reply, AgentReply::NoReply);
//! ```
//!
//! # Error Handling
//!
//! Startup operations return `Result<T, AgentError>`. Problems with
//! individual calls are never errors: they are logged and the agent keeps
//! serving.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, install a logger in the binary, e.g. `tracing-subscriber`.

// Internal implementation modules
mod dbus;
mod types;

// Public API modules
pub mod api;
pub mod core;

// Re-exported public API
pub use crate::api::config::AgentConfig;
pub use crate::api::models::{
    AgentError, AgentReply, BusKind, DecodeDiagnostic, DecodedRequest, Dispatch, Notice, RawEntry,
    RequestShape,
};
pub use crate::api::service::{AgentService, Shutdown};
pub use crate::core::decode::decode;
pub use crate::core::dispatch::{Agent, AgentMethod};
pub use crate::core::registration::{AgentBus, RegistrationHandle, register, unregister};
pub use crate::dbus::{
    AgentExport, ConnManManagerProxy, FieldReply, ZbusAgentBus, call_args, introspection_xml,
};
pub use crate::types::constants;
pub use crate::types::payload::{Payload, signature};

/// A specialized `Result` type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
