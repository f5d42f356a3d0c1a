//! D-Bus plumbing for the agent.
//!
//! This module contains the ConnMan manager proxy, the zbus-backed export of
//! the agent object and the marshalling between wire messages and the
//! agent's own types.

mod args;
mod export;
mod manager;
mod reply;

pub use args::call_args;
pub use export::{AgentExport, ZbusAgentBus, introspection_xml};
pub(crate) use export::{Route, route};
pub use manager::ConnManManagerProxy;
pub use reply::FieldReply;
