//! Call decoding, dispatch and registration.
//!
//! Nothing in here talks to the bus directly; registration goes through the
//! [`AgentBus`](registration::AgentBus) trait.

pub mod decode;
pub mod dispatch;
pub mod registration;
