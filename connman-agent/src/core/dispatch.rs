//! Method dispatch for the `net.connman.Agent` interface.

use std::fmt;

use log::log;

use crate::api::models::{AgentReply, DecodedRequest, Dispatch, Notice};
use crate::types::constants::{AGENT_INTERFACE, PLACEHOLDER_PASSPHRASES, field, method};

/// A method of the agent interface.
///
/// Names are matched literally and case-sensitively; anything else is
/// [`AgentMethod::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentMethod {
    Release,
    Cancel,
    RequestInput,
    ReportError,
    /// A method name the agent does not implement.
    Unknown(String),
}

impl From<&str> for AgentMethod {
    fn from(name: &str) -> Self {
        match name {
            method::RELEASE => Self::Release,
            method::CANCEL => Self::Cancel,
            method::REQUEST_INPUT => Self::RequestInput,
            method::REPORT_ERROR => Self::ReportError,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for AgentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => write!(f, "{}", method::RELEASE),
            Self::Cancel => write!(f, "{}", method::CANCEL),
            Self::RequestInput => write!(f, "{}", method::REQUEST_INPUT),
            Self::ReportError => write!(f, "{}", method::REPORT_ERROR),
            Self::Unknown(name) => write!(f, "{name}"),
        }
    }
}

/// The agent's call handler.
///
/// Holds no per-call state. Each call yields a fresh [`AgentReply`]; the only
/// side effect is the logged diagnostic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Agent;

impl Agent {
    pub fn new() -> Self {
        Self
    }

    /// Handles one call and logs its diagnostic.
    ///
    /// `interface` is the interface named in the call, if any. A call naming
    /// an interface other than `net.connman.Agent` is treated as unknown.
    pub fn handle(&self, interface: Option<&str>, name: &str, req: &DecodedRequest) -> AgentReply {
        let Dispatch { reply, notice } = self.dispatch(interface, name, req);
        log!(notice.level, "{}", notice.message);
        reply
    }

    /// Works out the reply and diagnostic for a call without logging.
    pub fn dispatch(&self, interface: Option<&str>, name: &str, req: &DecodedRequest) -> Dispatch {
        let method = match interface {
            Some(iface) if iface != AGENT_INTERFACE => AgentMethod::Unknown(name.to_string()),
            _ => AgentMethod::from(name),
        };

        match method {
            AgentMethod::RequestInput => Dispatch {
                reply: AgentReply::FieldValues(placeholder_fields()),
                notice: Notice::info("Request Passphrase"),
            },
            AgentMethod::ReportError => Dispatch {
                reply: AgentReply::NoReply,
                notice: Notice::warn(format!(
                    "Error:{}",
                    req.error_message.as_deref().unwrap_or("<none>")
                )),
            },
            AgentMethod::Release => Dispatch {
                reply: AgentReply::Terminate,
                notice: Notice::info("Released"),
            },
            AgentMethod::Cancel => Dispatch {
                reply: AgentReply::NoReply,
                notice: Notice::info("Canceled"),
            },
            AgentMethod::Unknown(name) => Dispatch {
                reply: AgentReply::NoReply,
                notice: Notice::warn(format!(
                    "Unknown method call: {}.{name}()",
                    interface.unwrap_or(AGENT_INTERFACE)
                )),
            },
        }
    }
}

/// The fixed `RequestInput` answer: two `Passphrase` candidates. The requested
/// type is not consulted.
fn placeholder_fields() -> Vec<(String, String)> {
    PLACEHOLDER_PASSPHRASES
        .iter()
        .map(|value| (field::PASSPHRASE.to_string(), value.to_string()))
        .collect()
}
