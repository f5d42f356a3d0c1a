//! Types shared across the agent.
//!
//! [`DecodedRequest`] is what the decoder makes of a call's arguments and
//! [`AgentReply`] is the dispatcher's answer to it.

use std::fmt;
use std::time::Duration;

use log::Level;
use thiserror::Error;
use zvariant::OwnedObjectPath;

/// The two argument shapes ConnMan uses when calling into the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// `(os)`: an object path and an error string, as sent with `ReportError`.
    ObjectWithErrorString,
    /// `(oa{sv})`: an object path and a field map, as sent with `RequestInput`.
    ObjectWithFieldMap,
}

impl fmt::Display for RequestShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectWithErrorString => write!(f, "(os)"),
            Self::ObjectWithFieldMap => write!(f, "(oa{{sv}})"),
        }
    }
}

/// A plain string value found inside a nested field map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Outer field name, e.g. `Passphrase`.
    pub field: String,
    /// Inner key, e.g. `Type`.
    pub key: String,
    /// D-Bus signature of the value.
    pub type_tag: String,
    pub value: String,
}

/// Something the decoder saw but did not extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeDiagnostic {
    /// The argument list matched neither known shape.
    UnrecognizedSignature(String),
    /// A value had a type the decoder does not interpret.
    UnhandledType {
        field: String,
        /// Inner key when the value sat inside a nested map.
        key: Option<String>,
        type_tag: String,
    },
}

impl fmt::Display for DecodeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedSignature(sig) => write!(f, "Unrecognized signature: {sig}"),
            Self::UnhandledType {
                field,
                key: Some(key),
                type_tag,
            } => write!(f, "Unhandled type: {type_tag} ({field}.{key})"),
            Self::UnhandledType {
                field,
                key: None,
                type_tag,
            } => write!(f, "Unhandled type: {type_tag} ({field})"),
        }
    }
}

/// Normalized view of a call's arguments.
///
/// Fields absent from the input are `None` or empty; nothing is fabricated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRequest {
    /// Object path of the service the call is about.
    pub object_id: Option<OwnedObjectPath>,
    /// Error text sent with `ReportError`.
    pub error_message: Option<String>,
    /// Value of the nested `Type` field of a `RequestInput` map.
    pub requested_type: Option<String>,
    /// The recognized shape, if any.
    pub shape: Option<RequestShape>,
    pub entries: Vec<RawEntry>,
    pub diagnostics: Vec<DecodeDiagnostic>,
}

impl DecodedRequest {
    /// Returns `true` if no argument could be extracted.
    pub fn is_empty(&self) -> bool {
        self.object_id.is_none()
            && self.error_message.is_none()
            && self.requested_type.is_none()
            && self.entries.is_empty()
    }
}

/// What the agent sends back for a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    /// An `a{sv}` of string values, in this order. Keys may repeat.
    FieldValues(Vec<(String, String)>),
    /// Nothing beyond an empty acknowledgement.
    NoReply,
    /// Acknowledge, then stop serving.
    Terminate,
}

/// A diagnostic emitted while handling a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            message: message.into(),
        }
    }
}

/// Outcome of dispatching one call: the reply plus the diagnostic it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub reply: AgentReply,
    pub notice: Notice,
}

/// Which message bus the agent connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusKind {
    /// The system bus, where ConnMan normally lives.
    #[default]
    System,
    /// The session bus, useful for testing against a mock manager.
    Session,
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Errors that can occur while bringing the agent up or serving calls.
///
/// Problems with individual calls (unknown methods, odd argument shapes)
/// are not errors; they are logged and the agent keeps serving.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// The configured agent path is not a valid object path.
    #[error("invalid object path: {0}")]
    InvalidPath(#[from] zvariant::Error),

    /// Could not connect to the requested bus.
    #[error("not able to get connection to {bus} bus: {source}")]
    BusUnavailable {
        bus: BusKind,
        #[source]
        source: zbus::Error,
    },

    /// Exposing the agent object locally failed.
    #[error("unable to export agent at {path}: {source}")]
    Export {
        path: String,
        #[source]
        source: zbus::Error,
    },

    /// The manager rejected `RegisterAgent`.
    #[error("register {path}: {source}")]
    Registration {
        path: String,
        #[source]
        source: zbus::Error,
    },

    /// The manager did not answer `RegisterAgent` in time.
    #[error("register {path}: no reply within {timeout:?}")]
    RegistrationTimeout { path: String, timeout: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape_display() {
        assert_eq!(RequestShape::ObjectWithErrorString.to_string(), "(os)");
        assert_eq!(RequestShape::ObjectWithFieldMap.to_string(), "(oa{sv})");
    }

    #[test]
    fn diagnostic_display() {
        let unrecognized = DecodeDiagnostic::UnrecognizedSignature("(u)".into());
        assert_eq!(unrecognized.to_string(), "Unrecognized signature: (u)");

        let nested = DecodeDiagnostic::UnhandledType {
            field: "Passphrase".into(),
            key: Some("Requirement".into()),
            type_tag: "u".into(),
        };
        assert_eq!(nested.to_string(), "Unhandled type: u (Passphrase.Requirement)");

        let outer = DecodeDiagnostic::UnhandledType {
            field: "Name".into(),
            key: None,
            type_tag: "s".into(),
        };
        assert_eq!(outer.to_string(), "Unhandled type: s (Name)");
    }

    #[test]
    fn default_request_is_empty() {
        let req = DecodedRequest::default();
        assert!(req.is_empty());
        assert!(req.shape.is_none());
        assert!(req.diagnostics.is_empty());
    }

    #[test]
    fn error_messages() {
        let err = AgentError::RegistrationTimeout {
            path: "/net/connman/BifrostWiFiAgent".into(),
            timeout: Duration::from_secs(25),
        };
        assert_eq!(
            err.to_string(),
            "register /net/connman/BifrostWiFiAgent: no reply within 25s"
        );
        assert_eq!(BusKind::System.to_string(), "system");
        assert_eq!(BusKind::default(), BusKind::System);
    }
}
