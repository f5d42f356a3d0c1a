//! Tagged representation of D-Bus call arguments.
//!
//! The agent receives its arguments as self-describing D-Bus values. Rather
//! than comparing type strings at runtime, incoming values are read into
//! [`Payload`], an explicit enum the decoder can match on exhaustively.

use std::fmt;

use zvariant::OwnedObjectPath;

/// A single self-describing argument value.
///
/// Only the shapes the agent protocol uses are represented structurally.
/// Everything else is kept as [`Payload::Other`] carrying its D-Bus
/// signature, so it can still be reported in diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// An object path (`o`).
    ObjectPath(OwnedObjectPath),
    /// A string (`s`).
    Str(String),
    /// A boolean (`b`).
    Bool(bool),
    /// An array, with the signature of its element type.
    Seq { element: String, items: Vec<Payload> },
    /// A string-keyed map of variants (`a{sv}`), in input order. Values are
    /// the variants' contents.
    Map(Vec<(String, Payload)>),
    /// A value this agent does not interpret, identified by its signature.
    Other(String),
}

impl Payload {
    /// Returns the D-Bus type signature of this value.
    pub fn signature(&self) -> String {
        match self {
            Payload::ObjectPath(_) => "o".into(),
            Payload::Str(_) => "s".into(),
            Payload::Bool(_) => "b".into(),
            Payload::Seq { element, .. } => format!("a{element}"),
            Payload::Map(_) => "a{sv}".into(),
            Payload::Other(sig) => sig.clone(),
        }
    }

    /// Returns the string contents if this is a [`Payload::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::ObjectPath(p) => write!(f, "{}", p.as_str()),
            Payload::Str(s) => write!(f, "{s}"),
            Payload::Bool(b) => write!(f, "{b}"),
            Payload::Seq { items, .. } => write!(f, "[{} items]", items.len()),
            Payload::Map(entries) => write!(f, "{{{} entries}}", entries.len()),
            Payload::Other(sig) => write!(f, "<{sig}>"),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Str(s.to_owned())
    }
}

impl From<OwnedObjectPath> for Payload {
    fn from(path: OwnedObjectPath) -> Self {
        Payload::ObjectPath(path)
    }
}

/// Renders the structural signature of a call's argument list, e.g. `(os)`.
pub fn signature(args: &[Payload]) -> String {
    let inner: String = args.iter().map(Payload::signature).collect();
    format!("({inner})")
}
