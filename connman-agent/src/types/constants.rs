//! Constants for the ConnMan agent D-Bus protocol.
//!
//! These names correspond to the service, object paths, interfaces and
//! members used by ConnMan's `net.connman.Agent` callback API.

/// Default object path the agent is exported at.
pub const AGENT_PATH: &str = "/net/connman/BifrostWiFiAgent";

/// Interface implemented by the agent object.
pub const AGENT_INTERFACE: &str = "net.connman.Agent";

/// Well-known names of the ConnMan manager.
pub mod manager {
    pub const SERVICE: &str = "net.connman";
    pub const PATH: &str = "/";
    pub const INTERFACE: &str = "net.connman.Manager";
}

/// Agent method names. Compared case-sensitively.
pub mod method {
    pub const RELEASE: &str = "Release";
    pub const CANCEL: &str = "Cancel";
    pub const REQUEST_INPUT: &str = "RequestInput";
    pub const REPORT_ERROR: &str = "ReportError";
}

/// Standard interfaces answered alongside the agent interface.
pub mod standard {
    pub const INTROSPECTABLE: &str = "org.freedesktop.DBus.Introspectable";
    pub const INTROSPECT: &str = "Introspect";
    pub const PEER: &str = "org.freedesktop.DBus.Peer";
    pub const PING: &str = "Ping";
}

/// Field names inside `RequestInput` maps
pub mod field {
    pub const PASSPHRASE: &str = "Passphrase";
    pub const TYPE: &str = "Type";
}

/// Placeholder credentials returned by `RequestInput`, in reply order.
pub const PLACEHOLDER_PASSPHRASES: [&str; 2] = ["passphrase_0", "passphrase_1"];

/// Timeout constants
pub mod timeouts {
    use std::time::Duration;

    /// Default D-Bus method call timeout used by libdbus and GDBus.
    pub const REGISTER_TIMEOUT_SECS: u64 = 25;

    pub fn register_timeout() -> Duration {
        Duration::from_secs(REGISTER_TIMEOUT_SECS)
    }
}
