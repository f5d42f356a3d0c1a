//! Exporting the agent object over zbus.
//!
//! The agent's calls are received as raw method-call messages on its object
//! path rather than through a typed interface, so that argument shapes the
//! agent does not recognize still reach the decoder instead of being
//! rejected by the transport.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use zbus::message::{Flags, Header, Type as MessageType};
use zbus::{Connection, MatchRule, Message, MessageStream};
use zvariant::{ObjectPath, OwnedObjectPath};

use crate::Result;
use crate::api::models::{AgentError, AgentReply};
use crate::core::registration::AgentBus;
use crate::dbus::manager::ConnManManagerProxy;
use crate::dbus::reply::FieldReply;
use crate::types::constants::{AGENT_INTERFACE, standard};

/// Maximum number of calls queued on the export before older ones are dropped.
const MAX_QUEUED_CALLS: usize = 64;

/// A live export of the agent object.
///
/// Holds the subscription that delivers method calls addressed to the
/// agent's path. Dropping it removes the subscription.
pub struct AgentExport {
    path: OwnedObjectPath,
    calls: MessageStream,
}

impl AgentExport {
    pub fn path(&self) -> &ObjectPath<'_> {
        &self.path
    }

    /// Waits for the next method call on the agent's path.
    ///
    /// Returns `None` once the connection is closed. Transport errors on
    /// individual messages are logged and skipped.
    pub async fn next_call(&mut self) -> Option<Message> {
        while let Some(next) = self.calls.next().await {
            match next {
                Ok(msg) => return Some(msg),
                Err(e) => warn!("Dropping unreadable message: {e}"),
            }
        }
        None
    }
}

impl std::fmt::Debug for AgentExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExport")
            .field("path", &self.path.as_str())
            .finish_non_exhaustive()
    }
}

/// [`AgentBus`] over a zbus connection.
#[derive(Debug, Clone)]
pub struct ZbusAgentBus {
    conn: Connection,
    register_timeout: Duration,
}

impl ZbusAgentBus {
    pub fn new(conn: Connection, register_timeout: Duration) -> Self {
        Self {
            conn,
            register_timeout,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Sends the wire form of `reply` for the call described by `header`.
    ///
    /// Nothing is sent when the caller asked for no reply.
    pub async fn send_reply(&self, header: &Header<'_>, reply: &AgentReply) -> Result<()> {
        if header.primary().flags().contains(Flags::NoReplyExpected) {
            return Ok(());
        }
        match reply {
            AgentReply::FieldValues(fields) => {
                self.conn
                    .reply(header, &FieldReply::new(fields.clone()))
                    .await?;
            }
            AgentReply::NoReply | AgentReply::Terminate => {
                self.conn.reply(header, &()).await?;
            }
        }
        Ok(())
    }

    /// Answers `Introspectable.Introspect` for the agent object.
    pub async fn send_introspection(&self, header: &Header<'_>, path: &ObjectPath<'_>) -> Result<()> {
        self.conn.reply(header, &introspection_xml(path)).await?;
        Ok(())
    }

    /// Answers `Peer.Ping`.
    pub async fn send_pong(&self, header: &Header<'_>) -> Result<()> {
        self.conn.reply(header, &()).await?;
        Ok(())
    }
}

#[async_trait]
impl AgentBus for ZbusAgentBus {
    type Export = AgentExport;

    async fn export(&self, path: &ObjectPath<'_>) -> Result<AgentExport> {
        let export_err = |source: zbus::Error| AgentError::Export {
            path: path.to_string(),
            source,
        };

        let rule = MatchRule::builder()
            .msg_type(MessageType::MethodCall)
            .path(path.clone())
            .map_err(export_err)?
            .build();

        let calls = MessageStream::for_match_rule(rule, &self.conn, Some(MAX_QUEUED_CALLS))
            .await
            .map_err(export_err)?;

        Ok(AgentExport {
            path: OwnedObjectPath::from(path.clone()),
            calls,
        })
    }

    async fn register_agent(&self, path: &ObjectPath<'_>) -> Result<()> {
        let registration_err = |source: zbus::Error| AgentError::Registration {
            path: path.to_string(),
            source,
        };

        let manager = ConnManManagerProxy::new(&self.conn)
            .await
            .map_err(registration_err)?;

        match tokio::time::timeout(self.register_timeout, manager.register_agent(path)).await {
            Ok(result) => result.map_err(registration_err),
            Err(_) => Err(AgentError::RegistrationTimeout {
                path: path.to_string(),
                timeout: self.register_timeout,
            }),
        }
    }

    async fn unexport(&self, export: AgentExport) -> Result<()> {
        debug!("Removing agent export at {}", export.path.as_str());
        drop(export);
        Ok(())
    }
}

/// Where a method call on the agent's path is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Introspect,
    Ping,
    Agent,
}

pub(crate) fn route(interface: Option<&str>, member: &str) -> Route {
    match (interface, member) {
        (Some(standard::INTROSPECTABLE), standard::INTROSPECT) => Route::Introspect,
        (Some(standard::PEER), standard::PING) => Route::Ping,
        _ => Route::Agent,
    }
}

/// Introspection data for the agent object at `path`.
pub fn introspection_xml(path: &ObjectPath<'_>) -> String {
    format!(
        r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node name="{path}">
  <interface name="{AGENT_INTERFACE}">
    <method name="Release">
    </method>
    <method name="Cancel">
    </method>
    <method name="RequestInput">
      <arg type="o" name="service" direction="in"/>
      <arg type="a{{sv}}" name="fields" direction="in"/>
      <arg type="a{{sv}}" name="fields" direction="out"/>
    </method>
    <method name="ReportError">
      <arg type="o" name="service" direction="in"/>
      <arg type="s" name="error" direction="in"/>
    </method>
  </interface>
  <interface name="{introspectable}">
    <method name="Introspect">
      <arg type="s" name="xml_data" direction="out"/>
    </method>
  </interface>
  <interface name="{peer}">
    <method name="Ping">
    </method>
  </interface>
</node>
"#,
        introspectable = standard::INTROSPECTABLE,
        peer = standard::PEER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_standard_interfaces() {
        assert_eq!(
            route(Some("org.freedesktop.DBus.Introspectable"), "Introspect"),
            Route::Introspect
        );
        assert_eq!(route(Some("org.freedesktop.DBus.Peer"), "Ping"), Route::Ping);
    }

    #[test]
    fn routes_everything_else_to_agent() {
        assert_eq!(route(Some("net.connman.Agent"), "RequestInput"), Route::Agent);
        assert_eq!(route(None, "Release"), Route::Agent);
        assert_eq!(route(None, "Introspect"), Route::Agent);
        assert_eq!(route(Some("org.freedesktop.DBus.Peer"), "GetMachineId"), Route::Agent);
    }

    #[test]
    fn introspection_describes_agent_methods() {
        let path = ObjectPath::try_from("/net/connman/BifrostWiFiAgent").unwrap();
        let xml = introspection_xml(&path);

        assert!(xml.contains(r#"<node name="/net/connman/BifrostWiFiAgent">"#));
        assert!(xml.contains(r#"<interface name="net.connman.Agent">"#));
        for method in ["Release", "Cancel", "RequestInput", "ReportError", "Introspect", "Ping"] {
            assert!(xml.contains(&format!(r#"<method name="{method}">"#)), "{method}");
        }
        assert!(xml.contains(r#"<arg type="a{sv}" name="fields" direction="out"/>"#));
    }
}
