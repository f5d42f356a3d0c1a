//! The agent's serving loop.
//!
//! [`AgentService`] registers the agent with ConnMan and answers its calls
//! until told to stop.

use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;
use zbus::{Connection, Message};

use crate::Result;
use crate::api::config::AgentConfig;
use crate::api::models::{AgentError, AgentReply, BusKind};
use crate::core::decode::decode;
use crate::core::dispatch::Agent;
use crate::core::registration::{RegistrationHandle, register, unregister};
use crate::dbus::{AgentExport, Route, ZbusAgentBus, call_args, route};
use crate::types::constants::AGENT_INTERFACE;
use crate::types::payload;

/// Why the serving loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The manager called `Release`.
    Released,
    /// The shutdown token was cancelled (e.g. on SIGINT).
    Cancelled,
    /// The bus connection went away.
    Disconnected,
}

/// Runs the agent on a bus connection.
///
/// Owns the connection, the registration and the serving loop. Calls are
/// handled one at a time; a shutdown request is only observed between calls.
///
/// # Example
///
/// ```no_run
/// use connman_agent::{AgentConfig, AgentService};
///
/// # async fn example() -> connman_agent::Result<()> {
/// let service = AgentService::connect(AgentConfig::default()).await?;
/// let token = service.shutdown_token();
/// tokio::spawn(async move {
///     let _ = tokio::signal::ctrl_c().await;
///     token.cancel();
/// });
/// service.run().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AgentService {
    bus: ZbusAgentBus,
    config: AgentConfig,
    agent: Agent,
    shutdown: CancellationToken,
}

impl AgentService {
    /// Connects to the bus named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::BusUnavailable` if the bus cannot be reached.
    pub async fn connect(config: AgentConfig) -> Result<Self> {
        let conn = match config.bus {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(|source| AgentError::BusUnavailable {
            bus: config.bus,
            source,
        })?;
        debug!("Connected to {} bus", config.bus);
        Ok(Self::with_connection(conn, config))
    }

    /// Wraps an existing connection.
    pub fn with_connection(conn: Connection, config: AgentConfig) -> Self {
        Self {
            bus: ZbusAgentBus::new(conn, config.register_timeout),
            config,
            agent: Agent::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Token that stops the serving loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Registers the agent, serves calls until shutdown, then unregisters.
    ///
    /// The local export is always released before returning, including when
    /// the manager rejected the registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the agent path is invalid or registration fails.
    pub async fn run(self) -> Result<Shutdown> {
        let path = self.config.object_path()?;
        let mut handle = RegistrationHandle::new();

        let outcome = match register(&self.bus, &path, &mut handle).await {
            Ok(()) => Ok(self.serve(&mut handle).await),
            Err(e) => Err(e),
        };

        if let Err(e) = unregister(&self.bus, &mut handle).await {
            warn!("Failed to remove agent export: {e}");
        }
        outcome
    }

    async fn serve(&self, handle: &mut RegistrationHandle<AgentExport>) -> Shutdown {
        let Some(export) = handle.export_mut() else {
            return Shutdown::Disconnected;
        };
        info!("Serving agent at {}", export.path());

        loop {
            let msg = tokio::select! {
                _ = self.shutdown.cancelled() => return Shutdown::Cancelled,
                next = export.next_call() => match next {
                    Some(msg) => msg,
                    None => return Shutdown::Disconnected,
                },
            };

            if self.serve_call(export, &msg).await == AgentReply::Terminate {
                self.shutdown.cancel();
                return Shutdown::Released;
            }
        }
    }

    /// Handles one method call and sends its reply.
    ///
    /// Failures to send are logged; the agent keeps serving.
    async fn serve_call(&self, export: &AgentExport, msg: &Message) -> AgentReply {
        let header = msg.header();
        let interface = header.interface().map(|i| i.as_str());
        let member = header.member().map(|m| m.as_str()).unwrap_or_default();
        debug!(
            "Agent method call: {}.{member}()",
            interface.unwrap_or(AGENT_INTERFACE)
        );

        let (reply, sent) = match route(interface, member) {
            Route::Introspect => (
                AgentReply::NoReply,
                self.bus.send_introspection(&header, export.path()).await,
            ),
            Route::Ping => (AgentReply::NoReply, self.bus.send_pong(&header).await),
            Route::Agent => {
                let args = call_args(msg);
                debug!(
                    "Invocation parameters variant type is {}",
                    payload::signature(&args)
                );
                let req = decode(&args);
                let reply = self.agent.handle(interface, member, &req);
                let sent = self.bus.send_reply(&header, &reply).await;
                (reply, sent)
            }
        };

        if let Err(e) = sent {
            warn!("Failed to reply to {member}: {e}");
        }
        reply
    }
}
