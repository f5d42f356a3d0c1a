pub mod logging;

use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use connman_agent::{AgentConfig, AgentService, BusKind, Shutdown};
use log::{info, warn};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "connman-agentd")]
#[command(about = "Register an input agent with ConnMan and answer its requests")]
#[command(disable_version_flag = true)]
#[command(version)]
struct Args {
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// Connect to the session bus instead of the system bus
    #[arg(long)]
    session: bool,

    /// Object path to export the agent at
    #[arg(long, value_name = "PATH", default_value = connman_agent::constants::AGENT_PATH)]
    path: String,

    /// Seconds to wait for the manager to accept the registration
    #[arg(long, value_name = "SECS", default_value_t = connman_agent::constants::timeouts::REGISTER_TIMEOUT_SECS)]
    register_timeout: u64,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Args {
    fn config(&self) -> AgentConfig {
        let bus = if self.session {
            BusKind::Session
        } else {
            BusKind::System
        };
        AgentConfig::new()
            .with_bus(bus)
            .with_agent_path(self.path.clone())
            .with_register_timeout(Duration::from_secs(self.register_timeout))
    }
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Args { version: true, .. } = args {
        println!("connman-agentd {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Err(e) = logging::init(args.log_format) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config = args.config();
    let service = AgentService::connect(config.clone())
        .await
        .context("Not able to get connection to bus")?;

    watch_signals(service.shutdown_token())?;

    match service
        .run()
        .await
        .with_context(|| format!("Register {}", config.agent_path))?
    {
        Shutdown::Released => info!("Agent released by manager"),
        Shutdown::Cancelled => info!("Agent stopped"),
        Shutdown::Disconnected => warn!("Bus connection closed"),
    }
    Ok(())
}

/// Cancels `token` on SIGINT or SIGTERM.
fn watch_signals(token: CancellationToken) -> anyhow::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt()).context("can't catch SIGINT")?;
    let mut terminate = signal(SignalKind::terminate()).context("can't catch SIGTERM")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT"),
            _ = terminate.recv() => info!("received SIGTERM"),
            _ = token.cancelled() => return,
        }
        token.cancel();
    });
    Ok(())
}
