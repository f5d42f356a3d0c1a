//! Agent registration with the ConnMan manager.
//!
//! Registration happens in two phases:
//!
//! 1. Export the agent's method table at its object path (local).
//! 2. Call `RegisterAgent` on the manager with that path (remote).
//!
//! If phase 1 fails, phase 2 is never attempted. If phase 2 fails, the export
//! from phase 1 is left in the [`RegistrationHandle`] and the caller must
//! release it with [`unregister`] before exiting.

use async_trait::async_trait;
use log::{debug, info};
use zvariant::ObjectPath;

use crate::Result;

/// The bus operations registration needs.
///
/// Implemented over a real zbus connection by
/// [`ZbusAgentBus`](crate::dbus::ZbusAgentBus); tests substitute a spy.
#[async_trait]
pub trait AgentBus: Send + Sync {
    /// Handle to a local export, released by [`AgentBus::unexport`].
    type Export: Send;

    /// Exposes the agent's method table at `path`.
    async fn export(&self, path: &ObjectPath<'_>) -> Result<Self::Export>;

    /// Asks the manager to use the agent at `path`.
    async fn register_agent(&self, path: &ObjectPath<'_>) -> Result<()>;

    /// Removes a local export.
    async fn unexport(&self, export: Self::Export) -> Result<()>;
}

/// Holds the local export for the lifetime of the process.
///
/// Empty until phase 1 of registration succeeds and again after
/// [`unregister`], so releasing it twice (or when it was never filled) is a
/// no-op.
#[derive(Debug)]
pub struct RegistrationHandle<E> {
    export: Option<E>,
}

impl<E> Default for RegistrationHandle<E> {
    fn default() -> Self {
        Self { export: None }
    }
}

impl<E> RegistrationHandle<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while an export is held.
    pub fn is_exported(&self) -> bool {
        self.export.is_some()
    }

    pub fn export(&self) -> Option<&E> {
        self.export.as_ref()
    }

    pub fn export_mut(&mut self) -> Option<&mut E> {
        self.export.as_mut()
    }

    fn take(&mut self) -> Option<E> {
        self.export.take()
    }
}

/// Registers the agent at `path`, storing the export in `handle`.
///
/// # Errors
///
/// Returns the export error if phase 1 fails (the manager is not contacted),
/// or the manager's error if phase 2 fails. In the latter case `handle`
/// still holds the export.
pub async fn register<B: AgentBus>(
    bus: &B,
    path: &ObjectPath<'_>,
    handle: &mut RegistrationHandle<B::Export>,
) -> Result<()> {
    let export = bus.export(path).await?;
    handle.export = Some(export);
    debug!("Agent exported at {path}");

    bus.register_agent(path).await?;
    info!("Agent registered at {path}");
    Ok(())
}

/// Removes the local export held by `handle`, if any.
///
/// No `UnregisterAgent` call is made: the manager drops agents whose
/// connection goes away.
pub async fn unregister<B: AgentBus>(bus: &B, handle: &mut RegistrationHandle<B::Export>) -> Result<()> {
    match handle.take() {
        Some(export) => {
            bus.unexport(export).await?;
            debug!("Agent export removed");
            Ok(())
        }
        None => Ok(()),
    }
}
