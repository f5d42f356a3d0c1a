//! ConnMan Manager proxy.

use zbus::{Result, proxy};
use zvariant::ObjectPath;

/// Proxy for the ConnMan manager interface.
///
/// Only agent registration is declared; the rest of the manager API is
/// not used by this crate.
#[proxy(
    interface = "net.connman.Manager",
    default_service = "net.connman",
    default_path = "/"
)]
pub trait ConnManManager {
    /// Registers an agent object for user interaction.
    fn register_agent(&self, path: &ObjectPath<'_>) -> Result<()>;
}
