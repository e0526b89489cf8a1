//! Talk to consumer routers' web admin interfaces.
//!
//! `routerboot` figures out which router is answering at the gateway address,
//! logs into its admin pages, and drives it through one [`Router`] trait:
//! WAN status, wireless settings, attached clients, reboot. Vendor
//! differences (endpoint paths, login handshakes, the creative formats
//! firmware serves its data in) stay inside the per-vendor driver modules.
//!
//! ```no_run
//! use routerboot::{discover, Router, DEFAULT_GATEWAY};
//!
//! let binding = discover(DEFAULT_GATEWAY, true).expect("no recognized gateway");
//! println!("found {} at {}", binding.descriptor(), binding.address());
//!
//! let mut router = binding.connect("admin", "hunter2").expect("login failed");
//! if !router.is_online() {
//!     router.reboot().expect("reboot request failed");
//! }
//! router.logout();
//! ```

pub mod discovery;
pub mod error;
mod http;
pub mod routers;
mod scrape;

#[cfg(test)]
mod testing;

pub use discovery::{discover, DiscoveryBinding, DEFAULT_GATEWAY, FALLBACK_GATEWAYS};
pub use error::{Error, Result};
pub use routers::{ConnectionType, Driver, Router, RouterClient, RouterDescriptor, DRIVERS};

/// Asks ipify for this network's WAN-side address, as plain text.
///
/// Purely informational; nothing in discovery or the drivers depends on it.
pub fn public_ip() -> Result<String> {
    let response = ureq::get("https://api.ipify.org")
        .timeout(std::time::Duration::from_secs(10))
        .call()
        .map_err(Box::new)?;
    Ok(response.into_string()?.trim().to_string())
}
