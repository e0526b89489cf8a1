//! The capability contract routers implement, plus the driver registry.
//!
//! Vendors disagree on everything above TCP: endpoint paths, login payloads,
//! how a value as simple as the SSID is serialized. The [`Router`] trait pins
//! down the operations and their shared semantics; each driver module keeps
//! the vendor weirdness to itself.

pub mod actiontec;
pub mod asus;

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::error::Result;

/// Identifying metadata compiled into each driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterDescriptor {
    pub manufacturer: &'static str,
    pub model: &'static str,
    /// Firmware the driver's endpoint paths and scrape markers were written
    /// against. Other builds usually work; this one is known to.
    pub firmware_baseline: &'static str,
}

impl fmt::Display for RouterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.manufacturer, self.model)
    }
}

/// How a client is attached to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Wired,
    Wifi,
    /// A vendor-reported attachment the common variants do not cover, such as
    /// a specific radio band.
    Vendor(&'static str),
    Unknown,
}

/// A device attached to the router, as reported at the moment of the call.
///
/// Snapshot semantics only: entries carry no identity across calls and two
/// calls may disagree. `mac_address` is unique within one snapshot. The
/// optional fields are populated where the vendor reports them.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterClient {
    pub name: String,
    pub ip_address: IpAddr,
    pub mac_address: String,
    pub connection_type: ConnectionType,
    pub online: Option<bool>,
    pub vendor: Option<String>,
    pub nickname: Option<String>,
    pub ip_method: Option<String>,
    pub internet_allowed: Option<bool>,
    pub signal_strength: Option<i64>,
}

impl RouterClient {
    pub(crate) fn new(
        name: String,
        ip_address: IpAddr,
        mac_address: String,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            name,
            ip_address,
            mac_address,
            connection_type,
            online: None,
            vendor: None,
            nickname: None,
            ip_method: None,
            internet_allowed: None,
            signal_strength: None,
        }
    }
}

/// The operations every vendor driver supports.
///
/// Construction doubles as login: a value of an implementing type is logged in
/// from the moment it exists until [`logout`](Router::logout), a successful
/// [`reboot`](Router::reboot), or the gateway invalidating the session behind
/// our back. Every other method requires the logged-in state and fails fast
/// with [`Error::NotLoggedIn`](crate::Error::NotLoggedIn); no network
/// round-trip is attempted while logged out.
///
/// If an authenticated call finds the vendor's login-redirect marker in a
/// response, the driver drops to logged-out and the call fails with
/// [`Error::SessionExpired`](crate::Error::SessionExpired) rather than
/// returning whatever the login page happened to contain.
pub trait Router {
    /// Static identifying metadata for the device this driver speaks to.
    fn descriptor(&self) -> RouterDescriptor;

    /// Whether every WAN indicator the status page exposes reports up.
    ///
    /// Never fails: logged out, unreachable, and unparseable all read as
    /// offline.
    fn is_online(&mut self) -> bool;

    fn firmware_version(&mut self) -> Result<String>;

    fn ssid(&mut self) -> Result<String>;

    fn set_ssid(&mut self, ssid: &str) -> Result<()>;

    /// The wireless passphrase, where the firmware exposes it.
    fn network_key(&mut self) -> Result<String>;

    fn enable_radio(&mut self) -> Result<()>;

    fn disable_radio(&mut self) -> Result<()>;

    /// A fresh, unordered snapshot of attached clients.
    fn clients(&mut self) -> Result<Vec<RouterClient>>;

    /// Asks the device to restart. `Ok(true)` means the command was accepted
    /// and the session died with it; `Ok(false)` means the firmware refused
    /// and the session is still valid.
    fn reboot(&mut self) -> Result<bool>;

    /// Ends the session. Idempotent and best-effort: failures notifying the
    /// gateway are swallowed, and the local state always ends up logged out.
    fn logout(&mut self);
}

/// One registered vendor driver: its metadata, the fingerprint predicate the
/// discovery engine probes with, and the login entry point.
pub struct Driver {
    pub descriptor: RouterDescriptor,
    /// Pure predicate over a gateway's root page. Must match ONLY this
    /// vendor/model, never a superset, and performs no network I/O.
    pub matches_fingerprint: fn(&str) -> bool,
    pub(crate) login: fn(&str, &str, SocketAddr) -> Result<Box<dyn Router>>,
}

/// Every known driver, in probe order. First fingerprint match wins, so this
/// ordering is also the tie-break priority; keeping fingerprints
/// vendor-unique is what makes the order irrelevant in practice.
pub static DRIVERS: &[Driver] = &[actiontec::DRIVER, asus::DRIVER];

#[cfg(test)]
mod tests {
    use super::*;

    // Each driver's canonical root page must satisfy its own fingerprint and
    // nobody else's.
    #[test]
    fn fingerprints_are_vendor_unique() {
        let samples = [
            (actiontec::DRIVER.descriptor, actiontec::SAMPLE_ROOT_PAGE),
            (asus::DRIVER.descriptor, asus::SAMPLE_ROOT_PAGE),
        ];
        for driver in DRIVERS {
            for (descriptor, page) in samples {
                let matched = (driver.matches_fingerprint)(page);
                assert_eq!(
                    matched,
                    driver.descriptor == descriptor,
                    "{} fingerprint against {} sample page",
                    driver.descriptor,
                    descriptor,
                );
            }
        }
    }

    #[test]
    fn fingerprints_reject_unrelated_pages() {
        for page in ["", "<html><body>It works!</body></html>", "404 not found"] {
            for driver in DRIVERS {
                assert!(!(driver.matches_fingerprint)(page));
            }
        }
    }
}
