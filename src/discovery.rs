//! Finding the gateway and deciding which driver speaks its dialect.
//!
//! Candidates are probed strictly in order with one bounded HTTP GET of the
//! root page each; the first driver whose fingerprint matches the page wins.
//! Nothing here is parallel on purpose: it keeps load on the LAN bounded and
//! the first-match semantics deterministic.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::debug;

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::routers::{Driver, Router, RouterDescriptor, DRIVERS};

/// The address routers most commonly hand out for themselves.
pub const DEFAULT_GATEWAY: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));

/// Common factory-default gateway addresses, probed after the primary.
///
/// Probing these touches hosts the caller did not name, which on a hostile
/// network is a way to hand credentials to a stranger later. They are opt-in.
pub const FALLBACK_GATEWAYS: [IpAddr; 6] = [
    IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)),
    IpAddr::V4(Ipv4Addr::new(192, 168, 1, 254)),
    IpAddr::V4(Ipv4Addr::new(192, 168, 2, 1)),
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
    IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1)),
];

const HTTP_PORT: u16 = 80;

/// A matched driver bound to the address it was found at.
///
/// Carries no network state of its own; [`connect`](Self::connect) runs the
/// driver's login handshake against the resolved address.
pub struct DiscoveryBinding {
    driver: &'static Driver,
    address: SocketAddr,
}

impl DiscoveryBinding {
    pub fn descriptor(&self) -> RouterDescriptor {
        self.driver.descriptor
    }

    pub fn address(&self) -> IpAddr {
        self.address.ip()
    }

    /// Logs into the discovered router and returns the driver session.
    pub fn connect(&self, username: &str, password: &str) -> Result<Box<dyn Router>> {
        (self.driver.login)(username, password, self.address)
    }
}

/// Probes `primary`, then the documented fallback list when enabled, for a
/// gateway a registered driver recognizes.
///
/// Unreachable candidates are skipped silently. A candidate that answers but
/// matches no driver ends discovery with [`Error::UnknownModel`]: a live
/// gateway we cannot identify is reported, not papered over by guessing at
/// further addresses. Only when no candidate answers at all does discovery
/// fail with [`Error::GatewayUnreachable`].
pub fn discover(primary: IpAddr, use_fallbacks: bool) -> Result<DiscoveryBinding> {
    let mut candidates = vec![SocketAddr::new(primary, HTTP_PORT)];
    if use_fallbacks {
        candidates.extend(
            FALLBACK_GATEWAYS
                .iter()
                .map(|ip| SocketAddr::new(*ip, HTTP_PORT)),
        );
    }
    probe(&candidates)
}

pub(crate) fn probe(candidates: &[SocketAddr]) -> Result<DiscoveryBinding> {
    for &address in candidates {
        let page = match HttpClient::new(address).get("/", &[]) {
            Ok(response) => response.body,
            Err(err) => {
                debug!(%address, %err, "gateway candidate did not answer");
                continue;
            }
        };
        for driver in DRIVERS {
            if (driver.matches_fingerprint)(&page) {
                debug!(%address, model = %driver.descriptor, "gateway recognized");
                return Ok(DiscoveryBinding { driver, address });
            }
        }
        return Err(Error::UnknownModel(address.ip()));
    }
    Err(Error::GatewayUnreachable)
}
