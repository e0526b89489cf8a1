use std::env;
use std::net::IpAddr;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use routerboot::{discover, public_ip, DiscoveryBinding, Router, DEFAULT_GATEWAY};

const POLL_INTERVAL: Duration = Duration::from_secs(3);
/// How long the device takes to come back after a reboot request.
const REBOOT_GRACE: Duration = Duration::from_secs(20);
/// How long the WAN takes to settle after a fresh login following a reboot.
const LOGIN_GRACE: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let username = env::var("ROUTERBOOT_USERNAME").unwrap_or_else(|_| "admin".into());
    let password = env::var("ROUTERBOOT_PASSWORD")
        .context("set ROUTERBOOT_PASSWORD to the router admin password")?;

    let primary = match env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("gateway argument {arg:?} is not an ip address"))?,
        None => system_gateway().unwrap_or(DEFAULT_GATEWAY),
    };

    match public_ip() {
        Ok(ip) => info!(%ip, "public address"),
        Err(err) => warn!(%err, "public address lookup failed"),
    }

    let binding = discover(primary, true)?;
    info!(model = %binding.descriptor(), address = %binding.address(), "gateway recognized");

    monitor(&binding, &username, &password)
}

/// First gateway the host's own interfaces report, if any.
fn system_gateway() -> Option<IpAddr> {
    for interface in netdev::get_interfaces() {
        if let Some(gateway) = &interface.gateway {
            if let Some(ip) = gateway.ipv4.first() {
                return Some(IpAddr::V4(*ip));
            }
            if let Some(ip) = gateway.ipv6.first() {
                return Some(IpAddr::V6(*ip));
            }
        }
    }
    None
}

/// Polls WAN status and reboots the router whenever the connection drops.
///
/// The session is rebuilt after reboots and transport failures; login
/// failures are retried on the polling cadence rather than treated as fatal,
/// since a rebooting gateway refuses connections for a while.
fn monitor(binding: &DiscoveryBinding, username: &str, password: &str) -> Result<()> {
    let mut session: Option<Box<dyn Router>> = None;
    let mut was_online = true;
    loop {
        if session.is_none() {
            match binding.connect(username, password) {
                Ok(router) => {
                    info!("logged in, letting the connection settle");
                    session = Some(router);
                    thread::sleep(LOGIN_GRACE);
                }
                Err(err) => warn!(%err, "login failed, will retry"),
            }
        }
        if let Some(router) = session.as_mut() {
            let online = router.is_online();
            if online != was_online {
                info!(online, "wan status changed");
            }
            if !online {
                info!("requesting reboot");
                match router.reboot() {
                    Ok(true) => {
                        session = None;
                        thread::sleep(REBOOT_GRACE);
                    }
                    Ok(false) => warn!("firmware refused the reboot"),
                    Err(err) => {
                        warn!(%err, "reboot failed, dropping session");
                        session = None;
                    }
                }
            }
            was_online = online;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
