use std::io;
use std::net::IpAddr;

use thiserror::Error;

/// Everything that can go wrong between this crate and a router.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no gateway candidate answered an http probe")]
    GatewayUnreachable,

    #[error("gateway at {0} matched no registered driver")]
    UnknownModel(IpAddr),

    #[error("gateway rejected the supplied credentials")]
    InvalidCredentials,

    #[error("gateway invalidated the session")]
    SessionExpired,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("marker {0:?} not found in gateway response")]
    MarkerNotFound(&'static str),

    #[error("client list payload could not be decoded: {0}")]
    ClientList(#[from] serde_json::Error),

    #[error("malformed http response from gateway: {0}")]
    MalformedResponse(#[from] httparse::Error),

    #[error("gateway closed the connection mid-response")]
    TruncatedResponse,

    #[error("http exchange with gateway failed: {0}")]
    Transport(#[from] io::Error),

    #[error("public address lookup failed: {0}")]
    PublicIpLookup(#[from] Box<ureq::Error>),
}

pub type Result<T> = std::result::Result<T, Error>;
