//! Minimal blocking HTTP client for talking to router firmware.
//!
//! Admin pages live on plain HTTP on the LAN, and the firmware on the other
//! end predates most of the protocol's refinements, so the transport stays
//! primitive on purpose: one request per `TcpStream`, `Connection: close`,
//! read to EOF. Timeouts bound every connect, read, and write so a gateway
//! that stops answering mid-session cannot hang the caller.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use cookie::Cookie;
use httparse::Status;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "routerboot/0.1.0";

/// One router endpoint plus the timeout applied to every exchange with it.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    addr: SocketAddr,
    timeout: Duration,
}

/// A fully-read response: status line code, `Set-Cookie` values, decoded body.
pub(crate) struct HttpResponse {
    pub status: u16,
    pub set_cookies: Vec<String>,
    pub body: String,
}

impl HttpResponse {
    /// The first `Set-Cookie` with the given name, stripped down to its
    /// `name=value` pair.
    pub fn session_cookie(&self, name: &str) -> Option<String> {
        self.set_cookies.iter().find_map(|raw| {
            let parsed = Cookie::parse(raw.clone()).ok()?;
            (parsed.name() == name).then(|| parsed.encoded().stripped().to_string())
        })
    }
}

impl HttpClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn get(&self, path: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.exchange("GET", path, headers, None)
    }

    pub fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let body = form
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        self.exchange("POST", path, headers, Some(&body))
    }

    fn exchange(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut stream = TcpStream::connect_timeout(&self.addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut request = format!("{} {} HTTP/1.1\r\n", method, path);
        if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("host")) {
            request.push_str(&format!("Host: {}\r\n", self.addr.ip()));
        }
        request.push_str(&format!("User-Agent: {}\r\n", USER_AGENT));
        request.push_str("Accept: */*\r\nConnection: close\r\n");
        for (name, value) in headers {
            request.push_str(&format!("{}: {}\r\n", name, value));
        }
        if let Some(body) = body {
            request.push_str("Content-Type: application/x-www-form-urlencoded\r\n");
            request.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        request.push_str("\r\n");
        if let Some(body) = body {
            request.push_str(body);
        }

        stream.write_all(request.as_bytes())?;
        stream.flush()?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw)?;

        let mut header_buf = [httparse::EMPTY_HEADER; 64];
        let mut parsed = httparse::Response::new(&mut header_buf);
        let header_len = match parsed.parse(&raw)? {
            Status::Complete(len) => len,
            Status::Partial => return Err(Error::TruncatedResponse),
        };
        let status = parsed.code.ok_or(Error::TruncatedResponse)?;
        let set_cookies = parsed
            .headers
            .iter()
            .filter(|header| header.name.eq_ignore_ascii_case("set-cookie"))
            .map(|header| String::from_utf8_lossy(header.value).into_owned())
            .collect();

        // Some firmware prefixes status documents with a UTF-8 BOM.
        let body_bytes = raw[header_len..]
            .strip_prefix(&[0xEF, 0xBB, 0xBF][..])
            .unwrap_or(&raw[header_len..]);
        let body = String::from_utf8_lossy(body_bytes).into_owned();

        Ok(HttpResponse {
            status,
            set_cookies,
            body,
        })
    }
}
