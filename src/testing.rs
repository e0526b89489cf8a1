//! Canned single-connection HTTP servers for exercising the transport,
//! discovery, and drivers offline.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::thread;

/// Serves each scripted response once, in connection order, then stops
/// accepting. Requests are drained but not inspected; the tests assert on
/// driver behavior, not wire bytes.
pub(crate) fn serve_script(responses: Vec<String>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("test listener addr");
    thread::spawn(move || {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut request = [0u8; 8192];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    addr
}

pub(crate) fn serve_once(response: String) -> SocketAddr {
    serve_script(vec![response])
}

pub(crate) fn http_200(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

pub(crate) fn http_200_with_cookie(set_cookie: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nSet-Cookie: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        set_cookie,
        body.len(),
        body
    )
}

pub(crate) fn http_500(body: &str) -> String {
    format!(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// An address nothing listens on; connections are refused immediately.
pub(crate) fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener addr");
    drop(listener);
    addr
}
