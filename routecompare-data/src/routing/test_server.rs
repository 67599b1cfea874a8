//! One-shot HTTP responder for adapter tests.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// A local listener that answers a single request with a canned response.
pub(crate) struct OneShotServer {
    url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    /// Endpoint URL pointing at the listener.
    pub(crate) fn url(&self) -> String {
        self.url.clone()
    }

    /// Wait for the request and return its request line, query included.
    pub(crate) fn request_line(self) -> String {
        self.handle.join().expect("server thread should finish")
    }
}

/// Bind an ephemeral port and answer the first request with `status` and
/// `body`.
pub(crate) fn serve_once(status: &'static str, body: &'static str) -> OneShotServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local address");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
        let mut request_line = String::new();
        reader
            .read_line(&mut request_line)
            .expect("read request line");
        loop {
            let mut header = String::new();
            let read = reader.read_line(&mut header).expect("read header");
            if read == 0 || header == "\r\n" {
                break;
            }
        }
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write response");
        stream.flush().expect("flush response");
        request_line
    });
    OneShotServer {
        url: format!("http://{addr}/route"),
        handle,
    }
}

pub(crate) fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build Tokio runtime")
        .block_on(future)
}
