//! Loopback HTTP server for session tests

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

const STALL_LIMIT: Duration = Duration::from_secs(4);

/// Build a raw ICY-style HTTP response; `metaint: None` omits the header.
pub(crate) fn icy_response(metaint: Option<&str>, body: Vec<u8>) -> Vec<u8> {
    let mut head = String::from("HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\n");
    if let Some(metaint) = metaint {
        head.push_str(&format!("icy-metaint: {metaint}\r\n"));
    }
    head.push_str("Connection: close\r\n\r\n");

    let mut response = head.into_bytes();
    response.extend(body);
    response
}

/// Serves a fixed response to a number of connections and records request heads.
pub(crate) struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub(crate) fn start(response: Vec<u8>, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();
        let response = Arc::new(response);

        thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let Ok(mut stream) = stream else { continue };
                let response = response.clone();
                let log = log.clone();
                thread::spawn(move || {
                    let head = read_request_head(&mut stream);
                    log.lock().unwrap().push(head);
                    let _ = stream.write_all(&response);
                    let _ = stream.flush();
                });
            }
        });

        Self { addr, requests }
    }

    /// Accepts one connection, sends `prefix`, then goes quiet.
    ///
    /// The receiver yields `true` once the client closes the connection, or
    /// `false` if it is still open after `STALL_LIMIT`.
    pub(crate) fn stalled(prefix: Vec<u8>) -> (Self, mpsc::Receiver<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (closed_tx, closed_rx) = mpsc::channel();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let _ = read_request_head(&mut stream);
                let _ = stream.write_all(&prefix);
                let _ = stream.flush();
                let _ = closed_tx.send(wait_for_close(&mut stream));
            }
        });

        let server = Self {
            addr,
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        (server, closed_rx)
    }

    /// A loopback URL with nothing listening behind it.
    pub(crate) fn unused_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/")
    }

    pub(crate) fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(1) => head.push(byte[0]),
            _ => break,
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

fn wait_for_close(stream: &mut TcpStream) -> bool {
    if stream.set_read_timeout(Some(STALL_LIMIT)).is_err() {
        return false;
    }
    let mut buf = [0u8; 256];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return true,
            Ok(_) => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                return false
            }
            Err(_) => return true,
        }
    }
}
