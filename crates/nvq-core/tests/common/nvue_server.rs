//! Minimal HTTP/1.1 server standing in for an NVUE endpoint in integration tests.
//!
//! Each path has a scripted list of (status, body) responses; the last entry
//! repeats once the script is exhausted. Unknown paths get 404. Every request's
//! header block is recorded so tests can assert on what the client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    /// Header names lowercased.
    pub headers: Vec<(String, String)>,
}

impl SeenRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, Vec<(u16, String)>>,
    served: HashMap<String, usize>,
    seen: Vec<SeenRequest>,
}

/// Handle to a running server. The server lives until the process exits.
#[derive(Clone)]
pub struct NvueServer {
    pub port: u16,
    state: Arc<Mutex<State>>,
}

impl NvueServer {
    /// Script the responses for `path`.
    pub fn route(&self, path: &str, responses: &[(u16, &str)]) {
        let mut state = self.state.lock().unwrap();
        state.scripts.insert(
            path.to_string(),
            responses.iter().map(|(s, b)| (*s, b.to_string())).collect(),
        );
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().seen.clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .seen
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

/// Starts a server on an ephemeral 127.0.0.1 port.
pub fn start() -> NvueServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(Mutex::new(State::default()));
    let accept_state = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&accept_state);
            thread::spawn(move || handle(stream, &state));
        }
    });
    NvueServer { port, state }
}

/// A port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().unwrap().port()
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let Ok(text) = std::str::from_utf8(&buf) else {
        return;
    };
    let Some(request) = parse_request(text) else {
        return;
    };

    let (status, body) = {
        let mut state = state.lock().unwrap();
        let path = request.path.clone();
        state.seen.push(request);
        let n = *state.served.get(&path).unwrap_or(&0);
        state.served.insert(path.clone(), n + 1);
        match state.scripts.get(&path) {
            Some(script) if !script.is_empty() => script[n.min(script.len() - 1)].clone(),
            _ => (404, String::new()),
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
}

fn parse_request(text: &str) -> Option<SeenRequest> {
    let mut lines = text.split("\r\n");
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    Some(SeenRequest {
        method,
        path,
        headers,
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
