#![allow(dead_code)]
//! Local HTTP/1.1 server standing in for a DoH endpoint or the routing API.

use super::dns;
use doh_relay_domain::{Endpoint, EndpointProtocol};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DohMode {
    /// Answers every query with an A record.
    Answer = 0,
    /// Answers every query with SERVFAIL.
    ServFail = 1,
    /// Replies HTTP 503.
    HttpError = 2,
    /// Accepts the request and never answers.
    Hang = 3,
    /// Answers queries at `/` and replies HTTP 400 for any other path.
    RootOnly = 4,
}

impl DohMode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::ServFail,
            2 => Self::HttpError,
            3 => Self::Hang,
            4 => Self::RootOnly,
            _ => Self::Answer,
        }
    }
}

struct State {
    mode: AtomicU8,
    requests: AtomicU64,
    paths: Mutex<Vec<String>>,
    json_body: Mutex<Option<String>>,
}

pub struct MockDohServer {
    addr: SocketAddr,
    state: Arc<State>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDohServer {
    pub async fn start(mode: DohMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State {
            mode: AtomicU8::new(mode as u8),
            requests: AtomicU64::new(0),
            paths: Mutex::new(Vec::new()),
            json_body: Mutex::new(None),
        });

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = listener.accept() => {
                        if let Ok((stream, _)) = result {
                            tokio::spawn(serve(stream, Arc::clone(&server_state)));
                        }
                    }
                }
            }
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Serves `body` as `application/json` for every GET.
    pub async fn start_router(body: &str) -> Self {
        let server = Self::start(DohMode::Answer).await;
        *server.state.json_body.lock().unwrap() = Some(body.to_string());
        server
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", EndpointProtocol::Http, None).with_port(self.addr.port())
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn set_mode(&self, mode: DohMode) {
        self.state.mode.store(mode as u8, Ordering::SeqCst);
    }

    pub fn requests(&self) -> u64 {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<String> {
        self.state.paths.lock().unwrap().clone()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDohServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

struct Request {
    method: String,
    path: String,
    body: Vec<u8>,
}

async fn serve(mut stream: TcpStream, state: Arc<State>) {
    let mut buf = Vec::new();
    while let Some(request) = read_request(&mut stream, &mut buf).await {
        state.requests.fetch_add(1, Ordering::SeqCst);
        state.paths.lock().unwrap().push(request.path.clone());

        let json = state.json_body.lock().unwrap().clone();
        let response = if request.method == "GET" {
            match json {
                Some(body) => http_response(200, "application/json", body.as_bytes()),
                None => http_response(404, "text/plain", b"not found"),
            }
        } else {
            match DohMode::from_u8(state.mode.load(Ordering::SeqCst)) {
                DohMode::Answer => {
                    http_response(200, "application/dns-message", &dns::answer(&request.body, 0))
                }
                DohMode::ServFail => {
                    http_response(200, "application/dns-message", &dns::answer(&request.body, 2))
                }
                DohMode::HttpError => http_response(503, "text/plain", b"unavailable"),
                DohMode::RootOnly if request.path == "/" => {
                    http_response(200, "application/dns-message", &dns::answer(&request.body, 0))
                }
                DohMode::RootOnly => http_response(400, "text/plain", b"bad request"),
                DohMode::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    return;
                }
            }
        };

        if stream.write_all(&response).await.is_err() {
            return;
        }
    }
}

async fn read_request(stream: &mut TcpStream, buf: &mut Vec<u8>) -> Option<Request> {
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let mut chunk = [0u8; 4096];
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = buf[header_end..header_end + content_length].to_vec();
    buf.drain(..header_end + content_length);
    Some(Request { method, path, body })
}

fn http_response(status: u16, content_type: &str, body: &[u8]) -> Vec<u8> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Service Unavailable",
    };
    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        status,
        reason,
        content_type,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}
