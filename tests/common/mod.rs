//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Method, Request, Response, StatusCode},
    Router,
};
use inference_gateway::{GatewayConfig, HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const API_KEY: &str = "secret123";

/// What a recording backend saw.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct RecordingState {
    log: Arc<Mutex<Vec<Recorded>>>,
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Arc<Vec<u8>>,
}

/// An axum backend that records every request and answers with a fixed response.
pub struct RecordingBackend {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingBackend {
    pub async fn start(status: StatusCode, content_type: Option<&'static str>, body: Vec<u8>) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = RecordingState {
            log: log.clone(),
            status,
            content_type,
            body: Arc::new(body),
        };

        let app = Router::new().fallback(record).with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, log }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

async fn record(State(state): State<RecordingState>, request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap();
    state.log.lock().unwrap().push(Recorded {
        method: parts.method,
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body: body.to_vec(),
    });

    let mut builder = Response::builder().status(state.status);
    if let Some(ct) = state.content_type {
        builder = builder.header("content-type", ct);
    }
    builder.body(Body::from(state.body.as_ref().clone())).unwrap()
}

/// Read until the end of the request head so closing the socket later does
/// not reset the connection under unread data.
async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Start a raw TCP backend that writes `parts` with `delay` between them, then closes.
///
/// Lets tests produce framing a well-behaved server never would: early
/// disconnects, odd chunk boundaries, stalls.
pub async fn start_scripted_backend(parts: Vec<Vec<u8>>, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let parts = Arc::new(parts);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let parts = parts.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        for part in parts.iter() {
                            if socket.write_all(part).await.is_err() {
                                return;
                            }
                            let _ = socket.flush().await;
                            tokio::time::sleep(delay).await;
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A backend that answers one request with a chunked body that never ends.
pub struct EndlessBackend {
    pub addr: SocketAddr,
    written: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl EndlessBackend {
    pub async fn start(frame_size: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let written = Arc::new(AtomicU64::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        let (w, c) = (written.clone(), closed.clone());
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            read_request_head(&mut socket).await;

            let head = b"HTTP/1.1 200 OK\r\n\
Content-Type: application/x-ndjson\r\n\
Transfer-Encoding: chunked\r\n\r\n";
            if socket.write_all(head).await.is_err() {
                c.store(true, Ordering::SeqCst);
                return;
            }

            let mut frame = format!("{:x}\r\n", frame_size).into_bytes();
            frame.extend(std::iter::repeat(b'x').take(frame_size));
            frame.extend_from_slice(b"\r\n");

            loop {
                if socket.write_all(&frame).await.is_err() {
                    c.store(true, Ordering::SeqCst);
                    return;
                }
                w.fetch_add(frame.len() as u64, Ordering::SeqCst);
            }
        });

        Self { addr, written, closed }
    }

    /// Bytes fully handed to the kernel so far.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::SeqCst)
    }

    /// True once a write to the gateway failed.
    pub fn saw_close(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Gateway config pointing at `backend_url`, keyed with [`API_KEY`].
pub fn gateway_config(backend_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.api_key = API_KEY.into();
    config.backend.base_url = backend_url.into();
    config.backend.connect_timeout_secs = 2;
    config
}

/// A running gateway. Stops when dropped.
pub struct Gateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl Gateway {
    pub async fn start(config: GatewayConfig) -> Self {
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let server = HttpServer::new(config);
        let rx = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
