//! Shared utilities for integration testing.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::Path,
    http::{Request, StatusCode},
    routing::any,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use forward_proxy::{ForwarderConfig, HttpServer, Shutdown};

/// A running proxy bound to an ephemeral port.
pub struct ProxyHandle {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

impl ProxyHandle {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Proxy config whose default target is a local plain-HTTP origin.
pub fn proxy_config(origin: SocketAddr) -> ForwarderConfig {
    let mut config = ForwarderConfig::default();
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.port = 0;
    config.target.default = format!("http://{origin}");
    config
}

/// Start the proxy and return once it is accepting connections.
pub async fn spawn_proxy(config: ForwarderConfig) -> ProxyHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listener, rx).await });
    ProxyHandle { addr, shutdown, task }
}

/// Serve an axum app on an ephemeral port.
pub async fn spawn_origin(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Origin that describes what it received.
///
/// - `/echo-body` answers with the request body
/// - `/status/{code}` answers with that status
/// - anything else answers with JSON: method, uri, headers (in order), body
pub fn echo_router() -> Router {
    Router::new()
        .route("/echo-body", any(echo_body))
        .route("/status/{code}", any(status))
        .fallback(describe)
}

async fn echo_body(request: Request<Body>) -> axum::body::Bytes {
    to_bytes(request.into_body(), usize::MAX).await.unwrap()
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn describe(request: Request<Body>) -> Json<Value> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap();
    let headers: Vec<[String; 2]> = parts
        .headers
        .iter()
        .map(|(k, v)| [k.to_string(), v.to_str().unwrap_or_default().to_string()])
        .collect();
    Json(json!({
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Header values named `name` from a `describe` response, in arrival order.
pub fn header_values(described: &Value, name: &str) -> Vec<String> {
    described["headers"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|pair| pair[0] == name)
        .map(|pair| pair[1].as_str().unwrap().to_string())
        .collect()
}

/// Start a raw TCP origin that reads the request head and writes `response`
/// verbatim. Returns its address and a hit counter.
pub async fn start_raw_origin(response: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, hits)
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Caller-side client: no pooling, no environment proxies, no redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
