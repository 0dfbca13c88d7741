//! Shared utilities for integration tests.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use spa_edge::config::{EdgeConfig, EnvironmentConfig, RewriteRule, RouteEntry};
use spa_edge::lifecycle::{prepare, Overrides, Shutdown};
use spa_edge::{EdgeServer, Environment};

pub const INDEX_HTML: &str = "<!doctype html><html><body><div id=\"app\"></div></body></html>";
pub const APP_CSS: &str = ".order-table{width:100%}";
pub const LOGO_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff, 0x10];

/// A running edge server. Shuts down when dropped.
pub struct Edge {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    _dist: TempDir,
}

impl Edge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Edge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Write a small built application into a temp dir.
pub fn build_dist() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", INDEX_HTML.as_bytes());
    write(dir.path(), "assets/app.css", APP_CSS.as_bytes());
    write(dir.path(), "assets/logo.png", LOGO_PNG);
    dir
}

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// A plain API route to `target` without rewrite.
pub fn route(prefix: &str, target: SocketAddr) -> RouteEntry {
    RouteEntry {
        path_prefix: prefix.to_string(),
        target: format!("http://{}", target),
        rewrite: None,
        change_origin: true,
        websocket: false,
    }
}

pub fn rewritten(prefix: &str, target: SocketAddr, pattern: &str, replacement: &str) -> RouteEntry {
    RouteEntry {
        rewrite: Some(RewriteRule::new(pattern, replacement)),
        ..route(prefix, target)
    }
}

/// Edge whose only route is an `/api/` prefix to an echo backend, for
/// exercising static assets and the fallback. Startup refuses an empty
/// route table.
pub async fn start_static_edge() -> Edge {
    let backend = start_echo_backend().await;
    start_edge(vec![route("/api/", backend)]).await
}

pub async fn start_edge(routes: Vec<RouteEntry>) -> Edge {
    start_edge_with(routes, |_| {}).await
}

/// Start an edge server on an ephemeral port with a single `test`
/// environment holding `routes`.
pub async fn start_edge_with(routes: Vec<RouteEntry>, configure: impl FnOnce(&mut EdgeConfig)) -> Edge {
    let dist = build_dist();

    let mut config = EdgeConfig::default();
    config.environments.clear();
    config
        .environments
        .insert("test".to_string(), EnvironmentConfig { routes });
    config.static_files.root = dist.path().to_path_buf();
    configure(&mut config);

    let prepared = prepare(config, &Environment::new("test"), &Overrides::default()).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = EdgeServer::new(&prepared.config, prepared.routes, prepared.assets);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Edge {
        addr,
        shutdown,
        _dist: dist,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Read one HTTP/1.1 request head plus a Content-Length body.
async fn read_request(socket: &mut TcpStream) -> Option<(String, Vec<(String, String)>, String)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some((request_line, headers, String::from_utf8_lossy(&body).to_string()))
}

/// Backend that describes the request it received.
///
/// The response body is one `key=value` per line: `line`, `host`,
/// `x-forwarded-for`, `connection`, `body`. A path containing
/// `/status/NNN` answers with that status.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Some((line, headers, body)) = read_request(&mut socket).await else {
                    return;
                };
                let header = |name: &str| {
                    headers
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_default()
                };

                let status = line
                    .split("/status/")
                    .nth(1)
                    .and_then(|rest| rest.get(..3))
                    .and_then(|code| code.parse::<u16>().ok())
                    .unwrap_or(200);

                let payload = format!(
                    "line={}\nhost={}\nx-forwarded-for={}\nconnection={}\nbody={}\n",
                    line,
                    header("host"),
                    header("x-forwarded-for"),
                    header("connection"),
                    body
                );
                let response = format!(
                    "HTTP/1.1 {} Echo\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nKeep-Alive: timeout=5\r\nConnection: close\r\n\r\n{}",
                    status,
                    payload.len(),
                    payload
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Backend that accepts connections and never answers.
pub async fn start_hanging_backend() -> SocketAddr {
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

/// Backend that reads the request and closes without answering.
pub async fn start_resetting_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                drop(socket);
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    tokio::time::sleep(Duration::from_millis(20)).await;
    addr
}

/// WebSocket backend that reports every text message on the returned
/// channel and answers it with `echo:<text>`.
pub async fn start_ws_echo_backend() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if msg.is_close() {
                        break;
                    }
                    if let Ok(text) = msg.to_text() {
                        let text = text.to_string();
                        let _ = tx.send(text.clone());
                        if ws.send(Message::text(format!("echo:{}", text))).await.is_err() {
                            break;
                        }
                    }
                }
            });
        }
    });

    (addr, rx)
}

/// Send a raw HTTP/1.1 request and return the status line of the reply.
pub async fn raw_status_line(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(2).any(|w| w == b"\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&buf).to_string();
    text.lines().next().unwrap_or_default().to_string()
}

/// Pull `key=value` out of an echo backend body.
pub fn echoed<'a>(body: &'a str, key: &str) -> &'a str {
    body.lines()
        .find_map(|line| line.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')))
        .unwrap_or_default()
}
