//! Minimal HTTP/1.1 stub for exercising the client against canned responses.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

#[derive(Clone)]
pub enum Reply {
    Json(u16, String),
    Bytes(u16, Vec<u8>),
    /// Accept the request and never answer.
    Stall,
}

#[derive(Clone)]
pub struct StubServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Serve `routes`, matched by path prefix (query ignored). Unmatched paths get 404.
    pub async fn start(routes: Vec<(&'static str, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = StubServer {
            base_url: format!("http://{}", addr),
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let routes = Arc::new(routes);
        let state = server.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    state.handle(stream, &routes).await;
                });
            }
        });
        server
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw request heads (request line plus headers), in arrival order.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    async fn handle(&self, mut stream: TcpStream, routes: &[(&'static str, Reply)]) {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        let head = String::from_utf8_lossy(&head).to_string();
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(head.clone());

        let target = head.split_whitespace().nth(1).unwrap_or("/");
        let path = target.split('?').next().unwrap_or("/");
        let reply = routes
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Json(404, r#"{"data":null,"error":{"status":404}}"#.into()));

        let (status, content_type, body) = match reply {
            Reply::Json(status, body) => (status, "application/json", body.into_bytes()),
            Reply::Bytes(status, body) => (status, "application/octet-stream", body),
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                return;
            }
        };
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown");
        let response_head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            reason,
            content_type,
            body.len()
        );
        let _ = stream.write_all(response_head.as_bytes()).await;
        let _ = stream.write_all(&body).await;
        let _ = stream.shutdown().await;
    }
}

/// Formatted log output collected in memory.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route this thread's crate events (DEBUG and up) into a buffer until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("cms_fallback=debug"))
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// An address nothing is listening on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn menu_body() -> String {
    serde_json::json!({
        "data": [
            {
                "id": 1,
                "documentId": "m1",
                "name": "Green Curry",
                "price": 14.0,
                "image": {
                    "url": "/uploads/green_curry.jpg",
                    "alternativeText": "Bowl of green curry",
                    "width": 800,
                    "height": 600,
                    "formats": {
                        "thumbnail": { "url": "/uploads/thumbnail_green_curry.jpg", "width": 156, "height": 117 }
                    }
                },
                "cuisine": { "id": 2, "name": "Thai" }
            },
            { "id": 2, "name": "Plain Rice", "image": null, "cuisine": null }
        ],
        "meta": { "pagination": { "page": 1, "pageSize": 25, "pageCount": 1, "total": 2 } }
    })
    .to_string()
}

pub fn homepage_body() -> String {
    serde_json::json!({
        "data": {
            "id": 1,
            "heroSection": {
                "title": "Fresh every day",
                "subtitle": "Since 1998",
                "heroImage": { "url": "/uploads/hero.jpg", "width": 1920, "height": 1080 }
            }
        },
        "meta": {}
    })
    .to_string()
}
