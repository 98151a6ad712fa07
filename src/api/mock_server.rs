//! Local HTTP server for exercising [`ApiClient`](super::ApiClient) over a real socket.
//!
//! Replies are served from a FIFO queue; once it is empty every request gets
//! `200 {}`. Each request is recorded (method, path with query, lower-cased
//! headers and body) so tests can assert on what went over the wire.
//!
//! ```ignore
//! let server = MockPlatformServer::builder()
//!     .with_reply(503, "")
//!     .with_reply(409, r#"{"msg": "Workflow name not unique"}"#)
//!     .build()
//!     .await;
//! let client = ApiClient::new(&server.config()).unwrap();
//! // ... call the client ...
//! assert_eq!(server.requests().await.len(), 2);
//! server.stop().await;
//! ```

use crate::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};

/// One canned HTTP reply.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
}

/// A request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string, e.g. `/api/v1/orgs/o/wfgrps/g/stacks/?runOnCreate=true`.
    pub target: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Default)]
struct ServerState {
    replies: Vec<MockReply>,
    next: usize,
    requests: Vec<RecordedRequest>,
}

pub struct MockPlatformServer {
    url: String,
    state: Arc<Mutex<ServerState>>,
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockPlatformServer {
    pub fn builder() -> MockPlatformServerBuilder {
        MockPlatformServerBuilder::default()
    }

    /// Base URL, e.g. `http://127.0.0.1:54321`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Client configuration pointing at this server, with a token set.
    pub fn config(&self) -> Config {
        Config {
            base_url: self.url.clone(),
            api_token: Some("sgu_mocktoken123".to_string()),
            request_timeout_secs: 5,
            ..Default::default()
        }
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}

#[derive(Default)]
pub struct MockPlatformServerBuilder {
    replies: Vec<MockReply>,
    latency_ms: u64,
}

impl MockPlatformServerBuilder {
    /// Queue a reply. Replies are served in FIFO order.
    pub fn with_reply(mut self, status: u16, body: impl Into<String>) -> Self {
        self.replies.push(MockReply {
            status,
            body: body.into(),
        });
        self
    }

    /// Delay every reply, after the request has been recorded.
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = ms;
        self
    }

    pub async fn build(self) -> MockPlatformServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let addr = listener.local_addr().expect("failed to get local addr");

        let state = Arc::new(Mutex::new(ServerState {
            replies: self.replies,
            ..Default::default()
        }));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&state),
            self.latency_ms,
            shutdown_rx,
        ));

        MockPlatformServer {
            url: format!("http://{}", addr),
            state,
            shutdown_tx,
            handle,
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<Mutex<ServerState>>,
    latency_ms: u64,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state, latency_ms).await {
                            tracing::debug!("mock server connection error: {}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("mock server accept error: {}", e),
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<Mutex<ServerState>>,
    latency_ms: u64,
) -> std::io::Result<()> {
    let Some(request) = read_request(&mut stream).await? else {
        return Ok(());
    };

    let reply = {
        let mut state = state.lock().await;
        state.requests.push(request);
        let reply = state.replies.get(state.next).cloned();
        if reply.is_some() {
            state.next += 1;
        }
        reply.unwrap_or(MockReply {
            status: 200,
            body: "{}".to_string(),
        })
    };

    if latency_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(latency_ms)).await;
    }

    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body,
    );
    stream.write_all(response.as_bytes()).await
}

/// Read one request: headers up to the blank line, then `Content-Length` bytes of body.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body_end = buf.len().min(header_end + content_length);

    Ok(Some(RecordedRequest {
        method,
        target,
        headers,
        body: buf[header_end..body_end].to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_queue_then_default() {
        let server = MockPlatformServer::builder()
            .with_reply(404, r#"{"msg": "missing"}"#)
            .build()
            .await;
        let client = reqwest::Client::new();

        let first = client
            .get(format!("{}/a", server.url()))
            .send()
            .await
            .unwrap();
        assert_eq!(first.status().as_u16(), 404);
        let second = client
            .get(format!("{}/b", server.url()))
            .send()
            .await
            .unwrap();
        assert_eq!(second.status().as_u16(), 200);
        assert_eq!(second.text().await.unwrap(), "{}");

        let requests = server.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].target, "/a");
        server.stop().await;
    }

    #[tokio::test]
    async fn test_records_method_headers_and_body() {
        let server = MockPlatformServer::builder().build().await;
        reqwest::Client::new()
            .patch(format!("{}/x?y=1", server.url()))
            .header("X-Request-Tag", "42")
            .json(&serde_json::json!({"ResourceName": "vpc"}))
            .send()
            .await
            .unwrap();

        let requests = server.requests().await;
        assert_eq!(requests[0].method, "PATCH");
        assert_eq!(requests[0].target, "/x?y=1");
        assert_eq!(requests[0].header("x-request-tag"), Some("42"));
        assert_eq!(requests[0].json()["ResourceName"], "vpc");
        server.stop().await;
    }
}
