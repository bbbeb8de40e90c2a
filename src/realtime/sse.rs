use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use super::{EventStream, RealtimeEvent, RealtimeTransport};
use crate::api::TokenManager;
use crate::errors::ClientError;

/// Server-sent-events transport for the push channel.
///
/// Connects to `{base}/api/events?user={id}` — the user id on the query
/// string is what joins the per-user room — and parses the
/// `event:`/`data:` line protocol into [`RealtimeEvent`]s. Keepalive
/// comments are swallowed.
pub struct SseTransport {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<dyn TokenManager>,
}

impl SseTransport {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenManager>,
    ) -> Result<Self, ClientError> {
        // No request timeout: the stream is long-lived. Only the dial is bounded.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            tokens,
        })
    }
}

#[async_trait]
impl RealtimeTransport for SseTransport {
    async fn connect(&self, user_id: &str) -> Result<EventStream, ClientError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/api/events?user={user_id}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header("accept", "text/event-stream")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), None));
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(pump_events(resp, tx));
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

async fn pump_events(resp: reqwest::Response, tx: mpsc::Sender<Result<RealtimeEvent, ClientError>>) {
    let body = resp.bytes_stream();
    tokio::pin!(body);
    let mut parser = SseParser::default();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for event in parser.push(&bytes) {
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(Err(ClientError::Network(e))).await;
                return;
            }
        }
    }
}

/// Incremental SSE line parser. Chunks may split lines (and UTF-8
/// sequences) anywhere, so bytes are buffered until a full line arrives;
/// a blank line dispatches the accumulated event.
#[derive(Default)]
pub struct SseParser {
    buf: Vec<u8>,
    event_name: Option<String>,
    data: String,
}

impl SseParser {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RealtimeEvent> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    out.push(event);
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.event_name = Some(rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix("data:") {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(rest.trim_start());
            }
            // Comments (keepalives), id: and retry: fields are ignored.
        }

        out
    }

    fn dispatch(&mut self) -> Option<RealtimeEvent> {
        if self.event_name.is_none() && self.data.is_empty() {
            return None;
        }
        let name = self
            .event_name
            .take()
            .unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data);
        let data = if data.is_empty() {
            None
        } else {
            serde_json::from_str(&data).ok()
        };
        Some(RealtimeEvent { name, data })
    }
}
