//! HTTP Transport
//!
//! reqwest-backed implementation of [`ChatTransport`] against the chat
//! server's endpoints:
//!
//! - `POST /api/chat/stream` - multipart form, blank-line-delimited reply
//!   stream
//! - `POST /api/chat/interrupt` - fire-and-forget stop signal
//! - `POST /api/chat/upload` - multipart attachments
//! - `GET/POST /api/settings/me` - account settings
//! - `DELETE /api/chat/conversations/{id}` - conversation delete
//!
//! The streaming request spawns a reader task that owns the response body:
//! it feeds chunks through the frame decoder, interprets each frame, and
//! forwards events over a bounded channel in strict arrival order. Reading
//! stops at `End`, on failure, or when the receiver is dropped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::protocol::{interpret, FrameDecoder, StreamEvent};

use super::traits::{ChatRequest, ChatTransport, SettingsUpdate, SettingsView, StreamSignal};
use super::ClientError;

/// Channel depth for reply streams
const STREAM_CHANNEL_CAPACITY: usize = 100;

/// HTTP client for the chat server
#[derive(Clone)]
pub struct HttpApiClient {
    base_url: String,
    http_client: reqwest::Client,
    stream_idle_timeout: Duration,
}

impl HttpApiClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.server_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder()
                .connect_timeout(config.connect_timeout)
                .build()
                .expect("Failed to create HTTP client"),
            stream_idle_timeout: config.stream_idle_timeout,
        }
    }

    fn stream_url(&self) -> String {
        format!("{}/api/chat/stream", self.base_url)
    }

    fn interrupt_url(&self) -> String {
        format!("{}/api/chat/interrupt", self.base_url)
    }

    fn upload_url(&self) -> String {
        format!("{}/api/chat/upload", self.base_url)
    }

    fn settings_url(&self) -> String {
        format!("{}/api/settings/me", self.base_url)
    }

    fn conversation_url(&self, conversation_id: &str) -> String {
        format!("{}/api/chat/conversations/{conversation_id}", self.base_url)
    }
}

/// Fail on non-success statuses, keeping the body for diagnostics
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

/// Response shape of the upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    files: Vec<String>,
}

#[async_trait]
impl ChatTransport for HttpApiClient {
    async fn stream_reply(
        &self,
        request: ChatRequest,
    ) -> Result<mpsc::Receiver<StreamSignal>, ClientError> {
        let mut form = reqwest::multipart::Form::new()
            .text("content", request.content)
            .text("request_id", request.request_id.clone());
        if let Some(conversation_id) = request.conversation_id {
            form = form.text("conversation_id", conversation_id);
        }
        if !request.files.is_empty() {
            form = form.text("files", request.files.join(","));
        }

        let response = self
            .http_client
            .post(self.stream_url())
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;

        let mut stream = response.bytes_stream();
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let idle_timeout = self.stream_idle_timeout;
        let request_id = request.request_id;

        tokio::spawn(async move {
            let mut decoder = FrameDecoder::new();
            loop {
                let chunk = match tokio::time::timeout(idle_timeout, stream.next()).await {
                    Err(_) => {
                        tracing::warn!(request_id = %request_id, "reply stream idle timeout");
                        let _ = tx
                            .send(StreamSignal::Failed(format!(
                                "no data from server for {}s",
                                idle_timeout.as_secs()
                            )))
                            .await;
                        return;
                    }
                    // Server closed without [DONE]; treat as end of reply.
                    Ok(None) => break,
                    Ok(Some(Err(err))) => {
                        tracing::warn!(request_id = %request_id, error = %err, "reply stream read failed");
                        let _ = tx.send(StreamSignal::Failed(err.to_string())).await;
                        return;
                    }
                    Ok(Some(Ok(bytes))) => bytes,
                };

                for frame in decoder.push_chunk(&chunk) {
                    match interpret(&frame) {
                        Some(StreamEvent::End) => {
                            // Nothing after End is meaningful; stop reading
                            // without touching the rest of this chunk.
                            let _ = tx.send(StreamSignal::Event(StreamEvent::End)).await;
                            return;
                        }
                        Some(event) => {
                            if tx.send(StreamSignal::Event(event)).await.is_err() {
                                // Receiver detached (interrupt); release the read.
                                return;
                            }
                        }
                        // Keep-alive or comment frame: dropped silently.
                        None => {}
                    }
                }
            }
            let _ = tx.send(StreamSignal::Event(StreamEvent::End)).await;
        });

        Ok(rx)
    }

    async fn interrupt(&self, request_id: &str) -> Result<(), ClientError> {
        let form = reqwest::multipart::Form::new().text("request_id", request_id.to_string());
        let response = self
            .http_client
            .post(self.interrupt_url())
            .multipart(form)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn upload(&self, files: &[PathBuf]) -> Result<Vec<String>, ClientError> {
        let mut form = reqwest::multipart::Form::new();
        for path in files {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| ClientError::Attachment {
                    path: path.display().to_string(),
                    source,
                })?;
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name_of(path));
            form = form.part("files", part);
        }

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response).await?;
        let upload: UploadResponse = response.json().await?;
        Ok(upload.files)
    }

    async fn fetch_settings(&self) -> Result<SettingsView, ClientError> {
        let response = self.http_client.get(self.settings_url()).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), ClientError> {
        let response = self
            .http_client
            .post(self.settings_url())
            .json(update)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), ClientError> {
        let response = self
            .http_client
            .delete(self.conversation_url(conversation_id))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

/// File name component for a multipart part, lossy but never empty
fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn client_for(url: &str) -> HttpApiClient {
        let config = ClientConfig {
            server_url: url.to_string(),
            ..ClientConfig::default()
        };
        HttpApiClient::new(&config)
    }

    #[test]
    fn test_endpoint_urls() {
        let client = client_for("http://localhost:8000");
        assert_eq!(client.stream_url(), "http://localhost:8000/api/chat/stream");
        assert_eq!(client.interrupt_url(), "http://localhost:8000/api/chat/interrupt");
        assert_eq!(client.upload_url(), "http://localhost:8000/api/chat/upload");
        assert_eq!(client.settings_url(), "http://localhost:8000/api/settings/me");
        assert_eq!(
            client.conversation_url("c-1"),
            "http://localhost:8000/api/chat/conversations/c-1"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let client = client_for("http://example.com/");
        assert_eq!(client.stream_url(), "http://example.com/api/chat/stream");
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of(Path::new("/tmp/up/report.txt")), "report.txt");
        assert_eq!(file_name_of(Path::new("/")), "attachment");
    }
}
