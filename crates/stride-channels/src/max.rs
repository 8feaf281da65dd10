//! MAX Bot API client.
//!
//! Inbound updates arrive over long polling on `GET /updates` and are
//! forwarded to the gateway as raw JSON, one payload per update. Outbound
//! traffic goes through [`Messenger`]: `POST /messages` to send, `PUT
//! /messages` to edit. Transient failures (network, timeout, 5xx) are
//! retried within a small budget; 4xx rejections are surfaced immediately.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use stride_core::config::MaxConfig;
use stride_core::error::StrideError;
use stride_core::message::{OutboundMessage, SentMessage};
use stride_core::traits::Messenger;

pub struct MaxChannel {
    client: reqwest::Client,
    base_url: String,
    token: String,
    request_timeout: Duration,
    send_retries: u32,
    poll_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    updates: Vec<serde_json::Value>,
    #[serde(default)]
    marker: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    message: SentBody,
}

#[derive(Debug, Deserialize)]
struct SentBody {
    body: SentMeta,
}

#[derive(Debug, Deserialize)]
struct SentMeta {
    mid: String,
    #[serde(default)]
    seq: i64,
}

impl MaxChannel {
    pub fn new(config: &MaxConfig) -> Result<Self, StrideError> {
        let token = config
            .resolve_token()
            .ok_or_else(|| StrideError::Config("MAX access token is not set".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| StrideError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            send_retries: config.send_retries,
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// Start long polling. Each update is forwarded as its raw JSON text.
    pub fn start(&self) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let token = self.token.clone();
        let poll_timeout = self.poll_timeout_secs;

        info!("MAX channel starting long polling");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;
            let mut marker: Option<i64> = None;

            loop {
                let mut url = format!(
                    "{base_url}/updates?access_token={token}&timeout={poll_timeout}"
                );
                if let Some(m) = marker {
                    url.push_str(&format!("&marker={m}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(Duration::from_secs(poll_timeout + 5))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("max poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !resp.status().is_success() {
                    error!(
                        "max poll returned {} (retry in {backoff_secs}s)",
                        resp.status()
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                let body: UpdatesResponse = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("max parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                backoff_secs = 1;

                if let Some(m) = body.marker {
                    marker = Some(m);
                }

                for update in body.updates {
                    let raw = update.to_string();
                    debug!("max update: {raw}");
                    if tx.send(raw).await.is_err() {
                        info!("Update receiver dropped, stopping poll loop");
                        return;
                    }
                }
            }
        });

        rx
    }

    fn render_body(body: &OutboundMessage) -> serde_json::Value {
        let mut out = serde_json::json!({ "text": body.text });
        if let Some(keyboard) = &body.keyboard {
            out["attachments"] = serde_json::json!([{
                "type": "inline_keyboard",
                "payload": { "buttons": keyboard.buttons },
            }]);
        }
        out
    }

    /// Run one outbound request, classifying the failure mode.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StrideError> {
        let resp = request
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| StrideError::Channel(format!("request failed: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StrideError::ChannelRejected(format!("{status}: {text}")));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(StrideError::Channel(format!("{status}: {text}")));
        }
        Ok(resp)
    }

    /// Retry wrapper: transient errors get `send_retries` extra attempts,
    /// rejections none.
    async fn with_retries<F, Fut>(&self, mut attempt: F) -> Result<reqwest::Response, StrideError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, StrideError>>,
    {
        let mut last = None;
        for n in 0..=self.send_retries {
            match attempt().await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_transient() => {
                    debug!("transient channel error (attempt {}): {e}", n + 1);
                    last = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last.unwrap_or_else(|| StrideError::Channel("send failed".into())))
    }
}

#[async_trait]
impl Messenger for MaxChannel {
    async fn send(
        &self,
        chat_id: i64,
        body: OutboundMessage,
    ) -> Result<SentMessage, StrideError> {
        let url = format!(
            "{}/messages?access_token={}&chat_id={chat_id}",
            self.base_url, self.token
        );
        let payload = Self::render_body(&body);

        let resp = self
            .with_retries(|| self.execute(self.client.post(&url).json(&payload)))
            .await?;

        let sent: SendResponse = resp
            .json()
            .await
            .map_err(|e| StrideError::Channel(format!("bad send response: {e}")))?;

        Ok(SentMessage {
            message_id: sent.message.body.mid,
            seq: sent.message.body.seq,
        })
    }

    async fn edit(&self, message_id: &str, body: OutboundMessage) -> Result<(), StrideError> {
        let url = format!(
            "{}/messages?access_token={}&message_id={message_id}",
            self.base_url, self.token
        );
        let payload = Self::render_body(&body);

        self.with_retries(|| self.execute(self.client.put(&url).json(&payload)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::message::Keyboard;

    #[test]
    fn test_render_body_plain_text() {
        let body = OutboundMessage::text("hello");
        let json = MaxChannel::render_body(&body);
        assert_eq!(json["text"], "hello");
        assert!(json.get("attachments").is_none());
    }

    #[test]
    fn test_render_body_with_keyboard() {
        let kb = Keyboard::builder().button("Tasks", "tasks-menu").build();
        let body = OutboundMessage::with_keyboard("pick", kb);
        let json = MaxChannel::render_body(&body);
        assert_eq!(json["attachments"][0]["type"], "inline_keyboard");
        assert_eq!(
            json["attachments"][0]["payload"]["buttons"][0][0]["payload"],
            "tasks-menu"
        );
    }

    #[test]
    fn test_updates_response_tolerates_missing_fields() {
        let resp: UpdatesResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.updates.is_empty());
        assert_eq!(resp.marker, None);

        let resp: UpdatesResponse =
            serde_json::from_str(r#"{"updates": [{"update_type": "x"}], "marker": 5}"#).unwrap();
        assert_eq!(resp.updates.len(), 1);
        assert_eq!(resp.marker, Some(5));
    }

    #[test]
    fn test_send_response_parses() {
        let raw = r#"{"message": {"body": {"mid": "mid.42", "seq": 9, "text": "hi"}}}"#;
        let resp: SendResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.message.body.mid, "mid.42");
        assert_eq!(resp.message.body.seq, 9);
    }
}
