//! Ollama chat client.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use stride_core::config::NlpConfig;
use stride_core::draft::{DEADLINE_FORMAT, PLACEHOLDER};
use stride_core::error::StrideError;
use stride_core::model::{ParsedTask, Priority};
use stride_core::traits::Extractor;

pub struct OllamaExtractor {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Raw shape the model is asked to produce.
#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    priority: Option<String>,
}

impl OllamaExtractor {
    pub fn new(config: &NlpConfig) -> Result<Self, StrideError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StrideError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    async fn chat(&self, system: &str, user: &str, json: bool) -> Result<String, StrideError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: system.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            stream: false,
            format: json.then(|| "json".to_string()),
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| StrideError::Nlp(format!("ollama request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(StrideError::Nlp(format!(
                "ollama returned {}",
                resp.status()
            )));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| StrideError::Nlp(format!("bad ollama response: {e}")))?;

        debug!("ollama reply: {}", body.message.content);
        Ok(body.message.content)
    }
}

fn extraction_prompt(now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let tomorrow = today + Days::new(1);
    format!(
        "You turn a short task description into JSON. Respond with a single \
         JSON object and nothing else, with these keys:\n\
         - \"title\": a short imperative title\n\
         - \"description\": remaining details, or \"\" if none\n\
         - \"deadline\": the due moment as \"DD.MM.YYYY HH:MM\" resolved to an \
         actual date, or null if none is mentioned\n\
         - \"priority\": one of \"low\", \"normal\", \"high\"; \"low\" if unclear\n\
         Today is {today}. Tomorrow is {tomorrow}. Do not invent a deadline."
    )
}

/// Turn model output into a [`ParsedTask`], tolerating fences and partial
/// fields. Missing title falls back to the raw input text.
fn parse_extraction(content: &str, fallback_title: &str) -> ParsedTask {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let raw: RawExtraction = match serde_json::from_str(trimmed) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("Undecodable extraction, using raw text as title: {err}");
            return ParsedTask {
                title: fallback_title.to_string(),
                description: String::new(),
                deadline: None,
                priority: Priority::Low,
            };
        }
    };

    let title = raw
        .title
        .filter(|t| !t.trim().is_empty() && t != PLACEHOLDER)
        .unwrap_or_else(|| fallback_title.to_string());

    let deadline = raw.deadline.and_then(|d| {
        NaiveDateTime::parse_from_str(d.trim(), DEADLINE_FORMAT)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    });

    let priority = raw
        .priority
        .as_deref()
        .and_then(Priority::parse)
        .unwrap_or(Priority::Low);

    ParsedTask {
        title,
        description: raw.description.unwrap_or_default(),
        deadline,
        priority,
    }
}

#[async_trait]
impl Extractor for OllamaExtractor {
    async fn extract_task(&self, text: &str) -> Result<ParsedTask, StrideError> {
        let system = extraction_prompt(Utc::now());
        let content = self.chat(&system, text, true).await?;
        Ok(parse_extraction(&content, text))
    }

    async fn motivation(&self, streak: u32) -> Result<String, StrideError> {
        let system = "You are a supportive habit coach. Reply with one short \
                      encouraging sentence, no emoji, no quotes.";
        let user = format!(
            "The user's current habit streak is {streak} consecutive days. \
             Encourage them to keep it going today."
        );
        let line = self.chat(system, &user, false).await?;
        let line = line.trim();
        if line.is_empty() {
            return Err(StrideError::Nlp("empty motivation reply".into()));
        }
        Ok(line.to_string())
    }
}
