use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 200;
/// One initial request plus two stricter retries.
const MAX_ATTEMPTS: usize = 3;

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\.[A-Z]{3}\.[a-z0-9-]+$").expect("valid regex"));

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Generation request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Generation service returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Generation service returned an empty response")]
    EmptyResponse,
    #[error("Generated code did not match the required format after {attempts} attempts")]
    InvalidFormat { attempts: usize },
}

pub fn is_valid_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Produces `NNNN.AAA.slug` project codes by asking the Anthropic Messages
/// API and validating the reply. Keeps no state between calls; uniqueness is
/// the store's job.
pub struct CodeGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_url: String,
}

impl CodeGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            client,
            api_key,
            model,
            api_url: API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_api_url(api_key: String, model: String, api_url: String) -> Self {
        Self {
            api_url,
            ..Self::new(api_key, model)
        }
    }

    pub async fn generate(
        &self,
        client_name: &str,
        last_sequence: u32,
    ) -> Result<String, CodegenError> {
        for attempt in 1..=MAX_ATTEMPTS {
            let prompt = if attempt == 1 {
                Self::prompt(client_name, last_sequence)
            } else {
                Self::strict_prompt(client_name, last_sequence)
            };

            let raw = self.complete(&prompt).await?;
            if let Some(code) = extract_code(&raw).filter(|code| CODE_PATTERN.is_match(code)) {
                tracing::debug!(%code, attempt, "generated project code");
                return Ok(code);
            }

            tracing::warn!(attempt, "generation service returned a malformed project code");
        }

        Err(CodegenError::InvalidFormat {
            attempts: MAX_ATTEMPTS,
        })
    }

    fn prompt(client_name: &str, last_sequence: u32) -> String {
        format!(
            "The last used project sequence number is {last_sequence}. The client is \
             \"{client_name}\".\n\n\
             Generate the next project code in the format NNNN.AAA.client-slug, where:\n\
             - NNNN is the next sequence number ({next})\n\
             - AAA is a three-letter uppercase Latin abbreviation of the client name\n\
             - client-slug is a lowercase Latin slug of the client name (ascii letters, \
             digits and hyphens only)\n\n\
             Reply with the project code only, no other text.",
            next = last_sequence + 1,
        )
    }

    fn strict_prompt(client_name: &str, last_sequence: u32) -> String {
        format!(
            "Reply with EXACTLY one line matching the regular expression \
             ^\\d{{4}}\\.[A-Z]{{3}}\\.[a-z0-9-]+$ and nothing else. \
             The four digits must be {next}; the three uppercase letters abbreviate the \
             client \"{client_name}\"; the trailing slug is the client name in lowercase \
             Latin with hyphens. No quotes, no markdown, no explanation.",
            next = last_sequence + 1,
        )
    }

    async fn complete(&self, prompt: &str) -> Result<String, CodegenError> {
        let body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": 0.2,
            "system": "You generate project codes for a consulting agency. \
                       Reply with the code only.",
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|parsed| parsed.error.message)
                .unwrap_or(error_text);
            return Err(CodegenError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or(CodegenError::EmptyResponse)
    }
}

/// Pull the candidate code out of a model reply: drop code fences and
/// surrounding backticks, take the first non-empty line.
fn extract_code(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .map(|line| line.trim_matches('`').trim())
        .find(|line| !line.is_empty())
        .map(|line| line.to_string())
}
