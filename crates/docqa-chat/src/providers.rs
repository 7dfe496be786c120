//! Answer generation via external LLM chat-completion APIs.
//!
//! OpenAI and Groq share the `chat/completions` format. Anthropic uses the
//! Messages API with the system prompt as a top-level field.

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::ResolvedProvider;
use crate::types::{ChatMessage, LLMProvider};
use docqa_core::{Error, Result};

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions based on the provided context of the pdf.";

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Anthropic requires an explicit output budget.
const ANTHROPIC_MAX_TOKENS: usize = 1024;

/// Produces an answer to a question from retrieved context.
///
/// Failures are reported as [`Error::AnswerService`]. Implementations do not
/// retry.
pub trait AnswerService: Send + Sync {
    fn answer<'a>(&'a self, question: &'a str, context: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Join retrieved passages into one context string.
pub fn build_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt plus the context/question user message.
pub fn build_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Context: {context}\n\nQuestion: {question}")),
    ]
}

/// [`AnswerService`] backed by a hosted LLM.
pub struct LlmAnswerService {
    client: Client,
    provider: ResolvedProvider,
    endpoint: String,
}

impl LlmAnswerService {
    pub fn new(provider: ResolvedProvider) -> Self {
        Self::with_client(Client::new(), provider)
    }

    pub fn with_client(client: Client, provider: ResolvedProvider) -> Self {
        let endpoint = default_endpoint(provider.provider).to_string();
        Self {
            client,
            provider,
            endpoint,
        }
    }

    /// Send requests to `endpoint` instead of the provider's public API.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn provider(&self) -> &ResolvedProvider {
        &self.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let ResolvedProvider {
            provider,
            model,
            api_key,
        } = &self.provider;

        let request = match provider {
            LLMProvider::OpenAI | LLMProvider::Groq => self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", api_key))
                .json(&openai_body(model, &messages)),
            LLMProvider::Anthropic => self
                .client
                .post(&self.endpoint)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&anthropic_body(model, &messages)),
        };

        debug!("Requesting answer from {} with model {}", provider, model);

        let response = request
            .send()
            .await
            .map_err(|e| Error::AnswerService(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} API error {}: {}", provider, status, body);
            return Err(Error::AnswerService(format!("API error {}: {}", status, body)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::AnswerService(format!("Invalid response body: {}", e)))?;

        match provider {
            LLMProvider::OpenAI | LLMProvider::Groq => parse_openai_response(&body),
            LLMProvider::Anthropic => parse_anthropic_response(&body),
        }
    }
}

impl AnswerService for LlmAnswerService {
    fn answer<'a>(&'a self, question: &'a str, context: &'a str) -> BoxFuture<'a, Result<String>> {
        self.complete(build_messages(question, context)).boxed()
    }
}

fn default_endpoint(provider: LLMProvider) -> &'static str {
    match provider {
        LLMProvider::OpenAI => OPENAI_URL,
        LLMProvider::Groq => GROQ_URL,
        LLMProvider::Anthropic => ANTHROPIC_URL,
    }
}

fn openai_body(model: &str, messages: &[ChatMessage]) -> Value {
    json!({
        "model": model,
        "messages": messages,
    })
}

fn anthropic_body(model: &str, messages: &[ChatMessage]) -> Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .collect();
    let conversation: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();

    let mut body = json!({
        "model": model,
        "messages": conversation,
        "max_tokens": ANTHROPIC_MAX_TOKENS,
    });
    if !system.is_empty() {
        body["system"] = json!(system.join("\n"));
    }
    body
}

/// `choices[0].message.content` of a chat completion.
pub fn parse_openai_response(body: &Value) -> Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::AnswerService("response has no message content".into()))
}

/// Concatenated text blocks of a Messages API response.
pub fn parse_anthropic_response(body: &Value) -> Result<String> {
    let blocks = body["content"]
        .as_array()
        .ok_or_else(|| Error::AnswerService("response has no content blocks".into()))?;
    Ok(blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect())
}
