//! LLM configuration loading and provider selection.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::LLMProvider;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Stored LLM configuration (`llm-config.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMConfig {
    /// `"auto"`, `"groq"`, `"openai"` or `"anthropic"`.
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            groq_api_key: None,
            openai_api_key: None,
            anthropic_api_key: None,
            groq_model: default_groq_model(),
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
        }
    }
}

/// A provider with everything needed to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProvider {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    /// Like [`LLMConfig::load`], reading fallback keys through `env`.
    pub fn load_with_env(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match std::fs::read_to_string(config_path) {
            Ok(s) => match serde_json::from_str::<LLMConfig>(&s) {
                Ok(c) => {
                    info!("Loaded LLM config from {}", config_path.display());
                    c
                }
                Err(e) => {
                    warn!(
                        "Ignoring unreadable LLM config {}: {}",
                        config_path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        // Env vars as fallback for API keys
        if config.groq_api_key.is_none() {
            config.groq_api_key = env("GROQ_API_KEY");
        }
        if config.openai_api_key.is_none() {
            config.openai_api_key = env("OPENAI_API_KEY");
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = env("ANTHROPIC_API_KEY");
        }
        config
    }

    /// Resolve which provider, model and key to use.
    ///
    /// An explicit preference only resolves if that provider has a key. In
    /// auto mode the order is Groq, OpenAI, Anthropic.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        let groq = || self.candidate(LLMProvider::Groq, &self.groq_api_key, &self.groq_model);
        let openai = || self.candidate(LLMProvider::OpenAI, &self.openai_api_key, &self.openai_model);
        let anthropic = || {
            self.candidate(
                LLMProvider::Anthropic,
                &self.anthropic_api_key,
                &self.anthropic_model,
            )
        };

        match self.preferred_provider.as_str() {
            "auto" => groq().or_else(openai).or_else(anthropic),
            "groq" => groq(),
            "openai" => openai(),
            "anthropic" => anthropic(),
            other => {
                warn!("Unknown preferred LLM provider '{}'", other);
                None
            }
        }
    }

    fn candidate(
        &self,
        provider: LLMProvider,
        key: &Option<String>,
        model: &str,
    ) -> Option<ResolvedProvider> {
        key.as_ref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| ResolvedProvider {
                provider,
                model: model.to_string(),
                api_key: k.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = LLMConfig::load_with_env(&dir.path().join("llm-config.json"), no_env);
        assert_eq!(config, LLMConfig::default());
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_env_fallback_defaults_to_groq() {
        let dir = TempDir::new().unwrap();
        let config = LLMConfig::load_with_env(&dir.path().join("llm-config.json"), |name| {
            (name == "GROQ_API_KEY").then(|| "gsk-test".to_string())
        });
        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Groq);
        assert_eq!(resolved.model, "llama-3.3-70b-versatile");
        assert_eq!(resolved.api_key, "gsk-test");
    }

    #[test]
    fn test_file_values_win_over_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(
            &path,
            r#"{"preferred_provider": "anthropic", "anthropic_api_key": "from-file"}"#,
        )
        .unwrap();

        let config = LLMConfig::load_with_env(&path, |_| Some("from-env".to_string()));
        assert_eq!(config.anthropic_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.groq_api_key.as_deref(), Some("from-env"));

        let resolved = config.resolve_provider().unwrap();
        assert_eq!(resolved.provider, LLMProvider::Anthropic);
        assert_eq!(resolved.model, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(resolved.api_key, "from-file");
    }

    #[test]
    fn test_explicit_provider_without_key() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
    }

    #[test]
    fn test_auto_order_and_blank_keys() {
        let config = LLMConfig {
            groq_api_key: Some("   ".into()),
            openai_api_key: Some("sk".into()),
            anthropic_api_key: Some("ak".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_provider().unwrap().provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = LLMConfig::load_with_env(&path, no_env);
        assert_eq!(config.preferred_provider, "auto");
    }
}
