/*!
 * LLM-backed translation collaborator.
 *
 * `LlmTranslator` wraps the configured provider client and implements both
 * collaborator traits. Batches go out as a JSON list of segments and come back
 * through the strict reply decoder in `prompts`.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::app_config::{Config, TranslationProvider};
use crate::errors::ProviderError;
use crate::language_utils::get_language_name;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{ChatMessage, ChatRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::Provider;
use crate::translation::context::DocumentContext;
use crate::translation::prompts;
use crate::translation::{ContextClassifier, TranslationBackend};

/// Placeholder key for local OpenAI-compatible servers
const LM_STUDIO_API_KEY: &str = "lm-studio";

/// Output token bounds for providers that require an explicit limit
const MIN_MAX_TOKENS: u32 = 1024;
const MAX_MAX_TOKENS: u32 = 8192;

/// Provider client variants
#[derive(Debug)]
enum ProviderClient {
    /// Ollama LLM service
    Ollama { client: Ollama, model: String },

    /// OpenAI API or an OpenAI-compatible local server
    OpenAI { client: OpenAI, model: String },

    /// Anthropic API service
    Anthropic { client: Anthropic, model: String },
}

/// Translator over the configured LLM provider
#[derive(Debug)]
pub struct LlmTranslator {
    client: ProviderClient,
    source_language: String,
    target_language: String,
    temperature: f32,
    excluded_terms: Vec<String>,
}

impl LlmTranslator {
    /// Build the translator for the active provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let model = translation.get_model();
        let endpoint = translation.get_endpoint();
        let timeout_secs = translation.get_timeout_secs();

        let client = match translation.provider {
            TranslationProvider::Ollama => ProviderClient::Ollama {
                client: Ollama::from_url(endpoint, timeout_secs),
                model,
            },
            TranslationProvider::OpenAI => ProviderClient::OpenAI {
                client: OpenAI::new(translation.get_api_key(), endpoint, model.clone(), timeout_secs),
                model,
            },
            TranslationProvider::LMStudio => {
                let api_key = Some(translation.get_api_key())
                    .filter(|key| !key.is_empty())
                    .unwrap_or_else(|| LM_STUDIO_API_KEY.to_string());
                ProviderClient::OpenAI {
                    client: OpenAI::new(api_key, endpoint, model.clone(), timeout_secs),
                    model,
                }
            }
            TranslationProvider::Anthropic => ProviderClient::Anthropic {
                client: Anthropic::new(translation.get_api_key(), endpoint, model.clone(), timeout_secs),
                model,
            },
        };

        Ok(Self {
            client,
            source_language: get_language_name(&config.source_language)?,
            target_language: get_language_name(&config.target_language)?,
            temperature: translation.common.temperature,
            excluded_terms: translation.common.excluded_terms.clone(),
        })
    }

    /// Check that the provider is reachable
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        match &self.client {
            ProviderClient::Ollama { client, .. } => client.test_connection().await,
            ProviderClient::OpenAI { client, .. } => client.test_connection().await,
            ProviderClient::Anthropic { client, .. } => client.test_connection().await,
        }
    }

    /// Send one system/user exchange and return the raw reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        match &self.client {
            ProviderClient::Ollama { client, model } => {
                let request = ChatRequest::new(
                    model.clone(),
                    vec![
                        ChatMessage { role: "system".to_string(), content: system.to_string() },
                        ChatMessage { role: "user".to_string(), content: user.to_string() },
                    ],
                )
                .temperature(self.temperature)
                .num_predict(max_tokens_for(user))
                .format("json");
                let response = client.complete(request).await?;
                Ok(Ollama::extract_text(&response))
            }
            ProviderClient::OpenAI { client, model } => {
                let request = OpenAIRequest::new(model.clone())
                    .add_message("system", system)
                    .add_message("user", user)
                    .temperature(self.temperature)
                    .max_tokens(max_tokens_for(user))
                    .json_mode();
                let response = client.complete(request).await?;
                Ok(OpenAI::extract_text(&response))
            }
            ProviderClient::Anthropic { client, model } => {
                let request = AnthropicRequest::new(model.clone(), max_tokens_for(user))
                    .system(system)
                    .add_message("user", user)
                    .temperature(self.temperature);
                let response = client.complete(request).await?;
                Ok(Anthropic::extract_text(&response))
            }
        }
    }
}

/// Output budget sized to the input; translations run somewhat longer than their source
fn max_tokens_for(user: &str) -> u32 {
    let estimate = u32::try_from(user.chars().count()).unwrap_or(u32::MAX) / 2;
    estimate.clamp(MIN_MAX_TOKENS, MAX_MAX_TOKENS)
}

#[async_trait]
impl TranslationBackend for LlmTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        document_context: &str,
        section_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError> {
        let system = prompts::translation_system_prompt(
            &self.source_language,
            &self.target_language,
            document_context,
            section_context,
            &self.excluded_terms,
        );
        let payload = prompts::build_segments_payload(texts)?;
        debug!("Sending {} segment(s) ({} bytes)", texts.len(), payload.len());

        let reply = self.complete(&system, &payload).await?;
        prompts::decode_translations(&reply, texts.len())
    }
}

#[async_trait]
impl ContextClassifier for LlmTranslator {
    async fn classify_document(&self, sample: &str) -> Result<DocumentContext, ProviderError> {
        let reply = self.complete(&prompts::classification_system_prompt(), sample).await?;
        prompts::decode_document_context(&reply)
    }
}
