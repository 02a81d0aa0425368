/*!
 * Prompt templates and the wire schema exchanged with the model.
 *
 * Requests and replies are plain JSON objects. Replies are decoded strictly:
 * anything other than the exact reply schema fails the call, and the caller
 * falls back through its length rule instead of repairing the data.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::ProviderError;
use crate::translation::context::DocumentContext;

/// System prompt template with `{placeholder}` substitution
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// System prompt for batch translation
    pub const LEGAL_TRANSLATOR: &'static str = r#"You are an expert legal translator translating {source_language} into {target_language}.

## Document
{document_context}

## Current section
{section_context}

## Rules
- Translate every segment faithfully; do not summarise, merge or split segments
- Keep defined terms, clause numbers and cross-references consistent across segments
- Keep the register of the source (legal documents are formal)
- Keep the following terms exactly as written: {excluded_terms}
- Preserve leading and trailing whitespace of each segment

## Output
Return ONLY a JSON object of the form {"translations": [{"id": <id>, "text": "<translation>"}]}
with exactly one entry per input segment id and no other fields or text."#;

    /// System prompt for document classification
    pub const DOCUMENT_CLASSIFIER: &'static str = r#"You classify legal documents. Read the excerpt and describe the document.

Return ONLY a JSON object with exactly these fields:
{"document_type": "<kind of document>", "parties": ["<party>"], "jurisdiction": "<governing law or null>", "formality_level": "<register>", "key_terms": ["<defined term>"], "summary": "<one sentence>"}"#;

    /// Create a template from a string
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template, replacing each `{key}` with its value
    pub fn render(&self, variables: &[(&str, &str)]) -> String {
        variables.iter().fold(self.template.clone(), |acc, (key, value)| {
            acc.replace(&format!("{{{}}}", key), value)
        })
    }
}

/// Build the system prompt for one translation batch
pub fn translation_system_prompt(
    source_language: &str,
    target_language: &str,
    document_context: &str,
    section_context: Option<&str>,
    excluded_terms: &[String],
) -> String {
    let excluded = if excluded_terms.is_empty() {
        "(none)".to_string()
    } else {
        excluded_terms.join(", ")
    };

    PromptTemplate::new(PromptTemplate::LEGAL_TRANSLATOR).render(&[
        ("source_language", source_language),
        ("target_language", target_language),
        ("document_context", document_context),
        ("section_context", section_context.unwrap_or("(not known)")),
        ("excluded_terms", &excluded),
    ])
}

/// Build the system prompt for document classification
pub fn classification_system_prompt() -> String {
    PromptTemplate::DOCUMENT_CLASSIFIER.to_string()
}

/// One segment on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Segment {
    pub id: usize,
    pub text: String,
}

/// Request body sent as the user message
#[derive(Debug, Serialize)]
pub struct TranslationRequest {
    pub segments: Vec<Segment>,
}

/// Reply body expected back from the model
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationReply {
    pub translations: Vec<Segment>,
}

/// Serialize batch texts with positional ids
pub fn build_segments_payload(texts: &[String]) -> Result<String, ProviderError> {
    let request = TranslationRequest {
        segments: texts
            .iter()
            .enumerate()
            .map(|(id, text)| Segment { id, text: text.clone() })
            .collect(),
    };
    serde_json::to_string(&request)
        .map_err(|e| ProviderError::ParseError(format!("Failed to encode segments: {}", e)))
}

/// Decode a translation reply.
///
/// Ids must be unique. Entries are ordered by id and only the contiguous run
/// `0..k` is kept, so a reply that skips an id is truncated at the gap.
pub fn decode_translations(raw: &str, expected: usize) -> Result<Vec<String>, ProviderError> {
    let reply: TranslationReply = serde_json::from_str(raw.trim())
        .map_err(|e| ProviderError::ParseError(format!("Invalid translation reply: {}", e)))?;

    let mut seen = HashSet::new();
    if let Some(duplicate) = reply.translations.iter().find(|s| !seen.insert(s.id)) {
        return Err(ProviderError::ParseError(format!(
            "Duplicate segment id {} in translation reply",
            duplicate.id
        )));
    }

    let mut segments = reply.translations;
    segments.sort_by_key(|s| s.id);

    let texts: Vec<String> = segments
        .into_iter()
        .enumerate()
        .take_while(|(position, segment)| *position == segment.id)
        .map(|(_, segment)| segment.text)
        .collect();

    if texts.len() != expected {
        log::debug!("Translation reply has {} usable segment(s), expected {}", texts.len(), expected);
    }
    Ok(texts)
}

/// Decode a classification reply
pub fn decode_document_context(raw: &str) -> Result<DocumentContext, ProviderError> {
    serde_json::from_str(raw.trim())
        .map_err(|e| ProviderError::ParseError(format!("Invalid classification reply: {}", e)))
}
