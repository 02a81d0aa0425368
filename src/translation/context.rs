/*!
 * Document-level context.
 *
 * A document is classified once per run from a sample of its leading units.
 * The result is rendered into every batch prompt so terminology and register
 * stay consistent across batches.
 */

use serde::{Deserialize, Serialize};

use crate::document::TextUnit;

/// One-shot classification of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentContext {
    /// Kind of document, e.g. "non-disclosure agreement"
    pub document_type: String,

    /// Named parties
    pub parties: Vec<String>,

    /// Governing jurisdiction, if stated
    #[serde(default)]
    pub jurisdiction: Option<String>,

    /// Register of the text, e.g. "formal"
    pub formality_level: String,

    /// Terms of art that must be translated consistently
    pub key_terms: Vec<String>,

    /// Short summary
    pub summary: String,
}

impl DocumentContext {
    /// Fallback used when classification fails
    pub fn generic() -> Self {
        Self {
            document_type: "legal document".to_string(),
            parties: Vec::new(),
            jurisdiction: None,
            formality_level: "formal".to_string(),
            key_terms: Vec::new(),
            summary: String::new(),
        }
    }

    /// Render the context as prompt text
    pub fn to_prompt_context(&self) -> String {
        let mut lines = vec![
            format!("Document type: {}", self.document_type),
            format!("Formality: {}", self.formality_level),
        ];
        if !self.parties.is_empty() {
            lines.push(format!("Parties: {}", self.parties.join("; ")));
        }
        if let Some(jurisdiction) = self.jurisdiction.as_deref().filter(|j| !j.is_empty()) {
            lines.push(format!("Jurisdiction: {}", jurisdiction));
        }
        if !self.key_terms.is_empty() {
            lines.push(format!("Key terms: {}", self.key_terms.join(", ")));
        }
        if !self.summary.is_empty() {
            lines.push(format!("Summary: {}", self.summary));
        }
        lines.join("\n")
    }
}

impl Default for DocumentContext {
    fn default() -> Self {
        Self::generic()
    }
}

/// Text of the first `limit` units, one per line
pub fn sample_text(units: &[TextUnit], limit: usize) -> String {
    units
        .iter()
        .take(limit)
        .map(|unit| unit.text.trim())
        .collect::<Vec<_>>()
        .join("\n")
}
