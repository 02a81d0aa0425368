/*!
 * Translation of parsed documents.
 *
 * - `batch`: greedy size-bounded batch planning
 * - `context`: document classification used to prime prompts
 * - `prompts`: prompt templates and the strict wire schema
 * - `scheduler`: windowed concurrent execution with retry and fallback
 * - `service`: LLM-backed collaborator over the configured provider
 * - `pipeline`: end-to-end parse, translate, rebuild orchestration
 */

use async_trait::async_trait;

use crate::errors::ProviderError;

pub mod batch;
pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod scheduler;
pub mod service;

// Re-export main types for easier usage
pub use self::batch::{plan_batches, Batch, BatchStatus};
pub use self::context::DocumentContext;
pub use self::pipeline::{PipelinePhase, PipelineProgress, PipelineResult, TranslationPipeline};
pub use self::scheduler::{BatchScheduler, CancellationToken, ScheduleOutcome, SchedulerOptions};
pub use self::service::LlmTranslator;

/// Translates one batch of unit texts
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate `texts` in order.
    ///
    /// Implementations should return one string per input; callers tolerate
    /// a mismatched length by padding or truncating.
    async fn translate_batch(
        &self,
        texts: &[String],
        document_context: &str,
        section_context: Option<&str>,
    ) -> Result<Vec<String>, ProviderError>;
}

/// Classifies a document from a sample of its text
#[async_trait]
pub trait ContextClassifier: Send + Sync {
    async fn classify_document(&self, sample: &str) -> Result<DocumentContext, ProviderError>;
}
