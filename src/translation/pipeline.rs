/*!
 * End-to-end translation pipeline.
 *
 * Phases run in order: parse the container, classify the document, translate
 * the eligible units in windows, rebuild the parts and commit the container.
 * Only an unreadable container, a document with nothing to translate and a
 * failed rebuild end the run early; part and batch failures are recorded in
 * the result and the run carries on.
 */

use log::{error, info, warn};
use std::fmt;
use std::time::Instant;

use crate::app_config::Config;
use crate::document::{Container, StructureParser, StructureRebuilder, TextUnit, UnitStatus};
use crate::errors::PipelineError;
use crate::translation::context::{sample_text, DocumentContext};
use crate::translation::scheduler::{BatchScheduler, CancellationToken, SchedulerOptions};
use crate::translation::{ContextClassifier, TranslationBackend};

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Parsing,
    Analysis,
    Translation,
    Rebuild,
    Complete,
    Cancelled,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsing => "parsing",
            Self::Analysis => "analysis",
            Self::Translation => "translation",
            Self::Rebuild => "rebuild",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

/// Progress snapshot passed to the progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineProgress {
    pub phase: PipelinePhase,
    /// Eligible units processed so far
    pub units_translated: usize,
    /// Eligible units in the document
    pub total_units: usize,
    pub batches_completed: usize,
    pub total_batches: usize,
}

impl PipelineProgress {
    fn phase(phase: PipelinePhase) -> Self {
        Self {
            phase,
            units_translated: 0,
            total_units: 0,
            batches_completed: 0,
            total_batches: 0,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Whether an output container was produced
    pub success: bool,

    /// Output container bytes, only on success
    pub output: Option<Vec<u8>>,

    pub total_units: usize,
    pub successful_units: usize,
    pub failed_units: usize,
    pub total_batches: usize,
    pub failed_batches: usize,

    /// Recoverable errors followed by the fatal one, if any
    pub errors: Vec<PipelineError>,

    pub elapsed_ms: u128,

    /// Final phase on success or cancellation; the failing phase otherwise
    pub phase: PipelinePhase,

    /// Units with their final status
    pub units: Vec<TextUnit>,
}

impl PipelineResult {
    fn new(phase: PipelinePhase) -> Self {
        Self {
            success: false,
            output: None,
            total_units: 0,
            successful_units: 0,
            failed_units: 0,
            total_batches: 0,
            failed_batches: 0,
            errors: Vec::new(),
            elapsed_ms: 0,
            phase,
            units: Vec::new(),
        }
    }

    /// The error that ended the run, if any
    pub fn fatal_error(&self) -> Option<&PipelineError> {
        self.errors.iter().find(|e| e.is_fatal())
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        let counts = format!(
            "{}/{} unit(s) translated, {} fell back to original; {}/{} batch(es) failed; {} warning(s); {:.1}s",
            self.successful_units,
            self.total_units,
            self.failed_units,
            self.failed_batches,
            self.total_batches,
            self.errors.iter().filter(|e| !e.is_fatal()).count(),
            self.elapsed_ms as f64 / 1000.0
        );

        match (self.success, self.phase, self.fatal_error()) {
            (true, _, _) => format!("Translation complete: {}", counts),
            (false, PipelinePhase::Cancelled, _) => format!("Translation cancelled: {}", counts),
            (false, phase, Some(e)) => format!("Translation failed during {}: {}; {}", phase, e, counts),
            (false, phase, None) => format!("Translation failed during {}; {}", phase, counts),
        }
    }
}

/// Parse, translate and rebuild one container
#[derive(Debug, Clone)]
pub struct TranslationPipeline {
    parser: StructureParser,
    scheduler: BatchScheduler,
    rebuilder: StructureRebuilder,
    context_sample_units: usize,
}

impl TranslationPipeline {
    /// Create a pipeline from the application configuration
    pub fn new(config: &Config) -> Self {
        Self::with_options(
            SchedulerOptions::from_config(config),
            StructureRebuilder::new(config.document.layout.clone()),
            config.document.context_sample_units,
        )
    }

    /// Create a pipeline from explicit parts
    pub fn with_options(options: SchedulerOptions, rebuilder: StructureRebuilder, context_sample_units: usize) -> Self {
        Self {
            parser: StructureParser::default(),
            scheduler: BatchScheduler::new(options),
            rebuilder,
            context_sample_units,
        }
    }

    /// Run the pipeline over container bytes
    pub async fn run(
        &self,
        input: &[u8],
        backend: &dyn TranslationBackend,
        classifier: &dyn ContextClassifier,
        cancel: &CancellationToken,
        progress: &(dyn Fn(PipelineProgress) + Send + Sync),
    ) -> PipelineResult {
        let started = Instant::now();
        let mut result = self.execute(input, backend, classifier, cancel, progress).await;
        result.elapsed_ms = started.elapsed().as_millis();

        match result.fatal_error() {
            Some(e) => error!("Pipeline stopped during {}: {}", result.phase, e),
            None => info!("Pipeline finished in phase {}", result.phase),
        }
        result
    }

    async fn execute(
        &self,
        input: &[u8],
        backend: &dyn TranslationBackend,
        classifier: &dyn ContextClassifier,
        cancel: &CancellationToken,
        progress: &(dyn Fn(PipelineProgress) + Send + Sync),
    ) -> PipelineResult {
        progress(PipelineProgress::phase(PipelinePhase::Parsing));
        let mut result = PipelineResult::new(PipelinePhase::Parsing);

        let mut container = match Container::open(input) {
            Ok(container) => container,
            Err(e) => {
                result.errors.push(e.into());
                return result;
            }
        };

        let mut document = self.parser.parse(&container);
        result.errors.append(&mut document.errors);
        result.total_units = document.units.len();
        info!(
            "Parsed {} part(s): {} unit(s) in {} section(s)",
            document.parts.len(),
            document.units.len(),
            document.sections.len()
        );

        if self.scheduler.count_eligible(&document.units) == 0 {
            result.errors.push(PipelineError::NoTranslatableContent);
            result.units = document.units;
            return result;
        }

        result.phase = PipelinePhase::Analysis;
        progress(PipelineProgress::phase(PipelinePhase::Analysis));
        let sample = sample_text(&document.units, self.context_sample_units);
        let context = match classifier.classify_document(&sample).await {
            Ok(context) => context,
            Err(e) => {
                warn!("Document classification failed, using generic context: {}", e);
                DocumentContext::generic()
            }
        };
        info!("Document classified as {}", context.document_type);

        result.phase = PipelinePhase::Translation;
        let outcome = self
            .scheduler
            .run(
                &mut document.units,
                &document.sections,
                &context.to_prompt_context(),
                backend,
                cancel,
                progress,
            )
            .await;

        result.total_batches = outcome.batches.len();
        result.failed_batches = outcome.errors.len();
        result.errors.extend(outcome.errors);
        result.successful_units = document.count_status(UnitStatus::Completed);
        result.failed_units = document.count_status(UnitStatus::Error);

        if outcome.cancelled {
            result.phase = PipelinePhase::Cancelled;
            result.errors.push(PipelineError::Cancelled);
            result.units = document.units;
            progress(PipelineProgress::phase(PipelinePhase::Cancelled));
            return result;
        }

        result.phase = PipelinePhase::Rebuild;
        progress(PipelineProgress::phase(PipelinePhase::Rebuild));
        let mapping = document.final_text_mapping();
        let output = self
            .rebuilder
            .rebuild(&mut container, &document, &mapping)
            .and_then(|parts| {
                info!("Injected text into {} paragraph(s)", parts);
                container.commit().map_err(|e| PipelineError::RebuildFailed(e.to_string()))
            });
        result.units = document.units;

        match output {
            Ok(bytes) => {
                result.success = true;
                result.output = Some(bytes);
                result.phase = PipelinePhase::Complete;
                progress(PipelineProgress::phase(PipelinePhase::Complete));
            }
            Err(e) => result.errors.push(e),
        }
        result
    }
}

impl Default for TranslationPipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
