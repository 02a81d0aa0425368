/*!
 * Windowed batch execution.
 *
 * Eligible units are planned into batches, and the batches run in windows of
 * `max_concurrent_batches` concurrent calls. Each window is joined before the
 * next one starts, and cancellation is checked before every window and again
 * once a window has been merged. A batch
 * that keeps failing after its retries falls back to the original text of its
 * units, and the run carries on.
 */

use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::document::{Location, Section, TextUnit, UnitStatus};
use crate::errors::{PipelineError, ProviderError};
use crate::translation::batch::{plan_batches, Batch, BatchStatus};
use crate::translation::pipeline::{PipelinePhase, PipelineProgress};
use crate::translation::TranslationBackend;

/// Cooperative cancellation flag shared between a run and its caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next window boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub batch_size: usize,
    pub max_chars_per_batch: usize,
    pub max_concurrent_batches: usize,
    pub retry_count: u32,
    pub retry_backoff_ms: u64,
    pub translate_headers_footers: bool,
    pub translate_footnotes: bool,
    pub excluded_terms: Vec<String>,
}

impl SchedulerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            batch_size: config.batching.batch_size,
            max_chars_per_batch: config.batching.max_chars_per_batch,
            max_concurrent_batches: config.batching.max_concurrent_batches,
            retry_count: config.translation.common.retry_count,
            retry_backoff_ms: config.translation.common.retry_backoff_ms,
            translate_headers_footers: config.document.translate_headers_footers,
            translate_footnotes: config.document.translate_footnotes,
            excluded_terms: config.translation.common.excluded_terms.clone(),
        }
    }

    /// Whether units at this location are sent for translation.
    /// Body and table cells always are.
    pub fn is_eligible(&self, location: Location) -> bool {
        match location {
            Location::Header | Location::Footer => self.translate_headers_footers,
            Location::Footnote => self.translate_footnotes,
            Location::Body | Location::TableCell => true,
        }
    }
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of one scheduling pass
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    /// Planned batches with their final status
    pub batches: Vec<Batch>,

    /// Recoverable batch failures
    pub errors: Vec<PipelineError>,

    /// Whether cancellation was observed at a window boundary
    pub cancelled: bool,

    /// Number of units sent for translation
    pub eligible_units: usize,
}

/// Drives batches through the translation backend
#[derive(Debug, Clone, Default)]
pub struct BatchScheduler {
    options: SchedulerOptions,
}

impl BatchScheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Number of units that would be sent for translation
    pub fn count_eligible(&self, units: &[TextUnit]) -> usize {
        units.iter().filter(|u| self.options.is_eligible(u.location)).count()
    }

    /// Translate all eligible units in place.
    ///
    /// Ineligible units are completed with their original text up front, so
    /// every unit has a final text even when the pass is cancelled early.
    pub async fn run(
        &self,
        units: &mut [TextUnit],
        sections: &[Section],
        document_context: &str,
        backend: &dyn TranslationBackend,
        cancel: &CancellationToken,
        progress: &(dyn Fn(PipelineProgress) + Send + Sync),
    ) -> ScheduleOutcome {
        for unit in units.iter_mut() {
            if !self.options.is_eligible(unit.location) {
                let original = unit.text.clone();
                unit.complete(original);
            }
        }

        let index: HashMap<usize, usize> = units
            .iter()
            .enumerate()
            .map(|(position, unit)| (unit.unit_id, position))
            .collect();

        let eligible: Vec<&TextUnit> = units.iter().filter(|u| self.options.is_eligible(u.location)).collect();
        let eligible_units = eligible.len();
        let mut batches = plan_batches(eligible, self.options.batch_size, self.options.max_chars_per_batch);
        let total_batches = batches.len();

        info!(
            "Translating {} unit(s) in {} batch(es), {} at a time",
            eligible_units,
            total_batches,
            self.options.max_concurrent_batches
        );

        let mut outcome = ScheduleOutcome {
            eligible_units,
            ..Default::default()
        };
        let mut units_translated = 0;
        let mut batches_completed = 0;
        let width = self.options.max_concurrent_batches.max(1);

        for window in batches.chunks_mut(width) {
            if cancel.is_cancelled() {
                info!("Cancellation requested; stopping before batch {}", window[0].batch_id);
                outcome.cancelled = true;
                break;
            }

            let mut requests = Vec::with_capacity(window.len());
            for batch in window.iter_mut() {
                batch.status = BatchStatus::InFlight;
                let mut texts = Vec::with_capacity(batch.len());
                for unit_id in &batch.unit_ids {
                    let unit = &mut units[index[unit_id]];
                    unit.status = UnitStatus::Translating;
                    texts.push(unit.text.clone());
                }
                let section_context = batch
                    .unit_ids
                    .first()
                    .and_then(|&first| Section::containing(sections, first))
                    .map(Section::context_line);
                requests.push((texts, section_context));
            }

            let results = join_all(requests.iter().map(|(texts, section_context)| {
                self.translate_with_retry(backend, texts, document_context, section_context.as_deref())
            }))
            .await;

            for ((batch, (texts, _)), (result, retries)) in window.iter_mut().zip(&requests).zip(results) {
                batch.retry_count = retries;
                match result {
                    Ok(translations) => {
                        let translations = fit_length(batch.batch_id, translations, texts);
                        for (unit_id, translated) in batch.unit_ids.iter().zip(translations) {
                            let unit = &mut units[index[unit_id]];
                            self.warn_lost_terms(unit, &translated);
                            unit.complete(translated);
                        }
                        batch.status = BatchStatus::Completed;
                    }
                    Err(e) => {
                        let error = PipelineError::BatchTranslationFailed {
                            batch_id: batch.batch_id,
                            attempts: retries + 1,
                            message: e.to_string(),
                        };
                        warn!("{}; keeping original text for {} unit(s)", error, batch.len());
                        for unit_id in &batch.unit_ids {
                            units[index[unit_id]].fail(&e.to_string());
                        }
                        batch.status = BatchStatus::Failed;
                        outcome.errors.push(error);
                    }
                }
                units_translated += batch.len();
                batches_completed += 1;
            }

            progress(PipelineProgress {
                phase: PipelinePhase::Translation,
                units_translated,
                total_units: eligible_units,
                batches_completed,
                total_batches,
            });

            if cancel.is_cancelled() {
                info!("Cancellation requested while {} batch(es) were in flight", window.len());
                outcome.cancelled = true;
                break;
            }
        }

        outcome.batches = batches;
        outcome
    }

    /// Call the backend, retrying with exponential backoff.
    /// Returns the final result and the number of retries made.
    async fn translate_with_retry(
        &self,
        backend: &dyn TranslationBackend,
        texts: &[String],
        document_context: &str,
        section_context: Option<&str>,
    ) -> (Result<Vec<String>, ProviderError>, u32) {
        let mut attempt: u32 = 0;
        loop {
            match backend.translate_batch(texts, document_context, section_context).await {
                Ok(translations) => return (Ok(translations), attempt),
                Err(e @ ProviderError::AuthenticationError(_)) => return (Err(e), attempt),
                Err(e) if attempt < self.options.retry_count => {
                    let delay = self.options.retry_backoff_ms.saturating_mul(2u64.saturating_pow(attempt));
                    warn!("Batch call failed ({}), retrying in {}ms", e, delay);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }

    fn warn_lost_terms(&self, unit: &TextUnit, translated: &str) {
        for term in &self.options.excluded_terms {
            if !term.is_empty() && unit.text.contains(term.as_str()) && !translated.contains(term.as_str()) {
                warn!("Unit {}: excluded term '{}' is missing from the translation", unit.unit_id, term);
            }
        }
    }
}

/// Pad a short reply with the original texts and drop any extra entries
fn fit_length(batch_id: usize, mut translations: Vec<String>, originals: &[String]) -> Vec<String> {
    if translations.len() != originals.len() {
        warn!(
            "Batch {} returned {} translation(s) for {} unit(s); adjusting",
            batch_id,
            translations.len(),
            originals.len()
        );
    }
    translations.truncate(originals.len());
    let have = translations.len();
    translations.extend(originals[have..].iter().cloned());
    debug!("Batch {} fitted to {} entries", batch_id, translations.len());
    translations
}
