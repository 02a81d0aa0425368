use anyhow::{anyhow, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::translation::{
    CancellationToken, ContextClassifier, PipelinePhase, PipelineProgress, PipelineResult,
    TranslationBackend, TranslationPipeline,
};

// @module: Application controller for document translation

/// Name of the issues log written next to outputs that needed fallbacks
pub const ISSUES_LOG_NAME: &str = "lexlate.issues.log";

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Collaborator shared for the whole process, seen through both roles
    backend: Arc<dyn TranslationBackend>,
    classifier: Arc<dyn ContextClassifier>,
    pipeline: TranslationPipeline,
    cancel: CancellationToken,
}

impl Controller {
    // @method: Create a controller over a collaborator that both classifies and translates
    pub fn with_collaborator<C>(config: Config, collaborator: C) -> Self
    where
        C: TranslationBackend + ContextClassifier + 'static,
    {
        let pipeline = TranslationPipeline::new(&config);
        let shared = Arc::new(collaborator);
        Self {
            config,
            backend: shared.clone(),
            classifier: shared,
            pipeline,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels the running translation at its next window boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Translate one document into the output directory
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, &multi_progress, force_overwrite)
            .await
            .map(|_| ())
    }

    /// Translate one document; returns the written output path, or `None` when skipped
    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        FileManager::ensure_dir(output_dir)?;

        let output_path = FileManager::generate_output_path(input_file, output_dir, &self.config.target_language);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", input_file);
            return Ok(None);
        }

        let input = FileManager::read_bytes(input_file)?;
        info!(
            "Translating {:?} with {} - {}",
            input_file,
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let pb = progress_bar.clone();
        let on_progress = move |progress: PipelineProgress| {
            if progress.phase == PipelinePhase::Translation {
                pb.set_length(progress.total_units as u64);
                pb.set_position(progress.units_translated as u64);
            }
            pb.set_message(progress.phase.to_string());
        };

        let result = self
            .pipeline
            .run(
                &input,
                self.backend.as_ref(),
                self.classifier.as_ref(),
                &self.cancel,
                &on_progress,
            )
            .await;
        progress_bar.finish_and_clear();

        info!("{}", result.summary());
        if result.errors.iter().any(|e| !e.is_fatal()) {
            let log_path = output_dir.join(ISSUES_LOG_NAME);
            match self.write_issues_log(&result, input_file, &log_path) {
                Ok(()) => info!("Issues written to {}", log_path.display()),
                Err(e) => warn!("Failed to write issues log: {}", e),
            }
        }

        if !result.success {
            return Err(anyhow!(result.summary()));
        }
        let bytes = result.output.ok_or_else(|| anyhow!("Pipeline succeeded without producing output"))?;
        FileManager::write_bytes(&output_path, &bytes)?;
        info!("Success: {}", output_path.display());
        Ok(Some(output_path))
    }

    /// Translate every document under a directory, writing outputs next to their inputs
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<()> {
        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let documents = FileManager::find_documents(&input_dir, &self.config.target_language)?;
        if documents.is_empty() {
            return Err(anyhow!("No documents found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(documents.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));

        let mut success_count = 0;
        let mut error_count = 0;
        let mut skip_count = 0;

        for document in &documents {
            if self.cancel.is_cancelled() {
                warn!("Cancelled; {} document(s) not processed", documents.len() - success_count - error_count - skip_count);
                break;
            }

            let file_name = document
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let output_dir = document.parent().map(Path::to_path_buf).unwrap_or_else(|| input_dir.clone());
            match self.run_with_progress(document, &output_dir, &multi_progress, force_overwrite).await {
                Ok(Some(_)) => success_count += 1,
                Ok(None) => skip_count += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    error_count += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed: {} translated, {} skipped, {} errors",
            success_count, skip_count, error_count
        );
        Ok(())
    }

    /// Write recoverable errors of a run to a log file
    fn write_issues_log(&self, result: &PipelineResult, input_file: &Path, log_path: &Path) -> Result<()> {
        let mut content = format!(
            "Translation Log - {}\nContext: {:?} {} -> {} ({} - {})\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            input_file,
            self.config.source_language,
            self.config.target_language,
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );
        for error in result.errors.iter().filter(|e| !e.is_fatal()) {
            content.push_str(&format!("[WARN] {}\n", error));
        }
        content.push_str(&format!("[INFO] {}\n", result.summary()));

        FileManager::write_bytes(log_path, content.as_bytes())
    }
}
