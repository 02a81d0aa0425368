/*!
 * End-to-end pipeline scenarios with the mock collaborator
 */

use parking_lot::Mutex;

use lexlate::document::layout::LayoutRepairConfig;
use lexlate::document::{Container, StructureParser, StructureRebuilder, UnitStatus};
use lexlate::errors::PipelineError;
use lexlate::providers::mock::{MockBehavior, MockProvider};
use lexlate::translation::{
    BatchScheduler, CancellationToken, PipelinePhase, PipelineProgress, PipelineResult, SchedulerOptions,
    TranslationPipeline,
};

use crate::common::{init_test_logger, paragraph, part_names, read_part, sample_agreement, DocxBuilder};

fn options(batch_size: usize, width: usize) -> SchedulerOptions {
    SchedulerOptions {
        batch_size,
        max_chars_per_batch: 10_000,
        max_concurrent_batches: width,
        retry_count: 0,
        retry_backoff_ms: 0,
        ..SchedulerOptions::default()
    }
}

fn pipeline(options: SchedulerOptions) -> TranslationPipeline {
    let layout = LayoutRepairConfig { enabled: false, ..Default::default() };
    TranslationPipeline::with_options(options, StructureRebuilder::new(layout), 20)
}

async fn run(pipeline: &TranslationPipeline, input: &[u8], provider: &MockProvider, cancel: &CancellationToken) -> PipelineResult {
    init_test_logger();
    pipeline.run(input, provider, provider, cancel, &|_: PipelineProgress| {}).await
}

fn body_texts(output: &[u8]) -> Vec<String> {
    let container = Container::open(output).unwrap();
    StructureParser::default()
        .parse(&container)
        .units
        .into_iter()
        .map(|u| u.text)
        .collect()
}

/// Test a full run over the sample agreement
#[tokio::test]
async fn test_pipeline_workingProvider_shouldTranslateEveryUnit() {
    let input = sample_agreement().build();
    let provider = MockProvider::working();

    let result = run(&pipeline(options(4, 2)), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success, "{}", result.summary());
    assert_eq!(result.phase, PipelinePhase::Complete);
    assert_eq!(result.total_units, 10);
    assert_eq!(result.successful_units, 10);
    assert_eq!(result.failed_units, 0);
    assert_eq!(result.total_batches, 3);
    assert!(result.errors.is_empty());

    let output = result.output.unwrap();
    let texts = body_texts(&output);
    assert_eq!(texts.len(), 10);
    assert!(texts.iter().all(|t| t.starts_with("[TRANSLATED] ")));
    assert_eq!(part_names(&output), part_names(&input));
}

/// Test that excluded headers and footers stay byte-identical
#[tokio::test]
async fn test_pipeline_headersExcluded_shouldKeepHeaderParts() {
    let input = sample_agreement().build();
    let provider = MockProvider::working();
    let options = SchedulerOptions {
        translate_headers_footers: false,
        ..options(20, 1)
    };

    let result = run(&pipeline(options), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success);
    let output = result.output.unwrap();
    assert_eq!(read_part(&output, "word/header1.xml"), read_part(&input, "word/header1.xml"));
    assert_eq!(read_part(&output, "word/footer1.xml"), read_part(&input, "word/footer1.xml"));
    let sent: usize = provider.calls().iter().map(|c| c.texts.len()).sum();
    assert_eq!(sent, 8);
}

/// Test cancellation between windows
#[tokio::test]
async fn test_pipeline_cancelAfterFirstWindow_shouldStopWithoutOutput() {
    let body = [paragraph("Clause one."), paragraph("Clause two."), paragraph("Clause three.")].concat();
    let input = DocxBuilder::new().body(&body).build();
    let cancel = CancellationToken::new();
    let provider = MockProvider::working().cancel_after(1, cancel.clone());

    let result = run(&pipeline(options(1, 1)), &input, &provider, &cancel).await;

    assert!(!result.success);
    assert!(result.output.is_none());
    assert_eq!(result.phase, PipelinePhase::Cancelled);
    assert_eq!(result.fatal_error(), Some(&PipelineError::Cancelled));
    assert_eq!(provider.request_count(), 1);
    let statuses: Vec<UnitStatus> = result.units.iter().map(|u| u.status).collect();
    assert_eq!(statuses, vec![UnitStatus::Completed, UnitStatus::Pending, UnitStatus::Pending]);
    assert!(result.summary().starts_with("Translation cancelled"));
}

/// Test that a cancel raised during the last window still stops the run
#[tokio::test]
async fn test_pipeline_cancelDuringLastWindow_shouldNotCommit() {
    let body = [paragraph("Clause one."), paragraph("Clause two."), paragraph("Clause three.")].concat();
    let input = DocxBuilder::new().body(&body).build();
    let cancel = CancellationToken::new();
    let provider = MockProvider::working().cancel_after(3, cancel.clone());

    let result = run(&pipeline(options(1, 1)), &input, &provider, &cancel).await;

    assert!(!result.success);
    assert_eq!(result.phase, PipelinePhase::Cancelled);
    assert!(result.output.is_none());
    assert_eq!(provider.request_count(), 3);
}

/// Test that a failed batch falls back to the original text
#[tokio::test]
async fn test_pipeline_failedBatch_shouldKeepOriginalText() {
    let body = [paragraph("Clause one."), paragraph("Clause two.")].concat();
    let input = DocxBuilder::new().body(&body).build();
    let provider = MockProvider::new(MockBehavior::FailOnCall { call: 0 });

    let result = run(&pipeline(options(1, 1)), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success);
    assert_eq!(result.failed_units, 1);
    assert_eq!(result.failed_batches, 1);
    assert!(matches!(
        result.errors[..],
        [PipelineError::BatchTranslationFailed { batch_id: 0, attempts: 1, .. }]
    ));
    assert_eq!(
        body_texts(&result.output.unwrap()),
        vec!["Clause one.", "[TRANSLATED] Clause two."]
    );
}

/// Test that an identity translation leaves every part unchanged
#[tokio::test]
async fn test_pipeline_echoProvider_shouldKeepPartsByteIdentical() {
    let input = sample_agreement().build();
    let provider = MockProvider::new(MockBehavior::Echo);

    let result = run(&pipeline(options(3, 2)), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success);
    let output = result.output.unwrap();
    for path in part_names(&input) {
        assert_eq!(read_part(&output, &path), read_part(&input, &path), "{} changed", path);
    }
}

/// Test that every eligible unit lands in exactly one batch
#[tokio::test]
async fn test_scheduler_batches_shouldPartitionEligibleUnits() {
    let container = Container::open(&sample_agreement().build()).unwrap();
    let mut document = StructureParser::default().parse(&container);
    let scheduler = BatchScheduler::new(SchedulerOptions {
        max_chars_per_batch: 60,
        translate_headers_footers: false,
        ..options(3, 2)
    });
    let provider = MockProvider::working();

    let outcome = scheduler
        .run(
            &mut document.units,
            &document.sections,
            "legal document",
            &provider,
            &CancellationToken::new(),
            &|_: PipelineProgress| {},
        )
        .await;

    let mut planned: Vec<usize> = outcome.batches.iter().flat_map(|b| b.unit_ids.clone()).collect();
    assert_eq!(outcome.eligible_units, 8);
    assert_eq!(planned.len(), outcome.eligible_units);
    planned.sort();
    assert_eq!(planned, (0..8).collect::<Vec<_>>());
    assert!(outcome.batches.iter().all(|b| b.len() <= 3));
}

/// Test that an unreadable archive fails in the parsing phase
#[tokio::test]
async fn test_pipeline_corruptArchive_shouldFailBeforeTranslation() {
    let provider = MockProvider::working();

    let result = run(&pipeline(options(20, 1)), b"PK\x03\x04 truncated", &provider, &CancellationToken::new()).await;

    assert!(!result.success);
    assert_eq!(result.phase, PipelinePhase::Parsing);
    assert!(matches!(result.fatal_error(), Some(PipelineError::CorruptArchive(_))));
    assert_eq!(provider.request_count(), 0);
}

/// Test that a malformed footer is skipped and the run still succeeds
#[tokio::test]
async fn test_pipeline_malformedFooter_shouldStillSucceed() {
    let input = sample_agreement()
        .part("word/footer1.xml", "<w:ftr><w:p><w:t>Broken</w:p>")
        .build();
    let provider = MockProvider::working();

    let result = run(&pipeline(options(20, 1)), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success);
    assert_eq!(result.total_units, 9);
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, PipelineError::MalformedPart { path, .. } if path == "word/footer1.xml")));
    let output = result.output.unwrap();
    assert_eq!(read_part(&output, "word/footer1.xml"), read_part(&input, "word/footer1.xml"));
}

/// Test that a short reply is padded with the original texts
#[tokio::test]
async fn test_pipeline_shortReply_shouldPadWithOriginals() {
    let body = [paragraph("Clause one."), paragraph("Clause two.")].concat();
    let input = DocxBuilder::new().body(&body).build();
    let provider = MockProvider::new(MockBehavior::WrongLength { delta: -1 });

    let result = run(&pipeline(options(20, 1)), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success);
    assert_eq!(
        body_texts(&result.output.unwrap()),
        vec!["[TRANSLATED] Clause one.", "Clause two."]
    );
}

/// Test that a document with nothing eligible never reaches the collaborator
#[tokio::test]
async fn test_pipeline_onlyExcludedContent_shouldReportNoTranslatableContent() {
    let input = DocxBuilder::new()
        .body("<w:p/>")
        .header(1, &paragraph("Confidential"))
        .build();
    let provider = MockProvider::working();
    let options = SchedulerOptions {
        translate_headers_footers: false,
        ..options(20, 1)
    };

    let result = run(&pipeline(options), &input, &provider, &CancellationToken::new()).await;

    assert!(!result.success);
    assert_eq!(result.fatal_error(), Some(&PipelineError::NoTranslatableContent));
    assert_eq!(provider.request_count(), 0);
}

/// Test the sequence of progress reports
#[tokio::test]
async fn test_pipeline_progress_shouldReportPhasesInOrder() {
    let input = sample_agreement().build();
    let provider = MockProvider::working();
    let reports = Mutex::new(Vec::new());

    let result = pipeline(options(5, 1))
        .run(&input, &provider, &provider, &CancellationToken::new(), &|p: PipelineProgress| {
            reports.lock().push(p)
        })
        .await;

    assert!(result.success);
    let reports = reports.into_inner();
    let phases: Vec<PipelinePhase> = reports.iter().map(|p| p.phase).collect();
    assert_eq!(
        phases,
        vec![
            PipelinePhase::Parsing,
            PipelinePhase::Analysis,
            PipelinePhase::Translation,
            PipelinePhase::Translation,
            PipelinePhase::Rebuild,
            PipelinePhase::Complete,
        ]
    );
    assert_eq!(reports[3].units_translated, 10);
    assert_eq!(reports[3].total_batches, 2);
}

/// Test that the section context reaches the collaborator
#[tokio::test]
async fn test_pipeline_sectionContext_shouldFollowBatchStart() {
    let input = sample_agreement().build();
    let provider = MockProvider::working();

    let result = run(&pipeline(options(2, 1)), &input, &provider, &CancellationToken::new()).await;

    assert!(result.success);
    let calls = provider.calls();
    assert_eq!(calls[1].texts[0], "1. Definitions");
    assert_eq!(calls[1].section_context.as_deref(), Some("Section \"1. Definitions\" (definitions)"));
    assert!(calls[0].document_context.contains("mock agreement"));
}
