/*!
 * Controller workflows over real files
 */

use lexlate::app_config::Config;
use lexlate::app_controller::ISSUES_LOG_NAME;
use lexlate::providers::mock::{MockBehavior, MockProvider};
use lexlate::Controller;

use crate::common::{create_temp_dir, create_test_document, read_part, sample_agreement};

fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.common.retry_count = 0;
    config.translation.common.retry_backoff_ms = 0;
    config
}

/// Test that a single document is translated into the output directory
#[tokio::test]
async fn test_run_shouldWriteTranslatedDocument() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_document(dir.path(), "services.docx", &sample_agreement().build()).unwrap();
    let out_dir = dir.path().join("out");
    let provider = MockProvider::working();
    let controller = Controller::with_collaborator(test_config(), provider.clone());

    controller.run(input, out_dir.clone(), false).await.unwrap();

    let output = std::fs::read(out_dir.join("services.fr.docx")).unwrap();
    let body = read_part(&output, "word/document.xml").unwrap();
    assert!(body.contains("[TRANSLATED] SERVICES AGREEMENT"));
    assert!(provider.request_count() > 0);
    assert!(!out_dir.join(ISSUES_LOG_NAME).exists());
}

/// Test that an existing output is skipped unless forced
#[tokio::test]
async fn test_run_existingOutput_shouldSkipWithoutForce() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_document(dir.path(), "nda.docx", &sample_agreement().build()).unwrap();
    let existing = create_test_document(dir.path(), "nda.fr.docx", b"previous").unwrap();
    let provider = MockProvider::working();
    let controller = Controller::with_collaborator(test_config(), provider.clone());

    controller.run(input.clone(), dir.path().to_path_buf(), false).await.unwrap();
    assert_eq!(std::fs::read(&existing).unwrap(), b"previous");
    assert_eq!(provider.request_count(), 0);

    controller.run(input, dir.path().to_path_buf(), true).await.unwrap();
    assert_ne!(std::fs::read(&existing).unwrap(), b"previous");
}

/// Test that a failed run reports an error and writes nothing
#[tokio::test]
async fn test_run_corruptInput_shouldFailWithoutOutput() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_document(dir.path(), "broken.docx", b"not a zip").unwrap();
    let controller = Controller::with_collaborator(test_config(), MockProvider::working());

    let result = controller.run(input, dir.path().to_path_buf(), false).await;

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Translation failed during parsing"), "{}", message);
    assert!(!dir.path().join("broken.fr.docx").exists());
}

/// Test that batch fallbacks are written to the issues log
#[tokio::test]
async fn test_run_withFailedBatch_shouldWriteIssuesLog() {
    let dir = create_temp_dir().unwrap();
    let input = create_test_document(dir.path(), "lease.docx", &sample_agreement().build()).unwrap();
    let controller = Controller::with_collaborator(test_config(), MockProvider::new(MockBehavior::FailOnCall { call: 0 }));

    controller.run(input, dir.path().to_path_buf(), false).await.unwrap();

    assert!(dir.path().join("lease.fr.docx").exists());
    let log = std::fs::read_to_string(dir.path().join(ISSUES_LOG_NAME)).unwrap();
    assert!(log.contains("[WARN] Batch 0 failed after 1 attempt(s)"));
    assert!(log.contains("en -> fr"));
}

/// Test folder processing with nested documents
#[tokio::test]
async fn test_runFolder_shouldTranslateEachDocumentInPlace() {
    let dir = create_temp_dir().unwrap();
    let nested = dir.path().join("clients");
    std::fs::create_dir(&nested).unwrap();
    let bytes = sample_agreement().build();
    create_test_document(dir.path(), "a.docx", &bytes).unwrap();
    create_test_document(&nested, "b.docx", &bytes).unwrap();
    create_test_document(dir.path(), "broken.docx", b"garbage").unwrap();
    let controller = Controller::with_collaborator(test_config(), MockProvider::working());

    controller.run_folder(dir.path().to_path_buf(), false).await.unwrap();

    assert!(dir.path().join("a.fr.docx").exists());
    assert!(nested.join("b.fr.docx").exists());
    assert!(!dir.path().join("broken.fr.docx").exists());
}

/// Test that a cancelled controller processes nothing further
#[tokio::test]
async fn test_runFolder_cancelledToken_shouldStopBeforeFirstDocument() {
    let dir = create_temp_dir().unwrap();
    create_test_document(dir.path(), "a.docx", &sample_agreement().build()).unwrap();
    let provider = MockProvider::working();
    let controller = Controller::with_collaborator(test_config(), provider.clone());

    controller.cancellation_token().cancel();
    controller.run_folder(dir.path().to_path_buf(), false).await.unwrap();

    assert_eq!(provider.request_count(), 0);
    assert!(!dir.path().join("a.fr.docx").exists());
}

/// Test that an empty folder is an error
#[test]
fn test_runFolder_withoutDocuments_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_collaborator(test_config(), MockProvider::working());

    let result = tokio_test::block_on(async { controller.run_folder(dir.path().to_path_buf(), false).await });

    assert!(result.is_err());
}

/// Test that a missing input file is reported
#[test]
fn test_run_missingInput_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let controller = Controller::with_collaborator(test_config(), MockProvider::working());

    let result = tokio_test::block_on(async {
        controller
            .run(dir.path().join("absent.docx"), dir.path().to_path_buf(), false)
            .await
    });

    assert!(result.unwrap_err().to_string().contains("does not exist"));
}
