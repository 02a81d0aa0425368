/*!
 * Tests for configuration loading and persistence
 */

use lexlate::app_config::{Config, LogLevel, TranslationProvider};
use lexlate::translation::SchedulerOptions;

use crate::common::create_temp_dir;

/// Test that saved settings are loaded back unchanged
#[test]
fn test_save_thenLoad_shouldPreserveSettings() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "de".to_string();
    config.translation.provider = TranslationProvider::OpenAI;
    config.translation.active_provider_config_mut().model = "gpt-4o-mini".to_string();
    config.translation.common.excluded_terms = vec!["Acme Ltd".to_string()];
    config.batching.max_concurrent_batches = 5;
    config.document.translate_headers_footers = false;
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load_or_create(&path).unwrap();

    assert_eq!(loaded.target_language, "de");
    assert_eq!(loaded.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(loaded.translation.get_model(), "gpt-4o-mini");
    assert_eq!(loaded.translation.common.excluded_terms, vec!["Acme Ltd"]);
    assert_eq!(loaded.batching.max_concurrent_batches, 5);
    assert!(!loaded.document.translate_headers_footers);
}

/// Test that a broken config file is reported instead of replaced
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

/// Test that scheduler options follow the loaded configuration
#[test]
fn test_schedulerOptions_fromConfig_shouldCopyBatchingSettings() {
    let mut config = Config::default();
    config.batching.batch_size = 7;
    config.batching.max_chars_per_batch = 900;
    config.translation.common.retry_count = 1;
    config.document.translate_footnotes = false;

    let options = SchedulerOptions::from_config(&config);

    assert_eq!(options.batch_size, 7);
    assert_eq!(options.max_chars_per_batch, 900);
    assert_eq!(options.max_concurrent_batches, config.batching.max_concurrent_batches);
    assert_eq!(options.retry_count, 1);
    assert!(!options.translate_footnotes);
    assert!(options.translate_headers_footers);
}
