/*!
 * Tests for file utilities
 */

use std::path::PathBuf;

use lexlate::file_utils::FileManager;

use crate::common::{create_temp_dir, create_test_document, sample_agreement};

/// Test folder discovery order and filtering
#[test]
fn test_findDocuments_shouldReturnSortedSourcesOnly() {
    let dir = create_temp_dir().unwrap();
    let bytes = sample_agreement().build();
    create_test_document(dir.path(), "b_lease.docx", &bytes).unwrap();
    create_test_document(dir.path(), "a_nda.docx", &bytes).unwrap();
    create_test_document(dir.path(), "a_nda.es.docx", &bytes).unwrap();
    create_test_document(dir.path(), "~$b_lease.docx", b"lock").unwrap();
    create_test_document(dir.path(), "readme.md", b"text").unwrap();

    let found = FileManager::find_documents(dir.path(), "es").unwrap();

    let names: Vec<String> = found
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a_nda.docx", "b_lease.docx"]);
}

/// Test that outputs for another language are still treated as sources
#[test]
fn test_findDocuments_withOtherLanguageOutput_shouldIncludeIt() {
    let dir = create_temp_dir().unwrap();
    create_test_document(dir.path(), "contract.de.docx", b"x").unwrap();

    let found = FileManager::find_documents(dir.path(), "fr").unwrap();

    assert_eq!(found.len(), 1);
}

/// Test output naming next to the source
#[test]
fn test_generateOutputPath_withDottedStem_shouldKeepStem() {
    let path = FileManager::generate_output_path("/in/master.v2.docx", "/in", "it");

    assert_eq!(path, PathBuf::from("/in/master.v2.it.docx"));
}

/// Test file existence checks
#[test]
fn test_fileExists_shouldRejectDirectories() {
    let dir = create_temp_dir().unwrap();
    let file = create_test_document(dir.path(), "x.docx", b"x").unwrap();

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(dir.path()));
    assert!(!FileManager::file_exists(dir.path().join("missing.docx")));
}
