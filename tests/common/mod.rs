/*!
 * Common test utilities for the lexlate test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Builds minimal DOCX containers in memory
#[derive(Debug, Clone)]
pub struct DocxBuilder {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    /// Package skeleton with an empty body
    pub fn new() -> Self {
        Self {
            parts: vec![
                ("[Content_Types].xml".to_string(), CONTENT_TYPES.as_bytes().to_vec()),
                ("_rels/.rels".to_string(), ROOT_RELS.as_bytes().to_vec()),
            ],
        }
        .body("")
    }

    /// Set the body of `word/document.xml`
    pub fn body(self, body_xml: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
            W_NS, body_xml
        );
        self.part("word/document.xml", &xml)
    }

    /// Add a header part with the given paragraphs
    pub fn header(self, index: usize, paragraphs_xml: &str) -> Self {
        let xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:hdr xmlns:w="{}">{}</w:hdr>"#, W_NS, paragraphs_xml);
        self.part(&format!("word/header{}.xml", index), &xml)
    }

    /// Add a footer part with the given paragraphs
    pub fn footer(self, index: usize, paragraphs_xml: &str) -> Self {
        let xml = format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:ftr xmlns:w="{}">{}</w:ftr>"#, W_NS, paragraphs_xml);
        self.part(&format!("word/footer{}.xml", index), &xml)
    }

    /// Add or replace a raw part
    pub fn part(mut self, path: &str, content: &str) -> Self {
        self.parts.retain(|(p, _)| p != path);
        self.parts.push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Serialize to archive bytes
    pub fn build(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, data) in &self.parts {
            writer.start_file(path.as_str(), SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

/// A single-run paragraph
pub fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, text)
}

/// A paragraph with a paragraph style
pub fn styled_paragraph(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        style, text
    )
}

/// A one-row table with one cell per text
pub fn table(cells: &[&str]) -> String {
    let cells: String = cells
        .iter()
        .map(|text| format!("<w:tc>{}</w:tc>", paragraph(text)))
        .collect();
    format!("<w:tbl><w:tr>{}</w:tr></w:tbl>", cells)
}

/// Read one part of an archive as a string
pub fn read_part(archive: &[u8], path: &str) -> Option<String> {
    let mut archive = ZipArchive::new(Cursor::new(archive)).ok()?;
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Part paths of an archive in order
pub fn part_names(archive: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(archive)).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Route library logs to the test harness; safe to call from every test
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes a document into `dir`
pub fn create_test_document(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, bytes)?;
    Ok(file_path)
}

/// A short agreement with headings, a table, a header and a footer
pub fn sample_agreement() -> DocxBuilder {
    let body = [
        styled_paragraph("Title", "SERVICES AGREEMENT"),
        paragraph("This Agreement is made between Acme Ltd and Widget GmbH."),
        styled_paragraph("Heading1", "1. Definitions"),
        paragraph("Services means the services described in Schedule 1."),
        styled_paragraph("Heading1", "2. Payment"),
        paragraph("The Customer shall pay all invoices within 30 days."),
        table(&["Fee", "One thousand euros"]),
    ]
    .concat();

    DocxBuilder::new()
        .body(&body)
        .header(1, &paragraph("Confidential"))
        .footer(1, &paragraph("Page"))
}
