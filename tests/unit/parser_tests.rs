/*!
 * Tests for document parsing and section detection
 */

use lexlate::document::{Container, Location, SectionType, StructureParser, UnitStatus};
use lexlate::errors::PipelineError;

use crate::common::{paragraph, sample_agreement, DocxBuilder, W_NS};

/// Test unit extraction across body, table, header and footer parts
#[test]
fn test_parse_sampleAgreement_shouldExtractUnitsInDocumentOrder() {
    let container = Container::open(&sample_agreement().build()).unwrap();

    let document = StructureParser::default().parse(&container);

    let texts: Vec<&str> = document.units.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "SERVICES AGREEMENT",
            "This Agreement is made between Acme Ltd and Widget GmbH.",
            "1. Definitions",
            "Services means the services described in Schedule 1.",
            "2. Payment",
            "The Customer shall pay all invoices within 30 days.",
            "Fee",
            "One thousand euros",
            "Confidential",
            "Page",
        ]
    );
    let ids: Vec<usize> = document.units.iter().map(|u| u.unit_id).collect();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
    assert!(document.units.iter().all(|u| u.status == UnitStatus::Pending));
}

/// Test that table cells override the part location
#[test]
fn test_parse_tableCell_shouldOverrideLocation() {
    let container = Container::open(&sample_agreement().build()).unwrap();

    let document = StructureParser::default().parse(&container);

    let locations: Vec<Location> = document.units.iter().map(|u| u.location).collect();
    assert_eq!(locations[5], Location::Body);
    assert_eq!(locations[6], Location::TableCell);
    assert_eq!(locations[7], Location::TableCell);
    assert_eq!(locations[8], Location::Header);
    assert_eq!(locations[9], Location::Footer);
    assert_eq!(document.units[2].style_tag.as_deref(), Some("Heading1"));
}

/// Test structural indices count empty paragraphs too
#[test]
fn test_parse_emptyParagraphs_shouldKeepStructuralIndex() {
    let body = [paragraph("First"), "<w:p/>".to_string(), paragraph("  "), paragraph("Second")].concat();
    let container = Container::open(&DocxBuilder::new().body(&body).build()).unwrap();

    let document = StructureParser::default().parse(&container);

    assert_eq!(document.units.len(), 2);
    assert_eq!(document.units[0].structural_index, 0);
    assert_eq!(document.units[1].structural_index, 3);
}

/// Test section detection over a parsed document
#[test]
fn test_parse_shouldDetectSections() {
    let container = Container::open(&sample_agreement().build()).unwrap();

    let document = StructureParser::default().parse(&container);

    let types: Vec<SectionType> = document.sections.iter().map(|s| s.section_type).collect();
    assert_eq!(types, vec![SectionType::Preamble, SectionType::Definitions, SectionType::Payment]);
    assert_eq!(document.sections[1].member_unit_ids, vec![2, 3]);
    assert_eq!(document.section_of(5).map(|s| s.title.as_str()), Some("2. Payment"));
}

/// Test that a malformed part is skipped and recorded
#[test]
fn test_parse_malformedPart_shouldBeSkippedAndRecorded() {
    let bytes = DocxBuilder::new()
        .body(&paragraph("Body text"))
        .part("word/footer1.xml", "<w:ftr><w:p><w:r><w:t>Broken</w:r></w:ftr>")
        .build();
    let container = Container::open(&bytes).unwrap();

    let document = StructureParser::default().parse(&container);

    assert_eq!(document.units.len(), 1);
    assert_eq!(document.parts.len(), 1);
    assert!(matches!(
        &document.errors[..],
        [PipelineError::MalformedPart { path, .. }] if path == "word/footer1.xml"
    ));
}

/// Test a main part that binds WordprocessingML to a prefix other than `w`
#[test]
fn test_parse_otherNamespacePrefix_shouldStillExtractUnits() {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><ns0:document xmlns:ns0="{}"><ns0:body><ns0:p><ns0:pPr><ns0:pStyle ns0:val="Heading1"/></ns0:pPr><ns0:r><ns0:t>1. Scope</ns0:t></ns0:r></ns0:p><ns0:tbl><ns0:tr><ns0:tc><ns0:p><ns0:r><ns0:t>Cell</ns0:t></ns0:r></ns0:p></ns0:tc></ns0:tr></ns0:tbl></ns0:body></ns0:document>"#,
        W_NS
    );
    let bytes = DocxBuilder::new().part("word/document.xml", &xml).build();
    let container = Container::open(&bytes).unwrap();

    let document = StructureParser::default().parse(&container);

    let texts: Vec<&str> = document.units.iter().map(|u| u.text.as_str()).collect();
    assert_eq!(texts, vec!["1. Scope", "Cell"]);
    assert_eq!(document.units[0].style_tag.as_deref(), Some("Heading1"));
    assert_eq!(document.units[1].location, Location::TableCell);
    assert!(document.errors.is_empty());
}
