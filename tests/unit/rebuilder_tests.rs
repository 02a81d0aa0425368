/*!
 * Tests for re-injection into whole containers
 */

use std::collections::HashMap;

use lexlate::document::layout::LayoutRepairConfig;
use lexlate::document::{Container, StructureParser, StructureRebuilder};

use crate::common::{paragraph, part_names, read_part, sample_agreement, DocxBuilder};

fn rebuild(bytes: &[u8], mapping: &HashMap<usize, String>, layout: LayoutRepairConfig) -> Vec<u8> {
    let mut container = Container::open(bytes).unwrap();
    let document = StructureParser::default().parse(&container);
    StructureRebuilder::new(layout)
        .rebuild(&mut container, &document, mapping)
        .unwrap();
    container.commit().unwrap()
}

/// Test that untouched parts survive a commit byte for byte
#[test]
fn test_rebuild_shouldKeepUntouchedPartsAndOrder() {
    let original = sample_agreement().build();
    let mapping = HashMap::from([(1, "Le présent contrat est conclu entre Acme Ltd et Widget GmbH.".to_string())]);

    let rebuilt = rebuild(&original, &mapping, LayoutRepairConfig::default());

    assert_eq!(part_names(&rebuilt), part_names(&original));
    for path in ["[Content_Types].xml", "_rels/.rels", "word/header1.xml", "word/footer1.xml"] {
        assert_eq!(read_part(&rebuilt, path), read_part(&original, path), "{} changed", path);
    }
    let body = read_part(&rebuilt, "word/document.xml").unwrap();
    assert!(body.contains("Le présent contrat"));
    assert!(!body.contains("This Agreement is made"));
}

/// Test that table cells receive their text in the first run
#[test]
fn test_rebuild_tableCell_shouldReplaceCellText() {
    let original = sample_agreement().build();
    let mapping = HashMap::from([(6, "Honoraires".to_string()), (7, "Mille euros".to_string())]);

    let rebuilt = rebuild(&original, &mapping, LayoutRepairConfig::default());

    let body = read_part(&rebuilt, "word/document.xml").unwrap();
    assert!(body.contains("Honoraires"));
    assert!(body.contains("Mille euros"));
    assert!(body.contains("<w:tc>"));
}

/// Test that layout repair strips page-forcing properties from the body
#[test]
fn test_rebuild_layoutRepair_shouldRemovePageBreaks() {
    let body = format!(
        r#"<w:p><w:pPr><w:pageBreakBefore/><w:keepNext/></w:pPr><w:r><w:t>Schedule 1</w:t></w:r></w:p><w:p><w:r><w:br w:type="page"/><w:t>Annex</w:t></w:r></w:p>{}"#,
        paragraph("Closing text")
    );
    let original = DocxBuilder::new().body(&body).build();

    let rebuilt = rebuild(&original, &HashMap::new(), LayoutRepairConfig::default());

    let xml = read_part(&rebuilt, "word/document.xml").unwrap();
    assert!(!xml.contains("pageBreakBefore"));
    assert!(!xml.contains("keepNext"));
    assert!(!xml.contains(r#"w:type="page""#));
    assert!(xml.contains("Schedule 1"));
    assert!(xml.contains("Annex"));
}

/// Test that disabled layout repair leaves an unchanged body as is
#[test]
fn test_rebuild_layoutDisabled_shouldKeepBodyBytes() {
    let body = r#"<w:p><w:pPr><w:pageBreakBefore/></w:pPr><w:r><w:t>Heading</w:t></w:r></w:p>"#;
    let original = DocxBuilder::new().body(body).build();
    let layout = LayoutRepairConfig { enabled: false, ..Default::default() };

    let rebuilt = rebuild(&original, &HashMap::new(), layout);

    assert_eq!(
        read_part(&rebuilt, "word/document.xml"),
        read_part(&original, "word/document.xml")
    );
}

/// Test that multi-run paragraphs keep run formatting after injection
#[test]
fn test_rebuild_multiRun_shouldKeepFormatting() {
    let body = r#"<w:p><w:r><w:t xml:space="preserve">The Customer </w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>shall not</w:t></w:r><w:r><w:t xml:space="preserve"> assign this Agreement.</w:t></w:r></w:p>"#;
    let original = DocxBuilder::new().body(body).build();
    let translated = "Le Client ne peut pas céder le présent Contrat.";
    let mapping = HashMap::from([(0, translated.to_string())]);

    let rebuilt = rebuild(&original, &mapping, LayoutRepairConfig::default());

    let container = Container::open(&rebuilt).unwrap();
    let document = StructureParser::default().parse(&container);
    assert_eq!(document.units.len(), 1);
    assert_eq!(document.units[0].text, translated);
    assert!(read_part(&rebuilt, "word/document.xml").unwrap().contains("<w:i/>"));
}
