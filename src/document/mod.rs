/*!
 * Structure-preserving document handling.
 *
 * - `archive`: ZIP container codec (opaque part table)
 * - `xml`: owned arena tree for XML parts
 * - `model`: units, sections and the parsed document
 * - `parser`: unit extraction from scanned parts
 * - `sections`: heading detection and section typing rules
 * - `redistribute`: proportional text split across runs
 * - `layout`: layout-artifact repair passes
 * - `rebuilder`: re-injection of translated text into the container
 */

pub mod archive;
pub mod layout;
pub mod model;
pub mod parser;
pub mod rebuilder;
pub mod redistribute;
pub mod sections;
pub mod xml;

// Re-export main types for easier usage
pub use archive::Container;
pub use model::{Location, ParsedDocument, ParsedPart, Section, SectionType, TextUnit, UnitStatus};
pub use parser::{PartCatalogue, PartRule, StructureParser};
pub use rebuilder::StructureRebuilder;

/// Path of the main body part
pub const MAIN_PART: &str = "word/document.xml";

/// Shared definition parts that can carry inherited page-break properties
pub const SHARED_DEFINITION_PARTS: &[&str] = &["word/styles.xml", "word/numbering.xml"];

/// WordprocessingML element and attribute names
pub mod names {
    pub const PARAGRAPH: &str = "w:p";
    pub const PARAGRAPH_PROPERTIES: &str = "w:pPr";
    pub const PARAGRAPH_STYLE: &str = "w:pStyle";
    pub const RUN: &str = "w:r";
    pub const TEXT: &str = "w:t";
    pub const TABLE_CELL: &str = "w:tc";
    pub const BREAK: &str = "w:br";
    pub const LAST_RENDERED_PAGE_BREAK: &str = "w:lastRenderedPageBreak";
    pub const PAGE_BREAK_BEFORE: &str = "w:pageBreakBefore";
    pub const KEEP_NEXT: &str = "w:keepNext";
    pub const KEEP_LINES: &str = "w:keepLines";
    pub const WIDOW_CONTROL: &str = "w:widowControl";
    pub const SPACING: &str = "w:spacing";
    pub const SECTION_PROPERTIES: &str = "w:sectPr";
    pub const SECTION_TYPE: &str = "w:type";
    pub const FRAME_PROPERTIES: &str = "w:framePr";
    pub const TABLE_POSITION: &str = "w:tblpPr";
    pub const NUMBERING_PROPERTIES: &str = "w:numPr";
    pub const DRAWING: &str = "w:drawing";
    pub const PICTURE: &str = "w:pict";
    pub const OBJECT: &str = "w:object";

    pub const VAL: &str = "w:val";
    pub const TYPE: &str = "w:type";
    pub const BEFORE: &str = "w:before";
    pub const AFTER: &str = "w:after";
    pub const V_ANCHOR: &str = "w:vAnchor";
    pub const H_ANCHOR: &str = "w:hAnchor";
    pub const VERT_ANCHOR: &str = "w:vertAnchor";
    pub const HORZ_ANCHOR: &str = "w:horzAnchor";
    pub const XML_SPACE: &str = "xml:space";
}
