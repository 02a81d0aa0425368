/*!
 * Core document model types for structure-preserving translation.
 *
 * Units are created by the parser and updated in place as translation
 * completes. A unit's `structural_index` addresses its paragraph within the
 * unmodified part, so rebuilding always works from the original part bytes.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::PipelineError;

/// Where a unit lives in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Body,
    Header,
    Footer,
    Footnote,
    TableCell,
}

impl Location {
    /// Locations whose layout breaks easily when runs are split
    pub fn is_fragile(&self) -> bool {
        !matches!(self, Self::Body)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Body => "body",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Footnote => "footnote",
            Self::TableCell => "table-cell",
        };
        write!(f, "{}", name)
    }
}

/// Translation status of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Pending,
    Translating,
    Completed,
    Error,
}

/// The addressable translation granule: one paragraph's concatenated text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextUnit {
    /// Sequential id in document order
    pub unit_id: usize,

    /// Original text of all runs, concatenated
    pub text: String,

    /// Part the paragraph belongs to
    pub part_path: String,

    /// Index of the paragraph among all paragraphs of the part
    pub structural_index: usize,

    /// Location, with table cells overriding the part default
    pub location: Location,

    /// Paragraph style reference, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_tag: Option<String>,

    /// Current status
    pub status: UnitStatus,

    /// Final text once translated (or fallen back)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,

    /// Error message for units that fell back to their original text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TextUnit {
    /// Create a pending unit
    pub fn new(
        unit_id: usize,
        text: String,
        part_path: &str,
        structural_index: usize,
        location: Location,
        style_tag: Option<String>,
    ) -> Self {
        Self {
            unit_id,
            text,
            part_path: part_path.to_string(),
            structural_index,
            location,
            style_tag,
            status: UnitStatus::Pending,
            translated_text: None,
            error: None,
        }
    }

    /// Number of characters in the original text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Record a successful translation
    pub fn complete(&mut self, translated: String) {
        self.translated_text = Some(translated);
        self.status = UnitStatus::Completed;
        self.error = None;
    }

    /// Record a failure; the unit keeps its original text as its translation
    pub fn fail(&mut self, message: &str) {
        self.translated_text = Some(self.text.clone());
        self.status = UnitStatus::Error;
        self.error = Some(message.to_string());
    }

    /// Text to inject during rebuild
    pub fn final_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.text)
    }
}

/// Section taxonomy for legal documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Preamble,
    Recitals,
    Definitions,
    SubjectMatter,
    Obligations,
    Payment,
    TermTermination,
    Confidentiality,
    Liability,
    Warranties,
    DisputeResolution,
    GeneralProvisions,
    Signatures,
    Schedules,
    Unknown,
}

impl SectionType {
    /// Human readable label used in prompt context
    pub fn label(&self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::Recitals => "recitals",
            Self::Definitions => "definitions",
            Self::SubjectMatter => "subject matter",
            Self::Obligations => "obligations",
            Self::Payment => "payment",
            Self::TermTermination => "term and termination",
            Self::Confidentiality => "confidentiality",
            Self::Liability => "liability",
            Self::Warranties => "warranties",
            Self::DisputeResolution => "dispute resolution",
            Self::GeneralProvisions => "general provisions",
            Self::Signatures => "signatures",
            Self::Schedules => "schedules",
            Self::Unknown => "unknown",
        }
    }
}

/// A run of units under one heading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub section_id: usize,
    pub title: String,
    pub section_type: SectionType,
    /// Unit ids in document order
    pub member_unit_ids: Vec<usize>,
    /// First member unit id
    pub start_index: usize,
    /// Last member unit id
    pub end_index: usize,
}

impl Section {
    /// Open a section starting at the given unit
    pub fn open(section_id: usize, title: &str, section_type: SectionType, unit_id: usize) -> Self {
        Self {
            section_id,
            title: title.to_string(),
            section_type,
            member_unit_ids: vec![unit_id],
            start_index: unit_id,
            end_index: unit_id,
        }
    }

    /// Append a unit to the section
    pub fn push(&mut self, unit_id: usize) {
        self.member_unit_ids.push(unit_id);
        self.end_index = unit_id;
    }

    /// Short context line for prompts
    pub fn context_line(&self) -> String {
        format!("Section \"{}\" ({})", self.title, self.section_type.label())
    }

    /// The section whose unit range covers `unit_id`
    pub fn containing(sections: &[Section], unit_id: usize) -> Option<&Section> {
        sections
            .iter()
            .find(|s| s.start_index <= unit_id && unit_id <= s.end_index)
    }
}

/// A scanned part that parsed successfully
#[derive(Debug, Clone)]
pub struct ParsedPart {
    /// Part path inside the container
    pub path: String,

    /// Default location of the part's units
    pub location: Location,

    /// Unmodified part bytes, the addressing base for rebuild
    pub original: Vec<u8>,
}

/// Output of the structure parser
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub parts: Vec<ParsedPart>,
    pub units: Vec<TextUnit>,
    pub sections: Vec<Section>,
    /// Non-fatal parse errors
    pub errors: Vec<PipelineError>,
}

impl ParsedDocument {
    /// Map from unit id to final text; units without a translation keep their original
    pub fn final_text_mapping(&self) -> HashMap<usize, String> {
        self.units
            .iter()
            .map(|unit| (unit.unit_id, unit.final_text().to_string()))
            .collect()
    }

    /// Section containing the given unit
    pub fn section_of(&self, unit_id: usize) -> Option<&Section> {
        Section::containing(&self.sections, unit_id)
    }

    /// Count of units per status
    pub fn count_status(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }
}
