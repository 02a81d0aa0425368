/*!
 * Section detection for legal documents.
 *
 * Heading detection and section typing are plain ordered rule tables so each
 * rule can be tested on its own, independent of parsing.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{Section, SectionType, TextUnit};

/// Title of the synthetic section opened before the first heading
pub const PREAMBLE_TITLE: &str = "Preamble";

/// Numbered, lettered and roman-numeral heading patterns
static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Article 4, SECTION 2.1, Clause 7(a), Schedule II
        r"(?i)^(article|section|clause|chapter|part|schedule|annex|appendix|exhibit)\s+([0-9]+|[ivxlcdm]+|[a-z])\b",
        // 1.  /  1.2  /  1.2.3 Definitions
        r"^\d+(\.\d+)*\.(\s|$)",
        r"^\d+(\.\d+)+(\s|$)",
        // (a)  (ii)  (1)
        r"(?i)^\((\d+|[a-z]{1,2}|[ivxlcdm]+)\)(\s|$)",
        // a)  iv)
        r"(?i)^([a-z]|[ivxlcdm]+)\)\s",
        // IV.  B.
        r"^([IVXLCDM]+|[A-Z])\.(\s|$)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Ordered keyword rules; the first matching rule wins
static SECTION_RULES: &[(SectionType, &[&str])] = &[
    (SectionType::Recitals, &["whereas", "recital", "background"]),
    (SectionType::Definitions, &["definition", "interpretation", "defined terms"]),
    (SectionType::Confidentiality, &["confidential", "non-disclosure", "nondisclosure"]),
    (SectionType::Payment, &["payment", "fees", "price", "compensation", "invoic", "remuneration"]),
    (SectionType::TermTermination, &["terminat", "duration", "term and", "term of", "expiry", "expiration"]),
    (SectionType::Liability, &["liabilit", "indemn", "limitation of"]),
    (SectionType::Warranties, &["warrant", "representation"]),
    (SectionType::DisputeResolution, &["dispute", "arbitration", "governing law", "jurisdiction", "mediation"]),
    (SectionType::Obligations, &["obligation", "undertaking", "covenant", "duties", "responsibilit"]),
    (SectionType::SubjectMatter, &["subject matter", "scope", "purpose", "object of"]),
    (SectionType::Signatures, &["signature", "in witness whereof", "signed by", "executed by"]),
    (SectionType::Schedules, &["schedule", "annex", "appendix", "exhibit"]),
    (
        SectionType::GeneralProvisions,
        &["general", "miscellaneous", "notices", "entire agreement", "assignment", "force majeure", "severab", "amendment"],
    ),
    (SectionType::Preamble, &["preamble", "agreement", "contract", "parties"]),
];

/// Whether a paragraph style names a heading
pub fn is_heading_style(style: &str) -> bool {
    let style = style.to_lowercase();
    style.starts_with("heading") || style == "title" || style == "subtitle"
}

/// Whether the trimmed text matches a numbered/lettered heading pattern
pub fn matches_heading_pattern(text: &str) -> bool {
    let text = text.trim();
    HEADING_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}

/// Whether the trimmed text is an all-caps heading
pub fn is_all_caps_heading(text: &str) -> bool {
    let text = text.trim();
    text.chars().count() > 3
        && text.chars().any(char::is_alphabetic)
        && !text.chars().any(char::is_lowercase)
}

/// Whether a unit starts a new section
pub fn is_heading(unit: &TextUnit) -> bool {
    unit.style_tag.as_deref().is_some_and(is_heading_style)
        || matches_heading_pattern(&unit.text)
        || is_all_caps_heading(&unit.text)
}

/// Classify heading text into the section taxonomy
pub fn classify_section_type(heading: &str) -> SectionType {
    let heading = heading.to_lowercase();
    SECTION_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| heading.contains(k)))
        .map(|(section_type, _)| *section_type)
        .unwrap_or(SectionType::Unknown)
}

/// Split the unit sequence into sections in a single pass
pub fn detect_sections(units: &[TextUnit]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();

    for unit in units {
        if is_heading(unit) {
            let title = unit.text.trim();
            sections.push(Section::open(
                sections.len(),
                title,
                classify_section_type(title),
                unit.unit_id,
            ));
            continue;
        }

        match sections.last_mut() {
            Some(section) => section.push(unit.unit_id),
            None => sections.push(Section::open(
                0,
                PREAMBLE_TITLE,
                SectionType::Preamble,
                unit.unit_id,
            )),
        }
    }

    sections
}
