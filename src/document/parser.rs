/*!
 * Structure parser: extracts ordered text units from the scanned parts of a
 * container, with enough positional context to put translations back.
 */

use log::{debug, warn};
use regex::Regex;

use super::archive::Container;
use super::model::{Location, ParsedDocument, ParsedPart, TextUnit};
use super::sections::detect_sections;
use super::xml::{NodeId, XmlTree};
use super::names;
use crate::errors::PipelineError;

/// One entry of the part catalogue
#[derive(Debug, Clone)]
pub struct PartRule {
    pattern: Regex,
    location: Location,
}

impl PartRule {
    /// Create a rule from a path regex; the pattern is anchored on both ends
    pub fn new(pattern: &str, location: Location) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{})$", pattern))?,
            location,
        })
    }

    /// Whether the rule covers the given part path
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

/// Declarative list of the parts to scan
#[derive(Debug, Clone)]
pub struct PartCatalogue {
    rules: Vec<PartRule>,
}

impl PartCatalogue {
    /// Build a catalogue from explicit rules
    pub fn new(rules: Vec<PartRule>) -> Self {
        Self { rules }
    }

    /// Location of a part, if it is scanned at all
    pub fn location_of(&self, path: &str) -> Option<Location> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.location)
    }
}

impl Default for PartCatalogue {
    fn default() -> Self {
        let rules = [
            (r"word/document\.xml", Location::Body),
            (r"word/header\d*\.xml", Location::Header),
            (r"word/footer\d*\.xml", Location::Footer),
            (r"word/footnotes\.xml", Location::Footnote),
            (r"word/endnotes\.xml", Location::Footnote),
        ]
        .into_iter()
        .filter_map(|(pattern, location)| PartRule::new(pattern, location).ok())
        .collect();

        Self { rules }
    }
}

/// Text runs of a paragraph: `w:t` descendants that do not belong to a nested paragraph
pub fn paragraph_runs(tree: &XmlTree, paragraph: NodeId) -> Vec<NodeId> {
    let mut runs = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(paragraph).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if tree.is(id, names::PARAGRAPH) {
            continue;
        }
        if tree.is(id, names::TEXT) {
            runs.push(id);
            continue;
        }
        stack.extend(tree.children(id).iter().rev().copied());
    }
    runs
}

/// Concatenated text of a paragraph's runs
pub fn paragraph_text(tree: &XmlTree, paragraph: NodeId) -> String {
    paragraph_runs(tree, paragraph)
        .into_iter()
        .map(|run| tree.text(run))
        .collect()
}

/// Style reference from the paragraph properties block
pub fn paragraph_style(tree: &XmlTree, paragraph: NodeId) -> Option<String> {
    let properties = tree.first_child(paragraph, names::PARAGRAPH_PROPERTIES)?;
    let style = tree.first_child(properties, names::PARAGRAPH_STYLE)?;
    tree.attr(style, names::VAL)
}

/// Walks the scanned parts of a container and produces the parsed document
#[derive(Debug, Clone, Default)]
pub struct StructureParser {
    catalogue: PartCatalogue,
}

impl StructureParser {
    /// Create a parser over a custom part catalogue
    pub fn new(catalogue: PartCatalogue) -> Self {
        Self { catalogue }
    }

    /// Parse every scanned part. Malformed parts are recorded and skipped.
    pub fn parse(&self, container: &Container) -> ParsedDocument {
        let mut document = ParsedDocument::default();

        let scanned: Vec<(String, Location)> = container
            .paths()
            .filter_map(|path| {
                self.catalogue
                    .location_of(path)
                    .map(|location| (path.to_string(), location))
            })
            .collect();

        for (path, location) in scanned {
            let Some(bytes) = container.part(&path) else {
                continue;
            };

            let tree = match XmlTree::parse(&path, bytes) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!("Skipping malformed part {}: {}", path, e);
                    document.errors.push(PipelineError::from(e));
                    continue;
                }
            };

            let before = document.units.len();
            self.extract_units(&tree, &path, location, &mut document.units);
            debug!(
                "Extracted {} unit(s) from {} ({})",
                document.units.len() - before,
                path,
                location
            );

            document.parts.push(ParsedPart {
                path,
                location,
                original: bytes.to_vec(),
            });
        }

        document.sections = detect_sections(&document.units);
        document
    }

    fn extract_units(&self, tree: &XmlTree, path: &str, location: Location, units: &mut Vec<TextUnit>) {
        for (structural_index, paragraph) in tree.elements_named(names::PARAGRAPH).into_iter().enumerate() {
            let text = paragraph_text(tree, paragraph);
            if text.trim().is_empty() {
                continue;
            }

            let location = if tree.has_ancestor(paragraph, names::TABLE_CELL) {
                Location::TableCell
            } else {
                location
            };

            units.push(TextUnit::new(
                units.len(),
                text,
                path,
                structural_index,
                location,
                paragraph_style(tree, paragraph),
            ));
        }
    }
}
