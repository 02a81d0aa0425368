/*!
 * Structure rebuilder: writes translated text back into the paragraphs it
 * came from and repairs layout artifacts in the body.
 *
 * Every part is re-parsed from its original bytes, so structural indices
 * recorded by the parser stay valid. Parts with no effective change are
 * never re-serialized.
 */

use std::collections::HashMap;

use log::{debug, warn};

use super::archive::Container;
use super::layout::{repair_body, repair_shared_definitions, LayoutRepairConfig};
use super::model::{Location, ParsedDocument, TextUnit};
use super::names;
use super::parser::paragraph_runs;
use super::redistribute::distribute;
use super::xml::{NodeId, XmlTree};
use super::{MAIN_PART, SHARED_DEFINITION_PARTS};
use crate::errors::PipelineError;

/// Re-injects text into a container
#[derive(Debug, Clone, Default)]
pub struct StructureRebuilder {
    layout: LayoutRepairConfig,
}

impl StructureRebuilder {
    /// Create a rebuilder with the given layout repair settings
    pub fn new(layout: LayoutRepairConfig) -> Self {
        Self { layout }
    }

    /// Inject `mapping` (unit id to final text) into the container.
    ///
    /// Returns the number of paragraphs whose text was replaced. Units whose
    /// final text equals the original are left alone.
    pub fn rebuild(
        &self,
        container: &mut Container,
        document: &ParsedDocument,
        mapping: &HashMap<usize, String>,
    ) -> Result<usize, PipelineError> {
        let mut injected_total = 0;

        for part in &document.parts {
            let pending: Vec<(&TextUnit, &str)> = document
                .units
                .iter()
                .filter(|unit| unit.part_path == part.path)
                .filter_map(|unit| {
                    mapping
                        .get(&unit.unit_id)
                        .filter(|text| **text != unit.text)
                        .map(|text| (unit, text.as_str()))
                })
                .collect();

            let is_main = part.path == MAIN_PART;
            if pending.is_empty() && !(is_main && self.layout.enabled) {
                continue;
            }

            let mut tree = XmlTree::parse(&part.path, &part.original)
                .map_err(|e| PipelineError::RebuildFailed(e.to_string()))?;
            let paragraphs = tree.elements_named(names::PARAGRAPH);

            let mut injected = 0;
            for (unit, text) in pending {
                let Some(&paragraph) = paragraphs.get(unit.structural_index) else {
                    warn!(
                        "Paragraph {} not found in {} for unit {}",
                        unit.structural_index, part.path, unit.unit_id
                    );
                    continue;
                };
                if self.inject(&mut tree, paragraph, text, unit.location) {
                    injected += 1;
                }
            }

            let mut repaired = 0;
            if is_main {
                repaired = repair_body(&mut tree, &self.layout).total();
            }

            if injected > 0 || repaired > 0 {
                debug!(
                    "Rewriting {}: {} paragraph(s) injected, {} layout edit(s)",
                    part.path, injected, repaired
                );
                container.set_part(&part.path, tree.serialize());
            }
            injected_total += injected;
        }

        if self.layout.enabled {
            self.repair_shared_parts(container);
        }

        Ok(injected_total)
    }

    fn repair_shared_parts(&self, container: &mut Container) {
        for &path in SHARED_DEFINITION_PARTS {
            let Some(bytes) = container.part(path) else {
                continue;
            };
            let mut tree = match XmlTree::parse(path, bytes) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!("Leaving {} untouched: {}", path, e);
                    continue;
                }
            };
            let removed = repair_shared_definitions(&mut tree);
            if removed > 0 {
                debug!("Removed {} inherited page control(s) from {}", removed, path);
                container.set_part(path, tree.serialize());
            }
        }
    }

    /// Write `text` into the runs of one paragraph
    fn inject(&self, tree: &mut XmlTree, paragraph: NodeId, text: &str, location: Location) -> bool {
        let runs = paragraph_runs(tree, paragraph);
        if runs.is_empty() {
            return false;
        }

        // Fragile locations and single runs take the whole text in the first run
        let pieces = if runs.len() == 1 || location.is_fragile() {
            let mut pieces = vec![String::new(); runs.len()];
            pieces[0] = text.to_string();
            pieces
        } else {
            let lengths: Vec<usize> = runs.iter().map(|&run| tree.text(run).chars().count()).collect();
            distribute(text, &lengths, self.layout.space_search_window)
        };

        for (&run, piece) in runs.iter().zip(pieces.iter()) {
            tree.set_text(run, piece);
            if piece.starts_with(char::is_whitespace) || piece.ends_with(char::is_whitespace) {
                tree.set_attr(run, names::XML_SPACE, "preserve");
            }
        }
        true
    }
}
