/*!
 * Layout-artifact repair.
 *
 * Translated text rarely has the length of the original, and the explicit
 * page-control properties that were tuned for the original text then produce
 * spurious blank pages. These passes strip or soften those properties. Every
 * pass collects its targets into an owned list before mutating the tree.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::names;
use super::parser::{paragraph_runs, paragraph_style, paragraph_text};
use super::sections::{is_all_caps_heading, is_heading_style, matches_heading_pattern};
use super::xml::{NodeId, XmlTree};

/// Tunable thresholds for the repair passes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutRepairConfig {
    /// Whether the repair passes run at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Merge paragraphs that look like fragments of one sentence
    #[serde(default)]
    pub merge_fragmented_paragraphs: bool,

    /// Ceiling for paragraph spacing before/after, in twentieths of a point
    #[serde(default = "default_spacing_cap_twips")]
    pub spacing_cap_twips: u32,

    /// Characters searched either side of a run split point for a space
    #[serde(default = "default_space_search_window")]
    pub space_search_window: usize,
}

impl Default for LayoutRepairConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            merge_fragmented_paragraphs: false,
            spacing_cap_twips: default_spacing_cap_twips(),
            space_search_window: default_space_search_window(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_spacing_cap_twips() -> u32 {
    240
}

fn default_space_search_window() -> usize {
    super::redistribute::DEFAULT_SPACE_SEARCH_WINDOW
}

/// Counts of the edits made by a repair run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub page_breaks_before_removed: usize,
    pub rendered_breaks_removed: usize,
    pub hard_breaks_removed: usize,
    pub section_breaks_downgraded: usize,
    pub frames_reanchored: usize,
    pub widow_controls_disabled: usize,
    pub keep_directives_removed: usize,
    pub spacings_capped: usize,
    pub empty_paragraphs_removed: usize,
    pub paragraphs_merged: usize,
}

impl RepairReport {
    /// Total number of edits
    pub fn total(&self) -> usize {
        self.page_breaks_before_removed
            + self.rendered_breaks_removed
            + self.hard_breaks_removed
            + self.section_breaks_downgraded
            + self.frames_reanchored
            + self.widow_controls_disabled
            + self.keep_directives_removed
            + self.spacings_capped
            + self.empty_paragraphs_removed
            + self.paragraphs_merged
    }
}

const PAGE_FORCING_SECTION_TYPES: &[&str] = &["nextPage", "oddPage", "evenPage"];
const PAGE_RELATIVE_ANCHORS: &[&str] = &["page", "margin"];
const DISABLED_VALUES: &[&str] = &["0", "false", "off"];

/// sectPr children that precede `w:type` in schema order
const SECTION_LEADING_CHILDREN: &[&str] = &[
    "w:headerReference",
    "w:footerReference",
    "w:footnotePr",
    "w:endnotePr",
];

/// Content that makes a text-less paragraph meaningful
const CONTENT_MARKERS: &[&str] = &[
    names::DRAWING,
    names::PICTURE,
    names::OBJECT,
    names::SECTION_PROPERTIES,
    "w:fldChar",
    "w:fldSimple",
    "w:sym",
    "w:bookmarkStart",
    "w:bookmarkEnd",
    "w:commentRangeStart",
    "w:commentRangeEnd",
    "m:oMath",
    "m:oMathPara",
];

const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ':', ';', '。', '！', '？', '…'];
const TRAILING_CLOSERS: &[char] = &['"', '\'', ')', ']', '»', '”', '’'];
const BULLETS: &[char] = &['•', '·', '▪', '‣', '◦', '-', '–', '—', '*', '\u{f0b7}'];

/// Run all repair passes on the main body part
pub fn repair_body(tree: &mut XmlTree, config: &LayoutRepairConfig) -> RepairReport {
    let mut report = RepairReport::default();
    if !config.enabled {
        return report;
    }

    report.page_breaks_before_removed = remove_elements(tree, &[names::PAGE_BREAK_BEFORE]);
    report.rendered_breaks_removed = remove_elements(tree, &[names::LAST_RENDERED_PAGE_BREAK]);
    report.hard_breaks_removed = remove_hard_breaks(tree);
    report.section_breaks_downgraded = downgrade_section_breaks(tree);
    report.frames_reanchored = reanchor_frames(tree);
    report.widow_controls_disabled = disable_widow_control(tree);
    report.keep_directives_removed = remove_elements(tree, &[names::KEEP_NEXT, names::KEEP_LINES]);
    report.spacings_capped = cap_spacing(tree, config.spacing_cap_twips);
    report.empty_paragraphs_removed = collapse_empty_paragraphs(tree);
    if config.merge_fragmented_paragraphs {
        report.paragraphs_merged = merge_fragmented_paragraphs(tree);
    }

    debug!("Layout repair on body: {:?}", report);
    report
}

/// Strip inherited page-break properties from style and numbering definitions
pub fn repair_shared_definitions(tree: &mut XmlTree) -> usize {
    remove_elements(
        tree,
        &[names::PAGE_BREAK_BEFORE, names::KEEP_NEXT, names::KEEP_LINES],
    )
}

/// Detach every element with one of the given names
pub fn remove_elements(tree: &mut XmlTree, element_names: &[&str]) -> usize {
    let targets: Vec<NodeId> = element_names
        .iter()
        .flat_map(|name| tree.elements_named(name))
        .collect();
    for &id in &targets {
        tree.detach(id);
    }
    targets.len()
}

fn remove_hard_breaks(tree: &mut XmlTree) -> usize {
    let targets: Vec<NodeId> = tree
        .elements_named(names::BREAK)
        .into_iter()
        .filter(|&id| {
            matches!(tree.attr(id, names::TYPE).as_deref(), Some("page") | Some("column"))
        })
        .collect();
    for &id in &targets {
        tree.detach(id);
    }
    targets.len()
}

fn downgrade_section_breaks(tree: &mut XmlTree) -> usize {
    let sections = tree.elements_named(names::SECTION_PROPERTIES);
    let multi_section = sections.len() > 1;
    let mut changed = 0;
    for section in sections {
        match tree.first_child(section, names::SECTION_TYPE) {
            Some(section_type) => {
                let value = tree.attr(section_type, names::VAL).unwrap_or_default();
                if PAGE_FORCING_SECTION_TYPES.contains(&value.as_str()) {
                    tree.set_attr(section_type, names::VAL, "continuous");
                    changed += 1;
                }
            }
            // Without a type a section starts on a new page. The final body-level
            // sectPr only starts one when an earlier section precedes it.
            None if multi_section || tree.has_ancestor(section, names::PARAGRAPH_PROPERTIES) => {
                let position = tree
                    .children(section)
                    .iter()
                    .position(|&child| {
                        tree.element(child).is_some()
                            && !SECTION_LEADING_CHILDREN.contains(&tree.name(child).unwrap_or_default())
                    })
                    .unwrap_or(tree.children(section).len());
                let section_type =
                    tree.create_element(names::SECTION_TYPE, &[(names::VAL, "continuous")]);
                tree.insert_child(section, position, section_type);
                changed += 1;
            }
            None => {}
        }
    }
    changed
}

fn reanchor_frames(tree: &mut XmlTree) -> usize {
    let mut changed = 0;
    let anchors = [
        (names::FRAME_PROPERTIES, names::V_ANCHOR),
        (names::FRAME_PROPERTIES, names::H_ANCHOR),
        (names::TABLE_POSITION, names::VERT_ANCHOR),
        (names::TABLE_POSITION, names::HORZ_ANCHOR),
    ];

    for (element, attribute) in anchors {
        for id in tree.elements_named(element) {
            let anchored_to_page = tree
                .attr(id, attribute)
                .is_some_and(|value| PAGE_RELATIVE_ANCHORS.contains(&value.as_str()));
            if anchored_to_page {
                tree.set_attr(id, attribute, "text");
                changed += 1;
            }
        }
    }
    changed
}

fn disable_widow_control(tree: &mut XmlTree) -> usize {
    let targets: Vec<NodeId> = tree
        .elements_named(names::WIDOW_CONTROL)
        .into_iter()
        .filter(|&id| {
            !tree
                .attr(id, names::VAL)
                .is_some_and(|value| DISABLED_VALUES.contains(&value.as_str()))
        })
        .collect();
    for &id in &targets {
        tree.set_attr(id, names::VAL, "0");
    }
    targets.len()
}

fn cap_spacing(tree: &mut XmlTree, cap: u32) -> usize {
    let mut changed = 0;
    let cap_value = cap.to_string();
    for id in tree.elements_named(names::SPACING) {
        for attribute in [names::BEFORE, names::AFTER] {
            let exceeds = tree
                .attr(id, attribute)
                .and_then(|value| value.trim().parse::<i64>().ok())
                .is_some_and(|value| value > i64::from(cap));
            if exceeds {
                tree.set_attr(id, attribute, &cap_value);
                changed += 1;
            }
        }
    }
    changed
}

fn is_empty_paragraph(tree: &XmlTree, paragraph: NodeId) -> bool {
    paragraph_text(tree, paragraph).trim().is_empty()
        && !tree
            .descendants(paragraph)
            .into_iter()
            .any(|id| CONTENT_MARKERS.contains(&tree.name(id).unwrap_or_default()))
}

/// Distinct parents of all paragraphs, in document order
fn paragraph_containers(tree: &XmlTree) -> Vec<NodeId> {
    let mut containers: Vec<NodeId> = Vec::new();
    for paragraph in tree.elements_named(names::PARAGRAPH) {
        if let Some(parent) = tree.parent(paragraph) {
            if !containers.contains(&parent) {
                containers.push(parent);
            }
        }
    }
    containers
}

fn collapse_empty_paragraphs(tree: &mut XmlTree) -> usize {
    let mut targets = Vec::new();

    for container in paragraph_containers(tree) {
        let mut previous_was_empty = false;
        for &child in tree.children(container) {
            if tree.element(child).is_none() {
                continue;
            }
            let empty = tree.is(child, names::PARAGRAPH) && is_empty_paragraph(tree, child);
            if empty && previous_was_empty {
                targets.push(child);
            }
            previous_was_empty = empty;
        }
    }

    for &id in &targets {
        tree.detach(id);
    }
    targets.len()
}

fn ends_with_terminal_punctuation(text: &str) -> bool {
    text.trim()
        .trim_end_matches(TRAILING_CLOSERS)
        .ends_with(TERMINAL_PUNCTUATION)
}

fn starts_new_clause(text: &str) -> bool {
    let text = text.trim();
    text.starts_with(BULLETS) || matches_heading_pattern(text) || is_all_caps_heading(text)
}

fn is_mergeable(tree: &XmlTree, paragraph: NodeId) -> bool {
    let text = paragraph_text(tree, paragraph);
    if text.trim().is_empty() || matches_heading_pattern(&text) || is_all_caps_heading(&text) {
        return false;
    }
    if paragraph_style(tree, paragraph).is_some_and(|style| is_heading_style(&style)) {
        return false;
    }
    !tree.descendants(paragraph).into_iter().any(|id| {
        tree.is(id, names::NUMBERING_PROPERTIES) || CONTENT_MARKERS.contains(&tree.name(id).unwrap_or_default())
    })
}

fn can_merge(tree: &XmlTree, current: NodeId, next: NodeId) -> bool {
    is_mergeable(tree, current)
        && is_mergeable(tree, next)
        && paragraph_style(tree, current) == paragraph_style(tree, next)
        && !ends_with_terminal_punctuation(&paragraph_text(tree, current))
        && !starts_new_clause(&paragraph_text(tree, next))
}

fn merge_into(tree: &mut XmlTree, current: NodeId, next: NodeId) {
    if let Some(&last_run) = paragraph_runs(tree, current).last() {
        let text = tree.text(last_run);
        if !text.ends_with(char::is_whitespace) {
            tree.set_text(last_run, &format!("{} ", text));
            tree.set_attr(last_run, names::XML_SPACE, "preserve");
        }
    }

    let moved: Vec<NodeId> = tree
        .children(next)
        .iter()
        .copied()
        .filter(|&child| !tree.is(child, names::PARAGRAPH_PROPERTIES))
        .collect();
    for child in moved {
        tree.append_child(current, child);
    }
    tree.detach(next);
}

fn merge_fragmented_paragraphs(tree: &mut XmlTree) -> usize {
    let mut merged = 0;

    for container in paragraph_containers(tree) {
        let siblings = tree.children(container).to_vec();
        let mut current: Option<NodeId> = None;

        for child in siblings {
            if tree.element(child).is_none() {
                continue;
            }
            if !tree.is(child, names::PARAGRAPH) {
                current = None;
                continue;
            }
            match current {
                Some(previous) if can_merge(tree, previous, child) => {
                    merge_into(tree, previous, child);
                    merged += 1;
                }
                _ => current = Some(child),
            }
        }
    }

    merged
}
