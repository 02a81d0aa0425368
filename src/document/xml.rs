/*!
 * Owned arena tree for XML parts.
 *
 * Parts are read with quick-xml into a flat `Vec<Node>` addressed by `NodeId`.
 * Start tags, text and every non-element token keep their raw source form, so
 * serializing an unmodified tree reproduces the input. Mutations go through the
 * tree's methods; callers collect target ids into a `Vec` first and edit after.
 *
 * Names in the WordprocessingML namespace are looked up as `w:local` whatever
 * prefix the part binds that namespace to. The source spelling is kept for
 * output, and new names are written with the part's own prefix.
 */

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::{BytesStart, Event};

use crate::errors::XmlError;

/// Index of a node inside its tree
pub type NodeId = usize;

const UTF8_BOM: &str = "\u{feff}";

/// WordprocessingML main namespace
pub const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const WORDPROCESSING_PREFIX: &str = "w:";

/// Namespace declarations of one element as (prefix, uri); "" is the default namespace
type Bindings = Vec<(String, String)>;

/// A single attribute as it appears in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name, with the WordprocessingML prefix normalized to `w:`
    pub key: String,
    /// Attribute name as written in the source
    raw_key: String,
    /// Escaped attribute value
    pub raw_value: String,
}

/// Element payload
#[derive(Debug, Clone)]
pub struct Element {
    /// Element name, with the WordprocessingML prefix normalized to `w:`
    pub name: String,
    /// Element name as written in the source
    raw_name: String,
    /// Attributes in source order
    pub attributes: Vec<Attribute>,
    /// Tag content between the angle brackets, dropped once attributes change
    raw_open: Option<String>,
    /// Whether the source used the `<name/>` form
    self_closing: bool,
    /// Child nodes in document order
    pub children: Vec<NodeId>,
}

/// Node payload variants
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An element with children
    Element(Element),
    /// Character data, kept escaped
    Text(String),
    /// Declaration, comment, processing instruction, doctype or CDATA, verbatim
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
}

/// Parsed XML part
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    has_bom: bool,
    /// Prefix the part binds to WordprocessingML, if not `w`
    wordprocessing_prefix: Option<String>,
    /// Whether WordprocessingML is the default namespace somewhere in the part
    wordprocessing_default: bool,
}

impl XmlTree {
    /// Parse a part. `path` is only used for error messages.
    pub fn parse(path: &str, bytes: &[u8]) -> Result<Self, XmlError> {
        let malformed = |message: String| XmlError::Malformed {
            path: path.to_string(),
            message,
        };

        let source = std::str::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
        let (has_bom, source) = match source.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, source),
        };

        let mut tree = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            has_bom,
            wordprocessing_prefix: None,
            wordprocessing_default: false,
        };

        let mut reader = Reader::from_str(source);
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut stack: Vec<NodeId> = Vec::new();
        let mut scopes: Vec<Bindings> = Vec::new();
        let mut saw_element = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;

            let mut bindings = Bindings::new();
            let kind = match event {
                Event::Start(e) => {
                    let (element, declared) = element_from_start(path, &e, false, &scopes)?;
                    bindings = declared;
                    NodeKind::Element(element)
                }
                Event::Empty(e) => {
                    let (element, declared) = element_from_start(path, &e, true, &scopes)?;
                    bindings = declared;
                    NodeKind::Element(element)
                }
                Event::End(_) => {
                    if stack.pop().is_none() {
                        return Err(malformed("unexpected closing tag".to_string()));
                    }
                    scopes.pop();
                    continue;
                }
                Event::Text(e) => NodeKind::Text(bytes_to_string(path, &e)?),
                Event::CData(e) => NodeKind::Raw(format!("<![CDATA[{}]]>", bytes_to_string(path, &e)?)),
                Event::Comment(e) => NodeKind::Raw(format!("<!--{}-->", bytes_to_string(path, &e)?)),
                Event::Decl(e) => NodeKind::Raw(format!("<?{}?>", bytes_to_string(path, &e)?)),
                Event::PI(e) => NodeKind::Raw(format!("<?{}?>", bytes_to_string(path, &e)?)),
                Event::DocType(e) => NodeKind::Raw(format!("<!DOCTYPE{}>", bytes_to_string(path, &e)?)),
                Event::Eof => break,
            };

            let opens_scope = matches!(&kind, NodeKind::Element(el) if !el.self_closing);
            if matches!(kind, NodeKind::Element(_)) {
                saw_element = true;
            }

            tree.note_bindings(&bindings);

            let parent = stack.last().copied();
            let id = tree.push_node(kind, parent);
            match parent {
                Some(parent_id) => tree.element_mut(parent_id).children.push(id),
                None => tree.roots.push(id),
            }

            if opens_scope {
                stack.push(id);
                scopes.push(bindings);
            }
        }

        if !stack.is_empty() {
            return Err(malformed(format!("{} unclosed element(s)", stack.len())));
        }
        if !saw_element {
            return Err(malformed("no root element".to_string()));
        }

        Ok(tree)
    }

    fn note_bindings(&mut self, bindings: &Bindings) {
        for (prefix, uri) in bindings {
            if uri != WORDPROCESSING_NS {
                continue;
            }
            if prefix.is_empty() {
                self.wordprocessing_default = true;
            } else if prefix != "w" && self.wordprocessing_prefix.is_none() {
                self.wordprocessing_prefix = Some(prefix.clone());
            }
        }
    }

    /// Source spelling for a new element or attribute name
    fn source_name(&self, name: &str, is_attribute: bool) -> String {
        let Some(local) = name.strip_prefix(WORDPROCESSING_PREFIX) else {
            return name.to_string();
        };
        match &self.wordprocessing_prefix {
            _ if self.wordprocessing_default && !is_attribute => local.to_string(),
            Some(prefix) => format!("{}:{}", prefix, local),
            None => name.to_string(),
        }
    }

    fn push_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node { kind, parent });
        self.nodes.len() - 1
    }

    fn element_mut(&mut self, id: NodeId) -> &mut Element {
        match &mut self.nodes[id].kind {
            NodeKind::Element(element) => element,
            _ => unreachable!("node {} is not an element", id),
        }
    }

    /// Get the element payload of a node
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Qualified name of an element node
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// Whether the node is an element with the given qualified name
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of an element (empty for other nodes)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Element children with the given name
    pub fn child_elements(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is(child, name))
            .collect()
    }

    /// First element child with the given name
    pub fn first_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).iter().copied().find(|&child| self.is(child, name))
    }

    /// Whether an ancestor of the node has the given name
    pub fn has_ancestor(&self, id: NodeId, name: &str) -> bool {
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            if self.is(ancestor, name) {
                return true;
            }
            current = self.parent(ancestor);
        }
        false
    }

    /// The root element of the document
    pub fn root_element(&self) -> Option<NodeId> {
        self.roots.iter().copied().find(|&id| self.element(id).is_some())
    }

    /// All attached descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// All attached elements with the given name, in document order
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        let mut result = Vec::new();
        for &root in &self.roots {
            if self.is(root, name) {
                result.push(root);
            }
            result.extend(
                self.descendants(root)
                    .into_iter()
                    .filter(|&id| self.is(id, name)),
            );
        }
        result
    }

    /// Unescaped attribute value
    pub fn attr(&self, id: NodeId, key: &str) -> Option<String> {
        let element = self.element(id)?;
        let attribute = element.attributes.iter().find(|a| a.key == key)?;
        Some(
            unescape(&attribute.raw_value)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| attribute.raw_value.clone()),
        )
    }

    /// Set (or add) an attribute value
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) {
        let raw_value = escape_attribute(value);
        let raw_key = self.source_name(key, true);
        let element = self.element_mut(id);
        match element.attributes.iter_mut().find(|a| a.key == key) {
            Some(attribute) if attribute.raw_value == raw_value => return,
            Some(attribute) => attribute.raw_value = raw_value,
            None => element.attributes.push(Attribute {
                key: key.to_string(),
                raw_key,
                raw_value,
            }),
        }
        element.raw_open = None;
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> bool {
        let element = self.element_mut(id);
        let before = element.attributes.len();
        element.attributes.retain(|a| a.key != key);
        let removed = element.attributes.len() != before;
        if removed {
            element.raw_open = None;
        }
        removed
    }

    /// Unescaped text of a text node, or the concatenated text of an element
    pub fn text(&self, id: NodeId) -> String {
        match &self.nodes[id].kind {
            NodeKind::Text(raw) => unescape(raw)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| raw.clone()),
            NodeKind::Element(element) => element
                .children
                .iter()
                .map(|&child| self.text(child))
                .collect(),
            NodeKind::Raw(_) => String::new(),
        }
    }

    /// Replace the content of an element with a single text node
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let children = std::mem::take(&mut self.element_mut(id).children);
        for child in children {
            self.nodes[child].parent = None;
        }
        if !text.is_empty() {
            let text_id = self.push_node(NodeKind::Text(partial_escape(text).into_owned()), Some(id));
            self.element_mut(id).children.push(text_id);
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        let element = Element {
            name: name.to_string(),
            raw_name: self.source_name(name, false),
            attributes: attributes
                .iter()
                .map(|(key, value)| Attribute {
                    key: key.to_string(),
                    raw_key: self.source_name(key, true),
                    raw_value: escape_attribute(value),
                })
                .collect(),
            raw_open: None,
            self_closing: true,
            children: Vec::new(),
        };
        self.push_node(NodeKind::Element(element), None)
    }

    /// Detach a node from its parent; the node stays in the arena
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.element_mut(parent).children.retain(|&child| child != id);
        } else {
            self.roots.retain(|&root| root != id);
        }
    }

    /// Append a node as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, id: NodeId) {
        self.detach(id);
        self.nodes[id].parent = Some(parent);
        self.element_mut(parent).children.push(id);
    }

    /// Insert a node as a child of `parent` at `index`, detaching it first
    pub fn insert_child(&mut self, parent: NodeId, index: usize, id: NodeId) {
        self.detach(id);
        self.nodes[id].parent = Some(parent);
        let children = &mut self.element_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, id);
    }

    /// Serialize the tree back to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = String::new();
        if self.has_bom {
            out.push_str(UTF8_BOM);
        }
        for &root in &self.roots {
            self.write_node(root, &mut out);
        }
        out.into_bytes()
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(raw) | NodeKind::Raw(raw) => out.push_str(raw),
            NodeKind::Element(element) => {
                out.push('<');
                match &element.raw_open {
                    Some(raw) => out.push_str(raw),
                    None => write_open_tag(element, out),
                }

                if element.children.is_empty() && element.self_closing {
                    out.push_str("/>");
                    return;
                }

                out.push('>');
                for &child in &element.children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.raw_name);
                out.push('>');
            }
        }
    }
}

fn write_open_tag(element: &Element, out: &mut String) {
    out.push_str(&element.raw_name);
    for attribute in &element.attributes {
        out.push(' ');
        out.push_str(&attribute.raw_key);
        out.push_str("=\"");
        out.push_str(&attribute.raw_value.replace('"', "&quot;"));
        out.push('"');
    }
}

fn escape_attribute(value: &str) -> String {
    partial_escape(value).replace('"', "&quot;")
}

fn bytes_to_string(path: &str, bytes: &[u8]) -> Result<String, XmlError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| XmlError::Malformed {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn element_from_start(
    path: &str,
    start: &BytesStart<'_>,
    self_closing: bool,
    scopes: &[Bindings],
) -> Result<(Element, Bindings), XmlError> {
    let raw_name = bytes_to_string(path, start.name().as_ref())?;

    let mut raw_attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlError::Malformed {
            path: path.to_string(),
            message: format!("invalid attribute on <{}>: {}", raw_name, e),
        })?;
        raw_attributes.push((
            bytes_to_string(path, attribute.key.as_ref())?,
            bytes_to_string(path, &attribute.value)?,
        ));
    }

    let bindings: Bindings = raw_attributes
        .iter()
        .filter_map(|(key, value)| match key.split_once(':') {
            None if key == "xmlns" => Some((String::new(), value.clone())),
            Some(("xmlns", prefix)) => Some((prefix.to_string(), value.clone())),
            _ => None,
        })
        .collect();

    let attributes = raw_attributes
        .into_iter()
        .map(|(raw_key, raw_value)| Attribute {
            key: normalized_name(&raw_key, true, &bindings, scopes),
            raw_key,
            raw_value,
        })
        .collect();

    let element = Element {
        name: normalized_name(&raw_name, false, &bindings, scopes),
        raw_name,
        attributes,
        raw_open: Some(bytes_to_string(path, start)?),
        self_closing,
        children: Vec::new(),
    };
    Ok((element, bindings))
}

/// Spell names in the WordprocessingML namespace as `w:local`.
/// Unbound prefixes and names in other namespaces are kept as written.
fn normalized_name(raw: &str, is_attribute: bool, own: &Bindings, scopes: &[Bindings]) -> String {
    let (prefix, local) = raw.split_once(':').unwrap_or(("", raw));
    // Unprefixed attributes are in no namespace
    if prefix == "xmlns" || raw == "xmlns" || (prefix.is_empty() && is_attribute) {
        return raw.to_string();
    }
    let uri = std::iter::once(own)
        .chain(scopes.iter().rev())
        .find_map(|bindings| bindings.iter().find(|(p, _)| p == prefix))
        .map(|(_, uri)| uri.as_str());
    match uri {
        Some(WORDPROCESSING_NS) => format!("{}{}", WORDPROCESSING_PREFIX, local),
        _ => raw.to_string(),
    }
}
