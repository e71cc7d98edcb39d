//! Minimal arena-backed HTML document
//!
//! Enough structure for color remediation: elements with attributes and an
//! editable inline style, text nodes, parent links and serialization.

use std::fmt::Write as _;

/// Index of a node in its [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Synthetic container holding the top-level nodes of a fragment
    Fragment,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl Node {
    pub fn data(&self) -> &NodeData {
        &self.data
    }
}

/// An element; its `style` attribute lives in [`InlineStyle`]
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    style: InlineStyle,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            style: InlineStyle::default(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("style") {
            return None;
        }
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name.eq_ignore_ascii_case("style") {
            self.style = InlineStyle::parse(&value);
            return;
        }
        match self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(index).1)
    }

    pub fn style(&self) -> &InlineStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut InlineStyle {
        &mut self.style
    }
}

/// Ordered inline style declarations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute; malformed declarations are dropped
    pub fn parse(css: &str) -> Self {
        let mut style = Self::default();
        for declaration in css.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                continue;
            }
            style.set(property, value);
        }
        style
    }

    /// Declared value with any `!important` flag stripped
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(property))
            .map(|(_, v)| {
                let v = v.as_str();
                match v.to_ascii_lowercase().find("!important") {
                    Some(index) => v[..index].trim_end(),
                    None => v,
                }
            })
    }

    /// Set a declaration, replacing any earlier one for the same property
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let property = property.to_ascii_lowercase();
        let value = value.into();
        match self.declarations.iter_mut().find(|(p, _)| *p == property) {
            Some((_, v)) => *v = value,
            None => self.declarations.push((property, value)),
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self
            .declarations
            .iter()
            .position(|(p, _)| p.eq_ignore_ascii_case(property))?;
        Some(self.declarations.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn to_css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Elements that never have children or a closing tag
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text content is not rendered
const NON_RENDERED_ELEMENTS: &[&str] = &["script", "style", "head", "title", "template"];

/// An HTML document fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with only the fragment root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Fragment,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(tag)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` to `parent`, detaching it from any previous parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|c| *c != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Move every child of `from` under `to`, preserving order
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in children {
            self.nodes[child.0].parent = Some(to);
            self.nodes[to.0].children.push(child);
        }
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// `id` and its ancestors, nearest first
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.ancestors(id))
    }

    /// Nearest element (including `id` itself) with the given tag
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.self_and_ancestors(id).find(|n| {
            self.element(*n)
                .map_or(false, |e| e.tag.eq_ignore_ascii_case(tag))
        })
    }

    /// Nodes under `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Rendered text nodes under `id` in document order
    ///
    /// Text inside `script`, `style` and similar elements is excluded.
    pub fn text_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.self_and_ancestors(id).any(|n| self.is_non_rendered(n)) {
            return out;
        }
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            match &self.nodes[next.0].data {
                NodeData::Text(_) => out.push(next),
                NodeData::Element(e) if NON_RENDERED_ELEMENTS.contains(&e.tag.as_str()) => {}
                _ => stack.extend(self.children(next).iter().rev().copied()),
            }
        }
        out
    }

    fn is_non_rendered(&self, id: NodeId) -> bool {
        self.element(id)
            .map_or(false, |e| NON_RENDERED_ELEMENTS.contains(&e.tag.as_str()))
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.descendants(self.root()).into_iter().any(|n| {
            self.element(n)
                .map_or(false, |e| e.tag.eq_ignore_ascii_case(tag))
        })
    }

    /// Serialize the whole fragment
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    /// Serialize the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        enum Step {
            Open(NodeId),
            Close(NodeId),
        }

        let mut out = String::new();
        let mut stack: Vec<Step> = self.children(id).iter().rev().map(|c| Step::Open(*c)).collect();
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Close(id) => {
                    if let Some(element) = self.element(id) {
                        let _ = write!(out, "</{}>", element.tag);
                    }
                    continue;
                }
                Step::Open(id) => id,
            };
            match &self.nodes[id.0].data {
                NodeData::Fragment => {
                    stack.extend(self.children(id).iter().rev().map(|c| Step::Open(*c)));
                }
                NodeData::Text(text) => {
                    let raw = self
                        .parent(id)
                        .and_then(|p| self.element(p))
                        .map_or(false, |e| matches!(e.tag.as_str(), "script" | "style"));
                    if raw {
                        out.push_str(text);
                    } else {
                        out.push_str(&escape_text(text));
                    }
                }
                NodeData::Element(element) => {
                    let _ = write!(out, "<{}", element.tag);
                    for (name, value) in &element.attributes {
                        let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
                    }
                    if !element.style.is_empty() {
                        let _ = write!(out, " style=\"{}\"", escape_attr(&element.style.to_css_text()));
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                        continue;
                    }
                    stack.push(Step::Close(id));
                    stack.extend(self.children(id).iter().rev().map(|c| Step::Open(*c)));
                }
            }
        }
        out
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\u{a0}', "&nbsp;")
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inline_style_parse_and_set() {
        let mut style = InlineStyle::parse("Color: red; background-color : #fff ;; bogus; margin:");
        assert_eq!(style.get("color"), Some("red"));
        assert_eq!(style.get("BACKGROUND-COLOR"), Some("#fff"));
        assert_eq!(style.get("margin"), None);

        style.set("color", "blue");
        style.set("text-decoration-color", "blue");
        assert_eq!(
            style.to_css_text(),
            "color: blue; background-color: #fff; text-decoration-color: blue"
        );
        assert_eq!(style.remove("color"), Some("blue".to_string()));
        assert_eq!(style.get("color"), None);
    }

    #[test]
    fn test_inline_style_strips_important() {
        let style = InlineStyle::parse("color: #000 !important");
        assert_eq!(style.get("color"), Some("#000"));
    }

    #[test]
    fn test_build_and_serialize() {
        let mut doc = Document::new();
        let p = doc.create_element("P");
        let text = doc.create_text("a < b & c");
        doc.append_child(doc.root(), p);
        doc.append_child(p, text);
        doc.element_mut(p).unwrap().set_attr("style", "color: red");
        doc.element_mut(p).unwrap().set_attr("title", "say \"hi\"");

        assert_eq!(
            doc.to_html(),
            "<p title=\"say &quot;hi&quot;\" style=\"color: red\">a &lt; b &amp; c</p>"
        );
    }

    #[test]
    fn test_tree_queries() {
        let mut doc = Document::new();
        let a = doc.create_element("a");
        let span = doc.create_element("span");
        let text = doc.create_text("link");
        doc.append_child(doc.root(), a);
        doc.append_child(a, span);
        doc.append_child(span, text);

        assert_eq!(doc.closest(text, "a"), Some(a));
        assert_eq!(doc.closest(text, "table"), None);
        assert_eq!(doc.ancestors(text).collect::<Vec<_>>(), vec![span, a, doc.root()]);
        assert_eq!(doc.text_nodes(doc.root()), vec![text]);
        assert!(doc.contains_tag("SPAN"));
    }

    #[test]
    fn test_text_nodes_skip_non_rendered_subtrees() {
        let mut doc = Document::new();
        let style = doc.create_element("style");
        let css = doc.create_text("p { color: red }");
        let p = doc.create_element("p");
        let text = doc.create_text("shown");
        doc.append_child(doc.root(), style);
        doc.append_child(style, css);
        doc.append_child(doc.root(), p);
        doc.append_child(p, text);

        assert_eq!(doc.text_nodes(doc.root()), vec![text]);
        assert!(doc.text_nodes(style).is_empty());
    }

    #[test]
    fn test_deep_tree_serializes_without_recursion() {
        let mut doc = Document::new();
        let mut parent = doc.root();
        for _ in 0..100_000 {
            let b = doc.create_element("b");
            doc.append_child(parent, b);
            parent = b;
        }
        let text = doc.create_text("deep");
        doc.append_child(parent, text);

        let html = doc.to_html();
        assert!(html.starts_with("<b><b>"));
        assert!(html.contains("<b>deep</b>"));
        assert_eq!(html.matches("</b>").count(), 100_000);
        assert_eq!(doc.text_nodes(doc.root()), vec![text]);
    }

    #[test]
    fn test_reparent_children() {
        let mut doc = Document::new();
        let first = doc.create_text("one");
        let second = doc.create_element("b");
        doc.append_child(doc.root(), first);
        doc.append_child(doc.root(), second);

        let wrapper = doc.create_element("div");
        doc.reparent_children(doc.root(), wrapper);
        doc.append_child(doc.root(), wrapper);

        assert_eq!(doc.children(doc.root()), &[wrapper]);
        assert_eq!(doc.parent(first), Some(wrapper));
        assert_eq!(doc.to_html(), "<div>one<b></b></div>");
    }
}
