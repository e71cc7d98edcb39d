//! Tolerant HTML fragment parser
//!
//! Email bodies are frequently malformed. The parser never fails: stray end
//! tags are ignored, unclosed elements are closed at the end of input and
//! comments, doctypes and processing instructions are dropped.

use super::dom::{Document, NodeId, VOID_ELEMENTS};

/// Elements whose content is raw text up to the matching end tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Open elements beyond this depth are kept as empty siblings and their
/// content flows into the deepest open element
pub(crate) const MAX_NESTING_DEPTH: usize = 512;

impl Document {
    /// Parse an HTML fragment
    pub fn parse_fragment(html: &str) -> Document {
        let mut parser = Parser {
            input: html,
            pos: 0,
            doc: Document::new(),
            stack: Vec::new(),
        };
        parser.run();
        parser.doc
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    doc: Document,
    /// Open elements, innermost last
    stack: Vec<(NodeId, String)>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack.last().map_or(self.doc.root(), |(id, _)| *id)
    }

    fn run(&mut self) {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->", 4);
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_past(">", 2);
            } else if rest.starts_with("</") {
                self.end_tag();
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.start_tag();
            } else {
                self.text();
            }
        }
    }

    fn skip_past(&mut self, terminator: &str, offset: usize) {
        match self.rest()[offset..].find(terminator) {
            Some(index) => self.pos += offset + index + terminator.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn text(&mut self) {
        let rest = self.rest();
        // A lone '<' that does not open a tag is literal text
        let first = rest.chars().next().map_or(0, char::len_utf8);
        let end = rest[first..].find('<').map_or(rest.len(), |i| i + first);
        let raw = &rest[..end];
        self.pos += end;
        self.append_text(decode_entities(raw));
    }

    fn append_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        let id = self.doc.create_text(text);
        self.doc.append_child(parent, id);
    }

    fn end_tag(&mut self) {
        let rest = self.rest();
        let close = rest.find('>').map_or(rest.len(), |i| i + 1);
        let name = rest[2..close]
            .trim_end_matches('>')
            .trim()
            .to_ascii_lowercase();
        self.pos += close;

        if let Some(index) = self.stack.iter().rposition(|(_, tag)| *tag == name) {
            self.stack.truncate(index);
        }
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let name = self.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
        let tag = name.to_ascii_lowercase();
        let id = self.doc.create_element(&tag);

        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let (attr_name, value) = self.attribute();
            if attr_name.is_empty() {
                continue;
            }
            if let Some(element) = self.doc.element_mut(id) {
                if element.attr(&attr_name).is_none() {
                    element.set_attr(&attr_name, value);
                }
            }
        }

        let parent = self.current();
        self.doc.append_child(parent, id);

        if VOID_ELEMENTS.contains(&tag.as_str()) || self_closing {
            return;
        }
        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            self.raw_text(id, &tag);
            return;
        }
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return;
        }
        self.stack.push((id, tag));
    }

    fn raw_text(&mut self, parent: NodeId, tag: &str) {
        let rest = self.rest();
        let needle = format!("</{}", tag);
        let end = rest.to_ascii_lowercase().find(&needle).unwrap_or(rest.len());
        if end > 0 {
            let text = self.doc.create_text(&rest[..end]);
            self.doc.append_child(parent, text);
        }
        self.pos += end;
        if self.pos < self.input.len() {
            self.skip_past(">", 0);
        }
    }

    fn attribute(&mut self) -> (String, String) {
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/')
            .to_ascii_lowercase();
        if name.is_empty() {
            // Skip a stray character such as a lone quote
            let skip = self.rest().chars().next().map_or(0, char::len_utf8);
            self.pos += skip;
            return (String::new(), String::new());
        }
        self.skip_whitespace();
        if !self.rest().starts_with('=') {
            return (name, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();

        let rest = self.rest();
        let value = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..].find(quote).map_or(rest.len(), |i| i + 1);
                let value = &rest[1..end];
                self.pos += (end + 1).min(rest.len());
                value
            }
            _ => self.take_while(|c| !c.is_whitespace() && c != '>'),
        };
        (name, decode_entities(value))
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !predicate(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

/// Decode the character references that commonly appear in email markup
pub(crate) fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(reference: &str) -> Option<char> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        "hellip" => Some('…'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_nested_markup() {
        let doc = Document::parse_fragment(
            r#"<div class=box style="color: #333"><p>Hello <b>world</b></p><br><img src='x.png'/></div>"#,
        );
        assert_eq!(
            doc.to_html(),
            r#"<div class="box" style="color: #333"><p>Hello <b>world</b></p><br><img src="x.png"></div>"#
        );
        let div = doc.children(doc.root())[0];
        assert_eq!(doc.element(div).unwrap().style().get("color"), Some("#333"));
    }

    #[test]
    fn test_parse_is_tolerant() {
        let doc = Document::parse_fragment("<p>one</span><i>two</p>three <div>open");
        assert_eq!(doc.to_html(), "<p>one<i>two</i></p>three <div>open</div>");
    }

    #[test]
    fn test_comments_and_doctype_dropped() {
        let doc = Document::parse_fragment("<!DOCTYPE html><!-- hidden <b> --><p>shown</p>");
        assert_eq!(doc.to_html(), "<p>shown</p>");
    }

    #[test]
    fn test_raw_text_elements() {
        let doc = Document::parse_fragment("<style>p > a { color: red }</style><p>x</p>");
        assert_eq!(doc.to_html(), "<style>p > a { color: red }</style><p>x</p>");
        assert_eq!(doc.text_nodes(doc.root()).len(), 1);
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &bogus; &"), "a & b <c> AB &bogus; &");
        let doc = Document::parse_fragment("<p title=\"&quot;q&quot;\">1 &lt; 2&nbsp;</p>");
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.element(p).unwrap().attr("title"), Some("\"q\""));
        assert_eq!(doc.to_html(), "<p title=\"&quot;q&quot;\">1 &lt; 2&nbsp;</p>");
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let doc = Document::parse_fragment("<p>1 < 2</p>");
        assert_eq!(doc.to_html(), "<p>1 &lt; 2</p>");
    }

    #[test]
    fn test_deep_nesting_is_capped() {
        let html = format!("{}x{}", "<b>x".repeat(50_000), "</b>".repeat(50_000));
        let doc = Document::parse_fragment(&html);

        let texts = doc.text_nodes(doc.root());
        assert_eq!(texts.len(), 50_000);
        let deepest = texts.iter().map(|t| doc.ancestors(*t).count()).max().unwrap();
        assert_eq!(deepest, MAX_NESTING_DEPTH + 1);
        assert_eq!(doc.to_html().matches("<b>").count(), 50_000);
    }
}
