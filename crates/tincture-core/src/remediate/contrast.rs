//! Text contrast remediation
//!
//! Walks the text nodes of a document and rewrites author text colors so
//! they stay legible on the active theme's panel surface.

use super::dom::{Document, NodeId};
use crate::color::{parse_css_color, CssColor, Oklch, Rgba};
use crate::types::{ThemeTokenSet, TokenName};
use tracing::debug;

/// Minimum lightness gap between text and the panel surface
pub const MIN_TEXT_CONTRAST: f64 = 0.5;

/// Attribute recording the author color an element had before remediation
pub const ORIGINAL_COLOR_ATTR: &str = "data-tincture-original-color";

const LIGHTNESS_TOLERANCE: f64 = 1e-3;
const HUE_TOLERANCE: f64 = 0.01;

/// Theme inputs for remediation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemediationPalette {
    /// Primary ink, the floor (light themes) or ceiling (dark themes) for text
    pub ink: Oklch,
    /// Lightness of the surface the content is shown on
    pub panel_lightness: f64,
    /// Link color
    pub accent: Oklch,
}

impl RemediationPalette {
    pub fn from_tokens(tokens: &ThemeTokenSet) -> Self {
        Self {
            ink: tokens.get(TokenName::C0),
            panel_lightness: tokens.get(TokenName::B1).l(),
            accent: tokens.get(TokenName::A0),
        }
    }

    pub fn is_dark(&self) -> bool {
        self.ink.l() > self.panel_lightness
    }

    /// Legible replacement for an author text color
    pub fn correct(&self, fg: Oklch) -> Oklch {
        let ink_l = self.ink.l();
        let l = if self.is_dark() {
            (1.0 - fg.l()).min(ink_l)
        } else {
            fg.l().max(ink_l)
        };

        let mut color = fg.with_l(l);
        if color.is_achromatic() {
            color = Oklch::new(l, self.ink.c(), self.ink.h());
        }

        let panel = self.panel_lightness;
        let gap = color.l() - panel;
        if gap.abs() < MIN_TEXT_CONTRAST {
            let up = if gap == 0.0 { self.is_dark() } else { gap > 0.0 };
            let (preferred, fallback) = if up {
                (panel + MIN_TEXT_CONTRAST, panel - MIN_TEXT_CONTRAST)
            } else {
                (panel - MIN_TEXT_CONTRAST, panel + MIN_TEXT_CONTRAST)
            };
            let target = if (0.0..=1.0).contains(&preferred) {
                preferred
            } else {
                fallback
            };
            color = color.with_l(target);
        }
        color
    }
}

/// What the remediator knows about one visible text node
#[derive(Debug, Clone, PartialEq)]
pub struct TextNodeContrastRecord {
    pub text: String,
    /// Author foreground; `None` when the declared color could not be parsed
    pub fg: Option<Oklch>,
    /// Parent background with non-zero alpha, if any
    pub bg: Option<Oklch>,
    pub node: NodeId,
    pub inside_anchor: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemediationReport {
    pub visited: usize,
    pub rewritten: usize,
    pub anchors_recolored: usize,
    pub skipped_background: usize,
    pub skipped_no_color: usize,
}

/// Records for every non-blank text node under `root` that sits in an element
pub fn collect_text_records(doc: &Document, root: NodeId) -> Vec<TextNodeContrastRecord> {
    doc.text_nodes(root)
        .into_iter()
        .filter_map(|node| {
            let text = doc.text(node)?;
            if text.trim().is_empty() {
                return None;
            }
            let parent = doc.parent(node)?;
            doc.element(parent)?;
            Some(TextNodeContrastRecord {
                text: text.to_string(),
                fg: author_color(doc, parent),
                bg: background_color(doc, parent),
                node,
                inside_anchor: doc.closest(node, "a").is_some(),
            })
        })
        .collect()
}

/// Rewrite text colors under `root` for the given palette
///
/// Repeated passes are stable and a pass with a different palette starts
/// from the author colors, not from an earlier pass's output.
pub fn remediate(doc: &mut Document, root: NodeId, palette: &RemediationPalette) -> RemediationReport {
    let mut report = RemediationReport::default();

    for record in collect_text_records(doc, root) {
        report.visited += 1;

        if record.bg.is_some() {
            report.skipped_background += 1;
            continue;
        }
        let Some(fg) = record.fg else {
            report.skipped_no_color += 1;
            continue;
        };

        if record.inside_anchor {
            if let Some(anchor) = doc.closest(record.node, "a") {
                if recolor_anchor(doc, anchor, palette.accent) {
                    report.anchors_recolored += 1;
                }
            }
            continue;
        }

        let Some(parent) = doc.parent(record.node) else {
            continue;
        };
        if write_color(doc, parent, fg, palette.correct(fg)) {
            report.rewritten += 1;
        }
    }

    debug!(
        "Remediated {} text nodes: {} rewritten, {} links, {} on backgrounds, {} without color",
        report.visited,
        report.rewritten,
        report.anchors_recolored,
        report.skipped_background,
        report.skipped_no_color
    );
    report
}

/// Parse, remediate and serialize an HTML fragment
pub fn remediate_html(html: &str, palette: &RemediationPalette) -> (String, RemediationReport) {
    let mut doc = Document::parse_fragment(html);
    let root = doc.root();
    let report = remediate(&mut doc, root, palette);
    (doc.to_html(), report)
}

/// Color an element inherits from its author markup
///
/// Unstyled text falls back to black like a browser default stylesheet.
fn author_color(doc: &Document, element: NodeId) -> Option<Oklch> {
    for id in doc.self_and_ancestors(element) {
        let Some(el) = doc.element(id) else { continue };
        if let Some(original) = el.attr(ORIGINAL_COLOR_ATTR) {
            return parse_color(original);
        }
        if let Some(value) = declared_color(doc, id) {
            return parse_color(value);
        }
    }
    Some(Oklch::gray(0.0))
}

/// Color an element currently renders with, including earlier rewrites
fn rendered_color(doc: &Document, element: NodeId) -> Option<Oklch> {
    doc.self_and_ancestors(element)
        .find_map(|id| declared_color(doc, id))
        .map_or(Some(Oklch::gray(0.0)), parse_color)
}

fn declared_color(doc: &Document, id: NodeId) -> Option<&str> {
    let el = doc.element(id)?;
    el.style().get("color").or_else(|| {
        if el.tag() == "font" {
            el.attr("color")
        } else {
            None
        }
    })
}

fn background_color(doc: &Document, element: NodeId) -> Option<Oklch> {
    let el = doc.element(element)?;
    let style = el.style();
    let shorthand = style.get("background").and_then(|value| {
        shorthand_tokens(value)
            .into_iter()
            .find_map(parse_css_color)
    });
    // Legacy attribute; mail clients accept hex without the '#'
    let bgcolor = el
        .attr("bgcolor")
        .and_then(|value| parse_css_color(value).or_else(|| Rgba::from_hex(value).map(CssColor::Srgb)));

    style
        .get("background-color")
        .and_then(parse_css_color)
        .into_iter()
        .chain(shorthand)
        .chain(bgcolor)
        .find(|c| c.alpha() > 0.0)
        .map(|c| c.to_oklch())
}

/// Whitespace-separated parts of a shorthand value, keeping `fn(...)` whole
fn shorthand_tokens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take() {
                    tokens.push(&value[begin..i]);
                }
                continue;
            }
            _ => {}
        }
        start.get_or_insert(i);
    }
    if let Some(begin) = start {
        tokens.push(&value[begin..]);
    }
    tokens
}

fn parse_color(value: &str) -> Option<Oklch> {
    parse_css_color(value).map(|c| c.to_oklch())
}

fn same_color(a: Oklch, b: Oklch) -> bool {
    (a.l() - b.l()).abs() <= LIGHTNESS_TOLERANCE
        && (a.c() - b.c()).abs() <= LIGHTNESS_TOLERANCE
        && ((a.is_achromatic() && b.is_achromatic()) || a.hue_delta(&b) <= HUE_TOLERANCE)
}

/// Set `target` as the element's inline color unless it already renders so
fn write_color(doc: &mut Document, element: NodeId, author: Oklch, target: Oklch) -> bool {
    if rendered_color(doc, element).map_or(false, |current| same_color(current, target)) {
        return false;
    }
    let Some(el) = doc.element_mut(element) else {
        return false;
    };
    if el.attr(ORIGINAL_COLOR_ATTR).is_none() {
        let original = el
            .style()
            .get("color")
            .map(str::to_string)
            .unwrap_or_else(|| author.to_css());
        el.set_attr(ORIGINAL_COLOR_ATTR, original);
    }
    el.style_mut().set("color", target.to_css());
    true
}

fn recolor_anchor(doc: &mut Document, anchor: NodeId, accent: Oklch) -> bool {
    let Some(el) = doc.element_mut(anchor) else {
        return false;
    };
    let css = accent.to_css();
    let style = el.style_mut();
    if style.get("color") == Some(css.as_str())
        && style.get("text-decoration-color") == Some(css.as_str())
    {
        return false;
    }
    style.set("color", css.clone());
    style.set("text-decoration-color", css);
    true
}
