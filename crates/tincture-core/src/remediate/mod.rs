//! Contrast remediation for third-party HTML
//!
//! Email bodies carry their own inline colors, written for a white page.
//! This module parses such fragments into a small [`Document`] tree and
//! rewrites text colors against the active theme.

mod contrast;
mod dom;
mod html;

pub use contrast::{
    collect_text_records, remediate, remediate_html, RemediationPalette, RemediationReport,
    TextNodeContrastRecord, MIN_TEXT_CONTRAST, ORIGINAL_COLOR_ATTR,
};
pub use dom::{Document, Element, InlineStyle, Node, NodeData, NodeId};
