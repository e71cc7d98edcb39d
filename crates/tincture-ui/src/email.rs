//! Email body rendering policy
//!
//! Table-based layouts position their own backgrounds and break when text is
//! recolored piecemeal, so they are shown on a forced white page instead of
//! being remediated.

use tincture_core::remediate::{remediate, Document, RemediationPalette, RemediationReport};
use tracing::debug;

/// Class of the container every rendered email is wrapped in
pub const EMAIL_CONTAINER_CLASS: &str = "tincture-email";

/// Inline style of the container for table layouts
pub const TABLE_FALLBACK_STYLE: &str = "background-color: #ffffff; color: #000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailMode {
    /// Text colors were rewritten for the theme
    Remediated(RemediationReport),
    /// A table layout was found and shown on a white page
    TableFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub mode: EmailMode,
}

/// Render an email body for display on the current theme
pub fn render_email(html: &str, palette: &RemediationPalette) -> RenderedEmail {
    let mut doc = Document::parse_fragment(html);
    let has_table = doc.contains_tag("table");

    let root = doc.root();
    let container = doc.create_element("div");
    doc.reparent_children(root, container);
    doc.append_child(root, container);
    if let Some(el) = doc.element_mut(container) {
        el.set_attr("class", EMAIL_CONTAINER_CLASS);
        if has_table {
            el.set_attr("style", TABLE_FALLBACK_STYLE);
        }
    }

    let mode = if has_table {
        debug!("Email uses a table layout; skipping remediation");
        EmailMode::TableFallback
    } else {
        EmailMode::Remediated(remediate(&mut doc, container, palette))
    };

    RenderedEmail {
        html: doc.to_html(),
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tincture_core::{parse_css_color, Oklch, ThemeTokenSet};

    fn dark_palette() -> RemediationPalette {
        RemediationPalette {
            ink: Oklch::new(0.9, 0.02, 250.0),
            panel_lightness: 0.2,
            accent: Oklch::new(0.7, 0.15, 30.0),
        }
    }

    #[test]
    fn test_table_layout_gets_white_page() {
        let html = r#"<table><tr><td style="color: #333">Invoice</td></tr></table>"#;
        let rendered = render_email(html, &dark_palette());

        assert_eq!(rendered.mode, EmailMode::TableFallback);
        assert_eq!(
            rendered.html,
            format!(
                r#"<div class="{}" style="{}">{}</div>"#,
                EMAIL_CONTAINER_CLASS, TABLE_FALLBACK_STYLE, html
            )
        );
    }

    #[test]
    fn test_plain_email_is_remediated() {
        let rendered = render_email("Hello <p style=\"color: #333\">there</p>", &dark_palette());

        let EmailMode::Remediated(report) = rendered.mode else {
            panic!("expected remediation, got {:?}", rendered.mode);
        };
        // Loose text is recolored through the container
        assert_eq!(report.visited, 2);
        assert_eq!(report.rewritten, 2);
        assert!(rendered.html.starts_with(r#"<div class="tincture-email" data-tincture-original-color="#));
        assert!(!rendered.html.contains("#ffffff"));
    }

    #[test]
    fn test_black_paragraph_on_light_theme() {
        let tokens = ThemeTokenSet::from_ramps(
            Oklch::new(0.6, 0.15, 30.0),
            (0.0, 0.0),
            [0.95, 0.95, 0.9, 0.85, 0.8],
            (0.0, 0.0),
            [0.1, 0.25, 0.4, 0.55, 0.7],
        );
        let palette = RemediationPalette::from_tokens(&tokens);
        let rendered = render_email(r#"<p style="color: rgb(0,0,0)">Invoice</p>"#, &palette);

        let EmailMode::Remediated(report) = rendered.mode else {
            panic!("expected remediation, got {:?}", rendered.mode);
        };
        assert_eq!(report.visited, 1);

        let doc = Document::parse_fragment(&rendered.html);
        let container = doc.children(doc.root())[0];
        let p = doc.children(container)[0];
        let color = doc.element(p).unwrap().style().get("color").unwrap();
        let color = parse_css_color(color).unwrap().to_oklch();
        assert!((color.l() - 0.1).abs() < 1e-3);
        assert!((color.l() - 0.95).abs() >= 0.5);
    }
}
