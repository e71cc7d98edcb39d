//! CSS custom-property sink
//!
//! Mirrors the live tokens as `:root` custom properties. When a batch changes
//! several tokens at once the color transition is briefly disabled so the
//! page does not animate through intermediate palettes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tincture_core::{ThemeSink, TokenName};
use tracing::debug;

/// Custom property read by the page's color transitions
pub const TRANSITION_PROPERTY: &str = "--theme-transition-duration";

/// How long transitions stay disabled after a multi-token batch
pub const TRANSITION_JAM: Duration = Duration::from_millis(100);

pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct Variables {
    values: BTreeMap<TokenName, String>,
    transition: Duration,
    jammed_until: Option<Instant>,
}

/// Shared handle: one clone goes to the engine, the others read the sheet
#[derive(Debug, Clone)]
pub struct CssVariableSink {
    inner: Rc<RefCell<Variables>>,
}

impl Default for CssVariableSink {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION)
    }
}

impl CssVariableSink {
    pub fn new(transition: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Variables {
                values: BTreeMap::new(),
                transition,
                jammed_until: None,
            })),
        }
    }

    pub fn value(&self, name: TokenName) -> Option<String> {
        self.inner.borrow().values.get(&name).cloned()
    }

    pub fn transitions_suppressed(&self) -> bool {
        self.inner.borrow().jammed_until.is_some()
    }

    /// Restore transitions once the suppression deadline has passed
    pub fn tick(&self, now: Instant) {
        let mut inner = self.inner.borrow_mut();
        if inner.jammed_until.map_or(false, |deadline| now >= deadline) {
            inner.jammed_until = None;
            debug!("Theme transitions restored");
        }
    }

    /// The `:root` rule for the current tokens
    pub fn stylesheet(&self) -> String {
        let inner = self.inner.borrow();
        let mut css = String::from(":root {\n");
        for (name, value) in &inner.values {
            let _ = writeln!(css, "  {}: {};", name.css_variable(), value);
        }
        let duration = if inner.jammed_until.is_some() {
            Duration::ZERO
        } else {
            inner.transition
        };
        let _ = writeln!(css, "  {}: {}ms;", TRANSITION_PROPERTY, duration.as_millis());
        css.push('}');
        css
    }
}

impl ThemeSink for CssVariableSink {
    fn apply_token(&mut self, name: TokenName, css_value: &str) {
        self.inner
            .borrow_mut()
            .values
            .insert(name, css_value.to_string());
    }

    fn batch_applied(&mut self, changed: &[TokenName]) {
        if changed.len() > 1 {
            self.inner.borrow_mut().jammed_until = Some(Instant::now() + TRANSITION_JAM);
        }
    }
}
