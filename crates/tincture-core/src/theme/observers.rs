//! Token observers, theme sinks and batching

use crate::color::Oklch;
use crate::types::TokenName;
use std::collections::BTreeSet;

/// Handle returned by `ThemeEngine::subscribe`
pub type SubscriptionId = u64;

/// Consumer of resolved token values
///
/// The rendering layer implements this to push tokens into CSS custom
/// properties, a config file, or any other surface.
#[cfg_attr(test, mockall::automock)]
pub trait ThemeSink {
    /// Called once per changed token when a batch flushes
    fn apply_token(&mut self, name: TokenName, css_value: &str);

    /// Called after the tokens of one flushed batch were applied
    ///
    /// Sinks that animate color changes can suppress transitions here.
    fn batch_applied(&mut self, _changed: &[TokenName]) {}
}

type Callback = Box<dyn FnMut(TokenName, Oklch)>;

struct Subscriber {
    id: SubscriptionId,
    /// `None` observes every token
    token: Option<TokenName>,
    callback: Callback,
}

/// Fine-grained token subscriptions
#[derive(Default)]
pub(crate) struct Observers {
    next_id: SubscriptionId,
    subscribers: Vec<Subscriber>,
}

impl Observers {
    pub fn subscribe(&mut self, token: Option<TokenName>, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id: self.next_id,
            token,
            callback,
        });
        self.next_id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn notify(&mut self, name: TokenName, value: Oklch) {
        for subscriber in &mut self.subscribers {
            if subscriber.token.map_or(true, |t| t == name) {
                (subscriber.callback)(name, value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}

/// Nesting depth and tokens changed since the outermost batch began
#[derive(Debug, Default)]
pub(crate) struct BatchState {
    depth: usize,
    dirty: BTreeSet<TokenName>,
}

impl BatchState {
    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Close one level; returns true when the outermost batch closed
    pub fn end(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.depth == 0
    }

    pub fn is_open(&self) -> bool {
        self.depth > 0
    }

    pub fn mark(&mut self, name: TokenName) {
        self.dirty.insert(name);
    }

    /// Drain dirty tokens in palette order
    pub fn take_dirty(&mut self) -> Vec<TokenName> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_filters_by_token() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::default();

        let log = seen.clone();
        observers.subscribe(
            Some(TokenName::B0),
            Box::new(move |name, _| log.borrow_mut().push(name)),
        );

        observers.notify(TokenName::A0, Oklch::gray(0.5));
        observers.notify(TokenName::B0, Oklch::gray(0.5));

        assert_eq!(*seen.borrow(), vec![TokenName::B0]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut observers = Observers::default();
        let id = observers.subscribe(None, Box::new(|_, _| {}));
        assert_eq!(observers.len(), 1);
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        assert_eq!(observers.len(), 0);
    }

    #[test]
    fn test_batch_nesting() {
        let mut batch = BatchState::default();
        batch.begin();
        batch.begin();
        batch.mark(TokenName::C1);
        batch.mark(TokenName::A0);
        batch.mark(TokenName::C1);
        assert!(!batch.end());
        assert!(batch.is_open());
        assert!(batch.end());
        assert_eq!(batch.take_dirty(), vec![TokenName::A0, TokenName::C1]);
        assert!(batch.take_dirty().is_empty());
    }
}
