//! Filtering and mutating stages.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::NodeEvent;
use crate::parser::Observer;

type ObserverFactory = Rc<dyn Fn() -> Box<dyn Observer>>;

/// Shared handle to one observer used as a chain stage.
///
/// Clones share the observer, and with it any state it captured, across
/// every run of the chain the transformer is part of. [`Transformer::fork`]
/// starts a separate instance from the initial state instead; cloning a
/// [`Fragment`](super::Fragment) forks its transformers, so fanned-out
/// chains never see each other's filter state.
#[derive(Clone)]
pub struct Transformer {
    factory: ObserverFactory,
    observer: Rc<RefCell<Box<dyn Observer>>>,
}

impl Transformer {
    /// Wrap an observer; forks start from a clone of it as passed here.
    ///
    /// State behind shared handles such as `Rc` stays shared between forks.
    pub fn new<O>(observer: O) -> Self
    where
        O: Observer + Clone + 'static,
    {
        Self::from_factory(move || observer.clone())
    }

    /// Transformer whose every fork gets a fresh observer from `factory`.
    pub fn from_factory<O, F>(factory: F) -> Self
    where
        O: Observer + 'static,
        F: Fn() -> O + 'static,
    {
        let factory: ObserverFactory = Rc::new(move || Box::new(factory()) as Box<dyn Observer>);
        let observer = Rc::new(RefCell::new(factory()));
        Self { factory, observer }
    }

    /// Independent copy starting from the initial state.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            factory: Rc::clone(&self.factory),
            observer: Rc::new(RefCell::new((self.factory)())),
        }
    }

    /// Skip every event matching `predicate`.
    ///
    /// # Examples
    /// ```
    /// use docwalk::{NodeEvent, Tag, Transformer};
    ///
    /// let drafts = Transformer::filter(|event: &NodeEvent| event.text().starts_with("DRAFT"));
    /// let mut event = NodeEvent::new(Tag::Content).with_text("DRAFT: plan");
    /// drafts.apply(&mut event);
    /// assert!(event.is_skipped());
    /// ```
    pub fn filter(predicate: impl Fn(&NodeEvent) -> bool + 'static) -> Self {
        let predicate = Rc::new(predicate);
        Self::new(move |event: &mut NodeEvent| {
            if (*predicate)(event) {
                event.set_skip();
            }
        })
    }

    /// Transformer that lets every event through.
    #[must_use]
    pub fn pass_through() -> Self {
        Self::new(|_: &mut NodeEvent| {})
    }

    /// Run the wrapped observer on one event.
    pub fn apply(&self, event: &mut NodeEvent) {
        match self.observer.try_borrow_mut() {
            Ok(mut observer) => observer.on_node(event),
            Err(_) => tracing::warn!("Transformer re-entered from its own callback, ignoring event"),
        }
    }

    fn sees_skipped(&self) -> bool {
        self.observer
            .try_borrow()
            .is_ok_and(|observer| observer.sees_skipped())
    }

    /// Observer forwarding to this transformer, for one run.
    pub(crate) fn observer(&self) -> Box<dyn Observer> {
        Box::new(TransformerObserver(self.clone()))
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("handles", &Rc::strong_count(&self.observer))
            .finish()
    }
}

struct TransformerObserver(Transformer);

impl Observer for TransformerObserver {
    fn on_node(&mut self, event: &mut NodeEvent) {
        self.0.apply(event);
    }

    fn sees_skipped(&self) -> bool {
        self.0.sees_skipped()
    }
}
