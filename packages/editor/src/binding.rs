//! # Slot View Binding
//!
//! The editor core never paints anything. The hosting shell implements
//! [`SlotBinding`] and receives one call per visible consequence of a
//! mutation, always after the entity and handler tree have been updated, so a
//! binding observing a callback sees a consistent model.
//!
//! Paths passed to the binding are real attribute paths (choice markers never
//! leak out); the value index travels separately.

use facet_model::{AttributePath, Entity};
use std::cell::RefCell;
use std::rc::Rc;

/// Receiver for slot view updates and field-level error markers.
pub trait SlotBinding {
    /// A value slot appeared at `index`. When `reuse` is set, the reference
    /// slot was valued-but-empty and the host should fill it in place instead
    /// of adding a visible row.
    fn slot_inserted(&mut self, attribute: &AttributePath, index: usize, reuse: bool);

    /// The value slot at `index` went away.
    fn slot_removed(&mut self, attribute: &AttributePath, index: usize);

    /// A simple value was overwritten in place.
    fn value_changed(&mut self, attribute: &AttributePath, index: usize, text: &str);

    /// A single-valued attribute lost its sole value; the slot stays visible
    /// with its displayed value cleared.
    fn value_cleared(&mut self, attribute: &AttributePath);

    /// The value at `from` moved to `to`.
    fn slots_moved(&mut self, attribute: &AttributePath, from: usize, to: usize);

    /// The active alternative of a choice slot changed.
    fn choice_changed(&mut self, attribute: &AttributePath, index: usize, alternative: &str);

    /// Rebuild the whole form from the entity (undo/redo fallback path).
    fn render_all(&mut self, root: &Entity);

    /// Display a validation message next to the slot for value `index`.
    fn show_error(&mut self, attribute: &AttributePath, index: usize, message: &str);

    /// Drop all previously applied error markers.
    fn clear_errors(&mut self);
}

/// One recorded binding callback, used by the test suites.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotEvent {
    Inserted {
        attribute: AttributePath,
        index: usize,
        reuse: bool,
    },
    Removed {
        attribute: AttributePath,
        index: usize,
    },
    Changed {
        attribute: AttributePath,
        index: usize,
        text: String,
    },
    Cleared {
        attribute: AttributePath,
    },
    Moved {
        attribute: AttributePath,
        from: usize,
        to: usize,
    },
    ChoiceChanged {
        attribute: AttributePath,
        index: usize,
        alternative: String,
    },
    RenderAll,
    Error {
        attribute: AttributePath,
        index: usize,
        message: String,
    },
    ErrorsCleared,
}

/// Binding double that records every callback in order. Clones share the
/// event log, so a test can keep one handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingBinding {
    events: Rc<RefCell<Vec<SlotEvent>>>,
}

impl RecordingBinding {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: SlotEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<SlotEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<SlotEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn errors(&self) -> Vec<SlotEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SlotEvent::Error { .. }))
            .cloned()
            .collect()
    }
}

impl SlotBinding for RecordingBinding {
    fn slot_inserted(&mut self, attribute: &AttributePath, index: usize, reuse: bool) {
        self.push(SlotEvent::Inserted {
            attribute: attribute.clone(),
            index,
            reuse,
        });
    }

    fn slot_removed(&mut self, attribute: &AttributePath, index: usize) {
        self.push(SlotEvent::Removed {
            attribute: attribute.clone(),
            index,
        });
    }

    fn value_changed(&mut self, attribute: &AttributePath, index: usize, text: &str) {
        self.push(SlotEvent::Changed {
            attribute: attribute.clone(),
            index,
            text: text.to_string(),
        });
    }

    fn value_cleared(&mut self, attribute: &AttributePath) {
        self.push(SlotEvent::Cleared {
            attribute: attribute.clone(),
        });
    }

    fn slots_moved(&mut self, attribute: &AttributePath, from: usize, to: usize) {
        self.push(SlotEvent::Moved {
            attribute: attribute.clone(),
            from,
            to,
        });
    }

    fn choice_changed(&mut self, attribute: &AttributePath, index: usize, alternative: &str) {
        self.push(SlotEvent::ChoiceChanged {
            attribute: attribute.clone(),
            index,
            alternative: alternative.to_string(),
        });
    }

    fn render_all(&mut self, _root: &Entity) {
        self.push(SlotEvent::RenderAll);
    }

    fn show_error(&mut self, attribute: &AttributePath, index: usize, message: &str) {
        self.push(SlotEvent::Error {
            attribute: attribute.clone(),
            index,
            message: message.to_string(),
        });
    }

    fn clear_errors(&mut self) {
        self.push(SlotEvent::ErrorsCleared);
    }
}
