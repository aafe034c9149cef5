//! # Entity Document
//!
//! Owns the root entity of an editing session and funnels every mutation
//! through itself, appending an [`AttributeChange`] to an internal queue for
//! each one. Consumers (history recording, validation scheduling) drain the
//! queue with [`EntityDocument::take_changes`] after a mutation completes.
//!
//! This is the explicit replacement for an ambient change-event bus: there is
//! no subscription to leak, and teardown is just dropping the document.

use crate::{AttributePath, Entity, ModelError, Value};
use serde::{Deserialize, Serialize};

/// What kind of structural change a mutation performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Add,
    Remove,
    Sort,
    Value,
    Choice,
}

/// One observed data change: where it happened and what kind it was.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub path: AttributePath,
    pub kind: ChangeKind,
}

/// The root entity plus its pending change queue.
#[derive(Debug)]
pub struct EntityDocument {
    root: Entity,
    pending: Vec<AttributeChange>,
}

impl EntityDocument {
    pub fn new(root: Entity) -> Self {
        Self {
            root,
            pending: Vec::new(),
        }
    }

    pub fn root(&self) -> &Entity {
        &self.root
    }

    pub fn entity_id(&self) -> &str {
        &self.root.id
    }

    pub fn snapshot(&self) -> Result<String, ModelError> {
        self.root.to_snapshot()
    }

    /// Drain the queued change records.
    pub fn take_changes(&mut self) -> Vec<AttributeChange> {
        std::mem::take(&mut self.pending)
    }

    fn record(&mut self, path: AttributePath, kind: ChangeKind) {
        self.pending.push(AttributeChange { path, kind });
    }

    fn split_target<'a>(
        root: &'a mut Entity,
        path: &AttributePath,
    ) -> Result<(&'a mut Entity, String, usize), ModelError> {
        let segments = path.segments();
        let (last, prefix) = segments
            .split_last()
            .ok_or_else(|| ModelError::UnknownAttribute(path.encode()))?;
        let parent = root.entity_at_mut(prefix)?;
        Ok((parent, last.name.clone(), last.index))
    }

    /// Overwrite the text value addressed by `path`.
    pub fn set_text(&mut self, path: &AttributePath, text: impl Into<String>) -> Result<(), ModelError> {
        let (parent, name, index) = Self::split_target(&mut self.root, path)?;
        parent.set_text(&name, index, text)?;
        self.record(path.clone(), ChangeKind::Value);
        Ok(())
    }

    /// Insert `value` at the index carried by the final path segment.
    pub fn insert_value(&mut self, path: &AttributePath, value: Value) -> Result<(), ModelError> {
        let (parent, name, index) = Self::split_target(&mut self.root, path)?;
        parent.insert_value(&name, index, value)?;
        self.record(path.clone(), ChangeKind::Add);
        Ok(())
    }

    /// Remove the value addressed by `path`.
    pub fn remove_value(&mut self, path: &AttributePath) -> Result<Value, ModelError> {
        let (parent, name, index) = Self::split_target(&mut self.root, path)?;
        let value = parent.remove_value(&name, index)?;
        self.record(path.clone(), ChangeKind::Remove);
        Ok(value)
    }

    /// Remove the attribute named by the final path segment entirely.
    pub fn remove_attribute(&mut self, path: &AttributePath) -> Result<(), ModelError> {
        let (parent, name, _) = Self::split_target(&mut self.root, path)?;
        parent.remove_attribute(&name)?;
        self.record(path.clone(), ChangeKind::Remove);
        Ok(())
    }

    /// Relocate a value of the attribute named by the final path segment.
    pub fn move_value(
        &mut self,
        path: &AttributePath,
        from: usize,
        to: usize,
    ) -> Result<(), ModelError> {
        let (parent, name, _) = Self::split_target(&mut self.root, path)?;
        parent.move_value(&name, from, to)?;
        self.record(path.clone(), ChangeKind::Sort);
        Ok(())
    }

    /// Swap the active alternative inside a choice slot: `slot_path` addresses
    /// the nested choice entity, `retired` is the previously selected
    /// alternative (if any), and `value` becomes the sole value of
    /// `alternative`. Recorded as a single `Choice` change.
    pub fn select_choice(
        &mut self,
        slot_path: &AttributePath,
        retired: Option<&str>,
        alternative: &str,
        value: Value,
    ) -> Result<(), ModelError> {
        let slot = self.root.entity_at_mut(slot_path.segments())?;
        if let Some(old) = retired {
            slot.remove_attribute(old)?;
        }
        slot.insert_value(alternative, 0, value)?;
        self.record(slot_path.clone(), ChangeKind::Choice);
        Ok(())
    }

    /// Replace the whole root entity. Used by undo/redo reconciliation;
    /// intentionally emits no change record.
    pub fn replace_root(&mut self, root: Entity) {
        self.root = root;
        self.pending.clear();
    }
}
