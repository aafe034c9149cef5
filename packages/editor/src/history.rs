//! # Undo/Redo History
//!
//! Linear history over whole-entity snapshots. Each record carries the
//! serialized root entity, the path of the edit that produced it, and the
//! change kind. Recording diff-checks against the current snapshot, so no-op
//! mutations never pollute the stacks; any real change clears the redo stack.
//!
//! The engine only manages the stacks. Reconciling the live entity and view
//! tree to a restored snapshot is the session's job, driven by the
//! [`HistoryStep`] this module hands back.

use facet_model::{AttributePath, ChangeKind};

/// One undo/redo unit: a full snapshot plus where and how the most recent
/// edit happened. Immutable once pushed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub snapshot: String,
    pub path: AttributePath,
    /// `None` only for the seed record taken when editing begins.
    pub kind: Option<ChangeKind>,
}

/// Outcome of an undo or redo: the record describing the transition and the
/// snapshot the live entity must be reconciled to.
#[derive(Debug, Clone)]
pub struct HistoryStep {
    pub change: ChangeRecord,
    pub snapshot: String,
}

#[derive(Debug)]
pub struct History {
    undo: Vec<ChangeRecord>,
    redo: Vec<ChangeRecord>,
    current: ChangeRecord,
    max_depth: usize,
}

impl History {
    /// Seed with the snapshot taken at the moment editing begins.
    pub fn seed(snapshot: String) -> Self {
        Self::with_max_depth(snapshot, 100)
    }

    pub fn with_max_depth(snapshot: String, max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            current: ChangeRecord {
                snapshot,
                path: AttributePath::root(),
                kind: None,
            },
            max_depth,
        }
    }

    /// Record an observed change. Pushes a new state only when the snapshot
    /// actually differs from the current one; returns whether it did.
    pub fn record(&mut self, snapshot: String, path: AttributePath, kind: ChangeKind) -> bool {
        if snapshot == self.current.snapshot {
            return false;
        }
        let prior = std::mem::replace(
            &mut self.current,
            ChangeRecord {
                snapshot,
                path,
                kind: Some(kind),
            },
        );
        self.undo.push(prior);
        if self.max_depth > 0 && self.undo.len() > self.max_depth {
            self.undo.remove(0);
        }
        self.redo.clear();
        true
    }

    /// Step back. The returned record is the edit being reverted; the
    /// returned snapshot is the state to restore.
    pub fn undo(&mut self) -> Option<HistoryStep> {
        let prior = self.undo.pop()?;
        let snapshot = prior.snapshot.clone();
        let departing = std::mem::replace(&mut self.current, prior);
        self.redo.push(departing.clone());
        Some(HistoryStep {
            change: departing,
            snapshot,
        })
    }

    /// Step forward again. The returned record is the edit being reapplied,
    /// which also carries the snapshot to restore.
    pub fn redo(&mut self) -> Option<HistoryStep> {
        let next = self.redo.pop()?;
        let departing = std::mem::replace(&mut self.current, next.clone());
        self.undo.push(departing);
        Some(HistoryStep {
            snapshot: next.snapshot.clone(),
            change: next,
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn current(&self) -> &ChangeRecord {
        &self.current
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
