//! # Drag Reorder
//!
//! Turns drag-start/drop gestures into [`Mutation::Move`] parameters. The
//! controller never touches the model itself; it only computes the source and
//! target indices. Gesture participants carry a [`DragRole`] resolved once at
//! construction, so no per-event type inspection happens.
//!
//! Drop placeholders are numbered by insertion position: dropping at
//! position `j` means "insert before the value currently at `j`". Because the
//! dragged value is removed before reinsertion, a target past the source is
//! decremented by one.
//!
//! [`Mutation::Move`]: crate::Mutation

use facet_model::AttributePath;

/// Role of a gesture participant, assigned when its widget is built.
#[derive(Debug, Clone, PartialEq)]
pub enum DragRole {
    /// A draggable value row of an attribute.
    ValueRow {
        attribute: AttributePath,
        index: usize,
    },

    /// A drop position between value rows of an attribute.
    DropTarget {
        attribute: AttributePath,
        position: usize,
    },

    /// Any other widget; drags neither start nor end here.
    Inert,
}

/// A computed relocation, ready to feed into the move mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderMove {
    pub attribute: AttributePath,
    pub from: usize,
    pub to: usize,
}

/// Tracks one drag gesture at a time.
#[derive(Debug, Default)]
pub struct DragReorder {
    source: Option<(AttributePath, usize)>,
}

impl DragReorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a gesture. Only value rows are draggable; anything else leaves
    /// the controller idle and returns false.
    pub fn start(&mut self, role: &DragRole) -> bool {
        match role {
            DragRole::ValueRow { attribute, index } => {
                self.source = Some((attribute.clone(), *index));
                true
            }
            _ => {
                self.source = None;
                false
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the placeholder marker at `position` should be drawn. The two
    /// positions adjacent to the source are suppressed; dropping there is a
    /// no-op and the marker would only flicker.
    pub fn placeholder_visible(&self, attribute: &AttributePath, position: usize) -> bool {
        match &self.source {
            Some((src_attr, src)) if src_attr == attribute => {
                position != *src && position != *src + 1
            }
            _ => true,
        }
    }

    /// End the gesture on `role`. Returns the move to perform, or `None` for
    /// drops on foreign targets, non-targets, and no-op positions.
    pub fn drop_on(&mut self, role: &DragRole) -> Option<ReorderMove> {
        let (src_attr, from) = self.source.take()?;
        match role {
            DragRole::DropTarget {
                attribute,
                position,
            } if *attribute == src_attr => {
                // The source is removed before reinsertion, shifting later
                // indices down by one.
                let to = if *position > from {
                    *position - 1
                } else {
                    *position
                };
                if to == from {
                    None
                } else {
                    Some(ReorderMove {
                        attribute: src_attr,
                        from,
                        to,
                    })
                }
            }
            _ => None,
        }
    }

    /// Abort the gesture; no move is produced.
    pub fn cancel(&mut self) {
        self.source = None;
    }
}
