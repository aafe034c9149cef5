//! # Handler Tree
//!
//! The recursive registry binding the entity graph to editing slots. A tree
//! holds one slot map per sibling entity index at its nesting level; each slot
//! map associates an attribute name with the [`AttributeHandler`] owning that
//! attribute of that entity instance. Handlers for complex attributes own a
//! child tree with one slot map per nested value.
//!
//! Invariant: after every mutation, a complex handler's child slot count
//! equals its live value count.
//!
//! Choice pseudo-attributes are absorbed here so the path codec stays ignorant
//! of them: inside a choice slot, the active alternative's handler is
//! registered under the reserved [`CHOICE_ATTRIBUTE`] marker, and path
//! resolution substitutes the marker for whatever name follows a choice
//! segment.

use facet_model::{AttributeDecl, AttributePath, Entity, Schema, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Reserved slot-map key for the active alternative inside a choice slot.
pub const CHOICE_ATTRIBUTE: &str = "@choice";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Inserting past the end means the view and model have desynchronized.
    /// Not user-recoverable.
    #[error("Slot index {index} out of bounds (size {size})")]
    SlotIndexOutOfBounds { index: usize, size: usize },

    #[error("Handler for '{name}' already registered in slot {index}")]
    DuplicateHandler { name: String, index: usize },
}

/// Mutation-capable controller for one attribute of one entity instance.
#[derive(Debug)]
pub struct AttributeHandler {
    entity_id: String,
    attribute: String,
    decl: AttributeDecl,
    simple: bool,
    /// Full path from the root, stamped at registration. This is the cheap
    /// parent back-reference: lookup only, never an owning pointer back up.
    path: AttributePath,
    /// Child tree for complex attributes, one slot map per value index.
    pub(crate) children: Option<HandlerTree>,
}

impl AttributeHandler {
    pub fn new(
        entity_id: impl Into<String>,
        attribute: impl Into<String>,
        decl: AttributeDecl,
        simple: bool,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            attribute: attribute.into(),
            decl,
            simple,
            path: AttributePath::root(),
            children: None,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The real attribute name, even when registered under the choice marker.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn decl(&self) -> &AttributeDecl {
        &self.decl
    }

    pub fn is_simple(&self) -> bool {
        self.simple
    }

    pub fn is_choice(&self) -> bool {
        self.decl.choice
    }

    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn children(&self) -> Option<&HandlerTree> {
        self.children.as_ref()
    }

    pub fn children_mut(&mut self) -> Option<&mut HandlerTree> {
        self.children.as_mut()
    }

    /// Button visibility for this attribute given its owning entity's state.
    pub fn controls(&self, owner: &Entity) -> SlotControls {
        SlotControls::derive(
            &self.decl,
            owner.has_attribute(&self.attribute),
            owner.value_count(&self.attribute),
        )
    }
}

/// Which editing buttons a slot shows, derived purely from value count vs.
/// declared occurrence bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotControls {
    pub may_add: bool,
    pub may_remove: bool,
    pub may_sort: bool,
}

impl SlotControls {
    pub fn derive(decl: &AttributeDecl, present: bool, count: usize) -> Self {
        let variable = decl.max.map_or(true, |max| max > decl.min);
        let under_max = decl.max.map_or(true, |max| count < max);
        Self {
            may_add: variable && (!present || under_max),
            may_remove: variable && count > decl.min,
            may_sort: count > 1,
        }
    }
}

pub(crate) type SlotMap = HashMap<String, AttributeHandler>;

/// Ordered slot maps, one per sibling entity index at this nesting level.
#[derive(Debug, Default)]
pub struct HandlerTree {
    slots: Vec<SlotMap>,
}

impl HandlerTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert an empty slot map at `index`. Hard failure past the end.
    pub fn insert_slot(&mut self, index: usize) -> Result<(), TreeError> {
        if index > self.slots.len() {
            return Err(TreeError::SlotIndexOutOfBounds {
                index,
                size: self.slots.len(),
            });
        }
        self.slots.insert(index, SlotMap::new());
        Ok(())
    }

    /// Remove the slot map at `index`. Tolerant: out of range is a no-op.
    pub fn remove_slot(&mut self, index: usize) {
        if index < self.slots.len() {
            self.slots.remove(index);
        }
    }

    /// Relocate the slot map at `from` to `to`, carrying its handlers along.
    pub fn move_slot(&mut self, from: usize, to: usize) -> Result<(), TreeError> {
        let size = self.slots.len();
        if from >= size || to >= size {
            return Err(TreeError::SlotIndexOutOfBounds {
                index: from.max(to),
                size,
            });
        }
        let map = self.slots.remove(from);
        self.slots.insert(to, map);
        Ok(())
    }

    pub fn handler(&self, index: usize, name: &str) -> Option<&AttributeHandler> {
        self.slots.get(index)?.get(name)
    }

    pub fn handler_mut(&mut self, index: usize, name: &str) -> Option<&mut AttributeHandler> {
        self.slots.get_mut(index)?.get_mut(name)
    }

    /// Register a handler under `name` in slot `index`, stamping its full
    /// path. Double registration is a hard failure.
    pub fn set_handler(
        &mut self,
        index: usize,
        name: &str,
        mut handler: AttributeHandler,
        path: AttributePath,
    ) -> Result<(), TreeError> {
        let size = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(TreeError::SlotIndexOutOfBounds { index, size })?;
        if slot.contains_key(name) {
            return Err(TreeError::DuplicateHandler {
                name: name.to_string(),
                index,
            });
        }
        handler.path = path;
        slot.insert(name.to_string(), handler);
        Ok(())
    }

    /// Unregister a handler. Tolerant like [`HandlerTree::remove_slot`].
    pub fn remove_handler(&mut self, index: usize, name: &str) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.remove(name);
        }
    }

    /// Re-stamp the paths of every handler in this child tree after a slot
    /// insert/remove/move shifted sibling indices. `owner_prefix` is the path
    /// of the entity owning `attribute`, whose values this tree mirrors.
    pub(crate) fn restamp(&mut self, owner_prefix: &AttributePath, attribute: &str) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let slot_base = owner_prefix.child(attribute, i);
            for handler in slot.values_mut() {
                handler.path = slot_base.child(&handler.attribute, 0);
                if let Some(children) = handler.children.as_mut() {
                    let attr = handler.attribute.clone();
                    children.restamp(&slot_base, &attr);
                }
            }
        }
    }

    /// Walk a path root-to-leaf to the handler owning its final segment.
    /// Descending through a choice attribute substitutes the reserved marker
    /// for the next segment's name.
    pub fn resolve(&self, path: &AttributePath) -> Option<&AttributeHandler> {
        let segments = path.segments();
        let mut tree = self;
        let mut slot = 0usize;
        let mut choice_next = false;
        for (pos, seg) in segments.iter().enumerate() {
            let lookup: &str = if choice_next { CHOICE_ATTRIBUTE } else { &seg.name };
            let handler = tree.handler(slot, lookup)?;
            if pos + 1 == segments.len() {
                return Some(handler);
            }
            choice_next = handler.is_choice();
            tree = handler.children.as_ref()?;
            slot = seg.index;
        }
        None
    }

    /// Mutable variant of [`HandlerTree::resolve`].
    pub fn resolve_mut(&mut self, path: &AttributePath) -> Option<&mut AttributeHandler> {
        let segments = path.segments();
        let mut tree = self;
        let mut slot = 0usize;
        let mut choice_next = false;
        for (pos, seg) in segments.iter().enumerate() {
            let lookup: &str = if choice_next { CHOICE_ATTRIBUTE } else { &seg.name };
            let handler = tree.handler_mut(slot, lookup)?;
            if pos + 1 == segments.len() {
                return Some(handler);
            }
            choice_next = handler.is_choice();
            tree = handler.children.as_mut()?;
            slot = seg.index;
        }
        None
    }
}

/// Build the full handler tree for a root entity. Used at session open and on
/// full re-render reconciliation.
pub fn build_tree(root: &Entity, schema: &Schema) -> Result<HandlerTree, TreeError> {
    let mut tree = HandlerTree::new();
    tree.insert_slot(0)?;
    populate_entity_slot(&mut tree, 0, &AttributePath::root(), root, schema, false)?;
    Ok(tree)
}

/// Create and register handlers for `entity`'s attributes in slot `slot` of
/// `tree`, recursing into nested complex values. Inside a choice slot
/// (`under_choice`), only present attributes are registered, under the
/// reserved marker.
pub(crate) fn populate_entity_slot(
    tree: &mut HandlerTree,
    slot: usize,
    base: &AttributePath,
    entity: &Entity,
    schema: &Schema,
    under_choice: bool,
) -> Result<(), TreeError> {
    for (name, decl) in declared_attributes(entity, schema, under_choice) {
        let simple = schema.is_simple(&decl.value_type);
        let mut handler = AttributeHandler::new(&entity.id, &name, decl.clone(), simple);

        if !simple {
            let mut children = HandlerTree::new();
            if let Some(values) = entity.values(&name) {
                for (i, value) in values.iter().enumerate() {
                    children.insert_slot(i)?;
                    if let Value::Entity(nested) = value {
                        let child_base = base.child(&name, i);
                        populate_entity_slot(
                            &mut children,
                            i,
                            &child_base,
                            nested,
                            schema,
                            decl.choice,
                        )?;
                    }
                }
            }
            handler.children = Some(children);
        }

        let registered = if under_choice { CHOICE_ATTRIBUTE } else { name.as_str() };
        tree.set_handler(slot, registered, handler, base.child(&name, 0))?;
    }
    Ok(())
}

/// Attribute declarations to materialize handlers for: every declared
/// attribute of the entity's type (absent ones get placeholder slots), or
/// only the present alternatives inside a choice slot. Unknown types yield
/// nothing.
fn declared_attributes(
    entity: &Entity,
    schema: &Schema,
    under_choice: bool,
) -> Vec<(String, AttributeDecl)> {
    if under_choice {
        entity
            .attributes()
            .iter()
            .filter_map(|a| {
                schema
                    .attribute(&entity.type_name, &a.name)
                    .map(|d| (a.name.clone(), d.clone()))
            })
            .collect()
    } else {
        schema
            .type_def(&entity.type_name)
            .map(|def| def.attributes.clone())
            .unwrap_or_default()
    }
}
