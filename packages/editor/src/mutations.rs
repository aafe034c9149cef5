//! # Slot Mutations
//!
//! Semantic editing operations on one attribute of one entity instance. Every
//! mutation applies in a fixed order: entity model first, handler-tree slots
//! second, slot-view binding last. All three complete within the call, so no
//! partially applied state is observable between them.
//!
//! ## Mutation Semantics
//!
//! ### AddValue
//! - Appends when the reference slot is the last sibling, otherwise inserts
//!   immediately after it
//! - Mints a default value: configured default text, or an empty entity
//! - Reuses the reference slot view in place when it is valued-but-empty
//!
//! ### Move / MoveUp / MoveDown
//! - Remove-then-reinsert relocation; boundary moves are no-ops, not errors
//!
//! ### RemoveValue
//! - The sole value of a single-valued attribute removes the attribute
//!   entirely and clears the slot display in place
//! - Any other value removes value and slot together
//!
//! ### SelectChoice
//! - Swaps the active alternative attribute inside a choice slot

use crate::binding::SlotBinding;
use crate::handlers::{populate_entity_slot, HandlerTree, TreeError, CHOICE_ATTRIBUTE};
use crate::service::AttributeConfig;
use facet_model::{AttributePath, Entity, EntityDocument, ModelError, Schema, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Add a default value next to the reference slot named by the final
    /// path segment (attribute name + reference index).
    AddValue { path: AttributePath },

    /// Overwrite the simple value addressed by the path.
    ChangeValue { path: AttributePath, text: String },

    /// Relocate a value of the attribute named by the final path segment.
    Move {
        path: AttributePath,
        from: usize,
        to: usize,
    },

    /// Move the value at `index` one position toward the front.
    MoveUp { path: AttributePath, index: usize },

    /// Move the value at `index` one position toward the back.
    MoveDown { path: AttributePath, index: usize },

    /// Remove the value addressed by the path.
    RemoveValue { path: AttributePath },

    /// Select a different alternative inside the choice slot addressed by
    /// the path (final segment = choice attribute + slot index).
    SelectChoice {
        path: AttributePath,
        alternative: String,
    },
}

#[derive(Error, Debug)]
pub enum MutationError {
    #[error("No handler registered for path '{0}'")]
    Unresolved(String),

    #[error("Attribute '{0}' does not hold simple values")]
    NotSimple(String),

    #[error("Attribute '{0}' is not a choice")]
    NotChoice(String),

    #[error("Type '{type_name}' declares no alternative '{alternative}'")]
    UnknownAlternative {
        type_name: String,
        alternative: String,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Handler tree error: {0}")]
    Tree(#[from] TreeError),
}

/// Mints ids for entities created by [`Mutation::AddValue`] and
/// [`Mutation::SelectChoice`].
#[derive(Debug)]
pub struct IdMint {
    prefix: String,
    next: u64,
}

impl IdMint {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn mint(&mut self) -> String {
        self.next += 1;
        format!("{}-new-{}", self.prefix, self.next)
    }
}

/// Everything a mutation touches, borrowed from the session for one call.
pub(crate) struct EditContext<'a> {
    pub document: &'a mut EntityDocument,
    pub schema: &'a Schema,
    pub config: &'a AttributeConfig,
    pub tree: &'a mut HandlerTree,
    pub binding: &'a mut dyn SlotBinding,
    pub ids: &'a mut IdMint,
}

impl Mutation {
    pub(crate) fn apply(&self, ctx: &mut EditContext<'_>) -> Result<(), MutationError> {
        debug!(mutation = ?self, "applying mutation");
        match self {
            Mutation::AddValue { path } => apply_add(ctx, path),
            Mutation::ChangeValue { path, text } => apply_change(ctx, path, text),
            Mutation::Move { path, from, to } => apply_move(ctx, path, *from, *to),
            Mutation::MoveUp { path, index } => {
                if *index == 0 {
                    return Ok(());
                }
                apply_move(ctx, path, *index, *index - 1)
            }
            Mutation::MoveDown { path, index } => {
                let (name, _) = target_of(path)?;
                let owner = owner_entity(ctx, path)?;
                let count = owner.value_count(&name);
                if *index + 1 >= count {
                    return Ok(());
                }
                apply_move(ctx, path, *index, *index + 1)
            }
            Mutation::RemoveValue { path } => apply_remove(ctx, path),
            Mutation::SelectChoice { path, alternative } => {
                apply_select_choice(ctx, path, alternative)
            }
        }
    }
}

/// Final segment of a mutation target path.
fn target_of(path: &AttributePath) -> Result<(String, usize), MutationError> {
    path.last()
        .map(|seg| (seg.name.clone(), seg.index))
        .ok_or_else(|| MutationError::Unresolved(path.encode()))
}

/// Canonical attribute path for binding events: prefix plus the attribute
/// name at index 0.
fn attribute_path_of(path: &AttributePath) -> Result<AttributePath, MutationError> {
    let (name, _) = target_of(path)?;
    Ok(path.parent().child(name, 0))
}

fn owner_entity<'a>(
    ctx: &'a EditContext<'_>,
    path: &AttributePath,
) -> Result<&'a Entity, MutationError> {
    let prefix = path.parent();
    ctx.document
        .root()
        .entity_at(prefix.segments())
        .ok_or_else(|| MutationError::Unresolved(path.encode()))
}

fn apply_add(ctx: &mut EditContext<'_>, path: &AttributePath) -> Result<(), MutationError> {
    let (name, ref_index) = target_of(path)?;
    let event_path = attribute_path_of(path)?;
    let handler = ctx
        .tree
        .resolve(&event_path)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    let decl = handler.decl().clone();
    let simple = handler.is_simple();

    let owner = owner_entity(ctx, path)?;
    let present = owner.has_attribute(&name);
    let count = owner.value_count(&name);
    let insert_index = if !present {
        0
    } else if ref_index + 1 >= count {
        count
    } else {
        ref_index + 1
    };
    // Reference slot reused in place when it shows no value yet.
    let reuse = !present
        || owner
            .values(&name)
            .and_then(|v| v.get(ref_index))
            .is_some_and(Value::is_empty_text);

    let new_entity = if simple {
        None
    } else {
        Some(Entity::new(ctx.ids.mint(), &decl.value_type))
    };
    let value = match &new_entity {
        Some(entity) => Value::Entity(entity.clone()),
        None => Value::Text(ctx.config.default_text.clone()),
    };

    // (a) entity model
    let prefix = path.parent();
    ctx.document
        .insert_value(&prefix.child(&name, insert_index), value)?;

    // (b) handler tree
    if let Some(entity) = &new_entity {
        let handler = ctx
            .tree
            .resolve_mut(&event_path)
            .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
        let choice = handler.is_choice();
        let children = handler
            .children_mut()
            .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
        children.insert_slot(insert_index)?;
        let slot_base = prefix.child(&name, insert_index);
        populate_entity_slot(children, insert_index, &slot_base, entity, ctx.schema, choice)?;
        children.restamp(&prefix, &name);
    }

    // (c) slot views
    ctx.binding.slot_inserted(&event_path, insert_index, reuse);
    Ok(())
}

fn apply_change(
    ctx: &mut EditContext<'_>,
    path: &AttributePath,
    text: &str,
) -> Result<(), MutationError> {
    let (name, index) = target_of(path)?;
    let event_path = attribute_path_of(path)?;
    let handler = ctx
        .tree
        .resolve(&event_path)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    if !handler.is_simple() {
        return Err(MutationError::NotSimple(name));
    }

    ctx.document.set_text(path, text)?;
    ctx.binding.value_changed(&event_path, index, text);
    Ok(())
}

fn apply_move(
    ctx: &mut EditContext<'_>,
    path: &AttributePath,
    from: usize,
    to: usize,
) -> Result<(), MutationError> {
    if from == to {
        return Ok(());
    }
    let (name, _) = target_of(path)?;
    let event_path = attribute_path_of(path)?;
    let simple = ctx
        .tree
        .resolve(&event_path)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?
        .is_simple();

    let prefix = path.parent();
    ctx.document.move_value(path, from, to)?;

    if !simple {
        let handler = ctx
            .tree
            .resolve_mut(&event_path)
            .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
        let children = handler
            .children_mut()
            .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
        children.move_slot(from, to)?;
        children.restamp(&prefix, &name);
    }

    ctx.binding.slots_moved(&event_path, from, to);
    Ok(())
}

fn apply_remove(ctx: &mut EditContext<'_>, path: &AttributePath) -> Result<(), MutationError> {
    let (name, index) = target_of(path)?;
    let event_path = attribute_path_of(path)?;
    let handler = ctx
        .tree
        .resolve(&event_path)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    let decl = handler.decl().clone();
    let simple = handler.is_simple();

    let owner = owner_entity(ctx, path)?;
    let count = owner.value_count(&name);
    let prefix = path.parent();

    if count == 1 && decl.is_single_valued() {
        // Sole value of a single-valued attribute: the attribute goes away
        // entirely and the slot keeps its row with a cleared display.
        ctx.document.remove_attribute(path)?;
        if !simple {
            if let Some(children) = ctx
                .tree
                .resolve_mut(&event_path)
                .and_then(|h| h.children_mut())
            {
                children.remove_slot(0);
            }
        }
        ctx.binding.value_cleared(&event_path);
        return Ok(());
    }

    ctx.document.remove_value(path)?;
    if !simple {
        if let Some(children) = ctx
            .tree
            .resolve_mut(&event_path)
            .and_then(|h| h.children_mut())
        {
            children.remove_slot(index);
            children.restamp(&prefix, &name);
        }
    }
    ctx.binding.slot_removed(&event_path, index);
    Ok(())
}

fn apply_select_choice(
    ctx: &mut EditContext<'_>,
    path: &AttributePath,
    alternative: &str,
) -> Result<(), MutationError> {
    let (name, slot_index) = target_of(path)?;
    let event_path = attribute_path_of(path)?;
    let handler = ctx
        .tree
        .resolve(&event_path)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    if !handler.is_choice() {
        return Err(MutationError::NotChoice(name));
    }

    let slot_entity = ctx
        .document
        .root()
        .value_at(path)
        .and_then(Value::as_entity)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    let slot_entity_id = slot_entity.id.clone();
    let slot_type = slot_entity.type_name.clone();
    let active = slot_entity.attributes().first().map(|a| a.name.clone());
    if active.as_deref() == Some(alternative) {
        return Ok(());
    }

    let alt_decl = ctx
        .schema
        .attribute(&slot_type, alternative)
        .ok_or_else(|| MutationError::UnknownAlternative {
            type_name: slot_type.clone(),
            alternative: alternative.to_string(),
        })?
        .clone();
    let alt_simple = ctx.schema.is_simple(&alt_decl.value_type);

    let minted = if alt_simple {
        None
    } else {
        Some(Entity::new(ctx.ids.mint(), &alt_decl.value_type))
    };
    let value = match &minted {
        Some(entity) => Value::Entity(entity.clone()),
        None => Value::Text(ctx.config.default_text.clone()),
    };

    // (a) entity model
    ctx.document
        .select_choice(path, active.as_deref(), alternative, value)?;

    // (b) handler tree: swap the handler registered under the choice marker
    let slot_base = path.parent().child(&name, slot_index);
    let mut replacement = crate::handlers::AttributeHandler::new(
        &slot_entity_id,
        alternative,
        alt_decl,
        alt_simple,
    );
    if let Some(entity) = &minted {
        let mut grandchildren = HandlerTree::new();
        grandchildren.insert_slot(0)?;
        let child_base = slot_base.child(alternative, 0);
        populate_entity_slot(&mut grandchildren, 0, &child_base, entity, ctx.schema, false)?;
        replacement.children = Some(grandchildren);
    } else if !alt_simple {
        replacement.children = Some(HandlerTree::new());
    }
    let choice_handler = ctx
        .tree
        .resolve_mut(&event_path)
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    let children = choice_handler
        .children_mut()
        .ok_or_else(|| MutationError::Unresolved(path.encode()))?;
    children.remove_handler(slot_index, CHOICE_ATTRIBUTE);
    children.set_handler(
        slot_index,
        CHOICE_ATTRIBUTE,
        replacement,
        slot_base.child(alternative, 0),
    )?;

    // (c) slot views
    ctx.binding.choice_changed(&event_path, slot_index, alternative);
    Ok(())
}
