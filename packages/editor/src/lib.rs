//! # Facet Editor
//!
//! Core editing engine for Facet structural content forms.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: entity graph + schema + paths        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session + handler tree + mutations  │
//! │  - Path-addressable handler tree            │
//! │  - Add/change/move/remove/choice mutations  │
//! │  - Drag-reorder index computation           │
//! │  - Snapshot-based undo/redo                 │
//! │  - Debounced validation routing             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host shell: slot rendering + transport      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Three structures in lockstep**: the entity graph, the handler tree,
//!    and the slot views update together within every mutation, in that
//!    order, with no partial state observable in between
//! 2. **Slot order mirrors value order**: always, after every operation
//! 3. **Snapshots, not inverse operations**: undo/redo diffs whole-entity
//!    serializations and reconciles the live tree to the restored state
//! 4. **Rendering stays outside**: the host implements [`SlotBinding`];
//!    transport is an abstract [`ContentService`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use facet_editor::{EditorSession, Mutation};
//! use facet_model::AttributePath;
//!
//! let definition = service.load("article-42")?;
//! let mut session = EditorSession::open(definition, Box::new(binding))?;
//!
//! session.apply(
//!     Mutation::ChangeValue {
//!         path: AttributePath::decode("title"),
//!         text: "Hello".into(),
//!     },
//!     now_ms,
//! )?;
//!
//! // host event loop
//! if let Some(request) = session.tick(now_ms)? {
//!     let report = service.validate(&request.entities)?;
//!     session.apply_validation(&report);
//! }
//! ```

mod binding;
mod errors;
mod handlers;
mod history;
mod mutations;
mod reorder;
mod service;
mod session;
mod validation;

pub use binding::{RecordingBinding, SlotBinding, SlotEvent};
pub use errors::EditorError;
pub use handlers::{
    build_tree, AttributeHandler, HandlerTree, SlotControls, TreeError, CHOICE_ATTRIBUTE,
};
pub use history::{ChangeRecord, History, HistoryStep};
pub use mutations::{IdMint, Mutation, MutationError};
pub use reorder::{DragReorder, DragRole, ReorderMove};
pub use service::{
    AttributeConfig, ContentDefinition, ContentService, SerializedEntity, ServiceError,
};
pub use session::EditorSession;
pub use validation::{
    ValidationReport, ValidationRequest, ValidationScheduler, VALIDATION_DEBOUNCE_MS,
};

// Re-export common model types for convenience
pub use facet_model::{
    AttributeChange, AttributeDecl, AttributePath, ChangeKind, Entity, EntityDocument, PathSegment,
    Schema, TypeDef, Value,
};
