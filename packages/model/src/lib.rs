//! # Facet Model
//!
//! Entity data graph for the Facet structural content editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: typed entity graph + schema          │
//! │  - Entities with ordered attribute values   │
//! │  - Occurrence-bounded attribute declarations│
//! │  - Path codec (name[index] segments)        │
//! │  - Change-notification document wrapper     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: handler tree + mutations + history  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Data layer is policy-free**: occurrence bounds are declared here but
//!    enforced by the editing layer
//! 2. **Ordered everywhere**: attribute order and value order are part of the
//!    data, so serialization is deterministic and snapshots can be diffed
//!    by string comparison
//! 3. **Explicit change flow**: mutations go through [`EntityDocument`], which
//!    queues change records instead of broadcasting on an ambient bus

mod document;
mod entity;
mod errors;
mod path;
mod schema;

pub use document::{AttributeChange, ChangeKind, EntityDocument};
pub use entity::{Attribute, Entity, Value};
pub use errors::ModelError;
pub use path::{AttributePath, PathError, PathSegment};
pub use schema::{AttributeDecl, Schema, TypeDef};
