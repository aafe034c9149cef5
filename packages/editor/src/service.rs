//! # Content Service Interface
//!
//! The transport used to load, validate, and save entities is a caller
//! concern. The core consumes it through [`ContentService`]; failures come
//! back as [`ServiceError`] and are never retried here.

use crate::validation::ValidationReport;
use facet_model::{Entity, Schema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Per-form configuration delivered with the content definition. Widget
/// bindings, labels, and help texts stay with the hosting shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeConfig {
    /// Default text for freshly added simple values.
    pub default_text: String,

    /// Debounce delay before a change triggers validation.
    pub debounce_ms: u64,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            default_text: String::new(),
            debounce_ms: crate::validation::VALIDATION_DEBOUNCE_MS,
        }
    }
}

/// Everything needed to seed an editing session, loaded once by entity id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDefinition {
    pub entity: Entity,
    pub schema: Schema,
    pub config: AttributeConfig,
    pub locale: String,
}

/// One serialized entity in a validate/save payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedEntity {
    pub id: String,
    pub body: String,
}

/// Abstract load/validate/save backend.
pub trait ContentService {
    fn load(&mut self, entity_id: &str) -> Result<ContentDefinition, ServiceError>;

    fn validate(&mut self, entities: &[SerializedEntity]) -> Result<ValidationReport, ServiceError>;

    /// An empty report means the save succeeded with no errors.
    fn save(&mut self, entities: &[SerializedEntity]) -> Result<ValidationReport, ServiceError>;
}
