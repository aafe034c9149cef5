//! Error types for the model crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Value index {index} out of range for attribute '{attribute}'")]
    IndexOutOfRange { attribute: String, index: usize },

    #[error("Attribute '{0}' does not hold text values")]
    NotText(String),

    #[error("Path does not resolve to an entity: {0}")]
    NotAnEntity(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
