//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] facet_model::ModelError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Handler tree error: {0}")]
    Tree(#[from] crate::handlers::TreeError),

    #[error("Service error: {0}")]
    Service(#[from] crate::service::ServiceError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Session is closed")]
    SessionClosed,
}
