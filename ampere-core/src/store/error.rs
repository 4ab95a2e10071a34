use thiserror::Error;

use crate::validation::ValidationErrors;

/// Why a store refused a mutation. Storage failures are not in here: they
/// are logged and the in-memory state stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("cannot move {kind} {number} from {from} to {to}")]
    IllegalTransition {
        kind: &'static str,
        number: String,
        from: String,
        to: String,
    },

    #[error("catalog item {id} is a default item and cannot be deleted")]
    DefaultItem { id: String },
}

impl StoreError {
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            StoreError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
