use thiserror::Error;

use super::types::ResolutionTier;
use crate::error_codes::*;
use crate::store::{AssetPath, ObjectRef, StoreError};

#[derive(Debug, Error)]
pub enum DeepCopyError {
    /// The copy's sub-objects do not mirror the source, so the reference cannot be
    /// matched uniquely. Copies already made stay on disk.
    #[error("Structural divergence in {file}: {target} ({type_name} '{name}') matched {matches} candidate(s) by {tier}")]
    StructuralDivergence {
        file: AssetPath,
        target: ObjectRef,
        type_name: String,
        name: String,
        tier: ResolutionTier,
        matches: usize,
    },

    #[error("Nothing selected")]
    SelectionEmpty,

    #[error("Selected path is not in the store: {0}")]
    NotInStore(AssetPath),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DeepCopyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StructuralDivergence { .. } => ERR_STRUCTURAL_DIVERGENCE,
            Self::SelectionEmpty => ERR_SELECTION_EMPTY,
            Self::NotInStore(_) => ERR_NOT_IN_STORE,
            Self::InvalidInput(_) => ERR_INVALID_INPUT,
            Self::Store(_) => ERR_STORE,
        }
    }

    pub fn is_structural_divergence(&self) -> bool {
        matches!(self, Self::StructuralDivergence { .. })
    }
}
