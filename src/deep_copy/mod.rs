//! Deep duplication: copy a selection of folders and files, then point every
//! reference inside the copies that targeted the selection at the matching copy.
//!
//! Stages run strictly in order: classify, duplicate, resync, walk and resolve,
//! commit. Resolution only stages writes; nothing is rewritten until every file has
//! been walked.

pub mod classify;
pub mod destination;
pub mod duplicate;
pub mod engine;
pub mod error;
pub mod resolver;
pub mod types;
pub mod walker;

pub use classify::SelectionScope;
pub use destination::DestinationResolver;
pub use duplicate::{duplicate_selection, BatchScope, DuplicationOutcome};
pub use engine::DeepCopyEngine;
pub use error::DeepCopyError;
pub use resolver::{match_sub_object, ReferenceResolver, Resolution, SubObjectMatch};
pub use types::{
    CopyPair, DeepCopyOptions, DeepCopyPhase, DeepCopyProgress, DeepCopyReport, RemapPlan, RemapWarning,
    ResolutionTier, StagedWrite,
};
pub use walker::{destination_files, field_handles, FieldHandle, ShallowMatcher};
