use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::{AssetPath, FieldWrite, LocalId, ObjectRef};

/// Source and destination of one successfully duplicated selection entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPair {
    pub source: AssetPath,
    pub destination: AssetPath,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepCopyOptions {
    /// Glob patterns of scene-like files that are copied but never remapped.
    pub shallow_patterns: Vec<String>,
    /// Refuse selections containing paths the store does not know.
    pub validate_selection: bool,
    /// Save the store after rewriting references.
    pub persist: bool,
}

impl Default for DeepCopyOptions {
    fn default() -> Self {
        Self {
            shallow_patterns: vec!["**/*.unity".to_string(), "**/*.scene".to_string()],
            validate_selection: true,
            persist: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeepCopyPhase {
    Classifying,
    Duplicating,
    Resyncing,
    Remapping,
    Committing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepCopyProgress {
    pub phase: DeepCopyPhase,
    pub processed: u64,
    pub total: u64,
    pub current_path: Option<String>,
}

/// Tier of the sub-object identity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionTier {
    Name,
    FullName,
    Position,
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::FullName => f.write_str("full hierarchical name"),
            Self::Position => f.write_str("sibling position"),
        }
    }
}

/// Non-fatal condition met during an operation. The affected item or field is left
/// as it was and the operation continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemapWarning {
    CopyFailed {
        source: AssetPath,
        reason: String,
    },
    ShallowCopy {
        path: AssetPath,
    },
    UnloadableFile {
        path: AssetPath,
        reason: String,
    },
    DanglingReference {
        file: AssetPath,
        field: String,
        target: ObjectRef,
    },
    UnresolvedDestination {
        file: AssetPath,
        field: String,
        target: ObjectRef,
        destination: Option<AssetPath>,
    },
    AmbiguousReferenceType {
        file: AssetPath,
        field: String,
        target: ObjectRef,
        type_name: String,
        candidates: usize,
    },
}

impl RemapWarning {
    pub fn code(&self) -> &'static str {
        use crate::error_codes::*;
        match self {
            Self::CopyFailed { .. } => WARN_COPY_FAILED,
            Self::ShallowCopy { .. } => WARN_SHALLOW_COPY,
            Self::UnloadableFile { .. } => WARN_UNLOADABLE_FILE,
            Self::DanglingReference { .. } => WARN_DANGLING_REFERENCE,
            Self::UnresolvedDestination { .. } => WARN_UNRESOLVED_DESTINATION,
            Self::AmbiguousReferenceType { .. } => WARN_AMBIGUOUS_REFERENCE_TYPE,
        }
    }

    /// Path the warning is about, used to tag log entries.
    pub fn path(&self) -> &AssetPath {
        match self {
            Self::CopyFailed { source, .. } => source,
            Self::ShallowCopy { path } | Self::UnloadableFile { path, .. } => path,
            Self::DanglingReference { file, .. }
            | Self::UnresolvedDestination { file, .. }
            | Self::AmbiguousReferenceType { file, .. } => file,
        }
    }
}

impl fmt::Display for RemapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CopyFailed { source, reason } => write!(f, "Failed to duplicate {source}: {reason}"),
            Self::ShallowCopy { path } => {
                write!(f, "{path} has been shallow copied (scene files are not remapped)")
            }
            Self::UnloadableFile { path, reason } => write!(f, "Cannot load {path}: {reason}"),
            Self::DanglingReference { file, field, target } => {
                write!(f, "{file} '{field}' points at missing object {target}")
            }
            Self::UnresolvedDestination {
                file,
                field,
                target,
                destination,
            } => match destination {
                Some(dest) => write!(f, "{file} '{field}': no copy of {target} found at {dest}"),
                None => write!(f, "{file} '{field}': no copy recorded for {target}"),
            },
            Self::AmbiguousReferenceType {
                file,
                field,
                type_name,
                candidates,
                ..
            } => write!(
                f,
                "{file} '{field}': ambiguous {type_name} ({candidates} candidates) is not supported"
            ),
        }
    }
}

/// A resolved reference waiting to be written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedWrite {
    pub file: AssetPath,
    pub object: LocalId,
    pub field_index: usize,
    pub field_name: String,
    pub previous: ObjectRef,
    pub value: ObjectRef,
}

impl StagedWrite {
    pub fn to_field_write(&self) -> FieldWrite {
        FieldWrite {
            object: self.object,
            field_index: self.field_index,
            field_name: self.field_name.clone(),
            value: Some(self.value.clone()),
        }
    }
}

/// Outcome of walking and resolving every duplicated file, before anything is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemapPlan {
    pub writes: Vec<StagedWrite>,
    pub warnings: Vec<RemapWarning>,
    pub walked_files: usize,
    pub visited_fields: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepCopyReport {
    pub pairs: Vec<CopyPair>,
    /// Destination of every pair, in selection order.
    pub new_selection: Vec<AssetPath>,
    pub rewritten_fields: usize,
    pub walked_files: usize,
    pub warnings: Vec<RemapWarning>,
}
