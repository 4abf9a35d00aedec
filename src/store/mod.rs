//! Asset store abstraction.
//!
//! The deep-copy pipeline only talks to storage through the [`AssetStore`] trait,
//! which keeps it independent of how folders and composite files are actually kept:
//! - `InMemoryStore`: snapshot-backed store used by tests and snapshot files
//! - `FsStore`: directory tree on disk with YAML asset documents
//!
//! All paths are store-relative [`AssetPath`]s.

use thiserror::Error;

pub mod document;
pub mod fs;
pub mod graph;
pub mod memory;
pub mod path;

pub use document::{AssetDocument, FieldRecord, FieldWrite, LocalId, ObjectKind, ObjectRecord, ObjectRef};
pub use fs::FsStore;
pub use graph::{GraphObject, ObjectGraph, PositionalSignature};
pub use memory::{InMemoryStore, StoreSnapshot};
pub use path::{unique_sibling, AssetPath};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not imported yet: {0} (refresh the store first)")]
    NotImported(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid asset path: {0}")]
    InvalidPath(String),

    #[error("Invalid asset document: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage operations the deep-copy pipeline depends on.
///
/// Implementations are used by a single operation at a time; no locking protocol
/// is defined for concurrent callers.
pub trait AssetStore {
    /// True when `path` names a folder.
    fn is_container(&self, path: &AssetPath) -> bool;

    /// True when `path` names an existing folder or file.
    fn contains(&self, path: &AssetPath) -> bool;

    /// Returns a path next to `path` that is not taken at call time.
    fn generate_unique_path(&self, path: &AssetPath) -> Result<AssetPath, StoreError> {
        if !self.contains(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(unique_sibling(path, |candidate| self.contains(candidate)))
    }

    /// Copies a folder (recursively) or a file verbatim. References inside the copy
    /// still point at the originals.
    fn copy(&mut self, source: &AssetPath, destination: &AssetPath) -> Result<(), StoreError>;

    /// Every path strictly below `prefix`, sorted. Folders are left out when
    /// `exclude_containers` is set.
    fn enumerate_under(&self, prefix: &AssetPath, exclude_containers: bool) -> Result<Vec<AssetPath>, StoreError>;

    /// Object graph of the file at `path`, or `None` when the path is a folder or a
    /// file without objects.
    fn load_object_graph(&self, path: &AssetPath) -> Result<Option<ObjectGraph>, StoreError>;

    /// Rewrites reference fields inside one file.
    fn write_fields(&mut self, path: &AssetPath, writes: &[FieldWrite]) -> Result<(), StoreError>;

    /// Suspends incremental re-indexing until the matching [`AssetStore::end_batch`].
    fn begin_batch(&mut self) {}

    fn end_batch(&mut self) {}

    /// Re-synchronizes the store with its backing data. Files copied since the last
    /// refresh may not expose their sub-objects before this is called.
    fn refresh(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Saves pending changes.
    fn persist(&mut self) -> Result<(), StoreError>;
}
