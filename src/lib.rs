//! Deep duplication of asset folders and files with reference remapping.
//!
//! Copying a set of assets is easy; the copies still point at the originals.
//! [`deep_copy::DeepCopyEngine`] duplicates a selection through an
//! [`store::AssetStore`] and rewires every reference inside the copies that targeted
//! something in the selection so it targets the corresponding copy instead.

pub mod deep_copy;
pub mod error_codes;
pub mod input_validation;
pub mod logging;
pub mod path_validation;
pub mod store;

pub use deep_copy::{
    CopyPair, DeepCopyEngine, DeepCopyError, DeepCopyOptions, DeepCopyPhase, DeepCopyProgress, DeepCopyReport,
    RemapWarning,
};
pub use logging::{LogEntry, LogManager};
pub use store::{AssetPath, AssetStore, FsStore, InMemoryStore, StoreError};
