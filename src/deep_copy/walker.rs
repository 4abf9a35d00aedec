use globset::{Glob, GlobSet, GlobSetBuilder};

use super::error::DeepCopyError;
use super::types::CopyPair;
use crate::store::{AssetPath, AssetStore, FieldRecord, GraphObject, ObjectGraph, ObjectRef, StoreError};

/// One reference slot of one object in a duplicated file.
#[derive(Debug, Clone, Copy)]
pub struct FieldHandle<'g> {
    pub file: &'g AssetPath,
    pub object: &'g GraphObject,
    pub field_index: usize,
    pub field: &'g FieldRecord,
}

impl<'g> FieldHandle<'g> {
    pub fn current_value(&self) -> Option<&'g ObjectRef> {
        self.field.value.as_ref()
    }
}

/// Every reference field of every object in `graph`, main object first, hidden
/// fields included.
pub fn field_handles(graph: &ObjectGraph) -> impl Iterator<Item = FieldHandle<'_>> {
    let file = graph.path();
    graph.objects().iter().flat_map(move |object| {
        object
            .fields
            .iter()
            .enumerate()
            .map(move |(field_index, field)| FieldHandle {
                file,
                object,
                field_index,
                field,
            })
    })
}

/// Files produced by one copy: the copied file itself, or every non-folder entry
/// below a copied folder.
pub fn destination_files<S: AssetStore + ?Sized>(
    store: &S,
    pair: &CopyPair,
    is_folder_copy: bool,
) -> Result<Vec<AssetPath>, StoreError> {
    if is_folder_copy {
        store.enumerate_under(&pair.destination, true)
    } else {
        Ok(vec![pair.destination.clone()])
    }
}

/// Recognizes scene-like files that are copied but never walked.
#[derive(Debug, Clone)]
pub struct ShallowMatcher {
    set: GlobSet,
}

impl ShallowMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, DeepCopyError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let glob = Glob::new(pattern).map_err(|e| {
                DeepCopyError::InvalidInput(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| DeepCopyError::InvalidInput(e.to_string()))?;
        Ok(Self { set })
    }

    pub fn is_shallow(&self, path: &AssetPath) -> bool {
        self.set.is_match(path.as_str())
    }
}
