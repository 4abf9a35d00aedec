use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{AssetDocument, AssetPath, AssetStore, FieldWrite, ObjectGraph, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Folder,
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        document: Option<AssetDocument>,
    },
}

/// Serializable content of an [`InMemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub entries: BTreeMap<AssetPath, Entry>,
}

type CopyHook = Box<dyn Fn(&AssetPath, &mut AssetDocument) + Send + Sync>;

/// Asset store held entirely in memory.
///
/// Copied files behave like freshly written raw files: their object graphs are not
/// available until [`AssetStore::refresh`] runs.
#[derive(Default)]
pub struct InMemoryStore {
    entries: BTreeMap<AssetPath, Entry>,
    pending_import: BTreeSet<AssetPath>,
    rejected_copies: BTreeSet<AssetPath>,
    copy_hook: Option<CopyHook>,
    batch_depth: usize,
    batches_started: usize,
    refresh_count: usize,
    persist_count: usize,
    write_count: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            entries: snapshot.entries,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            entries: self.entries.clone(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, StoreError> {
        let snapshot = serde_yaml::from_str(yaml).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn to_yaml_string(&self) -> Result<String, StoreError> {
        serde_yaml::to_string(&self.snapshot()).map_err(|e| StoreError::Parse(e.to_string()))
    }

    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let snapshot = serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn to_json_string(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(&self.snapshot()).map_err(|e| StoreError::Parse(e.to_string()))
    }

    /// Adds a folder together with any missing parent folders.
    pub fn insert_folder(&mut self, path: impl Into<AssetPath>) -> &mut Self {
        let path = path.into();
        self.insert_parents(&path);
        self.entries.insert(path, Entry::Folder);
        self
    }

    /// Adds a file holding `document` together with any missing parent folders.
    pub fn insert_file(&mut self, path: impl Into<AssetPath>, document: AssetDocument) -> &mut Self {
        let path = path.into();
        self.insert_parents(&path);
        self.entries.insert(
            path,
            Entry::File {
                document: Some(document),
            },
        );
        self
    }

    /// Adds a file without objects (textures, audio and the like).
    pub fn insert_plain_file(&mut self, path: impl Into<AssetPath>) -> &mut Self {
        let path = path.into();
        self.insert_parents(&path);
        self.entries.insert(path, Entry::File { document: None });
        self
    }

    pub fn document(&self, path: &AssetPath) -> Option<&AssetDocument> {
        match self.entries.get(path) {
            Some(Entry::File { document }) => document.as_ref(),
            _ => None,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &AssetPath> {
        self.entries.keys()
    }

    /// Makes every later copy of `path` fail.
    pub fn reject_copies_of(&mut self, path: impl Into<AssetPath>) -> &mut Self {
        self.rejected_copies.insert(path.into());
        self
    }

    /// Runs `hook` on every document produced by a copy, before it is stored.
    pub fn on_copy(&mut self, hook: impl Fn(&AssetPath, &mut AssetDocument) + Send + Sync + 'static) -> &mut Self {
        self.copy_hook = Some(Box::new(hook));
        self
    }

    pub fn batch_depth(&self) -> usize {
        self.batch_depth
    }

    pub fn batches_started(&self) -> usize {
        self.batches_started
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count
    }

    pub fn write_count(&self) -> usize {
        self.write_count
    }

    fn insert_parents(&mut self, path: &AssetPath) {
        let mut parent = path.parent();
        while let Some(folder) = parent {
            parent = folder.parent();
            self.entries.entry(folder).or_insert(Entry::Folder);
        }
    }

    fn copied_entry(&self, destination: &AssetPath, entry: &Entry) -> Entry {
        match entry {
            Entry::Folder => Entry::Folder,
            Entry::File { document } => {
                let document = document.clone().map(|mut doc| {
                    if let Some(hook) = &self.copy_hook {
                        hook(destination, &mut doc);
                    }
                    doc
                });
                Entry::File { document }
            }
        }
    }
}

impl AssetStore for InMemoryStore {
    fn is_container(&self, path: &AssetPath) -> bool {
        matches!(self.entries.get(path), Some(Entry::Folder))
    }

    fn contains(&self, path: &AssetPath) -> bool {
        self.entries.contains_key(path)
    }

    fn copy(&mut self, source: &AssetPath, destination: &AssetPath) -> Result<(), StoreError> {
        if self.rejected_copies.contains(source) {
            return Err(StoreError::NotSupported(format!("copy of {source} rejected")));
        }
        if !self.entries.contains_key(source) {
            return Err(StoreError::NotFound(source.to_string()));
        }
        if self.entries.contains_key(destination) {
            return Err(StoreError::AlreadyExists(destination.to_string()));
        }

        let copies: Vec<(AssetPath, Entry)> = self
            .entries
            .iter()
            .filter(|(path, _)| *path == source || path.is_inside(source))
            .map(|(path, entry)| {
                let target = path.rebase(source, destination);
                let copied = self.copied_entry(&target, entry);
                (target, copied)
            })
            .collect();

        self.insert_parents(destination);
        for (path, entry) in copies {
            if matches!(entry, Entry::File { .. }) {
                self.pending_import.insert(path.clone());
            }
            self.entries.insert(path, entry);
        }
        Ok(())
    }

    fn enumerate_under(&self, prefix: &AssetPath, exclude_containers: bool) -> Result<Vec<AssetPath>, StoreError> {
        if !self.entries.contains_key(prefix) {
            return Err(StoreError::NotFound(prefix.to_string()));
        }
        Ok(self
            .entries
            .iter()
            .filter(|(path, entry)| {
                path.is_inside(prefix) && !(exclude_containers && matches!(entry, Entry::Folder))
            })
            .map(|(path, _)| path.clone())
            .collect())
    }

    fn load_object_graph(&self, path: &AssetPath) -> Result<Option<ObjectGraph>, StoreError> {
        if self.pending_import.contains(path) {
            return Err(StoreError::NotImported(path.to_string()));
        }
        match self.entries.get(path) {
            None => Err(StoreError::NotFound(path.to_string())),
            Some(Entry::Folder) | Some(Entry::File { document: None }) => Ok(None),
            Some(Entry::File {
                document: Some(document),
            }) => ObjectGraph::from_document(path.clone(), document).map(Some),
        }
    }

    fn write_fields(&mut self, path: &AssetPath, writes: &[FieldWrite]) -> Result<(), StoreError> {
        if self.pending_import.contains(path) {
            return Err(StoreError::NotImported(path.to_string()));
        }
        match self.entries.get_mut(path) {
            Some(Entry::File {
                document: Some(document),
            }) => {
                document.apply_writes(path, writes)?;
                self.write_count += writes.len();
                Ok(())
            }
            _ => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn begin_batch(&mut self) {
        self.batch_depth += 1;
        self.batches_started += 1;
    }

    fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
    }

    fn refresh(&mut self) -> Result<(), StoreError> {
        self.pending_import.clear();
        self.refresh_count += 1;
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.persist_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalId, ObjectRecord, ObjectRef};

    fn hero() -> AssetDocument {
        AssetDocument::new(
            ObjectRecord::node(1, "GameObject", "Hero")
                .with_field("weapon", Some(ObjectRef::new("Assets/Chars/Sword.asset", 1))),
        )
        .with(ObjectRecord::node(2, "GameObject", "Hand").with_parent(1))
    }

    fn store() -> InMemoryStore {
        let mut store = InMemoryStore::new();
        store
            .insert_file("Assets/Chars/Hero.asset", hero())
            .insert_file("Assets/Chars/Sword.asset", AssetDocument::new(ObjectRecord::opaque(1, "Item", "Sword")))
            .insert_plain_file("Assets/Chars/hero.png");
        store
    }

    #[test]
    fn test_insert_creates_parent_folders() {
        let store = store();
        assert!(store.is_container(&AssetPath::from("Assets")));
        assert!(store.is_container(&AssetPath::from("Assets/Chars")));
        assert!(!store.is_container(&AssetPath::from("Assets/Chars/Hero.asset")));
    }

    #[test]
    fn test_copy_folder_copies_everything_below() {
        let mut store = store();
        store
            .copy(&AssetPath::from("Assets/Chars"), &AssetPath::from("Assets/Chars 1"))
            .unwrap();

        let copied = store
            .enumerate_under(&AssetPath::from("Assets/Chars 1"), true)
            .unwrap();
        assert_eq!(
            copied,
            vec![
                AssetPath::from("Assets/Chars 1/Hero.asset"),
                AssetPath::from("Assets/Chars 1/Sword.asset"),
                AssetPath::from("Assets/Chars 1/hero.png"),
            ]
        );
    }

    #[test]
    fn test_copied_files_need_refresh() {
        let mut store = store();
        let copy = AssetPath::from("Assets/Chars/Hero 1.asset");
        store.copy(&AssetPath::from("Assets/Chars/Hero.asset"), &copy).unwrap();

        assert!(matches!(
            store.load_object_graph(&copy),
            Err(StoreError::NotImported(_))
        ));

        store.refresh().unwrap();
        let graph = store.load_object_graph(&copy).unwrap().unwrap();
        // Raw copy keeps references pointing at the originals.
        assert_eq!(
            graph.get(LocalId(1)).unwrap().fields[0].value,
            Some(ObjectRef::new("Assets/Chars/Sword.asset", 1))
        );
    }

    #[test]
    fn test_copy_rejects_existing_destination() {
        let mut store = store();
        let result = store.copy(
            &AssetPath::from("Assets/Chars/Hero.asset"),
            &AssetPath::from("Assets/Chars/Sword.asset"),
        );
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn test_rejected_copy_fails() {
        let mut store = store();
        store.reject_copies_of("Assets/Chars/Hero.asset");
        assert!(store
            .copy(
                &AssetPath::from("Assets/Chars/Hero.asset"),
                &AssetPath::from("Assets/Chars/Hero 1.asset"),
            )
            .is_err());
        assert!(!store.contains(&AssetPath::from("Assets/Chars/Hero 1.asset")));
    }

    #[test]
    fn test_copy_hook_edits_copied_documents() {
        let mut store = store();
        store.on_copy(|_, doc| {
            doc.remove(LocalId(2));
        });
        let copy = AssetPath::from("Assets/Chars/Hero 1.asset");
        store.copy(&AssetPath::from("Assets/Chars/Hero.asset"), &copy).unwrap();

        assert_eq!(store.document(&copy).unwrap().objects.len(), 1);
        assert_eq!(
            store
                .document(&AssetPath::from("Assets/Chars/Hero.asset"))
                .unwrap()
                .objects
                .len(),
            2
        );
    }

    #[test]
    fn test_generate_unique_path() {
        let store = store();
        let unique = store
            .generate_unique_path(&AssetPath::from("Assets/Chars/Hero.asset"))
            .unwrap();
        assert_eq!(unique.as_str(), "Assets/Chars/Hero 1.asset");
    }

    #[test]
    fn test_yaml_snapshot_loads() {
        let yaml = r#"
entries:
  Assets:
    kind: folder
  Assets/Hero.asset:
    kind: file
    document:
      main: 1
      objects:
        - { id: 1, type: GameObject, name: Hero, kind: tree_node }
  Assets/hero.png:
    kind: file
"#;
        let store = InMemoryStore::from_yaml_str(yaml).unwrap();
        assert!(store.is_container(&AssetPath::from("Assets")));
        assert!(store.document(&AssetPath::from("Assets/Hero.asset")).is_some());
        assert!(store
            .load_object_graph(&AssetPath::from("Assets/hero.png"))
            .unwrap()
            .is_none());
    }
}
