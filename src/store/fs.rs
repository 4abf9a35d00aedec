//! Asset store backed by a directory tree.
//!
//! Folders are directories. Files whose extension is one of the document extensions
//! hold a YAML [`AssetDocument`]; any other file is a plain file without objects.
//! Field writes are buffered and written out by [`AssetStore::persist`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{AssetDocument, AssetPath, AssetStore, FieldWrite, ObjectGraph, StoreError};
use crate::path_validation::{asset_path_of, native_path};

const DEFAULT_DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "asset"];

pub struct FsStore {
    root: PathBuf,
    document_extensions: Vec<String>,
    dirty: BTreeMap<AssetPath, AssetDocument>,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            document_extensions: DEFAULT_DOCUMENT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            dirty: BTreeMap::new(),
        }
    }

    pub fn with_document_extensions(mut self, extensions: &[&str]) -> Self {
        self.document_extensions = extensions.iter().map(|e| e.to_ascii_lowercase()).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of documents with unsaved field writes.
    pub fn pending_writes(&self) -> usize {
        self.dirty.len()
    }

    fn native(&self, path: &AssetPath) -> Result<PathBuf, StoreError> {
        native_path(&self.root, path.as_str()).map_err(StoreError::InvalidPath)
    }

    fn is_document(&self, path: &AssetPath) -> bool {
        path.stem_and_extension()
            .1
            .is_some_and(|ext| self.document_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn read_document(&self, path: &AssetPath) -> Result<Option<AssetDocument>, StoreError> {
        if let Some(document) = self.dirty.get(path) {
            return Ok(Some(document.clone()));
        }

        let native = self.native(path)?;
        if !native.exists() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if native.is_dir() || !self.is_document(path) {
            return Ok(None);
        }

        let text = fs::read_to_string(&native)?;
        let document = serde_yaml::from_str(&text)
            .map_err(|e| StoreError::Parse(format!("{path}: {e}")))?;
        Ok(Some(document))
    }

    fn copy_file(source: &Path, target: &Path) -> Result<(), StoreError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::copy(source, target)?;

        let modified = fs::metadata(source)?.modified()?;
        filetime::set_file_mtime(target, filetime::FileTime::from_system_time(modified))?;

        Ok(())
    }
}

impl AssetStore for FsStore {
    fn is_container(&self, path: &AssetPath) -> bool {
        self.native(path).map(|p| p.is_dir()).unwrap_or(false)
    }

    fn contains(&self, path: &AssetPath) -> bool {
        self.native(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn copy(&mut self, source: &AssetPath, destination: &AssetPath) -> Result<(), StoreError> {
        let from = self.native(source)?;
        let to = self.native(destination)?;

        if !from.exists() {
            return Err(StoreError::NotFound(source.to_string()));
        }
        if to.exists() {
            return Err(StoreError::AlreadyExists(destination.to_string()));
        }

        if from.is_dir() {
            for entry in WalkDir::new(&from).sort_by_file_name() {
                let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
                let relative = entry
                    .path()
                    .strip_prefix(&from)
                    .map_err(|e| StoreError::InvalidPath(e.to_string()))?;
                let target = to.join(relative);
                if entry.file_type().is_dir() {
                    fs::create_dir_all(&target)?;
                } else {
                    Self::copy_file(entry.path(), &target)?;
                }
            }
        } else {
            Self::copy_file(&from, &to)?;
        }

        // Buffered writes follow the data they were made against.
        let buffered: Vec<(AssetPath, AssetDocument)> = self
            .dirty
            .iter()
            .filter(|(path, _)| *path == source || path.is_inside(source))
            .map(|(path, doc)| (path.rebase(source, destination), doc.clone()))
            .collect();
        self.dirty.extend(buffered);

        Ok(())
    }

    fn enumerate_under(&self, prefix: &AssetPath, exclude_containers: bool) -> Result<Vec<AssetPath>, StoreError> {
        let base = self.native(prefix)?;
        if !base.is_dir() {
            return Err(StoreError::NotFound(prefix.to_string()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&base).min_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if exclude_containers && entry.file_type().is_dir() {
                continue;
            }
            let path = asset_path_of(&self.root, entry.path()).map_err(StoreError::InvalidPath)?;
            paths.push(AssetPath::new(path));
        }
        paths.sort();
        Ok(paths)
    }

    fn load_object_graph(&self, path: &AssetPath) -> Result<Option<ObjectGraph>, StoreError> {
        match self.read_document(path)? {
            Some(document) => ObjectGraph::from_document(path.clone(), &document).map(Some),
            None => Ok(None),
        }
    }

    fn write_fields(&mut self, path: &AssetPath, writes: &[FieldWrite]) -> Result<(), StoreError> {
        let mut document = self
            .read_document(path)?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        document.apply_writes(path, writes)?;
        self.dirty.insert(path.clone(), document);
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        for (path, document) in &self.dirty {
            let yaml = serde_yaml::to_string(document)
                .map_err(|e| StoreError::Parse(format!("{path}: {e}")))?;
            fs::write(self.native(path)?, yaml)?;
        }
        log::debug!("Persisted {} document(s) under {}", self.dirty.len(), self.root.display());
        self.dirty.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{LocalId, ObjectRecord, ObjectRef};
    use tempfile::TempDir;

    fn write_doc(root: &Path, path: &str, doc: &AssetDocument) {
        let native = native_path(root, path).unwrap();
        fs::create_dir_all(native.parent().unwrap()).unwrap();
        fs::write(native, serde_yaml::to_string(doc).unwrap()).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let hero = AssetDocument::new(
            ObjectRecord::node(1, "GameObject", "Hero")
                .with_field("weapon", Some(ObjectRef::new("Assets/Chars/Sword.asset", 1))),
        );
        write_doc(dir.path(), "Assets/Chars/Hero.asset", &hero);
        write_doc(
            dir.path(),
            "Assets/Chars/Sword.asset",
            &AssetDocument::new(ObjectRecord::opaque(1, "Item", "Sword")),
        );
        fs::write(dir.path().join("Assets/Chars/hero.png"), b"png").unwrap();
        dir
    }

    #[test]
    fn test_copy_folder_and_enumerate() {
        let dir = project();
        let mut store = FsStore::new(dir.path());

        store
            .copy(&AssetPath::from("Assets/Chars"), &AssetPath::from("Assets/Chars 1"))
            .unwrap();

        let files = store.enumerate_under(&AssetPath::from("Assets/Chars 1"), true).unwrap();
        assert_eq!(
            files,
            vec![
                AssetPath::from("Assets/Chars 1/Hero.asset"),
                AssetPath::from("Assets/Chars 1/Sword.asset"),
                AssetPath::from("Assets/Chars 1/hero.png"),
            ]
        );
        assert!(store.is_container(&AssetPath::from("Assets/Chars 1")));
    }

    #[test]
    fn test_copy_preserves_modification_time() {
        let dir = project();
        let mut store = FsStore::new(dir.path());
        store
            .copy(&AssetPath::from("Assets/Chars/hero.png"), &AssetPath::from("Assets/Chars/hero 1.png"))
            .unwrap();

        let original = fs::metadata(dir.path().join("Assets/Chars/hero.png")).unwrap().modified().unwrap();
        let copied = fs::metadata(dir.path().join("Assets/Chars/hero 1.png")).unwrap().modified().unwrap();
        assert_eq!(original, copied);
    }

    #[test]
    fn test_plain_files_have_no_graph() {
        let dir = project();
        let store = FsStore::new(dir.path());
        assert!(store.load_object_graph(&AssetPath::from("Assets/Chars/hero.png")).unwrap().is_none());
        assert!(store.load_object_graph(&AssetPath::from("Assets/Chars")).unwrap().is_none());
        assert!(store.load_object_graph(&AssetPath::from("Assets/Missing.asset")).is_err());
    }

    #[test]
    fn test_writes_are_buffered_until_persist() {
        let dir = project();
        let mut store = FsStore::new(dir.path());
        let hero = AssetPath::from("Assets/Chars/Hero.asset");
        let target = ObjectRef::new("Assets/Chars 1/Sword.asset", 1);

        store
            .write_fields(
                &hero,
                &[FieldWrite {
                    object: LocalId(1),
                    field_index: 0,
                    field_name: "weapon".to_string(),
                    value: Some(target.clone()),
                }],
            )
            .unwrap();
        assert_eq!(store.pending_writes(), 1);

        let on_disk = FsStore::new(dir.path());
        let graph = on_disk.load_object_graph(&hero).unwrap().unwrap();
        assert_eq!(
            graph.get(LocalId(1)).unwrap().fields[0].value,
            Some(ObjectRef::new("Assets/Chars/Sword.asset", 1))
        );

        store.persist().unwrap();
        assert_eq!(store.pending_writes(), 0);

        let graph = on_disk.load_object_graph(&hero).unwrap().unwrap();
        assert_eq!(graph.get(LocalId(1)).unwrap().fields[0].value, Some(target));
    }

    #[test]
    fn test_invalid_paths_are_rejected() {
        let dir = project();
        let store = FsStore::new(dir.path());
        assert!(!store.contains(&AssetPath::from("../outside")));
        assert!(matches!(
            store.load_object_graph(&AssetPath::from("Assets/../x.asset")),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_enumerate_reports_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = project();
        let locked = dir.path().join("Assets/Chars/Locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("Hidden.asset"), b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits; nothing to check then.
        let readable = fs::read_dir(&locked).is_ok();
        let store = FsStore::new(dir.path());
        let result = store.enumerate_under(&AssetPath::from("Assets/Chars"), true);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if readable {
            assert!(result.unwrap().contains(&AssetPath::from("Assets/Chars/Locked/Hidden.asset")));
        } else {
            assert!(matches!(result, Err(StoreError::Io(_))));
        }
    }
}
