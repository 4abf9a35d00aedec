use crate::store::{AssetPath, AssetStore};

/// The selection split into folders and files; decides which reference targets
/// belong to the duplicated material.
#[derive(Debug, Clone, Default)]
pub struct SelectionScope {
    folders: Vec<AssetPath>,
    files: Vec<AssetPath>,
}

impl SelectionScope {
    pub fn classify<S: AssetStore + ?Sized>(store: &S, selection: &[AssetPath]) -> Self {
        let mut scope = Self::default();
        for path in selection {
            let bucket = if store.is_container(path) {
                &mut scope.folders
            } else {
                &mut scope.files
            };
            if !bucket.contains(path) {
                bucket.push(path.clone());
            }
        }
        scope
    }

    pub fn from_parts(folders: Vec<AssetPath>, files: Vec<AssetPath>) -> Self {
        Self { folders, files }
    }

    pub fn folders(&self) -> &[AssetPath] {
        &self.folders
    }

    pub fn files(&self) -> &[AssetPath] {
        &self.files
    }

    pub fn is_selected_folder(&self, path: &AssetPath) -> bool {
        self.folders.contains(path)
    }

    pub fn is_selected_file(&self, path: &AssetPath) -> bool {
        self.files.contains(path)
    }

    /// Selected folders that `path` lies inside.
    pub fn containing_folders<'a>(&'a self, path: &'a AssetPath) -> impl Iterator<Item = &'a AssetPath> + 'a {
        self.folders.iter().filter(move |folder| path.is_inside(folder))
    }

    /// `path` is a selected file or lies inside a selected folder.
    pub fn contains(&self, path: &AssetPath) -> bool {
        self.is_selected_file(path) || self.containing_folders(path).next().is_some()
    }
}
