use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchical `/`-separated identifier of a folder or file inside an asset store.
///
/// Ordering is plain string ordering, which the folder tie-break rules rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `self` starts with `folder + "/"`.
    pub fn is_inside(&self, folder: &AssetPath) -> bool {
        self.0
            .strip_prefix(folder.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Replaces the `from` prefix with `onto`: `onto + self[len(from)..]`.
    ///
    /// Callers must have checked that `self` is `from` or lies inside it.
    pub fn rebase(&self, from: &AssetPath, onto: &AssetPath) -> AssetPath {
        let suffix = self.0.get(from.0.len()..).unwrap_or_default();
        AssetPath(format!("{}{}", onto.0, suffix))
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn parent(&self) -> Option<AssetPath> {
        self.0.rfind('/').map(|idx| AssetPath(self.0[..idx].to_string()))
    }

    pub fn join(&self, name: &str) -> AssetPath {
        if self.0.is_empty() {
            AssetPath(name.to_string())
        } else {
            AssetPath(format!("{}/{}", self.0, name))
        }
    }

    /// Splits the last segment into stem and extension (`"a.b.c"` -> `("a.b", Some("c"))`).
    /// A leading dot is part of the stem.
    pub fn stem_and_extension(&self) -> (&str, Option<&str>) {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
            _ => (name, None),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Finds a free sibling of `path` by numbering the stem: `Hero.asset` -> `Hero 1.asset`,
/// `Hero 1.asset` -> `Hero 2.asset`. Returns `path` itself when it is free.
pub fn unique_sibling(path: &AssetPath, is_taken: impl Fn(&AssetPath) -> bool) -> AssetPath {
    if !is_taken(path) {
        return path.clone();
    }

    let (stem, extension) = path.stem_and_extension();
    let (mut base, mut counter) = split_numeric_suffix(stem);

    loop {
        counter = match counter.checked_add(1) {
            Some(next) => next,
            // Suffix already at the top of the range: number the whole stem instead.
            None => {
                base = stem;
                1
            }
        };
        let name = match extension {
            Some(ext) => format!("{base} {counter}.{ext}"),
            None => format!("{base} {counter}"),
        };
        let candidate = match path.parent() {
            Some(parent) => parent.join(&name),
            None => AssetPath::new(name),
        };
        if !is_taken(&candidate) {
            return candidate;
        }
    }
}

fn split_numeric_suffix(stem: &str) -> (&str, u64) {
    if let Some((base, digits)) = stem.rsplit_once(' ') {
        if !base.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = digits.parse::<u64>() {
                return (base, n);
            }
        }
    }
    (stem, 0)
}
