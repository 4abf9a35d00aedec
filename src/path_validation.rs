use std::path::{Path, PathBuf};

/// Maximum allowed asset path length
const MAX_PATH_LENGTH: usize = 4096;

/// Validate that an asset path is well-formed: `/`-separated, relative, no empty,
/// `.` or `..` segments.
pub fn validate_asset_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Asset path is empty".to_string());
    }

    // Check path length
    if path.len() > MAX_PATH_LENGTH {
        return Err(format!("Path too long (max {MAX_PATH_LENGTH} bytes)"));
    }

    // Check for null bytes
    if path.bytes().any(|b| b == 0) {
        return Err("Path contains null bytes".to_string());
    }

    if path.contains('\\') {
        return Err(format!("Path uses '\\' separators: {path}"));
    }

    if path.starts_with('/') {
        return Err(format!("Path must be store-relative: {path}"));
    }

    for segment in path.split('/') {
        match segment {
            "" => return Err(format!("Path has an empty segment: {path}")),
            "." | ".." => return Err(format!("Path traversal detected: {path}")),
            _ => {}
        }
    }

    Ok(())
}

/// Map a validated asset path onto the native file system under `root`.
pub fn native_path(root: &Path, path: &str) -> Result<PathBuf, String> {
    validate_asset_path(path)?;
    Ok(path.split('/').fold(root.to_path_buf(), |acc, segment| acc.join(segment)))
}

/// Inverse of [`native_path`]: the asset path of `native` relative to `root`.
pub fn asset_path_of(root: &Path, native: &Path) -> Result<String, String> {
    let relative = native
        .strip_prefix(root)
        .map_err(|_| format!("{} is outside {}", native.display(), root.display()))?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let path = segments.join("/");
    validate_asset_path(&path)?;
    Ok(path)
}
