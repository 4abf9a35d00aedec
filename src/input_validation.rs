//! Validation of user-supplied selections and options
//!
//! Front ends run these before handing input to the engine, so bad input fails
//! early with a readable message instead of half-way through an operation.

use std::collections::HashSet;

use anyhow::{Result, bail};

use crate::path_validation::validate_asset_path;

/// Validate shallow-copy glob patterns
///
/// Ensures patterns are safe, properly formatted, and within reasonable limits.
pub fn validate_shallow_patterns(patterns: &[String]) -> Result<()> {
    const MAX_PATTERNS: usize = 100;
    const MAX_PATTERN_LENGTH: usize = 255;

    if patterns.len() > MAX_PATTERNS {
        bail!(
            "Too many shallow-copy patterns: {} (max: {})",
            patterns.len(),
            MAX_PATTERNS
        );
    }

    for pattern in patterns {
        let trimmed = pattern.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.len() > MAX_PATTERN_LENGTH {
            bail!(
                "Pattern too long: '{}' ({} chars, max: {})",
                trimmed.chars().take(20).collect::<String>(),
                trimmed.len(),
                MAX_PATTERN_LENGTH
            );
        }

        if trimmed.contains("..") {
            bail!("Pattern contains path traversal: '{}'", trimmed);
        }

        if trimmed.contains('\0') || trimmed.contains('\n') || trimmed.contains('\r') {
            bail!("Pattern contains control characters");
        }

        globset::Glob::new(trimmed).map_err(|e| {
            anyhow::anyhow!("Invalid glob pattern '{}': {}", trimmed, e)
        })?;
    }

    Ok(())
}

/// Validate a selection of asset paths
///
/// Non-empty, bounded, every entry a well-formed asset path, no entry twice.
pub fn validate_selection(paths: &[String]) -> Result<()> {
    const MAX_SELECTION: usize = 10_000;

    if paths.is_empty() {
        bail!("Selection is empty");
    }

    if paths.len() > MAX_SELECTION {
        bail!(
            "Selection too large: {} entries (max: {})",
            paths.len(),
            MAX_SELECTION
        );
    }

    let mut seen = HashSet::with_capacity(paths.len());
    for path in paths {
        validate_asset_path(path).map_err(|e| anyhow::anyhow!("Invalid selection entry: {e}"))?;
        if !seen.insert(path.as_str()) {
            bail!("Path selected twice: '{}'", path);
        }
    }

    Ok(())
}
