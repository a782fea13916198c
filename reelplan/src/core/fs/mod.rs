//! Filesystem utilities.
//!
//! Crash-tolerant write primitives for project documents, settings and exports,
//! plus helpers for deriving file names from user-entered project names.
//!
//! A partial write must never leave a previously saved project unreadable, so
//! every write goes to a sibling temp file first and is swapped into place.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::core::{CoreError, CoreResult};

// =============================================================================
// File Name Utilities
// =============================================================================

/// Characters rejected in project names (invalid on common filesystems).
pub const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum project name length in characters.
pub const MAX_NAME_LEN: usize = 100;

fn unsafe_stem_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f\s]+"#).expect("static regex is valid"))
}

/// Validates a user-entered project name.
pub fn validate_project_name(name: &str) -> CoreResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(
            "Project name cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::ValidationError(format!(
            "Project name too long (max {MAX_NAME_LEN} characters)"
        )));
    }
    if let Some(c) = trimmed.chars().find(|c| INVALID_NAME_CHARS.contains(c)) {
        return Err(CoreError::ValidationError(format!(
            "Project name contains invalid character: {c}"
        )));
    }
    Ok(())
}

/// Derives a filesystem-safe file stem from a display name.
///
/// Runs of unsafe characters and whitespace collapse to a single `_`.
/// Falls back to `untitled` when nothing usable remains.
pub fn safe_file_stem(name: &str) -> String {
    let replaced = unsafe_stem_chars().replace_all(name.trim(), "_");
    let stem = replaced.trim_matches(|c| c == '_' || c == '.');
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}

/// Returns `path` with `ext` as its extension, replacing any other extension.
pub fn with_forced_extension(path: &Path, ext: &str) -> PathBuf {
    match path.extension() {
        Some(current) if current.eq_ignore_ascii_case(ext) => path.to_path_buf(),
        _ => path.with_extension(ext),
    }
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Write bytes to `path` using an atomic replace pattern.
///
/// Implementation notes:
/// - Write to a sibling temporary file.
/// - Flush and sync the temp file.
/// - Swap into place by renaming.
/// - If the destination exists, it is first moved aside as a `.bak` file, then removed.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = tmp_path_for(path);
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)
}

/// Write a JSON file atomically with pretty formatting.
pub fn atomic_write_json_pretty<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    atomic_write_bytes(path, &bytes)
}

/// Write a compact JSON file atomically.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec(value)?;
    atomic_write_bytes(path, &bytes)
}

fn sibling_with_suffix(path: &Path, suffix: &str, fallback: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| fallback.to_string());
    sibling.set_file_name(format!("{file_name}.{suffix}"));
    sibling
}

fn tmp_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "tmp", "tmp")
}

fn bak_path_for(path: &Path) -> PathBuf {
    sibling_with_suffix(path, "bak", "bak")
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    // Fast path: dest does not exist.
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Windows: rename-over-existing may fail depending on filesystem; use a backup swap.
    let bak = bak_path_for(dest);
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            // Try to restore the old file.
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // Atomic Write Tests
    // =========================================================================

    #[test]
    fn test_atomic_write_bytes_creates_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.reelplan");

        atomic_write_bytes(&path, b"one").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one");

        atomic_write_bytes(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");

        assert!(!tmp_path_for(&path).exists());
        assert!(!bak_path_for(&path).exists());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("out.json");

        atomic_write_json_pretty(&path, &serde_json::json!({"a": 1})).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    // =========================================================================
    // Name Tests
    // =========================================================================

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("Summer Launch").is_ok());
        assert!(validate_project_name("   ").is_err());
        assert!(validate_project_name("a/b").is_err());
        assert!(validate_project_name("what?").is_err());
        assert!(validate_project_name(&"x".repeat(101)).is_err());
        assert!(validate_project_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("Summer Launch 2025"), "Summer_Launch_2025");
        assert_eq!(safe_file_stem("a/b\\c"), "a_b_c");
        assert_eq!(safe_file_stem("  ???  "), "untitled");
        assert_eq!(safe_file_stem(""), "untitled");
    }

    #[test]
    fn test_with_forced_extension() {
        assert_eq!(
            with_forced_extension(Path::new("/tmp/plan"), "reelplan"),
            PathBuf::from("/tmp/plan.reelplan")
        );
        assert_eq!(
            with_forced_extension(Path::new("/tmp/plan.json"), "reelplan"),
            PathBuf::from("/tmp/plan.reelplan")
        );
        assert_eq!(
            with_forced_extension(Path::new("/tmp/plan.REELPLAN"), "reelplan"),
            PathBuf::from("/tmp/plan.REELPLAN")
        );
    }
}
