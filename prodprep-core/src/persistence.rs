//! Shared persistence utilities: atomic file writes, hashing and directory
//! promotion.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// Atomically write raw bytes to a file.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Compute SHA-256 hash of file contents.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(hash_bytes(&content))
}

/// Compute SHA-256 hash of arbitrary bytes.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Sibling path `<parent>/.<name>.<tag>-<uuid>` used while staging a directory.
pub fn sibling_temp_dir(target: &Path, tag: &str) -> io::Result<PathBuf> {
    let name = target.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' has no final path component", target.display()),
        )
    })?;
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(parent.join(format!(
        ".{}.{tag}-{}",
        name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    )))
}

/// Swap a fully written `staging` directory into `target`.
///
/// An existing `target` is renamed aside first and removed only after the
/// staging directory is in place; if the second rename fails the previous
/// directory is moved back.
pub fn promote_dir(staging: &Path, target: &Path) -> io::Result<()> {
    if !target.exists() {
        return std::fs::rename(staging, target);
    }

    let backup = sibling_temp_dir(target, "previous")?;
    std::fs::rename(target, &backup)?;
    if let Err(e) = std::fs::rename(staging, target) {
        if let Err(restore) = std::fs::rename(&backup, target) {
            tracing::error!(
                backup = %backup.display(),
                error = %restore,
                "Failed to restore previous artifact directory"
            );
        }
        return Err(e);
    }
    if let Err(e) = std::fs::remove_dir_all(&backup) {
        tracing::warn!(
            backup = %backup.display(),
            error = %e,
            "Could not remove previous artifact directory"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        atomic_write(&path, b"a,b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_hash_bytes() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_promote_dir_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("old.txt"), "old").unwrap();

        let staging = sibling_temp_dir(&target, "staging").unwrap();
        std::fs::create_dir(&staging).unwrap();
        std::fs::write(staging.join("new.txt"), "new").unwrap();

        promote_dir(&staging, &target).unwrap();
        assert!(target.join("new.txt").exists());
        assert!(!target.join("old.txt").exists());
        assert!(!staging.exists());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_sibling_temp_dir_needs_name() {
        assert!(sibling_temp_dir(Path::new("/"), "staging").is_err());
    }
}
