//! Artefact identity and data-store path arithmetic.
//!
//! An artefact's id is the SHA-256 of its directory path relative to the
//! data-store root. It does not depend on manifest content: editing a
//! manifest keeps the id, moving the directory creates a new artefact.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};

/// Deterministic id for the artefact stored in `directory_path`
/// (root-relative, `/`-separated).
pub fn artefact_id(directory_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(directory_path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `path` relative to `root` as a `/`-separated string. Both must be
/// absolute; fails if `path` lies outside `root`.
pub fn relative_to_root(root: &Path, path: &Path) -> Result<String> {
    let path = normalize_lexically(path);
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) => bail!(
            "{} is outside the data-store root {}",
            path.display(),
            root.display()
        ),
    };

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Rewrite `reference`, relative to `manifest_dir`, as a root-relative path.
pub fn rebase_reference(root: &Path, manifest_dir: &Path, reference: &str) -> Result<String> {
    relative_to_root(root, &manifest_dir.join(reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_stable_hex_sha256() {
        let id = artefact_id("vector/countries");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, artefact_id("vector/countries"));
        assert_ne!(id, artefact_id("vector/countries2"));
        // Known SHA-256 of the empty string: an artefact at the root itself.
        assert_eq!(
            artefact_id(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/data/a/./b/../c")),
            PathBuf::from("/data/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_rebase_reference() {
        let root = Path::new("/srv/datastore");
        let dir = Path::new("/srv/datastore/sub/dir");
        assert_eq!(rebase_reference(root, dir, "a.zip").unwrap(), "sub/dir/a.zip");
        assert_eq!(
            rebase_reference(root, dir, "./previews/p.png").unwrap(),
            "sub/dir/previews/p.png"
        );
        assert_eq!(
            rebase_reference(root, dir, "../shared/LICENSE").unwrap(),
            "sub/shared/LICENSE"
        );
        assert!(rebase_reference(root, dir, "../../../etc/passwd").is_err());
    }

    #[test]
    fn test_relative_to_root() {
        let root = Path::new("/srv/datastore");
        assert_eq!(
            relative_to_root(root, Path::new("/srv/datastore/a/b")).unwrap(),
            "a/b"
        );
        assert_eq!(relative_to_root(root, root).unwrap(), "");
        assert!(relative_to_root(root, Path::new("/srv/other")).is_err());
    }
}
