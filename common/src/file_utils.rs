//! File utility functions for discovering input files and writing outputs safely.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Returns true if the path's extension matches one of `extensions`.
/// Extensions are matched case-insensitively and given without the leading dot.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Returns paths to all files under `dir` (recursively) matching the given extensions.
///
/// Paths are sorted so that callers see the same order on every run regardless of
/// the platform's directory listing order. Unreadable entries are logged and skipped.
pub fn walk_files_with_extensions(dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !dir.exists() {
        tracing::warn!(dir = %dir.display(), "Directory does not exist");
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect();

    files.sort();
    files
}

/// Writes a file atomically.
///
/// The content is produced into a temporary file in the destination directory and
/// renamed over `path` only after `write` succeeded and the data was flushed. A crash
/// mid-write leaves at most a stray temporary file, never a truncated `path`.
pub fn write_atomic<F>(path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// FNV-1a hash of a path's bytes.
///
/// Stable across processes and toolchain versions, unlike `DefaultHasher`, so it
/// can be part of an on-disk file name.
pub fn stable_path_hash(path: &Path) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in path.as_os_str().as_encoded_bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_has_extension_case_insensitive() {
        let jpg = exts(&["jpg"]);
        assert!(has_extension(Path::new("a/b/photo.jpg"), &jpg));
        assert!(has_extension(Path::new("a/b/photo.JPG"), &jpg));
        assert!(!has_extension(Path::new("a/b/photo.png"), &jpg));
        assert!(!has_extension(Path::new("a/b/photo"), &jpg));
        assert!(!has_extension(Path::new("a/b/photo.jpg.200.segments"), &jpg));
    }

    #[test]
    fn test_walk_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(dir.path().join("a.JPG"), b"x").unwrap();
        fs::write(dir.path().join("nested/c.jpg"), b"x").unwrap();
        fs::write(dir.path().join("nested/deeper/d.jpg"), b"x").unwrap();
        fs::write(dir.path().join("nested/skip.txt"), b"x").unwrap();

        let files = walk_files_with_extensions(dir.path(), &exts(&["jpg"]));
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.jpg", "nested/c.jpg", "nested/deeper/d.jpg"]);
    }

    #[test]
    fn test_stable_path_hash() {
        // FNV-1a of the empty input is the offset basis.
        assert_eq!(stable_path_hash(Path::new("")), 0xcbf29ce484222325);
        assert_eq!(
            stable_path_hash(Path::new("data/a.jpg")),
            stable_path_hash(Path::new("data/a.jpg"))
        );
        assert_ne!(
            stable_path_hash(Path::new("data/a.jpg")),
            stable_path_hash(Path::new("data/b.jpg"))
        );
    }

    #[test]
    fn test_walk_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = walk_files_with_extensions(&dir.path().join("missing"), &exts(&["jpg"]));
        assert!(files.is_empty());
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/out.bin");

        write_atomic(&path, |w| w.write_all(b"first")).unwrap();
        write_atomic(&path, |w| w.write_all(b"second")).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers = fs::read_dir(dir.path().join("sub")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_atomic_failure_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, |w| w.write_all(b"good")).unwrap();

        let result = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::other("interrupted"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"good");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
