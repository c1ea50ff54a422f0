//! Output directory reset and byte-for-byte copies of static files.

use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
#[error("{action} {path}: {source}")]
pub struct AssetError {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> AssetError {
    let path = path.to_path_buf();
    move |source| AssetError {
        action,
        path,
        source,
    }
}

/// Make `dir` an existing, empty directory.
///
/// Returns the paths that were removed.
pub fn empty_dir(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let mut removed = Vec::new();
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(io_err("failed to create", dir))?;
        return Ok(removed);
    }

    for entry in std::fs::read_dir(dir).map_err(io_err("failed to list", dir))? {
        let path = entry.map_err(io_err("failed to list", dir))?.path();
        if path.is_dir() && !path.is_symlink() {
            std::fs::remove_dir_all(&path).map_err(io_err("failed to remove", &path))?;
        } else {
            std::fs::remove_file(&path).map_err(io_err("failed to remove", &path))?;
        }
        removed.push(path);
    }
    removed.sort();
    Ok(removed)
}

/// Paths that [`empty_dir`] would remove.
pub fn dir_entries(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err("failed to list", dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err("failed to list", dir))?;
    entries.sort();
    Ok(entries)
}

/// Copy the tree under `from` into `to`. Returns the number of files copied.
pub fn copy_dir(from: &Path, to: &Path) -> Result<usize, AssetError> {
    std::fs::create_dir_all(to).map_err(io_err("failed to create", to))?;

    let mut copied = 0;
    for entry in std::fs::read_dir(from).map_err(io_err("failed to list", from))? {
        let entry = entry.map_err(io_err("failed to list", from))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        if source.is_dir() {
            copied += copy_dir(&source, &target)?;
        } else {
            std::fs::copy(&source, &target).map_err(io_err("failed to copy", &source))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy single files into the root of `to`.
pub fn copy_files(files: &[PathBuf], to: &Path) -> Result<usize, AssetError> {
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        std::fs::copy(file, to.join(name)).map_err(io_err("failed to copy", file))?;
    }
    Ok(files.len())
}

/// Copy the `*.html` files directly inside `pages` to the root of `to`.
pub fn copy_pages(pages: &Path, to: &Path) -> Result<usize, AssetError> {
    let mut copied = 0;
    for entry in std::fs::read_dir(pages).map_err(io_err("failed to list", pages))? {
        let source = entry.map_err(io_err("failed to list", pages))?.path();
        if source.is_file() && source.extension().is_some_and(|ext| ext == "html") {
            if let Some(name) = source.file_name() {
                std::fs::copy(&source, to.join(name)).map_err(io_err("failed to copy", &source))?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dir_keeps_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        std::fs::create_dir_all(out.join("posts")).unwrap();
        std::fs::write(out.join("index.html"), "x").unwrap();
        std::fs::write(out.join("posts/a.html"), "x").unwrap();

        let removed = empty_dir(&out).unwrap();
        assert_eq!(removed, vec![out.join("index.html"), out.join("posts")]);
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_dir_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/b");
        assert!(empty_dir(&out).unwrap().is_empty());
        assert!(out.is_dir());
    }

    #[test]
    fn test_copy_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("assets");
        std::fs::create_dir_all(src.join("css")).unwrap();
        std::fs::write(src.join("css/site.css"), "body{}").unwrap();
        std::fs::write(src.join("logo.svg"), [0u8, 1, 2]).unwrap();

        let dest = dir.path().join("dist/assets");
        assert_eq!(copy_dir(&src, &dest).unwrap(), 2);
        assert_eq!(std::fs::read(dest.join("logo.svg")).unwrap(), vec![0u8, 1, 2]);
        assert_eq!(std::fs::read_to_string(dest.join("css/site.css")).unwrap(), "body{}");
    }

    #[test]
    fn test_copy_pages_only_top_level_html() {
        let dir = tempfile::tempdir().unwrap();
        let pages = dir.path().join("pages");
        std::fs::create_dir_all(pages.join("sub")).unwrap();
        std::fs::write(pages.join("index.html"), "<html>").unwrap();
        std::fs::write(pages.join("notes.txt"), "").unwrap();
        std::fs::write(pages.join("sub/deep.html"), "").unwrap();

        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        assert_eq!(copy_pages(&pages, &out).unwrap(), 1);
        assert!(out.join("index.html").exists());
        assert!(!out.join("notes.txt").exists());
        assert!(!out.join("deep.html").exists());
    }

    #[test]
    fn test_copy_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = copy_files(&[dir.path().join("favicon.ico")], dir.path()).unwrap_err();
        assert!(err.to_string().contains("favicon.ico"));
    }
}
