//! Capability-style filesystem helpers for sitescore datasets.
//!
//! Every path goes through `cap-std` directory handles opened with ambient
//! authority, and every path is UTF-8 via `camino`. Dataset writers create
//! their parent directories on demand; loaders probe for files and their
//! modification times without treating absence as an error.
#![forbid(unsafe_code)]

use std::io;
use std::path::{Component, MAIN_SEPARATOR};
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Open an existing file for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create or truncate `path`, creating missing parent directories first.
pub fn create_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    dir.create(name.as_str())
}

/// Open the directory containing `path` and return it with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} has no file name")))?
        .to_owned();
    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}

/// Create every missing directory above `path`.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }
    let (root, relative) = split_root(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    root.create_dir_all(&relative)
}

/// Whether `path` names a regular file. A missing file or directory is
/// `Ok(false)`.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    match metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Last modification time of `path`, or `None` when it does not exist.
pub fn modified_time(path: &Utf8Path) -> io::Result<Option<SystemTime>> {
    match metadata(path) {
        Ok(meta) => meta.modified().map(|t| Some(t.into_std())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

fn metadata(path: &Utf8Path) -> io::Result<fs_utf8::Metadata> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str())
}

/// Split `path` into an ambient root directory handle and the remainder
/// relative to it.
///
/// Absolute paths are anchored at the filesystem root (or the Windows
/// prefix); relative paths at the current directory.
pub fn split_root(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let base = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(format!("{prefix}{MAIN_SEPARATOR}"))
        }
        Some(Component::RootDir) => Utf8PathBuf::from(MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = if base == "." {
        path.to_path_buf()
    } else {
        path.strip_prefix(&base)
            .map_err(|_| io::Error::other(format!("cannot strip {base} from {path}")))?
            .to_path_buf()
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::Write;
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"))
    }

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|p| panic!("non UTF-8 temp dir: {}", p.display()))
    }

    #[rstest]
    fn create_makes_missing_parents(temp_dir: TempDir) {
        let path = utf8(&temp_dir).join("nested/deeper/file.csv");
        let mut file = create_utf8_file(&path).unwrap_or_else(|err| panic!("create: {err}"));
        file.write_all(b"x").unwrap_or_else(|err| panic!("write: {err}"));
        assert!(file_is_file(&path).unwrap_or(false));
    }

    #[rstest]
    fn missing_file_is_not_an_error(temp_dir: TempDir) {
        let path = utf8(&temp_dir).join("absent.csv");
        assert!(matches!(file_is_file(&path), Ok(false)));
        assert!(matches!(modified_time(&path), Ok(None)));
    }

    #[rstest]
    fn directory_is_not_a_file(temp_dir: TempDir) {
        let path = utf8(&temp_dir);
        assert!(matches!(file_is_file(&path), Ok(false)));
    }

    #[rstest]
    fn modified_time_reported_for_existing_file(temp_dir: TempDir) {
        let path = utf8(&temp_dir).join("data.csv");
        drop(create_utf8_file(&path).unwrap_or_else(|err| panic!("create: {err}")));
        assert!(matches!(modified_time(&path), Ok(Some(_))));
    }

    #[rstest]
    fn split_root_keeps_relative_paths() {
        let (_, relative) =
            split_root(Utf8Path::new("data/paris")).unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(relative, "data/paris");
    }
}
