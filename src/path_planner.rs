/// Collision-safe relocation primitives.
///
/// Every move performed by the organizer goes through this module. Target
/// paths are disambiguated with a ` (n)` suffix so that an existing file or
/// directory is never overwritten.
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Errors that can occur while relocating or pruning filesystem entries.
#[derive(Debug)]
pub enum OrganizeError {
    /// The configured source directory does not exist.
    SourceMissing { path: PathBuf },
    /// Source and destination resolve to the same directory.
    DestinationIsSource { path: PathBuf },
    /// Failed to create a destination directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to move a file to its destination directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to move a whole directory tree.
    DirectoryMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// Failed to delete a file or directory.
    RemoveFailed { path: PathBuf, source: io::Error },
    /// Failed to enumerate a directory.
    ReadDirFailed { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing { path } => {
                write!(f, "Source directory does not exist: {}", path.display())
            }
            Self::DestinationIsSource { path } => {
                write!(
                    f,
                    "Destination root must differ from the source directory: {}",
                    path.display()
                )
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::DirectoryMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move directory {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::RemoveFailed { path, source } => {
                write!(f, "Failed to delete {}: {}", path.display(), source)
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for relocation operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Returns true if anything (file, directory or dangling link) occupies `path`.
fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Returns `candidate` if it is free, otherwise the first free
/// `stem (n).ext` sibling, counting from 1.
///
/// # Examples
///
/// ```
/// use sortfold::path_planner::unique_file_path;
/// use std::path::Path;
///
/// let free = unique_file_path(Path::new("/definitely/not/here/a.txt"));
/// assert_eq!(free, Path::new("/definitely/not/here/a.txt"));
/// ```
pub fn unique_file_path(candidate: &Path) -> PathBuf {
    if !entry_exists(candidate) {
        return candidate.to_path_buf();
    }

    let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = candidate
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1usize;
    loop {
        let next = parent.join(format!("{stem} ({counter}){extension}"));
        if !entry_exists(&next) {
            return next;
        }
        counter += 1;
    }
}

/// Returns a free directory path `root/name`, or `root/name (n)` when the
/// slot is taken by either a directory or a file.
pub fn unique_directory_path(root: &Path, name: &str) -> PathBuf {
    let candidate = root.join(name);
    if !entry_exists(&candidate) {
        return candidate;
    }

    let mut counter = 1usize;
    loop {
        let next = root.join(format!("{name} ({counter})"));
        if !entry_exists(&next) {
            return next;
        }
        counter += 1;
    }
}

/// Creates `path` and all missing parents.
pub fn ensure_directory(path: &Path) -> OrganizeResult<()> {
    fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Moves a file into `destination_dir` under a collision-free name.
///
/// The directory is created if absent. A plain rename is tried first; when
/// that fails (for example across filesystems) the file is copied and the
/// original removed.
///
/// # Returns
///
/// The final path of the moved file.
pub fn move_file(source: &Path, destination_dir: &Path) -> OrganizeResult<PathBuf> {
    ensure_directory(destination_dir)?;

    let file_name = source
        .file_name()
        .ok_or_else(|| OrganizeError::FileMoveFailure {
            source: source.to_path_buf(),
            destination: destination_dir.to_path_buf(),
            source_error: io::Error::new(
                io::ErrorKind::InvalidInput,
                "file has no name component",
            ),
        })?;

    let destination = unique_file_path(&destination_dir.join(file_name));

    if let Err(rename_error) = fs::rename(source, &destination) {
        copy_then_remove(source, &destination).map_err(|_| OrganizeError::FileMoveFailure {
            source: source.to_path_buf(),
            destination: destination.clone(),
            source_error: rename_error,
        })?;
    }

    Ok(destination)
}

fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    if let Err(e) = fs::remove_file(source) {
        // Leave exactly one copy behind.
        let _ = fs::remove_file(destination);
        return Err(e);
    }
    Ok(())
}

/// Moves a whole directory tree to `destination`, which must be a free slot
/// (see [`unique_directory_path`]). Parent directories are created.
pub fn move_directory(source: &Path, destination: &Path) -> OrganizeResult<PathBuf> {
    if let Some(parent) = destination.parent() {
        ensure_directory(parent)?;
    }

    if entry_exists(destination) {
        return Err(OrganizeError::DirectoryMoveFailure {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination is already occupied",
            ),
        });
    }

    if let Err(rename_error) = fs::rename(source, destination) {
        copy_tree_then_remove(source, destination).map_err(|_| {
            OrganizeError::DirectoryMoveFailure {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source_error: rename_error,
            }
        })?;
    }

    Ok(destination.to_path_buf())
}

/// Directory counterpart of the file fallback: copy every entry below
/// `source` into `destination`, then remove `source`. A failed copy removes
/// the partial destination and leaves `source` untouched.
fn copy_tree_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = copy_tree(source, destination) {
        let _ = fs::remove_dir_all(destination);
        return Err(e);
    }
    fs::remove_dir_all(source)
}

fn copy_tree(source: &Path, destination: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// True when `name` is a single ordinary path component: not empty, not
/// `.` or `..`, and free of separators.
pub fn is_plain_name(name: &OsStr) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Deletes a single file.
pub fn delete_file(path: &Path) -> OrganizeResult<()> {
    fs::remove_file(path).map_err(|e| OrganizeError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Deletes an empty directory (non-recursive).
pub fn delete_empty_directory(path: &Path) -> OrganizeResult<()> {
    fs::remove_dir(path).map_err(|e| OrganizeError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Deletes a directory and everything beneath it.
pub fn delete_directory_tree(path: &Path) -> OrganizeResult<()> {
    fs::remove_dir_all(path).map_err(|e| OrganizeError::RemoveFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Returns true if `path` is a readable directory with no entries.
pub fn is_directory_empty(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Counts regular files anywhere beneath `path`.
pub fn count_files(path: &Path) -> usize {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

/// Lists the immediate entries of `dir`, split into files and directories,
/// each sorted by name. Symlinks are treated as files and never followed.
pub fn list_entries(dir: &Path) -> OrganizeResult<(Vec<PathBuf>, Vec<PathBuf>)> {
    let entries = fs::read_dir(dir).map_err(|e| OrganizeError::ReadDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    let mut directories = Vec::new();

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            directories.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }

    files.sort();
    directories.sort();
    Ok((files, directories))
}
