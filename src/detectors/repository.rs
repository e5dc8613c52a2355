use super::{CategoryParsingService, file_name_of};
use crate::file_category::{CODE_EXTENSIONS, CategoryId, extension_in, extension_of};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const VCS_MARKERS: &[&str] = &[".git", ".hg", ".svn"];

const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "pnpm-lock.yaml",
    "yarn.lock",
    "package-lock.json",
    "tsconfig.json",
    "pyproject.toml",
    "requirements.txt",
    "Pipfile",
    "Gemfile",
    "go.mod",
    "Cargo.toml",
    "composer.json",
    "Makefile",
    "CMakeLists.txt",
];

/// Recognizes source repositories by VCS markers, manifests or a minimum
/// number of code files.
#[derive(Debug, Clone)]
pub struct RepositoryDetector {
    minimum_code_files: usize,
}

impl RepositoryDetector {
    pub fn new(minimum_code_files: usize) -> Self {
        Self {
            minimum_code_files: minimum_code_files.max(1),
        }
    }

    pub fn is_repository(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }

        if VCS_MARKERS.iter().any(|marker| path.join(marker).is_dir()) {
            return true;
        }

        if Self::has_top_level_manifest(path) {
            return true;
        }

        self.has_enough_code_files(path)
    }

    fn has_enough_code_files(&self, path: &Path) -> bool {
        WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| extension_in(CODE_EXTENSIONS, &extension_of(e.path())))
            .take(self.minimum_code_files)
            .count()
            >= self.minimum_code_files
    }

    /// Descends through wrapper folders (a single subdirectory and no files)
    /// and returns the deepest level that still qualifies as a repository.
    ///
    /// Falls back to `path` itself when no deeper level qualifies.
    pub fn find_repository_root(&self, path: &Path) -> PathBuf {
        let mut root = path.to_path_buf();
        let mut current = path.to_path_buf();

        while let Some(child) = Self::single_wrapped_child(&current) {
            if self.is_repository(&child) {
                root = child.clone();
            }
            current = child;
        }

        root
    }

    fn single_wrapped_child(path: &Path) -> Option<PathBuf> {
        let mut directories = Vec::new();
        for entry in fs::read_dir(path).ok()?.flatten() {
            let file_type = entry.file_type().ok()?;
            if file_type.is_dir() {
                directories.push(entry.path());
            } else {
                return None;
            }
        }

        match directories.as_slice() {
            [only] if !Self::is_vcs_marker(only) => Some(only.clone()),
            _ => None,
        }
    }

    fn is_vcs_marker(path: &Path) -> bool {
        file_name_of(path)
            .map(|name| VCS_MARKERS.contains(&name.as_str()))
            .unwrap_or(false)
    }

    fn has_top_level_manifest(path: &Path) -> bool {
        fs::read_dir(path)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .any(|e| Self::is_manifest(&e.path()))
            })
            .unwrap_or(false)
    }

    /// Manifest names compare case-insensitively (`makefile`, `cargo.toml`).
    fn is_manifest(path: &Path) -> bool {
        file_name_of(path)
            .map(|name| {
                MANIFEST_FILES
                    .iter()
                    .any(|manifest| manifest.eq_ignore_ascii_case(&name))
            })
            .unwrap_or(false)
    }
}

impl CategoryParsingService for RepositoryDetector {
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Repositories
            && (Self::is_manifest(path) || extension_in(CODE_EXTENSIONS, &extension_of(path)))
    }

    fn is_folder_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Repositories && self.is_repository(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_git_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let repo = temp_dir.path().join("project");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert!(RepositoryDetector::new(3).is_repository(&repo));
    }

    #[test]
    fn test_manifest_marker() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(&temp_dir.path().join("web").join("package.json"));

        assert!(RepositoryDetector::new(3).is_repository(&temp_dir.path().join("web")));
    }

    #[test]
    fn test_manifest_names_ignore_case() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(&temp_dir.path().join("c-tool").join("makefile"));
        touch(&temp_dir.path().join("rs-tool").join("cargo.toml"));
        touch(&temp_dir.path().join("notes").join("makefile.txt"));

        let detector = RepositoryDetector::new(3);
        assert!(detector.is_repository(&temp_dir.path().join("c-tool")));
        assert!(detector.is_repository(&temp_dir.path().join("rs-tool")));
        assert!(!detector.is_repository(&temp_dir.path().join("notes")));
        assert!(detector.is_file_of_category(CategoryId::Repositories, Path::new("CMAKELISTS.TXT")));
    }

    #[test]
    fn test_code_file_threshold() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let scripts = temp_dir.path().join("scripts");
        touch(&scripts.join("a.py"));
        touch(&scripts.join("nested").join("b.py"));

        assert!(!RepositoryDetector::new(3).is_repository(&scripts));
        assert!(RepositoryDetector::new(2).is_repository(&scripts));
    }

    #[test]
    fn test_root_resolution_descends_wrappers() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let wrapper = temp_dir.path().join("download");
        let repo = wrapper.join("extracted").join("tool-main");
        touch(&repo.join("Cargo.toml"));
        touch(&repo.join("src").join("main.rs"));

        let detector = RepositoryDetector::new(3);
        assert_eq!(detector.find_repository_root(&wrapper), repo);
    }

    #[test]
    fn test_root_resolution_keeps_marked_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let repo = temp_dir.path().join("app");
        fs::create_dir_all(repo.join(".git")).unwrap();
        touch(&repo.join("main.go"));

        let detector = RepositoryDetector::new(3);
        assert_eq!(detector.find_repository_root(&repo), repo);
    }

    #[test]
    fn test_file_predicate() {
        let detector = RepositoryDetector::new(3);
        assert!(detector.is_file_of_category(CategoryId::Repositories, Path::new("go.mod")));
        assert!(detector.is_file_of_category(CategoryId::Repositories, Path::new("lib.rs")));
        assert!(!detector.is_file_of_category(CategoryId::Repositories, Path::new("a.pdf")));
        assert!(!detector.is_file_of_category(CategoryId::Soft, Path::new("lib.rs")));
    }
}
