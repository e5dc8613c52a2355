//! Routing of compressed archives by their companions.
//!
//! An archive usually travels with something of the same name: the
//! installer it packs, the album it was extracted into, an earlier copy
//! already filed in the destination. The matcher looks for such a sibling
//! and files the archive next to it instead of under Archives.
//!
//! Names are compared by a fuzzy prefix rule (see [`is_prefix_match`]). It is
//! deliberately loose and can over-match very short names.

use crate::file_category::{CategoryId, extension_of};
use crate::path_planner::{OrganizeResult, delete_directory_tree, is_plain_name, move_file};
use crate::registry::CategoryRegistry;
use crate::statistics::RunStatistics;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where an archive ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRoute {
    pub destination: PathBuf,
    pub category_folder: String,
    /// Stale extraction directory removed before the move, if any.
    pub removed_stale_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArchiveTarget {
    directory: PathBuf,
    category_folder: String,
}

/// Case-insensitive comparison of the first `floor(min(len) * ratio)`
/// characters of both names. A zero-length comparison never matches.
///
/// # Examples
///
/// ```
/// use sortfold::archive::is_prefix_match;
///
/// assert!(is_prefix_match("Demo", "demo (1)", 0.5));
/// assert!(is_prefix_match("photoshop_2024", "Photoshop", 0.5));
/// assert!(!is_prefix_match("demo", "readme", 0.5));
/// assert!(!is_prefix_match("a", "a", 0.5));
/// ```
pub fn is_prefix_match(a: &str, b: &str, ratio: f64) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return false;
    }

    let shortest = a.chars().count().min(b.chars().count());
    let compare_len = (shortest as f64 * ratio).floor() as usize;
    if compare_len == 0 {
        return false;
    }

    a.chars()
        .take(compare_len)
        .flat_map(char::to_lowercase)
        .eq(b.chars().take(compare_len).flat_map(char::to_lowercase))
}

/// Name used for sibling comparison: directories by full name, files by stem.
fn comparable_name(path: &Path, is_dir: bool) -> Option<String> {
    let name = if is_dir {
        path.file_name()
    } else {
        path.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
}

pub struct ArchiveSiblingMatcher {
    software_keywords: Vec<String>,
    ratio: f64,
}

impl ArchiveSiblingMatcher {
    pub fn new<I, S>(software_keywords: I, ratio: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            software_keywords: software_keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            ratio,
        }
    }

    /// Moves `archive` to the directory chosen by its siblings and returns
    /// the final location. Nothing is ever overwritten.
    ///
    /// # Errors
    ///
    /// Fails if the stale extraction directory cannot be removed or the
    /// archive cannot be moved.
    pub fn route(
        &self,
        registry: &CategoryRegistry,
        archive: &Path,
        destination_root: &Path,
        statistics: &mut RunStatistics,
    ) -> OrganizeResult<ArchiveRoute> {
        let removed_stale_directory =
            self.remove_stale_extraction(registry, archive, destination_root, statistics)?;

        let target = self.plan(registry, archive, destination_root);
        let destination = move_file(archive, &target.directory)?;

        Ok(ArchiveRoute {
            destination,
            category_folder: target.category_folder,
            removed_stale_directory,
        })
    }

    fn plan(
        &self,
        registry: &CategoryRegistry,
        archive: &Path,
        destination_root: &Path,
    ) -> ArchiveTarget {
        let archive_folder = registry
            .get(CategoryId::Archives)
            .map(|c| c.folder_name())
            .unwrap_or_else(|| CategoryId::Archives.display_name());

        let Some(stem) = comparable_name(archive, false) else {
            return Self::target_in(destination_root, archive_folder);
        };

        if self.is_software_archive(&stem)
            && let Some(soft) = registry.get(CategoryId::Soft)
        {
            return Self::target_in(destination_root, soft.folder_name());
        }

        if let Some(folder) = self.match_source_sibling(registry, archive, &stem) {
            return Self::target_in(destination_root, &folder);
        }

        if let Some(target) =
            self.match_destination_entry(registry, archive, &stem, destination_root, archive_folder)
        {
            return target;
        }

        Self::target_in(destination_root, archive_folder)
    }

    fn target_in(destination_root: &Path, folder: &str) -> ArchiveTarget {
        ArchiveTarget {
            directory: destination_root.join(folder),
            category_folder: folder.to_string(),
        }
    }

    /// Deletes `<destination>/<Soft>/<archive stem>` left by an earlier
    /// extraction of the same archive.
    fn remove_stale_extraction(
        &self,
        registry: &CategoryRegistry,
        archive: &Path,
        destination_root: &Path,
        statistics: &mut RunStatistics,
    ) -> OrganizeResult<Option<PathBuf>> {
        let (Some(soft), Some(stem)) = (registry.get(CategoryId::Soft), archive.file_stem()) else {
            return Ok(None);
        };
        // `...zip` has the stem `..`; joining it would name the destination root.
        if !is_plain_name(stem) {
            return Ok(None);
        }

        let stale = destination_root.join(soft.folder_name()).join(stem);
        if !stale.is_dir() {
            return Ok(None);
        }

        delete_directory_tree(&stale)?;
        statistics.record_deleted_directory(&stale);
        Ok(Some(stale))
    }

    fn is_software_archive(&self, stem: &str) -> bool {
        let lowered = stem.to_lowercase();
        self.software_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
    }

    /// Scans the archive's own directory. An owned sibling directory lends
    /// its capability's category; a sibling file lends its extension's.
    fn match_source_sibling(
        &self,
        registry: &CategoryRegistry,
        archive: &Path,
        stem: &str,
    ) -> Option<String> {
        let parent = archive.parent()?;
        let mut siblings: Vec<PathBuf> = fs::read_dir(parent)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path != archive)
            .collect();
        siblings.sort();

        for sibling in siblings {
            let is_dir = sibling.is_dir();
            let Some(name) = comparable_name(&sibling, is_dir) else {
                continue;
            };
            if !is_prefix_match(stem, &name, self.ratio) {
                continue;
            }

            if is_dir {
                if let Some((category, _)) = registry
                    .non_splittable()
                    .find(|(_, capability)| capability.owns_directory(&sibling))
                {
                    return Some(category.folder_name().to_string());
                }
                continue;
            }

            if let Some(category) = registry.resolve(&extension_of(&sibling)) {
                return Some(category.folder_name().to_string());
            }
        }

        None
    }

    /// Scans everything already filed under the destination root. Top-level
    /// category folders themselves are not candidates.
    fn match_destination_entry(
        &self,
        registry: &CategoryRegistry,
        archive: &Path,
        stem: &str,
        destination_root: &Path,
        archive_folder: &str,
    ) -> Option<ArchiveTarget> {
        if !destination_root.is_dir() {
            return None;
        }

        for entry in WalkDir::new(destination_root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path == archive {
                continue;
            }

            let is_dir = entry.file_type().is_dir();
            if is_dir
                && entry.depth() == 1
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| registry.by_folder_name(name).is_some())
            {
                continue;
            }

            let Some(name) = comparable_name(path, is_dir) else {
                continue;
            };
            if !is_prefix_match(stem, &name, self.ratio) {
                continue;
            }

            let directory = if is_dir {
                path.to_path_buf()
            } else {
                match path.parent() {
                    Some(parent) if parent != destination_root => parent.to_path_buf(),
                    _ => continue,
                }
            };

            let category_folder = directory
                .strip_prefix(destination_root)
                .ok()
                .and_then(|relative| relative.components().next())
                .and_then(|top| registry.by_folder_name(&top.as_os_str().to_string_lossy()))
                .map(|c| c.folder_name())
                .unwrap_or(archive_folder)
                .to_string();

            return Some(ArchiveTarget {
                directory,
                category_folder,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::{
        ARCHIVE_EXTENSIONS, Category, DOCUMENT_EXTENSIONS, MUSIC_EXTENSIONS, NonSplittable,
        SOFT_EXTENSIONS,
    };
    use tempfile::TempDir;

    struct OwnsAlbums;

    impl NonSplittable for OwnsAlbums {
        fn owns_directory(&self, path: &Path) -> bool {
            path.join("01.mp3").exists()
        }
    }

    fn registry() -> CategoryRegistry {
        CategoryRegistry::new(vec![
            Category::new(CategoryId::Music, "Music", MUSIC_EXTENSIONS).with_capability(OwnsAlbums),
            Category::new(CategoryId::Documents, "Documents", DOCUMENT_EXTENSIONS),
            Category::new(CategoryId::Archives, "Archives", ARCHIVE_EXTENSIONS),
            Category::new(CategoryId::Soft, "Soft", SOFT_EXTENSIONS),
            Category::unknown("Unknown"),
        ])
        .unwrap()
    }

    struct Dirs {
        _temp_dir: TempDir,
        source: PathBuf,
        dest: PathBuf,
    }

    fn dirs() -> Dirs {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("source");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        Dirs {
            _temp_dir: temp_dir,
            source,
            dest,
        }
    }

    fn matcher() -> ArchiveSiblingMatcher {
        ArchiveSiblingMatcher::new(["portable"], 0.5)
    }

    #[test]
    fn test_prefix_rule_boundaries() {
        assert!(is_prefix_match("report", "Report_final", 0.5));
        assert!(!is_prefix_match("report", "summary", 0.5));
        assert!(!is_prefix_match("", "anything", 0.5));
        // Two-character names compare a single character: known over-match.
        assert!(is_prefix_match("ab", "ax", 0.5));
        assert!(!is_prefix_match("ab", "ax", 1.0));
        assert!(is_prefix_match("ÄBCD", "äbxx", 0.5));
    }

    #[test]
    fn test_no_sibling_falls_back_to_archives() {
        let d = dirs();
        let archive = d.source.join("demo.zip");
        fs::write(&archive, "PK").unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.destination, d.dest.join("Archives").join("demo.zip"));
        assert_eq!(route.category_folder, "Archives");
        assert!(!archive.exists());
    }

    #[test]
    fn test_keyword_routes_to_soft() {
        let d = dirs();
        let archive = d.source.join("GIMP Portable.zip");
        fs::write(&archive, "PK").unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.destination, d.dest.join("Soft").join("GIMP Portable.zip"));
    }

    #[test]
    fn test_source_file_sibling_lends_category() {
        let d = dirs();
        let archive = d.source.join("thesis.zip");
        fs::write(&archive, "PK").unwrap();
        fs::write(d.source.join("Thesis draft.pdf"), "%PDF").unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.category_folder, "Documents");
        assert_eq!(route.destination, d.dest.join("Documents").join("thesis.zip"));
    }

    #[test]
    fn test_source_owned_directory_lends_category() {
        let d = dirs();
        let archive = d.source.join("Album.rar");
        fs::write(&archive, "Rar!").unwrap();
        let album = d.source.join("Album 2019");
        fs::create_dir(&album).unwrap();
        fs::write(album.join("01.mp3"), "ID3").unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.category_folder, "Music");
    }

    #[test]
    fn test_destination_entry_and_stale_extraction() {
        let d = dirs();
        let archive = d.source.join("demo.zip");
        fs::write(&archive, "PK").unwrap();
        fs::create_dir_all(d.dest.join("Soft").join("demo")).unwrap();
        fs::write(d.dest.join("Soft").join("demo").join("demo.exe"), "MZ").unwrap();
        fs::write(d.dest.join("Soft").join("demo.exe"), "MZ").unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.removed_stale_directory, Some(d.dest.join("Soft").join("demo")));
        assert!(!d.dest.join("Soft").join("demo").exists());
        assert_eq!(route.destination, d.dest.join("Soft").join("demo.zip"));
        assert_eq!(route.category_folder, "Soft");
        assert_eq!(stats.deleted_directories().len(), 1);
    }

    #[test]
    fn test_dot_stems_never_remove_destination_folders() {
        let d = dirs();
        fs::create_dir_all(d.dest.join("Documents")).unwrap();
        fs::write(d.dest.join("Documents").join("precious.pdf"), "%PDF").unwrap();
        fs::create_dir_all(d.dest.join("Soft").join("tool")).unwrap();
        let mut stats = RunStatistics::default();

        for name in ["...zip", "..zip"] {
            let archive = d.source.join(name);
            fs::write(&archive, "PK").unwrap();

            let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
            assert_eq!(route.removed_stale_directory, None);
            assert!(route.destination.starts_with(&d.dest));
        }

        assert!(d.dest.join("Documents").join("precious.pdf").is_file());
        assert!(d.dest.join("Soft").join("tool").is_dir());
        assert!(stats.deleted_directories().is_empty());
    }

    #[test]
    fn test_category_folders_are_not_siblings() {
        let d = dirs();
        let archive = d.source.join("Sofia.zip");
        fs::write(&archive, "PK").unwrap();
        fs::create_dir_all(d.dest.join("Soft")).unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.category_folder, "Archives");
    }

    #[test]
    fn test_existing_archive_is_not_overwritten() {
        let d = dirs();
        let archive = d.source.join("demo.zip");
        fs::write(&archive, "new").unwrap();
        fs::create_dir_all(d.dest.join("Archives")).unwrap();
        fs::write(d.dest.join("Archives").join("demo.zip"), "old").unwrap();
        let mut stats = RunStatistics::default();

        let route = matcher().route(&registry(), &archive, &d.dest, &mut stats).unwrap();
        assert_eq!(route.destination, d.dest.join("Archives").join("demo (1).zip"));
        assert_eq!(
            fs::read_to_string(d.dest.join("Archives").join("demo.zip")).unwrap(),
            "old"
        );
    }
}
