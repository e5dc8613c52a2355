use super::{CategoryParsingService, contains_any, file_name_of};
use crate::file_category::{CategoryId, extension_in, extension_of};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const INSTALLER_EXTENSIONS: &[&str] = &[
    ".exe", ".msi", ".msix", ".apk", ".dmg", ".pkg", ".deb", ".rpm", ".appimage", ".iso",
];

const SETUP_KEYWORDS: &[&str] = &["setup", "install", "driver"];

/// Folder names that already are software collections and must never be
/// treated as a single distribution.
const SOFT_FOLDER_NAMES: &[&str] = &["soft", "софт"];

static VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<name>.+?)(?:[\s._-]*v?\d+(?:[._-]\d+)*)(?:[\s._-]*(?:setup|installer|x86|x64|win\d+)?)?$",
    )
    .expect("version suffix pattern is valid")
});

/// Recognizes unpacked software installer payloads and installer files.
#[derive(Debug, Clone, Default)]
pub struct SoftwareDistributionDetector;

impl SoftwareDistributionDetector {
    pub fn new() -> Self {
        Self
    }

    /// A distribution directory has an installer among its top-level files,
    /// or a setup keyword in its own name. Soft collection folders are
    /// never distributions.
    pub fn is_distribution_directory(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }

        let folder_name = file_name_of(path).unwrap_or_default();
        if Self::is_soft_folder(&folder_name) {
            return false;
        }

        let has_installer = fs::read_dir(path)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .any(|e| Self::matches_installer(&e.path()))
            })
            .unwrap_or(false);

        has_installer || contains_any(&folder_name, SETUP_KEYWORDS)
    }

    /// Installer extension, or a setup keyword in the file stem.
    pub fn matches_installer(path: &Path) -> bool {
        if extension_in(INSTALLER_EXTENSIONS, &extension_of(path)) {
            return true;
        }

        path.file_stem()
            .map(|stem| contains_any(&stem.to_string_lossy(), SETUP_KEYWORDS))
            .unwrap_or(false)
    }

    fn is_soft_folder(folder_name: &str) -> bool {
        let normalized = folder_name.trim_start_matches('_').to_lowercase();
        SOFT_FOLDER_NAMES.contains(&normalized.as_str())
    }
}

impl CategoryParsingService for SoftwareDistributionDetector {
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Soft && Self::matches_installer(path)
    }

    fn is_folder_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Soft && self.is_distribution_directory(path)
    }
}

/// Extracts a program name from an installer file name carrying a version
/// suffix, e.g. `vlc-3.0.20-win64.exe` gives `vlc`.
///
/// Returns `None` when the stem has no version number.
pub fn program_folder_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let captures = VERSION_SUFFIX.captures(&stem)?;
    let name = captures
        .name("name")?
        .as_str()
        .trim()
        .trim_matches(|c| matches!(c, '-' | '_' | '.' | ' '));

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_installer_matching() {
        assert!(SoftwareDistributionDetector::matches_installer(Path::new("tool.MSI")));
        assert!(SoftwareDistributionDetector::matches_installer(Path::new("Setup_Helper.bin")));
        assert!(!SoftwareDistributionDetector::matches_installer(Path::new("notes.txt")));
    }

    #[test]
    fn test_directory_with_installer_is_distribution() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dist = temp_dir.path().join("Editor");
        fs::create_dir(&dist).unwrap();
        fs::write(dist.join("editor.exe"), "MZ").unwrap();
        fs::write(dist.join("readme.txt"), "hi").unwrap();

        assert!(SoftwareDistributionDetector::new().is_distribution_directory(&dist));
    }

    #[test]
    fn test_keyword_folder_is_distribution() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dist = temp_dir.path().join("Printer Installer");
        fs::create_dir(&dist).unwrap();
        fs::write(dist.join("data.cab"), "x").unwrap();

        assert!(SoftwareDistributionDetector::new().is_distribution_directory(&dist));
    }

    #[test]
    fn test_soft_collection_folder_is_excluded() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let soft = temp_dir.path().join("_Soft");
        fs::create_dir(&soft).unwrap();
        fs::write(soft.join("tool.exe"), "MZ").unwrap();

        assert!(!SoftwareDistributionDetector::new().is_distribution_directory(&soft));
    }

    #[test]
    fn test_installer_in_subfolder_does_not_count() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let wrapper = temp_dir.path().join("Stuff");
        fs::create_dir_all(wrapper.join("inner")).unwrap();
        fs::write(wrapper.join("inner").join("tool.exe"), "MZ").unwrap();

        assert!(!SoftwareDistributionDetector::new().is_distribution_directory(&wrapper));
    }

    #[test]
    fn test_program_folder_name() {
        assert_eq!(
            program_folder_name(Path::new("vlc-3.0.20-win64.exe")),
            Some("vlc".to_string())
        );
        assert_eq!(
            program_folder_name(Path::new("Telegram Setup 4.8.1 x64.exe")),
            Some("Telegram Setup".to_string())
        );
        assert_eq!(program_folder_name(Path::new("demo.exe")), None);
    }
}
