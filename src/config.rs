//! Run configuration loaded from TOML.
//!
//! Lookup order, first hit wins:
//! 1. an explicit `--config` path;
//! 2. `.sortfoldrc.toml` in the current directory;
//! 3. `~/.config/sortfold/config.toml`;
//! 4. built-in defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! source_directory = "/home/me/Downloads"
//! destination_root = "/mnt/archive/Sorted"
//! deleted_extensions = [".tmp", ".crdownload"]
//! document_image_keywords = ["passport", "receipt"]
//! software_archive_keywords = ["setup", "portable"]
//! minimum_code_files = 3
//! sibling_prefix_ratio = 0.5
//!
//! [folders]
//! soft = "_Soft"
//! unknown = "_Unknown"
//!
//! [[camera_file_name_patterns]]
//! brand = "Nikon"
//! pattern = '^DSC_\d{4}$'
//!
//! [filters]
//! skip_patterns = ["*.part", "**/.sync/**"]
//! ```

use crate::media::{BrandMatcher, DeviceBrandPattern};
use crate::path_planner::is_plain_name;
use glob::Pattern;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or an invalid value.
    ConfigInvalid(String),
    /// Invalid glob pattern in `[filters]`.
    InvalidGlobPattern(String),
    /// Invalid brand regex pattern with the compiler's reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// A required setting is absent after merging file and command line.
    MissingValue(&'static str),
    /// `sibling_prefix_ratio` outside `(0, 1]`.
    InvalidRatio(f64),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::MissingValue(key) => {
                write!(f, "Missing required setting '{}'", key)
            }
            ConfigError::InvalidRatio(ratio) => {
                write!(
                    f,
                    "sibling_prefix_ratio must be greater than 0 and at most 1, got {}",
                    ratio
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Destination folder name for every category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderNames {
    pub soft: String,
    pub archives: String,
    pub images: String,
    pub photos: String,
    pub music: String,
    pub musical_instruments: String,
    pub ebooks: String,
    pub documents: String,
    pub videos: String,
    pub models_3d: String,
    pub certificates: String,
    pub repositories: String,
    pub drivers: String,
    pub firmware: String,
    pub metadata: String,
    pub web: String,
    pub graphics: String,
    pub unknown: String,
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            soft: "Soft".to_string(),
            archives: "Archives".to_string(),
            images: "Images".to_string(),
            photos: "Photos".to_string(),
            music: "Music".to_string(),
            musical_instruments: "Musical Instruments".to_string(),
            ebooks: "E-Books".to_string(),
            documents: "Documents".to_string(),
            videos: "Videos".to_string(),
            models_3d: "3DModels".to_string(),
            certificates: "Certificates".to_string(),
            repositories: "Repositories".to_string(),
            drivers: "Drivers".to_string(),
            firmware: "Firmware".to_string(),
            metadata: "Metadata".to_string(),
            web: "Web".to_string(),
            graphics: "Graphics".to_string(),
            unknown: "Unknown".to_string(),
        }
    }
}

impl FolderNames {
    /// `(key, folder)` pairs in the order settings are printed.
    pub fn entries(&self) -> [(&'static str, &str); 18] {
        [
            ("photos", self.photos.as_str()),
            ("images", self.images.as_str()),
            ("music", self.music.as_str()),
            ("musical_instruments", self.musical_instruments.as_str()),
            ("ebooks", self.ebooks.as_str()),
            ("documents", self.documents.as_str()),
            ("videos", self.videos.as_str()),
            ("models_3d", self.models_3d.as_str()),
            ("archives", self.archives.as_str()),
            ("certificates", self.certificates.as_str()),
            ("firmware", self.firmware.as_str()),
            ("metadata", self.metadata.as_str()),
            ("drivers", self.drivers.as_str()),
            ("repositories", self.repositories.as_str()),
            ("soft", self.soft.as_str()),
            ("web", self.web.as_str()),
            ("graphics", self.graphics.as_str()),
            ("unknown", self.unknown.as_str()),
        ]
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: Vec<(&'static str, String)> = Vec::new();

        for (key, folder) in self.entries() {
            if folder.trim().is_empty() {
                return Err(ConfigError::ConfigInvalid(format!(
                    "folder name for '{}' is empty",
                    key
                )));
            }
            if folder.contains(['/', '\\']) {
                return Err(ConfigError::ConfigInvalid(format!(
                    "folder name for '{}' must not contain path separators: {}",
                    key, folder
                )));
            }
            if !is_plain_name(OsStr::new(folder.trim())) {
                return Err(ConfigError::ConfigInvalid(format!(
                    "folder name for '{}' must be a plain directory name: {}",
                    key, folder
                )));
            }

            let lowered = folder.trim().to_lowercase();
            if let Some((other, _)) = seen.iter().find(|(_, name)| *name == lowered) {
                return Err(ConfigError::ConfigInvalid(format!(
                    "folder name '{}' is used by both '{}' and '{}'",
                    folder, other, key
                )));
            }
            seen.push((key, lowered));
        }
        Ok(())
    }
}

/// A brand name and the file name regex that identifies its devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandPatternConfig {
    pub brand: String,
    pub pattern: String,
}

impl BrandPatternConfig {
    fn new(brand: &str, pattern: &str) -> Self {
        Self {
            brand: brand.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// Rules for leaving files untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Glob patterns matched against the path relative to the source root.
    pub skip_patterns: Vec<String>,
}

/// The raw, deserialized configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_directory: Option<PathBuf>,
    pub destination_root: Option<PathBuf>,
    pub folders: FolderNames,
    pub deleted_extensions: Vec<String>,
    pub document_image_keywords: Vec<String>,
    pub software_archive_keywords: Vec<String>,
    pub minimum_code_files: usize,
    pub sibling_prefix_ratio: f64,
    pub camera_file_name_patterns: Vec<BrandPatternConfig>,
    pub video_file_name_patterns: Vec<BrandPatternConfig>,
    pub filters: FilterRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_directory: None,
            destination_root: None,
            folders: FolderNames::default(),
            deleted_extensions: Vec::new(),
            document_image_keywords: ["passport", "паспорт", "receipt", "invoice", "scan", "скан"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            software_archive_keywords: ["setup", "installer", "portable"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            minimum_code_files: 3,
            sibling_prefix_ratio: 0.5,
            camera_file_name_patterns: vec![
                BrandPatternConfig::new("Android", r"^(IMG|PXL)_\d{8}_\d{6}"),
                BrandPatternConfig::new("Canon", r"^IMG_\d{4}$"),
                BrandPatternConfig::new("Nikon", r"^DSC[_N]\d{4}$"),
                BrandPatternConfig::new("Sony", r"^DSC\d{5}$"),
                BrandPatternConfig::new("DJI", r"^DJI_\d{4}$"),
            ],
            video_file_name_patterns: vec![
                BrandPatternConfig::new("Android", r"^(VID|PXL)_\d{8}_\d{6}"),
                BrandPatternConfig::new("GoPro", r"^G[HX]\d{6}$"),
                BrandPatternConfig::new("DJI", r"^DJI_\d{4}$"),
            ],
            filters: FilterRules::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file cannot be read or
    /// any discovered file fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".sortfoldrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sortfold")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::ConfigInvalid` if TOML parsing fails and
    /// `ConfigError::IoError` if the file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Overrides the source and destination with command-line values.
    pub fn with_paths(mut self, source: Option<PathBuf>, destination: Option<PathBuf>) -> Self {
        if source.is_some() {
            self.source_directory = source;
        }
        if destination.is_some() {
            self.destination_root = destination;
        }
        self
    }

    /// Validate and compile into the form the organizer consumes.
    ///
    /// # Errors
    ///
    /// Returns an error for missing paths, empty folder names, an invalid
    /// ratio, or any regex/glob pattern that fails to compile.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let source_directory = self
            .source_directory
            .ok_or(ConfigError::MissingValue("source_directory"))?;
        let destination_root = self
            .destination_root
            .ok_or(ConfigError::MissingValue("destination_root"))?;

        self.folders.validate()?;

        if !(self.sibling_prefix_ratio > 0.0 && self.sibling_prefix_ratio <= 1.0) {
            return Err(ConfigError::InvalidRatio(self.sibling_prefix_ratio));
        }

        let skip_patterns = self
            .filters
            .skip_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledConfig {
            source_directory,
            destination_root,
            folders: self.folders,
            deleted_extensions: normalize_extensions(&self.deleted_extensions),
            document_image_keywords: normalize_keywords(&self.document_image_keywords),
            software_archive_keywords: normalize_keywords(&self.software_archive_keywords),
            minimum_code_files: self.minimum_code_files.max(1),
            sibling_prefix_ratio: self.sibling_prefix_ratio,
            camera_brands: compile_brands(&self.camera_file_name_patterns)?,
            video_brands: compile_brands(&self.video_file_name_patterns)?,
            skip_patterns,
        })
    }
}

fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for extension in extensions {
        let extension = crate::file_category::normalize_extension(extension);
        if !extension.is_empty() && !normalized.contains(&extension) {
            normalized.push(extension);
        }
    }
    normalized
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn compile_brands(patterns: &[BrandPatternConfig]) -> Result<BrandMatcher, ConfigError> {
    let compiled = patterns
        .iter()
        .map(|entry| {
            RegexBuilder::new(&entry.pattern)
                .case_insensitive(true)
                .build()
                .map(|pattern| DeviceBrandPattern {
                    brand: entry.brand.clone(),
                    pattern,
                })
                .map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: entry.pattern.clone(),
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BrandMatcher::new(compiled))
}

/// Validated configuration with normalized lists and compiled patterns.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub source_directory: PathBuf,
    pub destination_root: PathBuf,
    pub folders: FolderNames,
    /// Lower-cased, dot-prefixed.
    pub deleted_extensions: Vec<String>,
    pub document_image_keywords: Vec<String>,
    pub software_archive_keywords: Vec<String>,
    pub minimum_code_files: usize,
    pub sibling_prefix_ratio: f64,
    pub camera_brands: BrandMatcher,
    pub video_brands: BrandMatcher,
    skip_patterns: Vec<Pattern>,
}

impl CompiledConfig {
    /// Whether a file, given relative to the source root, must be left alone.
    pub fn should_skip(&self, relative_path: &Path) -> bool {
        self.skip_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_paths(config: AppConfig) -> AppConfig {
        config.with_paths(Some(PathBuf::from("/src")), Some(PathBuf::from("/dest")))
    }

    #[test]
    fn test_default_config_compiles() {
        let compiled = with_paths(AppConfig::default()).compile().unwrap();
        assert_eq!(compiled.minimum_code_files, 3);
        assert_eq!(compiled.sibling_prefix_ratio, 0.5);
        assert_eq!(compiled.folders.unknown, "Unknown");
        assert!(compiled.deleted_extensions.is_empty());
        assert!(!compiled.camera_brands.is_empty());
    }

    #[test]
    fn test_missing_paths_are_reported() {
        let result = AppConfig::default().compile();
        assert!(matches!(result, Err(ConfigError::MissingValue("source_directory"))));

        let result = AppConfig::default()
            .with_paths(Some(PathBuf::from("/src")), None)
            .compile();
        assert!(matches!(result, Err(ConfigError::MissingValue("destination_root"))));
    }

    #[test]
    fn test_parse_toml_document() {
        let config: AppConfig = toml::from_str(
            r#"
            source_directory = "/in"
            destination_root = "/out"
            deleted_extensions = ["TMP", ".log", "tmp"]
            minimum_code_files = 0
            sibling_prefix_ratio = 0.75

            [folders]
            soft = "_Soft"

            [[camera_file_name_patterns]]
            brand = "Nikon"
            pattern = '^dsc_\d+$'

            [filters]
            skip_patterns = ["*.part"]
            "#,
        )
        .unwrap();

        let compiled = config.compile().unwrap();
        assert_eq!(compiled.source_directory, PathBuf::from("/in"));
        assert_eq!(compiled.folders.soft, "_Soft");
        assert_eq!(compiled.folders.music, "Music");
        assert_eq!(compiled.deleted_extensions, vec![".tmp", ".log"]);
        assert_eq!(compiled.minimum_code_files, 1);
        assert_eq!(compiled.sibling_prefix_ratio, 0.75);
        assert_eq!(
            compiled.camera_brands.brand_for(Path::new("DSC_0042.JPG")),
            Some("Nikon")
        );
        assert!(compiled.should_skip(Path::new("downloads/movie.part")));
        assert!(!compiled.should_skip(Path::new("movie.mkv")));
    }

    #[test]
    fn test_cli_paths_override_file() {
        let mut config = AppConfig::default();
        config.source_directory = Some(PathBuf::from("/from-file"));
        let config = config.with_paths(Some(PathBuf::from("/from-cli")), None);
        assert_eq!(config.source_directory, Some(PathBuf::from("/from-cli")));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let mut config = with_paths(AppConfig::default());
        config.video_file_name_patterns = vec![BrandPatternConfig::new("Broken", "[invalid(")];

        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_glob_returns_error() {
        let mut config = with_paths(AppConfig::default());
        config.filters.skip_patterns = vec!["[invalid".to_string()];

        assert!(matches!(
            config.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_ratio_bounds() {
        for ratio in [0.0, -0.5, 1.5] {
            let mut config = with_paths(AppConfig::default());
            config.sibling_prefix_ratio = ratio;
            assert!(matches!(config.compile(), Err(ConfigError::InvalidRatio(_))));
        }

        let mut config = with_paths(AppConfig::default());
        config.sibling_prefix_ratio = 1.0;
        assert!(config.compile().is_ok());
    }

    #[test]
    fn test_empty_folder_name_is_rejected() {
        let mut config = with_paths(AppConfig::default());
        config.folders.archives = "  ".to_string();
        assert!(matches!(config.compile(), Err(ConfigError::ConfigInvalid(_))));

        let mut config = with_paths(AppConfig::default());
        config.folders.music = "a/b".to_string();
        assert!(matches!(config.compile(), Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_dot_folder_names_are_rejected() {
        for name in [".", "..", " .. "] {
            let mut config = with_paths(AppConfig::default());
            config.folders.unknown = name.to_string();
            assert!(matches!(config.compile(), Err(ConfigError::ConfigInvalid(_))));
        }
    }

    #[test]
    fn test_shared_folder_name_is_rejected() {
        let mut config = with_paths(AppConfig::default());
        config.folders.web = "documents".to_string();

        match config.compile() {
            Err(ConfigError::ConfigInvalid(message)) => {
                assert!(message.contains("'documents'"));
                assert!(message.contains("'web'"));
            }
            other => panic!("expected a folder name conflict, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("sortfold.toml");
        fs::write(&path, "minimum_code_files = 7\n[folders]\nunknown = \"_Misc\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.minimum_code_files, 7);
        assert_eq!(config.folders.unknown, "_Misc");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = AppConfig::load(Some(Path::new("/no/such/sortfold.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "minimum_code_files = \"many\"").unwrap();

        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::ConfigInvalid(_))
        ));
    }
}
