//! Category definitions for routing files into destination folders.
//!
//! A [`Category`] is an immutable value: a stable [`CategoryId`], a display
//! name, the destination folder name and a set of lower-cased, dot-prefixed
//! extensions. Some categories additionally carry a [`NonSplittable`]
//! capability, which lets them claim whole directories.
//!
//! # Examples
//!
//! ```
//! use sortfold::file_category::{Category, CategoryId};
//!
//! let music = Category::new(CategoryId::Music, "Music", &["MP3", "flac", ".mp3"]);
//! assert!(music.matches(".mp3"));
//! assert!(music.matches("FLAC"));
//! assert_eq!(music.extensions().len(), 2);
//! ```

use crate::path_planner::unique_directory_path;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Stable identifier for every category the organizer knows about.
///
/// Detectors answer "is this file of category X" against this key instead of
/// inspecting category types at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CategoryId {
    Photos,
    Images,
    Music,
    MusicalInstruments,
    EBooks,
    Documents,
    Videos,
    ThreeDModels,
    Archives,
    Certificates,
    Firmware,
    Metadata,
    Drivers,
    Repositories,
    Soft,
    Web,
    Graphics,
    /// Terminal catch-all; has no extensions.
    Unknown,
}

impl CategoryId {
    /// Returns the human-readable name of this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            CategoryId::Photos => "Photos",
            CategoryId::Images => "Images",
            CategoryId::Music => "Music",
            CategoryId::MusicalInstruments => "Musical Instruments",
            CategoryId::EBooks => "E-Books",
            CategoryId::Documents => "Documents",
            CategoryId::Videos => "Videos",
            CategoryId::ThreeDModels => "3DModels",
            CategoryId::Archives => "Archives",
            CategoryId::Certificates => "Certificates",
            CategoryId::Firmware => "Firmware",
            CategoryId::Metadata => "Metadata",
            CategoryId::Drivers => "Drivers",
            CategoryId::Repositories => "Repositories",
            CategoryId::Soft => "Soft",
            CategoryId::Web => "Web",
            CategoryId::Graphics => "Graphics",
            CategoryId::Unknown => "Unknown",
        }
    }

    /// Photos and Images share one extension set and are told apart at
    /// resolution time.
    pub fn is_image_family(&self) -> bool {
        matches!(self, CategoryId::Photos | CategoryId::Images)
    }
}

/// Extensions shared by the image family (Photos and Images).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".raw", ".cr2", ".cr3", ".nef",
    ".arw", ".orf", ".sr2", ".dng", ".rw2", ".pef", ".raf", ".srw", ".k25", ".webp", ".heic",
];

pub const MUSIC_EXTENSIONS: &[&str] = &[
    ".mp3", ".wav", ".flac", ".aac", ".m4a", ".ogg", ".wma", ".aiff", ".alac", ".opus",
];

pub const MUSICAL_INSTRUMENT_EXTENSIONS: &[&str] =
    &[".gp", ".gpx", ".gp5", ".gp4", ".gp3", ".mid", ".midi"];

pub const EBOOK_EXTENSIONS: &[&str] = &[
    ".epub", ".fb2", ".mobi", ".azw3", ".djvu", ".cbr", ".cbz", ".ibooks", ".kfx",
];

pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xlsx", ".xls", ".csv", ".ppt", ".pptx",
    ".ipynb", ".names",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mov", ".avi", ".mkv", ".wmv", ".flv", ".webm", ".mpeg",
];

pub const MODEL_3D_EXTENSIONS: &[&str] = &[
    ".obj", ".fbx", ".stl", ".3ds", ".dae", ".ply", ".blend", ".gltf", ".glb", ".usdz", ".step",
    ".stp", ".iges", ".igs", ".3mf", ".gcode", ".scad",
];

pub const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"];

pub const CERTIFICATE_EXTENSIONS: &[&str] = &[".cer", ".crt", ".pfx", ".p12", ".pem"];

pub const FIRMWARE_EXTENSIONS: &[&str] = &[".bin", ".dat"];

pub const METADATA_EXTENSIONS: &[&str] = &[
    ".hprj", ".xmp", ".dop", ".pp3", ".on1", ".lrtemplate", ".acr", ".drx", ".rmd", ".sidecar",
];

pub const DRIVER_EXTENSIONS: &[&str] = &[".inf", ".sys", ".cat", ".drv", ".cab"];

pub const CODE_EXTENSIONS: &[&str] = &[
    ".cs", ".fs", ".vb", ".csproj", ".sln", ".js", ".ts", ".jsx", ".tsx", ".py", ".rb", ".go",
    ".rs", ".java", ".kt", ".kts", ".cpp", ".cxx", ".cc", ".c", ".h", ".hpp", ".swift", ".php",
    ".scala",
];

pub const DISK_IMAGE_EXTENSIONS: &[&str] = &[
    ".iso", ".cso", ".dmg", ".img", ".mdf", ".mds", ".nrg", ".ccd", ".isz", ".vhd", ".vhdx",
];

/// Installer packages, plus configuration/XML files that Soft collects into
/// sub-buckets. Disk images are appended when the category is built.
pub const SOFT_EXTENSIONS: &[&str] = &[
    ".exe", ".msi", ".msix", ".apk", ".pkg", ".deb", ".rpm", ".appimage", ".conf", ".xml",
];

pub const WEB_EXTENSIONS: &[&str] = &[
    ".html", ".htm", ".xhtml", ".mhtml", ".mht", ".url", ".webloc", ".website",
];

pub const GRAPHICS_EXTENSIONS: &[&str] = &[
    ".psd", ".psb", ".ai", ".eps", ".xcf", ".kra", ".ora", ".clip", ".afphoto", ".afdesign",
    ".afpub", ".cdr", ".sai", ".mdp", ".pdn", ".pspimage", ".reb", ".sketch", ".fig",
];

/// Normalizes an extension to the lower-cased, dot-prefixed form.
///
/// Blank input yields an empty string.
///
/// # Examples
///
/// ```
/// use sortfold::file_category::normalize_extension;
///
/// assert_eq!(normalize_extension(" JPG "), ".jpg");
/// assert_eq!(normalize_extension(".Tmp"), ".tmp");
/// assert_eq!(normalize_extension(""), "");
/// ```
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim();
    if trimmed.is_empty() || trimmed == "." {
        return String::new();
    }
    let lowered = trimmed.to_lowercase();
    if lowered.starts_with('.') {
        lowered
    } else {
        format!(".{lowered}")
    }
}

/// Returns the normalized extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| normalize_extension(&e.to_string_lossy()))
        .unwrap_or_default()
}

/// Returns true if `extension` (any casing, with or without dot) is in `list`.
pub fn extension_in(list: &[&str], extension: &str) -> bool {
    let normalized = normalize_extension(extension);
    !normalized.is_empty() && list.iter().any(|e| *e == normalized)
}

/// Capability of categories whose directories are relocated as one unit.
///
/// Owned directories are never split up; their files are not individually
/// re-classified.
pub trait NonSplittable {
    /// Whether this category claims the whole directory at `path`.
    fn owns_directory(&self, path: &Path) -> bool;

    /// The directory that is actually moved once `path` is claimed.
    /// Repositories use this to find the real repository root.
    fn directory_root(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }

    /// A free destination for an owned directory under `category_root`.
    fn directory_destination(&self, category_root: &Path, directory: &Path) -> PathBuf {
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Directory".to_string());
        unique_directory_path(category_root, &name)
    }

    /// Destination directory for a loose file of this category.
    fn file_destination(&self, category_root: &Path, _file: &Path) -> PathBuf {
        category_root.to_path_buf()
    }
}

/// A registered destination category.
pub struct Category {
    id: CategoryId,
    folder_name: String,
    extensions: Vec<String>,
    capability: Option<Box<dyn NonSplittable>>,
}

impl Category {
    /// Creates a category, normalizing and de-duplicating its extensions.
    pub fn new(id: CategoryId, folder_name: impl Into<String>, extensions: &[&str]) -> Self {
        let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());
        for extension in extensions {
            let extension = normalize_extension(extension);
            if !extension.is_empty() && !normalized.contains(&extension) {
                normalized.push(extension);
            }
        }

        Self {
            id,
            folder_name: folder_name.into(),
            extensions: normalized,
            capability: None,
        }
    }

    /// Creates the extension-less catch-all category.
    pub fn unknown(folder_name: impl Into<String>) -> Self {
        Self::new(CategoryId::Unknown, folder_name, &[])
    }

    /// Attaches a non-splittable directory capability.
    pub fn with_capability(mut self, capability: impl NonSplittable + 'static) -> Self {
        self.capability = Some(Box::new(capability));
        self
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.display_name()
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn is_image_family(&self) -> bool {
        self.id.is_image_family()
    }

    pub fn capability(&self) -> Option<&dyn NonSplittable> {
        self.capability.as_deref()
    }

    /// Case-insensitive membership test; the leading dot is optional.
    pub fn matches(&self, extension: &str) -> bool {
        let normalized = normalize_extension(extension);
        !normalized.is_empty() && self.extensions.contains(&normalized)
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("id", &self.id)
            .field("folder_name", &self.folder_name)
            .field("extensions", &self.extensions)
            .field("non_splittable", &self.capability.is_some())
            .finish()
    }
}
