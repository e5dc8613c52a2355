//! Detector collaborators behind narrow contracts.
//!
//! The organizer never inspects category types at runtime; instead each
//! detector answers "is this file/folder of category X?" for a
//! [`CategoryId`] and returns `false` for every category it does not know.

mod document_image;
mod driver;
mod firmware;
mod messenger;
mod music;
mod repository;
mod software;

pub use document_image::DocumentImageDetector;
pub use driver::DriverDetector;
pub use firmware::FirmwareDetector;
pub use messenger::{AncestorMessengerPaths, MessengerPathService};
pub use music::MusicAlbumDetector;
pub use repository::RepositoryDetector;
pub use software::{SoftwareDistributionDetector, program_folder_name};

use crate::file_category::CategoryId;
use std::path::Path;

/// Pluggable predicate service consulted during classification.
pub trait CategoryParsingService {
    /// Whether the file at `path` belongs to `category`.
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool;

    /// Whether the directory at `path` belongs to `category` as a whole.
    fn is_folder_of_category(&self, _category: CategoryId, _path: &Path) -> bool {
        false
    }
}

/// Case-insensitive substring test used by several name heuristics.
pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lowered = haystack.to_lowercase();
    needles.iter().any(|needle| lowered.contains(needle))
}

/// The final component of `path` as an owned string.
pub(crate) fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
