use super::CategoryParsingService;
use crate::file_category::{CategoryId, FIRMWARE_EXTENSIONS, extension_in, extension_of};
use std::path::Path;
use walkdir::WalkDir;

/// A directory holding any firmware image is treated as one firmware bundle.
#[derive(Debug, Clone, Default)]
pub struct FirmwareDetector;

impl FirmwareDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn is_firmware_directory(&self, path: &Path) -> bool {
        path.is_dir()
            && WalkDir::new(path)
                .min_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .any(|e| extension_in(FIRMWARE_EXTENSIONS, &extension_of(e.path())))
    }
}

impl CategoryParsingService for FirmwareDetector {
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Firmware && extension_in(FIRMWARE_EXTENSIONS, &extension_of(path))
    }

    fn is_folder_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Firmware && self.is_firmware_directory(path)
    }
}
