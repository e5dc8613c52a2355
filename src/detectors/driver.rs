use super::{CategoryParsingService, contains_any, file_name_of};
use crate::file_category::{CategoryId, DRIVER_EXTENSIONS, extension_in, extension_of};
use std::path::Path;
use walkdir::WalkDir;

/// Installer-like extensions that become drivers when a marker is present.
const DRIVER_INSTALLER_EXTENSIONS: &[&str] = &[".exe", ".msi", ".msix", ".msixbundle", ".msu"];

const DRIVER_MARKERS: &[&str] = &["driver", "драйвер"];

/// Name and extension heuristics for hardware drivers.
///
/// Also serves as the resolver's driver override: an installer named like a
/// driver is a driver, not Soft.
#[derive(Debug, Clone, Default)]
pub struct DriverDetector;

impl DriverDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn is_driver_file(&self, path: &Path) -> bool {
        let extension = extension_of(path);
        if extension_in(DRIVER_EXTENSIONS, &extension) {
            return true;
        }

        if !extension_in(DRIVER_INSTALLER_EXTENSIONS, &extension) {
            return false;
        }

        let in_name = file_name_of(path)
            .map(|name| contains_any(&name, DRIVER_MARKERS))
            .unwrap_or(false);
        let in_parent = path
            .parent()
            .and_then(file_name_of)
            .map(|name| contains_any(&name, DRIVER_MARKERS))
            .unwrap_or(false);

        in_name || in_parent
    }

    pub fn is_driver_directory(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }

        if file_name_of(path)
            .map(|name| contains_any(&name, DRIVER_MARKERS))
            .unwrap_or(false)
        {
            return true;
        }

        WalkDir::new(path)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .any(|e| self.is_driver_file(e.path()))
    }
}

impl CategoryParsingService for DriverDetector {
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Drivers && self.is_driver_file(path)
    }

    fn is_folder_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Drivers && self.is_driver_directory(path)
    }
}
