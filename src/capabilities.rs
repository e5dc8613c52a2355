//! Non-splittable capabilities and the standard category table.
//!
//! Each capability adapts a detector to the [`NonSplittable`] contract and
//! decides where owned directories and loose files of its category go.

use crate::config::FolderNames;
use crate::detectors::{
    CategoryParsingService, DriverDetector, FirmwareDetector, MessengerPathService,
    MusicAlbumDetector, RepositoryDetector, SoftwareDistributionDetector, program_folder_name,
};
use crate::file_category::{
    ARCHIVE_EXTENSIONS, CERTIFICATE_EXTENSIONS, CODE_EXTENSIONS, Category, CategoryId,
    DISK_IMAGE_EXTENSIONS, DOCUMENT_EXTENSIONS, DRIVER_EXTENSIONS, EBOOK_EXTENSIONS,
    FIRMWARE_EXTENSIONS, GRAPHICS_EXTENSIONS, IMAGE_EXTENSIONS, METADATA_EXTENSIONS,
    MODEL_3D_EXTENSIONS, MUSIC_EXTENSIONS, MUSICAL_INSTRUMENT_EXTENSIONS, NonSplittable,
    SOFT_EXTENSIONS, VIDEO_EXTENSIONS, WEB_EXTENSIONS, extension_in, extension_of,
};
use crate::media::{BrandMatcher, capture_date_with_fallbacks, dated_folder};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIGURATION_FILES_FOLDER: &str = "_Configuration_files";
pub const XML_FILES_FOLDER: &str = "_Xml_files";
pub const DISK_IMAGES_FOLDER: &str = "_Disk_images";

/// Owns directories whenever a parsing service says the folder belongs to
/// its category. Used for music albums, driver bundles and firmware.
pub struct DetectorCapability {
    category: CategoryId,
    detector: Arc<dyn CategoryParsingService>,
}

impl DetectorCapability {
    pub fn new(category: CategoryId, detector: Arc<dyn CategoryParsingService>) -> Self {
        Self { category, detector }
    }
}

impl NonSplittable for DetectorCapability {
    fn owns_directory(&self, path: &Path) -> bool {
        self.detector.is_folder_of_category(self.category, path)
    }
}

/// Unpacked installers; loose Soft files are sorted into sub-buckets.
pub struct DistributionCapability {
    detector: Arc<SoftwareDistributionDetector>,
}

impl DistributionCapability {
    pub fn new(detector: Arc<SoftwareDistributionDetector>) -> Self {
        Self { detector }
    }
}

impl NonSplittable for DistributionCapability {
    fn owns_directory(&self, path: &Path) -> bool {
        self.detector.is_distribution_directory(path)
    }

    fn file_destination(&self, category_root: &Path, file: &Path) -> PathBuf {
        let extension = extension_of(file);
        match extension.as_str() {
            ".conf" => category_root.join(CONFIGURATION_FILES_FOLDER),
            ".xml" => category_root.join(XML_FILES_FOLDER),
            _ if extension_in(DISK_IMAGE_EXTENSIONS, &extension) => {
                category_root.join(DISK_IMAGES_FOLDER)
            }
            _ => match program_folder_name(file) {
                Some(program) => category_root.join(program),
                None => category_root.to_path_buf(),
            },
        }
    }
}

/// Source repositories; the moved directory is the resolved repository root.
pub struct RepositoryCapability {
    detector: Arc<RepositoryDetector>,
}

impl RepositoryCapability {
    pub fn new(detector: Arc<RepositoryDetector>) -> Self {
        Self { detector }
    }
}

impl NonSplittable for RepositoryCapability {
    fn owns_directory(&self, path: &Path) -> bool {
        self.detector.is_repository(path)
    }

    fn directory_root(&self, path: &Path) -> PathBuf {
        self.detector.find_repository_root(path)
    }
}

/// Videos never claim directories; loose files are filed by messenger,
/// date and device brand: `Videos/[messenger]/YYYY/MM/[brand]`.
pub struct VideoCapability {
    messenger: Arc<dyn MessengerPathService>,
    brands: BrandMatcher,
}

impl VideoCapability {
    pub fn new(messenger: Arc<dyn MessengerPathService>, brands: BrandMatcher) -> Self {
        Self { messenger, brands }
    }
}

impl NonSplittable for VideoCapability {
    fn owns_directory(&self, _path: &Path) -> bool {
        false
    }

    fn file_destination(&self, category_root: &Path, file: &Path) -> PathBuf {
        let mut base = category_root.to_path_buf();
        if let Some(messenger) = self.messenger.messenger_folder(file) {
            base = base.join(messenger);
        }

        let dated = dated_folder(&base, capture_date_with_fallbacks(file));
        match self.brands.brand_for(file) {
            Some(brand) => dated.join(brand),
            None => dated,
        }
    }
}

/// Detector instances shared between the category table and the resolver.
#[derive(Clone)]
pub struct StandardDetectors {
    pub music: Arc<MusicAlbumDetector>,
    pub software: Arc<SoftwareDistributionDetector>,
    pub repository: Arc<RepositoryDetector>,
    pub driver: Arc<DriverDetector>,
    pub firmware: Arc<FirmwareDetector>,
    pub messenger: Arc<dyn MessengerPathService>,
    pub video_brands: BrandMatcher,
}

/// Builds the full category table in registration order.
pub fn standard_categories(folders: &FolderNames, detectors: &StandardDetectors) -> Vec<Category> {
    let soft_extensions: Vec<&str> = SOFT_EXTENSIONS
        .iter()
        .chain(DISK_IMAGE_EXTENSIONS)
        .copied()
        .collect();

    vec![
        Category::new(CategoryId::Photos, &folders.photos, IMAGE_EXTENSIONS),
        Category::new(CategoryId::Images, &folders.images, IMAGE_EXTENSIONS),
        Category::new(CategoryId::Music, &folders.music, MUSIC_EXTENSIONS).with_capability(
            DetectorCapability::new(CategoryId::Music, detectors.music.clone()),
        ),
        Category::new(
            CategoryId::MusicalInstruments,
            &folders.musical_instruments,
            MUSICAL_INSTRUMENT_EXTENSIONS,
        ),
        Category::new(CategoryId::EBooks, &folders.ebooks, EBOOK_EXTENSIONS),
        Category::new(CategoryId::Documents, &folders.documents, DOCUMENT_EXTENSIONS),
        Category::new(CategoryId::Videos, &folders.videos, VIDEO_EXTENSIONS).with_capability(
            VideoCapability::new(detectors.messenger.clone(), detectors.video_brands.clone()),
        ),
        Category::new(CategoryId::ThreeDModels, &folders.models_3d, MODEL_3D_EXTENSIONS),
        Category::new(CategoryId::Archives, &folders.archives, ARCHIVE_EXTENSIONS),
        Category::new(CategoryId::Certificates, &folders.certificates, CERTIFICATE_EXTENSIONS),
        Category::new(CategoryId::Firmware, &folders.firmware, FIRMWARE_EXTENSIONS)
            .with_capability(DetectorCapability::new(
                CategoryId::Firmware,
                detectors.firmware.clone(),
            )),
        Category::new(CategoryId::Metadata, &folders.metadata, METADATA_EXTENSIONS),
        Category::new(CategoryId::Drivers, &folders.drivers, DRIVER_EXTENSIONS).with_capability(
            DetectorCapability::new(CategoryId::Drivers, detectors.driver.clone()),
        ),
        Category::new(CategoryId::Repositories, &folders.repositories, CODE_EXTENSIONS)
            .with_capability(RepositoryCapability::new(detectors.repository.clone())),
        Category::new(CategoryId::Soft, &folders.soft, &soft_extensions)
            .with_capability(DistributionCapability::new(detectors.software.clone())),
        Category::new(CategoryId::Web, &folders.web, WEB_EXTENSIONS),
        Category::new(CategoryId::Graphics, &folders.graphics, GRAPHICS_EXTENSIONS),
        Category::unknown(&folders.unknown),
    ]
}
