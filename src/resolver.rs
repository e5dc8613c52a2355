//! Per-file category resolution.
//!
//! Precedence, first match wins:
//! 1. deletion list;
//! 2. driver override;
//! 3. parsing-service predicates over the candidate categories;
//! 4. Photos/Images disambiguation for image extensions;
//! 5. plain extension lookup;
//! 6. Unknown.

use crate::detectors::CategoryParsingService;
use crate::file_category::{CategoryId, extension_of, normalize_extension};
use crate::media::PhotoClassifier;
use crate::registry::CategoryRegistry;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Result of resolving one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationOutcome {
    Category(CategoryId),
    /// The extension is configured for outright deletion.
    Delete,
    Unknown,
}

/// Decides the category of single files. Holds no mutable state.
pub struct CategoryResolver {
    parsing_services: Vec<Arc<dyn CategoryParsingService>>,
    photo_classifier: Option<Arc<dyn PhotoClassifier>>,
    driver_override: Option<Arc<dyn CategoryParsingService>>,
    deleted_extensions: HashSet<String>,
}

impl CategoryResolver {
    pub fn new<I, S>(deleted_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            parsing_services: Vec::new(),
            photo_classifier: None,
            driver_override: None,
            deleted_extensions: deleted_extensions
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Appends a parsing service; services are consulted in the order added.
    pub fn with_parsing_service(mut self, service: Arc<dyn CategoryParsingService>) -> Self {
        self.parsing_services.push(service);
        self
    }

    pub fn with_photo_classifier(mut self, classifier: Arc<dyn PhotoClassifier>) -> Self {
        self.photo_classifier = Some(classifier);
        self
    }

    /// Predicate asked for [`CategoryId::Drivers`] before anything else.
    pub fn with_driver_override(mut self, detector: Arc<dyn CategoryParsingService>) -> Self {
        self.driver_override = Some(detector);
        self
    }

    pub fn photo_classifier(&self) -> Option<&dyn PhotoClassifier> {
        self.photo_classifier.as_deref()
    }

    pub fn is_deleted_extension(&self, extension: &str) -> bool {
        self.deleted_extensions
            .contains(&normalize_extension(extension))
    }

    pub fn classify(&self, registry: &CategoryRegistry, path: &Path) -> ClassificationOutcome {
        let extension = extension_of(path);

        if self.is_deleted_extension(&extension) {
            return ClassificationOutcome::Delete;
        }

        if let Some(driver) = &self.driver_override
            && registry.contains(CategoryId::Drivers)
            && driver.is_file_of_category(CategoryId::Drivers, path)
        {
            return ClassificationOutcome::Category(CategoryId::Drivers);
        }

        if let Some(id) = self.resolve_with_parsing_services(registry, path, &extension) {
            return ClassificationOutcome::Category(id);
        }

        if registry.is_image_extension(&extension) {
            return self.resolve_image(registry, path, &extension);
        }

        match registry.resolve(&extension) {
            Some(category) => ClassificationOutcome::Category(category.id()),
            None => ClassificationOutcome::Unknown,
        }
    }

    fn resolve_with_parsing_services(
        &self,
        registry: &CategoryRegistry,
        path: &Path,
        extension: &str,
    ) -> Option<CategoryId> {
        let is_image = registry.is_image_extension(extension);
        let candidates: Vec<CategoryId> = registry
            .categories()
            .iter()
            .filter(|c| c.matches(extension) || (is_image && c.id() == CategoryId::Documents))
            .map(|c| c.id())
            .collect();

        if candidates.is_empty() {
            return None;
        }

        self.parsing_services.iter().find_map(|service| {
            candidates
                .iter()
                .copied()
                .find(|&id| service.is_file_of_category(id, path))
        })
    }

    fn resolve_image(
        &self,
        registry: &CategoryRegistry,
        path: &Path,
        extension: &str,
    ) -> ClassificationOutcome {
        if let Some(classifier) = &self.photo_classifier
            && registry.contains(CategoryId::Photos)
            && registry.contains(CategoryId::Images)
        {
            let id = if classifier.is_photo(path) {
                CategoryId::Photos
            } else {
                CategoryId::Images
            };
            return ClassificationOutcome::Category(id);
        }

        match registry.image_categories_for(extension).next() {
            Some(category) => ClassificationOutcome::Category(category.id()),
            None => ClassificationOutcome::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{DocumentImageDetector, DriverDetector, SoftwareDistributionDetector};
    use crate::file_category::{
        ARCHIVE_EXTENSIONS, Category, DOCUMENT_EXTENSIONS, DRIVER_EXTENSIONS, IMAGE_EXTENSIONS,
        SOFT_EXTENSIONS,
    };
    use chrono::NaiveDate;

    struct FixedPhotoClassifier(bool);

    impl PhotoClassifier for FixedPhotoClassifier {
        fn is_photo(&self, _path: &Path) -> bool {
            self.0
        }

        fn capture_date(&self, _path: &Path) -> NaiveDate {
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        }

        fn camera_folder(&self, _path: &Path) -> Option<String> {
            None
        }
    }

    fn registry() -> CategoryRegistry {
        CategoryRegistry::new(vec![
            Category::new(CategoryId::Photos, "Photos", IMAGE_EXTENSIONS),
            Category::new(CategoryId::Images, "Images", IMAGE_EXTENSIONS),
            Category::new(CategoryId::Documents, "Documents", DOCUMENT_EXTENSIONS),
            Category::new(CategoryId::Archives, "Archives", ARCHIVE_EXTENSIONS),
            Category::new(CategoryId::Drivers, "Drivers", DRIVER_EXTENSIONS),
            Category::new(CategoryId::Soft, "Soft", SOFT_EXTENSIONS),
            Category::unknown("Unknown"),
        ])
        .unwrap()
    }

    fn resolver() -> CategoryResolver {
        CategoryResolver::new([".tmp", "LOG"])
            .with_driver_override(Arc::new(DriverDetector::new()))
            .with_parsing_service(Arc::new(SoftwareDistributionDetector::new()))
            .with_parsing_service(Arc::new(DocumentImageDetector::new(["passport"])))
    }

    #[test]
    fn test_deleted_extensions_win() {
        let registry = registry();
        let resolver = resolver();
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/cache.TMP")),
            ClassificationOutcome::Delete
        );
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/build.log")),
            ClassificationOutcome::Delete
        );
    }

    #[test]
    fn test_driver_override_beats_soft() {
        let registry = registry();
        let resolver = resolver();
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/Realtek_Driver_Setup.exe")),
            ClassificationOutcome::Category(CategoryId::Drivers)
        );
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/player.exe")),
            ClassificationOutcome::Category(CategoryId::Soft)
        );
    }

    #[test]
    fn test_document_keyword_reclassifies_image() {
        let registry = registry();
        let resolver = resolver().with_photo_classifier(Arc::new(FixedPhotoClassifier(true)));
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/passport_page1.jpg")),
            ClassificationOutcome::Category(CategoryId::Documents)
        );
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/beach.jpg")),
            ClassificationOutcome::Category(CategoryId::Photos)
        );
    }

    #[test]
    fn test_image_disambiguation() {
        let registry = registry();
        let pictures = resolver().with_photo_classifier(Arc::new(FixedPhotoClassifier(false)));
        assert_eq!(
            pictures.classify(&registry, Path::new("/src/meme.png")),
            ClassificationOutcome::Category(CategoryId::Images)
        );

        let without_classifier = resolver();
        assert_eq!(
            without_classifier.classify(&registry, Path::new("/src/meme.png")),
            ClassificationOutcome::Category(CategoryId::Photos)
        );
    }

    #[test]
    fn test_plain_lookup_and_unknown() {
        let registry = registry();
        let resolver = resolver();
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/backup.ZIP")),
            ClassificationOutcome::Category(CategoryId::Archives)
        );
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/data.xyz")),
            ClassificationOutcome::Unknown
        );
        assert_eq!(
            resolver.classify(&registry, Path::new("/src/LICENSE")),
            ClassificationOutcome::Unknown
        );
    }
}
