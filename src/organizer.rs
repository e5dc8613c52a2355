//! The directory walker.
//!
//! Files of each directory are handled first, then its subdirectories:
//! a subdirectory claimed by a non-splittable category is moved whole,
//! anything else is recursed into and deleted once empty. A final sweep
//! removes directories that only became empty as a side effect.
//!
//! Filesystem failures never abort the walk. Each one is written to the
//! [`MessageWriter`], recorded in [`RunStatistics`] and the offending entry
//! is left in place.

use crate::archive::ArchiveSiblingMatcher;
use crate::capabilities::{StandardDetectors, standard_categories};
use crate::config::CompiledConfig;
use crate::detectors::{
    AncestorMessengerPaths, DocumentImageDetector, DriverDetector, FirmwareDetector,
    MessengerPathService, MusicAlbumDetector, RepositoryDetector, SoftwareDistributionDetector,
};
use crate::file_category::{Category, CategoryId, NonSplittable, extension_of};
use crate::media::{FileSystemPhotoClassifier, capture_date_with_fallbacks, dated_folder};
use crate::output::MessageWriter;
use crate::path_planner::{
    OrganizeError, OrganizeResult, count_files, delete_empty_directory, delete_file,
    ensure_directory, is_directory_empty, list_entries, move_directory, move_file,
};
use crate::registry::{CategoryRegistry, RegistryError};
use crate::resolver::{CategoryResolver, ClassificationOutcome};
use crate::statistics::RunStatistics;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bucket under Unknown for files without an extension.
pub const NO_EXTENSION_FOLDER: &str = "no-extension";

type SkipFilter = Box<dyn Fn(&Path) -> bool>;

/// Mutable state of one run.
struct RunContext<'w> {
    source_root: PathBuf,
    destination_root: PathBuf,
    writer: &'w dyn MessageWriter,
    statistics: RunStatistics,
}

impl RunContext<'_> {
    fn fail(&mut self, path: &Path, error: &OrganizeError) {
        self.writer.write_line(&format!("Error: {}", error));
        self.statistics.record_failure(path, error.to_string());
    }

    /// True for the destination root and every directory containing it.
    fn guards_destination(&self, directory: &Path) -> bool {
        self.destination_root.starts_with(directory)
    }
}

pub struct Organizer {
    registry: CategoryRegistry,
    resolver: CategoryResolver,
    archives: ArchiveSiblingMatcher,
    messenger: Arc<dyn MessengerPathService>,
    source_root: PathBuf,
    destination_root: PathBuf,
    skip_filter: Option<SkipFilter>,
}

impl Organizer {
    pub fn new(
        registry: CategoryRegistry,
        resolver: CategoryResolver,
        archives: ArchiveSiblingMatcher,
        messenger: Arc<dyn MessengerPathService>,
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            resolver,
            archives,
            messenger,
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            skip_filter: None,
        }
    }

    /// Files for which `filter` returns true (given the path relative to
    /// the source root) are left untouched and counted as skipped.
    pub fn with_skip_filter(mut self, filter: impl Fn(&Path) -> bool + 'static) -> Self {
        self.skip_filter = Some(Box::new(filter));
        self
    }

    /// Wires the standard categories, detectors and collaborators.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the category table fails validation.
    pub fn from_config(config: &CompiledConfig) -> Result<Self, RegistryError> {
        let source_root = canonical_or_given(&config.source_directory);
        let messenger: Arc<dyn MessengerPathService> =
            Arc::new(AncestorMessengerPaths::with_boundary(&source_root));

        let detectors = StandardDetectors {
            music: Arc::new(MusicAlbumDetector::new()),
            software: Arc::new(SoftwareDistributionDetector::new()),
            repository: Arc::new(RepositoryDetector::new(config.minimum_code_files)),
            driver: Arc::new(DriverDetector::new()),
            firmware: Arc::new(FirmwareDetector::new()),
            messenger: messenger.clone(),
            video_brands: config.video_brands.clone(),
        };

        let registry = CategoryRegistry::new(standard_categories(&config.folders, &detectors))?;

        let resolver = CategoryResolver::new(&config.deleted_extensions)
            .with_driver_override(detectors.driver.clone())
            .with_parsing_service(detectors.music.clone())
            .with_parsing_service(detectors.software.clone())
            .with_parsing_service(detectors.repository.clone())
            .with_parsing_service(Arc::new(DocumentImageDetector::new(
                &config.document_image_keywords,
            )))
            .with_photo_classifier(Arc::new(FileSystemPhotoClassifier::new(
                config.camera_brands.clone(),
            )));

        let archives = ArchiveSiblingMatcher::new(
            &config.software_archive_keywords,
            config.sibling_prefix_ratio,
        );

        let filters = config.clone();
        Ok(Self::new(
            registry,
            resolver,
            archives,
            messenger,
            source_root,
            config.destination_root.clone(),
        )
        .with_skip_filter(move |relative| filters.should_skip(relative)))
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Walks the source tree once and returns the run's statistics.
    ///
    /// # Errors
    ///
    /// Fails without touching anything when the source is missing or equals
    /// the destination, or when the destination root cannot be created.
    /// Per-entry failures are recorded in the statistics instead.
    pub fn run(&self, writer: &dyn MessageWriter) -> OrganizeResult<RunStatistics> {
        if !self.source_root.is_dir() {
            writer.write_line(&format!(
                "Source directory does not exist: {}",
                self.source_root.display()
            ));
            return Err(OrganizeError::SourceMissing {
                path: self.source_root.clone(),
            });
        }

        let source_root = canonical_or_given(&self.source_root);
        if canonical_or_given(&self.destination_root) == source_root {
            return Err(OrganizeError::DestinationIsSource { path: source_root });
        }

        let created = !self.destination_root.exists();
        ensure_directory(&self.destination_root)?;
        let destination_root = canonical_or_given(&self.destination_root);
        writer.write_line(&if created {
            format!("Created destination root at '{}'.", destination_root.display())
        } else {
            format!(
                "Ensured destination root exists at '{}'.",
                destination_root.display()
            )
        });

        let mut context = RunContext {
            source_root,
            destination_root,
            writer,
            statistics: RunStatistics::new(
                self.registry.categories().iter().map(Category::folder_name),
            ),
        };

        let root = context.source_root.clone();
        self.process_directory(&root, &mut context);
        self.clean_empty_directories(&root, &mut context);

        Ok(context.statistics)
    }

    fn process_directory(&self, directory: &Path, context: &mut RunContext<'_>) {
        context
            .writer
            .write_line(&format!("Scanning directory: {}", directory.display()));

        let (files, subdirectories) = match list_entries(directory) {
            Ok(entries) => entries,
            Err(e) => {
                context.fail(directory, &e);
                return;
            }
        };

        for file in &files {
            self.process_file(file, context);
        }

        for subdirectory in &subdirectories {
            if *subdirectory == context.destination_root {
                continue;
            }

            if !context.guards_destination(subdirectory)
                && let Some((category, capability)) = self
                    .registry
                    .non_splittable()
                    .find(|(_, capability)| capability.owns_directory(subdirectory))
            {
                self.move_whole_directory(subdirectory, category, capability, context);
                continue;
            }

            self.process_directory(subdirectory, context);
            self.prune_if_empty(subdirectory, context);
        }
    }

    fn process_file(&self, file: &Path, context: &mut RunContext<'_>) {
        if let Some(filter) = &self.skip_filter {
            let relative = file.strip_prefix(&context.source_root).unwrap_or(file);
            if filter(relative) {
                context.statistics.record_skipped(file);
                context
                    .writer
                    .write_line(&format!("Skipped: {}", file.display()));
                return;
            }
        }

        let extension = extension_of(file);
        match self.resolver.classify(&self.registry, file) {
            ClassificationOutcome::Delete => match delete_file(file) {
                Ok(()) => {
                    context.statistics.record_deleted_file(&extension);
                    context
                        .writer
                        .write_line(&format!("Deleted file: {}", file.display()));
                }
                Err(e) => context.fail(file, &e),
            },
            ClassificationOutcome::Unknown => self.move_to_unknown(file, &extension, context),
            ClassificationOutcome::Category(id) => match self.registry.get(id) {
                Some(category) => self.move_categorized(file, category, context),
                None => self.move_to_unknown(file, &extension, context),
            },
        }
    }

    fn move_categorized(&self, file: &Path, category: &Category, context: &mut RunContext<'_>) {
        let category_root = context.destination_root.join(category.folder_name());

        let destination_directory = match category.id() {
            CategoryId::Photos => self.photo_directory(file, &category_root),
            CategoryId::Images => match self.messenger.messenger_folder(file) {
                Some(messenger) => category_root.join(messenger),
                None => category_root,
            },
            CategoryId::Archives => {
                self.route_archive(file, context);
                return;
            }
            _ => match category.capability() {
                Some(capability) => capability.file_destination(&category_root, file),
                None => category_root,
            },
        };

        self.move_and_record(file, &destination_directory, category.folder_name(), context);
    }

    fn photo_directory(&self, file: &Path, photos_root: &Path) -> PathBuf {
        let Some(classifier) = self.resolver.photo_classifier() else {
            return dated_folder(photos_root, capture_date_with_fallbacks(file));
        };

        let dated = dated_folder(photos_root, classifier.capture_date(file));
        match classifier.camera_folder(file) {
            Some(camera) => dated.join(camera),
            None => dated,
        }
    }

    fn route_archive(&self, archive: &Path, context: &mut RunContext<'_>) {
        let result = self.archives.route(
            &self.registry,
            archive,
            &context.destination_root,
            &mut context.statistics,
        );

        match result {
            Ok(route) => {
                if let Some(stale) = &route.removed_stale_directory {
                    context
                        .writer
                        .write_line(&format!("Deleted directory: {}", stale.display()));
                }
                context
                    .statistics
                    .record_moved(&route.destination, &route.category_folder);
                context.writer.write_line(&format!(
                    "Moved to '{}' (category: {}).",
                    route.destination.display(),
                    route.category_folder
                ));
            }
            Err(e) => context.fail(archive, &e),
        }
    }

    fn move_to_unknown(&self, file: &Path, extension: &str, context: &mut RunContext<'_>) {
        let bucket = unknown_bucket(extension);
        let unknown = self.registry.unknown();
        let directory = context
            .destination_root
            .join(unknown.folder_name())
            .join(bucket);

        if self.move_and_record(file, &directory, unknown.folder_name(), context) {
            context.statistics.record_unknown(extension);
        }
    }

    fn move_and_record(
        &self,
        file: &Path,
        destination_directory: &Path,
        category_folder: &str,
        context: &mut RunContext<'_>,
    ) -> bool {
        match move_file(file, destination_directory) {
            Ok(destination) => {
                context.statistics.record_moved(&destination, category_folder);
                context.writer.write_line(&format!(
                    "Moved to '{}' (category: {}).",
                    destination.display(),
                    category_folder
                ));
                true
            }
            Err(e) => {
                context.fail(file, &e);
                false
            }
        }
    }

    fn move_whole_directory(
        &self,
        directory: &Path,
        category: &Category,
        capability: &dyn NonSplittable,
        context: &mut RunContext<'_>,
    ) {
        let root = capability.directory_root(directory);
        let category_root = context.destination_root.join(category.folder_name());
        let target = capability.directory_destination(&category_root, &root);
        let file_count = count_files(&root);

        match move_directory(&root, &target) {
            Ok(destination) => {
                context.statistics.record_moved_whole_directory(
                    category.folder_name(),
                    &destination,
                    file_count,
                );
                context.writer.write_line(&format!(
                    "Moved directory '{}' (category: {}, files: {}).",
                    destination.display(),
                    category.folder_name(),
                    file_count
                ));
            }
            Err(e) => {
                context.fail(&root, &e);
                return;
            }
        }

        // Wrapper folders left behind by a nested root.
        if root != directory {
            self.clean_empty_directories(directory, context);
            self.prune_if_empty(directory, context);
        }
    }

    fn prune_if_empty(&self, directory: &Path, context: &mut RunContext<'_>) {
        if directory == context.source_root
            || context.guards_destination(directory)
            || !is_directory_empty(directory)
        {
            return;
        }

        match delete_empty_directory(directory) {
            Ok(()) => {
                if context.statistics.record_deleted_directory(directory) {
                    context
                        .writer
                        .write_line(&format!("Deleted directory: {}", directory.display()));
                }
            }
            Err(e) => context.fail(directory, &e),
        }
    }

    /// Post-order sweep of empty directories below `root`.
    fn clean_empty_directories(&self, root: &Path, context: &mut RunContext<'_>) {
        let Ok((_, subdirectories)) = list_entries(root) else {
            return;
        };

        for subdirectory in &subdirectories {
            if *subdirectory == context.destination_root {
                continue;
            }
            self.clean_empty_directories(subdirectory, context);
            self.prune_if_empty(subdirectory, context);
        }
    }
}

/// Unknown sub-folder for an extension: the extension without its dot, or
/// [`NO_EXTENSION_FOLDER`].
pub fn unknown_bucket(extension: &str) -> String {
    let bare = extension.trim().trim_start_matches('.');
    if bare.is_empty() {
        NO_EXTENSION_FOLDER.to_string()
    } else {
        bare.replace(['/', '\\'], "-")
    }
}

fn canonical_or_given(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
