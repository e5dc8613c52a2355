//! Run statistics: plain counters fed by the organizer and printed once at
//! the end of a run.

use crate::output::MessageWriter;
use crate::path_planner::is_directory_empty;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Deleted files with this extension are housekeeping noise and are left
/// out of the report.
const REPORT_NOISE_EXTENSION: &str = ".tmp";

const NO_EXTENSION_KEY: &str = "(no extension)";

/// One successful relocation of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub destination: PathBuf,
    pub category_folder: String,
}

/// A directory moved as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryMoveRecord {
    pub destination: PathBuf,
    pub category_folder: String,
    pub file_count: usize,
}

/// A file or directory the run could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    total_moved: usize,
    moved_by_category: BTreeMap<String, usize>,
    moves: Vec<MoveRecord>,
    whole_directory_moves: Vec<DirectoryMoveRecord>,
    deleted_files: BTreeMap<String, usize>,
    unknown_extensions: BTreeMap<String, usize>,
    deleted_directories: BTreeSet<PathBuf>,
    skipped: Vec<PathBuf>,
    failures: Vec<FailureRecord>,
}

impl RunStatistics {
    /// Starts every listed category folder at zero so the report shows
    /// untouched categories too.
    pub fn new<'a>(category_folders: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            moved_by_category: category_folders
                .into_iter()
                .map(|folder| (folder.to_string(), 0))
                .collect(),
            ..Self::default()
        }
    }

    pub fn record_moved(&mut self, destination: &Path, category_folder: &str) {
        self.add_moved(1, category_folder);
        self.moves.push(MoveRecord {
            destination: destination.to_path_buf(),
            category_folder: category_folder.to_string(),
        });
    }

    /// Counts every file inside a directory moved as a whole.
    pub fn record_moved_whole_directory(
        &mut self,
        category_folder: &str,
        destination: &Path,
        file_count: usize,
    ) {
        self.add_moved(file_count, category_folder);
        self.whole_directory_moves.push(DirectoryMoveRecord {
            destination: destination.to_path_buf(),
            category_folder: category_folder.to_string(),
            file_count,
        });
    }

    /// Returns false if the directory was already recorded.
    pub fn record_deleted_directory(&mut self, path: &Path) -> bool {
        self.deleted_directories.insert(path.to_path_buf())
    }

    pub fn record_unknown(&mut self, extension: &str) {
        *self
            .unknown_extensions
            .entry(Self::extension_key(extension))
            .or_insert(0) += 1;
    }

    pub fn record_deleted_file(&mut self, extension: &str) {
        *self
            .deleted_files
            .entry(Self::extension_key(extension))
            .or_insert(0) += 1;
    }

    pub fn record_skipped(&mut self, path: &Path) {
        self.skipped.push(path.to_path_buf());
    }

    pub fn record_failure(&mut self, path: &Path, message: impl Into<String>) {
        self.failures.push(FailureRecord {
            path: path.to_path_buf(),
            message: message.into(),
        });
    }

    fn add_moved(&mut self, count: usize, category_folder: &str) {
        self.total_moved += count;
        let key = self
            .moved_by_category
            .keys()
            .find(|k| k.eq_ignore_ascii_case(category_folder))
            .cloned()
            .unwrap_or_else(|| category_folder.to_string());
        *self.moved_by_category.entry(key).or_insert(0) += count;
    }

    fn extension_key(extension: &str) -> String {
        let trimmed = extension.trim();
        if trimmed.is_empty() {
            NO_EXTENSION_KEY.to_string()
        } else {
            trimmed.to_lowercase()
        }
    }

    pub fn total_moved(&self) -> usize {
        self.total_moved
    }

    pub fn moved_count(&self, category_folder: &str) -> usize {
        self.moved_by_category
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(category_folder))
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn whole_directory_moves(&self) -> &[DirectoryMoveRecord] {
        &self.whole_directory_moves
    }

    pub fn deleted_file_count(&self, extension: &str) -> usize {
        self.deleted_files
            .get(&Self::extension_key(extension))
            .copied()
            .unwrap_or(0)
    }

    pub fn unknown_count(&self, extension: &str) -> usize {
        self.unknown_extensions
            .get(&Self::extension_key(extension))
            .copied()
            .unwrap_or(0)
    }

    pub fn deleted_directories(&self) -> &BTreeSet<PathBuf> {
        &self.deleted_directories
    }

    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Pretty-printed JSON snapshot of every counter.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the end-of-run summary.
    pub fn report(&self, writer: &dyn MessageWriter, source_root: &Path) {
        writer.write_line("");
        writer.write_line("Organization summary:");
        writer.write_line(&format!("Total files moved: {}", self.total_moved));

        let mut categories: Vec<_> = self.moved_by_category.iter().collect();
        categories.sort_by_key(|(name, _)| name.to_lowercase());
        for (folder, count) in categories {
            writer.write_line(&format!("  {}: {}", folder, count));
        }

        self.report_unknown(writer);
        self.report_deleted_files(writer);
        self.report_whole_directories(writer);
        self.report_deleted_directories(writer);
        self.report_skipped_and_failures(writer);

        if is_directory_empty(source_root) {
            writer.write_line("");
            writer.write_line("====================");
            writer.write_line("Source directory fully processed. No files remain to organize.");
            writer.write_line("====================");
        }
    }

    fn report_unknown(&self, writer: &dyn MessageWriter) {
        if self.unknown_extensions.is_empty() {
            writer.write_line("Unknown file types: none");
            return;
        }

        let total: usize = self.unknown_extensions.values().sum();
        writer.write_line(&format!("Unknown file types encountered: {}", total));
        for (extension, count) in &self.unknown_extensions {
            writer.write_line(&format!("  {}: {}", extension, count));
        }
    }

    fn report_deleted_files(&self, writer: &dyn MessageWriter) {
        let deleted: Vec<_> = self
            .deleted_files
            .iter()
            .filter(|(extension, _)| extension.as_str() != REPORT_NOISE_EXTENSION)
            .collect();

        if deleted.is_empty() {
            writer.write_line("Deleted uncategorized files: none");
            return;
        }

        let total: usize = deleted.iter().map(|(_, count)| **count).sum();
        writer.write_line(&format!("Deleted uncategorized files: {}", total));
        for (extension, count) in deleted {
            writer.write_line(&format!("  {}: {}", extension, count));
        }
    }

    fn report_whole_directories(&self, writer: &dyn MessageWriter) {
        if self.whole_directory_moves.is_empty() {
            writer.write_line("Non-splittable directories moved: none");
            return;
        }

        let mut records: Vec<_> = self.whole_directory_moves.iter().collect();
        records.sort_by_key(|r| r.destination.to_string_lossy().to_lowercase());

        writer.write_line("Non-splittable directories moved:");
        for record in records {
            writer.write_line(&format!(
                "  {} ({} files)",
                record.destination.display(),
                record.file_count
            ));
        }
    }

    fn report_deleted_directories(&self, writer: &dyn MessageWriter) {
        if self.deleted_directories.is_empty() {
            writer.write_line("Deleted directories: none");
            return;
        }

        let mut directories: Vec<_> = self.deleted_directories.iter().collect();
        directories.sort_by_key(|d| d.to_string_lossy().to_lowercase());

        writer.write_line("Deleted directories:");
        for directory in directories {
            writer.write_line(&format!("  {}", directory.display()));
        }
    }

    fn report_skipped_and_failures(&self, writer: &dyn MessageWriter) {
        if !self.skipped.is_empty() {
            writer.write_line(&format!("Skipped by filters: {}", self.skipped.len()));
        }

        if self.failures.is_empty() {
            return;
        }

        writer.write_line(&format!("Failures: {}", self.failures.len()));
        for failure in &self.failures {
            writer.write_line(&format!("  {}: {}", failure.path.display(), failure.message));
        }
    }
}
