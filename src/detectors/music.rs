use super::{CategoryParsingService, file_name_of};
use crate::file_category::{CategoryId, IMAGE_EXTENSIONS, MUSIC_EXTENSIONS, extension_in, extension_of};
use std::path::Path;
use walkdir::WalkDir;

/// Side files that may accompany an album without disqualifying it.
const OPTIONAL_TEXT_EXTENSIONS: &[&str] = &[".txt", ".nfo", ".m3u", ".m3u8", ".cue"];

const IGNORED_FILE_NAMES: &[&str] = &["thumbs.db", "desktop.ini"];

/// Recognizes music albums: directories holding only audio tracks plus
/// artwork, playlists and notes.
#[derive(Debug, Clone, Default)]
pub struct MusicAlbumDetector;

impl MusicAlbumDetector {
    pub fn new() -> Self {
        Self
    }

    /// True when every file under `path` is audio, artwork, a playlist/note,
    /// or ignorable, and at least one audio track is present.
    pub fn is_music_directory(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }

        let mut has_music_file = false;

        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || Self::is_ignorable(entry.path()) {
                continue;
            }

            let extension = extension_of(entry.path());
            if extension_in(MUSIC_EXTENSIONS, &extension) {
                has_music_file = true;
                continue;
            }

            if extension_in(IMAGE_EXTENSIONS, &extension)
                || extension_in(OPTIONAL_TEXT_EXTENSIONS, &extension)
            {
                continue;
            }

            return false;
        }

        has_music_file
    }

    fn is_ignorable(path: &Path) -> bool {
        let Some(name) = file_name_of(path) else {
            return false;
        };
        name.starts_with('.') || IGNORED_FILE_NAMES.contains(&name.to_lowercase().as_str())
    }
}

impl CategoryParsingService for MusicAlbumDetector {
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Music && extension_in(MUSIC_EXTENSIONS, &extension_of(path))
    }

    fn is_folder_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Music && self.is_music_directory(path)
    }
}
