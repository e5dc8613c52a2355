//! Photo/video helpers: the photo classifier contract, filename brand
//! matching and the capture-date fallback chain.
//!
//! Each fallback step is its own function so it can be tested alone:
//! [`date_from_file_name`] → [`creation_date`] → [`modification_date`] →
//! today. Decoding embedded EXIF/QuickTime metadata is left to other
//! [`PhotoClassifier`] implementations.

use crate::file_category::extension_of;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

/// Images whose longer side exceeds this many pixels are photographs.
pub const SMALL_IMAGE_MAX_DIMENSION: u32 = 512;

/// Byte-size threshold used when dimensions are small or unreadable.
pub const SMALL_IMAGE_MAX_BYTES: u64 = 300 * 1024;

/// Formats that are screenshots/graphics far more often than camera output.
const NEVER_PHOTO_EXTENSIONS: &[&str] = &[".png", ".gif"];

static FILE_NAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)((?:19|20)\d{2})[-_.]?(0[1-9]|1[0-2])[-_.]?(0[1-9]|[12]\d|3[01])(?:\D|$)")
        .expect("file name date pattern is valid")
});

/// Decides whether an image is a photograph and where it should be filed.
pub trait PhotoClassifier {
    fn is_photo(&self, path: &Path) -> bool;

    fn capture_date(&self, path: &Path) -> NaiveDate;

    /// Camera make/model or brand folder, if one can be determined.
    fn camera_folder(&self, path: &Path) -> Option<String>;
}

/// A brand name paired with the file name pattern its devices produce.
#[derive(Debug, Clone)]
pub struct DeviceBrandPattern {
    pub brand: String,
    pub pattern: Regex,
}

/// Maps file names such as `IMG_20230101_120000.jpg` or `DSC_0001.NEF` to
/// a device brand. The first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct BrandMatcher {
    patterns: Vec<DeviceBrandPattern>,
}

impl BrandMatcher {
    pub fn new(patterns: Vec<DeviceBrandPattern>) -> Self {
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Matches against the full file name first, then the stem.
    pub fn brand_for(&self, path: &Path) -> Option<&str> {
        let file_name = path.file_name()?.to_string_lossy();
        if file_name.trim().is_empty() {
            return None;
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();

        self.patterns
            .iter()
            .find(|p| p.pattern.is_match(&file_name) || p.pattern.is_match(&stem))
            .map(|p| p.brand.as_str())
    }
}

/// Looks for an embedded `YYYYMMDD` (optionally separated) date in the file
/// name, e.g. `IMG_20230115_093000.jpg` or `scan 2021-07-04.png`.
pub fn date_from_file_name(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_string_lossy();
    FILE_NAME_DATE.captures_iter(&stem).find_map(|captures| {
        let year = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let day = captures[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

pub fn creation_date(path: &Path) -> Option<NaiveDate> {
    let created = fs::metadata(path).ok()?.created().ok()?;
    Some(local_date(created))
}

pub fn modification_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(local_date(modified))
}

fn local_date(time: SystemTime) -> NaiveDate {
    DateTime::<Local>::from(time).date_naive()
}

/// Runs the whole fallback chain; never fails.
pub fn capture_date_with_fallbacks(path: &Path) -> NaiveDate {
    date_from_file_name(path)
        .or_else(|| creation_date(path))
        .or_else(|| modification_date(path))
        .unwrap_or_else(|| Local::now().date_naive())
}

/// `root/YYYY/MM`
pub fn dated_folder(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(date.year().to_string())
        .join(format!("{:02}", date.month()))
}

/// Dimension, size and extension heuristic classifier backed by a
/// [`BrandMatcher`].
#[derive(Debug, Clone, Default)]
pub struct FileSystemPhotoClassifier {
    brands: BrandMatcher,
}

impl FileSystemPhotoClassifier {
    pub fn new(brands: BrandMatcher) -> Self {
        Self { brands }
    }
}

impl PhotoClassifier for FileSystemPhotoClassifier {
    fn is_photo(&self, path: &Path) -> bool {
        let extension = extension_of(path);
        if NEVER_PHOTO_EXTENSIONS.contains(&extension.as_str()) {
            return false;
        }

        if let Ok((width, height)) = image::image_dimensions(path)
            && width.max(height) > SMALL_IMAGE_MAX_DIMENSION
        {
            return true;
        }

        fs::metadata(path)
            .map(|m| m.len() > SMALL_IMAGE_MAX_BYTES)
            .unwrap_or(false)
    }

    fn capture_date(&self, path: &Path) -> NaiveDate {
        capture_date_with_fallbacks(path)
    }

    fn camera_folder(&self, path: &Path) -> Option<String> {
        self.brands.brand_for(path).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::RegexBuilder;
    use tempfile::TempDir;

    fn pattern(brand: &str, pattern: &str) -> DeviceBrandPattern {
        DeviceBrandPattern {
            brand: brand.to_string(),
            pattern: RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .unwrap(),
        }
    }

    #[test]
    fn test_date_from_file_name() {
        assert_eq!(
            date_from_file_name(Path::new("IMG_20230115_093000.jpg")),
            NaiveDate::from_ymd_opt(2023, 1, 15)
        );
        assert_eq!(
            date_from_file_name(Path::new("scan 2021-07-04.png")),
            NaiveDate::from_ymd_opt(2021, 7, 4)
        );
        assert_eq!(date_from_file_name(Path::new("DSC_0001.jpg")), None);
        assert_eq!(date_from_file_name(Path::new("20231345.jpg")), None);
    }

    #[test]
    fn test_file_timestamps_are_available() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("a.jpg");
        fs::write(&file, "x").unwrap();

        let today = Local::now().date_naive();
        assert_eq!(modification_date(&file), Some(today));
        assert!(creation_date(&temp_dir.path().join("missing.jpg")).is_none());
    }

    #[test]
    fn test_fallback_chain_prefers_file_name() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("VID_20190302_101010.mp4");
        fs::write(&file, "x").unwrap();

        assert_eq!(
            capture_date_with_fallbacks(&file),
            NaiveDate::from_ymd_opt(2019, 3, 2).unwrap()
        );
        assert_eq!(
            capture_date_with_fallbacks(&temp_dir.path().join("gone.mp4")),
            Local::now().date_naive()
        );
    }

    #[test]
    fn test_dated_folder() {
        let date = NaiveDate::from_ymd_opt(2020, 4, 9).unwrap();
        assert_eq!(
            dated_folder(Path::new("/dest/Photos"), date),
            Path::new("/dest/Photos/2020/04")
        );
    }

    #[test]
    fn test_brand_matcher_uses_first_match() {
        let matcher = BrandMatcher::new(vec![
            pattern("Nikon", r"^DSC_\d+$"),
            pattern("Android", r"^IMG_\d{8}_\d{6}"),
            pattern("Generic", r"^IMG"),
        ]);

        assert_eq!(matcher.brand_for(Path::new("/a/dsc_0042.NEF")), Some("Nikon"));
        assert_eq!(
            matcher.brand_for(Path::new("IMG_20230101_120000.jpg")),
            Some("Android")
        );
        assert_eq!(matcher.brand_for(Path::new("holiday.jpg")), None);
    }

    #[test]
    fn test_photo_heuristic() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let big_jpg = temp_dir.path().join("big.jpg");
        let small_jpg = temp_dir.path().join("small.jpg");
        let big_png = temp_dir.path().join("big.png");
        fs::write(&big_jpg, vec![0u8; (SMALL_IMAGE_MAX_BYTES + 1) as usize]).unwrap();
        fs::write(&small_jpg, vec![0u8; 1024]).unwrap();
        fs::write(&big_png, vec![0u8; (SMALL_IMAGE_MAX_BYTES + 1) as usize]).unwrap();

        let classifier = FileSystemPhotoClassifier::default();
        assert!(classifier.is_photo(&big_jpg));
        assert!(!classifier.is_photo(&small_jpg));
        assert!(!classifier.is_photo(&big_png));
    }

    #[test]
    fn test_large_dimensions_make_a_photo() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let wide = temp_dir.path().join("wide.jpg");
        let thumbnail = temp_dir.path().join("thumb.jpg");
        image::RgbImage::new(1920, 1080).save(&wide).unwrap();
        image::RgbImage::new(320, 240).save(&thumbnail).unwrap();
        assert!(fs::metadata(&wide).unwrap().len() <= SMALL_IMAGE_MAX_BYTES);

        let classifier = FileSystemPhotoClassifier::default();
        assert!(classifier.is_photo(&wide));
        assert!(!classifier.is_photo(&thumbnail));
    }
}
