use super::CategoryParsingService;
use crate::file_category::{CategoryId, IMAGE_EXTENSIONS, extension_in, extension_of};
use std::path::Path;

/// Reclassifies scans and photographed paperwork: an image whose stem
/// contains a document keyword belongs to Documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentImageDetector {
    keywords: Vec<String>,
}

impl DocumentImageDetector {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_document_image(&self, path: &Path) -> bool {
        if !extension_in(IMAGE_EXTENSIONS, &extension_of(path)) {
            return false;
        }

        let Some(stem) = path.file_stem() else {
            return false;
        };
        let stem = stem.to_string_lossy().to_lowercase();
        self.keywords.iter().any(|keyword| stem.contains(keyword.as_str()))
    }
}

impl CategoryParsingService for DocumentImageDetector {
    fn is_file_of_category(&self, category: CategoryId, path: &Path) -> bool {
        category == CategoryId::Documents && self.is_document_image(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_in_stem() {
        let detector = DocumentImageDetector::new(["passport", "Invoice"]);
        assert!(detector.is_document_image(Path::new("/src/Passport_scan.JPG")));
        assert!(detector.is_document_image(Path::new("/src/invoice-2023.png")));
        assert!(!detector.is_document_image(Path::new("/src/holiday.jpg")));
    }

    #[test]
    fn test_non_image_is_ignored() {
        let detector = DocumentImageDetector::new(["passport"]);
        assert!(!detector.is_document_image(Path::new("/src/passport.pdf")));
    }

    #[test]
    fn test_answers_only_for_documents() {
        let detector = DocumentImageDetector::new(["receipt"]);
        let path = Path::new("receipt.jpg");
        assert!(detector.is_file_of_category(CategoryId::Documents, path));
        assert!(!detector.is_file_of_category(CategoryId::Images, path));
        assert!(!detector.is_folder_of_category(CategoryId::Documents, path));
    }

    #[test]
    fn test_blank_keywords_are_dropped() {
        let detector = DocumentImageDetector::new(["", "  "]);
        assert!(!detector.is_document_image(Path::new("anything.jpg")));
    }
}
