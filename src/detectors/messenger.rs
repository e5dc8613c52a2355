use std::path::{Path, PathBuf};

/// Known messenger download folders and the subfolder they map to.
const MESSENGER_MARKERS: &[(&str, &str)] = &[
    ("telegram", "_Telegram"),
    ("whatsapp", "_Watsapp"),
    ("watsapp", "_Watsapp"),
];

/// Finds the messenger subfolder a file should be grouped under.
pub trait MessengerPathService {
    fn messenger_folder(&self, path: &Path) -> Option<String>;
}

/// Scans ancestor folder names for a messenger marker, stopping at an
/// optional boundary (the source root) so names above it are ignored.
#[derive(Debug, Clone, Default)]
pub struct AncestorMessengerPaths {
    boundary: Option<PathBuf>,
}

impl AncestorMessengerPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boundary(boundary: impl Into<PathBuf>) -> Self {
        Self {
            boundary: Some(boundary.into()),
        }
    }

    fn marker_for(name: &str) -> Option<&'static str> {
        let lowered = name.to_lowercase();
        MESSENGER_MARKERS
            .iter()
            .find(|(marker, _)| lowered.contains(marker))
            .map(|(_, folder)| *folder)
    }
}

impl MessengerPathService for AncestorMessengerPaths {
    fn messenger_folder(&self, path: &Path) -> Option<String> {
        for ancestor in path.ancestors().skip(1) {
            if let Some(name) = ancestor.file_name()
                && let Some(folder) = Self::marker_for(&name.to_string_lossy())
            {
                return Some(folder.to_string());
            }

            if self.boundary.as_deref() == Some(ancestor) {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_ancestor() {
        let service = AncestorMessengerPaths::new();
        assert_eq!(
            service.messenger_folder(Path::new("/home/u/Telegram Desktop/chats/pic.jpg")),
            Some("_Telegram".to_string())
        );
    }

    #[test]
    fn test_whatsapp_spellings() {
        let service = AncestorMessengerPaths::new();
        assert_eq!(
            service.messenger_folder(Path::new("/media/WhatsApp Images/a.jpg")),
            Some("_Watsapp".to_string())
        );
        assert_eq!(
            service.messenger_folder(Path::new("/media/watsapp/a.jpg")),
            Some("_Watsapp".to_string())
        );
    }

    #[test]
    fn test_file_name_itself_is_not_a_marker() {
        let service = AncestorMessengerPaths::new();
        assert_eq!(service.messenger_folder(Path::new("/pics/telegram.jpg")), None);
    }

    #[test]
    fn test_boundary_stops_search() {
        let service = AncestorMessengerPaths::with_boundary("/data/telegram/inbox");
        assert_eq!(
            service.messenger_folder(Path::new("/data/telegram/inbox/holiday/a.jpg")),
            None
        );

        let service = AncestorMessengerPaths::with_boundary("/data");
        assert_eq!(
            service.messenger_folder(Path::new("/data/telegram/a.jpg")),
            Some("_Telegram".to_string())
        );
    }
}
