//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + custom filler lexicons):
//!   Windows: %APPDATA%\speech-analytics\
//!   macOS:   ~/Library/Application Support/speech-analytics/
//!   Linux:   ~/.config/speech-analytics/

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and the `lexicons/` folder.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory scanned for `<language>.json` filler lexicons.
    pub lexicon_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "speech-analytics";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let lexicon_dir = config_dir.join("lexicons");

        Self {
            config_dir,
            settings_file,
            lexicon_dir,
        }
    }

    /// Conventional location of the lexicon file for `language`.
    pub fn lexicon_file(&self, language: &str) -> PathBuf {
        self.lexicon_dir.join(format!("{}.json", language.to_lowercase()))
    }

    /// Every `<language>.json` in [`lexicon_dir`](Self::lexicon_dir), keyed by
    /// lowercased language code.  A missing directory yields an empty map.
    pub fn discover_lexicons(&self) -> BTreeMap<String, PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.lexicon_dir) else {
            return BTreeMap::new();
        };
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                let language = path.file_stem()?.to_str()?.to_lowercase();
                Some((language, path))
            })
            .collect()
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths.lexicon_dir.ends_with("lexicons"));
    }

    #[test]
    fn lexicon_file_is_lowercased_json() {
        let paths = AppPaths::new();
        let file = paths.lexicon_file("IT");
        assert!(file.file_name().is_some_and(|n| n == "it.json"));
        assert!(file.starts_with(&paths.lexicon_dir));
    }

    #[test]
    fn discovers_json_lexicons_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = AppPaths::new();
        paths.lexicon_dir = dir.path().to_path_buf();

        std::fs::write(paths.lexicon_file("IT"), "[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let found = paths.discover_lexicons();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("it"), Some(&dir.path().join("it.json")));
    }

    #[test]
    fn missing_lexicon_dir_is_empty() {
        let mut paths = AppPaths::new();
        paths.lexicon_dir = PathBuf::from("/definitely/not/a/dir");
        assert!(paths.discover_lexicons().is_empty());
    }
}
