// Clip directory scanner

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// List of supported clip file extensions
const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg"];

/// Scanner that indexes narration clips by file stem, so "I use.mp3" is
/// addressed by the token "I use".
pub struct ClipScanner;

impl ClipScanner {
    /// Walk a clip directory and map each clip's stem to its path.
    pub fn scan<P: AsRef<Path>>(directory: P) -> Result<HashMap<String, PathBuf>, anyhow::Error> {
        let mut clips = HashMap::new();

        for entry in WalkDir::new(directory)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            // Skip directories
            if !path.is_file() {
                continue;
            }

            let Some(extension) = path.extension() else {
                continue;
            };
            let ext = extension.to_string_lossy().to_lowercase();
            if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                // First hit wins when the same stem exists in several formats
                clips
                    .entry(stem.to_string())
                    .or_insert_with(|| path.to_path_buf());
            }
        }

        Ok(clips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_scan_indexes_clips_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("I use.mp3")).unwrap();
        File::create(dir.path().join("and.wav")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let clips = ClipScanner::scan(dir.path()).unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips["I use"], dir.path().join("I use.mp3"));
        assert_eq!(clips["and"], dir.path().join("and.wav"));
        assert!(!clips.contains_key("notes"));
    }

    #[test]
    fn test_scan_recurses_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("numbers");
        std::fs::create_dir(&sub).unwrap();
        File::create(sub.join("two.mp3")).unwrap();

        let clips = ClipScanner::scan(dir.path()).unwrap();
        assert_eq!(clips["two"], sub.join("two.mp3"));
    }

    #[test]
    fn test_scan_of_empty_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ClipScanner::scan(dir.path()).unwrap().is_empty());
    }
}
