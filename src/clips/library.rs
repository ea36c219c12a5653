// Clip library
// Resolves audio tokens to files and caches decoded buffers

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::audio::decoder::{decode_file, ClipBuffer, DecodeError};
use super::scanner::ClipScanner;

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("no clip found for token \"{0}\"")]
    UnknownToken(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The set of narration clips on disk, addressed by token. Decoded buffers
/// are memoized because the same words recur in every sentence.
pub struct ClipLibrary {
    clips: HashMap<String, PathBuf>,
    cache: Mutex<HashMap<String, Arc<ClipBuffer>>>,
}

impl ClipLibrary {
    /// Index the clips under a directory.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self, anyhow::Error> {
        let clips = ClipScanner::scan(&directory)?;
        log::info!(
            "Indexed {} clips from {}",
            clips.len(),
            directory.as_ref().display()
        );
        Ok(Self {
            clips,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// A library with no clips, for running without a clip directory.
    pub fn empty() -> Self {
        Self {
            clips: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// All known tokens, sorted for display.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.clips.keys().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Resolve a token to its clip file, if one was indexed.
    pub fn resolve(&self, token: &str) -> Option<&Path> {
        self.clips.get(token).map(PathBuf::as_path)
    }

    /// Decode a token's clip, reusing a previously decoded buffer.
    pub fn load(&self, token: &str) -> Result<Arc<ClipBuffer>, ClipError> {
        if let Some(buffer) = self.cache.lock().get(token) {
            return Ok(Arc::clone(buffer));
        }

        let path = self
            .resolve(token)
            .ok_or_else(|| ClipError::UnknownToken(token.to_string()))?;
        let buffer = Arc::new(decode_file(path)?);

        self.cache
            .lock()
            .insert(token.to_string(), Arc::clone(&buffer));
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_empty_library_resolves_nothing() {
        let library = ClipLibrary::empty();
        assert!(library.is_empty());
        assert_eq!(library.resolve("pencil"), None);
        assert!(matches!(
            library.load("pencil"),
            Err(ClipError::UnknownToken(_))
        ));
    }

    #[test]
    fn test_open_resolves_indexed_tokens() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("pencil.mp3")).unwrap();
        File::create(dir.path().join("to make a robot.mp3")).unwrap();

        let library = ClipLibrary::open(dir.path()).unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(
            library.resolve("to make a robot"),
            Some(dir.path().join("to make a robot.mp3").as_path())
        );
        assert_eq!(library.resolve("ruler"), None);
        assert_eq!(library.tokens(), vec!["pencil", "to make a robot"]);
    }

    #[test]
    fn test_load_of_undecodable_clip_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("junk.mp3"), b"not audio at all").unwrap();

        let library = ClipLibrary::open(dir.path()).unwrap();
        assert!(matches!(library.load("junk"), Err(ClipError::Decode(_))));
    }
}
