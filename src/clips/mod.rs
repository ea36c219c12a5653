// Clip library module
// Maps narration tokens to audio files on disk

pub mod library;
pub mod scanner;

pub use library::{ClipError, ClipLibrary};
pub use scanner::ClipScanner;
