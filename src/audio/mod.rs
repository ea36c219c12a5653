// Audio playback module
// Uses Symphonia for decoding and cpal for output

pub mod decoder;
pub mod output;
pub mod player;
pub mod resampler;

pub use decoder::ClipBuffer;
pub use player::{PlayerState, SequentialPlayer};
