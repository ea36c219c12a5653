// Clip decoder using Symphonia
// Decodes short narration clips fully into memory

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// A fully decoded clip: interleaved f32 samples plus stream parameters.
#[derive(Debug, Clone)]
pub struct ClipBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

impl ClipBuffer {
    /// Clip length in frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            0
        } else {
            self.frames() as u64 * 1000 / self.sample_rate as u64
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open clip: {0}")]
    Open(#[from] std::io::Error),
    #[error("unrecognized clip format: {0}")]
    Probe(SymphoniaError),
    #[error("no audio track in clip")]
    NoTrack,
    #[error("failed to create decoder: {0}")]
    Codec(SymphoniaError),
    #[error("decode failed: {0}")]
    Decode(SymphoniaError),
}

/// Decode an entire clip file to interleaved f32 samples.
///
/// Clips are a word or two long, so decoding to memory up front keeps the
/// playback path free of I/O. Recoverable packet errors are logged and
/// skipped; only stream-level failures abort the decode.
pub fn decode_file(path: &Path) -> Result<ClipBuffer, DecodeError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Hint the probe with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(DecodeError::Probe)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(DecodeError::Codec)?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break; // End of stream
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e)),
        };

        // Skip packets from other tracks
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if sample_buf.is_none() {
                    let spec = *decoded.spec();
                    sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Decode error in {} (skipping packet): {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(DecodeError::Decode(e)),
        }
    }

    Ok(ClipBuffer {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_divide_by_channel_count() {
        let clip = ClipBuffer {
            samples: vec![0.0; 480],
            sample_rate: 48000,
            channels: 2,
        };
        assert_eq!(clip.frames(), 240);
        assert_eq!(clip.duration_ms(), 5);
    }

    #[test]
    fn test_zero_channels_have_no_frames() {
        let clip = ClipBuffer {
            samples: vec![],
            sample_rate: 44100,
            channels: 0,
        };
        assert_eq!(clip.frames(), 0);
        assert_eq!(clip.duration_ms(), 0);
    }

    #[test]
    fn test_missing_file_is_an_open_error() {
        let err = decode_file(Path::new("/nonexistent/clip.mp3")).unwrap_err();
        assert!(matches!(err, DecodeError::Open(_)));
    }
}
