// Sample rate and channel conversion for decoded clips
// Brings every clip to the output device's stream format before queueing

use anyhow::Result;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::decoder::ClipBuffer;

const CHUNK_FRAMES: usize = 1024;

/// Convert a clip to the device's sample rate and channel count, returning
/// interleaved samples ready to queue on the output. A resampling failure
/// falls back to the source rate rather than dropping the clip.
pub fn convert(clip: &ClipBuffer, target_rate: u32, target_channels: u16) -> Vec<f32> {
    let remapped = remap_channels(&clip.samples, clip.channels, target_channels as usize);
    if clip.sample_rate == target_rate || remapped.is_empty() {
        return remapped;
    }
    match resample(&remapped, target_channels as usize, clip.sample_rate, target_rate) {
        Ok(samples) => samples,
        Err(e) => {
            log::warn!(
                "Resampling {} Hz -> {} Hz failed, playing at source rate: {}",
                clip.sample_rate,
                target_rate,
                e
            );
            remapped
        }
    }
}

/// Interleaved channel remapping: mono fans out, extra channels average down
/// to mono, anything else maps channel-for-channel with silence padding.
fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == 0 || to == 0 || samples.is_empty() {
        return Vec::new();
    }
    if from == to {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut out = Vec::with_capacity(frames * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
        } else if from == 1 {
            out.extend(std::iter::repeat(frame[0]).take(to));
        } else {
            for ch in 0..to {
                out.push(if ch < from { frame[ch] } else { 0.0 });
            }
        }
    }
    out
}

fn resample(interleaved: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        to_rate as f64 / from_rate as f64,
        2.0,
        params,
        CHUNK_FRAMES,
        channels,
    )?;

    // De-interleave into per-channel lanes
    let frames = interleaved.len() / channels;
    let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            planar[ch].push(sample);
        }
    }

    let mut out_planar: Vec<Vec<f32>> = vec![Vec::new(); channels];
    let mut append = |processed: Vec<Vec<f32>>| {
        for (ch, lane) in processed.into_iter().enumerate() {
            out_planar[ch].extend(lane);
        }
    };

    let mut position = 0;
    while position + CHUNK_FRAMES <= frames {
        let chunk: Vec<&[f32]> = planar
            .iter()
            .map(|lane| &lane[position..position + CHUNK_FRAMES])
            .collect();
        append(resampler.process(&chunk, None)?);
        position += CHUNK_FRAMES;
    }

    // Tail shorter than a full chunk
    if position < frames {
        let chunk: Vec<&[f32]> = planar.iter().map(|lane| &lane[position..]).collect();
        append(resampler.process_partial(Some(&chunk), None)?);
    }

    // Flush whatever the filter still holds
    append(resampler.process_partial::<&[f32]>(None, None)?);

    // Re-interleave
    let out_frames = out_planar.first().map(|lane| lane.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        for lane in &out_planar {
            out.push(lane[i]);
        }
    }
    Ok(out)
}
