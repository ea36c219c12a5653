// Sequential clip playback
// Chains decoded clips back-to-back with cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use serde::Serialize;

use crate::audio::decoder::ClipBuffer;
use crate::audio::output::AudioOutput;
use crate::audio::resampler;
use crate::clips::ClipLibrary;

/// Playback lifecycle. stop() returns to Idle from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Idle,
    Loading,
    Playing,
}

/// One playback run: decoded buffers in input order plus a cursor that only
/// advances when the previous clip has been fully handed to the output.
/// Cancellation invalidates the whole session, so a completion that races
/// with stop() is a no-op.
struct PlaybackSession {
    buffers: Vec<Option<Arc<ClipBuffer>>>,
    cursor: usize,
    cancelled: Arc<AtomicBool>,
}

impl PlaybackSession {
    fn new(buffers: Vec<Option<Arc<ClipBuffer>>>) -> Self {
        Self {
            buffers,
            cursor: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Next slot to play, or None once the sequence is done or cancelled.
    /// A failed decode occupies its slot as a zero-duration skip.
    fn advance(&mut self) -> Option<Option<Arc<ClipBuffer>>> {
        if self.is_cancelled() || self.cursor >= self.buffers.len() {
            return None;
        }
        let buffer = self.buffers[self.cursor].clone();
        self.cursor += 1;
        Some(buffer)
    }
}

/// Plays a sequence of narration clips strictly in order, one at a time.
///
/// At most one session may be active; play() while a session is loading or
/// playing is rejected as a no-op rather than queued. The output device is
/// opened lazily on first playback so the rest of the app works on machines
/// with no audio at all.
pub struct SequentialPlayer {
    state: Mutex<PlayerState>,
    output: Mutex<Option<Arc<AudioOutput>>>,
    output_failed: AtomicBool,
    active: Mutex<Option<Arc<AtomicBool>>>,
    volume: Mutex<f32>,
}

impl SequentialPlayer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlayerState::Idle),
            output: Mutex::new(None),
            output_failed: AtomicBool::new(false),
            active: Mutex::new(None),
            volume: Mutex::new(0.9),
        }
    }

    pub fn state(&self) -> PlayerState {
        *self.state.lock()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlayerState::Playing
    }

    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        *self.volume.lock() = volume;
        if let Some(output) = self.output.lock().as_ref() {
            output.set_volume(volume);
        }
    }

    /// Start narrating `tokens` in order. Returns Ok(false) without touching
    /// the current session when one is already loading or playing, and once
    /// playback has started returns Ok(true) while the clips keep streaming
    /// on a background task.
    pub async fn play(
        self: &Arc<Self>,
        library: Arc<ClipLibrary>,
        tokens: Vec<String>,
    ) -> Result<bool> {
        // At-most-one playback: reject, don't queue
        {
            let mut state = self.state.lock();
            if *state != PlayerState::Idle {
                log::debug!("play() ignored: player is {:?}", *state);
                return Ok(false);
            }
            *state = PlayerState::Loading;
        }

        let output = match self.ensure_output() {
            Ok(Some(output)) => output,
            Ok(None) => {
                // Device failure already reported once; degrade silently
                *self.state.lock() = PlayerState::Idle;
                return Ok(false);
            }
            Err(e) => {
                *self.state.lock() = PlayerState::Idle;
                return Err(anyhow!(e));
            }
        };

        // Decode every token concurrently, then join in input order so the
        // sequence mirrors the sentence
        let mut handles = Vec::with_capacity(tokens.len());
        for token in tokens {
            let library = Arc::clone(&library);
            let task_token = token.clone();
            handles.push((
                token,
                tokio::task::spawn_blocking(move || library.load(&task_token)),
            ));
        }

        let mut buffers: Vec<Option<Arc<ClipBuffer>>> = Vec::with_capacity(handles.len());
        for (token, handle) in handles {
            match handle.await {
                Ok(Ok(buffer)) => buffers.push(Some(buffer)),
                Ok(Err(e)) => {
                    log::warn!("Skipping clip \"{}\": {}", token, e);
                    buffers.push(None);
                }
                Err(e) => {
                    log::warn!("Decode task for \"{}\" failed: {}", token, e);
                    buffers.push(None);
                }
            }
        }

        let total_ms: u64 = buffers
            .iter()
            .flatten()
            .map(|buffer| buffer.duration_ms())
            .sum();
        log::debug!("Loaded {} clips ({} ms of audio)", buffers.len(), total_ms);

        let mut session = PlaybackSession::new(buffers);
        let cancelled = session.cancel_handle();

        // stop() may have arrived while clips were decoding; only a session
        // that is still Loading may claim the Playing state
        {
            let mut active = self.active.lock();
            let mut state = self.state.lock();
            if *state != PlayerState::Loading {
                return Ok(false);
            }
            *active = Some(Arc::clone(&cancelled));
            *state = PlayerState::Playing;
        }

        let player = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            player.run_session(&mut session, &output);

            // A stopped session already went Idle through stop(); one that
            // ran to completion releases the slot itself
            let mut active = player.active.lock();
            if active
                .as_ref()
                .is_some_and(|flag| Arc::ptr_eq(flag, &cancelled))
            {
                *active = None;
                *player.state.lock() = PlayerState::Idle;
            }
        });

        Ok(true)
    }

    /// Cancel the active session, silence the device, and go Idle. Safe to
    /// call from Idle and safe to call twice.
    pub fn stop(&self) {
        {
            let mut active = self.active.lock();
            if let Some(flag) = active.take() {
                flag.store(true, Ordering::SeqCst);
            }
            *self.state.lock() = PlayerState::Idle;
        }
        if let Some(output) = self.output.lock().as_ref() {
            output.clear();
        }
    }

    /// Poll until the player is Idle or the timeout passes.
    pub async fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.state() == PlayerState::Idle {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        false
    }

    fn run_session(&self, session: &mut PlaybackSession, output: &AudioOutput) {
        let target_rate = output.sample_rate();
        let target_channels = output.channels();

        while let Some(slot) = session.advance() {
            let Some(buffer) = slot else {
                continue; // failed decode: zero-duration skip
            };
            let samples = resampler::convert(&buffer, target_rate, target_channels);
            if !output.push_interruptible(&samples, &session.cancelled) {
                return; // stop() broke the write
            }
        }

        if !session.is_cancelled() {
            // Let the tail of the final clip leave the ring before going idle
            output.drain(&session.cancelled, Duration::from_secs(2));
        }
    }

    /// Open the output device on first use. Ok(None) means the device failed
    /// earlier and the failure was already reported; the caller degrades to a
    /// no-op.
    fn ensure_output(&self) -> Result<Option<Arc<AudioOutput>>, String> {
        let mut output = self.output.lock();
        if let Some(output) = output.as_ref() {
            return Ok(Some(Arc::clone(output)));
        }
        if self.output_failed.load(Ordering::SeqCst) {
            return Ok(None);
        }

        match AudioOutput::spawn() {
            Ok(new_output) => {
                new_output.set_volume(*self.volume.lock());
                let new_output = Arc::new(new_output);
                *output = Some(Arc::clone(&new_output));
                Ok(Some(new_output))
            }
            Err(e) => {
                self.output_failed.store(true, Ordering::SeqCst);
                log::error!("Audio output unavailable: {}", e);
                Err(format!("audio output unavailable: {}", e))
            }
        }
    }
}

impl Default for SequentialPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(frames: usize) -> Arc<ClipBuffer> {
        Arc::new(ClipBuffer {
            samples: vec![0.0; frames],
            sample_rate: 48000,
            channels: 1,
        })
    }

    #[test]
    fn test_session_advances_in_input_order() {
        let first = buffer(10);
        let second = buffer(20);
        let mut session =
            PlaybackSession::new(vec![Some(Arc::clone(&first)), None, Some(Arc::clone(&second))]);

        let slot = session.advance().unwrap().unwrap();
        assert!(Arc::ptr_eq(&slot, &first));
        // The failed decode holds its place as an empty slot
        assert!(session.advance().unwrap().is_none());
        let slot = session.advance().unwrap().unwrap();
        assert!(Arc::ptr_eq(&slot, &second));
        assert!(session.advance().is_none());
    }

    #[test]
    fn test_cancel_stops_the_cursor() {
        let mut session = PlaybackSession::new(vec![Some(buffer(10)), Some(buffer(10))]);
        assert!(session.advance().is_some());

        session.cancel_handle().store(true, Ordering::SeqCst);
        assert!(session.advance().is_none());
        assert!(session.is_cancelled());
    }

    #[test]
    fn test_stop_from_idle_is_a_safe_no_op() {
        let player = SequentialPlayer::new();
        player.stop();
        player.stop();
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[tokio::test]
    async fn test_play_is_a_no_op_while_active() {
        let player = Arc::new(SequentialPlayer::new());
        *player.state.lock() = PlayerState::Playing;

        let started = player
            .play(Arc::new(ClipLibrary::empty()), vec!["a".to_string()])
            .await
            .unwrap();
        assert!(!started);
        // The active session was left untouched
        assert_eq!(player.state(), PlayerState::Playing);
    }

    #[tokio::test]
    async fn test_stop_during_loading_keeps_the_player_idle() {
        let player = Arc::new(SequentialPlayer::new());
        *player.state.lock() = PlayerState::Loading;

        player.stop();
        assert_eq!(player.state(), PlayerState::Idle);
    }
}
