// Text-to-speech narration
// The alternate narration path: speak the whole sentence with a system voice

mod process;

pub use process::ProcessTts;

/// A speech synthesis collaborator: speak arbitrary text with the best
/// available voice, cancellable mid-utterance. Starting a new utterance
/// cancels the one in progress.
pub trait TtsBackend: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), String>;
    fn stop(&self);
    fn is_speaking(&self) -> bool;
    fn name(&self) -> &str;
}

/// Backend used when no synthesizer is installed; narration degrades to a
/// visible no-op.
pub struct NullTts;

impl TtsBackend for NullTts {
    fn speak(&self, text: &str) -> Result<(), String> {
        log::warn!("No speech synthesizer available, dropping utterance: \"{}\"", text);
        Ok(())
    }

    fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Pick the best synthesizer installed on this machine.
pub fn create_best_tts() -> Box<dyn TtsBackend> {
    match ProcessTts::detect() {
        Some(tts) => {
            log::info!("Using speech synthesizer: {}", tts.name());
            Box::new(tts)
        }
        None => {
            log::warn!("No speech synthesizer found; sentence narration will be silent");
            Box::new(NullTts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_backend_accepts_and_discards() {
        let tts = NullTts;
        assert!(tts.speak("I use a pencil to make a robot.").is_ok());
        assert!(!tts.is_speaking());
        tts.stop(); // harmless
        assert_eq!(tts.name(), "null");
    }
}
