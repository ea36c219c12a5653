// External-process speech synthesis
// Drives a local synthesizer program, one utterance at a time

use parking_lot::Mutex;
use std::process::{Child, Command, Stdio};

use super::TtsBackend;

/// Candidate synthesizers in preference order: the program plus the
/// arguments that make it read one utterance from argv.
const CANDIDATES: &[(&str, &[&str])] = &[
    ("say", &[]),
    ("espeak-ng", &[]),
    ("espeak", &[]),
    ("spd-say", &["--wait"]),
];

/// Speaks by spawning a synthesizer process per utterance. stop() kills the
/// child, which cuts the voice immediately.
pub struct ProcessTts {
    program: &'static str,
    base_args: &'static [&'static str],
    child: Mutex<Option<Child>>,
}

impl ProcessTts {
    /// Find the first installed candidate synthesizer.
    pub fn detect() -> Option<Self> {
        CANDIDATES.iter().find_map(|&(program, base_args)| {
            let installed = Command::new(program)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok();
            installed.then(|| Self {
                program,
                base_args,
                child: Mutex::new(None),
            })
        })
    }
}

impl TtsBackend for ProcessTts {
    fn speak(&self, text: &str) -> Result<(), String> {
        self.stop();

        let child = Command::new(self.program)
            .args(self.base_args)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", self.program, e))?;
        *self.child.lock() = Some(child);
        Ok(())
    }

    fn stop(&self) {
        if let Some(mut child) = self.child.lock().take() {
            match child.try_wait() {
                Ok(Some(_)) => {} // already finished
                _ => {
                    let _ = child.kill();
                    let _ = child.wait(); // reap
                }
            }
        }
    }

    fn is_speaking(&self) -> bool {
        let mut slot = self.child.lock();
        let speaking = match slot.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => return false,
        };
        if !speaking {
            *slot = None; // finished, free the slot
        }
        speaking
    }

    fn name(&self) -> &str {
        self.program
    }
}
