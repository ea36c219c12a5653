// Application state management
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::player::SequentialPlayer;
use crate::clips::ClipLibrary;
use crate::sentence::{ItemCounts, SentencePlan};
use crate::settings::AppSettings;
use crate::speech::TtsBackend;

/// Everything the command layer operates on. One explicit state object per
/// app session; `reset` restores it instead of relying on globals.
pub struct AppState {
    pub counts: Mutex<ItemCounts>,
    pub last_plan: Mutex<Option<SentencePlan>>,
    pub player: Arc<SequentialPlayer>,
    pub library: Arc<ClipLibrary>,
    pub tts: Box<dyn TtsBackend>,
    pub settings: Mutex<AppSettings>,
}

impl AppState {
    pub fn new(library: ClipLibrary, tts: Box<dyn TtsBackend>, settings: AppSettings) -> Self {
        Self {
            counts: Mutex::new(ItemCounts::new()),
            last_plan: Mutex::new(None),
            player: Arc::new(SequentialPlayer::new()),
            library: Arc::new(library),
            tts,
            settings: Mutex::new(settings),
        }
    }
}
