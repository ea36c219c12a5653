// Application command handlers
// The discrete user actions a UI layer invokes: drop, ask, speak, reset

use std::sync::Arc;

use serde::Serialize;

use crate::audio::PlayerState;
use crate::sentence::{self, colorize, Item};
use crate::settings::NarrationMode;
use crate::state::AppState;

/// Message shown in place of a sentence when the canvas is empty.
pub const EMPTY_CANVAS_PROMPT: &str = "Drag some stationery onto the canvas first!";

#[derive(Debug, Clone, Serialize)]
pub struct SentenceResponse {
    pub sentence: String,
    pub html: String,
    pub items: Vec<&'static str>,
    pub audio_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemCount {
    pub item: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub counts: Vec<ItemCount>,
    pub player: PlayerState,
    pub sentence: Option<String>,
}

/// Register one dropped item; returns the new count.
pub fn drop_item(state: &AppState, name: &str) -> Result<u32, String> {
    let item = name.parse::<Item>()?;
    Ok(state.counts.lock().increment(item))
}

/// Build the sentence plan for the current counts and keep it for replay.
/// `Ok(None)` means the canvas is empty and the caller should show
/// [`EMPTY_CANVAS_PROMPT`].
pub fn generate_sentence(state: &AppState) -> Result<Option<SentenceResponse>, String> {
    let counts = state.counts.lock().clone();

    let Some(plan) = sentence::build_plan(&counts) else {
        *state.last_plan.lock() = None;
        return Ok(None);
    };

    let html = colorize(&plan.sentence, &plan.items);
    let response = SentenceResponse {
        sentence: plan.sentence.clone(),
        html,
        items: plan.items.iter().map(|item| item.name()).collect(),
        audio_tokens: plan.audio_tokens.clone(),
    };
    *state.last_plan.lock() = Some(plan);
    Ok(Some(response))
}

/// Narrate the most recently generated sentence: clip sequence when the mode
/// asks for clips and any are indexed, the speech synthesizer otherwise.
/// Returns whether narration actually started.
pub async fn speak(state: &AppState) -> Result<bool, String> {
    let plan = state.last_plan.lock().clone();
    let Some(plan) = plan else {
        return Err("Nothing to narrate yet; generate a sentence first".to_string());
    };

    let (mode, volume) = {
        let settings = state.settings.lock();
        (settings.narration, settings.volume)
    };

    if mode == NarrationMode::Clips && !state.library.is_empty() {
        state.player.set_volume(volume);
        state
            .player
            .play(Arc::clone(&state.library), plan.audio_tokens.clone())
            .await
            .map_err(|e| format!("Failed to play narration: {}", e))
    } else {
        state.tts.speak(&plan.sentence)?;
        Ok(true)
    }
}

/// Stop clip playback and any in-progress utterance.
pub fn stop_narration(state: &AppState) {
    state.player.stop();
    state.tts.stop();
}

/// Clear the canvas: stop narration, zero every count, drop the plan.
pub fn reset(state: &AppState) {
    stop_narration(state);
    state.counts.lock().reset();
    *state.last_plan.lock() = None;
}

/// Snapshot for a UI layer.
pub fn get_state(state: &AppState) -> StateSnapshot {
    let counts = state
        .counts
        .lock()
        .iter()
        .map(|(item, count)| ItemCount {
            item: item.name(),
            count,
        })
        .collect();
    StateSnapshot {
        counts,
        player: state.player.state(),
        sentence: state
            .last_plan
            .lock()
            .as_ref()
            .map(|plan| plan.sentence.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::ClipLibrary;
    use crate::settings::AppSettings;
    use crate::speech::NullTts;

    fn app_state() -> AppState {
        AppState::new(ClipLibrary::empty(), Box::new(NullTts), AppSettings::default())
    }

    #[test]
    fn test_drop_item_counts_up() {
        let state = app_state();
        assert_eq!(drop_item(&state, "pencil"), Ok(1));
        assert_eq!(drop_item(&state, "pencil"), Ok(2));
        assert_eq!(drop_item(&state, "book"), Ok(1));
        assert!(drop_item(&state, "glue").is_err());
    }

    #[test]
    fn test_generate_on_empty_canvas_returns_the_prompt_case() {
        let state = app_state();
        assert!(generate_sentence(&state).unwrap().is_none());
    }

    #[test]
    fn test_generate_builds_and_stores_the_plan() {
        let state = app_state();
        drop_item(&state, "pencil").unwrap();
        drop_item(&state, "pencil").unwrap();
        drop_item(&state, "book").unwrap();

        let response = generate_sentence(&state).unwrap().unwrap();
        assert_eq!(response.sentence, "I use 2 pencils and a book to make a robot.");
        assert!(response.html.contains("<span"));
        assert_eq!(response.items, vec!["pencil", "book"]);
        assert!(state.last_plan.lock().is_some());
    }

    #[tokio::test]
    async fn test_speak_without_a_plan_is_an_error() {
        let state = app_state();
        assert!(speak(&state).await.is_err());
    }

    #[tokio::test]
    async fn test_speak_falls_back_to_tts_when_no_clips_exist() {
        let state = app_state();
        drop_item(&state, "ruler").unwrap();
        generate_sentence(&state).unwrap();

        // Library is empty, so the clip path is skipped and NullTts accepts
        assert_eq!(speak(&state).await, Ok(true));
    }

    #[test]
    fn test_reset_clears_counts_and_plan() {
        let state = app_state();
        drop_item(&state, "marker").unwrap();
        generate_sentence(&state).unwrap();

        reset(&state);
        assert!(state.counts.lock().is_empty());
        assert!(state.last_plan.lock().is_none());
        assert!(generate_sentence(&state).unwrap().is_none());
    }

    #[test]
    fn test_snapshot_reflects_counts_in_canonical_order() {
        let state = app_state();
        drop_item(&state, "marker").unwrap();
        drop_item(&state, "pencil").unwrap();

        let snapshot = get_state(&state);
        assert_eq!(snapshot.counts[0].item, "pencil");
        assert_eq!(snapshot.counts[0].count, 1);
        assert_eq!(snapshot.counts[5].item, "marker");
        assert_eq!(snapshot.counts[5].count, 1);
        assert_eq!(snapshot.player, PlayerState::Idle);
        assert_eq!(snapshot.sentence, None);
    }
}
