// Stationery Robot - sentence narration core
// Module declarations
pub mod audio;
pub mod clips;
pub mod commands;
pub mod sentence;
pub mod settings;
pub mod speech;
pub mod state;

pub use audio::{PlayerState, SequentialPlayer};
pub use clips::ClipLibrary;
pub use sentence::{build_plan, colorize, Item, ItemCounts, SentencePlan};
pub use settings::{AppSettings, NarrationMode};
pub use state::AppState;
