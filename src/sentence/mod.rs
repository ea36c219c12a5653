// Sentence generation module
// Builds the display sentence, its color markup, and the clip sequence

pub mod builder;
pub mod colorizer;
pub mod numbers;

pub use builder::{build_plan, Item, ItemCounts, SentencePlan};
pub use colorizer::colorize;
