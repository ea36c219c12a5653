// Count-to-word mapping for spoken numbers

/// English words for one through ten. Index 0 is unused so a count indexes
/// its own word directly.
const NUMBER_WORDS: &[&str] = &[
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// Convert a count to its spoken English word.
///
/// Covers 1..=10 by name. Anything outside that range falls back to the
/// numeral string, which matches the display text and simply resolves to no
/// narration clip.
pub fn number_word(count: u32) -> String {
    match NUMBER_WORDS.get(count as usize) {
        Some(word) if !word.is_empty() => word.to_string(),
        _ => count.to_string(),
    }
}
