// Sentence plan building
// Maps stationery counts to a display sentence and its spoken clip sequence

use serde::Serialize;
use std::str::FromStr;

use super::numbers::number_word;

/// The fixed stationery set, in the canonical order used for both sentence
/// fragments and clip sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Pencil,
    Eraser,
    Ruler,
    Pen,
    Book,
    Marker,
}

impl Item {
    pub const ALL: [Item; 6] = [
        Item::Pencil,
        Item::Eraser,
        Item::Ruler,
        Item::Pen,
        Item::Book,
        Item::Marker,
    ];

    /// Singular display name, also the stem of the item's narration clips.
    pub fn name(&self) -> &'static str {
        match self {
            Item::Pencil => "pencil",
            Item::Eraser => "eraser",
            Item::Ruler => "ruler",
            Item::Pen => "pen",
            Item::Book => "book",
            Item::Marker => "marker",
        }
    }

    /// Plural form. Every item in the set pluralizes with a plain "s".
    pub fn plural(&self) -> String {
        format!("{}s", self.name())
    }

    /// Highlight color for this item, if one is configured.
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Item::Pencil => Some("#D9A404"),
            Item::Eraser => Some("#D90467"),
            Item::Ruler => Some("#04A6D9"),
            Item::Pen => Some("#D9042B"),
            Item::Book => Some("#04D94F"),
            Item::Marker => Some("#8D04D9"),
        }
    }
}

impl FromStr for Item {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Item::ALL
            .iter()
            .find(|item| item.name() == s)
            .copied()
            .ok_or_else(|| format!("unknown stationery item \"{}\"", s))
    }
}

/// Non-negative count per stationery item. Mutated by drop events, reset to
/// all-zero on canvas reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCounts {
    counts: [u32; Item::ALL.len()],
}

impl ItemCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item: Item) -> u32 {
        self.counts[item as usize]
    }

    pub fn set(&mut self, item: Item, count: u32) {
        self.counts[item as usize] = count;
    }

    /// Register one dropped item; returns the new count.
    pub fn increment(&mut self, item: Item) -> u32 {
        let slot = &mut self.counts[item as usize];
        *slot = slot.saturating_add(1);
        *slot
    }

    /// Zero every count.
    pub fn reset(&mut self) {
        self.counts = Default::default();
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    /// Counts in canonical item order.
    pub fn iter(&self) -> impl Iterator<Item = (Item, u32)> + '_ {
        Item::ALL.iter().map(move |&item| (item, self.get(item)))
    }
}

/// Immutable output of one generation request: the display sentence, the
/// items actually used (for coloring) and the ordered clip sequence. The clip
/// order mirrors the spoken form of the sentence exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentencePlan {
    pub sentence: String,
    pub items: Vec<Item>,
    pub audio_tokens: Vec<String>,
}

/// Build the sentence plan for the given counts.
///
/// Returns `None` iff every count is zero. Counts of one read as "a pencil";
/// larger counts display the numeral ("2 pencils") but speak the number word
/// ("two", "pencils").
pub fn build_plan(counts: &ItemCounts) -> Option<SentencePlan> {
    let mut fragments: Vec<String> = Vec::new();
    let mut clip_pairs: Vec<[String; 2]> = Vec::new();
    let mut items: Vec<Item> = Vec::new();

    for (item, count) in counts.iter() {
        if count == 0 {
            continue;
        }
        if count == 1 {
            fragments.push(format!("a {}", item.name()));
            clip_pairs.push(["a".to_string(), item.name().to_string()]);
        } else {
            fragments.push(format!("{} {}", count, item.plural()));
            clip_pairs.push([number_word(count), item.plural()]);
        }
        items.push(item);
    }

    if fragments.is_empty() {
        return None;
    }

    let sentence = format!("I use {} to make a robot.", join_list(&fragments));

    let mut audio_tokens = vec!["I use".to_string()];
    let pair_count = clip_pairs.len();
    for (index, pair) in clip_pairs.into_iter().enumerate() {
        // "and" goes in front of the last item only, never between earlier ones
        if pair_count > 1 && index == pair_count - 1 {
            audio_tokens.push("and".to_string());
        }
        audio_tokens.extend(pair);
    }
    audio_tokens.push("to make a robot".to_string());

    Some(SentencePlan {
        sentence,
        items,
        audio_tokens,
    })
}

/// Join fragments with English list grammar: "X", "X and Y",
/// "X, Y, and Z" (Oxford comma).
fn join_list(fragments: &[String]) -> String {
    match fragments {
        [] => String::new(),
        [single] => single.clone(),
        [first, second] => format!("{} and {}", first, second),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(Item, u32)]) -> ItemCounts {
        let mut counts = ItemCounts::new();
        for &(item, count) in entries {
            counts.set(item, count);
        }
        counts
    }

    #[test]
    fn test_all_zero_counts_build_nothing() {
        assert_eq!(build_plan(&ItemCounts::new()), None);
    }

    #[test]
    fn test_single_item() {
        let plan = build_plan(&counts(&[(Item::Pencil, 1)])).unwrap();
        assert_eq!(plan.sentence, "I use a pencil to make a robot.");
        assert_eq!(
            plan.audio_tokens,
            vec!["I use", "a", "pencil", "to make a robot"]
        );
        assert_eq!(plan.items, vec![Item::Pencil]);
    }

    #[test]
    fn test_two_items_numeral_display_word_audio() {
        let plan = build_plan(&counts(&[(Item::Pencil, 2), (Item::Book, 1)])).unwrap();
        assert_eq!(plan.sentence, "I use 2 pencils and a book to make a robot.");
        assert_eq!(
            plan.audio_tokens,
            vec!["I use", "two", "pencils", "and", "a", "book", "to make a robot"]
        );
    }

    #[test]
    fn test_three_items_oxford_comma() {
        let plan = build_plan(&counts(&[
            (Item::Pencil, 1),
            (Item::Pen, 3),
            (Item::Marker, 1),
        ]))
        .unwrap();
        assert_eq!(
            plan.sentence,
            "I use a pencil, 3 pens, and a marker to make a robot."
        );
        // "and" appears exactly once, immediately before the final pair
        assert_eq!(
            plan.audio_tokens,
            vec![
                "I use", "a", "pencil", "three", "pens", "and", "a", "marker",
                "to make a robot"
            ]
        );
    }

    #[test]
    fn test_items_follow_canonical_order() {
        // Marker is declared last, so it comes last no matter the drop order
        let plan = build_plan(&counts(&[(Item::Marker, 1), (Item::Eraser, 1)])).unwrap();
        assert_eq!(plan.sentence, "I use a eraser and a marker to make a robot.");
        assert_eq!(plan.items, vec![Item::Eraser, Item::Marker]);
    }

    #[test]
    fn test_count_above_ten_is_numeral_in_both_forms() {
        let plan = build_plan(&counts(&[(Item::Book, 12)])).unwrap();
        assert_eq!(plan.sentence, "I use 12 books to make a robot.");
        assert!(plan.audio_tokens.contains(&"12".to_string()));
    }

    #[test]
    fn test_increment_and_reset() {
        let mut counts = ItemCounts::new();
        assert_eq!(counts.increment(Item::Ruler), 1);
        assert_eq!(counts.increment(Item::Ruler), 2);
        assert!(!counts.is_empty());
        counts.reset();
        assert!(counts.is_empty());
    }

    #[test]
    fn test_item_parses_from_name() {
        assert_eq!("pencil".parse::<Item>(), Ok(Item::Pencil));
        assert!("stapler".parse::<Item>().is_err());
    }
}
