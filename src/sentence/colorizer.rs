// Sentence colorizing
// Wraps each used item's word in a colored span for display

use regex::Regex;
use std::sync::OnceLock;

use super::builder::Item;

/// One compiled pattern per item, matching the singular or plural form as a
/// whole word, case-insensitively.
fn item_patterns() -> &'static [(Item, Regex)] {
    static PATTERNS: OnceLock<Vec<(Item, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Item::ALL
            .iter()
            .map(|&item| {
                let pattern = format!(r"(?i)\b({}s?)\b", regex::escape(item.name()));
                (item, Regex::new(&pattern).unwrap())
            })
            .collect()
    })
}

/// Wrap every whole-word occurrence of a used item (singular or plural) in a
/// colored span. The matched text is preserved as written; items without a
/// configured color are left unstyled.
///
/// Pure string transform. The caller owns safe injection into its view layer;
/// no escaping is performed because the sentence comes straight out of the
/// plan builder's fixed template.
pub fn colorize(sentence: &str, items: &[Item]) -> String {
    let mut colorized = sentence.to_string();
    for (item, pattern) in item_patterns() {
        if !items.contains(item) {
            continue;
        }
        let Some(color) = item.color() else { continue };
        let replacement = format!(
            r#"<span style="color: {}; font-weight: bold;">$1</span>"#,
            color
        );
        colorized = pattern.replace_all(&colorized, replacement.as_str()).into_owned();
    }
    colorized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(color: &str, word: &str) -> String {
        format!(
            r#"<span style="color: {}; font-weight: bold;">{}</span>"#,
            color, word
        )
    }

    #[test]
    fn test_singular_is_wrapped() {
        let html = colorize("I use a pencil to make a robot.", &[Item::Pencil]);
        assert_eq!(
            html,
            format!("I use a {} to make a robot.", span("#D9A404", "pencil"))
        );
    }

    #[test]
    fn test_plural_is_wrapped() {
        let html = colorize("I use 2 books to make a robot.", &[Item::Book]);
        assert!(html.contains(&span("#04D94F", "books")));
    }

    #[test]
    fn test_matching_is_case_insensitive_and_preserves_case() {
        let html = colorize("Pencil power", &[Item::Pencil]);
        assert!(html.contains(&span("#D9A404", "Pencil")));
    }

    #[test]
    fn test_pen_does_not_match_inside_pencil() {
        let html = colorize("I use a pencil to make a robot.", &[Item::Pen]);
        assert_eq!(html, "I use a pencil to make a robot.");
    }

    #[test]
    fn test_unused_items_are_untouched() {
        let html = colorize("I use a pencil and a book to make a robot.", &[Item::Book]);
        assert!(!html.contains("#D9A404"));
        assert!(html.contains(&span("#04D94F", "book")));
    }

    #[test]
    fn test_multiple_items_each_get_their_color() {
        let html = colorize(
            "I use 2 pencils and a marker to make a robot.",
            &[Item::Pencil, Item::Marker],
        );
        assert!(html.contains(&span("#D9A404", "pencils")));
        assert!(html.contains(&span("#8D04D9", "marker")));
    }

    #[test]
    fn test_every_item_has_a_color() {
        for item in Item::ALL {
            assert!(item.color().is_some(), "{} has no color", item.name());
        }
    }
}
