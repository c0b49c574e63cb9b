//! Scripture reference parsing.
//!
//! Turns free-text references such as `"1 John 3:16-17"` or `"Psalm 23"` into a
//! [`ParsedReference`], and expands them into the individual verses they cover.
//! Book names are taken as written; they are not checked against a canon list.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:[1-3]\s?)?[A-Za-z ]+)\s+([0-9]+)(?::([0-9]+)(?:-([0-9]+))?)?$")
        .expect("reference pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReference {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
    /// Last verse of a range. Only ever set alongside `verse`;
    /// `end >= verse` is expected but not checked.
    pub end: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseCoordinate {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

/// Parses a reference like `"John 3:16-17"`.
///
/// Returns `None` when the trimmed input is empty or does not follow the
/// `<book> <chapter>[:<verse>[-<end>]]` shape. A range needs a starting
/// verse, so `"John 3-5"` does not parse.
pub fn parse_reference(input: &str) -> Option<ParsedReference> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let caps = REFERENCE_RE.captures(input)?;
    let book = caps.get(1)?.as_str().trim().to_string();
    let chapter = caps.get(2)?.as_str().parse().ok()?;
    let verse = match caps.get(3) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    let end = match caps.get(4).filter(|m| !m.as_str().is_empty()) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };

    Some(ParsedReference {
        book,
        chapter,
        verse,
        end,
    })
}

/// Expands a reference into every verse it names, in ascending order.
///
/// A reference without a verse stands for verse 1 of the chapter. Unparseable
/// input and descending ranges (`"Psalm 23:5-2"`) both yield an empty list.
pub fn expand_reference(input: &str) -> Vec<VerseCoordinate> {
    let Some(parsed) = parse_reference(input) else {
        return vec![];
    };

    let verse = parsed.verse.unwrap_or(1);
    let end = parsed.end.unwrap_or(verse);

    (verse..=end)
        .map(|v| VerseCoordinate {
            book: parsed.book.clone(),
            chapter: parsed.chapter,
            verse: v,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(book: &str, chapter: u32, verse: u32) -> VerseCoordinate {
        VerseCoordinate {
            book: book.to_string(),
            chapter,
            verse,
        }
    }

    #[test]
    fn test_blank_input_does_not_parse() {
        assert_eq!(parse_reference(""), None);
        assert_eq!(parse_reference("   "), None);
    }

    #[test]
    fn test_parse_verse_range() {
        let parsed = parse_reference("John 3:16-17").unwrap();
        assert_eq!(
            parsed,
            ParsedReference {
                book: "John".to_string(),
                chapter: 3,
                verse: Some(16),
                end: Some(17),
            }
        );
    }

    #[test]
    fn test_parse_chapter_only() {
        let parsed = parse_reference("Psalm 23").unwrap();
        assert_eq!(parsed.book, "Psalm");
        assert_eq!(parsed.chapter, 23);
        assert_eq!(parsed.verse, None);
        assert_eq!(parsed.end, None);
    }

    #[test]
    fn test_parse_numbered_and_multi_word_books() {
        let parsed = parse_reference("1 Samuel 2:1").unwrap();
        assert_eq!(parsed.book, "1 Samuel");
        assert_eq!(parsed.chapter, 2);
        assert_eq!(parsed.verse, Some(1));
        assert_eq!(parsed.end, None);

        let parsed = parse_reference("  Song of Songs 2:4  ").unwrap();
        assert_eq!(parsed.book, "Song of Songs");
        assert_eq!(parsed.verse, Some(4));

        let parsed = parse_reference("2John 1:6").unwrap();
        assert_eq!(parsed.book, "2John");
    }

    #[test]
    fn test_rejects_malformed_references() {
        assert_eq!(parse_reference("not a reference"), None);
        assert_eq!(parse_reference("John"), None);
        assert_eq!(parse_reference("John3:16"), None);
        assert_eq!(parse_reference("John 3:"), None);
        assert_eq!(parse_reference("4 Kings 1:1"), None);
        assert_eq!(parse_reference("John 99999999999:1"), None);
        assert_eq!(parse_reference("John 3-5"), None);
        assert_eq!(parse_reference("John 3:-5"), None);
    }

    #[test]
    fn test_end_never_appears_without_verse() {
        for input in ["Psalm 23", "Psalm 23:1", "Psalm 23:1-3", "1 John 4:18-19", "Psalm 23-24"] {
            if let Some(parsed) = parse_reference(input) {
                assert!(parsed.end.is_none() || parsed.verse.is_some(), "{input}");
            }
        }
    }

    #[test]
    fn test_parse_is_repeatable() {
        assert_eq!(parse_reference("Isaiah 58:6-7"), parse_reference("Isaiah 58:6-7"));
    }

    #[test]
    fn test_expand_range_in_order() {
        let verses = expand_reference("Psalm 23:1-3");
        assert_eq!(
            verses,
            vec![coord("Psalm", 23, 1), coord("Psalm", 23, 2), coord("Psalm", 23, 3)]
        );
        assert!(verses.windows(2).all(|w| w[0].verse < w[1].verse));
    }

    #[test]
    fn test_expand_chapter_defaults_to_first_verse() {
        assert_eq!(expand_reference("Psalm 23"), vec![coord("Psalm", 23, 1)]);
    }

    #[test]
    fn test_expand_single_verse() {
        assert_eq!(expand_reference("Esther 4:14"), vec![coord("Esther", 4, 14)]);
    }

    #[test]
    fn test_expand_unparseable_is_empty() {
        assert!(expand_reference("not a reference").is_empty());
        assert!(expand_reference("").is_empty());
        assert!(expand_reference("John 3-5").is_empty());
    }

    #[test]
    fn test_expand_descending_range_is_empty() {
        assert!(expand_reference("Psalm 23:5-2").is_empty());
    }
}
