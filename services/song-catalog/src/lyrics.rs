//!
//! src/lyrics.rs  Andrew Belles  Oct 19th, 2026
//!
//! Splits stored lyric text into verses and cuts a page out of them
//!

use serde::Serialize;

use crate::types::{Song, SongId};

pub const VERSE_DELIMITER: &str = "\n\n";
pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 1;

/// Verses of a lyric text in order. Never empty: text without a blank
/// line, including "", is a single verse
pub fn split_verses(text: &str) -> Vec<&str> {
    text.split(VERSE_DELIMITER).collect()
}

/// Page of verses to return. `parse` maps anything absent, non-numeric
/// or below 1 to page 1 with one verse per page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseWindow {
    pub page: usize,
    pub limit: usize
}

impl Default for VerseWindow {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl VerseWindow {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        let positive = |raw: Option<&str>, default: usize, name: &str| -> usize {
            match raw.map(|s| s.trim().parse::<usize>()) {
                Some(Ok(v)) if v >= 1 => v,
                None => default,
                Some(_) => {
                    tracing::debug!(param = name, value = ?raw, "lyrics.param.default");
                    default
                }
            }
        };
        Self {
            page: positive(page, DEFAULT_PAGE, "page"),
            limit: positive(limit, DEFAULT_LIMIT, "limit")
        }
    }

    /// Half open verse range for `total` verses. A page past the end
    /// starts over at the first verse instead of coming back empty
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let mut start = self.page.saturating_sub(1).saturating_mul(self.limit);
        if start >= total {
            start = 0;
        }
        let end = start.saturating_add(self.limit).min(total);
        start..end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricsPage {
    #[serde(rename = "ID")]
    pub id: SongId,
    pub song: String,
    pub group: String,
    #[serde(rename = "verse")]
    pub verses: Vec<String>,
    pub total: usize
}

pub fn paginate(song: &Song, window: VerseWindow) -> LyricsPage {
    let verses = split_verses(&song.text);
    let total  = verses.len();
    let range  = window.range(total);

    LyricsPage {
        id: song.id,
        song: song.song.clone(),
        group: song.group.clone(),
        verses: verses[range].iter().map(|v| v.to_string()).collect(),
        total
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use super::*;

    fn song(text: &str) -> Song {
        Song {
            id: SongId(1),
            group: "Muse".to_string(),
            song: "Starlight".to_string(),
            release_date: NaiveDate::from_ymd_opt(2006, 6, 16).unwrap(),
            text: text.to_string(),
            link: "http://x".to_string()
        }
    }

    #[test]
    fn split_on_blank_lines() {
        assert_eq!(split_verses("A\n\nB\n\nC"), ["A", "B", "C"]);
        assert_eq!(split_verses("A\nstill A\n\nB"), ["A\nstill A", "B"]);
    }

    #[test]
    fn empty_text_is_one_empty_verse() {
        assert_eq!(split_verses(""), [""]);
        assert_eq!(paginate(&song(""), VerseWindow::default()).verses, [""]);
        assert_eq!(paginate(&song(""), VerseWindow::default()).total, 1);
    }

    #[test]
    fn window_defaults_on_bad_input() {
        let expected = VerseWindow::default();
        assert_eq!(VerseWindow::parse(None, None), expected);
        assert_eq!(VerseWindow::parse(Some("two"), Some("")), expected);
        assert_eq!(VerseWindow::parse(Some("0"), Some("-3")), expected);
        assert_eq!(VerseWindow::parse(Some("1"), Some("0")), expected);
        assert_eq!(VerseWindow::parse(Some("2"), Some("0")),
            VerseWindow { page: 2, limit: 1 });
        assert_eq!(VerseWindow::parse(Some("3"), Some("2")),
            VerseWindow { page: 3, limit: 2 });
    }

    #[test]
    fn pages_walk_through_verses() {
        let s = song("v1\n\nv2\n\nv3");
        let first = paginate(&s, VerseWindow { page: 1, limit: 2 });
        assert_eq!(first.verses, ["v1", "v2"]);
        assert_eq!(first.total, 3);

        let second = paginate(&s, VerseWindow { page: 2, limit: 2 });
        assert_eq!(second.verses, ["v3"]);
        assert_eq!(second.total, 3);
    }

    // Out-of-range pages deliberately restart at the first verse rather
    // than returning an empty page. Keep this pinned until the product
    // behavior is decided otherwise.
    #[test]
    fn out_of_range_page_falls_back_to_first_page() {
        let s = song("v1\n\nv2\n\nv3");
        let page = paginate(&s, VerseWindow { page: 5, limit: 2 });
        assert_eq!(page.verses, ["v1", "v2"]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn huge_values_do_not_overflow() {
        let s = song("v1\n\nv2");
        let page = paginate(&s, VerseWindow { page: usize::MAX, limit: usize::MAX });
        assert_eq!(page.verses, ["v1", "v2"]);
    }

    #[test]
    fn page_serializes_with_wire_names() -> Result<(), serde_json::Error> {
        let page = paginate(&song("v1\n\nv2"), VerseWindow::default());
        let json = serde_json::to_value(&page)?;
        assert_eq!(json, serde_json::json!({
            "ID": 1, "song": "Starlight", "group": "Muse", "verse": ["v1"], "total": 2
        }));
        Ok(())
    }
}
