use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::catalog::{self, CATALOG, CHAPTER_COUNT, ChapterDef, FALLBACK_KEY};

/// Level-2 heading at the start of a line: `## Title`.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^##[ \t]").unwrap());

/// Chapter key to segment text, iterated in catalog order.
///
/// Serializes as a JSON object whose keys follow catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapters {
    slots: [Option<String>; CHAPTER_COUNT],
}

/// A filled chapter ready for display as a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterSection {
    pub key: &'static str,
    pub title: &'static str,
    pub glyph: &'static str,
    pub body: String,
}

impl Chapters {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let idx = catalog::position(key)?;
        self.slots[idx].as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Filled chapters in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static ChapterDef, &str)> {
        CATALOG
            .iter()
            .zip(&self.slots)
            .filter_map(|(def, slot)| slot.as_deref().map(|body| (def, body)))
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        self.iter().map(|(def, _)| def.key).collect()
    }

    #[must_use]
    pub fn into_sections(self) -> Vec<ChapterSection> {
        CATALOG
            .iter()
            .zip(self.slots)
            .filter_map(|(def, slot)| {
                slot.map(|body| ChapterSection {
                    key: def.key,
                    title: def.title,
                    glyph: def.glyph,
                    body,
                })
            })
            .collect()
    }

    /// Give `text` to the first unfilled chapter matching `lowered`; otherwise drop it.
    fn claim(&mut self, lowered: &str, text: &str) {
        if let Some((_, slot)) = CATALOG
            .iter()
            .zip(self.slots.iter_mut())
            .find(|(def, slot)| slot.is_none() && def.matches(lowered))
        {
            *slot = Some(text.trim().to_owned());
        }
    }
}

impl Serialize for Chapters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (def, body) in self.iter() {
            map.serialize_entry(def.key, body)?;
        }
        map.end()
    }
}

/// Split a markdown report into catalog chapters.
///
/// Each level-2 heading starts a new segment. A segment goes to the first
/// unfilled chapter (catalog order) with a keyword occurring in it, matched
/// case-insensitively. Segments that find no unfilled chapter are dropped.
/// When nothing is assigned, the untouched report goes to the fallback chapter.
#[must_use]
pub fn segment(report: &str) -> Chapters {
    let mut chapters = Chapters::default();

    for piece in split_at_headings(report) {
        chapters.claim(&piece.to_lowercase(), piece);
    }

    if chapters.is_empty()
        && let Some(idx) = catalog::position(FALLBACK_KEY)
    {
        chapters.slots[idx] = Some(report.to_owned());
    }

    chapters
}

fn split_at_headings(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = HEADING_RE.find_iter(text).map(|m| m.start()).collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}
