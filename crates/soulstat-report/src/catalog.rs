/// A chapter of the "Book of Destiny" reading view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterDef {
    pub key: &'static str,
    pub title: &'static str,
    pub glyph: &'static str,
    /// Lowercase substrings; a segment belongs to this chapter when any of them occurs in it.
    pub keywords: &'static [&'static str],
}

impl ChapterDef {
    /// Returns `true` when any keyword occurs in `lowered`.
    ///
    /// `lowered` must already be lower-cased.
    #[must_use]
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw))
    }
}

pub const CHAPTER_COUNT: usize = 7;

/// Fixed chapter order. The first entry receives the whole report when nothing matches.
pub static CATALOG: [ChapterDef; CHAPTER_COUNT] = [
    ChapterDef {
        key: "essence",
        title: "The Essence of the Soul",
        glyph: "☯",
        keywords: &["essence", "personality", "day master"],
    },
    ChapterDef {
        key: "strengths",
        title: "Hidden Strengths & Shadows",
        glyph: "⚔",
        keywords: &["strength", "shadow", "hidden"],
    },
    ChapterDef {
        key: "wealth",
        title: "The Path of Wealth & Career",
        glyph: "💰",
        keywords: &["wealth", "career", "money", "profession"],
    },
    ChapterDef {
        key: "heart",
        title: "Heart & Harmony",
        glyph: "❤",
        keywords: &["heart", "love", "relationship", "harmony"],
    },
    ChapterDef {
        key: "health",
        title: "Vessel of the Spirit",
        glyph: "🌿",
        keywords: &["health", "vessel", "wellness", "vitality"],
    },
    ChapterDef {
        key: "tides",
        title: "The Current Tides",
        glyph: "🌊",
        keywords: &["tide", "forecast", "current year"],
    },
    ChapterDef {
        key: "wisdom",
        title: "Sage's Final Wisdom",
        glyph: "📜",
        keywords: &["wisdom", "sage", "advice"],
    },
];

/// Key of the chapter that receives unclassified reports.
pub const FALLBACK_KEY: &str = "essence";

pub(crate) fn position(key: &str) -> Option<usize> {
    CATALOG.iter().position(|def| def.key == key)
}
