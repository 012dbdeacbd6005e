//! Chapter catalog and chapter segmentation for generated deep reports.

pub mod catalog;
pub mod segmenter;

pub use catalog::{CATALOG, CHAPTER_COUNT, ChapterDef};
pub use segmenter::{ChapterSection, Chapters, segment};
