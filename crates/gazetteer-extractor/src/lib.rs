//! Gazetteer Extractor
//!
//! Turns free-form provider output into typed data.
//!
//! # Overview
//!
//! Text-generation services answer with "JSON, mostly": arrays wrapped in
//! markdown fences, preceded by chatter, sprinkled with emoji, or cut off
//! half-way. This crate locates the array, cleans it, and decodes it strictly
//! into either [`Record`](gazetteer_domain::Record)s or a list of names. It
//! also owns the prompt templates and the per-unit [`Deduplicator`].
//!
//! # Pipeline
//!
//! ```text
//! raw text → strip fences → first balanced [...] → repair → strip emoji → decode
//! ```
//!
//! # Example Usage
//!
//! ```
//! use gazetteer_extractor::{parse_records, Deduplicator};
//!
//! let raw = "Here you go:\n```json\n[{\"source_name\": \"NHK World\"}, {\"source_name\": \"nhk world\"}]\n```";
//! let records = parse_records(raw, "source_name").unwrap();
//! assert_eq!(records.len(), 2);
//!
//! let mut dedup = Deduplicator::new("source_name");
//! assert_eq!(dedup.filter(records).len(), 1);
//! ```

#![warn(missing_docs)]

mod dedup;
mod error;
mod parser;
mod prompt;

#[cfg(test)]
mod tests;

pub use dedup::{filter_new, Deduplicator};
pub use error::ExtractorError;
pub use parser::{extract_json_array, parse_names, parse_records, strip_pictographs, PICTOGRAPH_RANGES};
pub use prompt::{PromptBuilder, PromptTemplates};
