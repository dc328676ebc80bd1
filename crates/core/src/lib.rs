//! Core library for pdfoutline
//!
//! This crate implements the **Functional Core** of the pdfoutline application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The pdfoutline project splits into three crates:
//!
//! - **`outline_core`** (this crate): heading detection over decoded text, zero I/O
//! - **`pdf`**: turns PDF bytes into positioned [`Fragment`]s
//! - **`pdfoutline`**: file handling, batch orchestration and the CLI (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! - **Pure functions**: the same fragments and configuration always produce the same outline
//! - **No side effects**: no file or network access; diagnostics go through `log` only
//! - **Testable**: every stage is exercised with hand-built fragments, no PDFs required
//!
//! # Pipeline
//!
//! ```text
//!                      +-> FontTiers  --------------------+
//! fragments (doc order)+-> GapProfile --+                 |
//!                      +-> LineIndex  --+-> reassemble -> check_phrase -> score -> classify -> dedupe
//! ```
//!
//! - [`tiers`]: distinct font sizes mapped to title / H1 / H2 / H3
//! - [`gaps`]: average inter-word gap per font size
//! - [`line`]: line grouping and phrase reassembly
//! - [`lexicon`] and [`filter`]: structural and lexical rejection of candidates
//! - [`score`]: additive scoring and the level ladder
//! - [`outline`]: the single pass that assembles the outline
//! - [`config`]: every tunable constant, loadable from TOML
//!
//! # Example Usage
//!
//! ```rust
//! use outline_core::{extract_outline, Fragment, HeadingLevel, PageSize};
//!
//! let fragments = vec![
//!     Fragment::new("Introduction", 18.0, 0)
//!         .bold(true)
//!         .at(200.0, 50.0, 120.0),
//! ];
//!
//! let outline = extract_outline(&fragments, PageSize::new(600.0, 800.0));
//!
//! assert_eq!(outline.title, "Introduction");
//! assert_eq!(outline.outline[0].level, HeadingLevel::H1);
//! assert_eq!(outline.outline[0].page, 1);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod gaps;
pub mod lexicon;
pub mod line;
pub mod outline;
pub mod score;
pub mod tiers;

pub use config::{OutlineConfig, ReassemblyConfig};
pub use error::ConfigError;
pub use filter::{check_phrase, Rejection};
pub use fragment::{Fragment, PageSize};
pub use gaps::GapProfile;
pub use lexicon::{Lexicon, LexiconConfig, LexiconMode};
pub use line::{LineIndex, Reassembled};
pub use outline::{
    extract_outline, normalize_heading_text, CandidateTrace, Decision, Outline, OutlineEntry,
    OutlineExtractor, UNTITLED,
};
pub use score::{score_candidate, Candidate, HeadingLevel, ScoreBreakdown, ScoringConfig, Thresholds};
pub use tiers::FontTiers;
