//! Outline assembly: one pass over the fragment stream in document order.
//!
//! ```text
//! fragment -> reassemble -> check_phrase -> score -> classify -> dedupe -> entry
//! ```
//!
//! All state of the pass lives in an `Accumulator` threaded through a fold,
//! so the same input always yields the same outline.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::OutlineConfig;
use crate::filter::{check_phrase, Rejection};
use crate::fragment::{Fragment, PageSize};
use crate::gaps::GapProfile;
use crate::lexicon::Lexicon;
use crate::line::LineIndex;
use crate::score::{score_candidate, Candidate, HeadingLevel, ScoreBreakdown};
use crate::tiers::FontTiers;

/// Title used when no heading was found.
pub const UNTITLED: &str = "Untitled";

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    /// 1-based page number.
    pub page: usize,
}

/// The structured record emitted per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl Outline {
    /// Wrap entries, deriving the title from the first one.
    pub fn from_entries(entries: Vec<OutlineEntry>) -> Self {
        let title = entries
            .first()
            .map(|e| e.text.clone())
            .unwrap_or_else(|| UNTITLED.to_string());
        Outline {
            title,
            outline: entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.outline.is_empty()
    }
}

/// Key used to detect repeated headings such as running headers.
///
/// Lowercases, removes punctuation and collapses whitespace.
pub fn normalize_heading_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lower, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// What happened to one anchor fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Accepted { level: HeadingLevel },
    Duplicate { level: HeadingLevel },
    BelowThreshold,
    Rejected { reason: Rejection },
}

/// Record of one anchor's trip through the pipeline, for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTrace {
    /// 1-based page number.
    pub page: usize,
    pub anchor: String,
    /// Reassembled phrase; `None` when reassembly itself rejected the anchor.
    pub text: Option<String>,
    pub font_size: f32,
    pub score: Option<ScoreBreakdown>,
    pub decision: Decision,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Per-document statistics computed once before the pass.
struct DocumentStats {
    tiers: FontTiers,
    gaps: GapProfile,
    lines: LineIndex,
}

type PositionKey = (usize, OrderedFloat<f32>, OrderedFloat<f32>);

fn position_key(fragment: &Fragment) -> PositionKey {
    (
        fragment.page_number,
        OrderedFloat(fragment.y),
        OrderedFloat(fragment.x),
    )
}

/// State threaded through the document pass.
#[derive(Debug, Default)]
struct Accumulator {
    seen_positions: HashSet<PositionKey>,
    seen_headings: HashSet<String>,
    entries: Vec<OutlineEntry>,
    traces: Option<Vec<CandidateTrace>>,
}

impl Accumulator {
    fn tracing() -> Self {
        Accumulator {
            traces: Some(Vec::new()),
            ..Accumulator::default()
        }
    }

    fn record(&mut self, trace: impl FnOnce() -> CandidateTrace) {
        if let Some(traces) = self.traces.as_mut() {
            traces.push(trace());
        }
    }

    fn into_outline(self) -> Outline {
        Outline::from_entries(self.entries)
    }
}

/// Heading extraction with a fixed configuration and lexicon.
#[derive(Debug, Clone)]
pub struct OutlineExtractor {
    config: OutlineConfig,
    lexicon: Lexicon,
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        OutlineExtractor::new(OutlineConfig::default())
    }
}

impl OutlineExtractor {
    /// Build an extractor using the lexicon selected by `config`.
    pub fn new(config: OutlineConfig) -> Self {
        let lexicon = config.build_lexicon();
        OutlineExtractor { config, lexicon }
    }

    pub fn with_lexicon(config: OutlineConfig, lexicon: Lexicon) -> Self {
        OutlineExtractor { config, lexicon }
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Extract the outline of one document.
    ///
    /// `fragments` must be in document order: pages ascending, reading order
    /// within a page.  `page` is the page size used for position scoring.
    pub fn extract(&self, fragments: &[Fragment], page: PageSize) -> Outline {
        let outline = self.run(fragments, page, Accumulator::default()).into_outline();
        log::debug!(
            "extracted {} headings from {} fragments, title {:?}",
            outline.outline.len(),
            fragments.len(),
            outline.title
        );
        outline
    }

    /// Like [`extract`](Self::extract), but report every anchor considered.
    pub fn trace(&self, fragments: &[Fragment], page: PageSize) -> Vec<CandidateTrace> {
        self.run(fragments, page, Accumulator::tracing())
            .traces
            .unwrap_or_default()
    }

    fn run(&self, fragments: &[Fragment], page: PageSize, init: Accumulator) -> Accumulator {
        let stats = DocumentStats {
            tiers: FontTiers::estimate(fragments),
            gaps: GapProfile::build(fragments),
            lines: LineIndex::build(fragments, self.config.reassembly.y_tolerance),
        };
        log::debug!(
            "{} fragments on {} lines",
            fragments.len(),
            stats.lines.line_count()
        );

        (0..fragments.len()).fold(init, |acc, idx| {
            self.step(acc, &stats, fragments, idx, page)
        })
    }

    fn step(
        &self,
        mut acc: Accumulator,
        stats: &DocumentStats,
        fragments: &[Fragment],
        idx: usize,
        page: PageSize,
    ) -> Accumulator {
        let anchor = &fragments[idx];
        if anchor.is_blank() || !acc.seen_positions.insert(position_key(anchor)) {
            return acc;
        }

        let Some(phrase) =
            stats
                .lines
                .reassemble(fragments, idx, &stats.gaps, &self.config.reassembly)
        else {
            acc.record(|| CandidateTrace {
                page: anchor.page_number + 1,
                anchor: anchor.text.clone(),
                text: None,
                font_size: anchor.font_size,
                score: None,
                decision: Decision::Rejected {
                    reason: Rejection::TooManyWords,
                },
            });
            return acc;
        };

        for &member in &phrase.members {
            acc.seen_positions.insert(position_key(&fragments[member]));
        }

        let traced = |score: Option<ScoreBreakdown>, decision: Decision| CandidateTrace {
            page: anchor.page_number + 1,
            anchor: anchor.text.clone(),
            text: Some(phrase.text.clone()),
            font_size: anchor.font_size,
            score,
            decision,
        };

        if let Err(reason) =
            check_phrase(&phrase.text, &self.lexicon, self.config.reassembly.max_words)
        {
            log::trace!("rejected {:?}: {}", phrase.text, reason);
            acc.record(|| traced(None, Decision::Rejected { reason }));
            return acc;
        }

        let candidate = Candidate::from_reassembled(anchor, &phrase);
        let score = score_candidate(&candidate, &stats.tiers, page, &self.config.scoring);
        let Some(level) = self.config.thresholds.classify(score.total()) else {
            log::trace!("{:?} scored {} below threshold", phrase.text, score.total());
            acc.record(|| traced(Some(score), Decision::BelowThreshold));
            return acc;
        };

        if !acc.seen_headings.insert(normalize_heading_text(&phrase.text)) {
            log::trace!("duplicate heading {:?}", phrase.text);
            acc.record(|| traced(Some(score), Decision::Duplicate { level }));
            return acc;
        }

        log::trace!("{} {:?} (score {})", level, phrase.text, score.total());
        acc.record(|| traced(Some(score), Decision::Accepted { level }));
        acc.entries.push(OutlineEntry {
            level,
            text: phrase.text.trim().to_string(),
            page: anchor.page_number + 1,
        });
        acc
    }
}

/// Extract an outline with the default configuration.
pub fn extract_outline(fragments: &[Fragment], page: PageSize) -> Outline {
    OutlineExtractor::default().extract(fragments, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: PageSize = PageSize {
        width: 600.0,
        height: 800.0,
    };

    fn frag(text: &str, size: f32, page: usize, x: f32, y: f32, width: f32) -> Fragment {
        Fragment::new(text, size, page).at(x, y, width)
    }

    /// Body text that pins the smaller tiers and the 10pt gap profile.
    fn body(page: usize, y: f32) -> Fragment {
        frag(
            "the quick brown fox jumps over the lazy dog again and again",
            10.0,
            page,
            50.0,
            y,
            500.0,
        )
    }

    #[test]
    fn test_single_title_fragment() {
        let fragments = vec![frag("Introduction", 18.0, 0, 200.0, 50.0, 120.0).bold(true)];
        let outline = extract_outline(&fragments, PAGE);
        assert_eq!(outline.title, "Introduction");
        assert_eq!(
            outline.outline,
            vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "Introduction".to_string(),
                page: 1,
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        let outline = extract_outline(&[], PAGE);
        assert_eq!(outline.title, UNTITLED);
        assert!(outline.is_empty());
    }

    #[test]
    fn test_blank_fragments_are_ignored() {
        let outline = extract_outline(&[frag("   ", 18.0, 0, 200.0, 50.0, 10.0)], PAGE);
        assert!(outline.is_empty());
    }

    #[test]
    fn test_the_is_never_a_heading() {
        let fragments = vec![frag("the", 30.0, 0, 280.0, 10.0, 40.0).bold(true)];
        let traces = OutlineExtractor::default().trace(&fragments, PAGE);
        assert_eq!(
            traces[0].decision,
            Decision::Rejected {
                reason: Rejection::UnlikelyWord
            }
        );
        assert!(extract_outline(&fragments, PAGE).is_empty());
    }

    #[test]
    fn test_numbers_and_roman_numerals_never_headings() {
        for text in ["12", "3.1", "IV"] {
            let fragments = vec![frag(text, 24.0, 0, 290.0, 20.0, 20.0).bold(true)];
            assert!(
                extract_outline(&fragments, PAGE).is_empty(),
                "{text} became a heading"
            );
        }
    }

    #[test]
    fn test_split_line_is_reassembled() {
        // Sizes: 24 (title), 16 (H1), 14 (H2), 10 (H3).
        let fragments = vec![
            frag("Annual Report", 24.0, 0, 220.0, 40.0, 160.0),
            frag("Some subtitle here", 16.0, 2, 50.0, 300.0, 150.0),
            frag("Chapter", 14.0, 1, 40.0, 100.0, 60.0).bold(true),
            frag("1", 14.0, 1, 104.0, 100.0, 8.0).bold(true),
            body(1, 140.0),
        ];
        let traces = OutlineExtractor::default().trace(&fragments, PAGE);
        let chapter = traces
            .iter()
            .find(|t| t.anchor == "Chapter")
            .expect("chapter anchor traced");
        assert_eq!(chapter.text.as_deref(), Some("Chapter 1"));
        // H2 tier (2) + bold (1): below the H3 cut-off.
        assert_eq!(chapter.score.map(|s| s.total()), Some(3.0));
        // The merged "1" is never considered on its own.
        assert!(traces.iter().all(|t| t.anchor != "1"));
    }

    #[test]
    fn test_centered_split_heading_classified() {
        let fragments = vec![
            frag("Annual Report", 24.0, 0, 220.0, 40.0, 160.0),
            frag("Some subtitle here", 16.0, 2, 50.0, 300.0, 150.0),
            frag("Chapter", 14.0, 1, 250.0, 100.0, 60.0).bold(true),
            frag("1", 14.0, 1, 314.0, 100.0, 8.0).bold(true),
            body(1, 140.0),
        ];
        let outline = extract_outline(&fragments, PAGE);
        let chapter = outline
            .outline
            .iter()
            .find(|e| e.text == "Chapter 1")
            .expect("chapter heading");
        // H2 tier (2) + centred (2) + bold (1) = 5.
        assert_eq!(chapter.level, HeadingLevel::H2);
        assert_eq!(chapter.page, 2);
    }

    #[test]
    fn test_repeated_running_header_is_deduplicated() {
        let fragments: Vec<Fragment> = (0..3)
            .flat_map(|page| {
                vec![
                    frag("ACME Corp. Report", 12.0, page, 250.0, 20.0, 100.0).bold(true),
                    body(page, 200.0),
                ]
            })
            .collect();
        let outline = extract_outline(&fragments, PAGE);
        assert_eq!(outline.outline.len(), 1);
        assert_eq!(outline.outline[0].page, 1);

        let traces = OutlineExtractor::default().trace(&fragments, PAGE);
        let duplicates = traces
            .iter()
            .filter(|t| matches!(t.decision, Decision::Duplicate { .. }))
            .count();
        assert_eq!(duplicates, 2);
    }

    #[test]
    fn test_duplicates_compare_normalized_text() {
        let fragments = vec![
            frag("Getting Started", 20.0, 0, 250.0, 20.0, 100.0),
            frag("getting   started!", 20.0, 1, 250.0, 20.0, 100.0),
            body(0, 400.0),
        ];
        let outline = extract_outline(&fragments, PAGE);
        assert_eq!(outline.outline.len(), 1);
        assert_eq!(outline.outline[0].text, "Getting Started");
    }

    #[test]
    fn test_order_follows_first_occurrence() {
        let fragments = vec![
            frag("Overview", 20.0, 0, 260.0, 20.0, 80.0),
            body(0, 100.0),
            frag("Methodology", 20.0, 1, 250.0, 20.0, 100.0),
            frag("Results", 20.0, 2, 260.0, 20.0, 80.0),
        ];
        let outline = extract_outline(&fragments, PAGE);
        let texts: Vec<_> = outline.outline.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Overview", "Methodology", "Results"]);
        let pages: Vec<_> = outline.outline.iter().map(|e| e.page).collect();
        assert_eq!(pages, [1, 2, 3]);
        assert_eq!(outline.title, "Overview");
    }

    #[test]
    fn test_long_lines_are_not_headings() {
        let fragments = vec![
            frag("one two three four five six", 20.0, 0, 100.0, 20.0, 200.0),
            frag("seven eight nine ten", 20.0, 0, 305.0, 20.0, 150.0),
        ];
        let outline = extract_outline(&fragments, PAGE);
        assert!(outline.is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let fragments = vec![
            frag("Annual Report", 24.0, 0, 220.0, 40.0, 160.0),
            frag("Chapter", 14.0, 1, 250.0, 100.0, 60.0).bold(true),
            frag("1", 14.0, 1, 314.0, 100.0, 8.0).bold(true),
            body(1, 140.0),
            frag("SUMMARY", 16.0, 2, 40.0, 60.0, 70.0).bold(true),
        ];
        let first = serde_json::to_string(&extract_outline(&fragments, PAGE)).unwrap();
        for _ in 0..5 {
            let again = serde_json::to_string(&extract_outline(&fragments, PAGE)).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_invariants_hold_on_noisy_input() {
        let mut fragments = Vec::new();
        // Reading order within each page: y, then x.
        for page in 0..4 {
            fragments.push(frag("Company Confidential", 9.0, page, 260.0, 10.0, 90.0));
            fragments.push(frag("Section", 16.0, page, 250.0, 60.0, 60.0).bold(true));
            fragments.push(frag(&format!("{}", page + 1), 16.0, page, 314.0, 60.0, 8.0).bold(true));
            fragments.push(body(page, 100.0));
            fragments.push(frag("IV", 20.0, page, 290.0, 400.0, 16.0));
            fragments.push(frag(&format!("{}", page + 1), 9.0, page, 295.0, 780.0, 8.0));
            fragments.push(frag("Appendix", 16.0, page, 40.0, 700.0, 70.0).bold(true));
        }
        let outline = extract_outline(&fragments, PAGE);
        assert!(!outline.is_empty());

        let mut seen = HashSet::new();
        for entry in &outline.outline {
            assert!(entry.text.split_whitespace().count() <= 9);
            assert!(seen.insert(normalize_heading_text(&entry.text)));
            assert_ne!(entry.text, "IV");
        }
        assert!(outline
            .outline
            .windows(2)
            .all(|w| w[0].page <= w[1].page));

        // Accepted anchors follow (page, y, x) order.
        let traces = OutlineExtractor::default().trace(&fragments, PAGE);
        let keys: Vec<PositionKey> = traces
            .iter()
            .filter(|t| matches!(t.decision, Decision::Accepted { .. }))
            .map(|t| {
                let anchor = fragments
                    .iter()
                    .find(|f| f.page_number + 1 == t.page && f.text == t.anchor)
                    .expect("anchor fragment");
                position_key(anchor)
            })
            .collect();
        assert_eq!(keys.len(), outline.outline.len());
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_same_position_is_visited_once() {
        // Text drawn twice at one spot, too far from itself to merge.
        let fragments = vec![
            frag("Overview", 20.0, 0, 200.0, 20.0, 200.0),
            frag("Overview", 20.0, 0, 200.0, 20.0, 200.0),
            body(0, 300.0),
        ];
        let traces = OutlineExtractor::default().trace(&fragments, PAGE);
        let overview: Vec<_> = traces.iter().filter(|t| t.anchor == "Overview").collect();
        assert_eq!(overview.len(), 1);
        assert_eq!(overview[0].text.as_deref(), Some("Overview"));
        assert!(matches!(overview[0].decision, Decision::Accepted { .. }));
        assert!(traces
            .iter()
            .all(|t| !matches!(t.decision, Decision::Duplicate { .. })));

        let outline = extract_outline(&fragments, PAGE);
        assert_eq!(outline.outline.len(), 1);
    }

    #[test]
    fn test_normalize_heading_text() {
        assert_eq!(normalize_heading_text("  Hello,   World! "), "hello world");
        assert_eq!(normalize_heading_text("1.2 Scope"), "12 scope");
        assert_eq!(normalize_heading_text("Ünïcode—Text"), "ünïcodetext");
    }

    #[test]
    fn test_outline_serializes_to_record_shape() {
        let outline = Outline::from_entries(vec![OutlineEntry {
            level: HeadingLevel::H1,
            text: "Introduction".into(),
            page: 1,
        }]);
        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Introduction",
                "outline": [{ "level": "H1", "text": "Introduction", "page": 1 }]
            })
        );
    }

    #[test]
    fn test_stricter_thresholds_drop_headings() {
        let fragments = vec![frag("Introduction", 18.0, 0, 200.0, 50.0, 120.0).bold(true)];
        let mut config = OutlineConfig::default();
        config.thresholds.h1 = 11.5;
        config.thresholds.h2 = 11.5;
        config.thresholds.h3 = 11.5;
        let outline = OutlineExtractor::new(config).extract(&fragments, PAGE);
        assert!(outline.is_empty());
    }

    #[test]
    fn test_custom_lexicon_blocks_word() {
        let fragments = vec![frag("Introduction", 18.0, 0, 200.0, 50.0, 120.0).bold(true)];
        let extractor = OutlineExtractor::with_lexicon(
            OutlineConfig::default(),
            Lexicon::new(Vec::<String>::new(), ["introduction"]),
        );
        assert!(extractor.extract(&fragments, PAGE).is_empty());
    }
}
