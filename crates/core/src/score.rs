//! Multi-factor scoring and the score -> heading-level ladder.
//!
//! A candidate's score is the sum of three independent parts:
//!
//! | part     | signal                                              | default range |
//! |----------|-----------------------------------------------------|---------------|
//! | font     | font size close to the title / H1 / H2 / H3 tier    | 0 .. 5        |
//! | position | near the top of the first page, horizontally centred| 0, 2, 4       |
//! | style    | bold anchor, all-uppercase text                     | 0, 1, 2       |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fragment::{Fragment, PageSize};
use crate::lexicon::is_all_uppercase;
use crate::line::Reassembled;
use crate::tiers::FontTiers;

// ---------------------------------------------------------------------------
// Heading levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }

    /// Numeric depth, 1 for H1.
    pub fn depth(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Maximum distance, in points, between a font size and a tier value
    /// for the size to count as that tier.  Absorbs jitter in font metadata.
    pub tier_tolerance: f32,
    pub title_weight: f32,
    pub h1_weight: f32,
    pub h2_weight: f32,
    pub h3_weight: f32,
    /// Fraction of the page height, from the top, that counts as the title
    /// band on the first page.
    pub top_band_ratio: f32,
    pub top_band_weight: f32,
    /// Maximum distance from the page's horizontal centre, as a fraction of
    /// the page width, for text to count as centred.
    pub center_band_ratio: f32,
    pub center_band_weight: f32,
    pub bold_weight: f32,
    pub uppercase_weight: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            tier_tolerance: 0.5,
            title_weight: 5.0,
            h1_weight: 3.5,
            h2_weight: 2.0,
            h3_weight: 1.0,
            top_band_ratio: 0.2,
            top_band_weight: 2.0,
            center_band_ratio: 0.15,
            center_band_weight: 2.0,
            bold_weight: 1.0,
            uppercase_weight: 1.0,
        }
    }
}

/// Minimum scores for each heading level.
///
/// `classify` walks the ladder from H1 down, so with `h1 >= h2 >= h3` a
/// higher score never yields a less prominent level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            h1: 7.0,
            h2: 5.0,
            h3: 3.5,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.h1 >= self.h2 && self.h2 >= self.h3 {
            Ok(())
        } else {
            Err(ConfigError::InvalidThresholds {
                h1: self.h1,
                h2: self.h2,
                h3: self.h3,
            })
        }
    }

    pub fn classify(&self, score: f32) -> Option<HeadingLevel> {
        if score >= self.h1 {
            Some(HeadingLevel::H1)
        } else if score >= self.h2 {
            Some(HeadingLevel::H2)
        } else if score >= self.h3 {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates and scores
// ---------------------------------------------------------------------------

/// A reassembled phrase with the typographic signal needed to score it.
///
/// Font size and boldness come from the anchor fragment; the horizontal
/// extent covers every merged fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    pub page_number: usize,
    pub top: f32,
    pub left: f32,
    pub right: f32,
}

impl Candidate {
    pub fn from_reassembled(anchor: &Fragment, phrase: &Reassembled) -> Self {
        Candidate {
            text: phrase.text.clone(),
            font_size: anchor.font_size,
            bold: anchor.bold,
            page_number: anchor.page_number,
            top: anchor.y,
            left: phrase.left,
            right: phrase.right,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub font: f32,
    pub position: f32,
    pub style: f32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f32 {
        self.font + self.position + self.style
    }
}

/// Weight for the first tier within `tier_tolerance` of `size`, checked
/// from the title tier down.
pub fn font_score(size: f32, tiers: &FontTiers, config: &ScoringConfig) -> f32 {
    let near = |tier: f32| (size - tier).abs() < config.tier_tolerance;
    if near(tiers.title) {
        config.title_weight
    } else if near(tiers.h1) {
        config.h1_weight
    } else if near(tiers.h2) {
        config.h2_weight
    } else if near(tiers.h3) {
        config.h3_weight
    } else {
        0.0
    }
}

pub fn position_score(candidate: &Candidate, page: PageSize, config: &ScoringConfig) -> f32 {
    let mut score = 0.0;
    if candidate.page_number == 0 && candidate.top < config.top_band_ratio * page.height {
        score += config.top_band_weight;
    }
    let margin = config.center_band_ratio * page.width;
    if (candidate.center_x() - page.width / 2.0).abs() < margin {
        score += config.center_band_weight;
    }
    score
}

pub fn style_score(candidate: &Candidate, config: &ScoringConfig) -> f32 {
    let mut score = 0.0;
    if candidate.bold {
        score += config.bold_weight;
    }
    if is_all_uppercase(candidate.text.trim()) {
        score += config.uppercase_weight;
    }
    score
}

pub fn score_candidate(
    candidate: &Candidate,
    tiers: &FontTiers,
    page: PageSize,
    config: &ScoringConfig,
) -> ScoreBreakdown {
    ScoreBreakdown {
        font: font_score(candidate.font_size, tiers, config),
        position: position_score(candidate, page, config),
        style: style_score(candidate, config),
    }
}
