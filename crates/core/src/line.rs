//! Line grouping and phrase reassembly.
//!
//! Decoders often split one visual line into several fragments at style or
//! font boundaries ("Chapter" in bold, "1" in regular).  Headings are
//! recovered by merging an anchor fragment with the neighbours on its line
//! whose horizontal gap looks like an ordinary word gap.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::config::ReassemblyConfig;
use crate::fragment::Fragment;
use crate::gaps::GapProfile;

/// Identity of a visual text line: page index plus (possibly bucketed) `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    pub page: usize,
    pub y: OrderedFloat<f32>,
}

impl LineKey {
    pub fn of(fragment: &Fragment, y_tolerance: Option<f32>) -> Self {
        let y = match y_tolerance {
            Some(tol) => (fragment.y / tol).round() * tol,
            None => fragment.y,
        };
        LineKey {
            page: fragment.page_number,
            y: OrderedFloat(y),
        }
    }
}

/// Fragments indexed by line, each line sorted left to right.
///
/// Entries are indices into the fragment slice the index was built from.
/// Blank fragments are left out: they carry no text to merge.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    lines: HashMap<LineKey, Vec<usize>>,
    y_tolerance: Option<f32>,
}

/// A phrase rebuilt around an anchor fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Reassembled {
    /// Member texts, trimmed and joined with single spaces.
    pub text: String,
    /// Indices of the merged fragments, left to right.  Contains the anchor.
    pub members: Vec<usize>,
    /// Left edge of the leftmost member.
    pub left: f32,
    /// Right edge of the rightmost member.
    pub right: f32,
}

impl Reassembled {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

impl LineIndex {
    pub fn build(fragments: &[Fragment], y_tolerance: Option<f32>) -> Self {
        let mut lines: HashMap<LineKey, Vec<usize>> = HashMap::new();
        for (idx, fragment) in fragments.iter().enumerate() {
            if fragment.is_blank() {
                continue;
            }
            lines
                .entry(LineKey::of(fragment, y_tolerance))
                .or_default()
                .push(idx);
        }
        // Stable: fragments at the same x keep stream order.
        for members in lines.values_mut() {
            members.sort_by(|&a, &b| fragments[a].x.total_cmp(&fragments[b].x));
        }
        LineIndex { lines, y_tolerance }
    }

    /// Fragment indices on `fragment`'s line, left to right.
    pub fn line_of(&self, fragment: &Fragment) -> &[usize] {
        self.lines
            .get(&LineKey::of(fragment, self.y_tolerance))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Rebuild the phrase containing `fragments[anchor]`.
    ///
    /// Starting from the anchor, neighbours are absorbed to the left and then
    /// to the right while the gap between consecutive boxes stays within
    /// `gap_factor` times the profiled gap for the anchor's font size.
    /// Returns `None` when the anchor is not indexed or the phrase is longer
    /// than `max_words`.
    pub fn reassemble(
        &self,
        fragments: &[Fragment],
        anchor: usize,
        gaps: &GapProfile,
        config: &ReassemblyConfig,
    ) -> Option<Reassembled> {
        let anchor_fragment = fragments.get(anchor)?;
        let line = self.line_of(anchor_fragment);
        let pos = line.iter().position(|&idx| idx == anchor)?;

        let tolerance =
            config.tolerance(gaps.gap_for(anchor_fragment.font_size, config.fallback_gap));
        let gap_between = |left: usize, right: usize| {
            (fragments[line[right]].x - fragments[line[left]].right()).abs()
        };

        let mut start = pos;
        while start > 0 && gap_between(start - 1, start) <= tolerance {
            start -= 1;
        }
        let mut end = pos;
        while end + 1 < line.len() && gap_between(end, end + 1) <= tolerance {
            end += 1;
        }

        let members: Vec<usize> = line[start..=end].to_vec();
        let text = members
            .iter()
            .map(|&idx| fragments[idx].text.trim())
            .collect::<Vec<_>>()
            .join(" ");

        let word_count = text.split_whitespace().count();
        if word_count > config.max_words {
            log::trace!(
                "reassembled phrase of {} words exceeds limit of {}: {:?}",
                word_count,
                config.max_words,
                text
            );
            return None;
        }

        let left = fragments[line[start]].x;
        let right = fragments[line[end]].right();

        Some(Reassembled {
            text,
            members,
            left,
            right,
        })
    }
}
