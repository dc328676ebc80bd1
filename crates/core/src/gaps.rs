use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::fragment::Fragment;

/// Average inter-word gap per font size.
///
/// Built from fragments that carry two or more words: each contributes
/// `width / (words - 1)` to its size's average.  The value is a similarity
/// threshold for line reassembly, not a measured glyph spacing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapProfile {
    gaps: BTreeMap<OrderedFloat<f32>, f32>,
}

impl GapProfile {
    pub fn build(fragments: &[Fragment]) -> Self {
        let mut sums: BTreeMap<OrderedFloat<f32>, (f32, usize)> = BTreeMap::new();

        for fragment in fragments {
            let words = fragment.word_count();
            if words < 2 {
                continue;
            }
            let avg_gap = fragment.width / (words - 1) as f32;
            let entry = sums.entry(OrderedFloat(fragment.font_size)).or_insert((0.0, 0));
            entry.0 += avg_gap;
            entry.1 += 1;
        }

        let gaps: BTreeMap<_, _> = sums
            .into_iter()
            .map(|(size, (sum, n))| (size, sum / n as f32))
            .collect();
        log::debug!("gap profile covers {} font sizes", gaps.len());

        GapProfile { gaps }
    }

    /// Profiled gap for `font_size`, if any multi-word fragment had that size.
    pub fn get(&self, font_size: f32) -> Option<f32> {
        self.gaps.get(&OrderedFloat(font_size)).copied()
    }

    /// Profiled gap for `font_size`, or `fallback` when the size is unprofiled.
    pub fn gap_for(&self, font_size: f32, fallback: f32) -> f32 {
        self.get(font_size).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }
}
