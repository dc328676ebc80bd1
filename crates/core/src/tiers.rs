use serde::{Deserialize, Serialize};

use crate::fragment::Fragment;

/// Font sizes assigned to the title and the three heading tiers.
///
/// Invariant: `title >= h1 >= h2 >= h3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontTiers {
    pub title: f32,
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
}

impl FontTiers {
    /// Rank the distinct font sizes of the document, largest first, and
    /// assign the top four positionally.
    ///
    /// With fewer than four distinct sizes, the missing tiers reuse the
    /// smallest size seen.  A document with no fragments gets all zeros;
    /// there is nothing to score in that case.
    pub fn estimate(fragments: &[Fragment]) -> Self {
        let mut sizes: Vec<f32> = fragments
            .iter()
            .map(|f| f.font_size)
            .filter(|s| s.is_finite())
            .collect();
        sizes.sort_by(|a, b| b.total_cmp(a));
        sizes.dedup();

        let Some(&smallest) = sizes.last() else {
            return FontTiers {
                title: 0.0,
                h1: 0.0,
                h2: 0.0,
                h3: 0.0,
            };
        };
        let tier = |i: usize| sizes.get(i).copied().unwrap_or(smallest);

        let tiers = FontTiers {
            title: tier(0),
            h1: tier(1),
            h2: tier(2),
            h3: tier(3),
        };
        log::debug!(
            "font tiers from {} distinct sizes: title={} h1={} h2={} h3={}",
            sizes.len(),
            tiers.title,
            tiers.h1,
            tiers.h2,
            tiers.h3
        );
        tiers
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.title, self.h1, self.h2, self.h3]
    }
}
