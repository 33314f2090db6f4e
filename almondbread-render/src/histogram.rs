use tracing::debug;

use crate::value_grid::ValueGrid;

/// Histogram-equalized palette positions, one per escape count.
///
/// `palette[n]` is the fraction of escaped points whose count is below `n`,
/// so each count occupies gradient space in proportion to how often it
/// occurs. Values are non-decreasing, start at `0`, and never exceed `1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    hues: Vec<f64>,
}

impl Palette {
    /// Build the palette for a completed grid.
    ///
    /// Set members (`count >= max_iterations`) are left out of the histogram;
    /// they would otherwise swamp the distribution. If no point escaped, the
    /// palette is all zeros.
    pub fn build(grid: &ValueGrid, max_iterations: u32) -> Self {
        let len = max_iterations as usize;
        let mut histogram = vec![0u64; len];
        for r in &grid.data {
            if r.count < max_iterations {
                histogram[r.count as usize] += 1;
            }
        }

        let total: u64 = histogram.iter().sum();
        if total == 0 {
            debug!(max_iterations, "Degenerate histogram, using a flat palette");
            return Self {
                hues: vec![0.0; len],
            };
        }

        let total = total as f64;
        let mut hue = 0.0;
        let hues = histogram
            .iter()
            .map(|&h| {
                let last = hue;
                hue += h as f64 / total;
                last
            })
            .collect();
        Self { hues }
    }

    /// Palette position for escape count `count`.
    #[inline]
    pub fn get(&self, count: usize) -> Option<f64> {
        self.hues.get(count).copied()
    }

    pub fn len(&self) -> usize {
        self.hues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hues.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.hues
    }
}
