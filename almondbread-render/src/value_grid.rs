use almondbread_core::{GridSettings, PointResult};
use tracing::{debug, warn};

use crate::error::RenderError;

/// Bytes per persisted record: an `i64` count followed by an `f64` radius.
pub const RECORD_SIZE: usize = 16;

/// What a persisted value buffer holds, judged from its length alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Exactly one record per cell.
    Complete,
    /// A whole number of records, fewer than the grid needs: resumable.
    Partial { records: usize },
    /// Not a whole number of records, or longer than the grid.
    Corrupt,
}

/// Per-cell escape-time results for a grid, in raster order.
///
/// `data` may hold fewer than `width * height` entries: a prefix left by an
/// interrupted calculation that [`compute`](crate::compute) can extend.
/// Keeping these raw values apart from colored pixels lets a scheme change
/// re-render without recalculating.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGrid {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    pub data: Vec<PointResult>,
}

impl ValueGrid {
    /// An empty prefix for `settings`.
    pub fn empty(settings: &GridSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            max_iterations: settings.max_iterations,
            data: Vec::with_capacity(settings.cell_count()),
        }
    }

    /// Total cells in the grid (not the number filled).
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Cells computed so far.
    #[inline]
    pub fn filled(&self) -> usize {
        self.data.len()
    }

    pub fn is_complete(&self) -> bool {
        self.data.len() == self.cell_count()
    }

    /// Fraction of the grid already computed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let cells = self.cell_count();
        if cells == 0 {
            return 0.0;
        }
        self.data.len() as f64 / cells as f64
    }

    /// The result at `(x, y)`, if that cell has been computed.
    pub fn get(&self, x: u32, y: u32) -> Option<&PointResult> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize)
    }

    /// Check that this grid was produced for `settings`' dimensions and budget.
    pub fn check_matches(&self, settings: &GridSettings) -> crate::Result<()> {
        if self.width != settings.width || self.height != settings.height {
            return Err(RenderError::GridMismatch {
                reason: format!(
                    "grid is {}×{}, settings are {}×{}",
                    self.width, self.height, settings.width, settings.height
                ),
            });
        }
        if self.max_iterations != settings.max_iterations {
            return Err(RenderError::GridMismatch {
                reason: format!(
                    "grid computed with {} iterations, settings ask for {}",
                    self.max_iterations, settings.max_iterations
                ),
            });
        }
        if self.data.len() > self.cell_count() {
            return Err(RenderError::GridMismatch {
                reason: format!(
                    "{} entries for {} cells",
                    self.data.len(),
                    self.cell_count()
                ),
            });
        }
        Ok(())
    }

    // -- Persistence --

    /// Classify a persisted buffer of `len` bytes for a grid of `cells` cells.
    pub fn classify_len(len: usize, cells: usize) -> BufferState {
        let expected = cells * RECORD_SIZE;
        if len % RECORD_SIZE != 0 || len > expected {
            BufferState::Corrupt
        } else if len == expected {
            BufferState::Complete
        } else {
            BufferState::Partial {
                records: len / RECORD_SIZE,
            }
        }
    }

    /// Encode as packed native-endian `(i64 count, f64 radius²)` records.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * RECORD_SIZE);
        for r in &self.data {
            bytes.extend_from_slice(&i64::from(r.count).to_ne_bytes());
            bytes.extend_from_slice(&r.radius_sq.to_ne_bytes());
        }
        bytes
    }

    /// Decode a persisted buffer, rejecting anything that is not a valid prefix.
    pub fn from_bytes(settings: &GridSettings, bytes: &[u8]) -> crate::Result<Self> {
        let cells = settings.cell_count();
        if Self::classify_len(bytes.len(), cells) == BufferState::Corrupt {
            return Err(RenderError::CorruptBuffer {
                kind: "value",
                expected: cells * RECORD_SIZE,
                actual: bytes.len(),
            });
        }

        let mut grid = Self::empty(settings);
        for (i, record) in bytes.chunks_exact(RECORD_SIZE).enumerate() {
            let count = i64::from_ne_bytes(word(&record[..8]));
            let radius_sq = f64::from_ne_bytes(word(&record[8..]));
            let count = u32::try_from(count)
                .ok()
                .filter(|&c| c <= settings.max_iterations)
                .ok_or_else(|| RenderError::GridMismatch {
                    reason: format!(
                        "record {i} has count {count} outside 0..={}",
                        settings.max_iterations
                    ),
                })?;
            grid.data.push(PointResult { count, radius_sq });
        }
        Ok(grid)
    }

    /// Decode a persisted buffer, falling back to an empty prefix when it is
    /// unusable so the calculation simply starts over.
    pub fn restore(settings: &GridSettings, bytes: &[u8]) -> Self {
        match Self::from_bytes(settings, bytes) {
            Ok(grid) => {
                debug!(
                    filled = grid.filled(),
                    cells = grid.cell_count(),
                    "Restored value grid"
                );
                grid
            }
            Err(e) => {
                warn!("Discarding persisted value grid: {e}");
                Self::empty(settings)
            }
        }
    }
}

fn word(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GridSettings {
        GridSettings::new(4, 3, 0.0, 0.0, 0.5, 50).unwrap()
    }

    fn sample_grid(len: usize) -> ValueGrid {
        let mut grid = ValueGrid::empty(&settings());
        for i in 0..len {
            grid.data.push(PointResult {
                count: (i * 7 % 51) as u32,
                radius_sq: 65536.0 + i as f64 * 0.125,
            });
        }
        grid
    }

    #[test]
    fn record_layout_is_count_then_radius() {
        let grid = sample_grid(2);
        let bytes = grid.to_bytes();
        assert_eq!(bytes.len(), 2 * RECORD_SIZE);
        assert_eq!(&bytes[16..24], &7i64.to_ne_bytes());
        assert_eq!(&bytes[24..32], &65536.125f64.to_ne_bytes());
    }

    #[test]
    fn partial_prefix_survives_persistence() {
        let grid = sample_grid(5);
        let back = ValueGrid::from_bytes(&settings(), &grid.to_bytes()).unwrap();
        assert_eq!(back, grid);
        assert!(!back.is_complete());
        assert!((back.progress() - 5.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn classify_lengths() {
        assert_eq!(ValueGrid::classify_len(0, 12), BufferState::Partial { records: 0 });
        assert_eq!(ValueGrid::classify_len(48, 12), BufferState::Partial { records: 3 });
        assert_eq!(ValueGrid::classify_len(192, 12), BufferState::Complete);
        assert_eq!(ValueGrid::classify_len(50, 12), BufferState::Corrupt);
        assert_eq!(ValueGrid::classify_len(208, 12), BufferState::Corrupt);
    }

    #[test]
    fn ragged_buffer_is_corrupt() {
        let mut bytes = sample_grid(3).to_bytes();
        bytes.push(0);
        assert!(matches!(
            ValueGrid::from_bytes(&settings(), &bytes),
            Err(RenderError::CorruptBuffer { kind: "value", .. })
        ));
    }

    #[test]
    fn oversized_buffer_is_corrupt() {
        let mut big = sample_grid(12);
        big.data.push(PointResult::default());
        assert!(ValueGrid::from_bytes(&settings(), &big.to_bytes()).is_err());
    }

    #[test]
    fn out_of_range_count_is_rejected() {
        let mut bytes = sample_grid(1).to_bytes();
        bytes[..8].copy_from_slice(&(-1i64).to_ne_bytes());
        assert!(ValueGrid::from_bytes(&settings(), &bytes).is_err());
        bytes[..8].copy_from_slice(&51i64.to_ne_bytes());
        assert!(ValueGrid::from_bytes(&settings(), &bytes).is_err());
    }

    #[test]
    fn restore_discards_corrupt_data() {
        let grid = ValueGrid::restore(&settings(), &[1, 2, 3]);
        assert_eq!(grid.filled(), 0);
        assert_eq!(grid.cell_count(), 12);
    }

    #[test]
    fn get_respects_bounds_and_prefix() {
        let grid = sample_grid(6);
        assert_eq!(grid.get(1, 1), Some(&grid.data[5]));
        assert_eq!(grid.get(2, 1), None, "not yet computed");
        assert_eq!(grid.get(4, 0), None, "out of bounds");
    }

    #[test]
    fn mismatched_settings_are_reported() {
        let grid = sample_grid(2);
        let mut other = settings();
        other.max_iterations = 99;
        assert!(grid.check_matches(&settings()).is_ok());
        assert!(matches!(
            grid.check_matches(&other),
            Err(RenderError::GridMismatch { .. })
        ));
    }
}
