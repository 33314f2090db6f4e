use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The sampled rectangle of the complex plane.
///
/// A `width × height` grid of cells, centred on `(center_x, center_y)`,
/// with every cell spanning `pixel_size` complex-plane units. Cell `(0, 0)`
/// is the top-left corner; increasing `py` moves down (decreasing imaginary
/// part).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    pub width: u32,
    pub height: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub pixel_size: f64,
    /// Iteration budget per point. `0` is accepted and yields a grid of
    /// set members.
    pub max_iterations: u32,
}

impl GridSettings {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 1000;

    /// Create validated settings.
    pub fn new(
        width: u32,
        height: u32,
        center_x: f64,
        center_y: f64,
        pixel_size: f64,
        max_iterations: u32,
    ) -> crate::Result<Self> {
        let settings = Self {
            width,
            height,
            center_x,
            center_y,
            pixel_size,
            max_iterations,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Whole-set view: the set fits in roughly `[-2.0, 0.47] × [-1.12, 1.12]`,
    /// so pick a pixel size that shows it at any aspect ratio with a margin.
    pub fn default_view(width: u32, height: u32) -> Self {
        let target_re = 3.6;
        let target_im = 2.6;
        let pixel_size = (target_re / width.max(1) as f64).max(target_im / height.max(1) as f64);
        Self {
            width,
            height,
            center_x: -0.75,
            center_y: 0.0,
            pixel_size,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Check the invariants that deserialized settings may violate.
    pub fn validate(&self) -> crate::Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.pixel_size <= 0.0 || !self.pixel_size.is_finite() {
            return Err(CoreError::InvalidPixelSize(self.pixel_size));
        }
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(CoreError::InvalidCenter {
                x: self.center_x,
                y: self.center_y,
            });
        }
        Ok(())
    }

    /// Number of cells in the grid.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Complex coordinate of cell `(0, 0)`.
    #[inline]
    pub fn top_left(&self) -> (f64, f64) {
        (
            self.center_x - self.width as f64 / 2.0 * self.pixel_size,
            self.center_y + self.height as f64 / 2.0 * self.pixel_size,
        )
    }

    /// Map a grid cell to its complex-plane sample point.
    #[inline]
    pub fn cell_to_point(&self, px: u32, py: u32) -> (f64, f64) {
        let (x0, y0) = self.top_left();
        (
            x0 + px as f64 * self.pixel_size,
            y0 - py as f64 * self.pixel_size,
        )
    }

    /// Map a raster index (`y * width + x`) to its sample point.
    #[inline]
    pub fn index_to_point(&self, index: usize) -> (f64, f64) {
        let stride = self.width as usize;
        self.cell_to_point((index % stride) as u32, (index / stride) as u32)
    }

    /// Horizontal extent of the grid in complex-plane units.
    pub fn complex_width(&self) -> f64 {
        self.width as f64 * self.pixel_size
    }

    /// Vertical extent of the grid in complex-plane units.
    pub fn complex_height(&self) -> f64 {
        self.height as f64 * self.pixel_size
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self::default_view(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn default_view_shows_whole_set() {
        let s = GridSettings::default_view(800, 600);
        assert_eq!(s.width, 800);
        assert_eq!(s.height, 600);
        assert!((s.center_x - (-0.75)).abs() < EPSILON);
        assert!(s.complex_width() >= 3.5);
        assert!(s.complex_height() >= 2.5);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn top_left_is_offset_by_half_extent() {
        let s = GridSettings::new(100, 50, 1.0, -1.0, 0.1, 10).unwrap();
        let (x0, y0) = s.top_left();
        assert!((x0 - (1.0 - 5.0)).abs() < EPSILON);
        assert!((y0 - (-1.0 + 2.5)).abs() < EPSILON);
    }

    #[test]
    fn cells_step_right_and_down() {
        let s = GridSettings::new(4, 4, 0.0, 0.0, 1.0, 10).unwrap();
        assert_eq!(s.cell_to_point(0, 0), (-2.0, 2.0));
        assert_eq!(s.cell_to_point(3, 0), (1.0, 2.0));
        assert_eq!(s.cell_to_point(0, 3), (-2.0, -1.0));
        assert_eq!(s.cell_to_point(2, 2), (0.0, 0.0));
    }

    #[test]
    fn raster_index_matches_cell() {
        let s = GridSettings::new(7, 3, -0.5, 0.25, 0.01, 10).unwrap();
        for py in 0..3 {
            for px in 0..7 {
                let idx = (py * 7 + px) as usize;
                assert_eq!(s.index_to_point(idx), s.cell_to_point(px, py));
            }
        }
        assert_eq!(s.cell_count(), 21);
    }

    #[test]
    fn invalid_dimensions() {
        assert!(GridSettings::new(0, 10, 0.0, 0.0, 0.01, 10).is_err());
        assert!(GridSettings::new(10, 0, 0.0, 0.0, 0.01, 10).is_err());
    }

    #[test]
    fn invalid_pixel_size() {
        assert!(GridSettings::new(10, 10, 0.0, 0.0, 0.0, 10).is_err());
        assert!(GridSettings::new(10, 10, 0.0, 0.0, -1.0, 10).is_err());
        assert!(GridSettings::new(10, 10, 0.0, 0.0, f64::NAN, 10).is_err());
        assert!(GridSettings::new(10, 10, 0.0, 0.0, f64::INFINITY, 10).is_err());
    }

    #[test]
    fn invalid_center() {
        assert!(GridSettings::new(10, 10, f64::NAN, 0.0, 0.01, 10).is_err());
        assert!(GridSettings::new(10, 10, 0.0, f64::NEG_INFINITY, 0.01, 10).is_err());
    }

    #[test]
    fn zero_iterations_is_accepted() {
        assert!(GridSettings::new(10, 10, 0.0, 0.0, 0.01, 0).is_ok());
    }

    #[test]
    fn serde_round_trip_keeps_precision() {
        let s = GridSettings::new(
            800,
            600,
            -0.7412067031270126,
            -0.1207678370473447,
            1.0940668476076224e-11,
            1000,
        )
        .unwrap();
        let json = serde_json::to_string(&s).unwrap();
        let back: GridSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
