use serde::{Deserialize, Serialize};

/// Squared bailout magnitude: `2^16`.
///
/// Far larger than the textbook radius of 2 so the smooth iteration count
/// computed from `|z|²` at escape is accurate.
pub const ESCAPE_RADIUS_SQ: f64 = 65536.0;

/// The escape-time result for a single sample point.
///
/// `count == max_iterations` means the orbit never escaped and the point is
/// treated as a set member. `radius_sq` is `|z|²` at the last iteration
/// performed; the coloring pass only reads it for escaped points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointResult {
    pub count: u32,
    pub radius_sq: f64,
}

impl PointResult {
    /// `true` when the orbit escaped before exhausting `max_iterations`.
    #[inline]
    pub fn escaped(&self, max_iterations: u32) -> bool {
        self.count < max_iterations
    }
}

/// Iterate `z_{n+1} = z_n² + c` from `z₀ = 0` for `c = x0 + i·y0`.
///
/// Returns at the first iteration whose `|z|²` reaches [`ESCAPE_RADIUS_SQ`],
/// or with `count == max_iterations` once the budget is spent.
#[inline]
pub fn evaluate(x0: f64, y0: f64, max_iterations: u32) -> PointResult {
    let mut zx = 0.0;
    let mut zy = 0.0;
    let mut zx2 = 0.0;
    let mut zy2 = 0.0;

    for count in 0..max_iterations {
        zx2 = zx * zx;
        zy2 = zy * zy;

        let radius_sq = zx2 + zy2;
        if radius_sq >= ESCAPE_RADIUS_SQ {
            return PointResult { count, radius_sq };
        }

        zy = 2.0 * zx * zy + y0;
        zx = zx2 - zy2 + x0;
    }

    PointResult {
        count: max_iterations,
        radius_sq: zx2 + zy2,
    }
}
