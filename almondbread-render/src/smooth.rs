use std::f64::consts::LN_2;

use almondbread_core::PointResult;

use crate::gradient::lerp;
use crate::histogram::Palette;

/// Normalized gradient position for one point, in `[0, 1]`.
///
/// Escaped points use the renormalized count
///   `fcount = n + 1 − log₂(ln|zₙ|)`
/// and interpolate between the palette entries around it. Set members, and
/// points whose smoothed count falls outside `[0, max_iterations − 1)`
/// (including NaN), map to `1.0`, which the gradient renders as black.
pub fn smooth_ratio(result: &PointResult, max_iterations: u32, palette: &Palette) -> f64 {
    if result.count >= max_iterations {
        return 1.0;
    }

    let log_zn = result.radius_sq.ln() / 2.0;
    let nu = (log_zn / LN_2).ln() / LN_2;
    let fcount = result.count as f64 + 1.0 - nu;
    let floor = fcount.floor();
    let ifc = if floor.is_nan() { i64::MIN } else { floor as i64 };

    if ifc < 0 || ifc >= i64::from(max_iterations) - 1 {
        return 1.0;
    }
    let i = ifc as usize;
    match (palette.get(i), palette.get(i + 1)) {
        (Some(lo), Some(hi)) => lerp(lo, hi, fcount - floor),
        _ => 1.0,
    }
}
