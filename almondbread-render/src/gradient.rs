use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Ratios at or below zero are nudged up to this before mapping.
pub const MIN_RATIO: f64 = 0.0001;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A linear RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Per-channel linear interpolation; `t = 0` gives `self`.
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
        }
    }

    /// Quantize to an opaque RGBA8 pixel.
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        [quantize(self.r), quantize(self.g), quantize(self.b), 255]
    }
}

#[inline]
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Scale to 256 levels and round, clamping 1.0 and above to 255. NaN maps
/// to 0.
#[inline]
fn quantize(c: f64) -> u8 {
    (c * 256.0).round().clamp(0.0, 255.0) as u8
}

// ---------------------------------------------------------------------------
// Gradient schemes
// ---------------------------------------------------------------------------

/// An anchor of a piecewise-linear color ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub position: f64,
    pub color: Rgb,
}

impl ControlPoint {
    pub const fn new(position: f64, r: f64, g: f64, b: f64) -> Self {
        Self {
            position,
            color: Rgb::new(r, g, b),
        }
    }
}

/// An ordered list of control points with strictly increasing positions.
///
/// The first control point is the floor of the ramp: ratios are interpolated
/// from it towards the next point, without a terminator entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientScheme {
    points: Vec<ControlPoint>,
}

impl GradientScheme {
    /// Validate and build a scheme.
    pub fn new(points: Vec<ControlPoint>) -> crate::Result<Self> {
        if points.is_empty() {
            return Err(RenderError::InvalidScheme {
                reason: "no control points".into(),
            });
        }
        for (i, p) in points.iter().enumerate() {
            if !(0.0..=1.0).contains(&p.position) {
                return Err(RenderError::InvalidScheme {
                    reason: format!("control point {i} at {} is outside [0, 1]", p.position),
                });
            }
        }
        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].position <= w[0].position)
        {
            return Err(RenderError::InvalidScheme {
                reason: format!("control point {} does not follow {}", i + 1, i),
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Map a normalized ratio to a color.
    ///
    /// `ratio >= 1` is black (set members and out-of-range smoothing).
    /// `ratio <= 0` is treated as [`MIN_RATIO`]. Otherwise the color is
    /// interpolated between the last control point at or below `ratio` and
    /// the first one above it. A ratio past the last control point falls
    /// back to white.
    pub fn color_for(&self, ratio: f64) -> Rgb {
        if ratio >= 1.0 {
            return Rgb::BLACK;
        }
        let ratio = if ratio <= 0.0 { MIN_RATIO } else { ratio };

        let Some((first, rest)) = self.points.split_first() else {
            return Rgb::WHITE;
        };
        let mut prev = first;
        for point in rest {
            if ratio < point.position {
                let frac = (ratio - prev.position) / (point.position - prev.position);
                return prev.color.lerp(point.color, frac);
            }
            prev = point;
        }
        Rgb::WHITE
    }
}

// ---------------------------------------------------------------------------
// Builtin schemes
// ---------------------------------------------------------------------------

/// Selector for the two schemes shipped with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinScheme {
    /// Blue → cyan → green → yellow → red (Paul Bourke).
    #[default]
    Warm,
    /// Navy → sky → white → orange → black → lilac.
    Cool,
}

impl BuiltinScheme {
    pub const ALL: [Self; 2] = [Self::Warm, Self::Cool];

    pub fn name(self) -> &'static str {
        match self {
            Self::Warm => "Warm",
            Self::Cool => "Cool",
        }
    }

    pub fn scheme(self) -> GradientScheme {
        let points = match self {
            Self::Warm => WARM.to_vec(),
            Self::Cool => COOL.to_vec(),
        };
        GradientScheme { points }
    }
}

impl fmt::Display for BuiltinScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for GradientScheme {
    fn default() -> Self {
        BuiltinScheme::default().scheme()
    }
}

pub fn builtin_schemes() -> Vec<GradientScheme> {
    BuiltinScheme::ALL.iter().map(|s| s.scheme()).collect()
}

const WARM: [ControlPoint; 5] = [
    ControlPoint::new(0.00, 0.0, 0.0, 1.0),
    ControlPoint::new(0.25, 0.0, 1.0, 1.0),
    ControlPoint::new(0.50, 0.0, 1.0, 0.0),
    ControlPoint::new(0.75, 1.0, 1.0, 0.0),
    ControlPoint::new(1.00, 1.0, 0.0, 0.0),
];

const COOL: [ControlPoint; 6] = [
    ControlPoint::new(0.000000, 0.000000, 0.027451, 0.392157),
    ControlPoint::new(0.160000, 0.125490, 0.419608, 0.796078),
    ControlPoint::new(0.420000, 0.929412, 1.000000, 1.000000),
    ControlPoint::new(0.642500, 1.000000, 0.666667, 0.000000),
    ControlPoint::new(0.857500, 0.000000, 0.007843, 0.000000),
    ControlPoint::new(1.000000, 0.400000, 0.400000, 1.000000),
];

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < EPSILON && (a.g - b.g).abs() < EPSILON && (a.b - b.b).abs() < EPSILON
    }

    #[test]
    fn saturated_ratio_is_black() {
        for scheme in builtin_schemes() {
            assert_eq!(scheme.color_for(1.0), Rgb::BLACK);
            assert_eq!(scheme.color_for(7.5), Rgb::BLACK);
        }
    }

    #[test]
    fn zero_is_clamped_to_min_ratio() {
        for scheme in builtin_schemes() {
            assert_eq!(scheme.color_for(0.0), scheme.color_for(MIN_RATIO));
            assert_eq!(scheme.color_for(-3.0), scheme.color_for(MIN_RATIO));
        }
    }

    #[test]
    fn control_points_are_hit_exactly() {
        let warm = BuiltinScheme::Warm.scheme();
        assert!(close(warm.color_for(0.25), Rgb::new(0.0, 1.0, 1.0)));
        assert!(close(warm.color_for(0.5), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(warm.color_for(0.75), Rgb::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn interpolates_between_neighbours() {
        let warm = BuiltinScheme::Warm.scheme();
        // Halfway between cyan (0.25) and green (0.5).
        assert!(close(warm.color_for(0.375), Rgb::new(0.0, 1.0, 0.5)));
        // A quarter of the way from yellow (0.75) to red (1.0).
        assert!(close(warm.color_for(0.8125), Rgb::new(1.0, 0.75, 0.0)));
    }

    #[test]
    fn ratio_past_last_point_is_white() {
        let short = GradientScheme::new(vec![
            ControlPoint::new(0.0, 0.0, 0.0, 0.0),
            ControlPoint::new(0.5, 1.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(short.color_for(0.75), Rgb::WHITE);
        assert!(close(short.color_for(0.25), Rgb::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn nan_ratio_does_not_panic() {
        assert_eq!(GradientScheme::default().color_for(f64::NAN), Rgb::WHITE);
    }

    #[test]
    fn builtin_schemes_are_valid() {
        assert_eq!(BuiltinScheme::Warm.scheme().points().len(), 5);
        assert_eq!(BuiltinScheme::Cool.scheme().points().len(), 6);
        for scheme in builtin_schemes() {
            assert!(GradientScheme::new(scheme.points().to_vec()).is_ok());
        }
    }

    #[test]
    fn invalid_schemes_are_rejected() {
        assert!(GradientScheme::new(Vec::new()).is_err());
        assert!(GradientScheme::new(vec![
            ControlPoint::new(0.0, 0.0, 0.0, 0.0),
            ControlPoint::new(0.0, 1.0, 1.0, 1.0),
        ])
        .is_err());
        assert!(GradientScheme::new(vec![ControlPoint::new(1.5, 0.0, 0.0, 0.0)]).is_err());
    }

    #[test]
    fn quantize_rounds_and_clamps() {
        assert_eq!(Rgb::new(0.0, 0.5, 1.0).to_rgba8(), [0, 128, 255, 255]);
        assert_eq!(Rgb::new(0.6, 0.99, 0.25).to_rgba8(), [154, 253, 64, 255]);
        assert_eq!(Rgb::new(-0.2, 1.3, 0.1).to_rgba8(), [0, 255, 26, 255]);
        assert_eq!(Rgb::new(0.997, 0.998, 0.001).to_rgba8(), [255, 255, 0, 255]);
    }

    #[test]
    fn scheme_names_and_default() {
        assert_eq!(BuiltinScheme::Cool.to_string(), "Cool");
        assert_eq!(BuiltinScheme::default(), BuiltinScheme::Warm);
    }
}
