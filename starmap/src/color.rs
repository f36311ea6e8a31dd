//! Stellar color index to display color mapping.
//!
//! The B-V color index tracks effective temperature: hot blue stars sit
//! near -0.4, the Sun near 0.65, cool red giants above 1.5. [`star_color`]
//! maps it onto an RGB triple for the point cloud color buffer with a
//! piecewise-linear curve. Note the blue channel rises again toward the red
//! end of the domain.
//!
//! # Examples
//!
//! ```rust
//! use starmap::color::{star_color, Rgb};
//!
//! // Unknown color index renders white
//! assert_eq!(star_color(None), Rgb::WHITE);
//!
//! // Indices outside the domain render like the nearest bound
//! assert_eq!(star_color(Some(3.5)), star_color(Some(2.0)));
//!
//! let sunlike = star_color(Some(0.65));
//! assert!(sunlike.to_array().iter().all(|c| (0.0..=1.0).contains(c)));
//! ```

use serde::{Deserialize, Serialize};

/// Lower bound of the color index domain (blue-hot end).
pub const MIN_COLOR_INDEX: f64 = -0.4;

/// Upper bound of the color index domain (red-cool end).
pub const MAX_COLOR_INDEX: f64 = 2.0;

/// An RGB color with each channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    /// Fallback color for stars without a usable color index.
    pub const WHITE: Rgb = Rgb {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Channels in buffer order.
    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Map a B-V color index to a display color.
///
/// Absent or non-finite input yields [`Rgb::WHITE`]. Otherwise the index is
/// clamped to [`MIN_COLOR_INDEX`, `MAX_COLOR_INDEX`] and
///
/// ```text
/// r = min(1, 1.5 - c)
/// g = min(1, 1.2 - |0.4 - c|)
/// b = min(1, 1.8 * c)
/// ```
///
/// Channels that go negative near the clamp bounds are floored at zero.
pub fn star_color(color_index: Option<f64>) -> Rgb {
    let ci = match color_index {
        Some(ci) if ci.is_finite() => ci,
        _ => return Rgb::WHITE,
    };

    let c = ci.clamp(MIN_COLOR_INDEX, MAX_COLOR_INDEX);

    let r = (1.5 - c).min(1.0);
    let g = (1.2 - (0.4 - c).abs()).min(1.0);
    let b = (1.8 * c).min(1.0);

    Rgb::new(unit(r), unit(g), unit(b))
}

fn unit(channel: f64) -> f32 {
    channel.max(0.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_absent_is_white() {
        assert_eq!(star_color(None), Rgb::WHITE);
    }

    #[test]
    fn test_non_finite_is_white() {
        assert_eq!(star_color(Some(f64::NAN)), Rgb::WHITE);
        assert_eq!(star_color(Some(f64::INFINITY)), Rgb::WHITE);
        assert_eq!(star_color(Some(f64::NEG_INFINITY)), Rgb::WHITE);
    }

    #[test]
    fn test_solar_like_index() {
        // c = 0.65: r = min(1, 0.85), g = min(1, 1.2 - 0.25), b = min(1, 1.17)
        let color = star_color(Some(0.65));
        assert_relative_eq!(color.r, 0.85, epsilon = 1e-6);
        assert_relative_eq!(color.g, 0.95, epsilon = 1e-6);
        assert_relative_eq!(color.b, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_midpoint_index() {
        let color = star_color(Some(0.5));
        assert_relative_eq!(color.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(color.g, 1.0, epsilon = 1e-6);
        assert_relative_eq!(color.b, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_boundaries() {
        let blue = star_color(Some(MIN_COLOR_INDEX));
        // r = min(1, 1.9) = 1, g = 1.2 - 0.8 = 0.4, b = -0.72 floored
        assert_relative_eq!(blue.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(blue.g, 0.4, epsilon = 1e-6);
        assert_relative_eq!(blue.b, 0.0, epsilon = 1e-6);

        let red = star_color(Some(MAX_COLOR_INDEX));
        // r = -0.5 floored, g = 1.2 - 1.6 floored, b = 1
        assert_relative_eq!(red.r, 0.0, epsilon = 1e-6);
        assert_relative_eq!(red.g, 0.0, epsilon = 1e-6);
        assert_relative_eq!(red.b, 1.0, epsilon = 1e-6);
    }

    #[rstest]
    #[case(-0.41, MIN_COLOR_INDEX)]
    #[case(-5.0, MIN_COLOR_INDEX)]
    #[case(2.01, MAX_COLOR_INDEX)]
    #[case(40.0, MAX_COLOR_INDEX)]
    fn test_out_of_domain_clamps_to_boundary(#[case] ci: f64, #[case] boundary: f64) {
        assert_eq!(star_color(Some(ci)), star_color(Some(boundary)));
    }

    #[test]
    fn test_channels_always_in_unit_range() {
        let mut ci = -3.0;
        while ci <= 4.0 {
            let color = star_color(Some(ci));
            for channel in color.to_array() {
                assert!(
                    (0.0..=1.0).contains(&channel),
                    "channel {channel} out of range for ci {ci}"
                );
            }
            ci += 0.01;
        }
    }
}
