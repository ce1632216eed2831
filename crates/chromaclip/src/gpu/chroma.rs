//! The chroma-key contract.
//!
//! A single hard-coded key color with fixed threshold and slope, matched
//! literally by the fragment stage in `chroma_key.wgsl`. The CPU mirror here
//! exists so the keying math is testable without a GPU; keep the two in sync.

use glam::Vec3;

/// Background key color of the clip, 0x17ad2b.
pub const KEYING_COLOR: Vec3 = Vec3::new(23.0 / 255.0, 173.0 / 255.0, 43.0 / 255.0);

/// Color distance at which a pixel becomes fully opaque. `d` ranges 0..√3.
pub const KEY_THRESHOLD: f32 = 0.4;

/// Fraction of the threshold over which alpha ramps from 0 to 1.
pub const KEY_SLOPE: f32 = 0.2;

/// Output alpha for a sampled color: `smoothstep(edge0, threshold, d)` with
/// `d = |‖keying_color − input_color‖|` and `edge0 = threshold · (1 − slope)`.
pub fn key_alpha(input_color: Vec3) -> f32 {
    let d = (KEYING_COLOR - input_color).length().abs();
    let edge0 = KEY_THRESHOLD * (1.0 - KEY_SLOPE);
    smoothstep(edge0, KEY_THRESHOLD, d)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_key_color_is_fully_transparent() {
        assert_eq!(key_alpha(KEYING_COLOR), 0.0);
    }

    #[test]
    fn pure_white_is_fully_opaque() {
        assert_eq!(key_alpha(Vec3::ONE), 1.0);
    }

    #[test]
    fn colors_inside_the_soft_edge_are_partially_transparent() {
        // Just past edge0 = 0.32 but short of the 0.4 threshold.
        let input = KEYING_COLOR + Vec3::new(0.36, 0.0, 0.0);
        let alpha = key_alpha(input);
        assert!(alpha > 0.0 && alpha < 1.0, "alpha was {alpha}");
    }

    #[test]
    fn alpha_is_monotonic_in_color_distance() {
        let mut last = -1.0f32;
        for step in 0..=20 {
            let offset = step as f32 * 0.05;
            let alpha = key_alpha(KEYING_COLOR + Vec3::splat(offset));
            assert!(alpha >= last);
            last = alpha;
        }
    }
}
