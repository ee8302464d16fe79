//! Angle-of-repose slumping between adjacent land cells.

use crate::config::PhysicsParams;

/// Land that slides from a cell at `from` to a neighbour at `to`.
///
/// Only the height above `talus` moves, and only half of the scaled excess so
/// a single pair never overshoots and swaps order.
#[inline]
pub fn slump_transfer(from: f32, to: f32, params: &PhysicsParams) -> f32 {
    let excess = from - to - params.talus;
    if excess > 0.0 {
        0.5 * excess * params.slump_factor
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_slump_within_talus() {
        let params = PhysicsParams::default();
        assert_eq!(slump_transfer(10.0, 10.0 - params.talus, &params), 0.0);
        assert_eq!(slump_transfer(10.0, 12.0, &params), 0.0);
    }

    #[test]
    fn test_slump_moves_half_scaled_excess() {
        let params = PhysicsParams {
            talus: 2.0,
            slump_factor: 0.5,
            ..Default::default()
        };
        // Excess of 8 over talus -> 0.5 * 8 * 0.5
        assert!((slump_transfer(20.0, 10.0, &params) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_slump_never_inverts_pair() {
        let params = PhysicsParams {
            talus: 0.0,
            slump_factor: 1.0,
            ..Default::default()
        };
        let (a, b) = (100.0, 0.0);
        let t = slump_transfer(a, b, &params);
        assert!(a - t >= b + t);
    }
}
