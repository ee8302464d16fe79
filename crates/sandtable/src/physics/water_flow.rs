//! Surface-driven water transfer and the erosion it drags along.

use crate::config::PhysicsParams;

/// Water that wants to move from a surface at `from` to one at `to`,
/// limited by what the source still has this pass.
#[inline]
pub fn flow_transfer(from_surface: f32, to_surface: f32, available: f32, params: &PhysicsParams) -> f32 {
    let diff = from_surface - to_surface;
    if diff <= 0.0 || available <= 0.0 {
        return 0.0;
    }
    (0.5 * diff * params.flow_speed).min(available)
}

/// Land carried off by a single outgoing flow, limited by the land left at
/// the source.
#[inline]
pub fn erosion_transfer(flow: f32, available_land: f32, params: &PhysicsParams) -> f32 {
    if flow <= params.erosion_threshold || available_land <= 0.0 {
        return 0.0;
    }
    (flow * params.erosion_rate)
        .min(params.max_erosion)
        .min(available_land)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PhysicsParams {
        PhysicsParams {
            flow_speed: 0.5,
            erosion_threshold: 1.0,
            erosion_rate: 0.1,
            max_erosion: 0.3,
            ..Default::default()
        }
    }

    #[test]
    fn test_flow_downhill_only() {
        let p = params();
        assert_eq!(flow_transfer(10.0, 12.0, 5.0, &p), 0.0);
        assert_eq!(flow_transfer(10.0, 10.0, 5.0, &p), 0.0);
        assert!((flow_transfer(12.0, 10.0, 5.0, &p) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_flow_capped_by_available_water() {
        let p = params();
        assert!((flow_transfer(40.0, 0.0, 2.0, &p) - 2.0).abs() < 1e-6);
        assert_eq!(flow_transfer(40.0, 0.0, 0.0, &p), 0.0);
    }

    #[test]
    fn test_erosion_thresholds() {
        let p = params();
        assert_eq!(erosion_transfer(1.0, 50.0, &p), 0.0);
        assert!((erosion_transfer(2.0, 50.0, &p) - 0.2).abs() < 1e-6);
        // Clamped by max_erosion then by available land
        assert!((erosion_transfer(10.0, 50.0, &p) - 0.3).abs() < 1e-6);
        assert!((erosion_transfer(10.0, 0.1, &p) - 0.1).abs() < 1e-6);
    }
}
