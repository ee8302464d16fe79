//! Circular falloff brush for raising and lowering land.
//!
//! Used by the interactive tools and by every vehicle that digs or builds.
//! The brush only edits `land`; water settles on the next physics step.

use glam::Vec2;

use crate::constants::{MAX_LAND, MIN_LAND};
use crate::heightfield::HeightField;

/// Inclusive cell range `(x0, x1, y0, y1)` covered by a brush, clipped to the
/// grid. `None` when the brush is degenerate or misses the grid entirely.
fn clipped_span(field: &HeightField, cx: f32, cy: f32, radius: f32) -> Option<(usize, usize, usize, usize)> {
    if !(radius > 0.0) || !radius.is_finite() || !cx.is_finite() || !cy.is_finite() {
        return None;
    }
    let max = field.resolution as f32 - 1.0;
    let (lo_x, hi_x) = ((cx - radius).floor(), (cx + radius).ceil());
    let (lo_y, hi_y) = ((cy - radius).floor(), (cy + radius).ceil());
    if hi_x < 0.0 || hi_y < 0.0 || lo_x > max || lo_y > max {
        return None;
    }
    Some((
        lo_x.max(0.0) as usize,
        hi_x.min(max) as usize,
        lo_y.max(0.0) as usize,
        hi_y.min(max) as usize,
    ))
}

/// Apply a brush centred at `(cx, cy)`.
///
/// Each cell within `radius` of the centre changes by
/// `strength * (1 - d / radius)`, clamped to the land range. Returns the sum
/// of the changes actually applied (positive for added material). A
/// non-positive radius or any non-finite input is a no-op.
pub fn modify(field: &mut HeightField, cx: f32, cy: f32, radius: f32, strength: f32) -> f32 {
    if !strength.is_finite() || strength == 0.0 {
        return 0.0;
    }
    let Some((x0, x1, y0, y1)) = clipped_span(field, cx, cy, radius) else {
        return 0.0;
    };

    let mut volume = 0.0_f32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            if d > radius {
                continue;
            }

            let idx = field.idx(x, y);
            let before = field.land[idx];
            let after = (before + strength * (1.0 - d / radius)).clamp(MIN_LAND, MAX_LAND);
            field.land[idx] = after;
            volume += after - before;
        }
    }

    volume
}

/// Sum of the brush falloff weights for a cell-centred brush.
///
/// Multiplying by `strength` gives the volume an unclamped edit would move,
/// so dividing a target volume by this gives the strength to use.
pub fn footprint_weight(radius: f32) -> f32 {
    if !(radius > 0.0) || !radius.is_finite() {
        return 0.0;
    }
    let r = radius.ceil() as i32;
    let mut sum = 0.0;
    for dy in -r..=r {
        for dx in -r..=r {
            let d = ((dx * dx + dy * dy) as f32).sqrt();
            if d <= radius {
                sum += 1.0 - d / radius;
            }
        }
    }
    sum
}

/// Sum of falloff weights for a brush at `(cx, cy)`, counting only cells on
/// the grid. `strength * brush_weight` is the volume an unclamped `modify`
/// with the same arguments changes.
pub fn brush_weight(field: &HeightField, cx: f32, cy: f32, radius: f32) -> f32 {
    let Some((x0, x1, y0, y1)) = clipped_span(field, cx, cy, radius) else {
        return 0.0;
    };
    let mut sum = 0.0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            if d <= radius {
                sum += 1.0 - d / radius;
            }
        }
    }
    sum
}

/// Pull land inside the circle toward its mean by `factor` (0..=1).
///
/// Unlike `modify` this preserves volume apart from clamping. Returns the net
/// change and the amount of land that was shifted.
pub fn relax(field: &mut HeightField, cx: f32, cy: f32, radius: f32, factor: f32) -> (f32, f32) {
    if !factor.is_finite() {
        return (0.0, 0.0);
    }
    let Some((x0, x1, y0, y1)) = clipped_span(field, cx, cy, radius) else {
        return (0.0, 0.0);
    };
    let factor = factor.clamp(0.0, 1.0);

    let mut cells = Vec::new();
    let mut sum = 0.0_f32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
            if d2 > radius * radius {
                continue;
            }
            let idx = field.idx(x, y);
            sum += field.land[idx];
            cells.push(idx);
        }
    }
    if cells.is_empty() {
        return (0.0, 0.0);
    }

    let mean = sum / cells.len() as f32;
    let mut net = 0.0;
    let mut moved = 0.0;
    for idx in cells {
        let before = field.land[idx];
        let after = (before + (mean - before) * factor).clamp(MIN_LAND, MAX_LAND);
        field.land[idx] = after;
        net += after - before;
        if after > before {
            moved += after - before;
        }
    }
    (net, moved)
}

/// A queued brush edit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushAction {
    pub center: Vec2,
    pub radius: f32,
    /// Positive raises land, negative digs.
    pub strength: f32,
}

impl BrushAction {
    pub fn new(center: Vec2, radius: f32, strength: f32) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }

    /// Apply to the field; returns net volume changed.
    pub fn apply(&self, field: &mut HeightField) -> f32 {
        modify(field, self.center.x, self.center.y, self.radius, self.strength)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_and_lower_round_trip() {
        let mut hf = HeightField::new(32, 100.0);
        let original = hf.land.clone();

        let up = modify(&mut hf, 16.0, 16.0, 5.0, 3.0);
        let down = modify(&mut hf, 16.0, 16.0, 5.0, -3.0);

        assert!(up > 0.0);
        assert!((up + down).abs() < 1e-3);
        for (a, b) in hf.land.iter().zip(&original) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_volume_matches_footprint_when_unclamped() {
        let mut hf = HeightField::new(32, 100.0);
        let volume = modify(&mut hf, 10.0, 10.0, 3.0, 2.0);
        assert!((volume - 2.0 * footprint_weight(3.0)).abs() < 1e-3);
    }

    #[test]
    fn test_clamped_at_floor() {
        let mut hf = HeightField::new(16, 1.0);
        let volume = modify(&mut hf, 8.0, 8.0, 2.0, -10.0);
        assert_eq!(hf.land[hf.idx(8, 8)], 0.0);
        // Only the 1.0 that existed at each touched cell can be removed
        assert!(volume >= -13.0 && volume < 0.0);
    }

    #[test]
    fn test_partial_brush_at_corner() {
        let mut hf = HeightField::new(8, 50.0);
        let volume = modify(&mut hf, 0.0, 0.0, 3.0, 1.0);
        assert!(volume > 0.0);
        assert!(volume < footprint_weight(3.0));
        assert!((hf.land[0] - 51.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_inputs_are_noops() {
        let mut hf = HeightField::new(8, 50.0);
        assert_eq!(modify(&mut hf, 4.0, 4.0, 0.0, 5.0), 0.0);
        assert_eq!(modify(&mut hf, 4.0, 4.0, -2.0, 5.0), 0.0);
        assert_eq!(modify(&mut hf, f32::NAN, 4.0, 2.0, 5.0), 0.0);
        assert_eq!(modify(&mut hf, 4.0, 4.0, 2.0, f32::INFINITY), 0.0);
        assert!(hf.land.iter().all(|&l| l == 50.0));
    }

    #[test]
    fn test_unbounded_radius_is_noop_or_clipped() {
        let mut hf = HeightField::new(16, 50.0);
        assert_eq!(modify(&mut hf, 8.0, 8.0, f32::INFINITY, 1.0), 0.0);
        assert_eq!(brush_weight(&hf, 8.0, 8.0, f32::NAN), 0.0);
        assert_eq!(relax(&mut hf, 8.0, 8.0, f32::INFINITY, 0.5), (0.0, 0.0));
        assert!(hf.land.iter().all(|&l| l == 50.0));

        // A huge finite radius covers the whole grid at nearly full strength
        let volume = modify(&mut hf, 8.0, 8.0, 1.0e6, 1.0);
        assert!((volume - 256.0).abs() < 0.1);
        assert!((brush_weight(&hf, 8.0, 8.0, 1.0e6) - 256.0).abs() < 0.1);
        let (net, _) = relax(&mut hf, 8.0, 8.0, 1.0e6, 1.0);
        assert!(net.abs() < 1e-2);
    }

    #[test]
    fn test_far_off_grid_centre_is_noop() {
        let mut hf = HeightField::new(16, 50.0);
        assert_eq!(modify(&mut hf, 1.0e9, -1.0e9, 4.0, 3.0), 0.0);
        assert_eq!(brush_weight(&hf, -1.0e9, 8.0, 4.0), 0.0);
    }

    #[test]
    fn test_brush_fully_off_grid() {
        let mut hf = HeightField::new(8, 50.0);
        assert_eq!(modify(&mut hf, -20.0, -20.0, 3.0, 5.0), 0.0);
    }

    #[test]
    fn test_brush_weight_predicts_volume_off_centre() {
        let mut hf = HeightField::new(16, 100.0);
        let w = brush_weight(&hf, 0.6, 7.3, 2.5);
        let volume = modify(&mut hf, 0.6, 7.3, 2.5, 1.5);
        assert!((volume - 1.5 * w).abs() < 1e-4);
        assert!((brush_weight(&hf, 8.0, 8.0, 3.0) - footprint_weight(3.0)).abs() < 1e-5);
    }

    #[test]
    fn test_relax_preserves_volume() {
        let mut hf = HeightField::new(16, 20.0);
        let spike = hf.idx(8, 8);
        hf.land[spike] = 60.0;
        let before = hf.total_land();

        let (net, moved) = relax(&mut hf, 8.0, 8.0, 2.0, 0.5);
        assert!(net.abs() < 1e-3);
        assert!(moved > 0.0);
        assert!(hf.land[spike] < 60.0);
        assert!((hf.total_land() - before).abs() < 1e-3);
    }

    #[test]
    fn test_brush_action_apply() {
        let mut hf = HeightField::new(16, 10.0);
        let action = BrushAction::new(Vec2::new(8.0, 8.0), 2.0, -1.0);
        let volume = action.apply(&mut hf);
        assert!(volume < 0.0);
        assert!((hf.land[hf.idx(8, 8)] - 9.0).abs() < 1e-6);
    }
}
