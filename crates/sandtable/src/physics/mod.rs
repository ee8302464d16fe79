//! Per-tick terrain physics: slumping, water flow, erosion and the sea boundary.
//!
//! One pass visits interior cells in row-major order and, for each of the four
//! axis neighbours, accumulates transfers into delta buffers. Deltas are only
//! applied once the pass is done, so the visiting order never sees its own
//! writes. Every transfer debits one cell and credits another by the same
//! amount; volume is only created or destroyed by clamping and by the sea
//! boundary, which both feeds and drains the edge ring.

mod boundary;
mod slump;
mod water_flow;

pub use boundary::{apply_sea_boundary, SeaExchange};
pub use slump::slump_transfer;
pub use water_flow::{erosion_transfer, flow_transfer};

use crate::config::PhysicsParams;
use crate::heightfield::HeightField;

const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// What one physics step did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Cells reset because they held non-finite values.
    pub sanitized: usize,
    /// Water supplied by the sea boundary.
    pub sea_inflow: f64,
    /// Water drained off the map by the sea boundary.
    pub sea_outflow: f64,
    /// Land moved by slumping.
    pub slumped: f64,
    /// Water moved between cells.
    pub water_moved: f64,
    /// Land carried by flowing water.
    pub eroded: f64,
}

/// Owns the physics constants and the reusable delta buffers.
pub struct PhysicsStepper {
    pub params: PhysicsParams,
    land_delta: Vec<f32>,
    water_delta: Vec<f32>,
}

impl PhysicsStepper {
    pub fn new(params: PhysicsParams) -> Self {
        Self {
            params,
            land_delta: Vec::new(),
            water_delta: Vec::new(),
        }
    }

    /// Land deltas from the last `compute_deltas` call.
    pub fn land_delta(&self) -> &[f32] {
        &self.land_delta
    }

    /// Water deltas from the last `compute_deltas` call.
    pub fn water_delta(&self) -> &[f32] {
        &self.water_delta
    }

    /// Accumulate this tick's transfers without touching the field.
    ///
    /// Boundary cells receive but never give. Each source cell tracks how much
    /// land and water it has left to hand out, so no cell can go negative.
    pub fn compute_deltas(&mut self, field: &HeightField) -> StepStats {
        let n = field.cell_count();
        self.land_delta.clear();
        self.land_delta.resize(n, 0.0);
        self.water_delta.clear();
        self.water_delta.resize(n, 0.0);

        let mut stats = StepStats::default();
        let r = field.resolution;
        if r < 3 {
            return stats;
        }
        let params = &self.params;

        for y in 1..r - 1 {
            for x in 1..r - 1 {
                let idx = field.idx(x, y);
                let land = field.land[idx];
                let surface = land + field.water[idx];
                if !surface.is_finite() {
                    continue;
                }
                let mut land_left = land;
                let mut water_left = field.water[idx];

                for &(dx, dy) in NEIGHBORS.iter() {
                    let nidx = field.idx((x as i32 + dx) as usize, (y as i32 + dy) as usize);

                    // Slump
                    let slide = slump_transfer(land, field.land[nidx], params).min(land_left);
                    if slide > 0.0 {
                        land_left -= slide;
                        self.land_delta[idx] -= slide;
                        self.land_delta[nidx] += slide;
                        stats.slumped += slide as f64;
                    }

                    // Flow
                    let n_surface = field.land[nidx] + field.water[nidx];
                    if !n_surface.is_finite() {
                        continue;
                    }
                    let flow = flow_transfer(surface, n_surface, water_left, params);
                    if flow <= 0.0 {
                        continue;
                    }
                    water_left -= flow;
                    self.water_delta[idx] -= flow;
                    self.water_delta[nidx] += flow;
                    stats.water_moved += flow as f64;

                    // Erosion rides on strong flows
                    let carried = erosion_transfer(flow, land_left, params);
                    if carried > 0.0 {
                        land_left -= carried;
                        self.land_delta[idx] -= carried;
                        self.land_delta[nidx] += carried;
                        stats.eroded += carried as f64;
                    }
                }
            }
        }

        stats
    }

    /// Advance the field by one tick.
    pub fn step(&mut self, field: &mut HeightField, sea_level: f32) -> StepStats {
        let mut stats = self.compute_deltas(field);

        for (l, d) in field.land.iter_mut().zip(&self.land_delta) {
            *l += d;
        }
        for (w, d) in field.water.iter_mut().zip(&self.water_delta) {
            *w += d;
        }

        stats.sanitized = field.sanitize();
        if stats.sanitized > 0 {
            log::warn!("physics: reset {} non-finite cells", stats.sanitized);
        }

        let exchange = apply_sea_boundary(field, sea_level);
        stats.sea_inflow = exchange.inflow;
        stats.sea_outflow = exchange.outflow;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_dry_field_has_no_deltas() {
        let hf = HeightField::new(8, 40.0);
        let mut stepper = PhysicsStepper::new(PhysicsParams::default());
        let stats = stepper.compute_deltas(&hf);

        assert!(stepper.land_delta().iter().all(|&d| d == 0.0));
        assert!(stepper.water_delta().iter().all(|&d| d == 0.0));
        assert_eq!(stats.slumped, 0.0);
    }

    #[test]
    fn test_spike_slumps_to_neighbours() {
        let mut hf = HeightField::new(5, 10.0);
        let c = hf.idx(2, 2);
        hf.land[c] = 60.0;
        let before = hf.total_land();

        let mut stepper = PhysicsStepper::new(PhysicsParams::default());
        stepper.step(&mut hf, 0.0);

        assert!(hf.land[c] < 60.0);
        assert!(hf.land[hf.idx(3, 2)] > 10.0);
        assert!((hf.total_land() - before).abs() < 1e-3);
    }

    #[test]
    fn test_water_never_overdrawn() {
        // Shallow puddle on a high cell next to four deep holes
        let mut hf = HeightField::new(5, 0.0);
        let c = hf.idx(2, 2);
        hf.land[c] = 100.0;
        hf.water[c] = 0.4;

        let mut stepper = PhysicsStepper::new(PhysicsParams {
            talus: 1000.0,
            ..Default::default()
        });
        stepper.compute_deltas(&hf);
        assert!((stepper.water_delta()[c] + 0.4).abs() < 1e-6);

        stepper.step(&mut hf, 0.0);
        assert!(hf.water.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_boundary_cells_never_source() {
        let mut hf = HeightField::new(4, 0.0);
        let edge = hf.idx(0, 1);
        hf.land[edge] = 200.0;
        hf.water[edge] = 50.0;

        let mut stepper = PhysicsStepper::new(PhysicsParams::default());
        stepper.compute_deltas(&hf);
        assert_eq!(stepper.land_delta()[edge], 0.0);
        assert_eq!(stepper.water_delta()[edge], 0.0);
    }

    #[test]
    fn test_step_sanitizes_and_reports() {
        let mut hf = HeightField::new(4, 10.0);
        hf.water[5] = f32::NAN;
        let mut stepper = PhysicsStepper::new(PhysicsParams::default());
        let stats = stepper.step(&mut hf, 0.0);

        assert!(stats.sanitized >= 1);
        assert!(hf.water.iter().all(|w| w.is_finite() && *w >= 0.0));
    }

    #[test]
    fn test_sea_floods_low_boundary() {
        let mut hf = HeightField::new(6, 20.0);
        let mut stepper = PhysicsStepper::new(PhysicsParams::default());
        let stats = stepper.step(&mut hf, 55.0);
        assert!(stats.sea_inflow > 0.0);
        assert!((hf.composite_at(0, 3) - 55.0).abs() < 1e-5);
    }

    #[test]
    fn test_flooded_field_drains_through_edges() {
        let mut hf = HeightField::new(6, 0.0);
        hf.water.iter_mut().for_each(|w| *w = 100.0);
        let mut stepper = PhysicsStepper::new(PhysicsParams::default());
        let stats = stepper.step(&mut hf, 55.0);
        assert!(stats.sea_outflow > 0.0);
        assert_eq!(stats.sea_inflow, 0.0);
        assert!((hf.composite_at(0, 0) - 55.0).abs() < 1e-5);
    }
}
