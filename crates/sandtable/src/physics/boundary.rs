//! Sea boundary: the outer ring of cells behaves like an infinite ocean.
//!
//! Edge cells are pinned to sea level every step. Low edges are flooded up to
//! it and anything standing above it drains off the map.

use crate::heightfield::HeightField;

/// Water exchanged with the sea during one boundary pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SeaExchange {
    /// Volume the sea supplied to low edge cells.
    pub inflow: f64,
    /// Volume that left the map through the edges.
    pub outflow: f64,
}

/// Set every boundary cell's water to `max(0, sea_level - land)`.
pub fn apply_sea_boundary(field: &mut HeightField, sea_level: f32) -> SeaExchange {
    let r = field.resolution;
    let mut exchange = SeaExchange::default();
    if r == 0 {
        return exchange;
    }

    let mut pin = |field: &mut HeightField, x: usize, y: usize| {
        let idx = field.idx(x, y);
        let target = (sea_level - field.land[idx]).max(0.0);
        let diff = (target - field.water[idx]) as f64;
        if diff > 0.0 {
            exchange.inflow += diff;
        } else {
            exchange.outflow -= diff;
        }
        field.water[idx] = target;
    };

    for x in 0..r {
        pin(field, x, 0);
        if r > 1 {
            pin(field, x, r - 1);
        }
    }
    for y in 1..r.saturating_sub(1) {
        pin(field, 0, y);
        if r > 1 {
            pin(field, r - 1, y);
        }
    }

    exchange
}
