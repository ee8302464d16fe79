//! Bounded random site searches and the dry-land ring search.
//!
//! Site searches throw a fixed number of random samples into a disc around the
//! vehicle and keep the best one. Returning `None` is normal; the caller
//! simply tries again next tick.

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::{BaseArea, VehicleParams};
use crate::heightfield::HeightField;

const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Uniform random point inside a disc.
pub fn random_point_in_disc(rng: &mut ChaCha8Rng, center: Vec2, radius: f32) -> Vec2 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let dist = radius.max(0.0) * rng.gen::<f32>().sqrt();
    center + Vec2::new(angle.cos(), angle.sin()) * dist
}

/// Random parking spot, kept away from the rim of the base.
pub fn random_parking_spot(rng: &mut ChaCha8Rng, base: &BaseArea) -> Vec2 {
    random_point_in_disc(rng, base.center, base.radius * 0.8)
}

fn sample_cell(field: &HeightField, rng: &mut ChaCha8Rng, origin: Vec2, radius: f32) -> Option<(usize, usize)> {
    let p = random_point_in_disc(rng, origin, radius);
    field.cell_at(p.x, p.y)
}

fn cell_pos(x: usize, y: usize) -> Vec2 {
    Vec2::new(x as f32, y as f32)
}

/// Highest dry land above sea level: where an excavator digs.
pub fn find_dig_site(
    field: &HeightField,
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    params: &VehicleParams,
    sea_level: f32,
) -> Option<Vec2> {
    let mut best: Option<((usize, usize), f32)> = None;
    for _ in 0..params.search_samples {
        let Some((x, y)) = sample_cell(field, rng, origin, params.search_radius) else {
            continue;
        };
        if field.is_wet(x, y) {
            continue;
        }
        let h = field.land[field.idx(x, y)];
        if h <= sea_level {
            continue;
        }
        if best.map_or(true, |(_, bh)| h > bh) {
            best = Some(((x, y), h));
        }
    }
    best.map(|((x, y), _)| cell_pos(x, y))
}

/// Lowest land below sea level: where an excavator dumps.
pub fn find_dump_site(
    field: &HeightField,
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    params: &VehicleParams,
    sea_level: f32,
) -> Option<Vec2> {
    let mut best: Option<((usize, usize), f32)> = None;
    for _ in 0..params.search_samples {
        let Some((x, y)) = sample_cell(field, rng, origin, params.search_radius) else {
            continue;
        };
        let h = field.land[field.idx(x, y)];
        if h >= sea_level {
            continue;
        }
        if best.map_or(true, |(_, bh)| h < bh) {
            best = Some(((x, y), h));
        }
    }
    best.map(|((x, y), _)| cell_pos(x, y))
}

/// Largest land drop from `(x, y)` to one of its axis neighbours.
/// Returns the drop and the lower neighbour.
pub fn steepest_drop(field: &HeightField, x: usize, y: usize) -> Option<(f32, (usize, usize))> {
    let h = field.land[field.idx(x, y)];
    let mut best: Option<(f32, (usize, usize))> = None;
    for &(dx, dy) in NEIGHBORS.iter() {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if !field.in_bounds(nx, ny) {
            continue;
        }
        let (nx, ny) = (nx as usize, ny as usize);
        let drop = h - field.land[field.idx(nx, ny)];
        if drop > 0.0 && best.map_or(true, |(d, _)| drop > d) {
            best = Some((drop, (nx, ny)));
        }
    }
    best
}

/// Steepest dry slope above the minimum gradient, as (high, low) cells:
/// where a bulldozer pushes.
pub fn find_push_site(
    field: &HeightField,
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    params: &VehicleParams,
) -> Option<(Vec2, Vec2)> {
    let mut best: Option<(f32, (usize, usize), (usize, usize))> = None;
    for _ in 0..params.search_samples {
        let Some((x, y)) = sample_cell(field, rng, origin, params.search_radius) else {
            continue;
        };
        if field.is_wet(x, y) {
            continue;
        }
        let Some((drop, low)) = steepest_drop(field, x, y) else {
            continue;
        };
        if drop < params.bulldozer.min_gradient {
            continue;
        }
        if best.map_or(true, |(d, _, _)| drop > d) {
            best = Some((drop, (x, y), low));
        }
    }
    best.map(|(_, (hx, hy), (lx, ly))| (cell_pos(hx, hy), cell_pos(lx, ly)))
}

/// Height of a cell's land above the mean of its in-grid axis neighbours
/// (negative in a dip).
pub fn relief(field: &HeightField, x: usize, y: usize) -> f32 {
    let mut sum = 0.0;
    let mut count = 0;
    for &(dx, dy) in NEIGHBORS.iter() {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if field.in_bounds(nx, ny) {
            sum += field.land[field.idx(nx as usize, ny as usize)];
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    field.land[field.idx(x, y)] - sum / count as f32
}

/// Distance of a cell's land from the mean of its in-grid axis neighbours.
pub fn roughness(field: &HeightField, x: usize, y: usize) -> f32 {
    relief(field, x, y).abs()
}

/// Roughest dry cell above the minimum roughness: where a compactor rolls.
pub fn find_rough_site(
    field: &HeightField,
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    params: &VehicleParams,
) -> Option<Vec2> {
    let mut best: Option<((usize, usize), f32)> = None;
    for _ in 0..params.search_samples {
        let Some((x, y)) = sample_cell(field, rng, origin, params.search_radius) else {
            continue;
        };
        if field.is_wet(x, y) {
            continue;
        }
        let r = roughness(field, x, y);
        if r < params.compactor.min_roughness {
            continue;
        }
        if best.map_or(true, |(_, br)| r > br) {
            best = Some(((x, y), r));
        }
    }
    best.map(|((x, y), _)| cell_pos(x, y))
}

/// Tallest dry mound above sea level: where a dump truck loads.
pub fn find_pile_site(
    field: &HeightField,
    rng: &mut ChaCha8Rng,
    origin: Vec2,
    params: &VehicleParams,
    sea_level: f32,
) -> Option<Vec2> {
    let mut best: Option<((usize, usize), f32)> = None;
    for _ in 0..params.search_samples {
        let Some((x, y)) = sample_cell(field, rng, origin, params.search_radius) else {
            continue;
        };
        if field.is_wet(x, y) || field.land[field.idx(x, y)] <= sea_level {
            continue;
        }
        let rise = relief(field, x, y);
        if rise < params.dump_truck.min_pile_height {
            continue;
        }
        if best.map_or(true, |(_, br)| rise > br) {
            best = Some(((x, y), rise));
        }
    }
    best.map(|((x, y), _)| cell_pos(x, y))
}

/// Nearest dry cell to `from`, searching square rings outwards.
pub fn find_dry_cell(field: &HeightField, from: Vec2, max_radius: i32) -> Option<Vec2> {
    let cx = from.x.round() as i32;
    let cy = from.y.round() as i32;

    for ring in 1..=max_radius.max(0) {
        let mut best: Option<(f32, Vec2)> = None;
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs() != ring && dy.abs() != ring {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if !field.in_bounds(x, y) || field.is_wet(x as usize, y as usize) {
                    continue;
                }
                let p = Vec2::new(x as f32, y as f32);
                let d = p.distance_squared(from);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, p));
                }
            }
        }
        if let Some((_, p)) = best {
            return Some(p);
        }
    }
    None
}
