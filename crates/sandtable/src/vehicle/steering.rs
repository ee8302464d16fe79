//! Heading control and kinematic integration.

use std::f32::consts::{PI, TAU};

use glam::Vec2;

use super::search::find_dry_cell;
use super::{AiMode, Vehicle};
use crate::config::VehicleParams;
use crate::heightfield::HeightField;

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    a
}

fn is_underwater(vehicle: &Vehicle, field: &HeightField) -> bool {
    match field.cell_at(vehicle.position.x, vehicle.position.y) {
        Some((x, y)) => field.is_wet(x, y),
        None => false,
    }
}

/// Turn toward the desired point, accelerate along the heading and move.
pub(crate) fn steer(vehicle: &mut Vehicle, field: &HeightField, params: &VehicleParams) {
    let underwater = is_underwater(vehicle, field);
    let target = vehicle.active_target();

    // Get out of the water first; without a dry cell in range keep going for
    // the target, and with neither hold the current heading.
    let desired_point = if underwater {
        let rings = params.dry_search_radius.min(field.resolution as i32);
        find_dry_cell(field, vehicle.position, rings).or(target)
    } else {
        target
    };

    if let Some(point) = desired_point {
        let to = point - vehicle.position;
        if to.length_squared() > 1e-8 {
            let desired = to.y.atan2(to.x);
            let error = wrap_angle(desired - vehicle.heading);
            vehicle.heading = wrap_angle(vehicle.heading + error * params.turn_rate);
        }
    }

    let mut accel = match vehicle.mode {
        AiMode::Parked | AiMode::Working => 0.0,
        _ => params.acceleration,
    };
    if underwater {
        accel *= params.water_drag;
    }
    if let Some(t) = target {
        if params.slow_radius > 0.0 {
            accel *= (vehicle.position.distance(t) / params.slow_radius).min(1.0);
        }
    }

    let mut velocity = vehicle.velocity + vehicle.heading_dir() * accel;
    velocity *= params.friction;
    if vehicle.mode == AiMode::Parked {
        velocity *= params.parked_decay;
    }
    let speed = velocity.length();
    if speed > params.max_speed {
        velocity *= params.max_speed / speed;
    }

    let (position, velocity) = reflect_at_bounds(vehicle.position + velocity, velocity, field.resolution);
    vehicle.position = position;
    vehicle.velocity = velocity;
}

/// Mirror a position that left the grid back inside and flip the offending
/// velocity component. Positions stay within `[0, R-1]`.
fn reflect_at_bounds(mut p: Vec2, mut v: Vec2, resolution: usize) -> (Vec2, Vec2) {
    let max = resolution.saturating_sub(1) as f32;

    if p.x < 0.0 {
        p.x = -p.x;
        v.x = -v.x;
    } else if p.x > max {
        p.x = 2.0 * max - p.x;
        v.x = -v.x;
    }
    if p.y < 0.0 {
        p.y = -p.y;
        v.y = -v.y;
    } else if p.y > max {
        p.y = 2.0 * max - p.y;
        v.y = -v.y;
    }

    // A very large step can overshoot the mirror too.
    p.x = if p.x.is_finite() { p.x.clamp(0.0, max) } else { 0.0 };
    p.y = if p.y.is_finite() { p.y.clamp(0.0, max) } else { 0.0 };
    (p, v)
}
