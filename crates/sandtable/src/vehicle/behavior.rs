//! State transitions and per-kind work.
//!
//! The state machine is shared; each kind plugs in its own site search and
//! its own `Working` action through the `match` arms below.

use rand_chacha::ChaCha8Rng;

use super::search::{
    find_dig_site, find_dump_site, find_pile_site, find_push_site, find_rough_site,
    random_parking_spot, relief, roughness, steepest_drop,
};
use super::{AiMode, Vehicle, VehicleContext, VehicleKind, VehicleReport};
use crate::constants::PAYLOAD_EPSILON;
use crate::editor::{brush_weight, modify, relax};
use crate::heightfield::HeightField;

/// Fleet-level overrides, applied before anything else.
pub(super) fn apply_directive(v: &mut Vehicle, rng: &mut ChaCha8Rng, ctx: &VehicleContext<'_>) {
    if ctx.operating {
        if matches!(v.mode, AiMode::Parked | AiMode::ReturningToBase) {
            v.set_mode(AiMode::Idle);
        }
        if v.mode == AiMode::Idle {
            clear_targets(v);
            v.set_mode(AiMode::SeekingWorkSite);
        }
        return;
    }

    if v.mode.is_operating() {
        clear_targets(v);
        v.parking_spot = random_parking_spot(rng, &ctx.base);
        v.set_mode(AiMode::ReturningToBase);
    }
    if v.mode == AiMode::ReturningToBase
        && v.position.distance(v.parking_spot) <= ctx.params.arrive_radius
    {
        v.set_mode(AiMode::Parked);
    }
}

/// Mode-specific behaviour for one tick.
pub(super) fn think(
    v: &mut Vehicle,
    field: &mut HeightField,
    rng: &mut ChaCha8Rng,
    ctx: &VehicleContext<'_>,
) -> VehicleReport {
    match v.mode {
        AiMode::SeekingWorkSite => {
            seek(v, field, rng, ctx);
            VehicleReport::default()
        }
        AiMode::MovingToWorkSite => {
            move_to_work_site(v, ctx);
            VehicleReport::default()
        }
        AiMode::Working => {
            let report = match v.kind {
                VehicleKind::Excavator => dig(v, field, ctx),
                VehicleKind::Bulldozer => push(v, field, ctx),
                VehicleKind::Compactor => compact(v, field, ctx),
                VehicleKind::DumpTruck => load(v, field, ctx),
            };
            if v.mode == AiMode::Working {
                v.task_cooldown = v.task_cooldown.saturating_sub(1);
                if v.task_cooldown == 0 {
                    finish_task(v);
                }
            }
            report
        }
        AiMode::MovingToDumpSite => {
            move_to_dump_site(v, field, rng, ctx);
            VehicleReport::default()
        }
        AiMode::Dumping => dump(v, field, ctx),
        AiMode::Idle | AiMode::ReturningToBase | AiMode::Parked => VehicleReport::default(),
    }
}

fn clear_targets(v: &mut Vehicle) {
    v.primary_target = None;
    v.secondary_target = None;
}

/// Cell the current task is about: the work site, or where the vehicle stands.
fn site_cell(v: &Vehicle, field: &HeightField) -> Option<(usize, usize)> {
    let p = v.primary_target.unwrap_or(v.position);
    field.cell_at(p.x, p.y)
}

fn finish_task(v: &mut Vehicle) {
    clear_targets(v);
    v.task_cooldown = 0;
    v.set_mode(AiMode::SeekingWorkSite);
}

fn begin_dump(v: &mut Vehicle, ctx: &VehicleContext<'_>) {
    v.primary_target = None;
    v.secondary_target = None;
    v.search_timeout = ctx.params.search_timeout_ticks;
    v.set_mode(AiMode::MovingToDumpSite);
}

fn seek(v: &mut Vehicle, field: &HeightField, rng: &mut ChaCha8Rng, ctx: &VehicleContext<'_>) {
    let params = ctx.params;
    if let Some(haul) = params.haul(v.kind) {
        if v.payload >= haul.payload_capacity {
            begin_dump(v, ctx);
            return;
        }
    }
    let found = match v.kind {
        VehicleKind::Excavator => {
            find_dig_site(field, rng, v.position, params, ctx.sea_level).map(|site| (site, None))
        }
        VehicleKind::DumpTruck => {
            find_pile_site(field, rng, v.position, params, ctx.sea_level).map(|site| (site, None))
        }
        VehicleKind::Bulldozer => {
            find_push_site(field, rng, v.position, params).map(|(high, low)| (high, Some(low)))
        }
        VehicleKind::Compactor => find_rough_site(field, rng, v.position, params).map(|site| (site, None)),
    };

    // Nothing this tick; try again next tick.
    let Some((primary, secondary)) = found else {
        return;
    };
    v.primary_target = Some(primary);
    v.secondary_target = secondary;
    v.search_timeout = params.search_timeout_ticks;
    v.set_mode(AiMode::MovingToWorkSite);
}

fn move_to_work_site(v: &mut Vehicle, ctx: &VehicleContext<'_>) {
    let Some(target) = v.primary_target else {
        finish_task(v);
        return;
    };
    if v.position.distance(target) <= ctx.params.arrive_radius {
        v.task_cooldown = ctx.params.task_ticks.max(1);
        v.set_mode(AiMode::Working);
        return;
    }
    v.search_timeout = v.search_timeout.saturating_sub(1);
    if v.search_timeout == 0 {
        log::debug!("vehicle {}: gave up on work site", v.id);
        finish_task(v);
    }
}

fn move_to_dump_site(
    v: &mut Vehicle,
    field: &HeightField,
    rng: &mut ChaCha8Rng,
    ctx: &VehicleContext<'_>,
) {
    let Some(target) = v.secondary_target else {
        if let Some(site) = find_dump_site(field, rng, v.position, ctx.params, ctx.sea_level) {
            v.secondary_target = Some(site);
            v.search_timeout = ctx.params.search_timeout_ticks;
        }
        return;
    };

    // Reaching the water's edge is as close as a dump site below sea level
    // can usually be approached.
    let at_shore = field
        .cell_at(v.position.x, v.position.y)
        .is_some_and(|(x, y)| field.is_wet(x, y));
    if at_shore || v.position.distance(target) <= ctx.params.arrive_radius {
        v.set_mode(AiMode::Dumping);
        return;
    }

    v.search_timeout = v.search_timeout.saturating_sub(1);
    if v.search_timeout == 0 {
        log::debug!("vehicle {}: gave up on dump site", v.id);
        finish_task(v);
    }
}

fn dig(v: &mut Vehicle, field: &mut HeightField, ctx: &VehicleContext<'_>) -> VehicleReport {
    let p = &ctx.params.excavator;
    if field.land_at(v.position.x, v.position.y) <= ctx.sea_level {
        finish_task(v);
        return VehicleReport::default();
    }

    let removed = -modify(field, v.position.x, v.position.y, p.dig_radius, -p.dig_rate);
    v.payload += removed;

    if removed <= PAYLOAD_EPSILON {
        finish_task(v);
    } else if v.payload >= p.payload_capacity {
        begin_dump(v, ctx);
    }

    VehicleReport {
        volume_changed: -removed,
        material_moved: removed,
    }
}

fn load(v: &mut Vehicle, field: &mut HeightField, ctx: &VehicleContext<'_>) -> VehicleReport {
    let p = &ctx.params.dump_truck;
    let levelled = match site_cell(v, field) {
        Some((x, y)) => relief(field, x, y) < p.min_pile_height,
        None => true,
    };
    if levelled || field.land_at(v.position.x, v.position.y) <= ctx.sea_level {
        // Haul whatever was loaded before the pile ran out.
        if v.payload > PAYLOAD_EPSILON {
            begin_dump(v, ctx);
        } else {
            finish_task(v);
        }
        return VehicleReport::default();
    }

    let room = (p.payload_capacity - v.payload).max(0.0);
    let weight = brush_weight(field, v.position.x, v.position.y, p.load_radius);
    if weight <= 0.0 {
        finish_task(v);
        return VehicleReport::default();
    }
    let strength = p.load_rate.min(room / weight);
    let removed = -modify(field, v.position.x, v.position.y, p.load_radius, -strength);
    v.payload += removed;

    if v.payload >= p.payload_capacity - PAYLOAD_EPSILON {
        begin_dump(v, ctx);
    } else if removed <= PAYLOAD_EPSILON {
        finish_task(v);
    }

    VehicleReport {
        volume_changed: -removed,
        material_moved: removed,
    }
}

fn dump(v: &mut Vehicle, field: &mut HeightField, ctx: &VehicleContext<'_>) -> VehicleReport {
    let Some(p) = ctx.params.haul(v.kind) else {
        finish_task(v);
        return VehicleReport::default();
    };
    let weight = brush_weight(field, v.position.x, v.position.y, p.dump_radius);
    if v.payload <= PAYLOAD_EPSILON || weight <= 0.0 {
        v.payload = v.payload.max(0.0);
        finish_task(v);
        return VehicleReport::default();
    }

    // Never drop more than is in the bucket.
    let strength = p.dump_rate.min(v.payload / weight);
    let added = modify(field, v.position.x, v.position.y, p.dump_radius, strength).max(0.0);
    v.payload = (v.payload - added).max(0.0);

    if v.payload <= PAYLOAD_EPSILON {
        v.payload = 0.0;
        finish_task(v);
    } else if added <= PAYLOAD_EPSILON {
        // Site is full; find another one.
        begin_dump(v, ctx);
    }

    VehicleReport {
        volume_changed: added,
        material_moved: added,
    }
}

fn push(v: &mut Vehicle, field: &mut HeightField, ctx: &VehicleContext<'_>) -> VehicleReport {
    let p = &ctx.params.bulldozer;
    let flat = match site_cell(v, field) {
        Some((x, y)) => steepest_drop(field, x, y).map_or(true, |(drop, _)| drop < p.min_gradient),
        None => true,
    };
    if flat {
        finish_task(v);
        return VehicleReport::default();
    }

    let removed = -modify(field, v.position.x, v.position.y, p.blade_radius, -p.push_rate);
    if removed <= PAYLOAD_EPSILON {
        finish_task(v);
        return VehicleReport::default();
    }

    let ahead = v.position + v.heading_dir() * p.push_distance;
    let weight = brush_weight(field, ahead.x, ahead.y, p.blade_radius);
    let mut added = if weight > 0.0 {
        modify(field, ahead.x, ahead.y, p.blade_radius, removed / weight)
    } else {
        0.0
    };

    // Whatever the blade could not place ahead goes back where it came from.
    let leftover = removed - added;
    if leftover > PAYLOAD_EPSILON {
        let back = brush_weight(field, v.position.x, v.position.y, p.blade_radius);
        added += modify(field, v.position.x, v.position.y, p.blade_radius, leftover / back);
    }

    VehicleReport {
        volume_changed: added - removed,
        material_moved: removed,
    }
}

fn compact(v: &mut Vehicle, field: &mut HeightField, ctx: &VehicleContext<'_>) -> VehicleReport {
    let p = &ctx.params.compactor;
    let smooth = match site_cell(v, field) {
        Some((x, y)) => roughness(field, x, y) < p.min_roughness,
        None => true,
    };
    if smooth {
        finish_task(v);
        return VehicleReport::default();
    }

    let (net, moved) = relax(field, v.position.x, v.position.y, p.roller_radius, p.smoothing);
    VehicleReport {
        volume_changed: net,
        material_moved: moved,
    }
}
