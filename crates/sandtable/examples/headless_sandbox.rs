//! Headless Sandbox Demo
//!
//! Runs the full simulation without a renderer: generates terrain, sends the
//! fleet to work, digs a couple of holes the way a user would, then recalls
//! the fleet and waits for it to park. Prints a summary line every 100 ticks.
//!
//! An optional first argument names a JSON config file; otherwise defaults
//! are used.
//!
//! Run: RUST_LOG=info cargo run --example headless_sandbox --release [config.json]

use std::path::Path;

use sandtable::{AiMode, FleetMode, SimConfig, SimError, Simulation, Vec2};

const WORK_TICKS: u64 = 1500;
const RECALL_TICKS: u64 = 1500;

fn main() -> Result<(), SimError> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::load_json(Path::new(&path))?,
        None => SimConfig::default(),
    };
    let mut sim = Simulation::new(config)?;
    let r = sim.config().resolution as f32;

    sim.set_fleet_mode(FleetMode::Work);
    sim.set_mission_active(true);
    sim.queue_brush(Vec2::new(r * 0.3, r * 0.3), r * 0.05, -3.0);
    sim.queue_brush(Vec2::new(r * 0.7, r * 0.6), r * 0.08, 4.0);

    let mut volume = 0.0;
    let mut moved = 0.0;
    for _ in 0..WORK_TICKS {
        let report = sim.tick();
        volume += report.volume_changed();
        moved += report.material_moved;
        if report.tick % 100 == 0 {
            print_summary(&sim, volume, moved);
        }
    }

    log::info!("recalling fleet");
    sim.set_fleet_mode(FleetMode::Idle);
    for _ in 0..RECALL_TICKS {
        sim.tick();
        if sim.vehicles().iter().all(|v| v.mode == AiMode::Parked) {
            break;
        }
    }
    print_summary(&sim, volume, moved);

    let states = sim.vehicle_draw_states();
    match serde_json::to_string_pretty(&states) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("failed to serialize vehicle states: {e}"),
    }
    Ok(())
}

fn print_summary(sim: &Simulation, volume: f32, moved: f32) {
    let field = sim.field();
    let (lo, hi) = field.land_range();
    let parked = sim.fleet().parked_count();
    println!(
        "tick {:5} | land {:7.1}..{:7.1} | water {:10.1} | edits {:+9.1} | moved {:9.1} | parked {}/{}",
        sim.tick_count(),
        lo,
        hi,
        field.total_water(),
        volume,
        moved,
        parked,
        sim.vehicles().len()
    );
}
