//! The simulation loop: one owner for the height field, physics and fleet.
//!
//! Each `tick` runs, in order:
//! 1. Physics step (slump, flow, erosion, sea boundary)
//! 2. External height override, if one was supplied
//! 3. Queued brush edits
//! 4. Vehicle updates
//! 5. Composite publication

use glam::Vec2;

use crate::config::{FleetComposition, SimConfig};
use crate::constants::{MAX_LAND, MIN_LAND};
use crate::editor::BrushAction;
use crate::error::SimError;
use crate::fleet::{Fleet, FleetMode};
use crate::heightfield::HeightField;
use crate::physics::{PhysicsStepper, StepStats};
use crate::terrain_generator::{generate_seeded, TerrainType};
use crate::vehicle::{Vehicle, VehicleDrawState};

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub physics: StepStats,
    /// Net volume changed by queued brush edits.
    pub brush_volume: f32,
    /// Net volume changed by vehicles.
    pub vehicle_volume: f32,
    /// Material dug, dumped, pushed or rolled by vehicles.
    pub material_moved: f32,
    pub override_applied: bool,
}

impl TickReport {
    /// Total land volume changed by edits this tick (the mission signal).
    pub fn volume_changed(&self) -> f32 {
        self.brush_volume + self.vehicle_volume
    }
}

pub struct Simulation {
    config: SimConfig,
    field: HeightField,
    physics: PhysicsStepper,
    fleet: Fleet,
    pending_brushes: Vec<BrushAction>,
    height_override: Option<Vec<f32>>,
    composite: Vec<f32>,
    tick: u64,
}

impl Simulation {
    /// Build a simulation from a validated config and generate its terrain.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        let land = generate_seeded(config.terrain, config.resolution, config.seed);
        let field = HeightField::from_land(config.resolution, land)?;
        let mut fleet = Fleet::new(config.seed, config.base_area());
        fleet.respawn(config.initial_fleet, config.resolution);

        log::info!(
            "sandtable: {} terrain, {}x{}, seed {}, sea level {}",
            config.terrain,
            config.resolution,
            config.resolution,
            config.seed,
            config.sea_level
        );

        let mut sim = Self {
            physics: PhysicsStepper::new(config.physics.clone()),
            config,
            field,
            fleet,
            pending_brushes: Vec::new(),
            height_override: None,
            composite: Vec::new(),
            tick: 0,
        };
        sim.publish();
        Ok(sim)
    }

    /// Wrap an existing height field (tests and tools).
    pub fn with_field(config: SimConfig, field: HeightField) -> Result<Self, SimError> {
        let config = SimConfig {
            resolution: field.resolution,
            ..config
        };
        config.validate()?;

        let mut fleet = Fleet::new(config.seed, config.base_area());
        fleet.respawn(config.initial_fleet, config.resolution);

        let mut sim = Self {
            physics: PhysicsStepper::new(config.physics.clone()),
            config,
            field,
            fleet,
            pending_brushes: Vec::new(),
            height_override: None,
            composite: Vec::new(),
            tick: 0,
        };
        sim.field.sanitize();
        sim.publish();
        Ok(sim)
    }

    /// Replace the terrain wholesale and respawn the fleet.
    /// Pending edits and overrides are dropped.
    pub fn regenerate(&mut self, terrain: TerrainType, resolution: usize, seed: u64) -> Result<(), SimError> {
        let config = SimConfig {
            terrain,
            resolution,
            seed,
            ..self.config.clone()
        };
        config.validate()?;

        let land = generate_seeded(terrain, resolution, seed);
        self.field = HeightField::from_land(resolution, land)?;
        self.pending_brushes.clear();
        self.height_override = None;

        let composition = self.fleet.composition();
        let (mode, mission) = (self.fleet.mode, self.fleet.mission_active);
        self.fleet = Fleet::new(seed, config.base_area());
        self.fleet.mode = mode;
        self.fleet.mission_active = mission;
        self.fleet.respawn(composition, resolution);

        self.config = config;
        self.publish();
        log::info!("sandtable: regenerated {terrain} terrain {resolution}x{resolution}, seed {seed}");
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn field(&self) -> &HeightField {
        &self.field
    }

    /// Direct access for tools that edit the field outside of a tick.
    pub fn field_mut(&mut self) -> &mut HeightField {
        &mut self.field
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        self.fleet.vehicles()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn sea_level(&self) -> f32 {
        self.config.sea_level
    }

    pub fn set_sea_level(&mut self, sea_level: f32) -> Result<(), SimError> {
        if !sea_level.is_finite() || !(MIN_LAND..=MAX_LAND).contains(&sea_level) {
            return Err(SimError::InvalidConfig("sea_level must lie within the land range"));
        }
        self.config.sea_level = sea_level;
        Ok(())
    }

    /// Queue a brush edit for the next tick.
    pub fn queue_brush(&mut self, center: Vec2, radius: f32, strength: f32) {
        self.pending_brushes.push(BrushAction::new(center, radius, strength));
    }

    pub fn pending_brushes(&self) -> usize {
        self.pending_brushes.len()
    }

    /// Supply land heights from an external source (depth camera). Applied
    /// once, on the next tick, after physics.
    pub fn set_height_override(&mut self, land: Vec<f32>) -> Result<(), SimError> {
        let expected = self.field.cell_count();
        if land.len() != expected {
            log::warn!(
                "rejecting height override: {} cells, expected {}",
                land.len(),
                expected
            );
            return Err(SimError::OverrideSize {
                expected,
                actual: land.len(),
            });
        }
        self.height_override = Some(land);
        Ok(())
    }

    pub fn clear_height_override(&mut self) {
        self.height_override = None;
    }

    pub fn set_fleet_composition(&mut self, composition: FleetComposition) {
        self.fleet.set_composition(composition, self.field.resolution);
    }

    pub fn set_fleet_mode(&mut self, mode: FleetMode) {
        if self.fleet.mode != mode {
            log::info!("fleet mode: {mode:?}");
        }
        self.fleet.mode = mode;
    }

    pub fn set_mission_active(&mut self, active: bool) {
        self.fleet.mission_active = active;
    }

    /// Advance the whole simulation by one frame.
    pub fn tick(&mut self) -> TickReport {
        let sea_level = self.config.sea_level;
        let mut report = TickReport {
            tick: self.tick,
            ..Default::default()
        };

        report.physics = self.physics.step(&mut self.field, sea_level);

        if let Some(land) = self.height_override.take() {
            self.field.replace_land(&land);
            report.override_applied = true;
        }

        for brush in self.pending_brushes.drain(..) {
            report.brush_volume += brush.apply(&mut self.field);
        }

        let vehicles = self.fleet.update(&mut self.field, &self.config.vehicles, sea_level);
        report.vehicle_volume = vehicles.volume_changed;
        report.material_moved = vehicles.material_moved;

        self.publish();
        self.tick += 1;
        report
    }

    fn publish(&mut self) {
        self.field.write_composite(&mut self.composite);
    }

    /// `land + water` for every cell, as of the last tick.
    pub fn composite(&self) -> &[f32] {
        &self.composite
    }

    /// Composite as raw bytes for texture upload.
    pub fn composite_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.composite)
    }

    pub fn vehicle_draw_states(&self) -> Vec<VehicleDrawState> {
        self.fleet.draw_states(&self.config.vehicles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            resolution: 32,
            initial_fleet: FleetComposition::default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_publishes_composite() {
        let sim = Simulation::new(small_config()).unwrap();
        assert_eq!(sim.composite().len(), 32 * 32);
        assert_eq!(sim.composite_bytes().len(), 32 * 32 * 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimConfig {
            resolution: 1,
            ..small_config()
        };
        assert!(matches!(Simulation::new(config), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_override_size_checked() {
        let mut sim = Simulation::new(small_config()).unwrap();
        let err = sim.set_height_override(vec![0.0; 10]).unwrap_err();
        assert!(matches!(
            err,
            SimError::OverrideSize {
                expected: 1024,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_override_applied_once() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.set_height_override(vec![300.0; 32 * 32]).unwrap();
        let report = sim.tick();
        assert!(report.override_applied);
        assert!(sim.field().land.iter().all(|&l| l == MAX_LAND));
        assert!(!sim.tick().override_applied);
    }

    #[test]
    fn test_brushes_drained_each_tick() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.queue_brush(Vec2::new(16.0, 16.0), 3.0, 5.0);
        assert_eq!(sim.pending_brushes(), 1);
        let report = sim.tick();
        assert!(report.brush_volume > 0.0);
        assert_eq!(sim.pending_brushes(), 0);
    }

    #[test]
    fn test_degenerate_brushes_do_not_stall_tick() {
        let mut sim = Simulation::new(small_config()).unwrap();
        sim.queue_brush(Vec2::new(16.0, 16.0), f32::INFINITY, 5.0);
        sim.queue_brush(Vec2::new(16.0, 16.0), 1.0e6, -1.0);
        sim.queue_brush(Vec2::new(f32::NAN, 3.0), 2.0, 1.0);
        let report = sim.tick();
        // Only the huge finite brush lands, lowering every cell by about 1
        assert!(report.brush_volume < 0.0);
        assert!(report.brush_volume >= -(32.0 * 32.0) - 1.0);
    }

    #[test]
    fn test_regenerate_respawns_fleet() {
        let mut config = small_config();
        config.initial_fleet.excavators = 2;
        let mut sim = Simulation::new(config).unwrap();
        sim.regenerate(TerrainType::Plains, 48, 9).unwrap();

        assert_eq!(sim.field().resolution, 48);
        assert_eq!(sim.composite().len(), 48 * 48);
        assert_eq!(sim.vehicles().len(), 2);
        assert!(sim.regenerate(TerrainType::Plains, 2, 9).is_err());
    }

    #[test]
    fn test_sea_level_validated() {
        let mut sim = Simulation::new(small_config()).unwrap();
        assert!(sim.set_sea_level(80.0).is_ok());
        assert!(sim.set_sea_level(-1.0).is_err());
        assert_eq!(sim.sea_level(), 80.0);
    }
}
