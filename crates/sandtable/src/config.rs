//! Simulation configuration.
//!
//! Everything here is plain data with serde support so a front end can ship
//! a JSON file; every field has a default so partial files are accepted.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RESOLUTION, DEFAULT_SEA_LEVEL, MAX_LAND, MIN_RESOLUTION};
use crate::error::SimError;
use crate::serde_utils::grid_point;
use crate::terrain_generator::TerrainType;
use crate::vehicle::VehicleKind;

/// Terrain physics constants.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Maximum stable land height difference between adjacent cells.
    pub talus: f32,
    /// Fraction of the excess over `talus` that slumps per tick (halved per pair).
    pub slump_factor: f32,
    /// Fraction of half the surface difference that flows per tick.
    pub flow_speed: f32,
    /// Single outgoing flow above which the source starts to erode.
    pub erosion_threshold: f32,
    /// Land moved per unit of flow once eroding.
    pub erosion_rate: f32,
    /// Upper bound on land moved by one erosion transfer.
    pub max_erosion: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            talus: 4.0,
            slump_factor: 0.5,
            flow_speed: 0.5,
            erosion_threshold: 1.0,
            erosion_rate: 0.02,
            max_erosion: 0.25,
        }
    }
}

/// Excavator tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcavatorParams {
    pub dig_radius: f32,
    /// Land removed at the bucket centre per working tick.
    pub dig_rate: f32,
    /// Volume carried before heading off to dump.
    pub payload_capacity: f32,
    pub dump_radius: f32,
    /// Land added at the dump centre per dumping tick (before payload limits).
    pub dump_rate: f32,
}

impl Default for ExcavatorParams {
    fn default() -> Self {
        Self {
            dig_radius: 2.0,
            dig_rate: 0.8,
            payload_capacity: 30.0,
            dump_radius: 2.0,
            dump_rate: 1.0,
        }
    }
}

/// Bulldozer tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BulldozerParams {
    pub blade_radius: f32,
    /// Land scraped at the blade centre per working tick.
    pub push_rate: f32,
    /// Distance ahead of the vehicle where scraped material lands.
    pub push_distance: f32,
    /// Smallest 4-neighbour drop worth pushing.
    pub min_gradient: f32,
}

impl Default for BulldozerParams {
    fn default() -> Self {
        Self {
            blade_radius: 1.5,
            push_rate: 0.5,
            push_distance: 3.0,
            min_gradient: 3.0,
        }
    }
}

/// Compactor tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactorParams {
    pub roller_radius: f32,
    /// Fraction of the distance to the local mean removed per working tick.
    pub smoothing: f32,
    /// Smallest local roughness worth rolling.
    pub min_roughness: f32,
}

impl Default for CompactorParams {
    fn default() -> Self {
        Self {
            roller_radius: 2.0,
            smoothing: 0.2,
            min_roughness: 1.5,
        }
    }
}

/// Dump truck tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpTruckParams {
    pub load_radius: f32,
    /// Land loaded from the pile centre per working tick.
    pub load_rate: f32,
    /// Volume hauled per trip.
    pub payload_capacity: f32,
    /// Smallest rise above the neighbour mean that counts as a spoil pile.
    pub min_pile_height: f32,
    pub dump_radius: f32,
    /// Land added at the dump centre per dumping tick (before payload limits).
    pub dump_rate: f32,
}

impl Default for DumpTruckParams {
    fn default() -> Self {
        Self {
            load_radius: 2.5,
            load_rate: 1.0,
            payload_capacity: 60.0,
            min_pile_height: 2.0,
            dump_radius: 2.5,
            dump_rate: 1.5,
        }
    }
}

/// Payload and dump brush of a kind that carries material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HaulParams {
    pub payload_capacity: f32,
    pub dump_radius: f32,
    pub dump_rate: f32,
}

/// Vehicle movement, search and task tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Cells per tick.
    pub max_speed: f32,
    /// Forward acceleration on dry ground, cells per tick squared.
    pub acceleration: f32,
    /// Multiplier on acceleration while the vehicle's cell is underwater.
    pub water_drag: f32,
    /// Velocity multiplier applied every tick.
    pub friction: f32,
    /// Fraction of the heading error corrected per tick.
    pub turn_rate: f32,
    /// Distance at which a target counts as reached.
    pub arrive_radius: f32,
    /// Distance inside which acceleration eases off toward the target.
    pub slow_radius: f32,
    /// Random samples per site search.
    pub search_samples: usize,
    /// Radius around the vehicle that site searches sample.
    pub search_radius: f32,
    /// Ticks allowed to reach a work or dump site.
    pub search_timeout_ticks: u32,
    /// Ticks a single working task may last.
    pub task_ticks: u32,
    /// Largest ring examined when looking for dry land; never more than the
    /// grid resolution.
    pub dry_search_radius: i32,
    /// Velocity multiplier per tick while parked.
    pub parked_decay: f32,
    pub excavator: ExcavatorParams,
    pub bulldozer: BulldozerParams,
    pub compactor: CompactorParams,
    pub dump_truck: DumpTruckParams,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            max_speed: 0.6,
            acceleration: 0.08,
            water_drag: 0.15,
            friction: 0.9,
            turn_rate: 0.2,
            arrive_radius: 1.5,
            slow_radius: 4.0,
            search_samples: 30,
            search_radius: 24.0,
            search_timeout_ticks: 600,
            task_ticks: 400,
            dry_search_radius: 8,
            parked_decay: 0.8,
            excavator: ExcavatorParams::default(),
            bulldozer: BulldozerParams::default(),
            compactor: CompactorParams::default(),
            dump_truck: DumpTruckParams::default(),
        }
    }
}

impl VehicleParams {
    /// Hauling parameters, for kinds that carry a payload.
    pub fn haul(&self, kind: VehicleKind) -> Option<HaulParams> {
        match kind {
            VehicleKind::Excavator => Some(HaulParams {
                payload_capacity: self.excavator.payload_capacity,
                dump_radius: self.excavator.dump_radius,
                dump_rate: self.excavator.dump_rate,
            }),
            VehicleKind::DumpTruck => Some(HaulParams {
                payload_capacity: self.dump_truck.payload_capacity,
                dump_radius: self.dump_truck.dump_radius,
                dump_rate: self.dump_truck.dump_rate,
            }),
            VehicleKind::Bulldozer | VehicleKind::Compactor => None,
        }
    }
}

/// Circular parking area vehicles return to when the fleet is idle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BaseArea {
    #[serde(with = "grid_point")]
    pub center: Vec2,
    pub radius: f32,
}

impl BaseArea {
    /// Default base: a small circle in the middle of the grid.
    pub fn centered(resolution: usize) -> Self {
        let mid = (resolution.saturating_sub(1)) as f32 * 0.5;
        Self {
            center: Vec2::splat(mid),
            radius: (resolution as f32 * 0.06).max(1.5),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.distance(self.center) <= self.radius
    }
}

/// Number of vehicles of each kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetComposition {
    pub excavators: usize,
    pub bulldozers: usize,
    pub compactors: usize,
    pub dump_trucks: usize,
}

impl FleetComposition {
    pub fn count(&self, kind: VehicleKind) -> usize {
        match kind {
            VehicleKind::Excavator => self.excavators,
            VehicleKind::Bulldozer => self.bulldozers,
            VehicleKind::Compactor => self.compactors,
            VehicleKind::DumpTruck => self.dump_trucks,
        }
    }

    pub fn total(&self) -> usize {
        self.excavators + self.bulldozers + self.compactors + self.dump_trucks
    }
}

/// Full simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub resolution: usize,
    pub sea_level: f32,
    pub seed: u64,
    pub terrain: TerrainType,
    pub physics: PhysicsParams,
    pub vehicles: VehicleParams,
    /// Parking area; `None` places it at the grid centre.
    pub base: Option<BaseArea>,
    pub initial_fleet: FleetComposition,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            sea_level: DEFAULT_SEA_LEVEL,
            seed: 42,
            terrain: TerrainType::Islands,
            physics: PhysicsParams::default(),
            vehicles: VehicleParams::default(),
            base: None,
            initial_fleet: FleetComposition {
                excavators: 2,
                bulldozers: 2,
                compactors: 1,
                dump_trucks: 1,
            },
        }
    }
}

fn positive(value: f32, message: &'static str) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(message))
    }
}

impl SimConfig {
    /// Base area, falling back to the grid centre.
    pub fn base_area(&self) -> BaseArea {
        self.base.unwrap_or_else(|| BaseArea::centered(self.resolution))
    }

    /// Reject values the physics or agents cannot work with.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.resolution < MIN_RESOLUTION {
            return Err(SimError::InvalidConfig("resolution must be at least 3"));
        }
        if !self.sea_level.is_finite() || !(0.0..=MAX_LAND).contains(&self.sea_level) {
            return Err(SimError::InvalidConfig("sea_level must lie within the land range"));
        }
        let p = &self.physics;
        if !(p.talus >= 0.0) {
            return Err(SimError::InvalidConfig("talus must be non-negative"));
        }
        if !(p.slump_factor >= 0.0 && p.slump_factor <= 1.0) {
            return Err(SimError::InvalidConfig("slump_factor must lie in [0, 1]"));
        }
        if !(p.flow_speed > 0.0 && p.flow_speed <= 1.0) {
            return Err(SimError::InvalidConfig("flow_speed must lie in (0, 1]"));
        }
        if !(p.erosion_rate >= 0.0 && p.max_erosion >= 0.0) {
            return Err(SimError::InvalidConfig("erosion constants must be non-negative"));
        }

        let v = &self.vehicles;
        positive(v.max_speed, "max_speed must be positive")?;
        if !(v.friction > 0.0 && v.friction <= 1.0) {
            return Err(SimError::InvalidConfig("friction must lie in (0, 1]"));
        }
        if !(v.turn_rate > 0.0 && v.turn_rate <= 1.0) {
            return Err(SimError::InvalidConfig("turn_rate must lie in (0, 1]"));
        }
        positive(v.arrive_radius, "arrive_radius must be positive")?;
        positive(v.slow_radius, "slow_radius must be positive")?;
        positive(v.search_radius, "search_radius must be positive")?;
        if v.search_samples == 0 {
            return Err(SimError::InvalidConfig("search_samples must be positive"));
        }
        if v.dry_search_radius < 1 {
            return Err(SimError::InvalidConfig("dry_search_radius must be at least 1"));
        }
        positive(v.excavator.dig_radius, "dig_radius must be positive")?;
        positive(v.excavator.dump_radius, "excavator dump_radius must be positive")?;
        positive(v.bulldozer.blade_radius, "blade_radius must be positive")?;
        positive(v.compactor.roller_radius, "roller_radius must be positive")?;
        positive(v.dump_truck.load_radius, "load_radius must be positive")?;
        positive(v.dump_truck.dump_radius, "dump truck dump_radius must be positive")?;
        positive(v.excavator.payload_capacity, "payload_capacity must be positive")?;
        positive(v.dump_truck.payload_capacity, "payload_capacity must be positive")?;

        if let Some(base) = self.base {
            positive(base.radius, "base radius must be positive")?;
            let max = (self.resolution - 1) as f32;
            let on_grid = |c: f32| c.is_finite() && (0.0..=max).contains(&c);
            if !on_grid(base.center.x) || !on_grid(base.center.y) {
                return Err(SimError::InvalidConfig("base center must lie on the grid"));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_json(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json_str(r#"{ "resolution": 64, "terrain": "canyons" }"#)
            .unwrap();
        assert_eq!(config.resolution, 64);
        assert_eq!(config.terrain, TerrainType::Canyons);
        assert_eq!(config.sea_level, DEFAULT_SEA_LEVEL);
        assert_eq!(config.vehicles.search_samples, 30);
    }

    #[test]
    fn test_rejects_tiny_grid() {
        let config = SimConfig {
            resolution: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_nan_sea_level() {
        let config = SimConfig {
            sea_level: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unbounded_search_and_brush_radii() {
        let mut config = SimConfig::default();
        config.vehicles.dry_search_radius = 0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.vehicles.search_radius = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.vehicles.arrive_radius = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.vehicles.bulldozer.blade_radius = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.vehicles.dump_truck.load_radius = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_base_off_grid() {
        let mut config = SimConfig {
            resolution: 32,
            ..Default::default()
        };
        config.base = Some(BaseArea {
            center: Vec2::new(40.0, 10.0),
            radius: 3.0,
        });
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        config.base = Some(BaseArea {
            center: Vec2::new(31.0, 0.0),
            radius: 3.0,
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_haul_params_per_kind() {
        let params = VehicleParams::default();
        let truck = params.haul(VehicleKind::DumpTruck).unwrap();
        assert_eq!(truck.payload_capacity, params.dump_truck.payload_capacity);
        assert!(params.haul(VehicleKind::Excavator).is_some());
        assert!(params.haul(VehicleKind::Bulldozer).is_none());
        assert!(params.haul(VehicleKind::Compactor).is_none());
    }

    #[test]
    fn test_bad_json_is_reported() {
        assert!(matches!(
            SimConfig::from_json_str("{ not json"),
            Err(SimError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("sandtable-config-{}.json", std::process::id()));
        let mut config = SimConfig::default();
        config.base = Some(BaseArea {
            center: Vec2::new(10.0, 12.0),
            radius: 3.0,
        });
        config.save_json(&path).unwrap();
        let loaded = SimConfig::load_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let base = loaded.base.unwrap();
        assert_eq!(base.center, Vec2::new(10.0, 12.0));
        assert_eq!(loaded.initial_fleet, config.initial_fleet);
    }

    #[test]
    fn test_centered_base() {
        let base = BaseArea::centered(65);
        assert_eq!(base.center, Vec2::splat(32.0));
        assert!(base.contains(Vec2::new(33.0, 32.0)));
        assert!(!base.contains(Vec2::new(0.0, 0.0)));
    }
}
