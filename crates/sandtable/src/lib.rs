//! Sandbox terrain physics and construction-vehicle AI
//!
//! A square height field of land and water is stepped once per frame:
//! steep land slumps, water runs downhill and drags land with it, and the
//! outer ring of cells behaves like an endless sea. Users, a depth camera and
//! a fleet of autonomous vehicles (excavators, bulldozers, compactors, dump trucks) all
//! edit the same land through a circular brush.
//!
//! # Example
//!
//! ```
//! use sandtable::{FleetComposition, FleetMode, SimConfig, Simulation, TerrainType};
//! use glam::Vec2;
//!
//! let config = SimConfig {
//!     resolution: 48,
//!     terrain: TerrainType::Islands,
//!     initial_fleet: FleetComposition { excavators: 1, bulldozers: 1, ..Default::default() },
//!     ..Default::default()
//! };
//! let mut sim = Simulation::new(config).unwrap();
//! sim.set_fleet_mode(FleetMode::Work);
//! sim.set_mission_active(true);
//!
//! // Dig a small hole
//! sim.queue_brush(Vec2::new(24.0, 24.0), 4.0, -2.0);
//! let report = sim.tick();
//! assert!(report.brush_volume <= 0.0);
//! assert_eq!(sim.composite().len(), 48 * 48);
//! ```

pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod fleet;
pub mod heightfield;
pub mod physics;
pub mod serde_utils;
pub mod simulation;
pub mod terrain_generator;
pub mod vehicle;

pub use config::{
    BaseArea, BulldozerParams, CompactorParams, DumpTruckParams, ExcavatorParams, FleetComposition,
    HaulParams, PhysicsParams, SimConfig, VehicleParams,
};
pub use editor::{brush_weight, footprint_weight, modify, relax, BrushAction};
pub use error::SimError;
pub use fleet::{Fleet, FleetMode};
pub use glam::Vec2;
pub use heightfield::HeightField;
pub use physics::{PhysicsStepper, SeaExchange, StepStats};
pub use simulation::{Simulation, TickReport};
pub use terrain_generator::{generate, generate_seeded, TerrainType};
pub use vehicle::{AiMode, Vehicle, VehicleDrawState, VehicleKind, VehicleReport};
