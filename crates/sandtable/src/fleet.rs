//! The vehicle fleet: spawning, composition changes and per-tick updates.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{BaseArea, FleetComposition, VehicleParams};
use crate::heightfield::HeightField;
use crate::vehicle::search::random_parking_spot;
use crate::vehicle::{AiMode, Vehicle, VehicleContext, VehicleDrawState, VehicleKind, VehicleReport};

fn clamp_to_grid(p: Vec2, resolution: usize) -> Vec2 {
    let max = resolution.saturating_sub(1) as f32;
    p.clamp(Vec2::ZERO, Vec2::splat(max))
}

/// What the fleet as a whole has been told to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FleetMode {
    Work,
    #[default]
    Idle,
}

pub struct Fleet {
    vehicles: Vec<Vehicle>,
    rng: ChaCha8Rng,
    next_id: u32,
    pub mode: FleetMode,
    pub mission_active: bool,
    pub base: BaseArea,
}

impl Fleet {
    pub fn new(seed: u64, base: BaseArea) -> Self {
        Self {
            vehicles: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 0,
            mode: FleetMode::default(),
            mission_active: false,
            base,
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicles_mut(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn composition(&self) -> FleetComposition {
        let count = |kind: VehicleKind| self.vehicles.iter().filter(|v| v.kind == kind).count();
        FleetComposition {
            excavators: count(VehicleKind::Excavator),
            bulldozers: count(VehicleKind::Bulldozer),
            compactors: count(VehicleKind::Compactor),
            dump_trucks: count(VehicleKind::DumpTruck),
        }
    }

    /// Whether vehicles should be out working this tick.
    pub fn is_operating(&self) -> bool {
        self.mode == FleetMode::Work && self.mission_active
    }

    /// Spawn a vehicle at a random spot in the base; it starts `Idle`.
    pub fn spawn(&mut self, kind: VehicleKind, resolution: usize) -> u32 {
        let spot = random_parking_spot(&mut self.rng, &self.base);
        let spot = clamp_to_grid(spot, resolution);
        let heading = self.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
        let id = self.next_id;
        self.next_id += 1;
        self.vehicles.push(Vehicle::new(id, kind, spot, heading));
        id
    }

    /// Add or remove vehicles until each kind matches `target`.
    /// The newest vehicles of a kind are removed first.
    pub fn set_composition(&mut self, target: FleetComposition, resolution: usize) {
        if target == self.composition() {
            return;
        }
        for kind in VehicleKind::ALL {
            let want = target.count(kind);
            let mut have = self.vehicles.iter().filter(|v| v.kind == kind).count();

            while have > want {
                if let Some(pos) = self.vehicles.iter().rposition(|v| v.kind == kind) {
                    self.vehicles.remove(pos);
                }
                have -= 1;
            }
            while have < want {
                self.spawn(kind, resolution);
                have += 1;
            }
        }
        log::info!(
            "fleet: {} excavators, {} bulldozers, {} compactors, {} dump trucks",
            target.excavators,
            target.bulldozers,
            target.compactors,
            target.dump_trucks
        );
    }

    /// Drop every vehicle and spawn a fresh fleet, e.g. after regeneration.
    pub fn respawn(&mut self, composition: FleetComposition, resolution: usize) {
        self.vehicles.clear();
        self.set_composition(composition, resolution);
    }

    /// Update every vehicle in order. Returns the summed terrain changes.
    pub fn update(&mut self, field: &mut HeightField, params: &VehicleParams, sea_level: f32) -> VehicleReport {
        let ctx = VehicleContext {
            params,
            sea_level,
            operating: self.is_operating(),
            base: self.base,
        };
        let mut total = VehicleReport::default();
        for vehicle in self.vehicles.iter_mut() {
            total += vehicle.update(field, &mut self.rng, &ctx);
        }
        total
    }

    pub fn parked_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.mode == AiMode::Parked).count()
    }

    pub fn draw_states(&self, params: &VehicleParams) -> Vec<VehicleDrawState> {
        self.vehicles.iter().map(|v| v.draw_state(params)).collect()
    }
}
