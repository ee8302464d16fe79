//! Autonomous construction vehicles.
//!
//! Each vehicle is a small state machine. Every tick runs three phases in
//! order:
//! 1. Fleet directive: work vs. return to base
//! 2. Behaviour: searches, digging, hauling, dumping, pushing (see `behavior`)
//! 3. Steering and integration (see `steering`)
//!
//! Vehicle kinds share the state machine; what differs is looked up per kind
//! in `behavior`.

mod behavior;
pub mod search;
mod steering;

pub use steering::wrap_angle;

use glam::Vec2;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{BaseArea, VehicleParams};
use crate::heightfield::HeightField;
use crate::serde_utils::grid_point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleKind {
    Excavator,
    Bulldozer,
    Compactor,
    /// Hauls spoil piles to low ground.
    DumpTruck,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 4] = [
        VehicleKind::Excavator,
        VehicleKind::Bulldozer,
        VehicleKind::Compactor,
        VehicleKind::DumpTruck,
    ];
}

/// AI state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMode {
    Idle,
    SeekingWorkSite,
    MovingToWorkSite,
    Working,
    MovingToDumpSite,
    Dumping,
    ReturningToBase,
    Parked,
}

impl AiMode {
    /// States that count as "on the job" and get recalled when the fleet idles.
    pub fn is_operating(self) -> bool {
        !matches!(self, AiMode::ReturningToBase | AiMode::Parked)
    }
}

/// Per-tick inputs shared by the whole fleet.
#[derive(Clone, Copy, Debug)]
pub struct VehicleContext<'a> {
    pub params: &'a VehicleParams,
    pub sea_level: f32,
    /// Fleet is in work mode and a mission is running.
    pub operating: bool,
    pub base: BaseArea,
}

/// Terrain changes one vehicle made this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VehicleReport {
    /// Net land added (negative when digging).
    pub volume_changed: f32,
    /// Land picked up or relocated, always non-negative.
    pub material_moved: f32,
}

impl std::ops::AddAssign for VehicleReport {
    fn add_assign(&mut self, rhs: Self) {
        self.volume_changed += rhs.volume_changed;
        self.material_moved += rhs.material_moved;
    }
}

/// Snapshot handed to renderers and telemetry.
#[derive(Clone, Debug, Serialize)]
pub struct VehicleDrawState {
    pub id: u32,
    pub kind: VehicleKind,
    #[serde(serialize_with = "grid_point::serialize")]
    pub position: Vec2,
    pub heading: f32,
    pub speed: f32,
    pub mode: AiMode,
    /// Payload as a fraction of capacity; 0 for kinds that carry nothing.
    pub payload_fraction: f32,
}

#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id: u32,
    pub kind: VehicleKind,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, 0 along +x.
    pub heading: f32,
    pub mode: AiMode,
    /// Work site (dig point, high side of a slope, rough patch, spoil pile).
    pub primary_target: Option<Vec2>,
    /// Dump site for haulers, low side of the slope for bulldozers.
    pub secondary_target: Option<Vec2>,
    /// Material carried (excavators and dump trucks).
    pub payload: f32,
    /// Ticks left in the current working task.
    pub task_cooldown: u32,
    /// Ticks left to reach the current site.
    pub search_timeout: u32,
    pub parking_spot: Vec2,
}

impl Vehicle {
    pub fn new(id: u32, kind: VehicleKind, position: Vec2, heading: f32) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            heading,
            mode: AiMode::Idle,
            primary_target: None,
            secondary_target: None,
            payload: 0.0,
            task_cooldown: 0,
            search_timeout: 0,
            parking_spot: position,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn heading_dir(&self) -> Vec2 {
        Vec2::new(self.heading.cos(), self.heading.sin())
    }

    /// Target the steering should head for in the current mode.
    pub fn active_target(&self) -> Option<Vec2> {
        match self.mode {
            AiMode::MovingToWorkSite => self.primary_target,
            AiMode::Working => match self.kind {
                VehicleKind::Bulldozer => self.secondary_target,
                _ => None,
            },
            AiMode::MovingToDumpSite | AiMode::Dumping => self.secondary_target,
            AiMode::ReturningToBase => Some(self.parking_spot),
            AiMode::Idle | AiMode::SeekingWorkSite | AiMode::Parked => None,
        }
    }

    /// Switch mode, logging the transition.
    pub(crate) fn set_mode(&mut self, mode: AiMode) {
        if self.mode != mode {
            log::debug!(
                "vehicle {} ({:?}): {:?} -> {:?}",
                self.id,
                self.kind,
                self.mode,
                mode
            );
            self.mode = mode;
        }
    }

    /// Run one tick: directive, behaviour, then movement.
    pub fn update(
        &mut self,
        field: &mut HeightField,
        rng: &mut ChaCha8Rng,
        ctx: &VehicleContext<'_>,
    ) -> VehicleReport {
        behavior::apply_directive(self, rng, ctx);
        let report = behavior::think(self, field, rng, ctx);
        steering::steer(self, field, ctx.params);
        report
    }

    pub fn draw_state(&self, params: &VehicleParams) -> VehicleDrawState {
        let payload_fraction = match params.haul(self.kind) {
            Some(haul) if haul.payload_capacity > 0.0 => {
                (self.payload / haul.payload_capacity).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };
        VehicleDrawState {
            id: self.id,
            kind: self.kind,
            position: self.position,
            heading: self.heading,
            speed: self.speed(),
            mode: self.mode,
            payload_fraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vehicle_is_idle() {
        let v = Vehicle::new(3, VehicleKind::Bulldozer, Vec2::new(4.0, 5.0), 0.0);
        assert_eq!(v.mode, AiMode::Idle);
        assert_eq!(v.parking_spot, Vec2::new(4.0, 5.0));
        assert!(v.active_target().is_none());
    }

    #[test]
    fn test_active_target_per_mode() {
        let mut v = Vehicle::new(0, VehicleKind::Excavator, Vec2::ZERO, 0.0);
        v.primary_target = Some(Vec2::new(1.0, 1.0));
        v.secondary_target = Some(Vec2::new(2.0, 2.0));

        v.mode = AiMode::MovingToWorkSite;
        assert_eq!(v.active_target(), Some(Vec2::new(1.0, 1.0)));
        v.mode = AiMode::Dumping;
        assert_eq!(v.active_target(), Some(Vec2::new(2.0, 2.0)));
        v.mode = AiMode::Working;
        assert_eq!(v.active_target(), None);

        v.kind = VehicleKind::Bulldozer;
        assert_eq!(v.active_target(), Some(Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn test_draw_state_serializes() {
        let params = VehicleParams::default();
        let mut v = Vehicle::new(7, VehicleKind::Excavator, Vec2::new(1.0, 2.0), 0.5);
        v.payload = params.excavator.payload_capacity * 0.5;
        v.mode = AiMode::MovingToDumpSite;

        let state = v.draw_state(&params);
        assert!((state.payload_fraction - 0.5).abs() < 1e-6);

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["kind"], "excavator");
        assert_eq!(json["mode"], "moving_to_dump_site");
        assert_eq!(json["position"]["x"], 1.0);

        let truck = Vehicle::new(8, VehicleKind::DumpTruck, Vec2::ZERO, 0.0);
        let json = serde_json::to_value(truck.draw_state(&params)).unwrap();
        assert_eq!(json["kind"], "dump_truck");
    }
}
