//! Shared constants for the sandbox height field.
//!
//! ## Height Units
//!
//! Heights are unitless scalars on the conventional 8-bit range used by the
//! depth camera and the colour-mapping collaborator:
//!
//! - `Land` is always clamped to `[MIN_LAND, MAX_LAND]`
//! - `Water` is a depth stacked on top of land and is never negative
//!
//! The externally visible elevation is `Land + Water`.

/// Lowest allowed land height.
pub const MIN_LAND: f32 = 0.0;

/// Highest allowed land height.
pub const MAX_LAND: f32 = 255.0;

/// Sea level used when a config does not override it.
pub const DEFAULT_SEA_LEVEL: f32 = 55.0;

/// Grid resolution used when a config does not override it.
pub const DEFAULT_RESOLUTION: usize = 128;

/// Smallest grid that still has an interior cell.
pub const MIN_RESOLUTION: usize = 3;

/// Water depth below which a cell counts as dry for vehicles.
pub const DRY_WATER_DEPTH: f32 = 0.5;

/// Volume below which a payload counts as empty.
pub const PAYLOAD_EPSILON: f32 = 1e-3;
