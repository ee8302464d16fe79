//! Procedural height fields for the sandbox.
//!
//! Every terrain type samples the same fractal noise source (`Fbm<Perlin>`
//! for seeded terrain), normalised to `[0, 1]`, and then shapes it:
//! - Mountains: squared, so peaks stand out of broad lowlands
//! - Canyons: inverted cube of an offset sample, giving sharp ridges
//! - Plains: low-frequency swell with a little surface detail
//! - Islands: scaled by a radial falloff so the grid edges sink into the sea

use std::fmt;
use std::str::FromStr;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{MAX_LAND, MIN_LAND};

const OCTAVES: usize = 6;
const PERSISTENCE: f64 = 0.5;
const LACUNARITY: f64 = 2.0;
/// Noise-space units per cell at the first octave.
const BASE_SCALE: f64 = 0.02;
/// Domain offset for the secondary canyon sample.
const CANYON_OFFSET: f64 = 173.37;

/// Shape of the generated terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainType {
    Mountains,
    Canyons,
    Plains,
    #[default]
    Islands,
}

impl TerrainType {
    pub const ALL: [TerrainType; 4] = [
        TerrainType::Mountains,
        TerrainType::Canyons,
        TerrainType::Plains,
        TerrainType::Islands,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TerrainType::Mountains => "mountains",
            TerrainType::Canyons => "canyons",
            TerrainType::Plains => "plains",
            TerrainType::Islands => "islands",
        }
    }

    /// Parse a terrain name; anything unrecognised becomes `Islands`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mountains" => TerrainType::Mountains,
            "canyons" => TerrainType::Canyons,
            "plains" => TerrainType::Plains,
            _ => TerrainType::Islands,
        }
    }
}

impl fmt::Display for TerrainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TerrainType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl<'de> Deserialize<'de> for TerrainType {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(d)?;
        Ok(Self::from_name(&name))
    }
}

/// Sample `noise` (nominally `[-1, 1]`) and map it to `[0, 1]`.
fn unit<N: NoiseFn<f64, 2>>(noise: &N, x: f64, y: f64) -> f64 {
    ((noise.get([x, y]) + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Generate an R x R land array for the given terrain type.
///
/// `noise` should already be fractal; `generate_seeded` passes an `Fbm<Perlin>`.
/// Output is row-major and clamped to `[MIN_LAND, MAX_LAND]`. The noise source
/// is the only input that varies the result.
pub fn generate<N: NoiseFn<f64, 2>>(
    terrain_type: TerrainType,
    resolution: usize,
    noise: &N,
) -> Vec<f32> {
    let mut land = Vec::with_capacity(resolution * resolution);
    let centre = (resolution as f64 - 1.0) * 0.5;
    let half_extent = resolution as f64 * 0.5;

    for y in 0..resolution {
        for x in 0..resolution {
            let nx = x as f64 * BASE_SCALE;
            let ny = y as f64 * BASE_SCALE;

            let height = match terrain_type {
                TerrainType::Mountains => {
                    let t = unit(noise, nx, ny);
                    255.0 * t * t
                }
                TerrainType::Canyons => {
                    let s = unit(noise, nx + CANYON_OFFSET, ny + CANYON_OFFSET);
                    255.0 * (1.0 - s).powi(3)
                }
                TerrainType::Plains => {
                    let base = unit(noise, nx * 0.25, ny * 0.25);
                    let detail = unit(noise, nx * 4.0, ny * 4.0);
                    60.0 + 60.0 * base + 8.0 * (detail - 0.5)
                }
                TerrainType::Islands => {
                    let t = unit(noise, nx, ny);
                    let d = ((x as f64 - centre).powi(2) + (y as f64 - centre).powi(2)).sqrt();
                    let falloff = (1.0 - d / half_extent).max(0.0);
                    255.0 * t * falloff
                }
            };

            land.push((height as f32).clamp(MIN_LAND, MAX_LAND));
        }
    }

    land
}

/// Generate using fractal Perlin noise seeded from `seed`.
pub fn generate_seeded(terrain_type: TerrainType, resolution: usize, seed: u64) -> Vec<f32> {
    // Noise seeds are u32; fold the high half in so both halves matter.
    let folded = (seed ^ (seed >> 32)) as u32;
    let noise: Fbm<Perlin> = Fbm::new(folded)
        .set_octaves(OCTAVES)
        .set_persistence(PERSISTENCE)
        .set_lacunarity(LACUNARITY);
    generate(terrain_type, resolution, &noise)
}
