use crate::constants::{DRY_WATER_DEPTH, MAX_LAND, MIN_LAND};
use crate::error::SimError;

/// Land and water grids for the sandbox surface.
///
/// Both grids are square, `resolution x resolution`, stored row-major
/// (`y * resolution + x`).
#[derive(Clone, Debug)]
pub struct HeightField {
    pub resolution: usize,
    /// Solid terrain height, always within `[MIN_LAND, MAX_LAND]`.
    pub land: Vec<f32>,
    /// Standing water depth on top of land, never negative.
    pub water: Vec<f32>,
}

impl HeightField {
    /// Create a dry field with flat land at the given height.
    pub fn new(resolution: usize, initial_land: f32) -> Self {
        let cell_count = resolution * resolution;
        Self {
            resolution,
            land: vec![initial_land.clamp(MIN_LAND, MAX_LAND); cell_count],
            water: vec![0.0; cell_count],
        }
    }

    /// Wrap an existing land array; water starts empty. Out-of-range and
    /// non-finite heights are sanitized.
    pub fn from_land(resolution: usize, land: Vec<f32>) -> Result<Self, SimError> {
        let expected = resolution * resolution;
        if land.len() != expected {
            return Err(SimError::LandSize {
                expected,
                actual: land.len(),
            });
        }
        let water = vec![0.0; land.len()];
        let mut field = Self {
            resolution,
            land,
            water,
        };
        field.sanitize();
        Ok(field)
    }

    /// Cell index from (x, y) coordinates.
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.resolution + x
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.land.len()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.resolution && (y as usize) < self.resolution
    }

    #[inline]
    pub fn is_boundary(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.resolution || y + 1 == self.resolution
    }

    /// Land + water at a cell.
    #[inline]
    pub fn composite_at(&self, x: usize, y: usize) -> f32 {
        let idx = self.idx(x, y);
        self.land[idx] + self.water[idx]
    }

    /// Grid cell containing a continuous position, if it lies on the grid.
    pub fn cell_at(&self, px: f32, py: f32) -> Option<(usize, usize)> {
        if !px.is_finite() || !py.is_finite() {
            return None;
        }
        let x = px.round() as i32;
        let y = py.round() as i32;
        self.in_bounds(x, y).then(|| (x as usize, y as usize))
    }

    /// Land height at a continuous position; 0 off the grid.
    pub fn land_at(&self, px: f32, py: f32) -> f32 {
        match self.cell_at(px, py) {
            Some((x, y)) => self.land[self.idx(x, y)],
            None => 0.0,
        }
    }

    /// Water depth at a continuous position; 0 off the grid.
    pub fn water_at(&self, px: f32, py: f32) -> f32 {
        match self.cell_at(px, py) {
            Some((x, y)) => self.water[self.idx(x, y)],
            None => 0.0,
        }
    }

    /// Whether a cell holds enough water to count as submerged.
    #[inline]
    pub fn is_wet(&self, x: usize, y: usize) -> bool {
        self.water[self.idx(x, y)] > DRY_WATER_DEPTH
    }

    /// Write `land + water` into `out`, resizing it if needed.
    pub fn write_composite(&self, out: &mut Vec<f32>) {
        out.resize(self.cell_count(), 0.0);
        for ((dst, &l), &w) in out.iter_mut().zip(&self.land).zip(&self.water) {
            *dst = l + w;
        }
    }

    /// Replace land wholesale (e.g. from a depth camera), clamping to range.
    /// Water is kept; callers validate the length beforehand.
    pub fn replace_land(&mut self, land: &[f32]) {
        debug_assert_eq!(land.len(), self.land.len());
        for (dst, &src) in self.land.iter_mut().zip(land) {
            *dst = if src.is_finite() {
                src.clamp(MIN_LAND, MAX_LAND)
            } else {
                MIN_LAND
            };
        }
    }

    /// Reset non-finite values to 0 and clamp into range.
    /// Returns how many cells had to be reset because they were non-finite.
    pub fn sanitize(&mut self) -> usize {
        let mut reset = 0;
        for l in self.land.iter_mut() {
            if !l.is_finite() {
                *l = 0.0;
                reset += 1;
            } else {
                *l = l.clamp(MIN_LAND, MAX_LAND);
            }
        }
        for w in self.water.iter_mut() {
            if !w.is_finite() {
                *w = 0.0;
                reset += 1;
            } else if *w < 0.0 {
                *w = 0.0;
            }
        }
        reset
    }

    /// Sum of all land (volume conservation checks).
    pub fn total_land(&self) -> f64 {
        self.land.iter().map(|&v| v as f64).sum()
    }

    /// Sum of all water.
    pub fn total_water(&self) -> f64 {
        self.water.iter().map(|&v| v as f64).sum()
    }

    /// Min/max land height across the grid.
    pub fn land_range(&self) -> (f32, f32) {
        self.land
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)))
    }
}
