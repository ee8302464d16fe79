//! Serde helpers for grid positions.
//!
//! Positions are written as `{"x": .., "y": ..}`. Hand-written config files
//! may also use a `[x, y]` pair. Use with `#[serde(with = "grid_point")]`.

/// `glam::Vec2` in cell units.
pub mod grid_point {
    use glam::Vec2;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct Point {
        x: f32,
        y: f32,
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PointRepr {
        Object { x: f32, y: f32 },
        Pair([f32; 2]),
    }

    pub fn serialize<S>(p: &Vec2, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Point { x: p.x, y: p.y }.serialize(s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Vec2, D::Error>
    where
        D: Deserializer<'de>,
    {
        let p = match PointRepr::deserialize(d)? {
            PointRepr::Object { x, y } => Vec2::new(x, y),
            PointRepr::Pair([x, y]) => Vec2::new(x, y),
        };
        if !p.is_finite() {
            return Err(D::Error::custom("grid point must be finite"));
        }
        Ok(p)
    }
}
