use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, polygon::Color};

/// Tunable parameters of a drawing session. Every field has a default, so a
/// config file only needs to list the values it overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    /// An open polygon with more than two vertices is completed automatically
    /// once its last vertex lands closer than this to its first vertex.
    pub closure_epsilon: f32,
    /// Placement a fresh duplicate is staged at before it follows the
    /// pointer.
    pub duplicate_offset: Vec2,
    pub fill_color: Color,
    pub line_color: Color,
    /// Edge length of the squares drawn for the vertices of an open polygon,
    /// in world units.
    pub point_size: f32,
    /// Half the side length of the square ground plane that pointer rays are
    /// cast against.
    pub ground_half_extent: f32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            closure_epsilon: 0.1,
            duplicate_offset: Vec2::new(0., -50.),
            fill_color: Color::from_hex(0xff0000),
            line_color: Color::from_hex(0x00ff00),
            point_size: 5.,
            ground_half_extent: 500.,
        }
    }
}

impl DrawConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.closure_epsilon.is_finite() || self.closure_epsilon < 0. {
            return Err(Error::config(format!(
                "closure_epsilon must be a non-negative number, got {}",
                self.closure_epsilon
            )));
        }

        if !self.duplicate_offset.is_finite() {
            return Err(Error::config("duplicate_offset must be finite"));
        }

        if !self.point_size.is_finite() || self.point_size <= 0. {
            return Err(Error::config(format!(
                "point_size must be positive, got {}",
                self.point_size
            )));
        }

        if !self.ground_half_extent.is_finite() || self.ground_half_extent <= 0. {
            return Err(Error::config(format!(
                "ground_half_extent must be positive, got {}",
                self.ground_half_extent
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = DrawConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DrawConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = DrawConfig::from_json_str(
            r#"{ "closure_epsilon": 2.5, "duplicate_offset": [10.0, 20.0], "fill_color": 255 }"#,
        )
        .unwrap();

        assert_eq!(config.closure_epsilon, 2.5);
        assert_eq!(config.duplicate_offset, Vec2::new(10., 20.));
        assert_eq!(config.fill_color, Color::from_hex(0x0000ff));
        assert_eq!(config.line_color, DrawConfig::default().line_color);
    }

    #[test]
    fn colors_are_masked_to_24_bits() {
        let config = DrawConfig::from_json_str(r#"{ "fill_color": 4294967295 }"#).unwrap();
        assert_eq!(config.fill_color.hex(), 0xffffff);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""fill_color":16777215"#));
    }

    #[test]
    fn rejects_negative_epsilon() {
        let err = DrawConfig::from_json_str(r#"{ "closure_epsilon": -1.0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_zero_ground() {
        let err = DrawConfig::from_json_str(r#"{ "ground_half_extent": 0.0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_json() {
        let err = DrawConfig::from_json_str("{ closure_epsilon").unwrap_err();
        assert!(matches!(err, Error::ConfigFormat(_)));
    }

    #[test]
    fn missing_file() {
        let err = DrawConfig::load("/nonexistent/polydraw.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
