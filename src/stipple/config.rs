//! Stippling parameters, global and per entity.

use crate::errors::StippleError;
use crate::stipple::edges::EdgeDetectionMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global knobs of a synthesis pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Source pixels per dot cell along each axis; larger is sparser.
    pub packing_factor: u32,
    pub rng_seed: u32,
    /// Maximum displacement of offset-eligible dots, in tenths of a pixel.
    pub stipple_dot_dispersion: u32,
    /// Percent chance of a dot on a dark pixel outside the model.
    pub unmodelled_stippling_chance: u32,
    /// Percent chance of a dot on a dark interior pixel of the model.
    pub modelled_stippling_chance: u32,
    pub edge_detection_method: EdgeDetectionMethod,
    pub use_tile_rendering: bool,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            packing_factor: 3,
            rng_seed: 0,
            stipple_dot_dispersion: 0,
            unmodelled_stippling_chance: 15,
            modelled_stippling_chance: 75,
            edge_detection_method: EdgeDetectionMethod::Sobel,
            use_tile_rendering: false,
            tile_width: 3000,
            tile_height: 3000,
        }
    }
}

impl Configuration {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StippleError> {
        let config: Configuration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StippleError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, StippleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), StippleError> {
        if self.packing_factor == 0 {
            return Err(StippleError::InvalidConfiguration(
                "packing factor must be at least 1".into(),
            ));
        }
        for (name, chance) in [
            ("unmodelled stippling chance", self.unmodelled_stippling_chance),
            ("modelled stippling chance", self.modelled_stippling_chance),
        ] {
            if chance > 100 {
                return Err(StippleError::InvalidConfiguration(format!(
                    "{name} is {chance}%, at most 100% is allowed"
                )));
            }
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(StippleError::InvalidConfiguration(
                "tiles must be at least one pixel wide and high".into(),
            ));
        }
        Ok(())
    }
}

/// Per-entity overrides of the global configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityConfiguration {
    /// Percent chance that a silhouette dot of this entity may be displaced.
    pub silhouette_dispersion: i32,
    /// Percent chance of interior dots, `-1` to use the global chance.
    pub internal_generation: i32,
    pub has_specific_edge_detection: bool,
    pub edge_detection_method: EdgeDetectionMethod,
}

impl EntityConfiguration {
    pub const UNSET: i32 = -1;

    /// `true` when nothing is overridden. The edge method alone does not
    /// count while `has_specific_edge_detection` is off.
    pub const fn is_default(&self) -> bool {
        self.silhouette_dispersion == 0
            && self.internal_generation == Self::UNSET
            && !self.has_specific_edge_detection
    }
}

impl Default for EntityConfiguration {
    fn default() -> Self {
        EntityConfiguration {
            silhouette_dispersion: 0,
            internal_generation: Self::UNSET,
            has_specific_edge_detection: false,
            edge_detection_method: EdgeDetectionMethod::Sobel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Configuration::from_json_str(r#"{ "packing_factor": 1, "rng_seed": 7 }"#)
            .expect("valid");
        assert_eq!(config.packing_factor, 1);
        assert_eq!(config.rng_seed, 7);
        assert_eq!(config.modelled_stippling_chance, 75);
        assert_eq!(config.tile_width, 3000);
    }

    #[test]
    fn zero_packing_factor_is_rejected() {
        let err = Configuration::from_json_str(r#"{ "packing_factor": 0 }"#).unwrap_err();
        assert!(matches!(err, StippleError::InvalidConfiguration(_)));
    }

    #[test]
    fn chance_above_hundred_is_rejected() {
        let config = Configuration {
            modelled_stippling_chance: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn entity_default_ignores_unused_method() {
        let mut entity = EntityConfiguration {
            edge_detection_method: EdgeDetectionMethod::Canny,
            ..Default::default()
        };
        assert!(entity.is_default());
        entity.internal_generation = 40;
        assert!(!entity.is_default());
    }
}
