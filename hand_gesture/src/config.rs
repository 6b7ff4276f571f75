//! Tunables for classification and aggregation.

use serde::{Deserialize, Serialize};

use crate::error::{GestureError, Result};

/// Thresholds and bounds used by the gesture core.
///
/// Defaults reproduce the behavior of the original webcam controller:
/// a 2-unit step per detected frame, a 0.05 dead band around the thumb MCP,
/// at most two hands, both controls in `[0, 100]` starting at 50.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Units added or removed per frame while a gesture is held.
    pub step:               u8,
    /// Dead band (normalized units) between thumb tip and thumb MCP.
    pub thumb_margin:       f32,
    /// Detector cap on hands per frame.
    pub max_hands:          usize,
    pub min_level:          u8,
    pub max_level:          u8,
    pub initial_volume:     u8,
    pub initial_brightness: u8,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            step:               2,
            thumb_margin:       0.05,
            max_hands:          2,
            min_level:          0,
            max_level:          100,
            initial_volume:     50,
            initial_brightness: 50,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_level >= self.max_level {
            return Err(GestureError::InvalidConfig(format!(
                "min_level {} must be below max_level {}",
                self.min_level, self.max_level
            )));
        }
        let bounds = self.min_level..=self.max_level;
        if !bounds.contains(&self.initial_volume) || !bounds.contains(&self.initial_brightness) {
            return Err(GestureError::InvalidConfig(format!(
                "initial levels must lie in [{}, {}]",
                self.min_level, self.max_level
            )));
        }
        if self.thumb_margin.is_nan() || self.thumb_margin < 0.0 {
            return Err(GestureError::InvalidConfig(format!(
                "thumb_margin must be non-negative, got {}",
                self.thumb_margin
            )));
        }
        if self.max_hands == 0 {
            return Err(GestureError::InvalidConfig("max_hands must be at least 1".into()));
        }
        Ok(())
    }

    /// Clamp a level into `[min_level, max_level]`.
    pub fn clamp(&self, level: i32) -> u8 {
        level.clamp(self.min_level as i32, self.max_level as i32) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GestureConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.step, 2);
        assert_eq!(cfg.max_hands, 2);
        assert!((cfg.thumb_margin - 0.05).abs() < f32::EPSILON);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let cfg = GestureConfig { min_level: 80, max_level: 20, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(GestureError::InvalidConfig(_))));
    }

    #[test]
    fn initial_outside_bounds_rejected() {
        let cfg = GestureConfig { max_level: 40, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn nan_margin_rejected() {
        let cfg = GestureConfig { thumb_margin: f32::NAN, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn clamp_pins_to_bounds() {
        let cfg = GestureConfig::default();
        assert_eq!(cfg.clamp(-4), 0);
        assert_eq!(cfg.clamp(57), 57);
        assert_eq!(cfg.clamp(102), 100);
    }
}
