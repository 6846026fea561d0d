//! Tunables for the room engine. Every field has a default matching the
//! stock investigation room, so a config file only needs the values it
//! overrides.

use std::{fs, path::Path};

use glam::Vec3;
use serde::Deserialize;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub initial_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Distance change per unit of wheel delta.
    pub zoom_sensitivity: f32,
    /// Per-frame exponential smoothing factor towards the orbit target.
    pub damping: f32,
    pub zoom_step: f32,
    pub key_rotate_step: f32,
    pub button_rotate_step: f32,
    pub pointer_orbit_scale: f32,
    pub pointer_height_scale: f32,
    pub base_height: f32,
    pub look_at: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Camera offset from an inspected object's position.
    pub focus_offset: [f32; 3],
    pub focus_ease_ms: u64,
    pub focus_hold_ms: u64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            initial_distance: 8.0,
            min_distance: 5.0,
            max_distance: 20.0,
            zoom_sensitivity: 0.01,
            damping: 0.08,
            zoom_step: 1.0,
            key_rotate_step: 0.12,
            button_rotate_step: 0.15,
            pointer_orbit_scale: 0.4,
            pointer_height_scale: 2.0,
            base_height: 2.5,
            look_at: [0.0, 1.5, 0.0],
            fov_degrees: 65.0,
            near: 0.1,
            far: 1000.0,
            focus_offset: [0.0, 1.5, 1.0],
            focus_ease_ms: 1000,
            focus_hold_ms: 5000,
        }
    }
}

impl CameraSettings {
    pub fn look_at(&self) -> Vec3 {
        Vec3::from_array(self.look_at)
    }

    pub fn focus_offset(&self) -> Vec3 {
        Vec3::from_array(self.focus_offset)
    }

    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Pause between one entry finishing and the next one starting.
    pub settle_ms: u64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self { settle_ms: 1000 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub posture_damping: f32,
    /// Phase advance per second while an actor is talking.
    pub talk_rate: f32,
    pub sitting_height: f32,
    pub standing_height: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            posture_damping: 0.05,
            talk_rate: 10.0,
            sitting_height: 0.6,
            standing_height: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub camera: CameraSettings,
    pub narration: NarrationSettings,
    pub animation: AnimationSettings,
    /// Spacing between focus requests issued by the inspectable tour.
    pub tour_interval_ms: u64,
    /// Light that flickers while narration is running.
    pub flicker_light: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            narration: NarrationSettings::default(),
            animation: AnimationSettings::default(),
            tour_interval_ms: 2000,
            flicker_light: String::from("desk_lamp"),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(data).map_err(|source| EngineError::Json {
            what: String::from("engine config"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if camera.min_distance > camera.max_distance {
            return Err(EngineError::DistanceBounds {
                min: camera.min_distance,
                max: camera.max_distance,
            });
        }
        if !(camera.min_distance..=camera.max_distance).contains(&camera.initial_distance) {
            return Err(EngineError::InitialDistance {
                value: camera.initial_distance,
                min: camera.min_distance,
                max: camera.max_distance,
            });
        }
        if camera.damping <= 0.0 || camera.damping > 1.0 {
            return Err(EngineError::NonPositive {
                name: "camera.damping",
                value: camera.damping,
            });
        }
        if camera.fov_degrees <= 0.0 {
            return Err(EngineError::NonPositive {
                name: "camera.fov_degrees",
                value: camera.fov_degrees,
            });
        }
        if camera.focus_ease_ms == 0 {
            return Err(EngineError::NonPositive {
                name: "camera.focus_ease_ms",
                value: 0.0,
            });
        }
        if self.animation.posture_damping <= 0.0 {
            return Err(EngineError::NonPositive {
                name: "animation.posture_damping",
                value: self.animation.posture_damping,
            });
        }
        Ok(())
    }
}

pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    let data = fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    EngineConfig::from_json_str(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = EngineConfig::from_json_str("{}").expect("defaults parse");
        assert_eq!(config.camera.initial_distance, 8.0);
        assert_eq!(config.camera.max_distance, 20.0);
        assert_eq!(config.narration.settle_ms, 1000);
        assert_eq!(config.flicker_light, "desk_lamp");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"camera": {"max_distance": 30.0}, "tour_interval_ms": 500}"#)
                .expect("partial config parses");
        assert_eq!(config.camera.max_distance, 30.0);
        assert_eq!(config.camera.min_distance, 5.0);
        assert_eq!(config.tour_interval_ms, 500);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = EngineConfig::from_json_str(
            r#"{"camera": {"min_distance": 12.0, "max_distance": 6.0, "initial_distance": 8.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::DistanceBounds { .. }), "{err}");
    }

    #[test]
    fn initial_distance_must_sit_inside_bounds() {
        let err = EngineConfig::from_json_str(r#"{"camera": {"initial_distance": 40.0}}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::InitialDistance { .. }), "{err}");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_engine_config(Path::new("/nonexistent/lexroom.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lexroom.json"));
    }
}
