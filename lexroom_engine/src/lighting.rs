//! Named light sources with recorded baselines, a global on/off switch and a
//! cosmetic flicker on one designated light while narration runs.

use glam::Vec3;
use serde::Serialize;

use crate::scene::rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LightKind {
    Ambient,
    Hemisphere,
    Point,
    Spot,
    Directional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    pub name: String,
    pub kind: LightKind,
    pub color: [f32; 3],
    /// Fully-on intensity.
    pub baseline: f32,
    pub position: Vec3,
    /// Aim point for spot lights; directional lights shine from `position`
    /// towards the origin.
    pub target: Vec3,
}

impl LightSource {
    pub fn new(name: &str, kind: LightKind, color: u32, baseline: f32) -> Self {
        LightSource {
            name: name.to_string(),
            kind,
            color: rgb(color),
            baseline,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn aimed_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

/// Stock lighting for the interview room.
pub fn room_lights() -> Vec<LightSource> {
    vec![
        LightSource::new("ambient", LightKind::Ambient, 0x404060, 0.6),
        LightSource::new("hemi", LightKind::Hemisphere, 0xbfeaff, 0.45).at(Vec3::new(0.0, 10.0, 0.0)),
        LightSource::new("main", LightKind::Point, 0xfff4e6, 1.8).at(Vec3::new(0.0, 6.0, 0.0)),
        LightSource::new("desk_lamp", LightKind::Spot, 0xffe4b5, 2.5)
            .at(Vec3::new(3.5, 3.5, -2.0))
            .aimed_at(Vec3::new(3.5, 1.2, -2.0)),
        LightSource::new("evidence", LightKind::Spot, 0xff9966, 1.8)
            .at(Vec3::new(-4.0, 4.5, -3.0))
            .aimed_at(Vec3::new(-4.0, 1.5, -3.0)),
        LightSource::new("rim1", LightKind::Directional, 0x4488ff, 1.0).at(Vec3::new(-5.0, 3.0, 5.0)),
        LightSource::new("rim2", LightKind::Directional, 0xff6644, 0.85).at(Vec3::new(5.0, 3.0, -5.0)),
    ]
}

pub fn flicker_factor(elapsed_secs: f32) -> f32 {
    0.95 + (elapsed_secs * 6.0).sin() * 0.05
}

#[derive(Debug, Clone)]
pub struct LightingController {
    lights: Vec<LightSource>,
    effective: Vec<f32>,
    enabled: bool,
    flicker: Option<usize>,
}

impl LightingController {
    pub fn new(lights: Vec<LightSource>, flicker_light: &str) -> Self {
        let flicker = lights.iter().position(|light| light.name == flicker_light);
        if flicker.is_none() {
            log::debug!("flicker light '{flicker_light}' not present; flicker disabled");
        }
        let effective = lights.iter().map(|light| light.baseline).collect();
        LightingController {
            lights,
            effective,
            enabled: true,
            flicker,
        }
    }

    /// Takes effect on the next `update`.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn update(&mut self, elapsed_secs: f32, narration_active: bool) {
        let factor = if self.enabled { 1.0 } else { 0.0 };
        for (index, (light, effective)) in self.lights.iter().zip(&mut self.effective).enumerate() {
            let mut intensity = light.baseline * factor;
            if narration_active && self.flicker == Some(index) {
                intensity *= flicker_factor(elapsed_secs);
            }
            *effective = intensity;
        }
    }

    pub fn intensity(&self, name: &str) -> Option<f32> {
        let index = self.lights.iter().position(|light| light.name == name)?;
        self.effective.get(index).copied()
    }

    pub fn lights(&self) -> impl ExactSizeIterator<Item = (&LightSource, f32)> {
        self.lights.iter().zip(self.effective.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> LightingController {
        LightingController::new(room_lights(), "desk_lamp")
    }

    #[test]
    fn disabling_zeroes_every_light() {
        let mut lights = controller();
        lights.set_enabled(false);
        lights.update(1.3, true);
        assert!(lights.lights().all(|(_, intensity)| intensity == 0.0));
    }

    #[test]
    fn toggle_pair_restores_baseline() {
        let mut lights = controller();
        lights.toggle();
        lights.update(0.5, false);
        lights.toggle();
        lights.update(0.5, false);
        for (light, intensity) in lights.lights() {
            assert_eq!(intensity, light.baseline, "{}", light.name);
        }
    }

    #[test]
    fn flicker_only_touches_designated_light() {
        let mut lights = controller();
        let t = 0.25;
        lights.update(t, true);
        let lamp = lights.intensity("desk_lamp").unwrap();
        assert!((lamp - 2.5 * flicker_factor(t)).abs() < 1e-6);
        assert_eq!(lights.intensity("main"), Some(1.8));

        lights.update(t, false);
        assert_eq!(lights.intensity("desk_lamp"), Some(2.5));
    }

    #[test]
    fn flicker_stays_within_five_percent() {
        for step in 0..200 {
            let factor = flicker_factor(step as f32 * 0.037);
            assert!((0.899..=1.001).contains(&factor), "{factor}");
        }
    }

    #[test]
    fn unknown_flicker_light_is_ignored() {
        let mut lights = LightingController::new(room_lights(), "chandelier");
        lights.update(0.25, true);
        assert_eq!(lights.intensity("desk_lamp"), Some(2.5));
        assert_eq!(lights.intensity("chandelier"), None);
    }
}
