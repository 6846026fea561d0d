//! Orbit camera with exponential smoothing and a timed focus override.

use std::time::Duration;

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraSettings;
use crate::scene::NodeId;

/// Eased camera move towards an inspected object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusTransition {
    pub target: NodeId,
    pub look_at: Vec3,
    pub from: Vec3,
    pub to: Vec3,
    pub started: Duration,
    pub release_at: Duration,
}

impl FocusTransition {
    pub fn progress(&self, now: Duration, ease: Duration) -> f32 {
        let elapsed = now.saturating_sub(self.started).as_secs_f32();
        (elapsed / ease.as_secs_f32().max(f32::EPSILON)).min(1.0)
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(3)
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    settings: CameraSettings,
    distance: f32,
    orbit_angle: f32,
    pointer: Vec2,
    eye: Vec3,
    look_at: Vec3,
    aspect: f32,
    focus: Option<FocusTransition>,
}

impl CameraRig {
    pub fn new(settings: &CameraSettings) -> Self {
        let distance = settings.clamp_distance(settings.initial_distance);
        CameraRig {
            settings: settings.clone(),
            distance,
            orbit_angle: 0.0,
            pointer: Vec2::ZERO,
            eye: Vec3::new(0.0, settings.base_height, distance),
            look_at: settings.look_at(),
            aspect: 16.0 / 9.0,
            focus: None,
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn orbit_angle(&self) -> f32 {
        self.orbit_angle
    }

    pub fn pointer_influence(&self) -> Vec2 {
        self.pointer
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn focus(&self) -> Option<&FocusTransition> {
        self.focus.as_ref()
    }

    pub fn is_focused(&self) -> bool {
        self.focus.is_some()
    }

    /// Pointer deltas in normalized device units. Still tracked while focused,
    /// but the influence only steers the camera once orbit resumes.
    pub fn apply_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.pointer = (self.pointer + Vec2::new(dx, dy)).clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Wheel input. Ignored while focused.
    pub fn apply_zoom_delta(&mut self, delta_y: f32) {
        if self.is_focused() {
            return;
        }
        self.distance = self
            .settings
            .clamp_distance(self.distance + delta_y * self.settings.zoom_sensitivity);
    }

    pub fn zoom_in(&mut self) {
        self.distance = self
            .settings
            .clamp_distance(self.distance - self.settings.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.distance = self
            .settings
            .clamp_distance(self.distance + self.settings.zoom_step);
    }

    pub fn rotate(&mut self, step_radians: f32) {
        self.orbit_angle += step_radians;
    }

    pub fn reset(&mut self) {
        self.distance = self.settings.clamp_distance(self.settings.initial_distance);
        self.orbit_angle = 0.0;
        self.focus = None;
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    /// Starts (or restarts) a focus transition from the current eye position.
    /// A transition already in flight is replaced, not queued.
    pub fn focus_on(&mut self, target: NodeId, position: Vec3, now: Duration) {
        self.focus = Some(FocusTransition {
            target,
            look_at: position,
            from: self.eye,
            to: position + self.settings.focus_offset(),
            started: now,
            release_at: now + Duration::from_millis(self.settings.focus_hold_ms),
        });
    }

    /// Advances one frame. Returns the released target when a focus hold expires.
    pub fn update(&mut self, now: Duration) -> Option<NodeId> {
        if let Some(focus) = self.focus {
            if now >= focus.release_at {
                self.focus = None;
                self.orbit_step();
                return Some(focus.target);
            }
            let ease = Duration::from_millis(self.settings.focus_ease_ms);
            let eased = ease_out_cubic(focus.progress(now, ease));
            self.eye = focus.from.lerp(focus.to, eased);
            self.look_at = focus.look_at;
            return None;
        }
        self.orbit_step();
        None
    }

    fn orbit_step(&mut self) {
        let settings = &self.settings;
        let angle = self.orbit_angle + self.pointer.x * settings.pointer_orbit_scale;
        let height = settings.base_height + self.pointer.y * settings.pointer_height_scale;
        let desired = Vec3::new(angle.sin() * self.distance, height, angle.cos() * self.distance);
        self.eye += (desired - self.eye) * settings.damping;
        self.look_at = settings.look_at();
    }

    /// Zero-sized surfaces are ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.look_at, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.settings.fov_degrees.to_radians(),
            self.aspect,
            self.settings.near.max(1e-4),
            self.settings.far.max(self.settings.near + 1.0),
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
