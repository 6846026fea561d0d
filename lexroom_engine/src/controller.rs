//! The room's imperative surface. A host owns one `RoomController`, feeds it
//! input events between frames and calls `frame` once per display refresh.

use std::time::Duration;

use glam::Vec3;

use crate::animation::{apply_poses, AnimationDirector, Posture, PropEffects};
use crate::camera::CameraRig;
use crate::config::EngineConfig;
use crate::deferred::DeferredQueue;
use crate::lighting::LightingController;
use crate::narration::{DialogueScript, NarrationBackend, NarrationSequencer, Stage};
use crate::overlay::OverlaySink;
use crate::picking::{self, screen_to_ndc, Ray};
use crate::render_loop::{FrameRenderer, FrameView};
use crate::scene::{ActorId, BuiltScene, InspectionDetail, NodeId, SceneBuilder, SceneLayout};

const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

/// Discrete key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    ToggleLights,
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
}

impl KeyCommand {
    /// Maps a logical key name (`"l"`, `"+"`, `"ArrowLeft"`, ...) to a command.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "l" | "L" => Some(KeyCommand::ToggleLights),
            "+" | "=" => Some(KeyCommand::ZoomIn),
            "-" | "_" => Some(KeyCommand::ZoomOut),
            "ArrowLeft" => Some(KeyCommand::RotateLeft),
            "ArrowRight" => Some(KeyCommand::RotateRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer movement in normalized device units.
    PointerMoved { dx: f32, dy: f32 },
    Wheel { delta_y: f32 },
    /// Click in pixels, origin top-left.
    Click { x: f32, y: f32 },
    Key(KeyCommand),
    Resized { width: u32, height: u32 },
}

pub struct RoomController<B, O> {
    config: EngineConfig,
    scene: BuiltScene,
    camera: CameraRig,
    animation: AnimationDirector,
    lighting: LightingController,
    narration: NarrationSequencer,
    tour: DeferredQueue<NodeId>,
    pending_input: Vec<InputEvent>,
    backend: B,
    overlay: O,
    viewport: (u32, u32),
    now: Duration,
    frame_index: u64,
}

impl<B, O> RoomController<B, O>
where
    B: NarrationBackend,
    O: OverlaySink,
{
    pub fn new(
        config: EngineConfig,
        layout: &SceneLayout,
        script: DialogueScript,
        backend: B,
        mut overlay: O,
    ) -> Self {
        let scene = SceneBuilder::new(layout).build();
        let mut camera = CameraRig::new(&config.camera);
        camera.set_viewport(DEFAULT_VIEWPORT.0, DEFAULT_VIEWPORT.1);
        let animation = AnimationDirector::new(&config.animation, &scene.actors);
        let lighting = LightingController::new(scene.lights.clone(), &config.flicker_light);
        let narration = NarrationSequencer::new(
            script,
            Duration::from_millis(config.narration.settle_ms),
        );
        overlay.set_status("Ready");
        log::info!(
            "room ready: {} nodes, {} inspectables, {} lights",
            scene.graph.len(),
            scene.graph.inspectables().len(),
            scene.lights.len()
        );
        RoomController {
            config,
            scene,
            camera,
            animation,
            lighting,
            narration,
            tour: DeferredQueue::new(),
            pending_input: Vec::new(),
            backend,
            overlay,
            viewport: DEFAULT_VIEWPORT,
            now: Duration::ZERO,
            frame_index: 0,
        }
    }

    pub fn scene(&self) -> &BuiltScene {
        &self.scene
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn animation(&self) -> &AnimationDirector {
        &self.animation
    }

    pub fn lighting(&self) -> &LightingController {
        &self.lighting
    }

    pub fn narration(&self) -> &NarrationSequencer {
        &self.narration
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Focus targets still waiting in the inspectable tour.
    pub fn pending_tour(&self) -> usize {
        self.tour.len()
    }

    /// Queues an input event. Events apply at the start of the next frame.
    pub fn handle_input(&mut self, event: InputEvent) {
        self.pending_input.push(event);
    }

    /// Runs one frame: input, timers, camera, actors, lights, then a single draw.
    pub fn frame<R>(&mut self, dt: Duration, renderer: &mut R) -> Result<(), R::Error>
    where
        R: FrameRenderer,
    {
        self.now += dt;
        self.frame_index += 1;
        let now = self.now;
        let elapsed = now.as_secs_f32();

        for event in std::mem::take(&mut self.pending_input) {
            self.apply_input(event);
        }

        let mut stage = Stage {
            backend: &mut self.backend,
            overlay: &mut self.overlay,
            animation: &mut self.animation,
        };
        self.narration.tick(now, &mut stage);

        while let Some(stop) = self.tour.pop_due(now) {
            self.inspect(stop.task);
        }

        if let Some(released) = self.camera.update(now) {
            log::debug!("focus on node {} released", released.index());
            self.overlay.hide_inspection();
        }

        let narrating = self.narration.is_active();
        let poses = self.animation.advance(dt.as_secs_f32(), elapsed);
        self.lighting.update(elapsed, narrating);
        apply_poses(
            &mut self.scene.graph,
            &self.scene.actors,
            &poses,
            &self.scene.props,
            PropEffects::at(elapsed, narrating),
        );
        self.scene.graph.update_world();

        let view = FrameView {
            frame_index: self.frame_index,
            elapsed: now,
            graph: &self.scene.graph,
            environment: &self.scene.environment,
            lights: &self.lighting,
            eye: self.camera.eye(),
            view: self.camera.view(),
            projection: self.camera.projection(),
        };
        renderer.draw(&view)
    }

    fn apply_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved { dx, dy } => self.camera.apply_pointer_delta(dx, dy),
            InputEvent::Wheel { delta_y } => self.camera.apply_zoom_delta(delta_y),
            InputEvent::Click { x, y } => {
                self.pick_at(x, y);
            }
            InputEvent::Key(command) => self.run_key(command),
            InputEvent::Resized { width, height } => self.resize(width, height),
        }
    }

    fn run_key(&mut self, command: KeyCommand) {
        let step = self.config.camera.key_rotate_step;
        match command {
            KeyCommand::ToggleLights => self.toggle_lights(),
            KeyCommand::ZoomIn => self.zoom_in(),
            KeyCommand::ZoomOut => self.zoom_out(),
            KeyCommand::RotateLeft => self.camera.rotate(-step),
            KeyCommand::RotateRight => self.camera.rotate(step),
        }
    }

    /// Zero-sized surfaces (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.camera.set_viewport(width, height) {
            self.viewport = (width, height);
        } else {
            log::debug!("ignoring resize to {width}x{height}");
        }
    }

    /// World ray under a pixel position with the current camera.
    pub fn ray_at(&self, x: f32, y: f32) -> Option<Ray> {
        let ndc = screen_to_ndc(x, y, self.viewport.0, self.viewport.1)?;
        Ray::from_ndc(ndc, self.camera.view_projection())
    }

    /// Resolves a click and focuses the inspectable under it. Misses change nothing.
    pub fn pick_at(&mut self, x: f32, y: f32) -> Option<NodeId> {
        let ray = self.ray_at(x, y)?;
        let Some(target) = picking::pick(&self.scene.graph, &ray) else {
            log::debug!("click at ({x:.0}, {y:.0}) hit nothing inspectable");
            return None;
        };
        self.inspect(target).then_some(target)
    }

    fn inspect(&mut self, target: NodeId) -> bool {
        let (Some(metadata), Some(position)) = (
            self.scene.graph.metadata(target).cloned(),
            self.scene.graph.world_position(target),
        ) else {
            return false;
        };
        self.camera.focus_on(target, position, self.now);
        self.overlay
            .show_inspection(&InspectionDetail::for_metadata(&metadata));
        self.overlay
            .set_status(&format!("Viewing: {}", metadata.label()));
        log::info!("inspecting {} ({})", metadata.label(), metadata.kind.as_str());
        true
    }

    /// Focuses `target` directly, as if it had been clicked.
    pub fn focus_inspectable(&mut self, target: NodeId) -> bool {
        self.inspect(target)
    }

    pub fn start_narration_sequence(&mut self) -> bool {
        let mut stage = Stage {
            backend: &mut self.backend,
            overlay: &mut self.overlay,
            animation: &mut self.animation,
        };
        self.narration.start(self.now, &mut stage)
    }

    pub fn toggle_actor_posture(&mut self, actor: ActorId) -> Option<Posture> {
        let posture = self.animation.toggle_posture(actor)?;
        let label = match posture {
            Posture::Standing => "standing",
            Posture::Sitting => "sitting",
        };
        self.overlay
            .set_status(&format!("{} {label}", actor.name()));
        Some(posture)
    }

    /// Focuses every inspectable in creation order, one per tour interval.
    /// Starting a new tour replaces any stops still pending.
    pub fn show_all_inspectables(&mut self) -> usize {
        self.tour.clear();
        let interval = Duration::from_millis(self.config.tour_interval_ms);
        let targets: Vec<NodeId> = self
            .scene
            .graph
            .inspectables()
            .map(|(id, _)| id)
            .collect();
        for (step, target) in targets.iter().enumerate() {
            self.tour.schedule(self.now + interval * step as u32, *target);
        }
        self.overlay.set_status(&format!(
            "Displaying all evidence ({} items)",
            targets.len()
        ));
        targets.len()
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
        self.overlay.hide_inspection();
        self.overlay.set_status("Camera reset");
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
        self.overlay.set_status("Zoomed In");
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
        self.overlay.set_status("Zoomed Out");
    }

    pub fn rotate_left(&mut self) {
        self.camera.rotate(-self.config.camera.button_rotate_step);
        self.overlay.set_status("Rotated Left");
    }

    pub fn rotate_right(&mut self) {
        self.camera.rotate(self.config.camera.button_rotate_step);
        self.overlay.set_status("Rotated Right");
    }

    pub fn toggle_lights(&mut self) {
        let on = self.lighting.toggle();
        self.overlay
            .set_status(if on { "Lights On" } else { "Lights Off" });
    }

    /// Hides the detail panel. The camera keeps whatever focus it has.
    pub fn close_inspection(&mut self) {
        self.overlay.hide_inspection();
    }

    /// Where the camera is heading while a focus transition runs.
    pub fn focus_target(&self) -> Option<(NodeId, Vec3)> {
        self.camera.focus().map(|focus| (focus.target, focus.to))
    }

    /// Cancels timers, silences the voice backend and hands the collaborators
    /// back to the host. Scene resources drop with the controller.
    pub fn teardown(mut self) -> (B, O) {
        self.narration.abort();
        self.tour.clear();
        self.pending_input.clear();
        self.animation.silence_all();
        self.backend.stop();
        log::info!("room torn down after {} frames", self.frame_index);
        (self.backend, self.overlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::RecordingBackend;
    use crate::overlay::RecordingOverlay;
    use crate::render_loop::CountingRenderer;

    fn controller() -> RoomController<RecordingBackend, RecordingOverlay> {
        RoomController::new(
            EngineConfig::default(),
            &SceneLayout::investigation_room(),
            DialogueScript::default(),
            RecordingBackend::new(),
            RecordingOverlay::new(),
        )
    }

    #[test]
    fn key_names_cover_aliases() {
        assert_eq!(KeyCommand::from_key_name("L"), Some(KeyCommand::ToggleLights));
        assert_eq!(KeyCommand::from_key_name("="), Some(KeyCommand::ZoomIn));
        assert_eq!(KeyCommand::from_key_name("_"), Some(KeyCommand::ZoomOut));
        assert_eq!(KeyCommand::from_key_name("ArrowRight"), Some(KeyCommand::RotateRight));
        assert_eq!(KeyCommand::from_key_name("x"), None);
    }

    #[test]
    fn input_applies_on_next_frame() {
        let mut room = controller();
        let mut renderer = CountingRenderer::default();
        room.handle_input(InputEvent::Key(KeyCommand::RotateLeft));
        room.handle_input(InputEvent::Wheel { delta_y: 300.0 });
        assert_eq!(room.camera().orbit_angle(), 0.0);

        room.frame(Duration::from_millis(16), &mut renderer).unwrap();
        assert!((room.camera().orbit_angle() + 0.12).abs() < 1e-6);
        assert!((room.camera().distance() - 11.0).abs() < 1e-5);
    }

    #[test]
    fn posture_status_names_actor() {
        let mut room = controller();
        assert_eq!(room.toggle_actor_posture(ActorId::Client), Some(Posture::Standing));
        assert_eq!(room.overlay().last_status().as_deref(), Some("Client standing"));
        room.toggle_actor_posture(ActorId::Client);
        assert_eq!(room.overlay().last_status().as_deref(), Some("Client sitting"));
    }

    #[test]
    fn button_rotation_uses_wider_step() {
        let mut room = controller();
        room.rotate_right();
        room.rotate_right();
        room.rotate_left();
        assert!((room.camera().orbit_angle() - 0.15).abs() < 1e-6);
        assert_eq!(room.overlay().last_status().as_deref(), Some("Rotated Left"));
    }

    #[test]
    fn focus_inspectable_sets_status_and_panel() {
        let mut room = controller();
        let document = room.scene().documents[0];
        assert!(room.focus_inspectable(document));
        assert!(room.camera().is_focused());
        let status = room.overlay().last_status().unwrap();
        assert!(status.starts_with("Viewing: "), "{status}");

        room.reset_camera();
        assert!(!room.camera().is_focused());
        assert_eq!(room.overlay().last_status().as_deref(), Some("Camera reset"));
    }

    #[test]
    fn tour_is_replaced_not_stacked() {
        let mut room = controller();
        let count = room.show_all_inspectables();
        assert_eq!(count, 18);
        assert_eq!(room.pending_tour(), 18);
        room.show_all_inspectables();
        assert_eq!(room.pending_tour(), 18);
        assert_eq!(
            room.overlay().last_status().as_deref(),
            Some("Displaying all evidence (18 items)")
        );
    }

    #[test]
    fn zero_resize_keeps_viewport() {
        let mut room = controller();
        room.resize(0, 0);
        assert_eq!(room.viewport(), DEFAULT_VIEWPORT);
        room.resize(800, 600);
        assert_eq!(room.viewport(), (800, 600));
    }
}
