//! Draw contract between the controller and whatever presents the room.

use std::time::Duration;

use glam::{Mat4, Vec3};

use crate::lighting::LightingController;
use crate::scene::{Environment, SceneGraph};

/// Everything a renderer needs for one frame. World matrices are already
/// current when a view is handed out.
pub struct FrameView<'a> {
    pub frame_index: u64,
    pub elapsed: Duration,
    pub graph: &'a SceneGraph,
    pub environment: &'a Environment,
    pub lights: &'a LightingController,
    pub eye: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl FrameView<'_> {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Receives exactly one `draw` per controller frame.
pub trait FrameRenderer {
    type Error;

    fn draw(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error>;
}

/// Counts frames and meshes without presenting anything.
#[derive(Debug, Clone, Default)]
pub struct CountingRenderer {
    pub draws: u64,
    pub last_frame: Option<u64>,
    pub last_mesh_count: usize,
    pub last_light_total: f32,
}

impl FrameRenderer for CountingRenderer {
    type Error = std::convert::Infallible;

    fn draw(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error> {
        self.draws += 1;
        self.last_frame = Some(frame.frame_index);
        self.last_mesh_count = frame.graph.meshes().count();
        self.last_light_total = frame.lights.lights().map(|(_, intensity)| intensity).sum();
        Ok(())
    }
}
