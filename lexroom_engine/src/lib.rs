pub mod animation;
pub mod camera;
pub mod config;
pub mod controller;
pub mod deferred;
pub mod error;
pub mod lighting;
pub mod narration;
pub mod overlay;
pub mod picking;
pub mod render_loop;
pub mod scene;

pub use animation::{ActorState, AnimationDirector, Posture};
pub use camera::CameraRig;
pub use config::{load_engine_config, EngineConfig};
pub use controller::{InputEvent, KeyCommand, RoomController};
pub use error::{EngineError, Result};
pub use lighting::{LightKind, LightSource, LightingController};
pub use narration::{
    DialogueEntry, DialogueScript, NarrationBackend, RecordingBackend, SilentBackend,
    SpeechCommandBackend, Speaker, VoiceProfile,
};
pub use overlay::{DialogueLine, HudState, OverlaySink, RecordingOverlay, SharedHud};
pub use render_loop::{CountingRenderer, FrameRenderer, FrameView};
pub use scene::{ActorId, InspectableKind, InspectableMetadata, NodeId, SceneGraph, SceneLayout};
