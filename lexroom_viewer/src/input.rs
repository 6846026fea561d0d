//! Translates winit window events into room commands.

use lexroom_engine::{ActorId, InputEvent, KeyCommand};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::MouseScrollDelta;
use winit::keyboard::{Key, NamedKey};

/// Wheel pixels per scrolled line, matching browser-style deltas.
const LINE_SCROLL_PIXELS: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerAction {
    Room(InputEvent),
    StartNarration,
    TogglePosture(ActorId),
    ShowAllInspectables,
    ResetCamera,
    CloseInspection,
    Exit,
}

/// Engine key bindings first, then viewer-only shortcuts.
pub fn action_for_key(key: &Key) -> Option<ViewerAction> {
    let name = match key {
        Key::Named(NamedKey::ArrowLeft) => "ArrowLeft",
        Key::Named(NamedKey::ArrowRight) => "ArrowRight",
        Key::Named(NamedKey::Escape) => return Some(ViewerAction::Exit),
        Key::Named(NamedKey::Space) => return Some(ViewerAction::StartNarration),
        Key::Character(text) => text.as_str(),
        _ => return None,
    };
    if let Some(command) = KeyCommand::from_key_name(name) {
        return Some(ViewerAction::Room(InputEvent::Key(command)));
    }
    match name.to_ascii_lowercase().as_str() {
        "n" => Some(ViewerAction::StartNarration),
        "1" => Some(ViewerAction::TogglePosture(ActorId::Lawyer)),
        "2" => Some(ViewerAction::TogglePosture(ActorId::Client)),
        "a" => Some(ViewerAction::ShowAllInspectables),
        "r" => Some(ViewerAction::ResetCamera),
        "c" => Some(ViewerAction::CloseInspection),
        _ => None,
    }
}

pub const KEY_HELP: &[&str] = &[
    "mouse      orbit / wheel zoom / click to inspect",
    "L          toggle lights",
    "+ / -      zoom",
    "<- / ->    rotate",
    "N, Space   start consultation",
    "1 / 2      lawyer / client stand or sit",
    "A          show all evidence",
    "R          reset camera",
    "C          close inspection panel",
    "Esc        quit",
];

/// Tracks the cursor so absolute positions become orbit deltas.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    position: Option<PhysicalPosition<f64>>,
    last_ndc: Option<(f32, f32)>,
}

impl PointerTracker {
    /// Records a cursor move and returns the change in normalized device
    /// coordinates since the previous one. The first move is measured from
    /// the window centre.
    pub fn moved(
        &mut self,
        position: PhysicalPosition<f64>,
        window: PhysicalSize<u32>,
    ) -> Option<InputEvent> {
        self.position = Some(position);
        if window.width == 0 || window.height == 0 {
            return None;
        }
        let x = position.x as f32 / window.width as f32 * 2.0 - 1.0;
        let y = -(position.y as f32 / window.height as f32) * 2.0 + 1.0;
        let (last_x, last_y) = self.last_ndc.unwrap_or((0.0, 0.0));
        self.last_ndc = Some((x, y));
        Some(InputEvent::PointerMoved {
            dx: x - last_x,
            dy: y - last_y,
        })
    }

    pub fn click(&self) -> Option<InputEvent> {
        self.position.map(|position| InputEvent::Click {
            x: position.x as f32,
            y: position.y as f32,
        })
    }
}

/// Positive deltas zoom out, as scrolling towards the user does.
pub fn wheel_event(delta: MouseScrollDelta) -> InputEvent {
    let delta_y = match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_SCROLL_PIXELS,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    };
    InputEvent::Wheel { delta_y }
}
