//! Windowless run: simulates frames at 60 Hz and prints overlay changes to
//! stdout, for automation and machines without a GPU.

use std::time::Duration;

use anyhow::Result;
use lexroom_engine::overlay::OverlaySink;
use lexroom_engine::render_loop::{FrameRenderer, FrameView};
use lexroom_engine::scene::InspectionDetail;
use lexroom_engine::{
    DialogueLine, DialogueScript, EngineConfig, NarrationBackend, RoomController, SceneLayout,
};

use crate::cli::Args;

pub const FRAME_STEP: Duration = Duration::from_micros(16_667);

/// Prints each overlay change as one line.
#[derive(Debug, Default)]
pub struct ConsoleOverlay {
    dialogue_shown: usize,
    last_status: String,
}

impl ConsoleOverlay {
    pub fn dialogue_shown(&self) -> usize {
        self.dialogue_shown
    }

    pub fn last_status(&self) -> &str {
        &self.last_status
    }
}

impl OverlaySink for ConsoleOverlay {
    fn show_dialogue(&mut self, line: &DialogueLine) {
        self.dialogue_shown += 1;
        println!("  {}: {}", line.speaker, line.text);
    }

    fn hide_dialogue(&mut self) {}

    fn show_inspection(&mut self, detail: &InspectionDetail) {
        println!("  [inspect] {}", detail.title);
        for line in &detail.lines {
            println!("      {line}");
        }
    }

    fn hide_inspection(&mut self) {
        println!("  [inspect] closed");
    }

    fn set_status(&mut self, status: &str) {
        if status != self.last_status {
            println!("[status] {status}");
            self.last_status = status.to_string();
        }
    }
}

/// Stands in for the GPU renderer; logs a frame summary once per second.
#[derive(Debug, Default)]
pub struct LoggingRenderer {
    draws: u64,
}

impl FrameRenderer for LoggingRenderer {
    type Error = std::convert::Infallible;

    fn draw(&mut self, frame: &FrameView<'_>) -> Result<(), Self::Error> {
        self.draws += 1;
        if frame.frame_index % 60 == 0 {
            let lit: f32 = frame.lights.lights().map(|(_, intensity)| intensity).sum();
            log::debug!(
                "frame {} at {:.2}s: {} meshes, eye ({:.2}, {:.2}, {:.2}), total light {lit:.2}",
                frame.frame_index,
                frame.elapsed.as_secs_f32(),
                frame.graph.meshes().count(),
                frame.eye.x,
                frame.eye.y,
                frame.eye.z,
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSummary {
    pub frames: u32,
    pub simulated: Duration,
    pub draws: u64,
    pub dialogue_shown: usize,
    pub narration_active: bool,
}

pub fn simulate<B: NarrationBackend>(
    room: &mut RoomController<B, ConsoleOverlay>,
    frames: u32,
) -> HeadlessSummary {
    let mut renderer = LoggingRenderer::default();
    for _ in 0..frames {
        match room.frame(FRAME_STEP, &mut renderer) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
    HeadlessSummary {
        frames,
        simulated: room.now(),
        draws: renderer.draws,
        dialogue_shown: room.overlay().dialogue_shown(),
        narration_active: room.narration().is_active(),
    }
}

pub fn run(args: &Args, config: EngineConfig, script: DialogueScript) -> Result<()> {
    let mut room = RoomController::new(
        config,
        &SceneLayout::investigation_room(),
        script,
        args.narration_backend(),
        ConsoleOverlay::default(),
    );
    if args.autoplay {
        room.start_narration_sequence();
    }
    let summary = simulate(&mut room, args.frames);
    println!(
        "Simulated {} frames ({:.1}s), {} draws, {} dialogue lines shown{}",
        summary.frames,
        summary.simulated.as_secs_f32(),
        summary.draws,
        summary.dialogue_shown,
        if summary.narration_active {
            "; narration still running"
        } else {
            ""
        }
    );
    println!("Final status: {}", room.overlay().last_status());
    room.teardown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexroom_engine::RecordingBackend;

    fn room(backend: RecordingBackend) -> RoomController<RecordingBackend, ConsoleOverlay> {
        RoomController::new(
            EngineConfig::default(),
            &SceneLayout::investigation_room(),
            DialogueScript::default(),
            backend,
            ConsoleOverlay::default(),
        )
    }

    #[test]
    fn default_frame_budget_covers_the_consultation() {
        let backend = RecordingBackend::new();
        let mut room = room(backend.clone());
        assert!(room.start_narration_sequence());

        let summary = simulate(&mut room, 2700);
        assert_eq!(summary.draws, 2700);
        assert!(!summary.narration_active);
        assert_eq!(summary.dialogue_shown, 7);
        assert_eq!(backend.spoken().len(), 7);
        assert_eq!(room.overlay().last_status(), "Meeting completed");
    }

    #[test]
    fn idle_room_only_reports_ready() {
        let mut room = room(RecordingBackend::new());
        let summary = simulate(&mut room, 30);
        assert_eq!(summary.dialogue_shown, 0);
        assert_eq!(room.overlay().last_status(), "Ready");
        assert!(summary.simulated >= Duration::from_millis(500));
    }
}
