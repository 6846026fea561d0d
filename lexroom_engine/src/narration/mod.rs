//! Scripted dialogue playback. Entries play strictly in order; each one sets
//! its speaker talking, hands the text to the voice backend and the overlay,
//! and after its duration plus a settle pause hands over to the next.

mod backend;

pub use backend::{
    NarrationBackend, NarrationCall, RecordingBackend, SilentBackend, SpeechCommandBackend,
    VoiceShape,
};

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::animation::AnimationDirector;
use crate::deferred::DeferredQueue;
use crate::error::{EngineError, Result};
use crate::overlay::{DialogueLine, OverlaySink};
use crate::scene::ActorId;

pub const STATUS_STARTED: &str = "Meeting in progress...";
pub const STATUS_COMPLETED: &str = "Meeting completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceProfile {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Lawyer,
    Client,
    System,
}

impl Speaker {
    pub fn actor(self) -> Option<ActorId> {
        match self {
            Speaker::Lawyer => Some(ActorId::Lawyer),
            Speaker::Client => Some(ActorId::Client),
            Speaker::System => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Speaker::Lawyer => "Lawyer",
            Speaker::Client => "Client",
            Speaker::System => "System",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub speaker: Speaker,
    pub text: String,
    pub duration_ms: u64,
    pub voice: VoiceProfile,
}

impl DialogueEntry {
    pub fn new(speaker: Speaker, text: &str, duration_ms: u64, voice: VoiceProfile) -> Self {
        DialogueEntry {
            speaker,
            text: text.to_string(),
            duration_ms,
            voice,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Ordered, non-empty list of dialogue entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueScript {
    entries: Vec<DialogueEntry>,
}

impl Default for DialogueScript {
    fn default() -> Self {
        Self::consultation()
    }
}

impl DialogueScript {
    pub fn new(entries: Vec<DialogueEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(EngineError::EmptyScript);
        }
        if let Some(index) = entries.iter().position(|entry| entry.duration_ms == 0) {
            return Err(EngineError::ZeroDuration { index });
        }
        Ok(DialogueScript { entries })
    }

    /// The stock seven-line client consultation.
    pub fn consultation() -> Self {
        use Speaker::{Client, Lawyer};
        use VoiceProfile::{Female, Male};
        DialogueScript {
            entries: vec![
                DialogueEntry::new(
                    Lawyer,
                    "Good morning. Please have a seat. Let me review your case file.",
                    4000,
                    Male,
                ),
                DialogueEntry::new(
                    Client,
                    "Thank you for taking my case. I am very worried about the charges against me.",
                    5000,
                    Female,
                ),
                DialogueEntry::new(
                    Lawyer,
                    "I understand your concern. Looking at the evidence here, we have several strong points for your defense.",
                    6000,
                    Male,
                ),
                DialogueEntry::new(
                    Client,
                    "What are our chances? The prosecutor seems very confident.",
                    4000,
                    Female,
                ),
                DialogueEntry::new(
                    Lawyer,
                    "Based on these witness statements and the forensic evidence, I believe we can establish reasonable doubt. The timeline doesn't match the prosecution's theory.",
                    7000,
                    Male,
                ),
                DialogueEntry::new(
                    Client,
                    "That's reassuring. What are our next steps?",
                    3500,
                    Female,
                ),
                DialogueEntry::new(
                    Lawyer,
                    "We need to interview these witnesses listed here, gather additional surveillance footage, and prepare your testimony. I am recording this consultation for our records.",
                    8000,
                    Male,
                ),
            ],
        }
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let entries: Vec<DialogueEntry> =
            serde_json::from_str(data).map_err(|source| EngineError::Json {
                what: String::from("dialogue script"),
                source,
            })?;
        Self::new(entries)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn entries(&self) -> &[DialogueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    Play(usize),
    Finish(usize),
}

/// Collaborators touched while a sequence plays.
pub struct Stage<'a, B: ?Sized, O: ?Sized> {
    pub backend: &'a mut B,
    pub overlay: &'a mut O,
    pub animation: &'a mut AnimationDirector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NarrationState {
    pub active: bool,
    pub current_index: usize,
}

#[derive(Debug, Clone)]
pub struct NarrationSequencer {
    script: DialogueScript,
    settle: Duration,
    state: NarrationState,
    cues: DeferredQueue<Cue>,
    /// Start time of each entry in the current run, for diagnostics and tests.
    started_at: Vec<Duration>,
}

impl NarrationSequencer {
    pub fn new(script: DialogueScript, settle: Duration) -> Self {
        NarrationSequencer {
            script,
            settle,
            state: NarrationState {
                active: false,
                current_index: 0,
            },
            cues: DeferredQueue::new(),
            started_at: Vec::new(),
        }
    }

    pub fn script(&self) -> &DialogueScript {
        &self.script
    }

    pub fn state(&self) -> NarrationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn entry_start_times(&self) -> &[Duration] {
        &self.started_at
    }

    /// Begins the script. Returns false (and does nothing) while a run is active.
    pub fn start<B, O>(&mut self, now: Duration, stage: &mut Stage<'_, B, O>) -> bool
    where
        B: NarrationBackend + ?Sized,
        O: OverlaySink + ?Sized,
    {
        if self.state.active {
            log::debug!("narration already running; start ignored");
            return false;
        }
        self.state = NarrationState {
            active: true,
            current_index: 0,
        };
        self.started_at.clear();
        stage.overlay.set_status(STATUS_STARTED);
        log::info!("narration started ({} entries)", self.script.len());
        self.play(0, now, stage);
        true
    }

    /// Fires every cue due at or before `now`, in order.
    pub fn tick<B, O>(&mut self, now: Duration, stage: &mut Stage<'_, B, O>)
    where
        B: NarrationBackend + ?Sized,
        O: OverlaySink + ?Sized,
    {
        while let Some(cue) = self.cues.pop_due(now) {
            match cue.task {
                Cue::Play(index) => self.play(index, cue.due, stage),
                Cue::Finish(index) => {
                    stage.animation.silence_all();
                    let next = index + 1;
                    if next < self.script.len() {
                        self.cues.schedule(cue.due + self.settle, Cue::Play(next));
                    } else {
                        self.complete(stage);
                    }
                }
            }
        }
    }

    /// Drops pending cues and marks the run inactive without reporting completion.
    pub fn abort(&mut self) {
        self.cues.clear();
        self.state.active = false;
    }

    fn play<B, O>(&mut self, index: usize, due: Duration, stage: &mut Stage<'_, B, O>)
    where
        B: NarrationBackend + ?Sized,
        O: OverlaySink + ?Sized,
    {
        let Some(entry) = self.script.entries.get(index) else {
            self.complete(stage);
            return;
        };
        self.state.current_index = index;
        self.started_at.push(due);
        log::info!(
            "narration {}/{} {}: {}",
            index + 1,
            self.script.len(),
            entry.speaker.name(),
            entry.text
        );

        stage.overlay.show_dialogue(&DialogueLine {
            speaker: entry.speaker.name().to_string(),
            text: entry.text.clone(),
        });
        stage.backend.speak(&entry.text, entry.voice);
        match entry.speaker.actor() {
            Some(actor) => {
                stage.animation.set_talking(actor, true);
                stage.animation.set_talking(actor.other(), false);
            }
            None => stage.animation.silence_all(),
        }
        self.cues.schedule(due + entry.duration(), Cue::Finish(index));
    }

    fn complete<B, O>(&mut self, stage: &mut Stage<'_, B, O>)
    where
        B: NarrationBackend + ?Sized,
        O: OverlaySink + ?Sized,
    {
        self.cues.clear();
        self.state.active = false;
        stage.animation.silence_all();
        stage.overlay.hide_dialogue();
        stage.overlay.set_status(STATUS_COMPLETED);
        log::info!("narration completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnimationSettings;
    use crate::overlay::{OverlayEvent, RecordingOverlay};
    use crate::scene::{SceneBuilder, SceneLayout};

    struct Harness {
        backend: RecordingBackend,
        overlay: RecordingOverlay,
        animation: AnimationDirector,
        sequencer: NarrationSequencer,
    }

    impl Harness {
        fn new(script: DialogueScript) -> Self {
            let scene = SceneBuilder::new(&SceneLayout::investigation_room()).build();
            Harness {
                backend: RecordingBackend::new(),
                overlay: RecordingOverlay::new(),
                animation: AnimationDirector::new(&AnimationSettings::default(), &scene.actors),
                sequencer: NarrationSequencer::new(script, Duration::from_millis(1000)),
            }
        }

        fn start(&mut self, now_ms: u64) -> bool {
            let mut stage = Stage {
                backend: &mut self.backend,
                overlay: &mut self.overlay,
                animation: &mut self.animation,
            };
            self.sequencer.start(Duration::from_millis(now_ms), &mut stage)
        }

        fn tick(&mut self, now_ms: u64) {
            let mut stage = Stage {
                backend: &mut self.backend,
                overlay: &mut self.overlay,
                animation: &mut self.animation,
            };
            self.sequencer.tick(Duration::from_millis(now_ms), &mut stage);
        }
    }

    fn short_script() -> DialogueScript {
        DialogueScript::new(vec![
            DialogueEntry::new(Speaker::Lawyer, "one", 400, VoiceProfile::Male),
            DialogueEntry::new(Speaker::System, "two", 200, VoiceProfile::Female),
            DialogueEntry::new(Speaker::Client, "three", 300, VoiceProfile::Female),
        ])
        .unwrap()
    }

    #[test]
    fn consultation_script_has_seven_entries() {
        let script = DialogueScript::consultation();
        assert_eq!(script.len(), 7);
        let total: u64 = script.entries().iter().map(|e| e.duration_ms).sum();
        assert_eq!(total, 37_500);
    }

    #[test]
    fn start_plays_first_entry_immediately() {
        let mut harness = Harness::new(short_script());
        assert!(harness.start(0));
        assert!(harness.sequencer.is_active());
        assert!(harness.animation.is_talking(ActorId::Lawyer));
        assert!(!harness.animation.is_talking(ActorId::Client));
        assert_eq!(harness.backend.spoken(), vec!["one".to_string()]);
        assert_eq!(
            harness.overlay.events()[0],
            OverlayEvent::Status(STATUS_STARTED.into())
        );
    }

    #[test]
    fn restart_while_active_is_ignored() {
        let mut harness = Harness::new(short_script());
        harness.start(0);
        assert!(!harness.start(100));
        assert_eq!(harness.backend.spoken().len(), 1);
    }

    #[test]
    fn entries_wait_for_duration_plus_settle() {
        let mut harness = Harness::new(short_script());
        harness.start(0);

        harness.tick(400);
        assert!(!harness.animation.is_talking(ActorId::Lawyer));
        assert_eq!(harness.backend.spoken().len(), 1);

        harness.tick(1399);
        assert_eq!(harness.backend.spoken().len(), 1);
        harness.tick(1400);
        assert_eq!(harness.backend.spoken(), vec!["one", "two"]);
        // system lines leave both actors silent
        assert!(!harness.animation.is_talking(ActorId::Lawyer));
        assert!(!harness.animation.is_talking(ActorId::Client));
    }

    #[test]
    fn late_ticks_do_not_accumulate_drift() {
        let mut harness = Harness::new(short_script());
        harness.start(0);
        // one very late frame fires every cue that came due
        harness.tick(10_000);
        assert_eq!(
            harness.sequencer.entry_start_times(),
            &[
                Duration::from_millis(0),
                Duration::from_millis(1_400),
                Duration::from_millis(2_600),
            ]
        );
        assert!(!harness.sequencer.is_active());
    }

    #[test]
    fn completion_clears_flags_and_reports() {
        let mut harness = Harness::new(short_script());
        harness.start(0);
        harness.tick(2_600);
        assert!(harness.animation.is_talking(ActorId::Client));
        harness.tick(2_900);

        assert!(!harness.sequencer.is_active());
        assert!(!harness.animation.is_talking(ActorId::Client));
        let events = harness.overlay.events();
        assert_eq!(events[events.len() - 2], OverlayEvent::HideDialogue);
        assert_eq!(harness.overlay.last_status().as_deref(), Some(STATUS_COMPLETED));
        assert_eq!(harness.overlay.last_dialogue().unwrap().text, "three");

        assert!(harness.start(3_000));
    }

    #[test]
    fn abort_drops_pending_cues() {
        let mut harness = Harness::new(short_script());
        harness.start(0);
        harness.sequencer.abort();
        harness.tick(10_000);
        assert_eq!(harness.backend.spoken().len(), 1);
        assert!(!harness.sequencer.is_active());
    }

    #[test]
    fn script_json_round_trips_through_loader() {
        let json = r#"[
            {"speaker": "Lawyer", "text": "Hello", "duration_ms": 1200, "voice": "male"},
            {"speaker": "System", "text": "Recording", "duration_ms": 800, "voice": "female"}
        ]"#;
        let script = DialogueScript::from_json_str(json).unwrap();
        assert_eq!(script.entries()[1].speaker, Speaker::System);
        assert_eq!(script.entries()[0].voice, VoiceProfile::Male);
    }

    #[test]
    fn invalid_scripts_are_rejected() {
        assert!(matches!(
            DialogueScript::from_json_str("[]"),
            Err(EngineError::EmptyScript)
        ));
        let zero = r#"[{"speaker": "Client", "text": "x", "duration_ms": 0, "voice": "female"}]"#;
        assert!(matches!(
            DialogueScript::from_json_str(zero),
            Err(EngineError::ZeroDuration { index: 0 })
        ));
    }
}
