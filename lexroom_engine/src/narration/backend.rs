//! Voice playback seam. Playback is fire-and-forget: backends never report
//! errors to the sequencer, they log and carry on silently.

use std::{
    cell::RefCell,
    path::Path,
    process::{Child, Command, Stdio},
    rc::Rc,
};

use super::VoiceProfile;

pub trait NarrationBackend {
    fn speak(&mut self, text: &str, voice: VoiceProfile);
    /// Cuts off any queued or playing speech.
    fn stop(&mut self);
}

impl<B: NarrationBackend + ?Sized> NarrationBackend for Box<B> {
    fn speak(&mut self, text: &str, voice: VoiceProfile) {
        (**self).speak(text, voice);
    }

    fn stop(&mut self) {
        (**self).stop();
    }
}

/// Drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentBackend;

impl NarrationBackend for SilentBackend {
    fn speak(&mut self, text: &str, voice: VoiceProfile) {
        log::debug!("silent narration ({voice:?}): {text}");
    }

    fn stop(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationCall {
    Speak { text: String, voice: VoiceProfile },
    Stop,
}

/// Records requests instead of playing them. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    calls: Rc<RefCell<Vec<NarrationCall>>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NarrationCall> {
        self.calls.borrow().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                NarrationCall::Speak { text, .. } => Some(text.clone()),
                NarrationCall::Stop => None,
            })
            .collect()
    }
}

impl NarrationBackend for RecordingBackend {
    fn speak(&mut self, text: &str, voice: VoiceProfile) {
        self.calls.borrow_mut().push(NarrationCall::Speak {
            text: text.to_string(),
            voice,
        });
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(NarrationCall::Stop);
    }
}

/// Pitch and rate multipliers applied on top of the synthesizer defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceShape {
    pub pitch: f32,
    pub rate: f32,
}

impl VoiceProfile {
    pub fn shape(self) -> VoiceShape {
        match self {
            VoiceProfile::Male => VoiceShape {
                pitch: 0.8,
                rate: 0.9,
            },
            VoiceProfile::Female => VoiceShape {
                pitch: 1.1,
                rate: 0.9,
            },
        }
    }
}

const BASE_WORDS_PER_MINUTE: f32 = 160.0;
const BASE_PITCH: f32 = 50.0;

/// Speaks through a system synthesizer process (`espeak-ng`, `espeak` or
/// macOS `say`). Each utterance replaces the previous one. If the program
/// cannot be spawned the backend disables itself and stays silent.
#[derive(Debug)]
pub struct SpeechCommandBackend {
    program: String,
    child: Option<Child>,
    available: bool,
}

impl SpeechCommandBackend {
    pub fn new(program: impl Into<String>) -> Self {
        SpeechCommandBackend {
            program: program.into(),
            child: None,
            available: true,
        }
    }

    /// Picks the platform's usual synthesizer.
    pub fn system_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("say")
        } else {
            Self::new("espeak-ng")
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn is_say(&self) -> bool {
        Path::new(&self.program)
            .file_name()
            .is_some_and(|name| name == "say")
    }

    pub fn arguments(&self, text: &str, voice: VoiceProfile) -> Vec<String> {
        let shape = voice.shape();
        let rate = (BASE_WORDS_PER_MINUTE * shape.rate).round() as u32;
        if self.is_say() {
            let name = match voice {
                VoiceProfile::Male => "Daniel",
                VoiceProfile::Female => "Samantha",
            };
            return vec![
                "-v".into(),
                name.into(),
                "-r".into(),
                rate.to_string(),
                text.to_string(),
            ];
        }
        let variant = match voice {
            VoiceProfile::Male => "en+m3",
            VoiceProfile::Female => "en+f3",
        };
        let pitch = (BASE_PITCH * shape.pitch).round().clamp(0.0, 99.0) as u32;
        vec![
            "-v".into(),
            variant.into(),
            "-p".into(),
            pitch.to_string(),
            "-s".into(),
            rate.to_string(),
            text.to_string(),
        ]
    }

    fn cancel_current(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                log::debug!("speech process already finished: {err}");
            }
            let _ = child.wait();
        }
    }
}

impl NarrationBackend for SpeechCommandBackend {
    fn speak(&mut self, text: &str, voice: VoiceProfile) {
        if !self.available {
            log::debug!("speech unavailable; skipping line");
            return;
        }
        self.cancel_current();
        let spawned = Command::new(&self.program)
            .args(self.arguments(text, voice))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => self.child = Some(child),
            Err(err) => {
                log::warn!(
                    "speech program '{}' could not start ({err}); narration continues without voice",
                    self.program
                );
                self.available = false;
            }
        }
    }

    fn stop(&mut self) {
        self.cancel_current();
    }
}

impl Drop for SpeechCommandBackend {
    fn drop(&mut self) {
        self.cancel_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_backend_tracks_calls() {
        let backend = RecordingBackend::new();
        let mut handle = backend.clone();
        handle.speak("Good morning.", VoiceProfile::Male);
        handle.stop();
        assert_eq!(
            backend.calls(),
            vec![
                NarrationCall::Speak {
                    text: "Good morning.".into(),
                    voice: VoiceProfile::Male,
                },
                NarrationCall::Stop,
            ]
        );
        assert_eq!(backend.spoken(), vec!["Good morning.".to_string()]);
    }

    #[test]
    fn voice_shapes_follow_profile() {
        assert_eq!(VoiceProfile::Male.shape().pitch, 0.8);
        assert_eq!(VoiceProfile::Female.shape().pitch, 1.1);
        assert_eq!(VoiceProfile::Female.shape().rate, 0.9);
    }

    #[test]
    fn espeak_arguments_carry_pitch_and_rate() {
        let backend = SpeechCommandBackend::new("espeak-ng");
        let args = backend.arguments("Hello", VoiceProfile::Male);
        assert_eq!(args, vec!["-v", "en+m3", "-p", "40", "-s", "144", "Hello"]);
        let args = backend.arguments("Hi", VoiceProfile::Female);
        assert_eq!(&args[..4], &["-v", "en+f3", "-p", "55"]);
    }

    #[test]
    fn say_arguments_pick_named_voice() {
        let backend = SpeechCommandBackend::new("/usr/bin/say");
        let args = backend.arguments("Hello", VoiceProfile::Female);
        assert_eq!(args, vec!["-v", "Samantha", "-r", "144", "Hello"]);
    }

    #[test]
    fn missing_program_degrades_silently() {
        let mut backend = SpeechCommandBackend::new("lexroom-no-such-speech-program");
        backend.speak("first", VoiceProfile::Male);
        assert!(!backend.is_available());
        backend.speak("second", VoiceProfile::Female);
        backend.stop();
        assert!(!backend.is_available());
    }
}
