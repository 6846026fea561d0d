use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use lexroom_engine::{
    DialogueScript, EngineConfig, NarrationBackend, SilentBackend, SpeechCommandBackend,
    load_engine_config,
};

/// Font files tried in order when `--font` is not given.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

#[derive(Parser, Debug)]
#[command(about = "Interactive investigation room: consultation playback and evidence inspection", version)]
pub struct Args {
    /// Engine tuning JSON (camera, narration, animation sections)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Dialogue script JSON replacing the built-in consultation
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Speech synthesizer program (defaults to `say` on macOS, `espeak-ng` elsewhere)
    #[arg(long)]
    pub speech_program: Option<String>,

    /// Disable voice playback; dialogue still shows in the HUD
    #[arg(long)]
    pub mute: bool,

    /// TrueType font used for HUD text
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Skip creating a winit window/event loop and simulate frames instead
    #[arg(long)]
    pub headless: bool,

    /// Number of simulated frames in headless mode (60 per second)
    #[arg(long, default_value_t = 2700)]
    pub frames: u32,

    /// Start the consultation as soon as the room is up
    #[arg(long)]
    pub autoplay: bool,
}

impl Args {
    pub fn engine_config(&self) -> Result<EngineConfig> {
        match self.config.as_deref() {
            Some(path) => load_engine_config(path)
                .with_context(|| format!("loading engine config {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }

    pub fn dialogue_script(&self) -> Result<DialogueScript> {
        match self.script.as_deref() {
            Some(path) => DialogueScript::load(path)
                .with_context(|| format!("loading dialogue script {}", path.display())),
            None => Ok(DialogueScript::default()),
        }
    }

    pub fn narration_backend(&self) -> Box<dyn NarrationBackend> {
        if self.mute {
            return Box::new(SilentBackend);
        }
        match self.speech_program.as_deref() {
            Some(program) => Box::new(SpeechCommandBackend::new(program)),
            None => Box::new(SpeechCommandBackend::system_default()),
        }
    }

    /// The explicit `--font`, or the first installed candidate.
    pub fn font_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.font {
            return Some(path.clone());
        }
        FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|path| path.is_file())
            .map(Path::to_path_buf)
    }
}
