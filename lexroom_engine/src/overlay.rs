use std::{cell::RefCell, rc::Rc};

use serde::Serialize;

use crate::scene::InspectionDetail;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueLine {
    pub speaker: String,
    pub text: String,
}

/// Host-side display surface: dialogue box, inspection panel and status bar.
pub trait OverlaySink {
    fn show_dialogue(&mut self, line: &DialogueLine);
    fn hide_dialogue(&mut self);
    fn show_inspection(&mut self, detail: &InspectionDetail);
    fn hide_inspection(&mut self);
    fn set_status(&mut self, status: &str);
}

/// Latest overlay state, for hosts that redraw from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HudState {
    pub status: String,
    pub dialogue: Option<DialogueLine>,
    pub inspection: Option<InspectionDetail>,
    /// Bumped on every change so renderers can skip rebuilding text.
    pub revision: u64,
}

impl Default for HudState {
    fn default() -> Self {
        HudState {
            status: String::from("Ready"),
            dialogue: None,
            inspection: None,
            revision: 0,
        }
    }
}

impl OverlaySink for HudState {
    fn show_dialogue(&mut self, line: &DialogueLine) {
        self.dialogue = Some(line.clone());
        self.revision += 1;
    }

    fn hide_dialogue(&mut self) {
        self.dialogue = None;
        self.revision += 1;
    }

    fn show_inspection(&mut self, detail: &InspectionDetail) {
        self.inspection = Some(detail.clone());
        self.revision += 1;
    }

    fn hide_inspection(&mut self) {
        self.inspection = None;
        self.revision += 1;
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.revision += 1;
    }
}

/// HUD snapshot shared between the controller and a renderer.
#[derive(Debug, Clone, Default)]
pub struct SharedHud(Rc<RefCell<HudState>>);

impl SharedHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> HudState {
        self.0.borrow().clone()
    }

    pub fn revision(&self) -> u64 {
        self.0.borrow().revision
    }
}

impl OverlaySink for SharedHud {
    fn show_dialogue(&mut self, line: &DialogueLine) {
        self.0.borrow_mut().show_dialogue(line);
    }

    fn hide_dialogue(&mut self) {
        self.0.borrow_mut().hide_dialogue();
    }

    fn show_inspection(&mut self, detail: &InspectionDetail) {
        self.0.borrow_mut().show_inspection(detail);
    }

    fn hide_inspection(&mut self) {
        self.0.borrow_mut().hide_inspection();
    }

    fn set_status(&mut self, status: &str) {
        self.0.borrow_mut().set_status(status);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    ShowDialogue(DialogueLine),
    HideDialogue,
    ShowInspection { title: String },
    HideInspection,
    Status(String),
}

/// Overlay that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingOverlay {
    events: Rc<RefCell<Vec<OverlayEvent>>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OverlayEvent> {
        self.events.borrow().clone()
    }

    pub fn last_status(&self) -> Option<String> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            OverlayEvent::Status(status) => Some(status.clone()),
            _ => None,
        })
    }

    pub fn last_dialogue(&self) -> Option<DialogueLine> {
        self.events.borrow().iter().rev().find_map(|event| match event {
            OverlayEvent::ShowDialogue(line) => Some(line.clone()),
            _ => None,
        })
    }
}

impl OverlaySink for RecordingOverlay {
    fn show_dialogue(&mut self, line: &DialogueLine) {
        self.events
            .borrow_mut()
            .push(OverlayEvent::ShowDialogue(line.clone()));
    }

    fn hide_dialogue(&mut self) {
        self.events.borrow_mut().push(OverlayEvent::HideDialogue);
    }

    fn show_inspection(&mut self, detail: &InspectionDetail) {
        self.events.borrow_mut().push(OverlayEvent::ShowInspection {
            title: detail.title.clone(),
        });
    }

    fn hide_inspection(&mut self) {
        self.events.borrow_mut().push(OverlayEvent::HideInspection);
    }

    fn set_status(&mut self, status: &str) {
        self.events
            .borrow_mut()
            .push(OverlayEvent::Status(status.to_string()));
    }
}
