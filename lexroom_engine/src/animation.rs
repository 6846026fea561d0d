//! Per-actor posture and talking state, reduced each frame to a pose table
//! that a single apply step writes into the scene graph.

use serde::Serialize;

use crate::config::AnimationSettings;
use crate::scene::{ActorId, ActorRig, PropRig, SceneGraph};

const BOB_AMPLITUDE: f32 = 0.03;
const NOD_AMPLITUDE: f32 = 0.05;
const TALK_SWING: f32 = 0.15;
const TALK_SWING_RATE: f32 = 3.0;
const IDLE_SWING: f32 = 0.05;
const IDLE_SWING_RATE: f32 = 0.8;
const RECORD_GLOW_REST: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Posture {
    Sitting,
    Standing,
}

impl Posture {
    pub fn toggled(self) -> Posture {
        match self {
            Posture::Sitting => Posture::Standing,
            Posture::Standing => Posture::Sitting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActorState {
    SittingIdle,
    SittingTalking,
    StandingIdle,
    StandingTalking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub posture: Posture,
    pub talking: bool,
    pub anim_phase: f32,
    /// Current root height, chasing the posture target.
    pub height: f32,
    sway_phase: f32,
}

impl Actor {
    pub fn state(&self) -> ActorState {
        match (self.posture, self.talking) {
            (Posture::Sitting, false) => ActorState::SittingIdle,
            (Posture::Sitting, true) => ActorState::SittingTalking,
            (Posture::Standing, false) => ActorState::StandingIdle,
            (Posture::Standing, true) => ActorState::StandingTalking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActorPose {
    pub root_height: f32,
    pub head_bob: f32,
    pub head_nod: f32,
    pub arm_swing: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseTable {
    entries: Vec<(ActorId, ActorPose)>,
}

impl PoseTable {
    pub fn get(&self, id: ActorId) -> Option<&ActorPose> {
        self.entries
            .iter()
            .find(|(actor, _)| *actor == id)
            .map(|(_, pose)| pose)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ActorId, ActorPose)> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone)]
pub struct AnimationDirector {
    settings: AnimationSettings,
    actors: Vec<Actor>,
}

impl AnimationDirector {
    pub fn new(settings: &AnimationSettings, rigs: &[ActorRig]) -> Self {
        let actors = rigs
            .iter()
            .map(|rig| Actor {
                id: rig.id,
                posture: Posture::Sitting,
                talking: false,
                anim_phase: 0.0,
                height: settings.sitting_height,
                sway_phase: rig.sway_phase,
            })
            .collect();
        AnimationDirector {
            settings: settings.clone(),
            actors,
        }
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.id == id)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Flips the posture target. The visible height follows over later frames.
    pub fn toggle_posture(&mut self, id: ActorId) -> Option<Posture> {
        let actor = self.actor_mut(id)?;
        actor.posture = actor.posture.toggled();
        Some(actor.posture)
    }

    pub fn set_talking(&mut self, id: ActorId, talking: bool) {
        if let Some(actor) = self.actor_mut(id) {
            actor.talking = talking;
        }
    }

    pub fn silence_all(&mut self) {
        for actor in &mut self.actors {
            actor.talking = false;
        }
    }

    pub fn is_talking(&self, id: ActorId) -> bool {
        self.actor(id).is_some_and(|actor| actor.talking)
    }

    pub fn posture(&self, id: ActorId) -> Option<Posture> {
        self.actor(id).map(|actor| actor.posture)
    }

    pub fn state(&self, id: ActorId) -> Option<ActorState> {
        self.actor(id).map(Actor::state)
    }

    fn target_height(&self, posture: Posture) -> f32 {
        match posture {
            Posture::Sitting => self.settings.sitting_height,
            Posture::Standing => self.settings.standing_height,
        }
    }

    /// Advances every actor by one frame and returns the resulting poses.
    pub fn advance(&mut self, dt_secs: f32, elapsed_secs: f32) -> PoseTable {
        let damping = self.settings.posture_damping;
        let talk_rate = self.settings.talk_rate;
        let targets: Vec<f32> = self
            .actors
            .iter()
            .map(|actor| self.target_height(actor.posture))
            .collect();

        let entries = self
            .actors
            .iter_mut()
            .zip(targets)
            .map(|(actor, target)| {
                actor.height += (target - actor.height) * damping;
                let pose = if actor.talking {
                    actor.anim_phase += dt_secs * talk_rate;
                    ActorPose {
                        root_height: actor.height,
                        head_bob: actor.anim_phase.sin() * BOB_AMPLITUDE,
                        head_nod: (actor.anim_phase * 0.5).sin() * NOD_AMPLITUDE,
                        arm_swing: (elapsed_secs * TALK_SWING_RATE + actor.sway_phase).sin()
                            * TALK_SWING,
                    }
                } else {
                    ActorPose {
                        root_height: actor.height,
                        head_bob: 0.0,
                        head_nod: 0.0,
                        arm_swing: (elapsed_secs * IDLE_SWING_RATE + actor.sway_phase).sin()
                            * IDLE_SWING,
                    }
                };
                (actor.id, pose)
            })
            .collect();
        PoseTable { entries }
    }
}

/// Emissive levels for the animated props.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropEffects {
    pub record_glow: f32,
    pub screen_glow: f32,
}

impl PropEffects {
    pub fn at(elapsed_secs: f32, narration_active: bool) -> Self {
        let record_glow = if narration_active {
            0.5 + (elapsed_secs * 4.0).sin() * 0.4
        } else {
            RECORD_GLOW_REST
        };
        PropEffects {
            record_glow,
            // stays within [0.6, 0.7]
            screen_glow: 0.65 + (elapsed_secs * 23.0).sin() * 0.05,
        }
    }
}

/// Writes poses and prop glow into the graph. World matrices are left for
/// the caller to refresh.
pub fn apply_poses(
    graph: &mut SceneGraph,
    rigs: &[ActorRig],
    poses: &PoseTable,
    props: &PropRig,
    effects: PropEffects,
) {
    for rig in rigs {
        let Some(pose) = poses.get(rig.id) else {
            continue;
        };
        if let Some(root) = graph.local_mut(rig.root) {
            root.translation.y = pose.root_height;
        }
        if let Some(head) = graph.local_mut(rig.head) {
            head.translation.y = rig.head_height + pose.head_bob;
            head.rotation.x = pose.head_nod;
        }
        for arm in &rig.arms {
            if let Some(shoulder) = graph.local_mut(arm.pivot) {
                shoulder.rotation.z = arm.angle(pose.arm_swing);
            }
        }
    }
    if let Some(material) = props.record_button.and_then(|id| graph.material_mut(id)) {
        material.emissive_intensity = effects.record_glow;
    }
    if let Some(material) = props.laptop_screen.and_then(|id| graph.material_mut(id)) {
        material.emissive_intensity = effects.screen_glow;
    }
}
