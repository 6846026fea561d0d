//! Procedural construction of the interview room. Every sub-builder is a pure
//! function of the layout tables, so building the same layout twice yields
//! identical graphs.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use super::{
    ActorId, Environment, InspectableKind, InspectableMetadata, Material, NodeId, Primitive,
    SceneGraph, Transform, rgb,
};
use crate::lighting::{LightSource, room_lights};

const SKIN: u32 = 0xfdbcb4;
const SHOE: u32 = 0x0a0a0a;
const HEAD_HEIGHT: f32 = 1.65;
const SHOULDER_HEIGHT: f32 = 1.17;
const SHOULDER_OFFSET: f32 = 0.45;
const ARM_REST_TILT: f32 = 0.2;
const PLANE_THICKNESS: f32 = 0.002;
const PHOTO_DETAIL_OFFSETS: [[f32; 2]; 3] = [[-0.06, -0.1], [0.05, 0.02], [-0.02, 0.11]];

/// Visual parameters for one humanoid actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorProfile {
    pub id: ActorId,
    pub clothing: u32,
    pub hair: u32,
    pub legs: u32,
    /// Adds a white collar and a tie.
    pub professional: bool,
    pub position: [f32; 3],
    pub facing: f32,
    /// Phase offset for the idle arm sway so the two actors never mirror.
    pub sway_phase: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSpec {
    pub position: [f32; 3],
    pub rotation: f32,
    pub kind: InspectableKind,
    pub header: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSpec {
    pub position: [f32; 3],
    pub kind: InspectableKind,
}

/// Parameter tables for the whole room.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneLayout {
    pub environment: Environment,
    pub lights: Vec<LightSource>,
    /// Chair floor position (x, z) and yaw.
    pub chairs: Vec<([f32; 2], f32)>,
    pub actors: Vec<ActorProfile>,
    pub laptop: [f32; 3],
    pub recorder: [f32; 3],
    pub documents: Vec<DocumentSpec>,
    pub table_photos: Vec<PhotoSpec>,
    pub board_position: [f32; 3],
    /// Red strings between board pins, as (column, row) pairs.
    pub board_strings: Vec<([u8; 2], [u8; 2])>,
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self::investigation_room()
    }
}

impl SceneLayout {
    pub fn investigation_room() -> Self {
        let document = |position, rotation, kind, header: &str| DocumentSpec {
            position,
            rotation,
            kind,
            header: header.to_string(),
        };
        SceneLayout {
            environment: Environment {
                background: rgb(0x1a1a2e),
                fog_color: rgb(0x1a1a2e),
                fog_near: 15.0,
                fog_far: 45.0,
            },
            lights: room_lights(),
            chairs: vec![([0.0, -2.2], 0.0), ([0.0, 2.2], PI)],
            actors: vec![
                ActorProfile {
                    id: ActorId::Lawyer,
                    clothing: 0x1a1a2a,
                    hair: 0x2a2a2a,
                    legs: 0x1a1a2a,
                    professional: true,
                    position: [0.0, 0.6, -1.8],
                    facing: 0.0,
                    sway_phase: 0.0,
                },
                ActorProfile {
                    id: ActorId::Client,
                    clothing: 0x3a3a4a,
                    hair: 0x4a3020,
                    legs: 0x2a2a3a,
                    professional: false,
                    position: [0.0, 0.6, 1.8],
                    facing: PI,
                    sway_phase: PI,
                },
            ],
            laptop: [3.5, 1.26, -2.0],
            recorder: [0.0, 1.27, 0.0],
            documents: vec![
                document([-1.2, 1.27, -0.3], 0.3, InspectableKind::CaseFile, "CASE FILE #2024-789"),
                document([-0.5, 1.27, 0.2], -0.2, InspectableKind::Evidence, "EVIDENCE REPORT"),
                document([0.3, 1.27, -0.1], 0.5, InspectableKind::WitnessStatement, "WITNESS STATEMENT"),
                document([1.0, 1.27, 0.3], -0.4, InspectableKind::Contract, "LEGAL CONTRACT"),
            ],
            table_photos: vec![
                PhotoSpec {
                    position: [-1.5, 1.27, 0.5],
                    kind: InspectableKind::CrimeScenePhoto,
                },
                PhotoSpec {
                    position: [1.5, 1.27, -0.5],
                    kind: InspectableKind::SuspectPhoto,
                },
            ],
            board_position: [-5.0, 3.0, -11.0],
            board_strings: vec![
                ([0, 0], [2, 1]),
                ([1, 2], [3, 0]),
                ([0, 2], [1, 0]),
                ([3, 1], [2, 2]),
                ([1, 1], [3, 2]),
                ([2, 0], [0, 1]),
            ],
        }
    }
}

/// Shoulder pivot of one arm. `side` is -1 for the actor's left, +1 for right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmRig {
    pub pivot: NodeId,
    pub side: f32,
}

impl ArmRig {
    /// Z rotation of the shoulder for a given swing amount.
    pub fn angle(&self, swing: f32) -> f32 {
        self.side * (ARM_REST_TILT - swing)
    }
}

/// Node handles the animation step writes to every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorRig {
    pub id: ActorId,
    pub root: NodeId,
    pub head: NodeId,
    pub head_height: f32,
    pub arms: [ArmRig; 2],
    pub sway_phase: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PropRig {
    pub record_button: Option<NodeId>,
    pub laptop_screen: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct BuiltScene {
    pub graph: SceneGraph,
    pub environment: Environment,
    pub lights: Vec<LightSource>,
    pub actors: Vec<ActorRig>,
    pub props: PropRig,
    /// Inspectable documents on the table, in layout order.
    pub documents: Vec<NodeId>,
}

impl BuiltScene {
    pub fn actor(&self, id: ActorId) -> Option<&ActorRig> {
        self.actors.iter().find(|rig| rig.id == id)
    }
}

pub struct SceneBuilder<'a> {
    layout: &'a SceneLayout,
    graph: SceneGraph,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(layout: &'a SceneLayout) -> Self {
        SceneBuilder {
            layout,
            graph: SceneGraph::new(),
        }
    }

    pub fn build(mut self) -> BuiltScene {
        let layout = self.layout;
        self.room();
        self.table();
        for (position, yaw) in &layout.chairs {
            self.chair(position[0], position[1], *yaw);
        }
        let actors = layout
            .actors
            .iter()
            .map(|profile| self.actor(profile))
            .collect();
        let laptop_screen = self.laptop(Vec3::from_array(layout.laptop));
        let record_button = self.recorder(Vec3::from_array(layout.recorder));
        let documents = layout
            .documents
            .iter()
            .map(|spec| self.document(spec))
            .collect();
        for photo in &layout.table_photos {
            let [x, y, z] = photo.position;
            self.photo(None, Transform::at(x, y, z), photo.kind);
        }
        self.evidence_board();

        log::debug!(
            "scene built: {} nodes, {} inspectables",
            self.graph.len(),
            self.graph.inspectables().len()
        );
        BuiltScene {
            graph: self.graph,
            environment: layout.environment,
            lights: layout.lights.clone(),
            actors,
            props: PropRig {
                record_button,
                laptop_screen: Some(laptop_screen),
            },
            documents,
        }
    }

    fn cube(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        at: Transform,
        size: [f32; 3],
        material: Material,
    ) -> NodeId {
        let local = at.scaled(Vec3::from_array(size));
        self.graph
            .add_mesh(name, parent, local, Primitive::Cube, material)
    }

    /// Flat rectangle in the local XY plane.
    fn plane(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        at: Transform,
        width: f32,
        height: f32,
        material: Material,
    ) -> NodeId {
        self.cube(name, parent, at, [width, height, PLANE_THICKNESS], material)
    }

    fn sphere(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        at: Transform,
        radius: f32,
        material: Material,
    ) -> NodeId {
        let local = at.scaled(Vec3::splat(radius * 2.0));
        self.graph
            .add_mesh(name, parent, local, Primitive::Sphere, material)
    }

    fn cylinder(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        at: Transform,
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        material: Material,
    ) -> NodeId {
        let diameter = radius_top.max(radius_bottom) * 2.0;
        let local = at.scaled(Vec3::new(diameter, height, diameter));
        self.graph
            .add_mesh(name, parent, local, Primitive::Cylinder, material)
    }

    /// Flat disc in the local XZ plane.
    fn disc(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        at: Transform,
        radius: f32,
        material: Material,
    ) -> NodeId {
        self.cylinder(name, parent, at, radius, radius, PLANE_THICKNESS, material)
    }

    fn cone(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        at: Transform,
        radius: f32,
        height: f32,
        material: Material,
    ) -> NodeId {
        let local = at.scaled(Vec3::new(radius * 2.0, height, radius * 2.0));
        self.graph
            .add_mesh(name, parent, local, Primitive::Cone, material)
    }

    fn room(&mut self) {
        let flat = -FRAC_PI_2;
        self.plane(
            "floor",
            None,
            Transform::IDENTITY.rotated(flat, 0.0, 0.0),
            25.0,
            25.0,
            Material::solid(0x2a2530),
        );
        for i in 0..12 {
            let color = if i % 2 == 0 { 0x2d2838 } else { 0x262430 };
            self.plane(
                &format!("floor/plank{i}"),
                None,
                Transform::at((i as f32 - 5.5) * 2.0, 0.01, 0.0).rotated(flat, 0.0, 0.0),
                2.0,
                25.0,
                Material::solid(color),
            );
        }
        self.plane(
            "ceiling",
            None,
            Transform::at(0.0, 7.0, 0.0).rotated(FRAC_PI_2, 0.0, 0.0),
            25.0,
            25.0,
            Material::solid(0x1a1825),
        );

        let wall = Material::solid(0x2d2d3d);
        let wall_size = [25.0, 7.0, 0.3];
        self.cube("wall/back", None, Transform::at(0.0, 3.5, -12.5), wall_size, wall);
        for (name, x) in [("wall/left", -12.5), ("wall/right", 12.5)] {
            self.cube(
                name,
                None,
                Transform::at(x, 3.5, 0.0).rotated(0.0, FRAC_PI_2, 0.0),
                wall_size,
                wall,
            );
        }
        for i in 0..5 {
            self.cube(
                &format!("wall/panel{i}"),
                None,
                Transform::at((i as f32 - 2.0) * 4.5, 3.0, -12.4),
                [4.0, 6.0, 0.1],
                Material::solid(0x252535),
            );
        }
    }

    fn table(&mut self) {
        let table = Some(self.graph.add_group("table", None, Transform::IDENTITY));
        self.cube(
            "table/top",
            table,
            Transform::at(0.0, 1.2, 0.0),
            [5.0, 0.12, 2.5],
            Material::solid(0x4a3830),
        );

        let trim = Material::solid(0x3a2820);
        let trims = [
            ([5.1, 0.05, 0.05], [0.0, 1.14, 1.275]),
            ([5.1, 0.05, 0.05], [0.0, 1.14, -1.275]),
            ([0.05, 0.05, 2.6], [2.525, 1.14, 0.0]),
            ([0.05, 0.05, 2.6], [-2.525, 1.14, 0.0]),
        ];
        for (size, [x, y, z]) in trims {
            self.cube("table/trim", table, Transform::at(x, y, z), size, trim);
        }

        let metal = Material::solid(0x2a2a2a);
        for [x, z] in [[-2.0, 1.0], [2.0, 1.0], [-2.0, -1.0], [2.0, -1.0]] {
            self.cylinder("table/leg", table, Transform::at(x, 0.6, z), 0.08, 0.1, 1.2, metal);
            self.cylinder("table/foot", table, Transform::at(x, 0.025, z), 0.12, 0.12, 0.05, metal);
        }
    }

    fn chair(&mut self, x: f32, z: f32, yaw: f32) {
        let chair = Some(self.graph.add_group(
            "chair",
            None,
            Transform::at(x, 0.0, z).rotated(0.0, yaw, 0.0),
        ));
        let seat = Material::solid(0x2a2a3a);
        let frame = Material::solid(0x1a1a1a);

        self.cube("chair/seat", chair, Transform::at(0.0, 0.65, 0.0), [0.65, 0.12, 0.65], seat);
        self.cube(
            "chair/cushion",
            chair,
            Transform::at(0.0, 0.7, 0.0),
            [0.55, 0.08, 0.55],
            Material::solid(0x252535),
        );
        self.cube(
            "chair/backrest",
            chair,
            Transform::at(0.0, 1.15, -0.265).rotated(-0.15, 0.0, 0.0),
            [0.65, 0.95, 0.12],
            seat,
        );
        self.cube(
            "chair/lumbar",
            chair,
            Transform::at(0.0, 0.9, -0.25),
            [0.5, 0.25, 0.1],
            Material::solid(0x353545),
        );
        for side in [-0.35, 0.35] {
            self.cube("chair/armrest", chair, Transform::at(side, 0.75, 0.0), [0.08, 0.4, 0.45], frame);
            self.cube("chair/armpad", chair, Transform::at(side, 0.95, 0.0), [0.12, 0.08, 0.45], seat);
        }
        for i in 0..5 {
            let angle = i as f32 / 5.0 * TAU;
            let (sin, cos) = angle.sin_cos();
            self.cylinder(
                "chair/spoke",
                chair,
                Transform::at(sin * 0.2, 0.2, cos * 0.2).rotated(PI / 2.5, 0.0, -angle),
                0.03,
                0.04,
                0.4,
                frame,
            );
            self.cylinder(
                "chair/wheel",
                chair,
                Transform::at(sin * 0.35, 0.05, cos * 0.35).rotated(FRAC_PI_2, 0.0, 0.0),
                0.05,
                0.05,
                0.04,
                Material::solid(SHOE),
            );
        }
        self.cylinder("chair/column", chair, Transform::at(0.0, 0.4, 0.0), 0.06, 0.06, 0.5, frame);
    }

    fn actor(&mut self, profile: &ActorProfile) -> ActorRig {
        let name = profile.id.name().to_lowercase();
        let [x, y, z] = profile.position;
        let root = self.graph.add_group(
            &name,
            None,
            Transform::at(x, y, z).rotated(0.0, profile.facing, 0.0),
        );
        let parent = Some(root);
        let skin = Material::solid(SKIN);
        let clothing = Material::solid(profile.clothing);

        let head = self
            .graph
            .add_group(&format!("{name}/head"), parent, Transform::at(0.0, HEAD_HEIGHT, 0.0));
        self.head(&name, head, profile.hair);

        self.cylinder(&format!("{name}/neck"), parent, Transform::at(0.0, 1.35, 0.0), 0.12, 0.14, 0.2, skin);
        self.cylinder(&format!("{name}/torso"), parent, Transform::at(0.0, 0.85, 0.0), 0.35, 0.42, 0.85, clothing);
        if profile.professional {
            self.cylinder(
                &format!("{name}/collar"),
                parent,
                Transform::at(0.0, 1.25, 0.0),
                0.16,
                0.18,
                0.1,
                Material::solid(0xffffff),
            );
            self.cube(
                &format!("{name}/tie"),
                parent,
                Transform::at(0.0, 1.0, 0.37),
                [0.08, 0.5, 0.02],
                Material::solid(0x8b0000),
            );
        }

        let arms = [-1.0, 1.0].map(|side| self.arm(&name, root, side, clothing));

        let legs = Material::solid(profile.legs);
        for x in [-0.2, 0.2] {
            self.cylinder(
                &format!("{name}/thigh"),
                parent,
                Transform::at(x, 0.35, 0.0).rotated(1.3, 0.0, 0.0),
                0.14,
                0.12,
                0.5,
                legs,
            );
            self.cylinder(
                &format!("{name}/shin"),
                parent,
                Transform::at(x, 0.22, 0.35).rotated(1.6, 0.0, 0.0),
                0.11,
                0.09,
                0.45,
                legs,
            );
            self.cube(
                &format!("{name}/shoe"),
                parent,
                Transform::at(x, 0.04, 0.65),
                [0.12, 0.08, 0.25],
                Material::solid(SHOE),
            );
        }

        ActorRig {
            id: profile.id,
            root,
            head,
            head_height: HEAD_HEIGHT,
            arms,
            sway_phase: profile.sway_phase,
        }
    }

    fn head(&mut self, name: &str, head: NodeId, hair: u32) {
        let parent = Some(head);
        let skin = Material::solid(SKIN);
        self.sphere(&format!("{name}/skull"), parent, Transform::IDENTITY, 0.28, skin);
        self.graph.add_mesh(
            &format!("{name}/hair"),
            parent,
            Transform::at(0.0, 0.12, 0.0).scaled(Vec3::new(0.58, 0.34, 0.58)),
            Primitive::Sphere,
            Material::solid(hair),
        );
        for x in [-0.1, 0.1] {
            self.sphere(
                &format!("{name}/eye"),
                parent,
                Transform::at(x, 0.03, 0.24),
                0.04,
                Material::solid(0xffffff),
            );
            self.sphere(
                &format!("{name}/pupil"),
                parent,
                Transform::at(x, 0.03, 0.26),
                0.02,
                Material::solid(0x1a1a1a),
            );
        }
        self.cone(
            &format!("{name}/nose"),
            parent,
            Transform::at(0.0, -0.05, 0.28).rotated(FRAC_PI_2, 0.0, 0.0),
            0.04,
            0.08,
            skin,
        );
    }

    fn arm(&mut self, name: &str, root: NodeId, side: f32, sleeve: Material) -> ArmRig {
        let pivot = self.graph.add_group(
            &format!("{name}/shoulder"),
            Some(root),
            Transform::at(side * SHOULDER_OFFSET, SHOULDER_HEIGHT, 0.0)
                .rotated(0.0, 0.0, side * ARM_REST_TILT),
        );
        let parent = Some(pivot);
        self.cylinder(
            &format!("{name}/upper_arm"),
            parent,
            Transform::at(side * 0.02, -0.22, 0.0),
            0.1,
            0.09,
            0.45,
            sleeve,
        );
        self.cylinder(
            &format!("{name}/forearm"),
            parent,
            Transform::at(side * 0.13, -0.62, 0.15).rotated(0.5, 0.0, side * 0.3),
            0.09,
            0.08,
            0.4,
            sleeve,
        );
        self.sphere(
            &format!("{name}/hand"),
            parent,
            Transform::at(side * 0.2, -0.85, 0.35),
            0.08,
            Material::solid(SKIN),
        );
        ArmRig { pivot, side }
    }

    /// Returns the glowing screen node.
    fn laptop(&mut self, position: Vec3) -> NodeId {
        let laptop = Some(self.graph.add_group(
            "laptop",
            None,
            Transform::at(position.x, position.y, position.z),
        ));
        let shell = Material::solid(0x2a2a2a);
        self.cube("laptop/base", laptop, Transform::IDENTITY, [0.7, 0.04, 0.9], shell);
        self.cube(
            "laptop/keyboard",
            laptop,
            Transform::at(0.0, 0.03, 0.0),
            [0.65, 0.02, 0.85],
            Material::solid(0x1a1a1a),
        );
        for row in 0..6 {
            for col in 0..12 {
                self.cube(
                    "laptop/key",
                    laptop,
                    Transform::at((col as f32 - 5.5) * 0.05, 0.04, (row as f32 - 2.5) * 0.05),
                    [0.04, 0.01, 0.04],
                    shell,
                );
            }
        }
        let tilt = |z| Transform::at(0.0, 0.28, z).rotated(-0.2, 0.0, 0.0);
        self.cube("laptop/lid", laptop, tilt(-0.42), [0.7, 0.5, 0.02], shell);
        let screen = self.plane(
            "laptop/screen",
            laptop,
            tilt(-0.41),
            0.65,
            0.45,
            Material::glowing(0x88aaff, 0x4488ff, 0.6),
        );
        self.plane(
            "laptop/text",
            laptop,
            tilt(-0.405),
            0.55,
            0.35,
            Material::glowing(0xffffff, 0xaaaaaa, 0.3),
        );
        screen
    }

    /// Returns the record button node.
    fn recorder(&mut self, position: Vec3) -> Option<NodeId> {
        let recorder = Some(self.graph.add_group(
            "recorder",
            None,
            Transform::at(position.x, position.y, position.z),
        ));
        self.cube(
            "recorder/body",
            recorder,
            Transform::IDENTITY,
            [0.15, 0.08, 0.25],
            Material::solid(0x1a1a1a),
        );
        self.plane(
            "recorder/display",
            recorder,
            Transform::at(0.0, 0.041, 0.03).rotated(-FRAC_PI_2, 0.0, 0.0),
            0.12,
            0.05,
            Material::glowing(0x00ff00, 0x00ff00, 0.8),
        );
        self.cylinder(
            "recorder/mic",
            recorder,
            Transform::at(0.0, 0.06, -0.08),
            0.02,
            0.02,
            0.04,
            Material::solid(0x333333),
        );
        let mut record = None;
        for x in [-0.04, 0.0, 0.04] {
            let is_record = x == 0.0;
            let material = if is_record {
                Material::glowing(0xff0000, 0xff0000, 0.5)
            } else {
                Material::glowing(0x333333, 0x000000, 0.5)
            };
            let button = self.cylinder(
                "recorder/button",
                recorder,
                Transform::at(x, 0.041, 0.1).rotated(FRAC_PI_2, 0.0, 0.0),
                0.015,
                0.015,
                0.01,
                material,
            );
            if is_record {
                record = Some(button);
            }
        }
        record
    }

    fn document(&mut self, spec: &DocumentSpec) -> NodeId {
        let [x, y, z] = spec.position;
        let doc = self.graph.add_inspectable_group(
            spec.kind.as_str(),
            None,
            Transform::at(x, y, z).rotated(0.0, spec.rotation, 0.0),
            InspectableMetadata::new(spec.kind, Some(spec.header.as_str())),
        );
        let parent = Some(doc);
        let flat = -FRAC_PI_2;
        let header_color = match spec.kind {
            InspectableKind::Evidence => 0x8b0000,
            InspectableKind::WitnessStatement => 0x000080,
            InspectableKind::Contract => 0x006400,
            _ => 0x000000,
        };

        self.cube("document/paper", parent, Transform::IDENTITY, [0.5, 0.015, 0.65], Material::solid(0xf5f5dc));
        self.plane(
            "document/header",
            parent,
            Transform::at(0.0, 0.009, -0.25).rotated(flat, 0.0, 0.0),
            0.45,
            0.08,
            Material::solid(header_color),
        );
        for i in 0..8 {
            self.plane(
                "document/line",
                parent,
                Transform::at(0.0, 0.009, -0.15 + i as f32 * 0.06).rotated(flat, 0.0, 0.0),
                0.4,
                0.02,
                Material::solid(0x333333),
            );
        }
        self.disc("document/stamp", parent, Transform::at(0.15, 0.009, 0.2), 0.08, Material::solid(0x8b0000));
        doc
    }

    fn photo(&mut self, parent: Option<NodeId>, at: Transform, kind: InspectableKind) -> NodeId {
        let photo = self
            .graph
            .add_inspectable_group(kind.as_str(), parent, at, InspectableMetadata::new(kind, None));
        let parent = Some(photo);
        let flat = -FRAC_PI_2;
        let print = match kind {
            InspectableKind::CrimeScenePhoto => 0x4a4a5a,
            InspectableKind::SuspectPhoto => 0x6a5a4a,
            InspectableKind::EvidenceItemPhoto => 0x5a4a6a,
            _ => 0x5a5a5a,
        };
        self.cube("photo/backing", parent, Transform::IDENTITY, [0.4, 0.01, 0.5], Material::solid(0xffffff));
        self.plane(
            "photo/print",
            parent,
            Transform::at(0.0, 0.006, 0.0).rotated(flat, 0.0, 0.0),
            0.35,
            0.45,
            Material::solid(print),
        );
        for [x, z] in PHOTO_DETAIL_OFFSETS {
            self.cube(
                "photo/detail",
                parent,
                Transform::at(x, 0.007, z).rotated(flat, 0.0, 0.0),
                [0.1, 0.001, 0.08],
                Material::solid(0xaaaaaa),
            );
        }
        photo
    }

    fn evidence_board(&mut self) {
        let [bx, by, bz] = self.layout.board_position;
        let board = self.graph.add_group("board", None, Transform::at(bx, by, bz));
        let parent = Some(board);
        self.cube("board/cork", parent, Transform::IDENTITY, [5.0, 3.5, 0.15], Material::solid(0x8b6f47));

        let frame = Material::solid(0x3a2a1a);
        let frames = [
            ([5.2, 0.1, 0.2], [0.0, 1.8]),
            ([5.2, 0.1, 0.2], [0.0, -1.8]),
            ([0.1, 3.7, 0.2], [-2.55, 0.0]),
            ([0.1, 3.7, 0.2], [2.55, 0.0]),
        ];
        for (size, [x, y]) in frames {
            self.cube("board/frame", parent, Transform::at(x, y, 0.0), size, frame);
        }

        let row_kinds = [
            InspectableKind::CrimeScenePhoto,
            InspectableKind::SuspectPhoto,
            InspectableKind::EvidenceItemPhoto,
        ];
        for (row, kind) in row_kinds.into_iter().enumerate() {
            let pin_color = if row % 2 == 0 { 0xff0000 } else { 0x0000ff };
            for col in 0..4 {
                let [x, y] = pin_slot(col, row as u8);
                self.photo(parent, Transform::at(x, y, 0.09).rotated(-FRAC_PI_2, 0.0, 0.0), kind);
                self.cone(
                    "board/pin",
                    parent,
                    Transform::at(x, y, 0.12).rotated(PI, 0.0, 0.0),
                    0.02,
                    0.05,
                    Material::solid(pin_color),
                );
            }
        }

        let layout = self.layout;
        for &([c0, r0], [c1, r1]) in &layout.board_strings {
            let [x0, y0] = pin_slot(c0, r0);
            let [x1, y1] = pin_slot(c1, r1);
            let from = Vec3::new(x0, y0, 0.11);
            let to = Vec3::new(x1, y1, 0.11);
            let span = to - from;
            let length = span.length();
            if length <= f32::EPSILON {
                continue;
            }
            let mid = (from + to) * 0.5;
            self.cube(
                "board/string",
                parent,
                Transform::at(mid.x, mid.y, mid.z).rotated(0.0, 0.0, span.y.atan2(span.x)),
                [length, 0.01, 0.01],
                Material::solid(0xff0000),
            );
        }
    }
}

fn pin_slot(col: u8, row: u8) -> [f32; 2] {
    [(col as f32 - 1.5) * 1.1, row as f32 - 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;

    fn build() -> BuiltScene {
        SceneBuilder::new(&SceneLayout::investigation_room()).build()
    }

    #[test]
    fn build_is_deterministic() {
        let a = build();
        let b = build();
        assert_eq!(a.graph.len(), b.graph.len());
        for ((_, left), (_, right)) in a.graph.nodes().zip(b.graph.nodes()) {
            assert_eq!(left.name, right.name);
            assert_eq!(left.local, right.local);
            assert_eq!(left.kind, right.kind);
        }
    }

    #[test]
    fn inspectables_cover_documents_and_photos() {
        let scene = build();
        assert_eq!(scene.documents.len(), 4);
        // four documents, two table photos, twelve board photos
        assert_eq!(scene.graph.inspectables().len(), 18);
        let first = scene.graph.metadata(scene.documents[0]).unwrap();
        assert_eq!(first.kind, InspectableKind::CaseFile);
        assert_eq!(first.label(), "CASE FILE #2024-789");
    }

    #[test]
    fn attire_adds_collar_and_tie_only_for_professionals() {
        let scene = build();
        let names: Vec<&str> = scene.graph.nodes().map(|(_, node)| node.name.as_str()).collect();
        assert!(names.contains(&"lawyer/tie"));
        assert!(names.contains(&"lawyer/collar"));
        assert!(!names.contains(&"client/tie"));
    }

    #[test]
    fn actor_rigs_point_at_groups() {
        let scene = build();
        assert_eq!(scene.actors.len(), 2);
        for rig in &scene.actors {
            for id in [rig.root, rig.head, rig.arms[0].pivot, rig.arms[1].pivot] {
                assert_eq!(scene.graph.node(id).map(|n| &n.kind), Some(&NodeKind::Group));
            }
            assert_eq!(rig.arms[0].side, -1.0);
        }
        let client = scene.actor(ActorId::Client).unwrap();
        assert_eq!(client.sway_phase, PI);
    }

    #[test]
    fn arm_angle_matches_rest_tilt() {
        let left = ArmRig { pivot: NodeId(0), side: -1.0 };
        let right = ArmRig { pivot: NodeId(0), side: 1.0 };
        assert!((left.angle(0.1) - (-0.2 + 0.1)).abs() < 1e-6);
        assert!((right.angle(0.1) - (0.2 - 0.1)).abs() < 1e-6);
    }

    #[test]
    fn record_button_is_the_red_emissive_one() {
        let scene = build();
        let button = scene.props.record_button.unwrap();
        match &scene.graph.node(button).unwrap().kind {
            NodeKind::Mesh { material, .. } => {
                assert_eq!(material.emissive, rgb(0xff0000));
                assert_eq!(material.emissive_intensity, 0.5);
            }
            other => panic!("record button is not a mesh: {other:?}"),
        }
    }

    #[test]
    fn board_photos_sit_in_front_of_board() {
        let scene = build();
        let board_photo = scene
            .graph
            .inspectables()
            .map(|(id, _)| id)
            .find(|id| scene.graph.node(*id).and_then(|n| n.parent).is_some())
            .unwrap();
        let position = scene.graph.world_position(board_photo).unwrap();
        assert!((position.z - (-11.0 + 0.09)).abs() < 1e-4);
    }
}
