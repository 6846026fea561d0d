//! Retained-mode scene graph stored as an arena. Nodes reference their parent
//! by index and are always appended after it, so world transforms resolve in
//! a single forward pass.

mod builder;
mod inspect;

pub use builder::{
    ActorProfile, ActorRig, ArmRig, BuiltScene, DocumentSpec, PhotoSpec, PropRig, SceneBuilder,
    SceneLayout,
};
pub use inspect::{InspectableKind, InspectableMetadata, InspectionDetail};

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActorId {
    Lawyer,
    Client,
}

impl ActorId {
    pub const ALL: [ActorId; 2] = [ActorId::Lawyer, ActorId::Client];

    pub fn name(self) -> &'static str {
        match self {
            ActorId::Lawyer => "Lawyer",
            ActorId::Client => "Client",
        }
    }

    pub fn other(self) -> ActorId {
        match self {
            ActorId::Lawyer => ActorId::Client,
            ActorId::Client => ActorId::Lawyer,
        }
    }
}

/// Local transform. Rotation is an Euler triple applied in XYZ order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Transform {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// Unit-sized primitive shapes. Cube spans 1 on each axis, sphere has
/// diameter 1, cylinder and cone have diameter 1 and height 1 along Y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Primitive {
    Cube,
    Sphere,
    Cylinder,
    Cone,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
}

impl Material {
    pub fn solid(hex: u32) -> Self {
        Material {
            color: rgb(hex),
            emissive: [0.0; 3],
            emissive_intensity: 0.0,
        }
    }

    pub fn glowing(hex: u32, emissive: u32, intensity: f32) -> Self {
        Material {
            color: rgb(hex),
            emissive: rgb(emissive),
            emissive_intensity: intensity,
        }
    }

    /// Emissive contribution, clamped to displayable range.
    pub fn emission(&self) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (slot, emissive) in out.iter_mut().zip(self.emissive) {
            *slot = (emissive * self.emissive_intensity).clamp(0.0, 1.0);
        }
        out
    }
}

pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh {
        primitive: Primitive,
        material: Material,
    },
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub local: Transform,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. })
    }
}

/// Background and fog styling for the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub background: [f32; 3],
    pub fog_color: [f32; 3],
    pub fog_near: f32,
    pub fog_far: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    world: Vec<Mat4>,
    /// Inspectable metadata keyed by the tagged node.
    metadata: Vec<(NodeId, InspectableMetadata)>,
    /// Nearest tagged ancestor (or self) for every node.
    owners: Vec<Option<NodeId>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, name: &str, parent: Option<NodeId>, local: Transform) -> NodeId {
        self.push(name, parent, local, NodeKind::Group, None)
    }

    pub fn add_mesh(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        local: Transform,
        primitive: Primitive,
        material: Material,
    ) -> NodeId {
        self.push(
            name,
            parent,
            local,
            NodeKind::Mesh {
                primitive,
                material,
            },
            None,
        )
    }

    /// Adds a group that resolves picks on any of its descendants.
    pub fn add_inspectable_group(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        local: Transform,
        metadata: InspectableMetadata,
    ) -> NodeId {
        self.push(name, parent, local, NodeKind::Group, Some(metadata))
    }

    fn push(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        local: Transform,
        kind: NodeKind,
        metadata: Option<InspectableMetadata>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let parent_world = parent
            .and_then(|p| self.world.get(p.index()).copied())
            .unwrap_or(Mat4::IDENTITY);
        let owner = match metadata {
            Some(metadata) => {
                self.metadata.push((id, metadata));
                Some(id)
            }
            None => parent.and_then(|p| self.owners.get(p.index()).copied().flatten()),
        };
        self.world.push(parent_world * local.matrix());
        self.owners.push(owner);
        self.nodes.push(SceneNode {
            name: name.to_string(),
            parent,
            local,
            kind,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn local_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(id.index()).map(|node| &mut node.local)
    }

    pub fn material_mut(&mut self, id: NodeId) -> Option<&mut Material> {
        match self.nodes.get_mut(id.index()).map(|node| &mut node.kind) {
            Some(NodeKind::Mesh { material, .. }) => Some(material),
            _ => None,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, Primitive, &Material, &Mat4)> {
        self.nodes
            .iter()
            .zip(&self.world)
            .enumerate()
            .filter_map(|(index, (node, world))| match &node.kind {
                NodeKind::Mesh {
                    primitive,
                    material,
                } => Some((NodeId(index as u32), *primitive, material, world)),
                NodeKind::Group => None,
            })
    }

    /// Recomputes every world matrix from local transforms.
    pub fn update_world(&mut self) {
        for index in 0..self.nodes.len() {
            let node = &self.nodes[index];
            let local = node.local.matrix();
            let world = match node.parent {
                Some(parent) => self.world[parent.index()] * local,
                None => local,
            };
            self.world[index] = world;
        }
    }

    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        self.world.get(id.index()).copied()
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    pub fn metadata(&self, id: NodeId) -> Option<&InspectableMetadata> {
        self.metadata
            .iter()
            .find(|(tagged, _)| *tagged == id)
            .map(|(_, metadata)| metadata)
    }

    /// Resolves a node to the inspectable that owns it, if any.
    pub fn owner(&self, id: NodeId) -> Option<NodeId> {
        self.owners.get(id.index()).copied().flatten()
    }

    /// Tagged nodes in creation order.
    pub fn inspectables(&self) -> impl ExactSizeIterator<Item = (NodeId, &InspectableMetadata)> {
        self.metadata.iter().map(|(id, metadata)| (*id, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn children_inherit_parent_transform() {
        let mut graph = SceneGraph::new();
        let root = graph.add_group("root", None, Transform::at(1.0, 2.0, 3.0));
        let child = graph.add_mesh(
            "child",
            Some(root),
            Transform::at(0.0, 1.0, 0.0),
            Primitive::Cube,
            Material::solid(0xffffff),
        );
        assert!(approx_eq(
            graph.world_position(child).unwrap(),
            Vec3::new(1.0, 3.0, 3.0)
        ));

        graph.local_mut(root).unwrap().translation.x = -1.0;
        graph.update_world();
        assert!(approx_eq(
            graph.world_position(child).unwrap(),
            Vec3::new(-1.0, 3.0, 3.0)
        ));
    }

    #[test]
    fn rotation_uses_xyz_euler_order() {
        let transform = Transform::IDENTITY.rotated(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let rotated = transform.matrix().transform_point3(Vec3::X);
        assert!(approx_eq(rotated, Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn owner_propagates_to_descendants() {
        let mut graph = SceneGraph::new();
        let floor = graph.add_mesh(
            "floor",
            None,
            Transform::IDENTITY,
            Primitive::Cube,
            Material::solid(0),
        );
        let doc = graph.add_inspectable_group(
            "doc",
            None,
            Transform::IDENTITY,
            InspectableMetadata::new(InspectableKind::Contract, Some("LEGAL CONTRACT")),
        );
        let paper = graph.add_mesh(
            "paper",
            Some(doc),
            Transform::IDENTITY,
            Primitive::Cube,
            Material::solid(0),
        );
        let stamp = graph.add_mesh(
            "stamp",
            Some(paper),
            Transform::IDENTITY,
            Primitive::Cylinder,
            Material::solid(0),
        );

        assert_eq!(graph.owner(floor), None);
        assert_eq!(graph.owner(doc), Some(doc));
        assert_eq!(graph.owner(stamp), Some(doc));
        assert_eq!(
            graph.metadata(doc).map(|m| m.kind),
            Some(InspectableKind::Contract)
        );
        assert_eq!(graph.inspectables().len(), 1);
    }

    #[test]
    fn hex_colors_decode_per_channel() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb(0x00ff00), [0.0, 1.0, 0.0]);
        let gray = rgb(0x808080);
        assert!((gray[2] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn material_mut_only_applies_to_meshes() {
        let mut graph = SceneGraph::new();
        let group = graph.add_group("g", None, Transform::IDENTITY);
        let mesh = graph.add_mesh(
            "m",
            Some(group),
            Transform::IDENTITY,
            Primitive::Sphere,
            Material::glowing(0xff0000, 0xff0000, 0.5),
        );
        assert!(graph.material_mut(group).is_none());
        graph.material_mut(mesh).unwrap().emissive_intensity = 0.9;
        let (_, _, material, _) = graph.meshes().next().unwrap();
        assert_eq!(material.emissive_intensity, 0.9);
    }
}
