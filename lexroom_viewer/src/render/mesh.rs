//! Unit primitive geometry, per-instance data and the per-frame uniform block.
//! Every primitive is centred on the origin and spans one unit, matching the
//! engine's `Primitive` contract, so a node's world matrix is its instance
//! transform.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use lexroom_engine::render_loop::FrameView;
use lexroom_engine::scene::{Material, Primitive, SceneGraph};
use lexroom_engine::LightKind;

const SPHERE_LAT_DIVS: u32 = 12;
const SPHERE_LON_DIVS: u32 = 18;
const ROUND_SEGMENTS: u32 = 16;

/// Lights beyond this count are dropped from the uniform block.
pub const MAX_LIGHTS: usize = 8;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub struct MeshPrimitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshPrimitive {
    fn new(vertices: Vec<MeshVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }
}

pub fn primitive(kind: Primitive) -> MeshPrimitive {
    match kind {
        Primitive::Cube => build_cube(),
        Primitive::Sphere => build_sphere(SPHERE_LAT_DIVS, SPHERE_LON_DIVS),
        Primitive::Cylinder => build_cylinder(ROUND_SEGMENTS),
        Primitive::Cone => build_cone(ROUND_SEGMENTS),
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct MeshInstance {
    pub model: [[f32; 4]; 4],
    /// Inverse-transpose of the model matrix, upper 3x3 padded to vec4 columns.
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    pub emissive: [f32; 4],
}

impl MeshInstance {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 9] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
        8 => Float32x4,
        9 => Float32x4,
        10 => Float32x4,
    ];

    pub fn new(world: &Mat4, material: &Material) -> Self {
        let normal = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            *world
        };
        let [r, g, b] = linear_rgb(material.color);
        let [er, eg, eb] = linear_rgb(material.emission());
        MeshInstance {
            model: world.to_cols_array_2d(),
            normal: [
                normal.x_axis.truncate().extend(0.0).to_array(),
                normal.y_axis.truncate().extend(0.0).to_array(),
                normal.z_axis.truncate().extend(0.0).to_array(),
            ],
            color: [r, g, b, 1.0],
            emissive: [er, eg, eb, 0.0],
        }
    }
}

/// Buckets mesh instances by primitive so each draw stays one instanced call.
#[derive(Default)]
pub struct MeshInstanceGroups {
    pub cube: Vec<MeshInstance>,
    pub sphere: Vec<MeshInstance>,
    pub cylinder: Vec<MeshInstance>,
    pub cone: Vec<MeshInstance>,
}

impl MeshInstanceGroups {
    pub fn collect(graph: &SceneGraph) -> Self {
        let mut groups = Self::default();
        for (_, primitive, material, world) in graph.meshes() {
            groups.push(primitive, MeshInstance::new(world, material));
        }
        groups
    }

    pub fn total_instances(&self) -> usize {
        self.cube.len() + self.sphere.len() + self.cylinder.len() + self.cone.len()
    }

    fn push(&mut self, kind: Primitive, instance: MeshInstance) {
        match kind {
            Primitive::Cube => self.cube.push(instance),
            Primitive::Sphere => self.sphere.push(instance),
            Primitive::Cylinder => self.cylinder.push(instance),
            Primitive::Cone => self.cone.push(instance),
        }
    }

    /// Packs every group into one buffer-ready list, returning each
    /// primitive's range in draw order.
    pub fn flatten(&self) -> (Vec<MeshInstance>, [(Primitive, InstanceRange); 4]) {
        let mut combined = Vec::with_capacity(self.total_instances());
        let ranges = [
            (Primitive::Cube, append_instances(&mut combined, &self.cube)),
            (Primitive::Sphere, append_instances(&mut combined, &self.sphere)),
            (Primitive::Cylinder, append_instances(&mut combined, &self.cylinder)),
            (Primitive::Cone, append_instances(&mut combined, &self.cone)),
        ];
        (combined, ranges)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstanceRange {
    pub offset: u32,
    pub count: u32,
}

impl InstanceRange {
    pub fn as_range(self) -> std::ops::Range<u32> {
        self.offset..self.offset + self.count
    }
}

fn append_instances(target: &mut Vec<MeshInstance>, source: &[MeshInstance]) -> InstanceRange {
    let offset = target.len() as u32;
    target.extend_from_slice(source);
    InstanceRange {
        offset,
        count: source.len() as u32,
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LightUniform {
    /// xyz position, w light kind code.
    pub position: [f32; 4],
    pub direction: [f32; 4],
    /// rgb colour, a current intensity.
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub eye: [f32; 4],
    /// rgb fog colour, a fog start distance.
    pub fog: [f32; 4],
    /// x fog end distance, y light count.
    pub params: [f32; 4],
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl SceneUniforms {
    pub fn for_frame(frame: &FrameView<'_>) -> Self {
        let mut lights = [LightUniform::default(); MAX_LIGHTS];
        let mut count = 0;
        for (slot, (light, intensity)) in lights.iter_mut().zip(frame.lights.lights()) {
            let [r, g, b] = linear_rgb(light.color);
            *slot = LightUniform {
                position: light.position.extend(light_kind_code(light.kind)).to_array(),
                direction: light.direction().extend(0.0).to_array(),
                color: [r, g, b, intensity],
            };
            count += 1;
        }
        let environment = frame.environment;
        let [fr, fg, fb] = linear_rgb(environment.fog_color);
        SceneUniforms {
            view_projection: frame.view_projection().to_cols_array_2d(),
            eye: frame.eye.extend(1.0).to_array(),
            fog: [fr, fg, fb, environment.fog_near],
            params: [environment.fog_far, count as f32, 0.0, 0.0],
            lights,
        }
    }
}

/// Matches the `LIGHT_*` constants in the mesh shader.
pub fn light_kind_code(kind: LightKind) -> f32 {
    match kind {
        LightKind::Ambient => 0.0,
        LightKind::Hemisphere => 1.0,
        LightKind::Point => 2.0,
        LightKind::Spot => 3.0,
        LightKind::Directional => 4.0,
    }
}

/// Scene colours are authored in sRGB; shading happens in linear space.
pub fn linear_rgb(color: [f32; 3]) -> [f32; 3] {
    color.map(|channel| channel.clamp(0.0, 1.0).powf(2.2))
}

fn build_sphere(lat_divisions: u32, lon_divisions: u32) -> MeshPrimitive {
    let lat_steps = lat_divisions.max(3);
    let lon_steps = lon_divisions.max(6);
    let mut vertices = Vec::with_capacity(((lat_steps + 1) * (lon_steps + 1)) as usize);
    let mut indices = Vec::with_capacity((lat_steps * lon_steps * 6) as usize);

    for lat in 0..=lat_steps {
        let theta = lat as f32 / lat_steps as f32 * PI;
        for lon in 0..=lon_steps {
            let phi = lon as f32 / lon_steps as f32 * PI * 2.0;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            vertices.push(MeshVertex {
                position: (normal * 0.5).into(),
                normal: normal.normalize_or_zero().into(),
            });
        }
    }

    let ring = (lon_steps + 1) as usize;
    for lat in 0..lat_steps as usize {
        for lon in 0..lon_steps as usize {
            let current = (lat * ring + lon) as u16;
            let next = current + ring as u16;
            indices.extend_from_slice(&[current, current + 1, next]);
            indices.extend_from_slice(&[current + 1, next + 1, next]);
        }
    }

    MeshPrimitive::new(vertices, indices)
}

fn build_cube() -> MeshPrimitive {
    // (normal, tangent u, tangent v) with u x v == normal
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (face_index, (normal, u, v)) in faces.iter().enumerate() {
        let base = (face_index * 4) as u16;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            vertices.push(MeshVertex {
                position: (*normal * 0.5 + *u * su + *v * sv).into(),
                normal: (*normal).into(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshPrimitive::new(vertices, indices)
}

fn ring_point(i: u32, segments: u32) -> (f32, f32) {
    let angle = i as f32 / segments as f32 * PI * 2.0;
    (angle.cos() * 0.5, angle.sin() * 0.5)
}

/// Flat disc at height `y` facing up or down.
fn push_cap(vertices: &mut Vec<MeshVertex>, indices: &mut Vec<u16>, segments: u32, y: f32, up: bool) {
    let centre = vertices.len() as u16;
    let normal = if up { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
    vertices.push(MeshVertex {
        position: [0.0, y, 0.0],
        normal,
    });
    for i in 0..segments {
        let (x, z) = ring_point(i, segments);
        vertices.push(MeshVertex {
            position: [x, y, z],
            normal,
        });
    }
    for i in 0..segments {
        let current = centre + 1 + i as u16;
        let next = centre + 1 + ((i + 1) % segments) as u16;
        if up {
            indices.extend_from_slice(&[centre, next, current]);
        } else {
            indices.extend_from_slice(&[centre, current, next]);
        }
    }
}

fn build_cylinder(segments: u32) -> MeshPrimitive {
    let ring = segments.max(3);
    let mut vertices = Vec::with_capacity((ring * 4 + 2) as usize);
    let mut indices = Vec::with_capacity((ring * 12) as usize);

    for i in 0..ring {
        let (x, z) = ring_point(i, ring);
        let normal = Vec3::new(x, 0.0, z).normalize_or_zero().into();
        vertices.push(MeshVertex {
            position: [x, -0.5, z],
            normal,
        });
        vertices.push(MeshVertex {
            position: [x, 0.5, z],
            normal,
        });
    }
    for i in 0..ring {
        let bottom = (i * 2) as u16;
        let top = bottom + 1;
        let next_bottom = (((i + 1) % ring) * 2) as u16;
        let next_top = next_bottom + 1;
        indices.extend_from_slice(&[bottom, top, next_bottom]);
        indices.extend_from_slice(&[next_bottom, top, next_top]);
    }

    push_cap(&mut vertices, &mut indices, ring, 0.5, true);
    push_cap(&mut vertices, &mut indices, ring, -0.5, false);
    MeshPrimitive::new(vertices, indices)
}

fn build_cone(segments: u32) -> MeshPrimitive {
    let ring = segments.max(3);
    let mut vertices = Vec::with_capacity((ring * 3 + 1) as usize);
    let mut indices = Vec::with_capacity((ring * 6) as usize);

    // one apex per segment so each side gets its own smoothed normal
    for i in 0..ring {
        let (x, z) = ring_point(i, ring);
        let (nx, nz) = ring_point(i + 1, ring);
        let side = Vec3::new(x, 0.5, z).normalize_or_zero();
        let apex_normal = Vec3::new(x + nx, 0.5, z + nz).normalize_or_zero();
        let base = vertices.len() as u16;
        vertices.push(MeshVertex {
            position: [0.0, 0.5, 0.0],
            normal: apex_normal.into(),
        });
        vertices.push(MeshVertex {
            position: [x, -0.5, z],
            normal: side.into(),
        });
        vertices.push(MeshVertex {
            position: [nx, -0.5, nz],
            normal: Vec3::new(nx, 0.5, nz).normalize_or_zero().into(),
        });
        indices.extend_from_slice(&[base, base + 2, base + 1]);
    }

    push_cap(&mut vertices, &mut indices, ring, -0.5, false);
    MeshPrimitive::new(vertices, indices)
}
