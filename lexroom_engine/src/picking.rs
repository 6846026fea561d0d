//! Screen-space picking against the scene graph.
//!
//! A click is unprojected into a world ray, every mesh is tested against its
//! unit primitive (box, sphere, cylinder or cone) in its own local frame, and
//! the nearest hit resolves to its owning inspectable through the graph's
//! side table.

use glam::{Mat4, Vec2, Vec3};

use crate::scene::{NodeId, Primitive, SceneGraph};

const RADIUS: f32 = 0.5;
const HALF_HEIGHT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Ray { origin, direction }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Builds a world ray through `ndc` (x right, y up, both in [-1, 1]).
    pub fn from_ndc(ndc: Vec2, view_projection: Mat4) -> Option<Ray> {
        let inverse = view_projection.inverse();
        if !inverse.is_finite() {
            return None;
        }
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let direction = (far - near).try_normalize()?;
        Some(Ray::new(near, direction))
    }
}

/// Converts a pixel position (origin top-left) to normalized device coordinates.
pub fn screen_to_ndc(x: f32, y: f32, width: u32, height: u32) -> Option<Vec2> {
    if width == 0 || height == 0 {
        return None;
    }
    Some(Vec2::new(
        x / width as f32 * 2.0 - 1.0,
        -(y / height as f32) * 2.0 + 1.0,
    ))
}

/// Slab test against the box spanning [-0.5, 0.5] on each axis.
/// Returns the entry distance along the ray, clamped to zero when the origin
/// is inside the box.
pub fn intersect_unit_box(origin: Vec3, direction: Vec3) -> Option<f32> {
    let mut t_near = f32::MIN;
    let mut t_far = f32::MAX;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-10 {
            if !(-0.5..=0.5).contains(&o) {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let mut t1 = (-0.5 - o) * inv;
        let mut t2 = (0.5 - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_near = t_near.max(t1);
        t_far = t_far.min(t2);
        if t_near > t_far || t_far < 0.0 {
            return None;
        }
    }

    Some(t_near.max(0.0))
}

/// Entry distance into a unit primitive, as drawn: the sphere has diameter 1,
/// the cylinder and cone have diameter 1 and height 1 along Y with the cone's
/// apex at the top.
pub fn intersect_primitive(primitive: Primitive, origin: Vec3, direction: Vec3) -> Option<f32> {
    match primitive {
        Primitive::Cube => intersect_unit_box(origin, direction),
        Primitive::Sphere => intersect_unit_sphere(origin, direction),
        Primitive::Cylinder => intersect_unit_cylinder(origin, direction),
        Primitive::Cone => intersect_unit_cone(origin, direction),
    }
}

/// Real roots of `a t^2 + b t + c`, smallest first. Degenerates to the
/// linear root when `a` vanishes.
fn quadratic_roots(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < 1e-10 {
        if b.abs() < 1e-10 {
            return None;
        }
        let t = -c / b;
        return Some((t, t));
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let (t1, t2) = ((-b - root) / (2.0 * a), (-b + root) / (2.0 * a));
    Some((t1.min(t2), t1.max(t2)))
}

fn nearest(candidates: impl IntoIterator<Item = f32>) -> Option<f32> {
    candidates
        .into_iter()
        .filter(|t| *t >= 0.0 && t.is_finite())
        .min_by(f32::total_cmp)
}

fn within_height(origin: Vec3, direction: Vec3, t: f32) -> bool {
    (origin.y + direction.y * t).abs() <= HALF_HEIGHT + 1e-6
}

/// Hit on the flat disc of radius `radius` at height `y`.
fn disc_hit(origin: Vec3, direction: Vec3, y: f32, radius: f32) -> Option<f32> {
    if direction.y.abs() < 1e-10 {
        return None;
    }
    let t = (y - origin.y) / direction.y;
    let x = origin.x + direction.x * t;
    let z = origin.z + direction.z * t;
    (x * x + z * z <= radius * radius).then_some(t)
}

/// Returns zero when the origin is inside the sphere.
pub fn intersect_unit_sphere(origin: Vec3, direction: Vec3) -> Option<f32> {
    let c = origin.length_squared() - RADIUS * RADIUS;
    if c <= 0.0 {
        return Some(0.0);
    }
    let (t1, t2) = quadratic_roots(
        direction.length_squared(),
        2.0 * origin.dot(direction),
        c,
    )?;
    nearest([t1, t2])
}

pub fn intersect_unit_cylinder(origin: Vec3, direction: Vec3) -> Option<f32> {
    let side = quadratic_roots(
        direction.x * direction.x + direction.z * direction.z,
        2.0 * (origin.x * direction.x + origin.z * direction.z),
        origin.x * origin.x + origin.z * origin.z - RADIUS * RADIUS,
    )
    .map(|(t1, t2)| [t1, t2])
    .unwrap_or([f32::NAN; 2]);
    let walls = side
        .into_iter()
        .filter(|t| t.is_finite() && within_height(origin, direction, *t));
    let caps = [HALF_HEIGHT, -HALF_HEIGHT]
        .into_iter()
        .filter_map(|y| disc_hit(origin, direction, y, RADIUS));
    nearest(walls.chain(caps))
}

/// The cone's radius shrinks linearly from `RADIUS` at the base to zero at
/// the apex: `r(y) = (HALF_HEIGHT - y) / 2`.
pub fn intersect_unit_cone(origin: Vec3, direction: Vec3) -> Option<f32> {
    let w0 = (HALF_HEIGHT - origin.y) * 0.5;
    let w1 = -direction.y * 0.5;
    let side = quadratic_roots(
        direction.x * direction.x + direction.z * direction.z - w1 * w1,
        2.0 * (origin.x * direction.x + origin.z * direction.z - w0 * w1),
        origin.x * origin.x + origin.z * origin.z - w0 * w0,
    )
    .map(|(t1, t2)| [t1, t2])
    .unwrap_or([f32::NAN; 2]);
    let walls = side
        .into_iter()
        .filter(|t| t.is_finite() && within_height(origin, direction, *t));
    let base = disc_hit(origin, direction, -HALF_HEIGHT, RADIUS);
    nearest(walls.chain(base))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f32,
}

/// Nearest mesh hit by `ray`, whether or not it is inspectable.
pub fn nearest_hit(graph: &SceneGraph, ray: &Ray) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for (node, primitive, _, world) in graph.meshes() {
        let inverse = world.inverse();
        if !inverse.is_finite() {
            continue;
        }
        // the ray parameter is preserved by affine maps, so distances stay comparable
        let origin = inverse.transform_point3(ray.origin);
        let direction = inverse.transform_vector3(ray.direction);
        let Some(distance) = intersect_primitive(primitive, origin, direction) else {
            continue;
        };
        if best.is_none_or(|hit| distance < hit.distance) {
            best = Some(PickHit { node, distance });
        }
    }
    best
}

/// Resolves a ray to the inspectable owning the nearest hit. A nearest hit
/// with no inspectable owner yields nothing, even if something tagged lies
/// further along the ray.
pub fn pick(graph: &SceneGraph, ray: &Ray) -> Option<NodeId> {
    let hit = nearest_hit(graph, ray)?;
    let owner = graph.owner(hit.node);
    if owner.is_none() {
        log::debug!(
            "pick hit '{}' which has no inspectable owner",
            graph.node(hit.node).map(|n| n.name.as_str()).unwrap_or("?")
        );
    }
    owner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{InspectableKind, InspectableMetadata, Material, Primitive, Transform};

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn scene() -> (SceneGraph, NodeId) {
        let mut graph = SceneGraph::new();
        graph.add_mesh(
            "floor",
            None,
            Transform::IDENTITY.scaled(Vec3::new(20.0, 0.01, 20.0)),
            Primitive::Cube,
            Material::solid(0x202020),
        );
        let doc = graph.add_inspectable_group(
            "doc",
            None,
            Transform::at(0.0, 1.0, 0.0),
            InspectableMetadata::new(InspectableKind::Evidence, Some("EVIDENCE REPORT")),
        );
        graph.add_mesh(
            "paper",
            Some(doc),
            Transform::IDENTITY.scaled(Vec3::new(0.5, 0.02, 0.6)),
            Primitive::Cube,
            Material::solid(0xf5f5dc),
        );
        (graph, doc)
    }

    #[test]
    fn unit_box_entry_distance() {
        let t = intersect_unit_box(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert!(approx_eq(t, 4.5));
        assert!(intersect_unit_box(Vec3::new(2.0, 0.0, 5.0), Vec3::NEG_Z).is_none());
        assert!(intersect_unit_box(Vec3::new(0.0, 0.0, 5.0), Vec3::Z).is_none());
    }

    #[test]
    fn round_primitives_miss_their_box_corners() {
        // through the (x, z) corner of the unit box, outside every round shape
        let corner = (Vec3::new(0.45, 5.0, 0.45), Vec3::NEG_Y);
        assert!(intersect_primitive(Primitive::Cube, corner.0, corner.1).is_some());
        for primitive in [Primitive::Sphere, Primitive::Cylinder, Primitive::Cone] {
            assert!(
                intersect_primitive(primitive, corner.0, corner.1).is_none(),
                "{primitive:?}"
            );
        }
    }

    #[test]
    fn round_primitive_entry_distances() {
        let origin = Vec3::new(0.0, 0.0, 5.0);
        let t = intersect_unit_sphere(origin, Vec3::NEG_Z).unwrap();
        assert!(approx_eq(t, 4.5));

        // side wall of the cylinder, then its top cap from above
        let t = intersect_unit_cylinder(Vec3::new(0.0, 0.3, 5.0), Vec3::NEG_Z).unwrap();
        assert!(approx_eq(t, 4.5));
        let t = intersect_unit_cylinder(Vec3::new(0.2, 3.0, 0.0), Vec3::NEG_Y).unwrap();
        assert!(approx_eq(t, 2.5));

        // the cone narrows to radius 0.25 at mid height and is flat underneath
        let t = intersect_unit_cone(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X).unwrap();
        assert!(approx_eq(t, 4.75));
        let t = intersect_unit_cone(Vec3::new(0.3, -3.0, 0.0), Vec3::Y).unwrap();
        assert!(approx_eq(t, 2.5));
        assert!(intersect_unit_cone(Vec3::new(5.0, 0.45, 0.1), Vec3::NEG_X).is_none());
    }

    #[test]
    fn nearest_hit_sees_past_a_sphere_corner() {
        let mut graph = SceneGraph::new();
        let ball = graph.add_mesh(
            "ball",
            None,
            Transform::at(0.0, 1.0, 0.0),
            Primitive::Sphere,
            Material::solid(0xff0000),
        );
        let floor = graph.add_mesh(
            "floor",
            None,
            Transform::IDENTITY.scaled(Vec3::new(4.0, 0.1, 4.0)),
            Primitive::Cube,
            Material::solid(0x202020),
        );
        graph.update_world();
        let corner = Ray::new(Vec3::new(0.45, 3.0, 0.45), Vec3::NEG_Y);
        assert_eq!(nearest_hit(&graph, &corner).map(|h| h.node), Some(floor));
        let centre = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y);
        assert_eq!(nearest_hit(&graph, &centre).map(|h| h.node), Some(ball));
    }

    #[test]
    fn screen_center_maps_to_origin() {
        let ndc = screen_to_ndc(400.0, 300.0, 800, 600).unwrap();
        assert!(approx_eq(ndc.x, 0.0) && approx_eq(ndc.y, 0.0));
        let corner = screen_to_ndc(0.0, 0.0, 800, 600).unwrap();
        assert_eq!(corner, Vec2::new(-1.0, 1.0));
        assert!(screen_to_ndc(1.0, 1.0, 0, 600).is_none());
    }

    #[test]
    fn ndc_ray_runs_along_view_axis() {
        let eye = Vec3::new(0.0, 5.0, 5.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(65f32.to_radians(), 1.0, 0.1, 100.0);
        let ray = Ray::from_ndc(Vec2::ZERO, projection * view).unwrap();
        let expected = (Vec3::ZERO - eye).normalize();
        assert!((ray.direction - expected).length() < 1e-3);
        assert!((ray.point_at(0.0) - eye).length() < 0.2);
    }

    #[test]
    fn pick_resolves_child_to_tagged_group() {
        let (graph, doc) = scene();
        let ray = Ray::new(Vec3::new(0.1, 5.0, 0.1), Vec3::NEG_Y);
        assert_eq!(pick(&graph, &ray), Some(doc));
    }

    #[test]
    fn floor_hit_picks_nothing() {
        let (graph, _) = scene();
        let ray = Ray::new(Vec3::new(5.0, 5.0, 5.0), Vec3::NEG_Y);
        let hit = nearest_hit(&graph, &ray).unwrap();
        assert_eq!(graph.node(hit.node).unwrap().name, "floor");
        assert_eq!(pick(&graph, &ray), None);
    }

    #[test]
    fn rotated_mesh_uses_oriented_bounds() {
        let mut graph = SceneGraph::new();
        let plank = graph.add_mesh(
            "plank",
            None,
            Transform::IDENTITY
                .rotated(0.0, std::f32::consts::FRAC_PI_4, 0.0)
                .scaled(Vec3::new(4.0, 0.1, 0.1)),
            Primitive::Cube,
            Material::solid(0),
        );
        // inside the axis-aligned hull but off the rotated plank
        let miss = Ray::new(Vec3::new(1.2, 2.0, 1.2), Vec3::NEG_Y);
        assert!(nearest_hit(&graph, &miss).is_none());
        let hit = Ray::new(Vec3::new(1.0, 2.0, -1.0), Vec3::NEG_Y);
        assert_eq!(nearest_hit(&graph, &hit).map(|h| h.node), Some(plank));
    }
}
