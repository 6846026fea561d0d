use bytemuck::{Pod, Zeroable};

pub(super) const MESH_SHADER_SOURCE: &str = r#"
const MAX_LIGHTS: u32 = 8u;
const LIGHT_AMBIENT: f32 = 0.0;
const LIGHT_HEMISPHERE: f32 = 1.0;
const LIGHT_POINT: f32 = 2.0;
const LIGHT_SPOT: f32 = 3.0;
const SPOT_OUTER_COS: f32 = 0.80;
const SPOT_INNER_COS: f32 = 0.92;
const GROUND_COLOR: vec3<f32> = vec3<f32>(0.1, 0.08, 0.06);

struct Light {
    position: vec4<f32>,
    direction: vec4<f32>,
    color: vec4<f32>,
};

struct SceneUniforms {
    view_projection: mat4x4<f32>,
    eye: vec4<f32>,
    fog: vec4<f32>,
    params: vec4<f32>,
    lights: array<Light, 8>,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) normal_0: vec4<f32>,
    @location(7) normal_1: vec4<f32>,
    @location(8) normal_2: vec4<f32>,
    @location(9) color: vec4<f32>,
    @location(10) emissive: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
    @location(3) emissive: vec3<f32>,
};

@vertex
fn mesh_vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(instance.model_0, instance.model_1, instance.model_2, instance.model_3);
    let normal_matrix = mat3x3<f32>(
        instance.normal_0.xyz,
        instance.normal_1.xyz,
        instance.normal_2.xyz,
    );
    let world = model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = scene.view_projection * world;
    out.world_position = world.xyz;
    out.normal = normalize(normal_matrix * vertex.normal);
    out.color = instance.color.rgb;
    out.emissive = instance.emissive.rgb;
    return out;
}

fn light_contribution(light: Light, position: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    let kind = light.position.w;
    let radiance = light.color.rgb * light.color.a;
    if kind == LIGHT_AMBIENT {
        return radiance;
    }
    if kind == LIGHT_HEMISPHERE {
        let up = normal.y * 0.5 + 0.5;
        return mix(GROUND_COLOR * light.color.a, radiance, up);
    }
    if kind == LIGHT_POINT || kind == LIGHT_SPOT {
        let offset = light.position.xyz - position;
        let distance = length(offset);
        let to_light = offset / max(distance, 0.0001);
        var strength = max(dot(normal, to_light), 0.0) / (1.0 + 0.02 * distance * distance);
        if kind == LIGHT_SPOT {
            let cos_angle = dot(-to_light, light.direction.xyz);
            strength = strength * smoothstep(SPOT_OUTER_COS, SPOT_INNER_COS, cos_angle);
        }
        return radiance * strength;
    }
    // directional
    return radiance * max(dot(normal, -light.direction.xyz), 0.0);
}

@fragment
fn mesh_fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let count = min(u32(scene.params.y), MAX_LIGHTS);
    var lighting = vec3<f32>(0.0, 0.0, 0.0);
    for (var i = 0u; i < count; i = i + 1u) {
        lighting = lighting + light_contribution(scene.lights[i], input.world_position, normal);
    }
    let lit = input.color * lighting + input.emissive;
    let distance = length(input.world_position - scene.eye.xyz);
    let fog = smoothstep(scene.fog.w, scene.params.x, distance);
    return vec4<f32>(mix(lit, scene.fog.rgb, fog), 1.0);
}
"#;

pub(super) const HUD_SHADER_SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn hud_vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@group(0) @binding(0)
var panel_texture: texture_2d<f32>;
@group(0) @binding(1)
var panel_sampler: sampler;

@fragment
fn hud_fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(panel_texture, panel_sampler, clamp(input.uv, vec2<f32>(0.0), vec2<f32>(1.0)));
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];
