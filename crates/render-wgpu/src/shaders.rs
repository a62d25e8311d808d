/// Bindings shared by the background and mesh passes (group 0).
const FRAME_BINDINGS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // has_environment, mip_count, has_background, unused
    env: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: Frame;
@group(0) @binding(1) var env_map: texture_2d<f32>;
@group(0) @binding(2) var env_sampler: sampler;
@group(0) @binding(3) var background_map: texture_2d<f32>;

const PI: f32 = 3.141592653589793;
const TAU: f32 = 6.283185307179586;

fn equirect_uv(dir: vec3<f32>) -> vec2<f32> {
    let d = normalize(dir);
    return vec2<f32>(
        atan2(d.z, d.x) / TAU + 0.5,
        0.5 - asin(clamp(d.y, -1.0, 1.0)) / PI,
    );
}
"#;

/// Full-screen triangle shared by the background and blit passes.
const FULLSCREEN: &str = r#"
struct FullscreenOut {
    @builtin(position) position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

fn fullscreen_vertex(index: u32) -> FullscreenOut {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = uv * 2.0 - 1.0;
    var out: FullscreenOut;
    out.position = vec4<f32>(ndc, 1.0, 1.0);
    out.ndc = ndc;
    return out;
}
"#;

const BACKGROUND_BODY: &str = r#"
@vertex
fn vs_background(@builtin(vertex_index) index: u32) -> FullscreenOut {
    return fullscreen_vertex(index);
}

@fragment
fn fs_background(in: FullscreenOut) -> @location(0) vec4<f32> {
    let far_point = frame.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir = far_point.xyz / far_point.w - frame.camera_pos.xyz;
    let color = textureSampleLevel(background_map, env_sampler, equirect_uv(dir), 0.0).rgb;
    return vec4<f32>(color, 1.0);
}
"#;

const BLIT_BODY: &str = r#"
@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> FullscreenOut {
    return fullscreen_vertex(index);
}

@fragment
fn fs_blit(in: FullscreenOut) -> @location(0) vec4<f32> {
    let uv = vec2<f32>(in.ndc.x * 0.5 + 0.5, 0.5 - in.ndc.y * 0.5);
    return textureSample(source, source_sampler, uv);
}
"#;

const PBR_BODY: &str = r#"
struct Material {
    color: vec4<f32>,
    // metalness, roughness, ao intensity, env intensity
    pbr: vec4<f32>,
    // clearcoat, clearcoat roughness, sheen, sheen roughness
    layers: vec4<f32>,
    sheen_color: vec4<f32>,
    // iridescence, film ior, thickness min, thickness max
    iridescence: vec4<f32>,
    // transmission, ior, thickness, displacement scale
    transmission: vec4<f32>,
    // normal scale xy, displacement bias
    normal: vec4<f32>,
    // map, ao, displacement, metalness
    maps_a: vec4<f32>,
    // roughness, normal, alpha, transparent
    maps_b: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
};

@group(1) @binding(0) var<uniform> material: Material;
@group(1) @binding(1) var color_map: texture_2d<f32>;
@group(1) @binding(2) var ao_map: texture_2d<f32>;
@group(1) @binding(3) var displacement_map: texture_2d<f32>;
@group(1) @binding(4) var metalness_map: texture_2d<f32>;
@group(1) @binding(5) var roughness_map: texture_2d<f32>;
@group(1) @binding(6) var normal_map: texture_2d<f32>;
@group(1) @binding(7) var alpha_map: texture_2d<f32>;
@group(1) @binding(8) var map_sampler: sampler;

@group(2) @binding(0) var<uniform> object: Object;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

// Geometry uvs have v pointing up; image rows run top to bottom.
fn image_uv(uv: vec2<f32>) -> vec2<f32> {
    return vec2<f32>(uv.x, 1.0 - uv.y);
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let height = textureSampleLevel(displacement_map, map_sampler, image_uv(in.uv), 0.0).r;
    let offset = (height * material.transmission.w + material.normal.z) * material.maps_a.z;
    let local = in.position + normalize(in.normal) * offset;
    let world = object.model * vec4<f32>(local, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.world_normal = (object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

fn sample_env(dir: vec3<f32>, lod: f32) -> vec3<f32> {
    let c = textureSampleLevel(env_map, env_sampler, equirect_uv(dir), lod).rgb;
    return c * frame.env.x * material.pbr.w;
}

// Coarsest level that still keeps some directional variation.
fn blur_lod() -> f32 {
    return max(frame.env.y - 4.0, 0.0);
}

// Analytic fit of the split-sum DFG term.
fn env_brdf(roughness: f32, n_dot_v: f32) -> vec2<f32> {
    let c0 = vec4<f32>(-1.0, -0.0275, -0.572, 0.022);
    let c1 = vec4<f32>(1.0, 0.0425, 1.04, -0.04);
    let r = roughness * c0 + c1;
    let a004 = min(r.x * r.x, exp2(-9.28 * n_dot_v)) * r.x + r.y;
    return vec2<f32>(-1.04, 1.04) * a004 + r.zw;
}

fn sheen_brdf(n_dot_v: f32, roughness: f32) -> f32 {
    let r2 = roughness * roughness;
    let smooth_sheen = roughness < 0.25;
    let a = select(-8.48 * r2 + 14.3 * roughness - 9.95, -339.2 * r2 + 161.4 * roughness - 25.9, smooth_sheen);
    let b = select(1.97 * r2 - 3.27 * roughness + 0.72, 44.0 * r2 - 23.7 * roughness + 3.26, smooth_sheen);
    let dg = exp(a * n_dot_v + b) + select(0.1 * (roughness - 0.25), 0.0, smooth_sheen);
    return clamp(dg / PI, 0.0, 1.0);
}

// Interference colour of a thin film over the surface.
fn thin_film(n_dot_v: f32, film_ior: f32, thickness_nm: f32) -> vec3<f32> {
    let sin2_t = (1.0 - n_dot_v * n_dot_v) / (film_ior * film_ior);
    let cos_t = sqrt(max(1.0 - sin2_t, 0.0));
    let path = 2.0 * film_ior * thickness_nm * cos_t;
    let phase = TAU * path / vec3<f32>(650.0, 510.0, 475.0);
    return 0.5 + 0.5 * cos(phase);
}

fn perturb_normal(pos: vec3<f32>, n: vec3<f32>, map_n: vec3<f32>, uv: vec2<f32>) -> vec3<f32> {
    let q0 = dpdx(pos);
    let q1 = dpdy(pos);
    let st0 = dpdx(uv);
    let st1 = dpdy(uv);
    let q1perp = cross(q1, n);
    let q0perp = cross(n, q0);
    let t = q1perp * st0.x + q0perp * st1.x;
    let b = q1perp * st0.y + q0perp * st1.y;
    let det = max(dot(t, t), dot(b, b));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return normalize(t * (map_n.x * scale) + b * (map_n.y * scale) + n * map_n.z);
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let uv = image_uv(in.uv);
    let texel = textureSample(color_map, map_sampler, uv);
    let ao_texel = textureSample(ao_map, map_sampler, uv);
    let metal_texel = textureSample(metalness_map, map_sampler, uv);
    let rough_texel = textureSample(roughness_map, map_sampler, uv);
    let normal_texel = textureSample(normal_map, map_sampler, uv);
    let alpha_texel = textureSample(alpha_map, map_sampler, uv);

    let face = select(-1.0, 1.0, front);
    let geometry_n = normalize(in.world_normal) * face;
    var map_n = normal_texel.xyz * 2.0 - 1.0;
    map_n = vec3<f32>(map_n.xy * material.normal.xy * face, map_n.z);
    let mapped_n = perturb_normal(in.world_pos, geometry_n, map_n, in.uv);
    let n = normalize(mix(geometry_n, mapped_n, material.maps_b.y));

    let base = material.color.rgb * mix(vec3<f32>(1.0), texel.rgb, material.maps_a.x);
    let metalness = clamp(material.pbr.x * mix(1.0, metal_texel.b, material.maps_a.w), 0.0, 1.0);
    let roughness = clamp(material.pbr.y * mix(1.0, rough_texel.g, material.maps_b.x), 0.0525, 1.0);
    let ao = mix(1.0, (ao_texel.r - 1.0) * material.pbr.z + 1.0, material.maps_a.y);

    let v = normalize(frame.camera_pos.xyz - in.world_pos);
    let n_dot_v = clamp(dot(n, v), 1e-4, 1.0);
    let ior = max(material.transmission.y, 1.0);
    let f0_dielectric = pow((ior - 1.0) / (ior + 1.0), 2.0);
    let f0 = mix(vec3<f32>(f0_dielectric), base, metalness);

    let dfg = env_brdf(roughness, n_dot_v);
    var fss = f0 * dfg.x + dfg.y;
    let film = thin_film(n_dot_v, max(material.iridescence.y, 1.0), material.iridescence.w);
    fss = mix(fss, film * dfg.x + dfg.y, material.iridescence.x);

    let r = normalize(mix(reflect(-v, n), n, roughness * roughness));
    let radiance = sample_env(r, roughness * blur_lod());
    let irradiance = sample_env(n, blur_lod());

    let diffuse_color = base * (1.0 - metalness);
    var diffuse = diffuse_color * irradiance * (1.0 - fss) * ao;
    let specular = fss * radiance * ao;

    // Thin walls pass light straight through; thicker volumes bend it.
    let bend = clamp(material.transmission.z, 0.0, 1.0);
    let through = normalize(mix(-v, refract(-v, n, 1.0 / ior), bend));
    let transmitted = sample_env(through, roughness * blur_lod()) * diffuse_color * (1.0 - fss);
    diffuse = mix(diffuse, transmitted, material.transmission.x);

    let sheen_color = material.sheen_color.rgb * material.layers.z;
    let sheen_rough = clamp(material.layers.w, 0.07, 1.0);
    let sheen = irradiance * sheen_color * sheen_brdf(n_dot_v, sheen_rough);
    let sheen_scale = 1.0 - 0.157 * max(sheen_color.r, max(sheen_color.g, sheen_color.b));

    var color = (diffuse + specular) * sheen_scale + sheen;

    let cc_rough = clamp(material.layers.y, 0.0525, 1.0);
    let cc_n_dot_v = clamp(dot(geometry_n, v), 1e-4, 1.0);
    let cc_dfg = env_brdf(cc_rough, cc_n_dot_v);
    let cc_f = 0.04 * cc_dfg.x + cc_dfg.y;
    let cc_radiance = sample_env(reflect(-v, geometry_n), cc_rough * blur_lod());
    let cc_fresnel = 0.04 + 0.96 * pow(1.0 - cc_n_dot_v, 5.0);
    color = color * (1.0 - material.layers.x * cc_fresnel) + material.layers.x * cc_f * cc_radiance;

    let alpha = material.color.a * mix(1.0, texel.a, material.maps_a.x)
        * mix(1.0, alpha_texel.g, material.maps_b.z);
    return vec4<f32>(color, select(1.0, alpha, material.maps_b.w > 0.5));
}
"#;

/// Equirectangular background behind everything.
pub fn background_shader() -> String {
    [FRAME_BINDINGS, FULLSCREEN, BACKGROUND_BODY].concat()
}

/// Image-lit physically-based mesh shading.
pub fn pbr_shader() -> String {
    [FRAME_BINDINGS, PBR_BODY].concat()
}

/// Copy of the offscreen target onto the swapchain.
pub fn blit_shader() -> String {
    [FULLSCREEN, BLIT_BODY].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_points_present() {
        let pbr = pbr_shader();
        assert!(pbr.contains("fn vs_main"));
        assert!(pbr.contains("fn fs_main"));
        assert!(background_shader().contains("fn fs_background"));
        assert!(blit_shader().contains("fn fs_blit"));
    }

    #[test]
    fn blit_does_not_pull_in_frame_bindings() {
        assert!(!blit_shader().contains("var<uniform> frame"));
    }
}
