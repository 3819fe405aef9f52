//! WGSL sources for the navigation passes

/// Full-screen triangle strip shared by every pass. Draw with 4 vertices.
const FULLSCREEN_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32(index & 1u), f32((index >> 1u) & 1u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

fn texel(uv: vec2<f32>, dimensions: vec2<u32>) -> vec2<i32> {
    let max_texel = vec2<i32>(dimensions) - vec2<i32>(1, 1);
    return clamp(vec2<i32>(uv * vec2<f32>(dimensions)), vec2<i32>(0, 0), max_texel);
}
"#;

const DEPTH_BLIT_FRAGMENT: &str = r#"
@group(0) @binding(0) var depth_texture: texture_depth_2d;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let depth = textureLoad(depth_texture, texel(in.uv, textureDimensions(depth_texture)), 0);
    return vec4<f32>(depth, depth, depth, 1.0);
}
"#;

const DEPTH_BLIT_MULTISAMPLED_FRAGMENT: &str = r#"
@group(0) @binding(0) var depth_texture: texture_depth_multisampled_2d;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let depth = textureLoad(depth_texture, texel(in.uv, textureDimensions(depth_texture)), 0);
    return vec4<f32>(depth, depth, depth, 1.0);
}
"#;

const PRESENT_FRAGMENT: &str = r#"
@group(0) @binding(0) var color_texture: texture_2d<f32>;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureLoad(color_texture, texel(in.uv, textureDimensions(color_texture)), 0);
}
"#;

pub fn depth_blit_source(multisampled: bool) -> String {
    let fragment = if multisampled {
        DEPTH_BLIT_MULTISAMPLED_FRAGMENT
    } else {
        DEPTH_BLIT_FRAGMENT
    };
    format!("{}{}", FULLSCREEN_VERTEX, fragment)
}

pub fn present_source() -> String {
    format!("{}{}", FULLSCREEN_VERTEX, PRESENT_FRAGMENT)
}
