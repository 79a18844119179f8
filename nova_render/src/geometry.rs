/// Quad geometry and the per-frame spin transform
///
/// The demo draws one colored quad: four vertices, six indices forming two
/// triangles that share a diagonal. The transform is a single MVP matrix
/// recomputed from elapsed time each tick.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// One vertex: 2D position plus RGB color
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    /// Vertex buffer binding description (binding 0, per-vertex rate)
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::default()
            .binding(0)
            .stride(std::mem::size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
    }

    /// Attribute descriptions for position (location 0) and color (location 1)
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription::default()
                .location(0)
                .binding(0)
                .format(vk::Format::R32G32_SFLOAT)
                .offset(std::mem::offset_of!(Vertex, pos) as u32),
            vk::VertexInputAttributeDescription::default()
                .location(1)
                .binding(0)
                .format(vk::Format::R32G32B32_SFLOAT)
                .offset(std::mem::offset_of!(Vertex, color) as u32),
        ]
    }
}

/// The quad's four corners
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { pos: [-0.5, -0.5], color: [1.0, 0.0, 0.0] },
    Vertex { pos: [0.5, -0.5], color: [0.0, 1.0, 0.0] },
    Vertex { pos: [0.5, 0.5], color: [0.0, 0.0, 1.0] },
    Vertex { pos: [-0.5, 0.5], color: [1.0, 1.0, 1.0] },
];

/// Two triangles sharing the 0-2 diagonal
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Uniform block layout matching the vertex shader's binding 0
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TransformUbo {
    pub mvp: Mat4,
}

/// Full rotation period of the quad, in seconds
const SPIN_PERIOD_SECS: f32 = 4.0;

/// Compute the MVP matrix for a given elapsed time and target extent
///
/// Model spins around Z at one revolution per [`SPIN_PERIOD_SECS`], viewed
/// from above at an angle, with a perspective projection flipped for
/// Vulkan's inverted Y clip space.
pub fn spin_transform(elapsed_secs: f32, width: u32, height: u32) -> Mat4 {
    let angle = elapsed_secs * std::f32::consts::TAU / SPIN_PERIOD_SECS;
    let model = Mat4::from_rotation_z(angle);

    let view = Mat4::look_at_rh(
        Vec3::new(0.0, -1.5, 1.5),
        Vec3::ZERO,
        Vec3::Z,
    );

    let aspect = width as f32 / height.max(1) as f32;
    let mut projection = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, aspect, 0.1, 10.0);
    projection.y_axis.y *= -1.0;

    projection * view * model
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
