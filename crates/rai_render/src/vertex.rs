#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
    pub color: [f32; 4],
}

/// Two counter-clockwise triangles over the four vertices from `SpriteVertex::quad`.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

impl SpriteVertex {
    /// Corners of an axis-aligned quad in world space, bottom-left first and
    /// counter-clockwise. `uv` is `[u0, v0, u1, v1]` with v0 at the top edge
    /// of the image.
    pub fn quad(center: [f32; 2], size: [f32; 2], uv: [f32; 4], color: [f32; 4]) -> [Self; 4] {
        let half_w = size[0] * 0.5;
        let half_h = size[1] * 0.5;
        let [u0, v0, u1, v1] = uv;
        [
            Self {
                position: [center[0] - half_w, center[1] - half_h],
                tex_coords: [u0, v1],
                color,
            },
            Self {
                position: [center[0] + half_w, center[1] - half_h],
                tex_coords: [u1, v1],
                color,
            },
            Self {
                position: [center[0] + half_w, center[1] + half_h],
                tex_coords: [u1, v0],
                color,
            },
            Self {
                position: [center[0] - half_w, center[1] + half_h],
                tex_coords: [u0, v0],
                color,
            },
        ]
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}
