use bytemuck::NoUninit;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Per-object uniform: model matrix plus a material tint.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ModelUniform {
    pub fn new(model: glam::Mat4, color: [f32; 4]) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffer {
    /// Swap in a new vertex buffer (same index buffer), releasing the old one.
    pub fn replace_vertices(&mut self, device: &wgpu::Device, vertices: &[Vertex]) {
        self.vertex_buffer.destroy();
        self.vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
    }

    /// Release GPU memory now instead of waiting for drop.
    pub fn destroy(&self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// A drawable scene object: uploaded mesh plus its model uniform and bind group.
pub struct ModelHandle {
    pub mesh: MeshBuffer,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ModelHandle {
    pub fn new(
        device: &wgpu::Device,
        model_layout: &wgpu::BindGroupLayout,
        mesh: &Mesh,
        uniform: ModelUniform,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model_uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model_bind_group"),
            layout: model_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            mesh: mesh.upload(device),
            uniform_buffer,
            bind_group,
        }
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, uniform: ModelUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    pub fn destroy(&self) {
        self.mesh.destroy();
        self.uniform_buffer.destroy();
    }
}

/// Upload an RGBA8 image and build its bind group for the texture slot.
pub fn create_texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture_layout: &wgpu::BindGroupLayout,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> (wgpu::Texture, wgpu::BindGroup) {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("base_color_texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        pixels,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("base_color_sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture_bind_group"),
        layout: texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
    });
    (texture, bind_group)
}

/// Flat ground quad centered on the origin at y = 0, normal up.
pub fn create_ground_mesh(width: f32, depth: f32) -> Mesh {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let color = [1.0, 1.0, 1.0, 1.0];
    let normal = [0.0, 1.0, 0.0];

    let vertices = vec![
        Vertex { pos: [-hw, 0.0, -hd], normal, color, uv: [0.0, 0.0] },
        Vertex { pos: [-hw, 0.0, hd], normal, color, uv: [0.0, 1.0] },
        Vertex { pos: [hw, 0.0, hd], normal, color, uv: [1.0, 1.0] },
        Vertex { pos: [hw, 0.0, -hd], normal, color, uv: [1.0, 0.0] },
    ];
    let indices = vec![0, 1, 2, 0, 2, 3];

    Mesh { vertices, indices }
}

/// Reference grid in the ground plane, drawn as a line list.
pub fn create_grid_mesh(size: f32, divisions: u32) -> Mesh {
    let half = size / 2.0;
    let step = size / divisions as f32;
    // Slightly above the ground quad so the lines survive the depth test.
    let y = 0.05;
    let color = [0.0, 0.0, 0.0, 0.2];
    let normal = [0.0, 1.0, 0.0];

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for i in 0..=divisions {
        let offset = -half + i as f32 * step;

        let base = vertices.len() as u32;
        vertices.push(Vertex { pos: [offset, y, -half], normal, color, uv: [0.0, 0.0] });
        vertices.push(Vertex { pos: [offset, y, half], normal, color, uv: [0.0, 1.0] });
        vertices.push(Vertex { pos: [-half, y, offset], normal, color, uv: [0.0, 0.0] });
        vertices.push(Vertex { pos: [half, y, offset], normal, color, uv: [1.0, 0.0] });
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 3]);
    }

    Mesh { vertices, indices }
}

/// Solid box centered on the origin with per-face normals.
pub fn create_box_mesh(half_extents: glam::Vec3, color: [f32; 4]) -> Mesh {
    let (hx, hy, hz) = (half_extents.x, half_extents.y, half_extents.z);

    // (face normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]],
        ),
        (
            [1.0, 0.0, 0.0],
            [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.iter().zip(uvs) {
            vertices.push(Vertex {
                pos: *corner,
                normal,
                color,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_mesh_covers_six_faces() {
        let mesh = create_box_mesh(glam::Vec3::new(25.0, 25.0, 20.0), [1.0; 4]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);

        for v in &mesh.vertices {
            assert!(v.pos[0].abs() <= 25.0 && v.pos[1].abs() <= 25.0 && v.pos[2].abs() <= 20.0);
        }
    }

    #[test]
    fn grid_mesh_line_count() {
        let mesh = create_grid_mesh(20.0, 20);
        // 21 lines per axis, 2 endpoints each
        assert_eq!(mesh.vertices.len(), 21 * 4);
        assert_eq!(mesh.indices.len(), 21 * 4);
    }
}
