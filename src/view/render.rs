use wgpu::*;

use crate::model::{CameraUniform, EnvironmentUniform, Scene, BACKGROUND_COLOR};
use crate::utils::{self, MeshBuffer, Vertex};

/// Shared bind-group layouts plus the global uniform buffers and fallback
/// texture used by every draw.
pub struct SceneBindings {
    pub globals_layout: BindGroupLayout,
    pub model_layout: BindGroupLayout,
    pub texture_layout: BindGroupLayout,
    pub camera_buffer: Buffer,
    pub environment_buffer: Buffer,
    pub globals_bind_group: BindGroup,
    pub fallback_texture: Texture,
    pub fallback_texture_bind_group: BindGroup,
}

pub struct ScenePipelines {
    pub lit: RenderPipeline,
    pub line: RenderPipeline,
}

const VERTEX_ATTRIBUTES: [VertexAttribute; 4] = [
    VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: VertexFormat::Float32x3,
    },
    VertexAttribute {
        offset: 12,
        shader_location: 1,
        format: VertexFormat::Float32x3,
    },
    VertexAttribute {
        offset: 24,
        shader_location: 2,
        format: VertexFormat::Float32x4,
    },
    VertexAttribute {
        offset: 40,
        shader_location: 3,
        format: VertexFormat::Float32x2,
    },
];

fn vertex_layout() -> VertexBufferLayout<'static> {
    VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
        step_mode: VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Depth32Float,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub fn create_scene_bindings(device: &Device, queue: &Queue) -> SceneBindings {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let environment_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("environment_buffer"),
        size: std::mem::size_of::<EnvironmentUniform>() as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let globals_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("globals_bind_group_layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let model_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("model_bind_group_layout"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let texture_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("texture_bind_group_layout"),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension: TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let globals_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("globals_bind_group"),
        layout: &globals_layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 1,
                resource: environment_buffer.as_entire_binding(),
            },
        ],
    });

    // Untextured objects sample plain white.
    let (fallback_texture, fallback_texture_bind_group) = utils::create_texture_bind_group(
        device,
        queue,
        &texture_layout,
        1,
        1,
        &[255, 255, 255, 255],
    );

    SceneBindings {
        globals_layout,
        model_layout,
        texture_layout,
        camera_buffer,
        environment_buffer,
        globals_bind_group,
        fallback_texture,
        fallback_texture_bind_group,
    }
}

pub fn create_scene_pipelines(
    device: &Device,
    format: TextureFormat,
    bindings: &SceneBindings,
    depth_format: TextureFormat,
) -> ScenePipelines {
    let scene_shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("scene_shader"),
        source: ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
    });
    let grid_shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("grid_shader"),
        source: ShaderSource::Wgsl(include_str!("../shaders/grid.wgsl").into()),
    });

    let lit_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("lit_pipeline_layout"),
        bind_group_layouts: &[
            &bindings.globals_layout,
            &bindings.model_layout,
            &bindings.texture_layout,
        ],
        push_constant_ranges: &[],
    });

    let lit = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("lit_pipeline"),
        layout: Some(&lit_layout),
        vertex: VertexState {
            module: &scene_shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &scene_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: Some(Face::Back),
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: depth_format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });

    let line_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("line_pipeline_layout"),
        bind_group_layouts: &[&bindings.globals_layout, &bindings.model_layout],
        push_constant_ranges: &[],
    });

    let line = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("line_pipeline"),
        layout: Some(&line_layout),
        vertex: VertexState {
            module: &grid_shader,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &grid_shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::ALPHA_BLENDING),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::LineList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: depth_format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    });

    ScenePipelines { lit, line }
}

/// Consolidated per-frame render state.
pub struct RenderState {
    pub format: TextureFormat,
    pub alpha_mode: CompositeAlphaMode,
    pub width: u32,
    pub height: u32,
    pub pipelines: ScenePipelines,
    pub egui_renderer: egui_wgpu::Renderer,
    pub egui_primitives: Option<Vec<egui::ClippedPrimitive>>,
    pub egui_textures_delta: Option<egui::TexturesDelta>,
    pub egui_dpr: f32,
}

fn draw_mesh(rp: &mut RenderPass<'_>, mesh: &MeshBuffer) {
    if mesh.index_count == 0 {
        return;
    }
    rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
    rp.draw_indexed(0..mesh.index_count, 0, 0..1);
}

impl RenderState {
    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
        scene: &Scene,
        depth_view: &TextureView,
        bindings: &SceneBindings,
    ) {
        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Lost) => {
                surface.configure(
                    device,
                    &SurfaceConfiguration {
                        usage: TextureUsages::RENDER_ATTACHMENT,
                        format: self.format,
                        width: self.width,
                        height: self.height,
                        present_mode: PresentMode::Fifo,
                        alpha_mode: self.alpha_mode,
                        view_formats: vec![],
                        desired_maximum_frame_latency: 2,
                    },
                );
                surface
                    .get_current_texture()
                    .expect("Failed to acquire frame after reconfigure")
            }
            Err(e) => panic!("Surface error: {e:?}"),
        };

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color {
                            r: BACKGROUND_COLOR[0],
                            g: BACKGROUND_COLOR[1],
                            b: BACKGROUND_COLOR[2],
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipelines.lit);
            rp.set_bind_group(0, &bindings.globals_bind_group, &[]);
            rp.set_bind_group(2, &bindings.fallback_texture_bind_group, &[]);

            rp.set_bind_group(1, &scene.ground.bind_group, &[]);
            draw_mesh(&mut rp, &scene.ground.mesh);

            for handle in &scene.obstacle_handles {
                rp.set_bind_group(1, &handle.bind_group, &[]);
                draw_mesh(&mut rp, &handle.mesh);
            }

            if let Some(character) = &scene.character {
                rp.set_bind_group(1, &character.handle.bind_group, &[]);
                rp.set_bind_group(
                    2,
                    character
                        .texture_bind_group
                        .as_ref()
                        .unwrap_or(&bindings.fallback_texture_bind_group),
                    &[],
                );
                draw_mesh(&mut rp, &character.handle.mesh);
            }

            rp.set_pipeline(&self.pipelines.line);
            rp.set_bind_group(0, &bindings.globals_bind_group, &[]);
            rp.set_bind_group(1, &scene.grid.bind_group, &[]);
            draw_mesh(&mut rp, &scene.grid.mesh);
        }

        // egui overlay, when the shell queued one this frame
        if let (Some(primitives), Some(textures_delta)) =
            (self.egui_primitives.take(), self.egui_textures_delta.take())
        {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.width, self.height],
                pixels_per_point: self.egui_dpr,
            };

            for (id, image_delta) in &textures_delta.set {
                self.egui_renderer
                    .update_texture(device, queue, *id, image_delta);
            }
            self.egui_renderer.update_buffers(
                device,
                queue,
                &mut encoder,
                &primitives,
                &screen_descriptor,
            );

            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                self.egui_renderer.render(
                    &mut egui_pass.forget_lifetime(),
                    &primitives,
                    &screen_descriptor,
                );
            }

            for id in &textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }
}
