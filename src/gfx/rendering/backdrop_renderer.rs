//! GPU side of the backdrop plane.
//!
//! Uploads the newest video frame, folds the provider's cover scale together
//! with the reference-aspect base size, and draws the quad first in the
//! scene pass without writing depth.

use crate::gfx::background::{BackgroundProvider, REFERENCE_ASPECT};
use crate::gfx::resources::TextureResource;
use crate::wgpu_utils::UniformBuffer;

/// Must match the `BackdropUniform` struct in `backdrop.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BackdropUniform {
    scale: [f32; 2],
    _pad: [f32; 2],
}

pub struct BackdropRenderer {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    uniform: UniformBuffer<BackdropUniform>,
    texture: Option<TextureResource>,
    texture_size: (u32, u32),
    bind_group: Option<wgpu::BindGroup>,
    active: bool,
}

impl BackdropRenderer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Backdrop Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("backdrop.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Backdrop Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Backdrop Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Backdrop Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // Behind everything: depth is neither tested nor written.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            layout,
            uniform: UniformBuffer::new(device),
            texture: None,
            texture_size: (0, 0),
            bind_group: None,
            active: false,
        }
    }

    /// Refreshes texture, frame data, and scale for this frame. Must run
    /// before the scene pass is encoded.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        provider: &mut BackgroundProvider,
        viewport_aspect: f32,
    ) {
        self.active = provider.plane_active();
        if !self.active {
            return;
        }
        let Some(plane) = provider.plane_mut() else {
            self.active = false;
            return;
        };

        let dimensions = plane.dimensions();
        if self.texture.is_none() || self.texture_size != dimensions {
            let texture = TextureResource::create_video_texture(
                device,
                dimensions.0,
                dimensions.1,
                "Backdrop Feed",
            );
            self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Backdrop Bind Group"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: self.uniform.binding_resource(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
            }));
            self.texture = Some(texture);
            self.texture_size = dimensions;
        }

        if let (Some(texture), Some(frame)) = (&self.texture, plane.pump_frame()) {
            texture.upload_rgba(queue, frame, dimensions.0, dimensions.1);
        }

        // Base size maps the 16:9 reference into this viewport; the cover
        // scale then guarantees full coverage on both axes.
        let base_x = REFERENCE_ASPECT / viewport_aspect.max(f32::EPSILON);
        let (sx, sy) = plane.scale();
        self.uniform.update_content(
            queue,
            BackdropUniform {
                scale: [base_x * sx, sy],
                _pad: [0.0; 2],
            },
        );
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if !self.active {
            return;
        }
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}
