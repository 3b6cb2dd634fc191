//! WGPU-based render engine for the viewer.
//!
//! Owns the surface, device, and the three draw stages the viewer needs:
//! the backdrop plane, the forward object pass, and the optional
//! post-processing composite, with a UI overlay hook at the end. Scene
//! content, backdrop state, and camera data are pushed in from the active
//! stage; the engine never reaches into coordination state on its own.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::gfx::background::BackgroundProvider;
use crate::gfx::camera::camera_utils::CameraUniform;
use crate::gfx::resources::{GlobalUniforms, LightConfig, TextureResource};
use crate::gfx::scene::{SceneRegistry, Vertex3D};
use crate::wgpu_utils::UniformBuffer;

use super::backdrop_renderer::BackdropRenderer;
use super::post::PostProcess;

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,

    global_ubo: UniformBuffer<GlobalUniforms>,
    global_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    object_pipeline: wgpu::RenderPipeline,

    backdrop: BackdropRenderer,
    post: Option<PostProcess>,

    clear_color: wgpu::Color,
    light: LightConfig,
}

impl RenderEngine {
    /// Creates a render engine for the given window.
    ///
    /// # Panics
    /// Panics if no wgpu adapter or device is available; without a GPU the
    /// viewer cannot start at all.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to request a device!");

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let global_ubo = UniformBuffer::new(&device);
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: global_ubo.binding_resource(),
            }],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Forward Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("forward.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[&global_layout, &object_layout],
            push_constant_ranges: &[],
        });
        let object_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Forward Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let backdrop = BackdropRenderer::new(&device, format);

        RenderEngine {
            surface,
            device: device.into(),
            queue: queue.into(),
            config,
            format,
            depth_texture,
            global_ubo,
            global_bind_group,
            object_layout,
            object_pipeline,
            backdrop,
            post: None,
            clear_color: wgpu::Color::BLACK,
            light: LightConfig::default(),
        }
    }

    /// Resizes the surface, depth buffer, and any post-processing targets.
    ///
    /// Zero dimensions (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");

        if let Some(post) = self.post.as_mut() {
            post.resize(&self.device, self.format, width, height);
        }
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn object_layout(&self) -> &wgpu::BindGroupLayout {
        &self.object_layout
    }

    pub fn set_clear_color(&mut self, color: [f32; 3]) {
        self.clear_color = wgpu::Color {
            r: color[0] as f64,
            g: color[1] as f64,
            b: color[2] as f64,
            a: 1.0,
        };
    }

    pub fn set_light(&mut self, light: LightConfig) {
        self.light = light;
    }

    /// Enables or disables the post-processing composite stage.
    pub fn set_post_processing(&mut self, enabled: bool) {
        if enabled && self.post.is_none() {
            self.post = Some(PostProcess::new(
                &self.device,
                self.format,
                self.config.width,
                self.config.height,
            ));
        } else if !enabled {
            self.post = None;
        }
    }

    /// Pushes camera and light data into the global uniform buffer.
    pub fn update(&mut self, camera_uniform: CameraUniform) {
        self.global_ubo
            .update_content(&self.queue, GlobalUniforms::compose(camera_uniform, self.light));
    }

    /// Uploads GPU resources for new objects and flushes dirty transforms.
    pub fn prepare_scene(&self, registry: &mut SceneRegistry) {
        registry.init_gpu_resources(&self.device, &self.object_layout);
        registry.update_transforms(&self.queue);
    }

    /// Refreshes the backdrop plane's texture and scale for this frame.
    pub fn prepare_backdrop(&mut self, provider: &mut BackgroundProvider) {
        let aspect = self.config.width as f32 / self.config.height as f32;
        self.backdrop
            .prepare(&self.device, &self.queue, provider, aspect);
    }

    /// Renders one frame: backdrop, scene objects, post composite, UI.
    pub fn render_frame<F>(&mut self, registry: &SceneRegistry, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(err) => {
                log::error!("skipping frame: {err}");
                return;
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // Scene pass: into the post target when post-processing is active,
        // straight to the surface otherwise.
        let scene_view = self
            .post
            .as_ref()
            .map(|post| post.scene_view())
            .unwrap_or(&surface_view);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: scene_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.backdrop.draw(&mut pass);

            pass.set_pipeline(&self.object_pipeline);
            pass.set_bind_group(0, &self.global_bind_group, &[]);
            for (_, object) in registry.iter() {
                if !object.visible {
                    continue;
                }
                let Some(bind_group) = object.bind_group() else {
                    continue;
                };
                pass.set_bind_group(1, bind_group, &[]);
                for mesh in &object.meshes {
                    let (Some(vertices), Some(indices)) =
                        (mesh.vertex_buffer(), mesh.index_buffer())
                    else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, vertices.slice(..));
                    pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
                }
            }
        }

        if let Some(post) = &self.post {
            post.composite(&mut encoder, &surface_view);
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }
}
