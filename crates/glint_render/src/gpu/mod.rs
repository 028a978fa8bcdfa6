//! Headless wgpu backend.
//!
//! Runs a user-supplied WGSL shader over a full-screen quad into an
//! offscreen `Rgba8Unorm` texture and reads the result back. The shader
//! must provide `vs_main` and `fs_main` entry points, declare
//! `const SPHERE_CAPACITY` and `const QUAD_CAPACITY`, and bind
//!
//! ```wgsl
//! @group(0) @binding(0) var<uniform> sceneData: SceneData;
//! @group(0) @binding(1) var<uniform> batch: BatchParams; // numSamples: i32, rngState: f32
//! ```

mod uniforms;

pub use uniforms::UniformBlock;

use glint_core::{Camera, Scene, SceneSchema};
use wgpu::util::DeviceExt;

use crate::marshal::{marshal, NUM_SAMPLES, RNG_STATE};
use crate::{BackendError, Binding, ParamValue, RenderBackend};

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Two triangles covering clip space.
const FULL_SCREEN_QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [-1.0, 1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [1.0, -1.0],
];

/// Settings for [`WgpuBackend::new`].
#[derive(Debug, Clone)]
pub struct GpuConfig {
    pub width: u32,
    pub height: u32,
    pub schema: SceneSchema,
    /// WGSL source of the sampling shader
    pub shader_source: String,
}

/// Read a `const NAME ... = <integer>` declaration from WGSL source.
pub fn declared_capacity(source: &str, name: &str) -> Option<usize> {
    source.lines().map(str::trim).find_map(|line| {
        let rest = line.strip_prefix("const")?.trim_start().strip_prefix(name)?;
        if !rest.starts_with(|c: char| c == ':' || c == '=' || c.is_whitespace()) {
            return None;
        }
        let (_, value) = rest.split_once('=')?;
        let digits: String = value
            .trim_start()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    })
}

fn shader_schema(source: &str) -> Result<SceneSchema, BackendError> {
    Ok(SceneSchema {
        spheres: declared_capacity(source, "SPHERE_CAPACITY")
            .ok_or(BackendError::MissingCapacity("SPHERE_CAPACITY"))?,
        quads: declared_capacity(source, "QUAD_CAPACITY")
            .ok_or(BackendError::MissingCapacity("QUAD_CAPACITY"))?,
    })
}

/// Backend rendering on the default GPU adapter without a window.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    scene_buffer: wgpu::Buffer,
    batch_buffer: wgpu::Buffer,
    output_texture: wgpu::Texture,
    output_view: wgpu::TextureView,
    readback_buffer: wgpu::Buffer,
    padded_bytes_per_row: u32,
    scene_block: UniformBlock,
    batch_block: UniformBlock,
    width: u32,
    height: u32,
    schema: SceneSchema,
}

impl WgpuBackend {
    /// Create the device, pipeline and buffers. Blocks until the adapter
    /// and device are ready.
    pub fn new(config: &GpuConfig) -> Result<Self, BackendError> {
        pollster::block_on(Self::new_async(config))
    }

    async fn new_async(config: &GpuConfig) -> Result<Self, BackendError> {
        let declared = shader_schema(&config.shader_source)?;
        if declared != config.schema {
            return Err(BackendError::SchemaMismatch {
                shader: declared,
                expected: config.schema,
            });
        }

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(BackendError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("Using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Glint Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // Layouts come from the same grammar the marshaler emits
        let empty = Scene::new(config.schema, 0, Camera::default());
        let scene_block = UniformBlock::from_bindings(&marshal(&empty, config.width, config.height));
        let batch_block = UniformBlock::from_bindings(&[
            Binding::new(NUM_SAMPLES, 0),
            Binding::new(RNG_STATE, 0.0_f32),
        ]);

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: scene_block.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let batch_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Batch Uniform Buffer"),
            size: batch_block.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: scene_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: batch_buffer.as_entire_binding(),
                },
            ],
        });

        // Compile and link errors in user WGSL would otherwise hit the
        // uncaptured error handler, which panics
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sampling Shader"),
            source: wgpu::ShaderSource::Wgsl(config.shader_source.as_str().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sampling Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sampling Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: OUTPUT_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = device.pop_error_scope().await {
            return Err(BackendError::ShaderCompile(error.to_string()));
        }

        // One-time geometry: the quad covering every output pixel
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Full Screen Quad"),
            contents: bytemuck::cast_slice(&FULL_SCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let output_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Output Texture"),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let output_view = output_texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Buffer rows must be aligned to 256 bytes
        let unpadded_bytes_per_row = config.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: u64::from(padded_bytes_per_row) * u64::from(config.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        log::info!(
            "GPU backend ready: {}x{}, scene block {} bytes",
            config.width,
            config.height,
            scene_block.size()
        );

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group,
            vertex_buffer,
            scene_buffer,
            batch_buffer,
            output_texture,
            output_view,
            readback_buffer,
            padded_bytes_per_row,
            scene_block,
            batch_block,
            width: config.width,
            height: config.height,
            schema: config.schema,
        })
    }

    fn flush_uniforms(&mut self) {
        if self.scene_block.take_dirty() {
            self.queue
                .write_buffer(&self.scene_buffer, 0, self.scene_block.bytes());
        }
        if self.batch_block.take_dirty() {
            self.queue
                .write_buffer(&self.batch_buffer, 0, self.batch_block.bytes());
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn schema(&self) -> SceneSchema {
        self.schema
    }

    fn bind(&mut self, name: &str, value: ParamValue) -> Result<(), BackendError> {
        if self.batch_block.contains(name) {
            self.batch_block.write(name, value)
        } else {
            self.scene_block.write(name, value)
        }
    }

    fn draw(&mut self) -> Result<(), BackendError> {
        self.flush_uniforms();
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Batch Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Batch Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.output_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.draw(0..FULL_SCREEN_QUAD.len() as u32, 0..1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.output_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(Some(encoder.finish()));

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(BackendError::Device(error.to_string())),
            None => Ok(()),
        }
    }

    fn read_pixels(&mut self, dst: &mut [u8]) -> Result<(), BackendError> {
        let expected = self.frame_len();
        if dst.len() != expected {
            return Err(BackendError::BufferSize {
                expected,
                found: dst.len(),
            });
        }

        let slice = self.readback_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| BackendError::Device("readback callback dropped".into()))??;

        {
            let data = slice.get_mapped_range();
            let row_len = self.width as usize * 4;
            let padded = self.padded_bytes_per_row as usize;
            for (row, out) in dst.chunks_exact_mut(row_len).enumerate() {
                let start = row * padded;
                out.copy_from_slice(&data[start..start + row_len]);
            }
        }
        self.readback_buffer.unmap();
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.device.poll(wgpu::Maintain::Poll);
        Ok(())
    }
}
