//! wgpu backend implementation
//!
//! The host keeps its own device and queue and renders the navigated scene
//! into the views returned by [`WgpuBackend::render_target_views`], using
//! [`crate::scene::Camera::gpu_projection_matrix`]. This backend only runs
//! the passes the navigation controls need.

mod shaders;

use crate::backend::traits::*;
use crate::backend::types::*;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{mpsc, Arc};

/// Views of a render target for host-side rendering
pub struct RenderTargetViews<'a> {
    /// Color attachment, multisampled when the target is
    pub color: &'a wgpu::TextureView,
    /// Resolve target for multisampled color
    pub resolve: Option<&'a wgpu::TextureView>,
    pub depth: Option<&'a wgpu::TextureView>,
    pub sample_count: u32,
}

struct GpuRenderTarget {
    desc: RenderTargetDescriptor,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    resolve: Option<(wgpu::Texture, wgpu::TextureView)>,
    depth: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl GpuRenderTarget {
    /// Single-sampled color texture holding the final image
    fn readable_color(&self) -> (&wgpu::Texture, &wgpu::TextureView) {
        match &self.resolve {
            Some((texture, view)) => (texture, view),
            None => (&self.color, &self.color_view),
        }
    }
}

struct FullscreenPipeline {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
}

struct DepthBlit {
    single_sampled: FullscreenPipeline,
    multisampled: FullscreenPipeline,
}

struct ReadbackBuffer {
    buffer: wgpu::Buffer,
    size: u64,
}

/// wgpu backend implementation
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    size: (u32, u32),
    pixel_ratio: f32,
    surface_format: Option<wgpu::TextureFormat>,

    targets: HashMap<u64, GpuRenderTarget>,
    blits: HashMap<u64, DepthBlit>,
    next_id: u64,
    active_target: Option<RenderTargetHandle>,

    readback: Option<ReadbackBuffer>,
    present_pipeline: Option<FullscreenPipeline>,
    present_view: Option<wgpu::TextureView>,
}

impl WgpuBackend {
    fn convert_texture_format(format: TextureFormat) -> wgpu::TextureFormat {
        match format {
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        }
    }

    /// Wrap a device created by the host
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            device,
            queue,
            size: (width.max(1), height.max(1)),
            pixel_ratio: 1.0,
            surface_format: None,
            targets: HashMap::new(),
            blits: HashMap::new(),
            next_id: 1,
            active_target: None,
            readback: None,
            present_pipeline: None,
            present_view: None,
        }
    }

    /// Create a backend on its own device without a surface
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new_headless(width: u32, height: u32) -> BackendResult<Self> {
        pollster::block_on(Self::new_headless_async(width, height))
    }

    pub async fn new_headless_async(width: u32, height: u32) -> BackendResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BackendError::InitializationFailed("No suitable adapter found".into()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?} backend)",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Navigation Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::DeviceCreationFailed(e.to_string()))?;

        Ok(Self::new(Arc::new(device), Arc::new(queue), width, height))
    }

    /// Format of the surface [`NavigationBackend::present`] draws into
    pub fn with_surface_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.set_surface_format(format);
        self
    }

    pub fn set_surface_format(&mut self, format: wgpu::TextureFormat) {
        if self.surface_format != Some(format) {
            self.surface_format = Some(format);
            self.present_pipeline = None;
        }
    }

    /// Surface texture view for the current frame
    pub fn set_present_view(&mut self, view: wgpu::TextureView) {
        self.present_view = Some(view);
    }

    /// Set the logical viewport size. Render targets are resized by their owner.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        if ratio > 0.0 && ratio.is_finite() {
            self.pixel_ratio = ratio;
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn render_target_views(&self, target: RenderTargetHandle) -> Option<RenderTargetViews<'_>> {
        let target = self.targets.get(&target.0)?;
        Some(RenderTargetViews {
            color: &target.color_view,
            resolve: target.resolve.as_ref().map(|(_, view)| view),
            depth: target.depth.as_ref().map(|(_, view)| view),
            sample_count: target.desc.sample_count,
        })
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn target(&self, target: RenderTargetHandle) -> BackendResult<&GpuRenderTarget> {
        self.targets
            .get(&target.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("render target {:?}", target)))
    }

    fn create_texture(
        &self,
        label: Option<&str>,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        sample_count: u32,
        usage: wgpu::TextureUsages,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    fn allocate_target(&self, desc: &RenderTargetDescriptor) -> BackendResult<GpuRenderTarget> {
        let max_size = self.device.limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max_size || desc.height > max_size {
            return Err(BackendError::TextureCreationFailed(format!(
                "{:?}: size {}x{} outside 1..={}",
                desc.label, desc.width, desc.height, max_size
            )));
        }
        if desc.color_format.is_depth() {
            return Err(BackendError::TextureCreationFailed(format!(
                "{:?}: color format {:?} is a depth format",
                desc.label, desc.color_format
            )));
        }

        let label = desc.label.as_deref();
        let color_format = Self::convert_texture_format(desc.color_format);
        let sample_count = desc.sample_count.max(1);
        let readable = wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC;

        let (color, color_view, resolve) = if sample_count > 1 {
            let (color, color_view) = self.create_texture(
                label,
                desc.width,
                desc.height,
                color_format,
                sample_count,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            );
            let resolve =
                self.create_texture(label, desc.width, desc.height, color_format, 1, readable);
            (color, color_view, Some(resolve))
        } else {
            let (color, color_view) =
                self.create_texture(label, desc.width, desc.height, color_format, 1, readable);
            (color, color_view, None)
        };

        let depth = desc.depth.then(|| {
            self.create_texture(
                label,
                desc.width,
                desc.height,
                wgpu::TextureFormat::Depth32Float,
                sample_count,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            )
        });

        Ok(GpuRenderTarget {
            desc: desc.clone(),
            color,
            color_view,
            resolve,
            depth,
        })
    }

    fn create_fullscreen_pipeline(
        &self,
        label: &str,
        source: String,
        texture_binding: wgpu::BindingType,
        target_format: wgpu::TextureFormat,
    ) -> FullscreenPipeline {
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Owned(source)),
            });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: texture_binding,
                        count: None,
                    }],
                });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

        FullscreenPipeline {
            bind_group_layout,
            pipeline,
        }
    }

    /// Record and submit one full-screen draw
    fn draw_fullscreen(
        &self,
        label: &str,
        pipeline: &FullscreenPipeline,
        texture: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &pipeline.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(texture),
            }],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
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
            pass.set_pipeline(&pipeline.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_readback_buffer(&mut self, size: u64) {
        if matches!(&self.readback, Some(readback) if readback.size >= size) {
            return;
        }
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pixel readback"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        self.readback = Some(ReadbackBuffer { buffer, size });
    }
}

impl NavigationBackend for WgpuBackend {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<RenderTargetHandle> {
        let target = self.allocate_target(desc)?;
        log::debug!(
            "WgpuBackend: created render target {:?} ({}x{}, {} samples)",
            desc.label,
            desc.width,
            desc.height,
            desc.sample_count
        );
        let id = self.allocate_id();
        self.targets.insert(id, target);
        Ok(RenderTargetHandle(id))
    }

    fn resize_render_target(
        &mut self,
        target: RenderTargetHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        let mut desc = self.target(target)?.desc.clone();
        if desc.width == width && desc.height == height {
            return Ok(());
        }
        desc.width = width;
        desc.height = height;
        let resized = self.allocate_target(&desc)?;
        self.targets.insert(target.0, resized);
        Ok(())
    }

    fn render_target_size(&self, target: RenderTargetHandle) -> Option<(u32, u32)> {
        self.targets
            .get(&target.0)
            .map(|t| (t.desc.width, t.desc.height))
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) {
        if let Some(target) = self.targets.remove(&target.0) {
            target.color.destroy();
            if let Some((texture, _)) = target.resolve {
                texture.destroy();
            }
            if let Some((texture, _)) = target.depth {
                texture.destroy();
            }
        }
        if self.active_target == Some(target) {
            self.active_target = None;
        }
    }

    fn render_target(&self) -> Option<RenderTargetHandle> {
        self.active_target
    }

    fn set_render_target(&mut self, target: Option<RenderTargetHandle>) {
        self.active_target = target;
    }

    fn create_depth_blit(&mut self) -> BackendResult<DepthBlitHandle> {
        let depth_binding = |multisampled| wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled,
        };
        let blit = DepthBlit {
            single_sampled: self.create_fullscreen_pipeline(
                "depth blit",
                shaders::depth_blit_source(false),
                depth_binding(false),
                wgpu::TextureFormat::Rgba32Float,
            ),
            multisampled: self.create_fullscreen_pipeline(
                "depth blit (multisampled)",
                shaders::depth_blit_source(true),
                depth_binding(true),
                wgpu::TextureFormat::Rgba32Float,
            ),
        };
        let id = self.allocate_id();
        self.blits.insert(id, blit);
        Ok(DepthBlitHandle(id))
    }

    fn destroy_depth_blit(&mut self, blit: DepthBlitHandle) {
        self.blits.remove(&blit.0);
    }

    fn draw_depth_blit(
        &mut self,
        blit: DepthBlitHandle,
        source: RenderTargetHandle,
    ) -> BackendResult<()> {
        let active = self.active_target.ok_or(BackendError::NoActiveRenderTarget)?;
        let blit = self
            .blits
            .get(&blit.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("depth blit {:?}", blit)))?;
        let source = self.target(source)?;
        let (_, depth_view) = source.depth.as_ref().ok_or_else(|| {
            BackendError::InvalidHandle("blit source has no depth attachment".to_string())
        })?;
        let target = self.target(active)?;
        if target.desc.color_format != TextureFormat::Rgba32Float || target.desc.sample_count > 1 {
            return Err(BackendError::FormatMismatch {
                expected: TextureFormat::Rgba32Float,
                found: target.desc.color_format,
            });
        }

        let pipeline = if source.desc.sample_count > 1 {
            &blit.multisampled
        } else {
            &blit.single_sampled
        };
        self.draw_fullscreen("depth blit", pipeline, depth_view, &target.color_view);
        Ok(())
    }

    fn read_render_target_pixels(
        &mut self,
        target: RenderTargetHandle,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        out: &mut [f32],
    ) -> BackendResult<()> {
        let (format, target_width, target_height) = {
            let target = self.target(target)?;
            (target.desc.color_format, target.desc.width, target.desc.height)
        };
        if width == 0 || height == 0 || x + width > target_width || y + height > target_height {
            return Err(BackendError::ReadbackFailed(format!(
                "region {}x{} at ({}, {}) exceeds {}x{}",
                width, height, x, y, target_width, target_height
            )));
        }
        if out.len() < (width * height * 4) as usize {
            return Err(BackendError::ReadbackFailed(
                "output buffer too small".to_string(),
            ));
        }

        let bytes_per_pixel = format.bytes_per_pixel();
        let unpadded_row = width * bytes_per_pixel;
        let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row = unpadded_row.div_ceil(alignment) * alignment;
        let buffer_size = u64::from(padded_row) * u64::from(height);

        // Bottom-left origin: the region's lowest row is furthest down the texture
        let texture_origin_y = target_height - (y + height);

        let device = self.device.clone();
        let queue = self.queue.clone();
        self.ensure_readback_buffer(buffer_size);
        let (Some(readback), Ok(source)) = (self.readback.as_ref(), self.target(target)) else {
            return Err(BackendError::ReadbackFailed("readback buffer missing".to_string()));
        };
        let (texture, _) = source.readable_color();

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pixel readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x,
                    y: texture_origin_y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback.buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.buffer.slice(..buffer_size);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|e| BackendError::ReadbackFailed(e.to_string()))?
            .map_err(|e| BackendError::ReadbackFailed(e.to_string()))?;

        {
            let data = slice.get_mapped_range();
            for texture_row in 0..height {
                // Texture rows run top to bottom, output rows bottom to top
                let out_row = height - 1 - texture_row;
                let start = (texture_row * padded_row) as usize;
                let row = &data[start..start + unpadded_row as usize];
                let out_start = (out_row * width * 4) as usize;
                let out_row = &mut out[out_start..out_start + (width * 4) as usize];
                match format {
                    TextureFormat::Rgba32Float => {
                        for (value, bytes) in out_row.iter_mut().zip(row.chunks_exact(4)) {
                            *value = bytemuck::pod_read_unaligned(bytes);
                        }
                    }
                    _ => {
                        for (value, byte) in out_row.iter_mut().zip(row) {
                            *value = f32::from(*byte) / 255.0;
                        }
                    }
                }
            }
        }
        readback.buffer.unmap();
        Ok(())
    }

    fn present(&mut self, source: RenderTargetHandle) -> BackendResult<()> {
        let format = self.surface_format.ok_or_else(|| {
            BackendError::Unsupported("no surface format configured for present".to_string())
        })?;
        if self.present_pipeline.is_none() {
            self.present_pipeline = Some(self.create_fullscreen_pipeline(
                "present",
                shaders::present_source(),
                wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                format,
            ));
        }

        let view = self.present_view.take().ok_or_else(|| {
            BackendError::Unsupported("no surface view set for this frame".to_string())
        })?;
        let (_, color_view) = self.target(source)?.readable_color();
        if let Some(pipeline) = &self.present_pipeline {
            self.draw_fullscreen("present", pipeline, color_view, &view);
        }
        Ok(())
    }
}
