//! GPU drawing back-end.
//!
//! [`GpuCanvas`] implements [`Renderer`] with wgpu. Draw calls are recorded
//! as instanced shapes during the frame and replayed at
//! [`end_frame`](Renderer::end_frame), each run of same-target,
//! same-blend shapes as one draw call.
//!
//! Like the software canvas, frames are never cleared. The output target is
//! a persistent `Rgba8Unorm` texture that the background fill fades a little
//! every frame. Supersampling draws into an offscreen texture `k` times
//! larger per axis, and a box-filter pass averages it onto the output.
//! [`GpuCanvas::present`] then copies the output onto the swapchain.
//!
//! Targets store sRGB-encoded bytes and blend them directly, as the software
//! canvas does, so a non-sRGB swapchain format is preferred.

mod composite;
mod shapes;

use std::sync::Arc;

use glam::Vec2;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::color::Rgb;
use crate::error::{GpuError, RenderError};
use crate::render::Renderer;
use crate::visuals::BlendMode;
use composite::{Blitter, Downsampler};
use shapes::{ShapeBatch, ShapeInstance, ShapePipelines, Step, Target};

pub use composite::{downsample_wgsl, present_wgsl};
pub use shapes::SHAPES_WGSL;

/// Format of the output and offscreen targets.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Shapes the instance buffer holds before it has to grow.
const INITIAL_INSTANCE_CAPACITY: usize = 4096;

/// Present mode for the `vsync` option.
pub fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

/// Blend state matching the software canvas for each [`BlendMode`].
pub fn blend_state(mode: BlendMode) -> wgpu::BlendState {
    match mode {
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        },
    }
}

/// A texture that shapes are drawn into.
struct RenderTarget {
    view: wgpu::TextureView,
    /// Target size uniform for the shape pipelines.
    globals: wgpu::BindGroup,
    width: u32,
    height: u32,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        shapes: &ShapePipelines,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Clear Encoder"),
        });
        begin_pass(&mut encoder, &view, wgpu::LoadOp::Clear(wgpu::Color::BLACK), "Clear Pass");
        queue.submit(std::iter::once(encoder.finish()));

        Self {
            view,
            globals: shapes.bind_target(device, width, height),
            width,
            height,
        }
    }
}

/// The supersample target plus the bind group that downsamples it.
struct Offscreen {
    target: RenderTarget,
    downsample: wgpu::BindGroup,
}

/// Window-backed [`Renderer`].
pub struct GpuCanvas {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    shapes: ShapePipelines,
    downsampler: Downsampler,
    blitter: Blitter,
    output: RenderTarget,
    output_blit: wgpu::BindGroup,
    offscreen: Option<Offscreen>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    batch: ShapeBatch,
    target: Target,
    scale: f32,
    blend: BlendMode,
    frames: u64,
}

impl GpuCanvas {
    /// Set up drawing of `width x height` frames shown in `window`.
    pub async fn new(window: Arc<Window>, width: u32, height: u32, vsync: bool) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Canvas Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(GpuError::NoAdapter)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "GPU canvas: {} ({:?}), surface {:?} {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            config.present_mode
        );

        let shapes = ShapePipelines::new(&device);
        let downsampler = Downsampler::new(&device);
        let blitter = Blitter::new(&device, format);
        let output = RenderTarget::new(&device, &queue, &shapes, width, height, "Output Target");
        let output_blit = blitter.bind(&device, &output.view);
        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            shapes,
            downsampler,
            blitter,
            output,
            output_blit,
            offscreen: None,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            batch: ShapeBatch::default(),
            target: Target::Output,
            scale: 1.0,
            blend: BlendMode::Alpha,
            frames: 0,
        })
    }

    #[inline]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Frames completed so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Reconfigure the swapchain for a new window size.
    ///
    /// The render targets keep the configured frame size; the frame is
    /// stretched to the window when presented.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Reconfigure with the current size, after the surface was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Show the output target.
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Present Encoder"),
            });
        {
            let mut pass = begin_pass(&mut encoder, &view, wgpu::LoadOp::Clear(wgpu::Color::BLACK), "Present Pass");
            pass.set_pipeline(self.blitter.pipeline());
            pass.set_bind_group(0, &self.output_blit, &[]);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }

    fn push(&mut self, shape: ShapeInstance) {
        self.batch.push(self.target, self.blend, shape);
    }

    fn upload_instances(&mut self) {
        let instances = self.batch.instances();
        if instances.is_empty() {
            return;
        }
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
        }
        self.queue
            .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
    }

    /// Replay and submit everything recorded since the last flush.
    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        self.upload_instances();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Canvas Encoder"),
            });

        for step in self.batch.steps() {
            match step {
                Step::Shapes {
                    target,
                    blend,
                    instances,
                } => {
                    let target = match (target, self.offscreen.as_ref()) {
                        (Target::Offscreen, Some(offscreen)) => &offscreen.target,
                        _ => &self.output,
                    };
                    let mut pass = begin_pass(&mut encoder, &target.view, wgpu::LoadOp::Load, "Shape Pass");
                    pass.set_pipeline(self.shapes.pipeline(*blend));
                    pass.set_bind_group(0, &target.globals, &[]);
                    pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
                    pass.draw(0..6, instances.clone());
                }
                Step::Composite => {
                    if let Some(offscreen) = self.offscreen.as_ref() {
                        let mut pass =
                            begin_pass(&mut encoder, &self.output.view, wgpu::LoadOp::Load, "Downsample Pass");
                        pass.set_pipeline(self.downsampler.pipeline());
                        pass.set_bind_group(0, &offscreen.downsample, &[]);
                        pass.draw(0..3, 0..1);
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.batch.clear();
    }
}

impl Renderer for GpuCanvas {
    fn output_size(&self) -> (u32, u32) {
        (self.output.width, self.output.height)
    }

    fn begin_frame(&mut self) {
        self.blend = BlendMode::Alpha;
    }

    fn end_frame(&mut self) {
        self.flush();
        self.frames += 1;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn fill_surface(&mut self, color: Rgb, alpha: u8) {
        self.push(ShapeInstance::fill(color, alpha));
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8) {
        self.push(ShapeInstance::disc(center, radius, self.scale, color, alpha));
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgb, alpha: u8) {
        self.push(ShapeInstance::line(from, to, self.scale, color, alpha));
    }

    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.flush();
        let limit = self.device.limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(RenderError::OffscreenTooLarge { width, height, limit });
        }

        let target = RenderTarget::new(&self.device, &self.queue, &self.shapes, width, height, "Offscreen Target");
        let factor = (width / self.output.width.max(1)).max(1);
        let downsample = self.downsampler.bind(&self.device, &target.view, factor);
        self.offscreen = Some(Offscreen { target, downsample });
        Ok(())
    }

    fn release_offscreen(&mut self) {
        self.flush();
        self.offscreen = None;
        self.target = Target::Output;
        self.scale = 1.0;
    }

    fn bind_offscreen(&mut self, scale: f32) {
        if self.offscreen.is_some() {
            self.target = Target::Offscreen;
            self.scale = scale;
        }
    }

    fn bind_output(&mut self) {
        self.target = Target::Output;
        self.scale = 1.0;
    }

    fn composite_offscreen(&mut self) {
        if self.offscreen.is_some() {
            self.batch.composite();
        }
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Shape Instance Buffer"),
        size: (capacity * std::mem::size_of::<ShapeInstance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
