//! Instanced shape drawing.
//!
//! Every disc, line and surface fill becomes one [`ShapeInstance`], a quad
//! expanded in the vertex shader from six vertices per instance. Discs keep
//! the integer-pixel footprint of the software canvas: the fragment shader
//! discards pixels whose centre lies farther than the radius from the
//! disc's centre pixel.
//!
//! Draw calls are collected into a [`ShapeBatch`] during the frame and
//! replayed in order when the frame is flushed. Consecutive shapes with the
//! same target and blend mode share one draw call.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::{blend_state, TARGET_FORMAT};
use crate::color::Rgb;
use crate::visuals::BlendMode;

pub const SHAPE_DISC: u32 = 0;
pub const SHAPE_LINE: u32 = 1;
pub const SHAPE_FILL: u32 = 2;

/// Shape vertex and fragment shader.
pub const SHAPES_WGSL: &str = r#"
struct Globals {
    size: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct ShapeInput {
    @location(0) a: vec2<f32>,
    @location(1) b: vec2<f32>,
    @location(2) size: f32,
    @location(3) kind: u32,
    @location(4) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) @interpolate(flat) center: vec2<f32>,
    @location(2) @interpolate(flat) radius: f32,
};

fn to_clip(p: vec2<f32>) -> vec4<f32> {
    let ndc = vec2<f32>(p.x / globals.size.x * 2.0 - 1.0, 1.0 - p.y / globals.size.y * 2.0);
    return vec4<f32>(ndc, 0.0, 1.0);
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    shape: ShapeInput,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = corners[vertex_index];

    var out: VertexOutput;
    out.color = shape.color;
    out.center = shape.a;
    out.radius = -1.0;

    if shape.kind == 0u {
        // disc: bounding square around the centre pixel
        out.clip_position = to_clip(shape.a + vec2<f32>(0.5) + corner * (shape.size + 1.0));
        out.radius = shape.size;
    } else if shape.kind == 1u {
        // line: quad from pixel centre to pixel centre, `size` is half the pen
        let start = shape.a + vec2<f32>(0.5);
        let end = shape.b + vec2<f32>(0.5);
        let d = end - start;
        let len = length(d);
        let dir = select(vec2<f32>(1.0, 0.0), d / len, len > 0.0001);
        let normal = vec2<f32>(-dir.y, dir.x);
        let along = (corner.x + 1.0) * 0.5;
        let p = mix(start - dir * shape.size, end + dir * shape.size, along);
        out.clip_position = to_clip(p + normal * shape.size * corner.y);
    } else {
        out.clip_position = vec4<f32>(corner, 0.0, 1.0);
    }
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if in.radius >= 0.0 {
        let d = floor(in.clip_position.xy) - in.center;
        if dot(d, d) > in.radius * in.radius + 0.001 {
            discard;
        }
    }
    return in.color;
}
"#;

/// One shape, in target pixels.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ShapeInstance {
    /// Disc centre or line start.
    pub a: [f32; 2],
    /// Line end.
    pub b: [f32; 2],
    /// Disc radius or line half-width.
    pub size: f32,
    pub kind: u32,
    /// Straight RGBA in `[0, 1]`.
    pub color: [f32; 4],
}

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    0 => Float32x2,
    1 => Float32x2,
    2 => Float32,
    3 => Uint32,
    4 => Float32x4,
];

impl ShapeInstance {
    /// Disc of `radius` around `center`, both scaled then snapped to whole pixels.
    pub fn disc(center: Vec2, radius: f32, scale: f32, color: Rgb, alpha: u8) -> Self {
        let c = (center * scale).round().to_array();
        Self {
            a: c,
            b: c,
            size: (radius * scale).round().max(0.0),
            kind: SHAPE_DISC,
            color: rgba(color, alpha),
        }
    }

    /// Line one output pixel wide, so `ceil(scale)` target pixels.
    pub fn line(from: Vec2, to: Vec2, scale: f32, color: Rgb, alpha: u8) -> Self {
        let pen = scale.ceil().max(1.0);
        Self {
            a: (from * scale).round().to_array(),
            b: (to * scale).round().to_array(),
            size: pen * 0.5,
            kind: SHAPE_LINE,
            color: rgba(color, alpha),
        }
    }

    /// Whole-target fill.
    pub fn fill(color: Rgb, alpha: u8) -> Self {
        Self {
            a: [0.0; 2],
            b: [0.0; 2],
            size: 0.0,
            kind: SHAPE_FILL,
            color: rgba(color, alpha),
        }
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        }
    }
}

fn rgba(color: Rgb, alpha: u8) -> [f32; 4] {
    let c = color.to_unit();
    [c.x, c.y, c.z, alpha as f32 / 255.0]
}

/// Which texture a draw lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Output,
    Offscreen,
}

/// One replayable unit of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Shapes {
        target: Target,
        blend: BlendMode,
        instances: Range<u32>,
    },
    /// Downsample the offscreen target onto the output.
    Composite,
}

/// Draw calls recorded since the last flush.
#[derive(Debug, Default)]
pub struct ShapeBatch {
    instances: Vec<ShapeInstance>,
    steps: Vec<Step>,
}

impl ShapeBatch {
    pub fn push(&mut self, target: Target, blend: BlendMode, shape: ShapeInstance) {
        let index = self.instances.len() as u32;
        self.instances.push(shape);
        if let Some(Step::Shapes {
            target: last_target,
            blend: last_blend,
            instances,
        }) = self.steps.last_mut()
        {
            if *last_target == target && *last_blend == blend {
                instances.end = index + 1;
                return;
            }
        }
        self.steps.push(Step::Shapes {
            target,
            blend,
            instances: index..index + 1,
        });
    }

    pub fn composite(&mut self) {
        self.steps.push(Step::Composite);
    }

    #[inline]
    pub fn instances(&self) -> &[ShapeInstance] {
        &self.instances
    }

    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.steps.clear();
    }
}

/// Target size uniform.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    size: [f32; 2],
    _pad: [f32; 2],
}

/// Shape pipelines, one per blend mode.
pub struct ShapePipelines {
    globals_layout: wgpu::BindGroupLayout,
    alpha: wgpu::RenderPipeline,
    additive: wgpu::RenderPipeline,
}

impl ShapePipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shape Shader"),
            source: wgpu::ShaderSource::Wgsl(SHAPES_WGSL.into()),
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shape Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shape Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let alpha = create_pipeline(device, &shader, &pipeline_layout, BlendMode::Alpha);
        let additive = create_pipeline(device, &shader, &pipeline_layout, BlendMode::Additive);

        Self {
            globals_layout,
            alpha,
            additive,
        }
    }

    #[inline]
    pub fn pipeline(&self, mode: BlendMode) -> &wgpu::RenderPipeline {
        match mode {
            BlendMode::Alpha => &self.alpha,
            BlendMode::Additive => &self.additive,
        }
    }

    /// Bind group carrying the pixel size of one render target.
    pub fn bind_target(&self, device: &wgpu::Device, width: u32, height: u32) -> wgpu::BindGroup {
        let globals = Globals {
            size: [width as f32, height as f32],
            _pad: [0.0; 2],
        };
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shape Globals Buffer"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shape Bind Group"),
            layout: &self.globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    mode: BlendMode,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(match mode {
            BlendMode::Alpha => "Shape Pipeline (alpha)",
            BlendMode::Additive => "Shape Pipeline (additive)",
        }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[ShapeInstance::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(blend_state(mode)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn test_instance_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<ShapeInstance>(), 40);
        let last = INSTANCE_ATTRIBUTES[4];
        assert_eq!(last.offset, 24);
        assert_eq!(last.offset as usize + 16, std::mem::size_of::<ShapeInstance>());
    }

    #[test]
    fn test_disc_snaps_to_scaled_pixels() {
        let d = ShapeInstance::disc(Vec2::new(10.2, 4.7), 1.6, 2.0, RED, 255);
        assert_eq!(d.a, [20.0, 9.0]);
        assert_eq!(d.size, 3.0);
        assert_eq!(d.kind, SHAPE_DISC);
        assert_eq!(d.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_line_pen_grows_with_scale() {
        let one = ShapeInstance::line(Vec2::ZERO, Vec2::new(5.0, 0.0), 1.0, RED, 51);
        assert_eq!(one.size, 0.5);
        assert_eq!(one.b, [5.0, 0.0]);
        assert!((one.color[3] - 0.2).abs() < 1e-6);

        let three = ShapeInstance::line(Vec2::ZERO, Vec2::new(5.0, 0.0), 3.0, RED, 51);
        assert_eq!(three.size, 1.5);
        assert_eq!(three.b, [15.0, 0.0]);
    }

    #[test]
    fn test_batch_merges_runs() {
        let mut batch = ShapeBatch::default();
        let fill = ShapeInstance::fill(Rgb::BLACK, 10);
        batch.push(Target::Offscreen, BlendMode::Alpha, fill);
        batch.push(Target::Offscreen, BlendMode::Alpha, fill);
        batch.push(Target::Offscreen, BlendMode::Additive, fill);
        batch.push(Target::Offscreen, BlendMode::Alpha, fill);
        batch.composite();
        batch.push(Target::Output, BlendMode::Alpha, fill);

        assert_eq!(batch.instances().len(), 5);
        assert_eq!(
            batch.steps(),
            &[
                Step::Shapes {
                    target: Target::Offscreen,
                    blend: BlendMode::Alpha,
                    instances: 0..2
                },
                Step::Shapes {
                    target: Target::Offscreen,
                    blend: BlendMode::Additive,
                    instances: 2..3
                },
                Step::Shapes {
                    target: Target::Offscreen,
                    blend: BlendMode::Alpha,
                    instances: 3..4
                },
                Step::Composite,
                Step::Shapes {
                    target: Target::Output,
                    blend: BlendMode::Alpha,
                    instances: 4..5
                },
            ]
        );

        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.instances().is_empty());
    }
}
