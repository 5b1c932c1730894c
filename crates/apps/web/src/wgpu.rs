use foundation::math::Vec3;

/// One corner of a camera-facing disc. Six vertices make one sprite.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteVertex {
    pub center: [f32; 3],
    /// World-space radius; `0.0` marks a globe dot sized by the dot uniform.
    pub size: f32,
    /// Corner in `[-1, 1]²`.
    pub corner: [f32; 2],
    pub color: [f32; 4],
}

const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

pub fn sprite_quad(center: Vec3, size: f32, color: [f32; 4]) -> [SpriteVertex; 6] {
    let center = center.as_f32();
    QUAD_CORNERS.map(|corner| SpriteVertex {
        center,
        size,
        corner,
        color,
    })
}

pub fn sprite_vertices<I>(centers: I, size: f32, color: [f32; 4]) -> Vec<SpriteVertex>
where
    I: IntoIterator<Item = Vec3>,
{
    centers
        .into_iter()
        .flat_map(|c| sprite_quad(c, size, color))
        .collect()
}

/// Per-frame shader inputs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Unit vector from the globe center toward the camera.
    pub camera_back: [f32; 3],
    /// Frustum half extent in world units.
    pub half_extent: f32,
    pub dot_size_px: f32,
    /// Ripple origin: the last picked face normal.
    pub pointer: [f32; 3],
    pub time_since_click: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
struct Globals {
    view_proj: [[f32; 4]; 4],
    viewport: [f32; 2],
    dot_size_px: f32,
    time_since_click: f32,
    pointer: [f32; 3],
    px_per_unit: f32,
    camera_back: [f32; 3],
    _pad0: f32,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl Globals {
    fn new(frame: &FrameUniforms, width: u32, height: u32) -> Self {
        let h = height.max(1) as f32;
        Self {
            view_proj: frame.view_proj,
            viewport: [width.max(1) as f32, h],
            dot_size_px: frame.dot_size_px,
            time_since_click: frame.time_since_click,
            pointer: frame.pointer,
            px_per_unit: 0.5 * h / frame.half_extent.max(f32::EPSILON),
            camera_back: frame.camera_back,
            _pad0: 0.0,
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use ::wgpu::util::DeviceExt;
    use std::borrow::Cow;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::{FrameUniforms, Globals, SpriteVertex};

    #[derive(Debug)]
    pub struct WgpuContext {
        pub _instance: &'static ::wgpu::Instance,
        pub surface: ::wgpu::Surface<'static>,
        pub device: ::wgpu::Device,
        pub queue: ::wgpu::Queue,
        pub config: ::wgpu::SurfaceConfiguration,
        pub _canvas: web_sys::HtmlCanvasElement,
        pub sprites_pipeline: ::wgpu::RenderPipeline,
        pub uniform_buffer: ::wgpu::Buffer,
        pub uniform_bind_group: ::wgpu::BindGroup,
        pub dots_vertex_buffer: ::wgpu::Buffer,
        pub dots_vertex_count: u32,
        pub markers_vertex_buffer: ::wgpu::Buffer,
        pub markers_vertex_count: u32,
        pub pointer_vertex_buffer: ::wgpu::Buffer,
        pub pointer_vertex_count: u32,
    }

    const SPRITES_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    viewport: vec2<f32>,
    dot_size_px: f32,
    time_since_click: f32,
    pointer: vec3<f32>,
    px_per_unit: f32,
    camera_back: vec3<f32>,
    _pad0: f32,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) corner: vec2<f32>,
    @location(1) color: vec4<f32>,
};

const RIPPLE_COLOR: vec4<f32> = vec4<f32>(0.0, 1.0, 0.7, 1.0);

@vertex
fn vs_main(
    @location(0) center: vec3<f32>,
    @location(1) size: f32,
    @location(2) corner: vec2<f32>,
    @location(3) color: vec4<f32>,
) -> VsOut {
    var half_px: f32;
    var c = color;
    if (size > 0.0) {
        half_px = size * globals.px_per_unit;
    } else {
        // Ring travelling outward from the last pick, fading over 2.5 s.
        let t = globals.time_since_click;
        let ring = 1.0 - smoothstep(0.0, 0.12, abs(distance(center, globals.pointer) - t * 0.8));
        let wave = ring * (1.0 - smoothstep(0.0, 2.5, t));
        half_px = 0.5 * globals.dot_size_px * (0.35 + 0.5 * wave);
        c = mix(color, RIPPLE_COLOR, wave);
    }

    // Far hemisphere.
    if (dot(normalize(center), globals.camera_back) < -0.02) {
        c.a = 0.0;
    }

    let clip_center = globals.view_proj * vec4<f32>(center, 1.0);
    let ndc_offset = corner * half_px * 2.0 / globals.viewport;
    let clip = clip_center + vec4<f32>(ndc_offset * clip_center.w, 0.0, 0.0);
    return VsOut(clip, corner, c);
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    if (dot(in.corner, in.corner) > 1.0 || in.color.a <= 0.0) {
        discard;
    }
    return vec4<f32>(in.color.rgb * in.color.a, in.color.a);
}
"#;

    pub async fn init_wgpu_from_canvas_id(canvas_id: &str) -> Result<WgpuContext, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("document missing"))?;
        let canvas_elem = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("canvas #{canvas_id} missing")))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let width = canvas_elem.width().max(1);
        let height = canvas_elem.height().max(1);

        // The surface must not outlive its instance; the instance lives for the
        // rest of the page.
        let instance: &'static ::wgpu::Instance = Box::leak(Box::new(::wgpu::Instance::new(
            &::wgpu::InstanceDescriptor {
                backends: ::wgpu::Backends::BROWSER_WEBGPU | ::wgpu::Backends::GL,
                ..Default::default()
            },
        )));

        let surface = instance
            .create_surface(::wgpu::SurfaceTarget::Canvas(canvas_elem.clone()))
            .map_err(|e| JsValue::from_str(&format!("surface error: {e}")))?;

        let adapter = instance
            .request_adapter(&::wgpu::RequestAdapterOptions {
                power_preference: ::wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("adapter error: {e}")))?;

        let (device, queue) = adapter
            .request_device(&::wgpu::DeviceDescriptor {
                label: Some("geopin-device"),
                required_features: ::wgpu::Features::empty(),
                required_limits: ::wgpu::Limits::downlevel_webgl2_defaults(),
                ..Default::default()
            })
            .await
            .map_err(|e| JsValue::from_str(&format!("device error: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| JsValue::from_str("surface reports no formats"))?;
        // The page shows through everywhere the globe has no dots.
        let alpha_mode = if surface_caps
            .alpha_modes
            .contains(&::wgpu::CompositeAlphaMode::PreMultiplied)
        {
            ::wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(::wgpu::CompositeAlphaMode::Auto)
        };

        let config = ::wgpu::SurfaceConfiguration {
            usage: ::wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            desired_maximum_frame_latency: 2,
            present_mode: ::wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(::wgpu::ShaderModuleDescriptor {
            label: Some("geopin-sprites-shader"),
            source: ::wgpu::ShaderSource::Wgsl(Cow::Borrowed(SPRITES_SHADER)),
        });

        let uniform_buffer = device.create_buffer(&::wgpu::BufferDescriptor {
            label: Some("geopin-globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: ::wgpu::BufferUsages::UNIFORM | ::wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&::wgpu::BindGroupLayoutDescriptor {
                label: Some("geopin-globals-bgl"),
                entries: &[::wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ::wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: ::wgpu::BindingType::Buffer {
                        ty: ::wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&::wgpu::BindGroupDescriptor {
            label: Some("geopin-globals-bg"),
            layout: &uniform_bind_group_layout,
            entries: &[::wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&::wgpu::PipelineLayoutDescriptor {
            label: Some("geopin-sprites-pipeline-layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            immediate_size: 0,
        });

        let sprites_pipeline = device.create_render_pipeline(&::wgpu::RenderPipelineDescriptor {
            label: Some("geopin-sprites-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: ::wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[::wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SpriteVertex>() as ::wgpu::BufferAddress,
                    step_mode: ::wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32,
                            offset: 12,
                            shader_location: 1,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x2,
                            offset: 16,
                            shader_location: 2,
                        },
                        ::wgpu::VertexAttribute {
                            format: ::wgpu::VertexFormat::Float32x4,
                            offset: 24,
                            shader_location: 3,
                        },
                    ],
                }],
            },
            fragment: Some(::wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(::wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(::wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: ::wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: ::wgpu::PrimitiveState {
                topology: ::wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: ::wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: ::wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: ::wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let empty_buffer = |label: &'static str, size: u64| {
            device.create_buffer(&::wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let sprite_bytes = (6 * std::mem::size_of::<SpriteVertex>()) as u64;
        let dots_vertex_buffer = empty_buffer("geopin-dots-vertices", sprite_bytes);
        let markers_vertex_buffer = empty_buffer("geopin-markers-vertices", sprite_bytes);
        let pointer_vertex_buffer = empty_buffer("geopin-pointer-vertices", sprite_bytes);

        Ok(WgpuContext {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            _canvas: canvas_elem,
            sprites_pipeline,
            uniform_buffer,
            uniform_bind_group,
            dots_vertex_buffer,
            dots_vertex_count: 0,
            markers_vertex_buffer,
            markers_vertex_count: 0,
            pointer_vertex_buffer,
            pointer_vertex_count: 0,
        })
    }

    fn upload(ctx: &WgpuContext, label: &'static str, vertices: &[SpriteVertex]) -> ::wgpu::Buffer {
        ctx.device
            .create_buffer_init(&::wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: ::wgpu::BufferUsages::VERTEX | ::wgpu::BufferUsages::COPY_DST,
            })
    }

    pub fn set_dot_sprites(ctx: &mut WgpuContext, vertices: &[SpriteVertex]) {
        if vertices.is_empty() {
            ctx.dots_vertex_count = 0;
            return;
        }
        ctx.dots_vertex_buffer = upload(ctx, "geopin-dots-vertices", vertices);
        ctx.dots_vertex_count = vertices.len() as u32;
    }

    pub fn set_marker_sprites(ctx: &mut WgpuContext, vertices: &[SpriteVertex]) {
        if vertices.is_empty() {
            ctx.markers_vertex_count = 0;
            return;
        }
        ctx.markers_vertex_buffer = upload(ctx, "geopin-markers-vertices", vertices);
        ctx.markers_vertex_count = vertices.len() as u32;
    }

    /// Rewrites the pointer sprite in place; it moves every frame.
    pub fn set_pointer_sprite(ctx: &mut WgpuContext, vertices: Option<&[SpriteVertex; 6]>) {
        match vertices {
            Some(v) => {
                ctx.queue
                    .write_buffer(&ctx.pointer_vertex_buffer, 0, bytemuck::cast_slice(v));
                ctx.pointer_vertex_count = 6;
            }
            None => ctx.pointer_vertex_count = 0,
        }
    }

    pub fn resize_wgpu(ctx: &mut WgpuContext, width: u32, height: u32) {
        ctx.config.width = width.max(1);
        ctx.config.height = height.max(1);
        ctx.surface.configure(&ctx.device, &ctx.config);
    }

    pub fn render_globe(ctx: &WgpuContext, frame_uniforms: &FrameUniforms) -> Result<(), JsValue> {
        let frame = ctx
            .surface
            .get_current_texture()
            .map_err(|e| JsValue::from_str(&format!("surface acquire failed: {e}")))?;
        let view = frame
            .texture
            .create_view(&::wgpu::TextureViewDescriptor::default());

        let globals = Globals::new(frame_uniforms, ctx.config.width, ctx.config.height);
        ctx.queue
            .write_buffer(&ctx.uniform_buffer, 0, bytemuck::bytes_of(&globals));

        let mut encoder = ctx
            .device
            .create_command_encoder(&::wgpu::CommandEncoderDescriptor {
                label: Some("geopin-frame-encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&::wgpu::RenderPassDescriptor {
                label: Some("geopin-globe-pass"),
                color_attachments: &[Some(::wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: ::wgpu::Operations {
                        load: ::wgpu::LoadOp::Clear(::wgpu::Color::TRANSPARENT),
                        store: ::wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(&ctx.sprites_pipeline);
            rpass.set_bind_group(0, &ctx.uniform_bind_group, &[]);
            // Dots, then marker spheres, then the pointer on top.
            for (buffer, count) in [
                (&ctx.dots_vertex_buffer, ctx.dots_vertex_count),
                (&ctx.markers_vertex_buffer, ctx.markers_vertex_count),
                (&ctx.pointer_vertex_buffer, ctx.pointer_vertex_count),
            ] {
                if count == 0 {
                    continue;
                }
                rpass.set_vertex_buffer(0, buffer.slice(..));
                rpass.draw(0..count, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use wasm_bindgen::prelude::JsValue;

    use super::{FrameUniforms, SpriteVertex};

    #[derive(Debug, Default)]
    pub struct WgpuContext;

    pub async fn init_wgpu_from_canvas_id(_canvas_id: &str) -> Result<WgpuContext, JsValue> {
        Err(JsValue::from_str(
            "wgpu initialization is only available on wasm32 targets",
        ))
    }

    pub fn set_dot_sprites(_ctx: &mut WgpuContext, _vertices: &[SpriteVertex]) {}

    pub fn set_marker_sprites(_ctx: &mut WgpuContext, _vertices: &[SpriteVertex]) {}

    pub fn set_pointer_sprite(_ctx: &mut WgpuContext, _vertices: Option<&[SpriteVertex; 6]>) {}

    pub fn resize_wgpu(_ctx: &mut WgpuContext, _width: u32, _height: u32) {}

    pub fn render_globe(_ctx: &WgpuContext, _frame_uniforms: &FrameUniforms) -> Result<(), JsValue> {
        Err(JsValue::from_str(
            "wgpu rendering is only available on wasm32 targets",
        ))
    }
}

pub use imp::{
    WgpuContext, init_wgpu_from_canvas_id, render_globe, resize_wgpu, set_dot_sprites,
    set_marker_sprites, set_pointer_sprite,
};
