//! GPU rasterization of the offset surface into a height map.
//!
//! One call renders the expanded geometry into a square color target with
//! the analytic coverage shader, reads the target back, and decodes it
//! into a [`HeightField`]. The contract is blocking call-and-readback: a
//! call either yields a fully decoded grid or fails outright, and no two
//! computations may be in flight against the same pipeline.

use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::context::GpuContext;
use crate::error::{HeightFieldError, HeightFieldResult};
use crate::expand::{expand_triangles, RasterVertex};
use crate::framing::Frame;
use crate::heightfield::HeightField;

/// Shader source for offset rasterization.
const RASTER_SHADER: &str = include_str!("shaders/offset_raster.wgsl");

/// Color target format: two height channels, one unused, one coverage.
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Depth target format for the max-height composite.
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Vertex attributes of a [`RasterVertex`] record.
const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x3,
    3 => Uint32,
];

/// Framing parameters as uploaded to the shader uniform.
///
/// # Memory Layout
///
/// Total size: 32 bytes (vec4 + 4 x f32), aligned for a uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct FrameUniform {
    center: [f32; 4],
    scale: f32,
    offset_device: f32,
    _padding: [f32; 2],
}

impl FrameUniform {
    fn new(frame: &Frame) -> Self {
        Self {
            center: [frame.center.x, frame.center.y, frame.center.z, 0.0],
            scale: frame.scale,
            offset_device: frame.offset_device(),
            _padding: [0.0, 0.0],
        }
    }
}

/// Result of one offset height-map computation.
///
/// The height field is the only artifact that crosses the GPU boundary;
/// it is owned by the caller and never mutated by later calls.
#[derive(Debug, Clone)]
pub struct OffsetHeightMap {
    /// Framing parameters the mesh was rasterized with.
    pub frame: Frame,
    /// Tightly packed rgba readback of the render target, top row first,
    /// row padding stripped.
    pub raw: Vec<u8>,
    /// Decoded height grid.
    pub field: HeightField,
    /// Number of input triangles.
    pub triangle_count: usize,
    /// Wall-clock computation time in milliseconds.
    pub compute_time_ms: f64,
}

/// Cached render pipeline for offset rasterization.
///
/// Compiling the shader and pipeline once and reusing them across
/// repeated offset changes is the intended usage.
///
/// # Example
///
/// ```no_run
/// use mesh_heightfield::context::GpuContext;
/// use mesh_heightfield::raster::OffsetRasterPipeline;
///
/// if let Some(ctx) = GpuContext::get() {
///     let pipeline = OffsetRasterPipeline::new(ctx);
///     // Reuse the pipeline for repeated offset changes...
/// }
/// ```
pub struct OffsetRasterPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl OffsetRasterPipeline {
    /// Create the offset rasterization pipeline.
    #[must_use]
    pub fn new(ctx: &GpuContext) -> Self {
        debug!("Creating offset raster pipeline");

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("offset_raster"),
                source: wgpu::ShaderSource::Wgsl(RASTER_SHADER.into()),
            });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("offset_raster_bind_group_layout"),
                    entries: &[
                        // Frame uniform buffer
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("offset_raster_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("offset_raster_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<RasterVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Quads and displaced triangles may wind either way.
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    // Max-height composite: nearer (higher) fragments win,
                    // cleared to 0 so a valid height of -1 still lands.
                    depth_compare: wgpu::CompareFunction::GreaterEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Rasterize the offset surface of a triangle soup into a height map.
    ///
    /// `vertices` is a flat `x y z` sequence, nine floats per triangle;
    /// `offset` is the dilation radius in mesh units; `resolution` is the
    /// square grid edge in pixels.
    ///
    /// # Errors
    ///
    /// - [`HeightFieldError::InvalidVertexCount`] for a malformed soup
    /// - [`HeightFieldError::InvalidOffset`] for a negative or non-finite
    ///   offset
    /// - [`HeightFieldError::InvalidResolution`] /
    ///   [`HeightFieldError::ResolutionTooLarge`] for an unusable grid
    /// - [`HeightFieldError::MeshTooLarge`] when the expanded geometry
    ///   exceeds the device buffer limit
    /// - [`HeightFieldError::BufferMapping`] when readback fails
    pub fn compute(
        &self,
        ctx: &GpuContext,
        vertices: &[f32],
        offset: f32,
        resolution: u32,
    ) -> HeightFieldResult<OffsetHeightMap> {
        let start = Instant::now();

        validate_inputs(vertices, offset, resolution)?;
        if resolution > ctx.max_resolution() {
            return Err(HeightFieldError::ResolutionTooLarge {
                resolution,
                max: ctx.max_resolution(),
            });
        }

        let triangle_count = vertices.len() / 9;
        let records = expand_triangles(vertices);
        let records_bytes = std::mem::size_of_val(records.as_slice()) as u64;
        if records_bytes > ctx.max_buffer_size() {
            let record_bytes = std::mem::size_of::<RasterVertex>() as u64 * 9;
            #[allow(clippy::cast_possible_truncation)]
            // Truncation: triangle capacity always fits usize
            let max = (ctx.max_buffer_size() / record_bytes) as usize;
            return Err(HeightFieldError::MeshTooLarge {
                triangles: triangle_count,
                max,
            });
        }

        let frame = Frame::for_mesh(vertices, offset);

        info!(
            triangles = triangle_count,
            resolution = resolution,
            offset = offset,
            "rasterizing offset height map"
        );

        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("offset_raster_vertices"),
                contents: bytemuck::cast_slice(&records),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let uniform_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("offset_raster_frame"),
                contents: bytemuck::bytes_of(&FrameUniform::new(&frame)),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("offset_raster_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let size = wgpu::Extent3d {
            width: resolution,
            height: resolution,
            depth_or_array_layers: 1,
        };

        let color_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offset_raster_color"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let depth_texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offset_raster_depth"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let padded_row = padded_bytes_per_row(resolution);
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offset_raster_staging"),
            size: u64::from(padded_row) * u64::from(resolution),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offset_raster_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("offset_raster_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        // Transparent clear: zero alpha is the
                        // no-coverage sentinel.
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            #[allow(clippy::cast_possible_truncation)]
            // Truncation: record count is bounded by the buffer size check
            pass.draw(0..records.len() as u32, 0..1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &color_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(resolution),
                },
            },
            size,
        );

        ctx.queue.submit([encoder.finish()]);

        let raw = download_target(ctx, &staging, resolution, padded_row)?;
        let field = HeightField::decode(&raw, resolution, frame);

        let compute_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            triangles = triangle_count,
            covered = field.covered_count(),
            time_ms = compute_time_ms,
            "offset height map complete"
        );

        Ok(OffsetHeightMap {
            frame,
            raw,
            field,
            triangle_count,
            compute_time_ms,
        })
    }
}

/// Validate the caller-facing input contract.
fn validate_inputs(vertices: &[f32], offset: f32, resolution: u32) -> HeightFieldResult<()> {
    if vertices.is_empty() || vertices.len() % 9 != 0 {
        return Err(HeightFieldError::InvalidVertexCount {
            len: vertices.len(),
        });
    }
    if !offset.is_finite() || offset < 0.0 {
        return Err(HeightFieldError::InvalidOffset { offset });
    }
    if resolution < 2 {
        return Err(HeightFieldError::InvalidResolution { resolution });
    }
    Ok(())
}

/// Bytes per row of the readback buffer, honoring the copy alignment.
const fn padded_bytes_per_row(resolution: u32) -> u32 {
    let bytes = resolution * 4;
    bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Map the staging buffer and strip the row padding.
fn download_target(
    ctx: &GpuContext,
    staging: &wgpu::Buffer,
    resolution: u32,
    padded_row: u32,
) -> HeightFieldResult<Vec<u8>> {
    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // Send fails only if the receiver is gone; handled below.
        let _ = tx.send(result);
    });

    ctx.device.poll(wgpu::Maintain::Wait);

    rx.recv()
        .map_err(|_| HeightFieldError::BufferMapping("channel closed".into()))?
        .map_err(|e| HeightFieldError::BufferMapping(format!("{e:?}")))?;

    let data = slice.get_mapped_range();
    let row_bytes = resolution as usize * 4;
    let mut raw = Vec::with_capacity(row_bytes * resolution as usize);
    for row in 0..resolution as usize {
        let begin = row * padded_row as usize;
        raw.extend_from_slice(&data[begin..begin + row_bytes]);
    }

    drop(data);
    staging.unmap();

    Ok(raw)
}

/// Compute an offset height map on the GPU.
///
/// This is the main entry point. It initializes the shared GPU context on
/// first use, builds the pipeline, and performs one blocking
/// render-and-readback. Deterministic for fixed inputs: repeated calls
/// yield bit-identical raw buffers.
///
/// # Errors
///
/// - [`HeightFieldError::NotAvailable`] if no GPU is available
/// - any error of [`OffsetRasterPipeline::compute`]
///
/// # Example
///
/// ```no_run
/// use mesh_heightfield::compute_offset_height_map;
///
/// let soup = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// match compute_offset_height_map(&soup, 0.1, 64) {
///     Ok(map) => println!(
///         "{} covered pixels in {:.2}ms",
///         map.field.covered_count(),
///         map.compute_time_ms
///     ),
///     Err(e) => eprintln!("rasterization failed: {e}"),
/// }
/// ```
pub fn compute_offset_height_map(
    vertices: &[f32],
    offset: f32,
    resolution: u32,
) -> HeightFieldResult<OffsetHeightMap> {
    let ctx = GpuContext::try_get()?;
    let pipeline = OffsetRasterPipeline::new(ctx);
    pipeline.compute(ctx, vertices, offset, resolution)
}

/// Try to compute an offset height map, returning `None` on failure.
///
/// Convenience wrapper for callers with a CPU fallback: GPU
/// unavailability is logged at debug level, other failures at warn.
#[must_use]
pub fn try_compute_offset_height_map(
    vertices: &[f32],
    offset: f32,
    resolution: u32,
) -> Option<OffsetHeightMap> {
    match compute_offset_height_map(vertices, offset, resolution) {
        Ok(map) => Some(map),
        Err(HeightFieldError::NotAvailable) => {
            debug!("GPU not available for offset height map");
            None
        }
        Err(e) => {
            warn!("offset height map computation failed: {}", e);
            None
        }
    }
}
