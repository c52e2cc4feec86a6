//! Separable Gaussian blur pipeline
//!
//! Uses two full-screen fragment passes over a pair of reduced-size render
//! surfaces:
//! 1. Horizontal: source texture -> surface A
//! 2. Vertical: surface A -> surface B
//!
//! The kernel taps (offset + weight) live in storage buffers whose length
//! the shader reads with `arrayLength`, so the radius is only ever defined
//! on the host side.
//!
//! Both passes read and write `BLUR_FORMAT` views, so taps weight the stored
//! sRGB-encoded values without any linear conversion. The textures also
//! carry a `DISPLAY_VIEW_FORMAT` view that is only used to composite the
//! result onto the screen.

use wgpu::util::DeviceExt;

use super::context::GpuContext;
use crate::image::Image;
use crate::kernel::{Axis, BlurConfig, BlurKernel, Kernel, KernelError, KernelOffsets};

/// Storage format of the source image and both render surfaces, and the
/// view format both blur passes sample and render through
pub const BLUR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// View format used when compositing onto the back buffer
pub const DISPLAY_VIEW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Blur view and display view of a texture created with `BLUR_FORMAT`
fn blur_and_display_views(texture: &wgpu::Texture) -> (wgpu::TextureView, wgpu::TextureView) {
    let blur = texture.create_view(&wgpu::TextureViewDescriptor {
        format: Some(BLUR_FORMAT),
        ..Default::default()
    });
    let display = texture.create_view(&wgpu::TextureViewDescriptor {
        format: Some(DISPLAY_VIEW_FORMAT),
        ..Default::default()
    });
    (blur, display)
}

pub const SURFACE_A: usize = 0;
pub const SURFACE_B: usize = 1;

/// One kernel sample as read by `gaussian_blur.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Tap {
    /// Texture-coordinate offset, direction included
    pub offset: [f32; 2],
    pub weight: f32,
    pub _padding: f32,
}

impl Tap {
    /// Pair each weight with its offset
    pub fn pack(weights: &[f32], offsets: &[[f32; 2]]) -> Vec<Tap> {
        assert_eq!(weights.len(), offsets.len(), "one offset per weight");
        weights
            .iter()
            .zip(offsets)
            .map(|(&weight, &offset)| Tap {
                offset,
                weight,
                _padding: 0.0,
            })
            .collect()
    }
}

/// Horizontal and vertical tap tables for a kernel
fn tap_tables(kernel: &Kernel, offsets: &KernelOffsets) -> [Vec<Tap>; 2] {
    [
        Tap::pack(kernel.weights(), offsets.for_axis(Axis::Horizontal)),
        Tap::pack(kernel.weights(), offsets.for_axis(Axis::Vertical)),
    ]
}

/// Render surface size for a source image, reduced by `downscale` on
/// each axis and never smaller than 1x1
pub fn target_size_for(source_size: (u32, u32), downscale: u32) -> (u32, u32) {
    let downscale = downscale.max(1);
    (
        (source_size.0 / downscale).max(1),
        (source_size.1 / downscale).max(1),
    )
}

/// The source image uploaded as a sampled texture
pub struct SourceTexture {
    // Kept alive for the view
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    display_view: wgpu::TextureView,
    size: (u32, u32),
}

impl SourceTexture {
    pub fn upload(ctx: &GpuContext, image: &Image) -> Self {
        let (width, height) = image.size();

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Blur Source Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: BLUR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[DISPLAY_VIEW_FORMAT],
        });

        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let (view, display_view) = blur_and_display_views(&texture);
        Self {
            _texture: texture,
            view,
            display_view,
            size: (width, height),
        }
    }

    /// View sampled by the horizontal blur pass
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// sRGB view for compositing the unblurred image
    pub fn display_view(&self) -> &wgpu::TextureView {
        &self.display_view
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// Which surface is read and which is written during a blur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRoles {
    read: usize,
}

impl SurfaceRoles {
    /// Roles at the start of a blur: surface A is written first
    pub fn start() -> Self {
        Self { read: SURFACE_B }
    }

    pub fn read(&self) -> usize {
        self.read
    }

    pub fn write(&self) -> usize {
        1 - self.read
    }

    /// The surface just written becomes the one to read
    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }
}

struct RenderSurface {
    // Kept alive for the views
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    display_view: wgpu::TextureView,
}

/// Two same-size render targets used as ping-pong buffers
pub struct RenderSurfaces {
    surfaces: [RenderSurface; 2],
    roles: SurfaceRoles,
    size: (u32, u32),
}

impl RenderSurfaces {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let create = |label: &str| {
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
                format: BLUR_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[DISPLAY_VIEW_FORMAT],
            });
            let (view, display_view) = blur_and_display_views(&texture);
            RenderSurface {
                _texture: texture,
                view,
                display_view,
            }
        };

        log::info!("Created blur render surfaces: {}x{}", width, height);

        Self {
            surfaces: [create("Blur Surface A"), create("Blur Surface B")],
            roles: SurfaceRoles::start(),
            size: (width, height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn roles(&self) -> SurfaceRoles {
        self.roles
    }

    pub fn view(&self, index: usize) -> &wgpu::TextureView {
        &self.surfaces[index].view
    }

    pub fn display_view(&self, index: usize) -> &wgpu::TextureView {
        &self.surfaces[index].display_view
    }

    pub fn read_view(&self) -> &wgpu::TextureView {
        self.view(self.roles.read())
    }

    pub fn write_view(&self) -> &wgpu::TextureView {
        self.view(self.roles.write())
    }

    pub fn swap(&mut self) {
        self.roles.swap();
    }

    pub fn reset(&mut self) {
        self.roles = SurfaceRoles::start();
    }
}

/// Two-pass Gaussian blur into reduced-size render surfaces
pub struct BlurPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,

    kernel: BlurKernel,
    downscale: u32,

    // Storage buffers: [horizontal, vertical]
    tap_buffers: [wgpu::Buffer; 2],

    surfaces: RenderSurfaces,

    // Horizontal taps over the source
    source_bind_group: wgpu::BindGroup,
    // Vertical taps over surface A and surface B, picked by the read role
    surface_bind_groups: [wgpu::BindGroup; 2],
}

impl BlurPass {
    pub fn new(
        ctx: &GpuContext,
        source: &SourceTexture,
        config: BlurConfig,
        downscale: u32,
    ) -> Result<Self, KernelError> {
        let device = &ctx.device;
        let mut kernel = BlurKernel::new(config)?;

        // Load shader
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gaussian Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/gaussian_blur.wgsl").into()),
        });

        // Sampling past the edge repeats the border texel
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Gaussian Blur Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Gaussian Blur Bind Group Layout"),
            entries: &[
                // input_texture
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // input_sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // taps
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gaussian Blur Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Both passes share one pipeline; the direction is baked into the taps
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Gaussian Blur Pipeline"),
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
                    format: BLUR_FORMAT,
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

        let (width, height) = target_size_for(source.size(), downscale);
        let surfaces = RenderSurfaces::new(device, width, height);

        let offsets = kernel.offsets_for(width, height).clone();
        let tap_buffers = Self::create_tap_buffers(device, &tap_tables(kernel.kernel(), &offsets));

        let (source_bind_group, surface_bind_groups) = Self::create_bind_groups(
            device,
            &bind_group_layout,
            &sampler,
            source.view(),
            &surfaces,
            &tap_buffers,
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            sampler,
            kernel,
            downscale,
            tap_buffers,
            surfaces,
            source_bind_group,
            surface_bind_groups,
        })
    }

    fn create_tap_buffers(device: &wgpu::Device, tables: &[Vec<Tap>; 2]) -> [wgpu::Buffer; 2] {
        let create = |label: &str, taps: &[Tap]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(taps),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
        };
        [
            create("Gaussian Blur Horizontal Taps", &tables[0]),
            create("Gaussian Blur Vertical Taps", &tables[1]),
        ]
    }

    fn create_bind_groups(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        source_view: &wgpu::TextureView,
        surfaces: &RenderSurfaces,
        tap_buffers: &[wgpu::Buffer; 2],
    ) -> (wgpu::BindGroup, [wgpu::BindGroup; 2]) {
        let create = |label: &str, input: &wgpu::TextureView, taps: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(input),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: taps.as_entire_binding(),
                    },
                ],
            })
        };

        (
            create("Gaussian Blur Horizontal Bind Group", source_view, &tap_buffers[0]),
            [
                create(
                    "Gaussian Blur Vertical Bind Group (A)",
                    surfaces.view(SURFACE_A),
                    &tap_buffers[1],
                ),
                create(
                    "Gaussian Blur Vertical Bind Group (B)",
                    surfaces.view(SURFACE_B),
                    &tap_buffers[1],
                ),
            ],
        )
    }

    /// Current kernel (radius, sigma, weights)
    pub fn kernel(&self) -> &Kernel {
        self.kernel.kernel()
    }

    pub fn config(&self) -> BlurConfig {
        self.kernel.config()
    }

    /// Size of the render surfaces
    pub fn target_size(&self) -> (u32, u32) {
        self.surfaces.size()
    }

    /// sRGB view of surface B, which holds the blurred image after
    /// [`BlurPass::apply`]
    pub fn output_view(&self) -> &wgpu::TextureView {
        self.surfaces.display_view(SURFACE_B)
    }

    /// Point the blur at a new source texture.
    ///
    /// If the size changed the surfaces are recreated and the offsets
    /// recomputed. Surface views previously obtained from
    /// [`BlurPass::output_view`] are stale afterwards.
    pub fn set_source(&mut self, ctx: &GpuContext, source: &SourceTexture) {
        let (width, height) = target_size_for(source.size(), self.downscale);

        if self.surfaces.size() != (width, height) {
            self.surfaces = RenderSurfaces::new(&ctx.device, width, height);
        }
        if self.kernel.update_target_size(width, height) {
            self.upload_taps(ctx);
        }

        (self.source_bind_group, self.surface_bind_groups) = Self::create_bind_groups(
            &ctx.device,
            &self.bind_group_layout,
            &self.sampler,
            source.view(),
            &self.surfaces,
            &self.tap_buffers,
        );
    }

    fn upload_taps(&mut self, ctx: &GpuContext) {
        let (width, height) = self.surfaces.size();
        let offsets = self.kernel.offsets_for(width, height).clone();
        let tables = tap_tables(self.kernel.kernel(), &offsets);

        for (buffer, taps) in self.tap_buffers.iter().zip(&tables) {
            ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(taps));
        }
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        bind_group: &wgpu::BindGroup,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1); // Full-screen triangle
    }

    /// Run both blur passes and return the blur-format view holding the result
    pub fn apply(&mut self, ctx: &GpuContext) -> &wgpu::TextureView {
        debug_assert_eq!(
            self.kernel.offsets().map(|o| o.target_size),
            Some(self.surfaces.size()),
            "kernel offsets computed for a different render target size"
        );

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Gaussian Blur Encoder"),
        });

        self.surfaces.reset();

        // Pass 1: horizontal (source -> A)
        self.encode_pass(
            &mut encoder,
            "Gaussian Blur Horizontal Pass",
            &self.source_bind_group,
            self.surfaces.write_view(),
        );
        self.surfaces.swap();

        // Pass 2: vertical (A -> B)
        debug_assert_eq!(self.surfaces.roles().read(), SURFACE_A);
        self.encode_pass(
            &mut encoder,
            "Gaussian Blur Vertical Pass",
            &self.surface_bind_groups[self.surfaces.roles().read()],
            self.surfaces.write_view(),
        );
        self.surfaces.swap();

        ctx.queue.submit(std::iter::once(encoder.finish()));

        debug_assert_eq!(self.surfaces.roles().read(), SURFACE_B);
        self.surfaces.read_view()
    }
}
