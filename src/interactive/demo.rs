//! Interactive Gaussian blur demo using wgpu + winit

use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowId},
};

use super::input::{DemoAction, DemoToggles, action_for_key};
use crate::error::DemoError;
use crate::gpu::{BlurPass, DisplayPipeline, GpuContext, GpuError, SourceTexture, TextOverlay};
use crate::image::Image;
use crate::kernel::BlurConfig;
use crate::overlay::{FrameCounter, overlay_text};

/// Configuration for the blur demo
#[derive(Clone, Debug)]
pub struct DemoConfig {
    /// Window title
    pub title: String,
    /// Source image sizes; the first is shown at start, I cycles through them
    pub image_sizes: Vec<(u32, u32)>,
    /// Kernel radius and amount
    pub blur: BlurConfig,
    /// Render surfaces are the source size divided by this
    pub downscale: u32,
    pub vsync: bool,
    /// Back buffer clear colour
    pub clear_color: wgpu::Color,
    /// Overlay text colour (sRGB)
    pub text_color: [u8; 3],
    pub font_size: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Gaussian Blur".to_string(),
            image_sizes: vec![(512, 512), (256, 256), (1024, 768)],
            blur: BlurConfig::default(),
            downscale: 2,
            vsync: false,
            // Cornflower blue, linear
            clear_color: wgpu::Color {
                r: 0.127,
                g: 0.301,
                b: 0.846,
                a: 1.0,
            },
            text_color: [255, 255, 0],
            font_size: 16.0,
        }
    }
}

impl DemoConfig {
    fn image_size(&self, index: usize) -> (u32, u32) {
        self.image_sizes.get(index).copied().unwrap_or((512, 512))
    }
}

/// Everything that lives as long as the window
struct DemoState {
    config: DemoConfig,
    gpu_ctx: GpuContext,
    display_pipeline: DisplayPipeline,
    text: TextOverlay,

    source: SourceTexture,
    blur_pass: BlurPass,
    source_bind_group: wgpu::BindGroup,
    blurred_bind_group: wgpu::BindGroup,
    image_index: usize,

    toggles: DemoToggles,
    frame_counter: FrameCounter,
    last_update: Instant,
    alt_held: bool,
    active: bool,
}

impl DemoState {
    fn new(window: Arc<Window>, config: DemoConfig) -> Result<Self, DemoError> {
        let gpu_ctx = GpuContext::new(window, config.vsync)?;
        let display_pipeline = DisplayPipeline::new(&gpu_ctx);
        let text = TextOverlay::new(&gpu_ctx, config.font_size, config.text_color, (1.0, 1.0));

        let (width, height) = config.image_size(0);
        let image = Image::test_pattern(width, height);
        let source = SourceTexture::upload(&gpu_ctx, &image);
        let blur_pass = BlurPass::new(&gpu_ctx, &source, config.blur, config.downscale)?;

        let source_bind_group = display_pipeline.create_bind_group(&gpu_ctx, source.display_view());
        let blurred_bind_group = display_pipeline.create_bind_group(&gpu_ctx, blur_pass.output_view());

        let blur = blur_pass.config();
        log::info!(
            "Blur radius {} amount {} sigma {:.2}, render surfaces {:?}",
            blur.radius,
            blur.amount,
            blur_pass.kernel().sigma(),
            blur_pass.target_size()
        );

        Ok(Self {
            config,
            gpu_ctx,
            display_pipeline,
            text,
            source,
            blur_pass,
            source_bind_group,
            blurred_bind_group,
            image_index: 0,
            toggles: DemoToggles::default(),
            frame_counter: FrameCounter::new(),
            last_update: Instant::now(),
            alt_held: false,
            active: true,
        })
    }

    /// Returns `false` when the demo should exit
    fn handle_action(&mut self, action: DemoAction) -> bool {
        match action {
            DemoAction::Exit => return false,
            DemoAction::CycleImageSize => self.cycle_image_size(),
            toggle => {
                self.toggles.apply(toggle);
                match toggle {
                    DemoAction::ToggleBlur => {
                        println!("Blur: {}", if self.toggles.blur_enabled { "ON" } else { "OFF" });
                    }
                    DemoAction::ToggleFullscreen => self.apply_fullscreen(),
                    _ => {}
                }
            }
        }
        true
    }

    fn apply_fullscreen(&self) {
        let fullscreen = self
            .toggles
            .fullscreen
            .then_some(Fullscreen::Borderless(None));
        self.gpu_ctx.window().set_fullscreen(fullscreen);
    }

    fn cycle_image_size(&mut self) {
        self.image_index = (self.image_index + 1) % self.config.image_sizes.len().max(1);
        let (width, height) = self.config.image_size(self.image_index);

        let image = Image::test_pattern(width, height);
        self.source = SourceTexture::upload(&self.gpu_ctx, &image);
        self.blur_pass.set_source(&self.gpu_ctx, &self.source);

        // Surface views may have been recreated
        self.source_bind_group = self
            .display_pipeline
            .create_bind_group(&self.gpu_ctx, self.source.display_view());
        self.blurred_bind_group = self
            .display_pipeline
            .create_bind_group(&self.gpu_ctx, self.blur_pass.output_view());

        println!(
            "Image: {}x{} (render surfaces {:?})",
            width,
            height,
            self.blur_pass.target_size()
        );
    }

    fn update(&mut self) {
        let now = Instant::now();
        self.frame_counter.update(now - self.last_update);
        self.last_update = now;

        let text = overlay_text(
            self.toggles.display_help,
            self.frame_counter.frames_per_second(),
            self.blur_pass.kernel(),
        );
        self.text.set_text(&text);
    }

    fn render(&mut self) -> Result<(), GpuError> {
        if self.toggles.blur_enabled {
            self.blur_pass.apply(&self.gpu_ctx);
        }

        let region = self.display_pipeline.prepare(&self.gpu_ctx, self.source.size());
        self.text.prepare(&self.gpu_ctx)?;

        let output = match self.gpu_ctx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.gpu_ctx.reconfigure();
                return Ok(());
            }
            Err(e) => {
                log::error!("Failed to acquire frame: {:?}", e);
                return Ok(());
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gpu_ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let bind_group = if self.toggles.blur_enabled {
                &self.blurred_bind_group
            } else {
                &self.source_bind_group
            };
            self.display_pipeline.draw(&mut render_pass, bind_group, &region);
            self.text.render(&mut render_pass)?;
        }

        self.gpu_ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.text.trim();
        self.frame_counter.frame_rendered();
        Ok(())
    }
}

/// Application handler for winit event loop
struct BlurDemoApp {
    config: DemoConfig,
    state: Option<DemoState>,
    error: Option<DemoError>,
}

impl BlurDemoApp {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: DemoError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for BlurDemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        // Half the monitor, or the image itself when there is no monitor
        let (image_w, image_h) = self.config.image_size(0);
        let size = event_loop
            .primary_monitor()
            .map(|monitor| {
                let size = monitor.size();
                PhysicalSize::new((size.width / 2).max(1), (size.height / 2).max(1))
            })
            .unwrap_or(PhysicalSize::new(image_w, image_h));

        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(size);

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match DemoState::new(window, self.config.clone()) {
            Ok(state) => {
                println!("=== Gaussian Blur ===");
                println!("Controls:");
                println!("  SPACE      - Toggle blur");
                println!("  H          - Toggle help");
                println!("  I          - Cycle image size");
                println!("  ALT+ENTER  - Toggle full screen");
                println!("  ESC        - Exit");
                println!();

                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let state = match &mut self.state {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                state.gpu_ctx.resize((size.width, size.height));
            }

            WindowEvent::Focused(focused) => {
                state.active = focused;
                event_loop.set_control_flow(control_flow_for(focused));
                // Avoid one huge frame delta after regaining focus
                state.last_update = Instant::now();
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                state.alt_held = modifiers.state().alt_key();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                if let Some(action) = action_for_key(key, state.alt_held, repeat) {
                    log::debug!("{:?}", action);
                    if !state.handle_action(action) {
                        event_loop.exit();
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if !state.active {
                    return;
                }
                state.update();
                if let Err(e) = state.render() {
                    log::error!("Render error: {}", e);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            // Request continuous redraw so the frame rate is measured;
            // nothing is drawn while unfocused
            if state.active {
                state.gpu_ctx.request_redraw();
            }
        }
    }
}

/// Spin for frames while focused, sleep until the next event otherwise
fn control_flow_for(active: bool) -> ControlFlow {
    if active {
        ControlFlow::Poll
    } else {
        ControlFlow::Wait
    }
}

/// Run the blur demo until the window is closed
pub fn run_blur_demo(config: DemoConfig) -> Result<(), DemoError> {
    // Fail before opening a window
    config.blur.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(control_flow_for(true));

    let mut app = BlurDemoApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
