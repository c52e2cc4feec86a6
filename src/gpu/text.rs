//! Text overlay drawn on top of the composited image with glyphon

use super::{GpuContext, GpuError};

/// A single block of text anchored at a fixed position on screen
pub struct TextOverlay {
    font_system: glyphon::FontSystem,
    swash_cache: glyphon::SwashCache,
    viewport: glyphon::Viewport,
    atlas: glyphon::TextAtlas,
    text_renderer: glyphon::TextRenderer,
    buffer: glyphon::Buffer,
    color: glyphon::Color,
    position: (f32, f32),
    /// Text currently shaped into `buffer`
    text: String,
    resolution: (u32, u32),
}

impl TextOverlay {
    /// Create an overlay rendering to the surface format of `ctx`
    pub fn new(ctx: &GpuContext, font_size: f32, color: [u8; 3], position: (f32, f32)) -> Self {
        let mut font_system = glyphon::FontSystem::new();
        let swash_cache = glyphon::SwashCache::new();
        let cache = glyphon::Cache::new(&ctx.device);
        let viewport = glyphon::Viewport::new(&ctx.device, &cache);
        let mut atlas = glyphon::TextAtlas::new(&ctx.device, &ctx.queue, &cache, ctx.format());
        let text_renderer = glyphon::TextRenderer::new(
            &mut atlas,
            &ctx.device,
            wgpu::MultisampleState::default(),
            None,
        );

        let buffer = glyphon::Buffer::new(
            &mut font_system,
            glyphon::Metrics::new(font_size, font_size * 1.25),
        );

        Self {
            font_system,
            swash_cache,
            viewport,
            atlas,
            text_renderer,
            buffer,
            color: glyphon::Color::rgb(color[0], color[1], color[2]),
            position,
            text: String::new(),
            resolution: ctx.size,
        }
    }

    /// Replace the overlay text. Reshaping only happens when it changed.
    pub fn set_text(&mut self, text: &str) {
        if self.text == text {
            return;
        }

        self.buffer.set_text(
            &mut self.font_system,
            text,
            glyphon::Attrs::new().family(glyphon::Family::Monospace),
            glyphon::Shaping::Advanced,
        );
        self.buffer.set_size(&mut self.font_system, None, None);
        self.buffer.shape_until_scroll(&mut self.font_system, false);

        self.text.clear();
        self.text.push_str(text);
    }

    /// Upload glyphs for the current text. Call before the render pass opens.
    pub fn prepare(&mut self, ctx: &GpuContext) -> Result<(), GpuError> {
        self.resolution = ctx.size;
        self.viewport.update(
            &ctx.queue,
            glyphon::Resolution {
                width: ctx.size.0,
                height: ctx.size.1,
            },
        );

        let (left, top) = self.position;
        let area = glyphon::TextArea {
            buffer: &self.buffer,
            left,
            top,
            scale: 1.0,
            bounds: glyphon::TextBounds {
                left: 0,
                top: 0,
                right: ctx.size.0 as i32,
                bottom: ctx.size.1 as i32,
            },
            default_color: self.color,
            custom_glyphs: &[],
        };

        self.text_renderer.prepare(
            &ctx.device,
            &ctx.queue,
            &mut self.font_system,
            &mut self.atlas,
            &self.viewport,
            [area],
            &mut self.swash_cache,
        )?;
        Ok(())
    }

    /// Draw the prepared text across the whole surface
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) -> Result<(), GpuError> {
        // The image composite narrows the viewport; text is laid out in
        // surface pixels
        let (w, h) = self.resolution;
        render_pass.set_viewport(0.0, 0.0, w as f32, h as f32, 0.0, 1.0);
        self.text_renderer
            .render(&self.atlas, &self.viewport, render_pass)?;
        Ok(())
    }

    /// Release atlas space held by glyphs no longer on screen
    pub fn trim(&mut self) {
        self.atlas.trim();
    }
}
