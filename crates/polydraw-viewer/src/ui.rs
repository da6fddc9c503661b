use std::time::Instant;

use imgui::{Condition, FontSource, MouseCursor};
use imgui_wgpu::RendererConfig;
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use polydraw::{Mode, Session};
use winit::event::Event;

use crate::render::Renderer;

pub struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
    renderer: imgui_wgpu::Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    pub toolbar: ToolbarState,
}

/// Buttons pressed during the last frame, applied to the session by the
/// caller.
#[derive(Default)]
pub struct ToolbarState {
    pub complete: bool,
    pub copy: bool,
    pub new_polygon: bool,
    pub reset: bool,
}

impl ToolbarState {
    /// Applies and clears the pressed buttons.
    pub fn apply(&mut self, session: &mut Session) {
        if std::mem::take(&mut self.complete) {
            session.complete();
        }
        if std::mem::take(&mut self.copy) {
            session.copy_last();
        }
        if std::mem::take(&mut self.new_polygon) {
            session.begin_polygon();
        }
        if std::mem::take(&mut self.reset) {
            session.reset();
        }
    }
}

impl ImguiState {
    pub fn new(renderer: &Renderer, hidpi_factor: f32) -> Self {
        let mut context = imgui::Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), &renderer.window, HiDpiMode::Default);
        load_default_font(&mut context, hidpi_factor);

        let renderer = imgui_wgpu::Renderer::new(
            &mut context,
            &renderer.device,
            &renderer.queue,
            RendererConfig {
                texture_format: renderer.surface_config.format,
                ..Default::default()
            },
        );

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
            toolbar: ToolbarState::default(),
        }
    }

    pub fn handle_event(&mut self, renderer: &Renderer, event: &Event<()>) {
        self.platform
            .handle_event::<()>(self.context.io_mut(), &renderer.window, event);
    }

    /// Whether the pointer is over a UI window, in which case clicks and
    /// moves must not reach the viewport.
    pub fn wants_mouse(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    pub fn draw(&mut self, renderer: &Renderer, view: &wgpu::TextureView, session: &Session) {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(err) = self
            .platform
            .prepare_frame(self.context.io_mut(), &renderer.window)
        {
            log::error!("failed to prepare UI frame: {err}");
            return;
        }

        let ui = self.context.frame();
        let actions = session.actions();
        let toolbar = &mut self.toolbar;

        ui.window("Polygons")
            .position([10., 10.], Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                ui.disabled(!actions.complete, || {
                    toolbar.complete |= ui.button("Complete");
                });
                ui.same_line();
                ui.disabled(!actions.copy, || {
                    toolbar.copy |= ui.button("Copy");
                });
                ui.same_line();
                ui.disabled(!actions.new_polygon, || {
                    toolbar.new_polygon |= ui.button("New polygon");
                });
                ui.same_line();
                ui.disabled(!actions.reset, || {
                    toolbar.reset |= ui.button("Reset");
                });

                ui.separator();

                let status = match session.mode() {
                    Mode::Idle => "Idle".to_string(),
                    Mode::Drawing => format!(
                        "Drawing ({} vertices)",
                        session
                            .drawing_polygon()
                            .map_or(0, |polygon| polygon.vertex_count())
                    ),
                    Mode::DraggingDuplicate => "Placing copy".to_string(),
                };
                ui.text(status);
                ui.text(format!("Polygons: {}", session.committed_polygons().len()));
            });

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, &renderer.window);
        }

        let mut encoder = renderer
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ui encoder"),
            });

        {
            let mut pass = begin_overlay_pass(&mut encoder, view);
            let draw_data = self.context.render();

            if let Err(err) =
                self.renderer
                    .render(draw_data, &renderer.queue, &renderer.device, &mut pass)
            {
                log::error!("failed to render UI: {err:?}");
            }
        }

        renderer.queue.submit(Some(encoder.finish()));
    }
}

/// Default imgui font rasterized at the window's scale factor, then scaled
/// back down so UI sizes stay in logical pixels.
fn load_default_font(context: &mut imgui::Context, hidpi_factor: f32) {
    context.io_mut().font_global_scale = 1.0 / hidpi_factor;
    context.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(imgui::FontConfig {
            oversample_h: 1,
            pixel_snap_h: true,
            size_pixels: 13.0 * hidpi_factor,
            ..Default::default()
        }),
    }]);
}

/// Render pass drawing over the finished scene. Keeps the color target and
/// ignores depth.
fn begin_overlay_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    view: &'a wgpu::TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("ui pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
