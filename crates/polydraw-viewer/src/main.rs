use std::sync::Arc;

use anyhow::Context;
use glam::Vec2;
use polydraw::{DrawConfig, GroundPlane, Session, Vertex};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::Window,
};

use crate::{camera::OrthoCamera, render::Renderer, scene::SceneMirror, ui::ImguiState};

mod camera;
mod render;
mod scene;
mod ui;

/// Pixels per wheel notch for touchpads reporting pixel deltas.
const PIXELS_PER_SCROLL_STEP: f32 = 50.;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => DrawConfig::load(&path)
            .with_context(|| format!("loading config {}", path.to_string_lossy()))?,
        None => DrawConfig::default(),
    };

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct AppWindow {
    renderer: Renderer,
    window: Arc<Window>,
    camera: OrthoCamera,
    scene: SceneMirror,
    imgui: ImguiState,
    cursor: Option<Vec2>,
    panning: bool,
}

struct App {
    session: Session,
    ground: GroundPlane,
    app_window: Option<AppWindow>,
    startup_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: DrawConfig) -> Self {
        let ground = GroundPlane::new(config.ground_half_extent);

        Self {
            session: Session::new(config),
            ground,
            app_window: None,
            startup_error: None,
        }
    }
}

impl AppWindow {
    fn new(session: &Session, event_loop: &ActiveEventLoop) -> anyhow::Result<Self> {
        let window = {
            let size = LogicalSize::new(1280.0, 720.0);

            let attributes = Window::default_attributes()
                .with_inner_size(size)
                .with_title("Polydraw");
            Arc::new(
                event_loop
                    .create_window(attributes)
                    .context("failed to create window")?,
            )
        };

        let hidpi_factor = window.scale_factor() as f32;
        let renderer = Renderer::new(window.clone())?;
        let imgui = ImguiState::new(&renderer, hidpi_factor);

        let size = window.inner_size();
        let camera = OrthoCamera::new(size.width, size.height);
        let scene = SceneMirror::new(&renderer, session);

        log::info!("window ready at {}x{}", size.width, size.height);

        Ok(Self {
            renderer,
            window,
            camera,
            scene,
            imgui,
            cursor: None,
            panning: false,
        })
    }

    fn ground_point(&self, ground: &GroundPlane) -> Option<Vertex> {
        let ray = self.camera.cursor_ray(self.cursor?)?;
        ground.intersect(&ray)
    }

    fn redraw(&mut self, session: &mut Session) {
        self.imgui.toolbar.apply(session);
        self.scene.sync(&self.renderer, session);
        self.renderer.set_proj_view(&self.camera.proj_view());

        let Some(surface) = self.renderer.frame_surface_texture() else {
            return;
        };

        let view = surface
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.draw(&view, &self.scene.objects());
        self.imgui.draw(&self.renderer, &view, session);

        surface.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app_window.is_some() {
            return;
        }

        match AppWindow::new(&self.session, event_loop) {
            Ok(app_window) => self.app_window = Some(app_window),
            Err(err) => {
                log::error!("startup failed: {err:#}");
                self.startup_error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(app_window) = self.app_window.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::Resized(size) => {
                app_window.renderer.resize(size.width, size.height);
                app_window.camera.resize(size.width, size.height);
                log::info!("resized to {}x{}", size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let cursor = Vec2::new(position.x as f32, position.y as f32);
                let previous = app_window.cursor.replace(cursor);

                if app_window.panning {
                    if let Some(previous) = previous {
                        app_window.camera.pan_by_pixels(cursor - previous);
                    }
                } else if !app_window.imgui.wants_mouse() {
                    let point = app_window.ground_point(&self.ground);
                    self.session.pointer_moved(point);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                app_window.cursor = None;
                app_window.panning = false;
            }
            WindowEvent::MouseInput { state, button, .. } => match (button, state) {
                (MouseButton::Left, ElementState::Pressed) if !app_window.imgui.wants_mouse() => {
                    let point = app_window.ground_point(&self.ground);
                    self.session.click(point);
                }
                (MouseButton::Right | MouseButton::Middle, ElementState::Pressed)
                    if !app_window.imgui.wants_mouse() =>
                {
                    app_window.panning = true;
                }
                (MouseButton::Right | MouseButton::Middle, ElementState::Released) => {
                    app_window.panning = false;
                }
                _ => (),
            },
            WindowEvent::MouseWheel { delta, .. } if !app_window.imgui.wants_mouse() => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(physical_position) => {
                        physical_position.y as f32 / PIXELS_PER_SCROLL_STEP
                    }
                };

                app_window.camera.zoom_by(steps);
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => app_window.redraw(&mut self.session),
            _ => (),
        }

        app_window.imgui.handle_event(
            &app_window.renderer,
            &Event::WindowEvent { window_id, event },
        );
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ()) {
        let Some(app_window) = self.app_window.as_mut() else {
            return;
        };
        app_window
            .imgui
            .handle_event(&app_window.renderer, &Event::UserEvent(event));
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(app_window) = self.app_window.as_mut() else {
            return;
        };
        app_window.imgui.handle_event(
            &app_window.renderer,
            &Event::DeviceEvent { device_id, event },
        );
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(app_window) = self.app_window.as_mut() else {
            return;
        };
        app_window.window.request_redraw();
        app_window
            .imgui
            .handle_event(&app_window.renderer, &Event::AboutToWait);
    }
}
