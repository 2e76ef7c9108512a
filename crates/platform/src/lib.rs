//! Platform layer: window, event loop and input for the globe viewer.
//!
//! Redraws are continuous so a texture still loading in the background is
//! picked up on the first frame after it lands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use corelib::WorldCamera;
use renderer::{GlobeOptions, GlobeTexture, WgpuContext, WorldGlobe, WorldRenderer};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

pub mod input;

use input::{Nudge, OrbitControls};

/// Everything the viewer needs to start.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub backends: wgpu::Backends,
    pub width: u32,
    pub height: u32,
    /// Equirectangular PNG for the globe; a generated graticule when `None`.
    pub texture: Option<PathBuf>,
    pub background: [f32; 3],
    pub show_axes: bool,
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub dist: f64,
    pub fov_deg: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            width: 1280,
            height: 720,
            texture: None,
            background: [0.0, 0.0, 0.0],
            show_axes: false,
            lon_deg: 0.0,
            lat_deg: 0.0,
            dist: corelib::world_camera::ORBIT_RADIUS,
            fov_deg: corelib::world_camera::DEFAULT_FOV_DEG,
        }
    }
}

struct Viewer {
    window: Arc<Window>,
    ctx: WgpuContext,
    world: WorldRenderer,
    camera: WorldCamera,
    /// Globe shows the configured file rather than the graticule.
    file_surface: bool,
}

struct ViewerApp {
    config: ViewerConfig,
    viewer: Option<Viewer>,
    controls: OrbitControls,
    error: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            viewer: None,
            controls: OrbitControls::new(),
            error: None,
        }
    }

    fn create_viewer(&self, event_loop: &ActiveEventLoop) -> Result<Viewer> {
        let cfg = &self.config;
        let attrs = Window::default_attributes()
            .with_title("Globe")
            .with_inner_size(PhysicalSize::new(cfg.width, cfg.height));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let PhysicalSize { width, height } = window.inner_size();
        log::info!("Window created: {width}x{height}");

        let mut ctx = pollster::block_on(WgpuContext::new(window.clone(), cfg.backends))?;

        let options = GlobeOptions {
            texture: cfg
                .texture
                .clone()
                .map_or(GlobeTexture::Graticule, GlobeTexture::File),
            background: cfg.background,
            ..Default::default()
        };
        let globe = WorldGlobe::new(&mut ctx, options)?;
        let world = WorldRenderer::new(&mut ctx, globe, cfg.show_axes)?;

        let mut camera = WorldCamera::with_fov(width.max(1), height.max(1), cfg.fov_deg);
        camera.set_pose_by_lon_lat(cfg.lon_deg, cfg.lat_deg, cfg.dist);

        Ok(Viewer {
            window,
            ctx,
            world,
            camera,
            file_surface: cfg.texture.is_some(),
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match self.create_viewer(event_loop) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(err) => self.fail(event_loop, err.context("viewer init failed")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        let controls = &mut self.controls;

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Resized: {}x{}", size.width, size.height);
                let (w, h) = (size.width.max(1), size.height.max(1));
                viewer.ctx.resize(w, h);
                viewer.camera.set_aspect_ratio(w, h);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => controls.set_dragging(state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => {
                controls.cursor_moved(&mut viewer.camera, position.x, position.y);
            }
            WindowEvent::CursorLeft { .. } => controls.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                    MouseScrollDelta::PixelDelta(p) => p.y / 50.0,
                };
                controls.scroll(&mut viewer.camera, lines);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match key {
                    KeyCode::Escape => event_loop.exit(),
                    KeyCode::KeyA if !event.repeat => {
                        let show = !viewer.world.show_axes();
                        viewer.world.set_show_axes(show);
                        log::info!("axes {}", if show { "on" } else { "off" });
                    }
                    KeyCode::KeyT if !event.repeat => {
                        let Some(path) = self.config.texture.clone() else {
                            return;
                        };
                        viewer.file_surface = !viewer.file_surface;
                        let surface = if viewer.file_surface {
                            GlobeTexture::File(path)
                        } else {
                            GlobeTexture::Graticule
                        };
                        viewer.world.globe_mut().set_surface(&surface);
                    }
                    KeyCode::KeyR => {
                        let cfg = &self.config;
                        controls.reset(&mut viewer.camera, cfg.lon_deg, cfg.lat_deg, cfg.dist);
                    }
                    KeyCode::ArrowLeft => controls.nudge(&mut viewer.camera, Nudge::Left),
                    KeyCode::ArrowRight => controls.nudge(&mut viewer.camera, Nudge::Right),
                    KeyCode::ArrowUp => controls.nudge(&mut viewer.camera, Nudge::Up),
                    KeyCode::ArrowDown => controls.nudge(&mut viewer.camera, Nudge::Down),
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = viewer.world.render(&mut viewer.ctx, &viewer.camera) {
                    log::warn!("frame skipped: {err}");
                }
                match viewer.ctx.present() {
                    Ok(()) => {}
                    Err(e) if WgpuContext::is_surface_lost(&e) => {
                        log::warn!("Surface lost/outdated: recreating");
                        viewer.ctx.recreate_surface();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory");
                        self.error = Some(anyhow::anyhow!("GPU out of memory"));
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::warn!("Surface error: {e:?}"),
                }

                let (lon, lat, _) = viewer.camera.lon_lat_dist();
                let mut title = format!("Globe | lon {lon:.1}° lat {lat:.1}° | zoom {:.2}", controls.zoom());
                if viewer.world.globe().texture_error().is_some() {
                    title.push_str(" | texture failed");
                }
                viewer.window.set_title(&title);
                viewer.window.request_redraw();
            }
            _ => {}
        }
    }
}

/// Opens the viewer window and runs until it is closed.
pub fn run_viewer(config: ViewerConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(config);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
