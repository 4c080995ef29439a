//! glyphfall - digital rain with a GPU feedback loop
//!
//! Two-stage rendering:
//! 1. Rasterize the falling glyph columns into a CPU buffer that only fades
//! 2. Upload it and ping-pong it through the pulsing feedback shader onto
//!    the window surface

mod config;
mod font;
mod gpu;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use config::Config;
use glyphfall_rain::RainField;
use glyphfall_renderer::{DigitalRain, SurfaceSize, WgpuBackend};
use gpu::GpuContext;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

/// Redraw interval (~60fps)
const TARGET_FRAME_TIME: Duration = Duration::from_micros(16666);

/// Surface dimensions read straight from the window
struct WindowSurface(Arc<Window>);

impl SurfaceSize for WindowSurface {
    fn dimensions(&self) -> (u32, u32) {
        let size = self.0.inner_size();
        (size.width, size.height)
    }
}

/// Everything that exists once the window is up
struct Running {
    surface: WindowSurface,
    rain: DigitalRain<WgpuBackend>,
}

struct App {
    config: Config,
    running: Option<Running>,
    start_time: Instant,
    /// Last frame time for throttling redraws
    last_frame_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new() -> Self {
        let now = Instant::now();
        Self {
            config: Config::load(),
            running: None,
            start_time: now,
            last_frame_time: now,
            error: None,
        }
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
        let mut window_attrs = Window::default_attributes()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        if self.config.window.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );
        let size = window.inner_size();

        let gpu = GpuContext::new(window.clone()).context("failed to initialize GPU")?;
        let backend = WgpuBackend::new(gpu.device, gpu.queue, gpu.surface, gpu.config);

        let field = RainField::new(size.width, size.height);
        let glyphs = font::load_glyph_source(&self.config.font);
        let rain = DigitalRain::new(backend, field, glyphs)
            .context("failed to build feedback compositor")?;

        log::info!(
            "Rain running at {}x{} with {} columns",
            size.width,
            size.height,
            rain.field().columns().len()
        );

        Ok(Running {
            surface: WindowSurface(window),
            rain,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else { return };

        match event {
            WindowEvent::CloseRequested => {
                self.running = None;
                event_loop.exit();
            }

            // The new size is picked up at the next frame boundary
            WindowEvent::Resized(size) => {
                log::debug!("Window resized to {}x{}", size.width, size.height);
                running.surface.0.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let timestamp_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
                if let Err(e) = running.rain.frame(&running.surface, timestamp_ms) {
                    let error = anyhow::Error::new(e).context("failed to reallocate render targets");
                    self.running = None;
                    self.fail(event_loop, error);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let elapsed = self.last_frame_time.elapsed();

        if elapsed >= TARGET_FRAME_TIME {
            self.last_frame_time = Instant::now();

            if let Some(running) = &self.running {
                running.surface.0.request_redraw();
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn,glyphfall=info")).init();
    log::info!("glyphfall starting");

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).context("event loop terminated abnormally")?;

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
