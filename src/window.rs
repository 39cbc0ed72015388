//! Windowed run mode.
//!
//! Frames are drawn on the GPU by a [`GpuCanvas`] bound to the window. The
//! window title carries the live status readout. Escape or closing the
//! window stops the run, as does the configured duration. A swapchain that
//! runs out of memory ends the run with an error.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::engine::Engine;
use crate::error::AppError;
use crate::gpu::GpuCanvas;

/// Run `engine` in a window until it stops.
pub fn run(engine: Engine) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(engine);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => {
            log::info!(
                "Stopped after {} frames, {:.1}s",
                app.frames,
                app.engine.elapsed()
            );
            Ok(())
        }
    }
}

/// What to do after presenting a frame failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Reconfigure,
    Skip,
}

fn recover(error: wgpu::SurfaceError) -> Result<Recovery, AppError> {
    match error {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Ok(Recovery::Reconfigure),
        wgpu::SurfaceError::OutOfMemory => Err(AppError::Present(error)),
        other => {
            log::warn!("Skipped frame: {}", other);
            Ok(Recovery::Skip)
        }
    }
}

struct App {
    engine: Engine,
    canvas: Option<GpuCanvas>,
    error: Option<AppError>,
    frames: u64,
}

impl App {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            canvas: None,
            error: None,
            frames: 0,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };

        let status = self.engine.frame(canvas);
        self.frames += 1;
        canvas.window().set_title(&status.to_string());

        if let Err(e) = canvas.present() {
            match recover(e) {
                Ok(Recovery::Reconfigure) => canvas.reconfigure(),
                Ok(Recovery::Skip) => {}
                Err(fatal) => return self.fail(event_loop, fatal),
            }
        }

        if self.engine.should_stop() {
            event_loop.exit();
        } else {
            canvas.window().request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.canvas.is_some() {
            return;
        }
        let config = self.engine.config();
        let (width, height, vsync) = (config.width, config.height, config.vsync);
        let window_attrs = Window::default_attributes()
            .with_title("Mandala")
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match pollster::block_on(GpuCanvas::new(window.clone(), width, height, vsync)) {
            Ok(canvas) => {
                self.canvas = Some(canvas);
                window.request_redraw();
            }
            Err(e) => self.fail(event_loop, e.into()),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(canvas) = &mut self.canvas {
                    canvas.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
