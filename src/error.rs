//! Error types for the mandala engine.
//!
//! The simulation core itself cannot fail once constructed. Errors come from
//! the edges: allocating the particle arrays, allocating supersample
//! surfaces, GPU presentation, the window system and metrics I/O.

use std::fmt;

/// Errors reported by a [`Renderer`](crate::render::Renderer) back-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The offscreen surface could not be allocated.
    OffscreenAllocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The offscreen surface exceeds the back-end's maximum dimension.
    OffscreenTooLarge {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
        /// Maximum allowed size on either axis.
        limit: u32,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::OffscreenAllocation { width, height } => {
                write!(f, "Failed to allocate {}x{} offscreen surface", width, height)
            }
            RenderError::OffscreenTooLarge { width, height, limit } => write!(
                f,
                "Offscreen surface {}x{} exceeds the maximum dimension {}",
                width, height, limit
            ),
        }
    }
}

impl std::error::Error for RenderError {}

/// Errors that can occur while building a [`Scene`](crate::scene::Scene).
#[derive(Debug)]
pub enum SceneError {
    /// Not enough memory for one of the per-particle arrays.
    OutOfMemory {
        /// Which array failed.
        what: &'static str,
        /// Number of elements requested.
        count: usize,
    },
    /// The worker pool could not be started.
    Workers(rayon::ThreadPoolBuildError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::OutOfMemory { what, count } => {
                write!(f, "Out of memory allocating {} {}", count, what)
            }
            SceneError::Workers(e) => write!(f, "Failed to start worker pool: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Workers(e) => Some(e),
            SceneError::OutOfMemory { .. } => None,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for SceneError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SceneError::Workers(e)
    }
}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Try --headless on machines without a GPU."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors produced by a metrics sink.
#[derive(Debug)]
pub enum MetricsError {
    /// Writing a row failed.
    Io(std::io::Error),
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::Io(e) => write!(f, "Failed to write metrics: {}", e),
        }
    }
}

impl std::error::Error for MetricsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MetricsError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for MetricsError {
    fn from(e: std::io::Error) -> Self {
        MetricsError::Io(e)
    }
}

/// Fatal errors that stop a run.
#[derive(Debug)]
pub enum AppError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The swapchain failed in a way that cannot be recovered from.
    Present(wgpu::SurfaceError),
    /// The scene could not be built.
    Scene(SceneError),
    /// Writing the snapshot image failed.
    Snapshot(image::ImageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            AppError::Window(e) => write!(f, "Failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "GPU error: {}", e),
            AppError::Present(e) => write!(f, "Failed to present frame: {}", e),
            AppError::Scene(e) => write!(f, "Scene error: {}", e),
            AppError::Snapshot(e) => write!(f, "Failed to write snapshot: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Present(e) => Some(e),
            AppError::Scene(e) => Some(e),
            AppError::Snapshot(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Gpu(e)
    }
}

impl From<wgpu::SurfaceError> for AppError {
    fn from(e: wgpu::SurfaceError) -> Self {
        AppError::Present(e)
    }
}

impl From<SceneError> for AppError {
    fn from(e: SceneError) -> Self {
        AppError::Scene(e)
    }
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        AppError::Snapshot(e)
    }
}
