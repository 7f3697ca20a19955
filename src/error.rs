// Error types for loading, rendering and the application shell

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a model file into a node tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to import {}: {source}", .path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{} contains no scene nodes", .0.display())]
    EmptyScene(PathBuf),
    #[error("model load task for {} did not finish: {reason}", .path.display())]
    Task { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to acquire device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
