//! Renderer error types
//!
//! Every variant is a startup-fatal condition: once the compositor is
//! built, frames never fail.

use std::fmt;

use thiserror::Error;

/// Shader stage a compile diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Errors raised while bringing up GPU resources
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no compatible GPU adapter: {0}")]
    NoAdapter(String),

    #[error("failed to create GPU device: {0}")]
    DeviceCreation(String),

    #[error("failed to create presentation surface: {0}")]
    SurfaceCreation(String),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("shader program failed to link: {0}")]
    ProgramLink(String),

    #[error("failed to allocate {width}x{height} render target: {reason}")]
    TargetAllocation {
        width: u32,
        height: u32,
        reason: String,
    },
}
