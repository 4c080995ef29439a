//! Shader module - WGSL sources for the feedback pass
//!
//! Shaders are stored as external .wgsl files and included at compile time.
//! The vertex and fragment stages live in separate files so each stage is
//! compiled on its own and the pair is linked when the pipeline is built.

/// Built-in shaders included at compile time
pub mod builtin {
    /// Vertex stage - passes quad position and texture coordinate through
    pub const FEEDBACK_VERTEX: &str = include_str!("feedback_vertex.wgsl");

    /// Fragment stage - samples the source texture with the pulsing dim
    pub const FEEDBACK_FRAGMENT: &str = include_str!("feedback_fragment.wgsl");
}

/// CPU mirror of the fragment stage's brightness multiplier
pub fn brightness_multiplier(time: f32) -> f32 {
    0.97 + 0.03 * (time * 0.1).sin()
}
