//! glyphfall renderer - GPU feedback compositing for the glyph rain
//!
//! The [`FeedbackCompositor`] ping-pongs two offscreen targets: every frame
//! the CPU raster is uploaded into the back target, drawn through a slowly
//! pulsing shader into the front target, the roles swap, and the front
//! target is drawn onto the surface. [`DigitalRain`] ties the compositor to
//! a [`glyphfall_rain::RainField`] and a frame clock.
//!
//! All GPU work goes through [`GpuBackend`]; [`WgpuBackend`] talks to the
//! hardware and [`mock::MockBackend`] records calls for tests.

pub mod compositor;
pub mod error;
pub mod frame_loop;
pub mod mock;
pub mod shaders;
pub mod traits;
pub mod wgpu_backend;

pub use compositor::{FeedbackCompositor, OffscreenTarget, TargetPair};
pub use error::{RenderError, ShaderStage};
pub use frame_loop::{DigitalRain, FrameScheduler, SurfaceSize};
pub use shaders::brightness_multiplier;
pub use traits::{Destination, FULLSCREEN_QUAD, FrameUniforms, GpuBackend, QuadVertex};
pub use wgpu_backend::{TARGET_FORMAT, WgpuBackend};
