//! WebGPU rendering module
//!
//! The whole scene (starfield, craft, targets, shots) is drawn as signed
//! distance fields in one fullscreen fragment pass.

pub mod sdf_pipeline;

pub use sdf_pipeline::{MAX_PROJECTILES, MAX_TARGETS, SdfRenderState};
