//! Runs the wavefront expansion step on the GPU with WGPU compute shaders.
//!
//! [`GpuWavefrontDispatch`] implements [`wfp_core::WavefrontDispatch`], so it drops
//! into a [`wfp_core::FrontierEngine`] in place of the CPU reference dispatch.

mod buffers;
mod pipeline;
mod shaders;
mod sync;

pub mod context;
pub mod dispatch;
pub mod error;

pub use context::GpuContext;
pub use dispatch::GpuWavefrontDispatch;
pub use error::GpuError;
