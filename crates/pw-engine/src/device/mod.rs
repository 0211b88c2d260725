//! wgpu device and window surface.
//!
//! `Gpu` is created once per window by the runtime; frames are acquired,
//! recorded into and presented through it.

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
