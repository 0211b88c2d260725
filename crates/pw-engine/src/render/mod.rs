//! Retained rendering layer.
//!
//! CPU-side objects (buffers, layouts, uniforms, reflected shaders) are plain
//! data; GPU resources are created lazily the first time a `Renderer` draws
//! them, so everything up to the draw call can be built and inspected without
//! a device.
//!
//! Convention: geometry is in world units; the vertex shaders map the
//! `u_viewbox` rectangle to clip space with +Y up.

mod buffer;
mod ctx;
mod layout;
mod renderable;
mod renderer;
mod shader;
mod texture;
mod uniform;

pub use buffer::{Buffer, BufferKind, IndexBuffer, VertexBuffer};
pub use ctx::{RenderCtx, RenderTarget};
pub use layout::{AttribType, VertexArray, VertexElement, VertexLayout};
pub use renderable::Renderable;
pub use renderer::{Drawable, Renderer};
pub use shader::{Shader, ShaderContext, ShaderFactory, ShaderReflection, UniformBlock};
pub use texture::Texture;
pub use uniform::{Uniform, UniformKind, UniformSlot, Uniforms};
pub use wgpu::FilterMode;
