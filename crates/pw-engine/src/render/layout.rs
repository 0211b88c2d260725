use std::collections::HashMap;

use super::{RenderCtx, VertexBuffer};

/// Component type of a vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AttribType {
    Float32,
}

impl AttribType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        4
    }
}

/// One named attribute inside an interleaved vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub ty: AttribType,
    pub count: u32,
    /// Byte size: `count * ty.size()`.
    pub size: u32,
    pub name: String,
}

/// Describes how one vertex buffer's interleaved data maps to attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    elements: Vec<VertexElement>,
    stride: u32,
    offset: u32,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout whose first vertex starts `offset` bytes into the buffer.
    pub fn with_offset(offset: u32) -> Self {
        Self { offset, ..Self::default() }
    }

    pub fn push(&mut self, ty: AttribType, count: u32, name: &str) -> &mut Self {
        let size = count * ty.size();
        self.elements.push(VertexElement { ty, count, size, name: name.to_owned() });
        self.stride += size;
        self
    }

    pub fn push_float(&mut self, count: u32, name: &str) -> &mut Self {
        self.push(AttribType::Float32, count, name)
    }

    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// wgpu attributes for the elements the shader consumes.
    ///
    /// Elements without a location in `locations` still occupy their bytes
    /// in the stride; they are simply not bound.
    pub(crate) fn attributes(&self, locations: &HashMap<String, u32>) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0u64;
        let mut out = Vec::with_capacity(self.elements.len());
        for el in &self.elements {
            if let (Some(&shader_location), Some(format)) =
                (locations.get(&el.name), vertex_format(el.ty, el.count))
            {
                out.push(wgpu::VertexAttribute { format, offset, shader_location });
            }
            offset += el.size as u64;
        }
        out
    }
}

pub(crate) fn vertex_format(ty: AttribType, count: u32) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match (ty, count) {
        (AttribType::Float32, 1) => F::Float32,
        (AttribType::Float32, 2) => F::Float32x2,
        (AttribType::Float32, 3) => F::Float32x3,
        (AttribType::Float32, 4) => F::Float32x4,
        _ => return None,
    })
}

/// A set of vertex buffers, each paired with its layout.
#[derive(Default)]
pub struct VertexArray {
    buffers: Vec<VertexBuffer>,
    layouts: Vec<VertexLayout>,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_buffer(&mut self, vb: VertexBuffer, layout: VertexLayout) -> &mut Self {
        self.buffers.push(vb);
        self.layouts.push(layout);
        self
    }

    /// Replaces the data of buffer `index`; out-of-range indices are ignored.
    pub fn update_buffer(&mut self, index: usize, data: impl Into<Vec<f32>>) {
        match self.buffers.get_mut(index) {
            Some(vb) => vb.update_data(data),
            None => log::warn!("vertex array has no buffer {index}"),
        }
    }

    pub fn buffers(&self) -> &[VertexBuffer] {
        &self.buffers
    }

    pub fn layouts(&self) -> &[VertexLayout] {
        &self.layouts
    }

    pub fn buffer_layouts(&self) -> impl Iterator<Item = (&VertexBuffer, &VertexLayout)> {
        self.buffers.iter().zip(self.layouts.iter())
    }

    /// Vertices in the first buffer.
    pub fn vertex_count(&self) -> usize {
        match (self.buffers.first(), self.layouts.first()) {
            (Some(vb), Some(layout)) if layout.stride() > 0 => {
                let words = vb.count().saturating_sub((layout.offset() / 4) as usize);
                words / (layout.stride() / 4) as usize
            }
            _ => 0,
        }
    }

    pub(crate) fn upload(&mut self, ctx: &RenderCtx<'_>) {
        for vb in &mut self.buffers {
            vb.upload(ctx);
        }
    }
}
