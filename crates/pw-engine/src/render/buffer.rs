use bytemuck::Pod;

use super::RenderCtx;

/// Which binding point a buffer feeds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

impl BufferKind {
    fn usage(self) -> wgpu::BufferUsages {
        match self {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            BufferKind::Index => wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        }
    }

    fn label(self) -> &'static str {
        match self {
            BufferKind::Vertex => "pw vertex buffer",
            BufferKind::Index => "pw index buffer",
        }
    }
}

/// CPU-owned typed data with a lazily synchronized GPU copy.
///
/// `update_data` replaces the contents and marks the buffer dirty; the next
/// `upload` pushes the data, growing the GPU allocation to the next power of
/// two when needed.
pub struct Buffer<T: Pod> {
    kind: BufferKind,
    data: Vec<T>,
    dirty: bool,
    gpu: Option<wgpu::Buffer>,
    /// GPU capacity in elements.
    capacity: usize,
}

/// Vertex data is always stored as 32-bit floats.
pub type VertexBuffer = Buffer<f32>;

pub type IndexBuffer = Buffer<u32>;

impl<T: Pod> Buffer<T> {
    pub fn new(kind: BufferKind, data: Vec<T>) -> Self {
        Self { kind, data, dirty: true, gpu: None, capacity: 0 }
    }

    pub fn vertex(data: Vec<T>) -> Self {
        Self::new(BufferKind::Vertex, data)
    }

    pub fn index(data: Vec<T>) -> Self {
        Self::new(BufferKind::Index, data)
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Number of elements.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the contents; the GPU copy is refreshed on the next upload.
    pub fn update_data(&mut self, data: impl Into<Vec<T>>) {
        self.data = data.into();
        self.dirty = true;
    }

    /// Synchronizes the GPU copy if the data changed since the last upload.
    pub fn upload(&mut self, ctx: &RenderCtx<'_>) {
        if !self.dirty || self.data.is_empty() {
            return;
        }

        if self.gpu.is_none() || self.data.len() > self.capacity {
            let capacity = self.data.len().next_power_of_two().max(64);
            let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.kind.label()),
                size: (capacity * std::mem::size_of::<T>()) as u64,
                usage: self.kind.usage(),
                mapped_at_creation: false,
            });
            log::trace!("{} grown to {capacity} elements", self.kind.label());
            self.gpu = Some(buffer);
            self.capacity = capacity;
        }

        if let Some(buffer) = &self.gpu {
            ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(&self.data));
        }
        self.dirty = false;
    }

    /// Slice of the uploaded data starting `offset` bytes in.
    pub(crate) fn gpu_slice(&self, offset: u64) -> Option<wgpu::BufferSlice<'_>> {
        let end = (self.data.len() * std::mem::size_of::<T>()) as u64;
        if offset >= end {
            return None;
        }
        self.gpu.as_ref().map(|b| b.slice(offset..end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_starts_dirty() {
        let vb = VertexBuffer::vertex(vec![0.0, 1.0]);
        assert!(vb.is_dirty());
        assert_eq!(vb.count(), 2);
        assert_eq!(vb.kind(), BufferKind::Vertex);
    }

    #[test]
    fn update_replaces_contents() {
        let mut ib = IndexBuffer::index(vec![0, 1, 2]);
        ib.update_data(vec![0, 1, 2, 1, 2, 3]);
        assert_eq!(ib.data(), &[0, 1, 2, 1, 2, 3]);
        assert!(ib.is_dirty());
    }

    #[test]
    fn no_slice_before_upload() {
        let vb = VertexBuffer::vertex(vec![0.0; 8]);
        assert!(vb.gpu_slice(0).is_none());
    }
}
