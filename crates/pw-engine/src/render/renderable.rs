use std::rc::Rc;

use super::{
    Drawable,
    IndexBuffer,
    RenderCtx,
    Shader,
    Texture,
    Uniform,
    Uniforms,
    VertexArray,
};

/// One drawable object: indexed geometry, a shader, textures and its own
/// uniform values.
///
/// GPU state (buffers, uniform blocks, bind group, pipeline) is created in
/// `prepare`; `draw` only records commands.
pub struct Renderable {
    ibo: IndexBuffer,
    va: VertexArray,
    shader: Rc<Shader>,
    textures: Vec<Rc<Texture>>,
    uniforms: Uniforms,

    block_bytes: Vec<Vec<u8>>,
    ubos: Vec<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    pipeline: Option<wgpu::RenderPipeline>,

    warned_textures: bool,
}

impl Renderable {
    pub fn new(
        ibo: IndexBuffer,
        va: VertexArray,
        shader: Rc<Shader>,
        textures: Vec<Rc<Texture>>,
        uniforms: Uniforms,
    ) -> Self {
        Self {
            ibo,
            va,
            shader,
            textures,
            uniforms,
            block_bytes: Vec::new(),
            ubos: Vec::new(),
            bind_group: None,
            pipeline: None,
            warned_textures: false,
        }
    }

    pub fn shader(&self) -> &Rc<Shader> {
        &self.shader
    }

    pub fn textures(&self) -> &[Rc<Texture>] {
        &self.textures
    }

    pub fn set_textures(&mut self, textures: Vec<Rc<Texture>>) {
        self.textures = textures;
        self.bind_group = None;
        self.warned_textures = false;
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    pub fn set_uniform(&mut self, name: &str, value: Uniform) {
        self.uniforms.insert(name.to_owned(), value);
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.ibo
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.va
    }

    pub fn update_index_buffer(&mut self, indices: impl Into<Vec<u32>>) {
        self.ibo.update_data(indices);
    }

    pub fn update_vertex_buffer(&mut self, index: usize, data: impl Into<Vec<f32>>) {
        self.va.update_buffer(index, data);
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() {
            return;
        }

        let shader = Rc::clone(&self.shader);
        let reflection = shader.reflection();
        let gpu = shader.bind(ctx.device);

        self.ubos = reflection
            .blocks
            .iter()
            .map(|block| {
                ctx.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("pw uniform block"),
                    size: block.size as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let mut entries = Vec::new();
        for (ubo, block) in self.ubos.iter().zip(&reflection.blocks) {
            entries.push(wgpu::BindGroupEntry {
                binding: block.binding,
                resource: ubo.as_entire_binding(),
            });
        }

        let units = reflection.textures.iter().zip(&reflection.samplers);
        for ((&tex_binding, &sampler_binding), texture) in units.zip(&self.textures) {
            let tex = texture.upload(ctx);
            entries.push(wgpu::BindGroupEntry {
                binding: tex_binding,
                resource: wgpu::BindingResource::TextureView(&tex.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: sampler_binding,
                resource: wgpu::BindingResource::Sampler(&tex.sampler),
            });
        }

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pw renderable bind group"),
            layout: &gpu.bind_group_layout,
            entries: &entries,
        }));
    }
}

impl Drawable for Renderable {
    fn uniforms_mut(&mut self) -> &mut Uniforms {
        &mut self.uniforms
    }

    fn prepare(&mut self, ctx: &RenderCtx<'_>, format: wgpu::TextureFormat) {
        self.pipeline = None;
        if self.ibo.count() == 0 {
            return;
        }

        let needed = self.shader.reflection().textures.len();
        let enough = self.textures.len() >= needed;
        debug_assert!(
            enough,
            "shader `{}` samples {needed} textures, renderable has {}",
            self.shader.name(),
            self.textures.len()
        );
        if !enough {
            if !self.warned_textures {
                log::warn!(
                    "shader `{}` samples {needed} textures but only {} bound; not drawing",
                    self.shader.name(),
                    self.textures.len()
                );
                self.warned_textures = true;
            }
            return;
        }

        if self.ibo.is_dirty() {
            let vertices = self.va.vertex_count();
            debug_assert!(
                self.ibo.data().iter().all(|&i| (i as usize) < vertices),
                "index out of range for {vertices} vertices"
            );
        }

        self.ibo.upload(ctx);
        self.va.upload(ctx);

        self.ensure_bindings(ctx);
        self.shader.write_uniforms(&self.uniforms, &mut self.block_bytes);
        for (ubo, bytes) in self.ubos.iter().zip(&self.block_bytes) {
            ctx.queue.write_buffer(ubo, 0, bytes);
        }

        self.pipeline = self.shader.pipeline(ctx.device, format, self.va.layouts());
    }

    fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        let (Some(pipeline), Some(bind_group)) = (&self.pipeline, &self.bind_group) else {
            return;
        };
        let Some(indices) = self.ibo.gpu_slice(0) else { return };

        let mut vertex_slices = Vec::with_capacity(self.va.buffers().len());
        for (vb, layout) in self.va.buffer_layouts() {
            let Some(slice) = vb.gpu_slice(layout.offset() as u64) else { return };
            vertex_slices.push(slice);
        }

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        for (slot, slice) in vertex_slices.into_iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, slice);
        }
        rpass.set_index_buffer(indices, wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..self.ibo.count() as u32, 0, 0..1);
    }
}
