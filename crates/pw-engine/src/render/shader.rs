use std::borrow::Cow;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, ArraySize, Binding, Handle, Module, Scalar, ShaderStage, TypeInner, VectorSize};

use super::{Uniform, UniformKind, UniformSlot, Uniforms, VertexLayout};

/// `$NAME` substitutions applied to shader sources before compilation.
pub type ShaderContext = HashMap<String, String>;

/// Builds shaders from a vertex + fragment WGSL pair.
///
/// The two sources are concatenated after substitution, so the fragment part
/// may reference structs declared in the vertex part.
#[derive(Debug, Clone)]
pub struct ShaderFactory {
    vertex_src: String,
    fragment_src: String,
}

impl ShaderFactory {
    pub fn new(vertex_src: impl Into<String>, fragment_src: impl Into<String>) -> Self {
        Self {
            vertex_src: vertex_src.into(),
            fragment_src: fragment_src.into(),
        }
    }

    /// Compiles and reflects the shader.
    ///
    /// Parse and validation failures go to `on_error` with a rendered
    /// diagnostic and `None` is returned; the caller decides whether that is
    /// fatal.
    pub fn create_shader(
        &self,
        name: &str,
        context: &ShaderContext,
        on_error: &dyn Fn(&str),
    ) -> Option<Rc<Shader>> {
        let vertex = substitute(&self.vertex_src, context);
        let fragment = substitute(&self.fragment_src, context);
        let source = if fragment.trim().is_empty() {
            vertex
        } else {
            format!("{vertex}\n{fragment}")
        };

        match Shader::from_wgsl(name, source) {
            Ok(shader) => {
                log::debug!("compiled shader `{name}`");
                Some(Rc::new(shader))
            }
            Err(msg) => {
                log::error!("shader `{name}` failed to compile:\n{msg}");
                on_error(&msg);
                None
            }
        }
    }
}

/// Replaces every `$KEY` with its value. Longer keys go first so that
/// `$N_MAX` is not clobbered by `$N`.
pub(crate) fn substitute(src: &str, context: &ShaderContext) -> String {
    let mut keys: Vec<&String> = context.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut out = src.to_owned();
    for key in keys {
        out = out.replace(&format!("${key}"), &context[key]);
    }
    out
}

/// One `var<uniform>` binding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    pub binding: u32,
    /// Buffer size in bytes, a multiple of 16.
    pub size: u32,
}

/// Everything the renderer needs to know about a compiled module, resolved
/// once and keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ShaderReflection {
    pub blocks: Vec<UniformBlock>,
    pub uniforms: HashMap<String, UniformSlot>,
    /// Texture bindings in ascending order; texture unit `i` binds here.
    pub textures: Vec<u32>,
    /// Sampler bindings in ascending order, paired with `textures`.
    pub samplers: Vec<u32>,
    pub attributes: HashMap<String, u32>,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

impl ShaderReflection {
    pub fn from_module(module: &Module) -> Result<Self, String> {
        let mut out = Self::default();

        for (_, var) in module.global_variables.iter() {
            let Some(binding) = &var.binding else { continue };
            if binding.group != 0 {
                return Err(format!(
                    "resource at @group({}) @binding({}): only @group(0) is supported",
                    binding.group, binding.binding
                ));
            }

            match (var.space, &module.types[var.ty].inner) {
                (AddressSpace::Uniform, TypeInner::Struct { members, span }) => {
                    let block = out.blocks.len();
                    out.blocks.push(UniformBlock { binding: binding.binding, size: round_up(*span, 16) });
                    for member in members {
                        let Some(name) = &member.name else { continue };
                        let kind = classify(module, member.ty)
                            .ok_or_else(|| format!("uniform `{name}` has an unsupported type"))?;
                        out.uniforms.insert(name.clone(), UniformSlot { block, offset: member.offset, kind });
                    }
                }
                (AddressSpace::Uniform, _) => {
                    let name = var.name.clone().unwrap_or_default();
                    let kind = classify(module, var.ty)
                        .ok_or_else(|| format!("uniform `{name}` has an unsupported type"))?;
                    let block = out.blocks.len();
                    out.blocks.push(UniformBlock {
                        binding: binding.binding,
                        size: round_up(kind.byte_size(), 16),
                    });
                    out.uniforms.insert(name, UniformSlot { block, offset: 0, kind });
                }
                (AddressSpace::Handle, TypeInner::Image { .. }) => out.textures.push(binding.binding),
                (AddressSpace::Handle, TypeInner::Sampler { .. }) => out.samplers.push(binding.binding),
                _ => {
                    return Err(format!("unsupported resource at @binding({})", binding.binding));
                }
            }
        }

        out.textures.sort_unstable();
        out.samplers.sort_unstable();
        if out.textures.len() != out.samplers.len() {
            return Err(format!(
                "{} textures but {} samplers; every texture needs its own sampler",
                out.textures.len(),
                out.samplers.len()
            ));
        }

        for ep in &module.entry_points {
            match ep.stage {
                ShaderStage::Vertex if out.vertex_entry.is_empty() => {
                    out.vertex_entry = ep.name.clone();
                    collect_attributes(module, &ep.function, &mut out.attributes);
                }
                ShaderStage::Fragment if out.fragment_entry.is_empty() => {
                    out.fragment_entry = ep.name.clone();
                }
                _ => {}
            }
        }

        if out.vertex_entry.is_empty() {
            return Err("no @vertex entry point".to_owned());
        }
        if out.fragment_entry.is_empty() {
            return Err("no @fragment entry point".to_owned());
        }

        Ok(out)
    }
}

fn collect_attributes(module: &Module, function: &naga::Function, out: &mut HashMap<String, u32>) {
    for arg in &function.arguments {
        match (&arg.binding, &module.types[arg.ty].inner) {
            (Some(Binding::Location { location, .. }), _) => {
                if let Some(name) = &arg.name {
                    out.insert(name.clone(), *location);
                }
            }
            (None, TypeInner::Struct { members, .. }) => {
                for member in members {
                    if let (Some(Binding::Location { location, .. }), Some(name)) =
                        (&member.binding, &member.name)
                    {
                        out.insert(name.clone(), *location);
                    }
                }
            }
            _ => {}
        }
    }
}

fn classify(module: &Module, ty: Handle<naga::Type>) -> Option<UniformKind> {
    match &module.types[ty].inner {
        TypeInner::Scalar(s) if *s == Scalar::F32 => Some(UniformKind::Float),
        TypeInner::Scalar(s) if *s == Scalar::I32 => Some(UniformKind::Int),
        TypeInner::Scalar(s) if *s == Scalar::U32 => Some(UniformKind::UInt),
        TypeInner::Vector { size, scalar } if *scalar == Scalar::F32 => Some(match size {
            VectorSize::Bi => UniformKind::Vec2,
            VectorSize::Tri => UniformKind::Vec3,
            VectorSize::Quad => UniformKind::Vec4,
        }),
        TypeInner::Matrix { columns: VectorSize::Tri, rows: VectorSize::Tri, scalar }
            if *scalar == Scalar::F32 =>
        {
            Some(UniformKind::Mat3)
        }
        TypeInner::Array { base, size: ArraySize::Constant(len), stride } => {
            match classify(module, *base)? {
                UniformKind::Vec3 => Some(UniformKind::Vec3Array { len: len.get(), stride: *stride }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

pub(crate) struct ShaderGpu {
    pub module: wgpu::ShaderModule,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    format: wgpu::TextureFormat,
    buffers: Vec<(u64, Vec<wgpu::VertexAttribute>)>,
}

/// A validated WGSL program plus its reflection.
///
/// GPU objects (module, bind group layout, pipelines per target format and
/// vertex layout) are created on first use and cached.
pub struct Shader {
    name: String,
    source: String,
    reflection: ShaderReflection,
    globals: RefCell<Uniforms>,
    gpu: OnceCell<ShaderGpu>,
    pipelines: RefCell<HashMap<PipelineKey, wgpu::RenderPipeline>>,
}

impl Shader {
    /// Parses, validates and reflects `source`.
    pub fn from_wgsl(name: &str, source: String) -> Result<Self, String> {
        let module = naga::front::wgsl::parse_str(&source).map_err(|e| e.emit_to_string(&source))?;
        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| e.emit_to_string(&source))?;
        let reflection = ShaderReflection::from_module(&module)?;

        Ok(Self {
            name: name.to_owned(),
            source,
            reflection,
            globals: RefCell::new(Uniforms::new()),
            gpu: OnceCell::new(),
            pipelines: RefCell::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final WGSL after substitution.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    pub fn uniform_slot(&self, name: &str) -> Option<UniformSlot> {
        self.reflection.uniforms.get(name).copied()
    }

    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        self.reflection.attributes.get(name).copied()
    }

    /// Sets a uniform shared by every renderable drawn with this shader.
    pub fn uniform(&self, name: &str, value: Uniform) {
        self.globals.borrow_mut().insert(name.to_owned(), value);
    }

    /// Packs shader-level uniforms, then `own` on top, into per-block bytes.
    pub(crate) fn write_uniforms(&self, own: &Uniforms, blocks: &mut Vec<Vec<u8>>) {
        blocks.resize_with(self.reflection.blocks.len(), Vec::new);
        for (bytes, block) in blocks.iter_mut().zip(&self.reflection.blocks) {
            bytes.clear();
            bytes.resize(block.size as usize, 0);
        }

        let globals = self.globals.borrow();
        let shared = globals.iter().filter(|(name, _)| !own.contains_key(*name));
        for (name, value) in shared.chain(own.iter()) {
            let Some(slot) = self.reflection.uniforms.get(name) else {
                log::trace!("shader `{}` has no uniform `{name}`", self.name);
                continue;
            };

            let ok = value.write(slot.kind, &mut blocks[slot.block][slot.offset as usize..]);
            debug_assert!(ok, "uniform `{name}`: {} does not fit {:?}", value.type_name(), slot.kind);
            if !ok {
                log::warn!(
                    "shader `{}`: uniform `{name}` got {} for {:?}, skipped",
                    self.name,
                    value.type_name(),
                    slot.kind
                );
            }
        }
    }

    /// Creates the GPU module and layouts once; later calls are no-ops.
    pub(crate) fn bind(&self, device: &wgpu::Device) -> &ShaderGpu {
        self.gpu.get_or_init(|| {
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&self.name),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(&self.source)),
            });

            let mut entries = Vec::new();
            for block in &self.reflection.blocks {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: block.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(block.size as u64),
                    },
                    count: None,
                });
            }
            for &binding in &self.reflection.textures {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                });
            }
            for &binding in &self.reflection.samplers {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                });
            }

            let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pw shader bgl"),
                entries: &entries,
            });

            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pw shader pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

            ShaderGpu { module, bind_group_layout, pipeline_layout }
        })
    }

    /// Returns the pipeline for this target format and vertex layout set.
    ///
    /// `None` when a vertex input the shader reads is not provided by any
    /// layout.
    pub(crate) fn pipeline(
        &self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        layouts: &[VertexLayout],
    ) -> Option<wgpu::RenderPipeline> {
        let buffers: Vec<(u64, Vec<wgpu::VertexAttribute>)> = layouts
            .iter()
            .map(|l| (l.stride() as u64, l.attributes(&self.reflection.attributes)))
            .collect();

        for (name, &location) in &self.reflection.attributes {
            let fed = buffers
                .iter()
                .any(|(_, attrs)| attrs.iter().any(|a| a.shader_location == location));
            if !fed {
                log::error!("shader `{}` reads `{name}` but no vertex layout provides it", self.name);
                return None;
            }
        }

        let key = PipelineKey { format, buffers };
        if let Some(pipeline) = self.pipelines.borrow().get(&key) {
            return Some(pipeline.clone());
        }

        let gpu = self.bind(device);
        let vertex_buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .buffers
            .iter()
            .map(|(stride, attributes)| wgpu::VertexBufferLayout {
                array_stride: *stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&self.name),
            layout: Some(&gpu.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &gpu.module,
                entry_point: Some(&self.reflection.vertex_entry),
                compilation_options: Default::default(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &gpu.module,
                entry_point: Some(&self.reflection.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("shader `{}`: pipeline created for {format:?}", self.name);
        self.pipelines.borrow_mut().insert(key, pipeline.clone());
        Some(pipeline)
    }
}
