use std::collections::HashMap;

/// A named uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum Uniform {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Flat list of xyz triples.
    Vec3Array(Vec<f32>),
    /// Column-major 3x3 matrix.
    Mat3([f32; 9]),
    /// Texture unit index; kept for parity with texture-unit based callers.
    Sampler(i32),
}

pub type Uniforms = HashMap<String, Uniform>;

/// Shape of a uniform as declared by the shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Vec3Array { len: u32, stride: u32 },
}

impl UniformKind {
    /// Bytes occupied inside the uniform block.
    pub fn byte_size(self) -> u32 {
        match self {
            UniformKind::Float | UniformKind::Int | UniformKind::UInt => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat3 => 48,
            UniformKind::Vec3Array { len, stride } => len * stride,
        }
    }
}

/// Where a named uniform lives: block index and byte offset inside it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub block: usize,
    pub offset: u32,
    pub kind: UniformKind,
}

impl Uniform {
    pub fn type_name(&self) -> &'static str {
        match self {
            Uniform::Float(_) => "float",
            Uniform::Int(_) => "int",
            Uniform::Bool(_) => "bool",
            Uniform::Vec2(_) => "vec2",
            Uniform::Vec3(_) => "vec3",
            Uniform::Vec4(_) => "vec4",
            Uniform::Vec3Array(_) => "vec3[]",
            Uniform::Mat3(_) => "mat3",
            Uniform::Sampler(_) => "sampler",
        }
    }

    /// Writes the value into `dst` (a block slice starting at the slot
    /// offset) using the std140-like layout WGSL uses for uniforms.
    ///
    /// Returns `false` when the value does not fit the declared kind.
    pub fn write(&self, kind: UniformKind, dst: &mut [u8]) -> bool {
        if dst.len() < kind.byte_size() as usize {
            return false;
        }

        match (self, kind) {
            (Uniform::Float(v), UniformKind::Float) => put(dst, 0, &[*v]),
            (Uniform::Int(v) | Uniform::Sampler(v), UniformKind::Int) => put(dst, 0, &[*v]),
            (Uniform::Sampler(v), UniformKind::UInt) if *v >= 0 => put(dst, 0, &[*v as u32]),
            (Uniform::Bool(v), UniformKind::UInt) => put(dst, 0, &[*v as u32]),
            (Uniform::Bool(v), UniformKind::Int) => put(dst, 0, &[*v as i32]),
            (Uniform::Vec2(v), UniformKind::Vec2) => put(dst, 0, v),
            (Uniform::Vec3(v), UniformKind::Vec3) => put(dst, 0, v),
            (Uniform::Vec4(v), UniformKind::Vec4) => put(dst, 0, v),
            (Uniform::Mat3(m), UniformKind::Mat3) => {
                // Each column is padded to 16 bytes.
                for (c, col) in m.chunks_exact(3).enumerate() {
                    put(dst, c * 16, col);
                }
            }
            (Uniform::Vec3Array(data), UniformKind::Vec3Array { len, stride }) => {
                for (i, v) in data.chunks_exact(3).take(len as usize).enumerate() {
                    put(dst, i * stride as usize, v);
                }
            }
            _ => return false,
        }
        true
    }
}

fn put<T: bytemuck::Pod>(dst: &mut [u8], at: usize, values: &[T]) {
    let bytes: &[u8] = bytemuck::cast_slice(values);
    dst[at..at + bytes.len()].copy_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(bytes: &[u8]) -> Vec<f32> {
        bytes.chunks_exact(4).map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect()
    }

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn mat3_columns_are_padded() {
        let mut dst = [0u8; 48];
        let m = Uniform::Mat3([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert!(m.write(UniformKind::Mat3, &mut dst));
        assert_eq!(
            floats(&dst),
            vec![1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0, 7.0, 8.0, 9.0, 0.0]
        );
    }

    #[test]
    fn vec3_array_uses_declared_stride() {
        let mut dst = [0u8; 32];
        let v = Uniform::Vec3Array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(v.write(UniformKind::Vec3Array { len: 2, stride: 16 }, &mut dst));
        assert_eq!(floats(&dst), vec![1.0, 2.0, 3.0, 0.0, 4.0, 5.0, 6.0, 0.0]);
    }

    #[test]
    fn vec3_array_truncates_to_declared_len() {
        let mut dst = [0u8; 16];
        let v = Uniform::Vec3Array(vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        assert!(v.write(UniformKind::Vec3Array { len: 1, stride: 16 }, &mut dst));
        assert_eq!(floats(&dst), vec![1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn bool_packs_as_u32() {
        let mut dst = [0u8; 4];
        assert!(Uniform::Bool(true).write(UniformKind::UInt, &mut dst));
        assert_eq!(u32::from_ne_bytes(dst), 1);
    }

    // ── mismatch ──────────────────────────────────────────────────────────

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut dst = [0u8; 16];
        assert!(!Uniform::Float(1.0).write(UniformKind::Vec4, &mut dst));
        assert!(!Uniform::Vec2([1.0, 2.0]).write(UniformKind::Vec3, &mut dst));
        assert_eq!(dst, [0u8; 16]);
    }

    #[test]
    fn short_destination_is_rejected() {
        let mut dst = [0u8; 8];
        assert!(!Uniform::Vec4([0.0; 4]).write(UniformKind::Vec4, &mut dst));
    }

    #[test]
    fn type_names_are_stable() {
        assert_eq!(Uniform::Mat3([0.0; 9]).type_name(), "mat3");
        assert_eq!(Uniform::Sampler(0).type_name(), "sampler");
    }
}
