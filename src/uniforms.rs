//! Named shader parameters carried by a particle material.
//!
//! Values keep their insertion order so the packed byte layout is stable
//! between frames. Textures are opaque handles; they are bound separately
//! and take no space in the packed block.

use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Opaque handle to a texture owned by an external asset system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Supported uniform value types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    U32(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// Sampled texture; `None` leaves the slot unbound.
    Texture(Option<TextureHandle>),
}

impl UniformValue {
    /// Required alignment inside the packed block.
    fn align(&self) -> usize {
        match self {
            UniformValue::Vec4(_) | UniformValue::Vec3(_) => 16,
            UniformValue::Vec2(_) => 8,
            _ => 4,
        }
    }

    /// Append this value's bytes. Textures write nothing.
    fn write_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            UniformValue::F32(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::U32(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            // No trailing padding: a following scalar may use the last 4 bytes
            UniformValue::Vec3(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec4(v) => buf.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Texture(_) => {}
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<u32> for UniformValue {
    fn from(v: u32) -> Self {
        UniformValue::U32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<TextureHandle> for UniformValue {
    fn from(v: TextureHandle) -> Self {
        UniformValue::Texture(Some(v))
    }
}

impl From<Option<TextureHandle>> for UniformValue {
    fn from(v: Option<TextureHandle>) -> Self {
        UniformValue::Texture(v)
    }
}

/// Ordered collection of named uniform values.
#[derive(Clone, Debug, Default)]
pub struct MaterialUniforms {
    values: Vec<(String, UniformValue)>,
    indices: HashMap<String, usize>,
}

impl MaterialUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a uniform value.
    pub fn set<V: Into<UniformValue>>(&mut self, name: &str, value: V) {
        let value = value.into();
        if let Some(&idx) = self.indices.get(name) {
            self.values[idx].1 = value;
        } else {
            let idx = self.values.len();
            self.values.push((name.to_string(), value));
            self.indices.insert(name.to_string(), idx);
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.indices.get(name).map(|&idx| &self.values[idx].1)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Texture bindings in declaration order.
    pub fn textures(&self) -> impl Iterator<Item = (&str, Option<TextureHandle>)> {
        self.values.iter().filter_map(|(n, v)| match v {
            UniformValue::Texture(t) => Some((n.as_str(), *t)),
            _ => None,
        })
    }

    /// Pack numeric values for upload, padded to a 16-byte multiple.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (_, value) in &self.values {
            if matches!(value, UniformValue::Texture(_)) {
                continue;
            }
            let align = value.align();
            while buf.len() % align != 0 {
                buf.push(0);
            }
            value.write_bytes(&mut buf);
        }
        while buf.len() % 16 != 0 {
            buf.push(0);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_updates_in_place() {
        let mut u = MaterialUniforms::new();
        u.set("uTime", 0.0f32);
        u.set("uSize", 0.5f32);
        u.set("uTime", 3.0f32);

        assert_eq!(u.len(), 2);
        assert_eq!(u.get("uTime"), Some(&UniformValue::F32(3.0)));
        let names: Vec<&str> = u.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["uTime", "uSize"]);
    }

    #[test]
    fn test_packing_alignment() {
        let mut u = MaterialUniforms::new();
        u.set("uTime", 1.0f32);
        u.set("uMap", TextureHandle(9));
        u.set("uResolution", Vec2::new(800.0, 600.0));
        u.set("uTint", Vec3::ONE);

        let bytes = u.to_bytes();
        // f32 at 0, pad to 8, vec2 at 8..16, vec3 at 16..28, pad to 32
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[8..12], &800.0f32.to_ne_bytes());
        assert_eq!(&bytes[16..20], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn test_textures_listed() {
        let mut u = MaterialUniforms::new();
        u.set("uMap", TextureHandle(1));
        u.set("uSize", 1.0f32);
        u.set("uTwinkleOverLife", None::<TextureHandle>);

        let textures: Vec<_> = u.textures().collect();
        assert_eq!(
            textures,
            vec![("uMap", Some(TextureHandle(1))), ("uTwinkleOverLife", None)]
        );
    }
}
