//! Mesh primitives and vertex attributes

use std::collections::BTreeMap;

use super::{Id, Material};

/// Vertex attribute semantic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
}

impl Semantic {
    pub fn from_gltf(semantic: &gltf::Semantic) -> Option<Self> {
        Some(match semantic {
            gltf::Semantic::Positions => Semantic::Position,
            gltf::Semantic::Normals => Semantic::Normal,
            gltf::Semantic::Tangents => Semantic::Tangent,
            gltf::Semantic::TexCoords(set) => Semantic::TexCoord(*set),
            gltf::Semantic::Colors(set) => Semantic::Color(*set),
            gltf::Semantic::Joints(set) => Semantic::Joints(*set),
            gltf::Semantic::Weights(set) => Semantic::Weights(*set),
            #[allow(unreachable_patterns)]
            _ => return None,
        })
    }

    pub fn to_json(self) -> gltf_json::mesh::Semantic {
        use gltf_json::mesh::Semantic as Json;
        match self {
            Semantic::Position => Json::Positions,
            Semantic::Normal => Json::Normals,
            Semantic::Tangent => Json::Tangents,
            Semantic::TexCoord(set) => Json::TexCoords(set),
            Semantic::Color(set) => Json::Colors(set),
            Semantic::Joints(set) => Json::Joints(set),
            Semantic::Weights(set) => Json::Weights(set),
        }
    }
}

/// Attribute data, one element per vertex
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Vec2(Vec<[f32; 2]>),
    Vec3(Vec<[f32; 3]>),
    Vec4(Vec<[f32; 4]>),
    Joints(Vec<[u16; 4]>),
}

impl Attribute {
    /// Element count
    pub fn len(&self) -> usize {
        match self {
            Attribute::Vec2(v) => v.len(),
            Attribute::Vec3(v) => v.len(),
            Attribute::Vec4(v) => v.len(),
            Attribute::Joints(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte size of one element as stored in a GLB
    pub fn element_size(&self) -> usize {
        match self {
            Attribute::Vec2(_) => 8,
            Attribute::Vec3(_) => 12,
            Attribute::Vec4(_) => 16,
            Attribute::Joints(_) => 8,
        }
    }

    /// Raw bytes of element `index` (used as a weld key)
    pub fn element_bytes(&self, index: usize, out: &mut Vec<u8>) {
        match self {
            Attribute::Vec2(v) => out.extend_from_slice(bytemuck::bytes_of(&v[index])),
            Attribute::Vec3(v) => out.extend_from_slice(bytemuck::bytes_of(&v[index])),
            Attribute::Vec4(v) => out.extend_from_slice(bytemuck::bytes_of(&v[index])),
            Attribute::Joints(v) => out.extend_from_slice(bytemuck::bytes_of(&v[index])),
        }
    }

    /// Build a new attribute of the same kind from element indices
    pub fn gather(&self, indices: &[u32]) -> Attribute {
        fn pick<T: Copy>(src: &[T], indices: &[u32]) -> Vec<T> {
            indices.iter().map(|&i| src[i as usize]).collect()
        }
        match self {
            Attribute::Vec2(v) => Attribute::Vec2(pick(v, indices)),
            Attribute::Vec3(v) => Attribute::Vec3(pick(v, indices)),
            Attribute::Vec4(v) => Attribute::Vec4(pick(v, indices)),
            Attribute::Joints(v) => Attribute::Joints(pick(v, indices)),
        }
    }

    /// Append the elements of `other`; returns false if the kinds differ
    pub fn extend_from(&mut self, other: &Attribute) -> bool {
        match (self, other) {
            (Attribute::Vec2(a), Attribute::Vec2(b)) => a.extend_from_slice(b),
            (Attribute::Vec3(a), Attribute::Vec3(b)) => a.extend_from_slice(b),
            (Attribute::Vec4(a), Attribute::Vec4(b)) => a.extend_from_slice(b),
            (Attribute::Joints(a), Attribute::Joints(b)) => a.extend_from_slice(b),
            _ => return false,
        }
        true
    }

    pub fn same_kind(&self, other: &Attribute) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Mode {
    pub fn from_gltf(mode: gltf::mesh::Mode) -> Self {
        match mode {
            gltf::mesh::Mode::Points => Mode::Points,
            gltf::mesh::Mode::Lines => Mode::Lines,
            gltf::mesh::Mode::LineLoop => Mode::LineLoop,
            gltf::mesh::Mode::LineStrip => Mode::LineStrip,
            gltf::mesh::Mode::Triangles => Mode::Triangles,
            gltf::mesh::Mode::TriangleStrip => Mode::TriangleStrip,
            gltf::mesh::Mode::TriangleFan => Mode::TriangleFan,
        }
    }

    pub fn to_json(self) -> gltf_json::mesh::Mode {
        use gltf_json::mesh::Mode as Json;
        match self {
            Mode::Points => Json::Points,
            Mode::Lines => Json::Lines,
            Mode::LineLoop => Json::LineLoop,
            Mode::LineStrip => Json::LineStrip,
            Mode::Triangles => Json::Triangles,
            Mode::TriangleStrip => Json::TriangleStrip,
            Mode::TriangleFan => Json::TriangleFan,
        }
    }
}

/// Geometry with its attribute buffers and material bindings
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub attributes: BTreeMap<Semantic, Attribute>,
    pub indices: Option<Vec<u32>>,
    pub mode: Mode,
    /// Live material
    pub material: Option<Id<Material>>,
    /// Material before consolidation, kept for atlas texture lookup
    pub original_material: Option<Id<Material>>,
}

impl Primitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, semantic: Semantic, attribute: Attribute) -> Self {
        self.attributes.insert(semantic, attribute);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_material(mut self, material: Id<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn attribute(&self, semantic: Semantic) -> Option<&Attribute> {
        self.attributes.get(&semantic)
    }

    pub fn attribute_mut(&mut self, semantic: Semantic) -> Option<&mut Attribute> {
        self.attributes.get_mut(&semantic)
    }

    /// UV set `set` as mutable 2-component floats
    pub fn tex_coords_mut(&mut self, set: u32) -> Option<&mut Vec<[f32; 2]>> {
        match self.attributes.get_mut(&Semantic::TexCoord(set)) {
            Some(Attribute::Vec2(uvs)) => Some(uvs),
            _ => None,
        }
    }

    pub fn positions(&self) -> Option<&[[f32; 3]]> {
        match self.attributes.get(&Semantic::Position) {
            Some(Attribute::Vec3(positions)) => Some(positions),
            _ => None,
        }
    }

    /// Vertex count (length of POSITION, else of any attribute)
    pub fn vertex_count(&self) -> usize {
        self.attribute(Semantic::Position)
            .or_else(|| self.attributes.values().next())
            .map(Attribute::len)
            .unwrap_or(0)
    }

    /// Indices, or the implicit `0..vertex_count` sequence
    pub fn indices_or_sequential(&self) -> Vec<u32> {
        match &self.indices {
            Some(indices) => indices.clone(),
            None => (0..self.vertex_count() as u32).collect(),
        }
    }

    /// Bytes this primitive occupies in a GLB buffer
    pub fn byte_size(&self) -> usize {
        let attributes: usize = self
            .attributes
            .values()
            .map(|a| a.len() * a.element_size())
            .sum();
        let index_size = if self.vertex_count() > u16::MAX as usize + 1 {
            4
        } else {
            2
        };
        attributes + self.indices.as_ref().map_or(0, |i| i.len() * index_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_and_extend() {
        let mut a = Attribute::Vec2(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        let picked = a.gather(&[2, 0]);
        assert_eq!(picked, Attribute::Vec2(vec![[2.0, 2.0], [0.0, 0.0]]));

        assert!(a.extend_from(&picked));
        assert_eq!(a.len(), 5);
        assert!(!a.extend_from(&Attribute::Vec3(vec![[0.0; 3]])));
    }

    #[test]
    fn test_vertex_count_and_sequential_indices() {
        let primitive = Primitive::new().with_attribute(
            Semantic::Position,
            Attribute::Vec3(vec![[0.0; 3], [1.0; 3], [2.0; 3]]),
        );
        assert_eq!(primitive.vertex_count(), 3);
        assert_eq!(primitive.indices_or_sequential(), vec![0, 1, 2]);
    }

    #[test]
    fn test_tex_coords_mut_requires_vec2() {
        let mut primitive = Primitive::new()
            .with_attribute(Semantic::TexCoord(0), Attribute::Vec2(vec![[0.5, 0.5]]))
            .with_attribute(Semantic::TexCoord(1), Attribute::Vec3(vec![[0.5; 3]]));
        assert!(primitive.tex_coords_mut(0).is_some());
        assert!(primitive.tex_coords_mut(1).is_none());
        assert!(primitive.tex_coords_mut(2).is_none());
    }
}
