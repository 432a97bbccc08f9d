//! High-level mesh construction

use crate::buffer::{AccessorIndex, BufferBuilder};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

/// Accessor indices for one mesh primitive
#[derive(Debug, Clone)]
pub struct MeshAccessors {
    pub positions: AccessorIndex,
    pub normals: Option<AccessorIndex>,
    pub uvs: Option<AccessorIndex>,
    pub colors: Option<AccessorIndex>,
    pub joints: Option<AccessorIndex>,
    pub weights: Option<AccessorIndex>,
    pub indices: Option<AccessorIndex>,
}

impl MeshAccessors {
    /// Build a triangle-list primitive referencing these accessors
    pub fn primitive(&self, material: Option<u32>) -> json::mesh::Primitive {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            Valid(json::mesh::Semantic::Positions),
            self.positions.as_json_index(),
        );

        let optional = [
            (json::mesh::Semantic::Normals, self.normals),
            (json::mesh::Semantic::TexCoords(0), self.uvs),
            (json::mesh::Semantic::Colors(0), self.colors),
            (json::mesh::Semantic::Joints(0), self.joints),
            (json::mesh::Semantic::Weights(0), self.weights),
        ];
        for (semantic, accessor) in optional {
            if let Some(accessor) = accessor {
                attributes.insert(Valid(semantic), accessor.as_json_index());
            }
        }

        json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: self.indices.map(|i| i.as_json_index()),
            material: material.map(json::Index::new),
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }
    }
}

/// Builder for mesh data
pub struct MeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    uvs: Option<Vec<[f32; 2]>>,
    colors: Option<Vec<[f32; 4]>>,
    joints: Option<Vec<[u8; 4]>>,
    weights: Option<Vec<[f32; 4]>>,
    indices: Option<Vec<u32>>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: None,
            uvs: None,
            colors: None,
            joints: None,
            weights: None,
            indices: None,
        }
    }

    /// Set positions (required)
    pub fn positions(mut self, positions: &[[f32; 3]]) -> Self {
        self.positions = positions.to_vec();
        self
    }

    /// Set normals (optional)
    pub fn normals(mut self, normals: &[[f32; 3]]) -> Self {
        self.normals = Some(normals.to_vec());
        self
    }

    /// Set UVs (optional)
    pub fn uvs(mut self, uvs: &[[f32; 2]]) -> Self {
        self.uvs = Some(uvs.to_vec());
        self
    }

    /// Set vertex colors (optional)
    pub fn colors(mut self, colors: &[[f32; 4]]) -> Self {
        self.colors = Some(colors.to_vec());
        self
    }

    /// Set joint indices (optional, for skinned meshes)
    pub fn joints(mut self, joints: &[[u8; 4]]) -> Self {
        self.joints = Some(joints.to_vec());
        self
    }

    /// Set joint weights (optional, for skinned meshes)
    pub fn weights(mut self, weights: &[[f32; 4]]) -> Self {
        self.weights = Some(weights.to_vec());
        self
    }

    /// Set indices (optional)
    pub fn indices(mut self, indices: &[u32]) -> Self {
        self.indices = Some(indices.to_vec());
        self
    }

    /// Build and pack into buffer
    pub fn build(self, buffer: &mut BufferBuilder) -> MeshAccessors {
        let positions = buffer.pack_positions(&self.positions);
        let normals = self.normals.as_ref().map(|n| buffer.pack_vec3(n));
        let uvs = self.uvs.as_ref().map(|uv| buffer.pack_vec2(uv));
        let colors = self.colors.as_ref().map(|c| buffer.pack_vec4(c));
        let joints = self.joints.as_ref().map(|j| buffer.pack_joints(j));
        let weights = self.weights.as_ref().map(|w| buffer.pack_vec4(w));
        let indices = self.indices.as_ref().map(|i| buffer.pack_indices(i));

        MeshAccessors {
            positions,
            normals,
            uvs,
            colors,
            joints,
            weights,
            indices,
        }
    }
}

impl Default for MeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}
