//! Skin construction

use crate::buffer::BufferBuilder;
use gltf_json as json;

/// Column-major identity matrix
pub const IDENTITY_MAT4: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
];

/// Builder for a skin: joint node indices, optional skeleton root and
/// inverse bind matrices
///
/// Joints are node indices in the target document, so nodes must be added
/// to the [`crate::GltfBuilder`] first.
#[derive(Debug, Clone, Default)]
pub struct SkinBuilder {
    name: Option<String>,
    skeleton: Option<u32>,
    joints: Vec<u32>,
    inverse_bind_matrices: Vec<[f32; 16]>,
}

impl SkinBuilder {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn skeleton(mut self, root: Option<u32>) -> Self {
        self.skeleton = root;
        self
    }

    /// Append one joint with its inverse bind matrix
    pub fn joint(mut self, node: u32, inverse_bind_matrix: [f32; 16]) -> Self {
        self.joints.push(node);
        self.inverse_bind_matrices.push(inverse_bind_matrix);
        self
    }

    /// Replace the joint list; bind matrices are set separately
    pub fn joints(mut self, nodes: &[u32]) -> Self {
        self.joints = nodes.to_vec();
        self
    }

    pub fn inverse_bind_matrices(mut self, matrices: &[[f32; 16]]) -> Self {
        self.inverse_bind_matrices = matrices.to_vec();
        self
    }

    /// Pack the bind matrices (when any) and produce the skin. Missing
    /// matrices are padded with identity so the accessor covers every joint.
    pub fn build(mut self, buffer: &mut BufferBuilder) -> json::Skin {
        let inverse_bind_matrices = if self.inverse_bind_matrices.is_empty() {
            None
        } else {
            if self.inverse_bind_matrices.len() < self.joints.len() {
                self.inverse_bind_matrices.resize(self.joints.len(), IDENTITY_MAT4);
            }
            Some(buffer.pack_mat4(&self.inverse_bind_matrices).as_json_index())
        };

        json::Skin {
            extensions: Default::default(),
            extras: Default::default(),
            inverse_bind_matrices,
            joints: self.joints.into_iter().map(json::Index::new).collect(),
            name: self.name,
            skeleton: self.skeleton.map(json::Index::new),
        }
    }
}
