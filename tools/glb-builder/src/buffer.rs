//! Low-level buffer packing with automatic alignment and accessor creation

use crate::utils::{align_buffer, compute_bounds};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Buffer view index returned by raw byte packing (images)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewIndex(pub u32);

impl ViewIndex {
    pub fn as_json_index(&self) -> json::Index<json::buffer::View> {
        json::Index::new(self.0)
    }
}

/// Builder for binary buffer with automatic alignment
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// Create a new empty buffer builder
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Get the current accessor count
    pub fn accessor_count(&self) -> u32 {
        self.accessors.len() as u32
    }

    /// Get the binary buffer data
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the buffer views
    pub fn views(&self) -> &[json::buffer::View] {
        &self.views
    }

    /// Get the accessors
    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Append raw bytes as a new buffer view, keeping the buffer 4-byte aligned
    fn push_view(
        &mut self,
        bytes: &[u8],
        target: Option<json::buffer::Target>,
    ) -> json::Index<json::buffer::View> {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        align_buffer(&mut self.buffer);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });

        json::Index::new(self.views.len() as u32 - 1)
    }

    #[allow(clippy::too_many_arguments)]
    fn push_accessor(
        &mut self,
        view: Option<json::Index<json::buffer::View>>,
        count: usize,
        component: json::accessor::ComponentType,
        type_: json::accessor::Type,
        normalized: bool,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
        sparse: Option<json::accessor::sparse::Sparse>,
    ) -> AccessorIndex {
        let (min, max) = match bounds {
            Some((min, max)) => (
                Some(json::Value::Array(
                    min.into_iter().map(json::Value::from).collect(),
                )),
                Some(json::Value::Array(
                    max.into_iter().map(json::Value::from).collect(),
                )),
            ),
            None => (None, None),
        };

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: view,
            byte_offset: view.map(|_| 0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized,
            sparse,
        });

        AccessorIndex(accessor_idx)
    }

    /// Pack Vec3 positions with bounds calculation
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(positions),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            positions.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec3,
            false,
            Some(compute_bounds(positions)),
            None,
        )
    }

    /// Pack Vec2 data (UVs)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(data),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            data.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec2,
            false,
            None,
            None,
        )
    }

    /// Pack Vec3 data (normals, etc.)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(data),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            data.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec3,
            false,
            None,
            None,
        )
    }

    /// Pack Vec4 data (colors, tangents, weights, etc.)
    pub fn pack_vec4(&mut self, data: &[[f32; 4]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(data),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            data.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec4,
            false,
            None,
            None,
        )
    }

    /// Pack joint indices (Vec4<u8>)
    pub fn pack_joints(&mut self, joints: &[[u8; 4]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(joints),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            joints.len(),
            json::accessor::ComponentType::U8,
            json::accessor::Type::Vec4,
            false,
            None,
            None,
        )
    }

    /// Pack joint indices (Vec4<u16>), for skeletons with more than 256 joints
    pub fn pack_joints_u16(&mut self, joints: &[[u16; 4]]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(joints),
            Some(json::buffer::Target::ArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            joints.len(),
            json::accessor::ComponentType::U16,
            json::accessor::Type::Vec4,
            false,
            None,
            None,
        )
    }

    /// Pack u16 indices
    pub fn pack_indices_u16(&mut self, indices: &[u16]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(indices),
            Some(json::buffer::Target::ElementArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            indices.len(),
            json::accessor::ComponentType::U16,
            json::accessor::Type::Scalar,
            false,
            None,
            None,
        )
    }

    /// Pack u32 indices
    pub fn pack_indices_u32(&mut self, indices: &[u32]) -> AccessorIndex {
        let view = self.push_view(
            bytemuck::cast_slice(indices),
            Some(json::buffer::Target::ElementArrayBuffer),
        );
        self.push_accessor(
            Some(view),
            indices.len(),
            json::accessor::ComponentType::U32,
            json::accessor::Type::Scalar,
            false,
            None,
            None,
        )
    }

    /// Pack indices with the narrowest component type that fits
    pub fn pack_indices(&mut self, indices: &[u32]) -> AccessorIndex {
        if indices.iter().all(|&i| i <= u16::MAX as u32) {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            self.pack_indices_u16(&narrow)
        } else {
            self.pack_indices_u32(indices)
        }
    }

    /// Pack Mat4 data (inverse bind matrices)
    pub fn pack_mat4(&mut self, matrices: &[[f32; 16]]) -> AccessorIndex {
        let view = self.push_view(bytemuck::cast_slice(matrices), None);
        self.push_accessor(
            Some(view),
            matrices.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Mat4,
            false,
            None,
            None,
        )
    }

    /// Pack encoded image bytes (PNG/JPEG) as a plain buffer view
    pub fn pack_image(&mut self, bytes: &[u8]) -> ViewIndex {
        let view = self.push_view(bytes, None);
        ViewIndex(view.value() as u32)
    }

    /// Pack float vector data as a sparse accessor.
    ///
    /// `components` is the element width (2, 3 or 4). Only elements with at
    /// least one non-zero component are stored; all others read back as zero.
    /// Returns `None` when the data does not match the element width.
    pub fn pack_sparse_f32(&mut self, data: &[f32], components: usize) -> Option<AccessorIndex> {
        let type_ = match components {
            2 => json::accessor::Type::Vec2,
            3 => json::accessor::Type::Vec3,
            4 => json::accessor::Type::Vec4,
            _ => return None,
        };
        if data.len() % components != 0 {
            return None;
        }
        let count = data.len() / components;

        let mut indices: Vec<u32> = Vec::new();
        let mut values: Vec<f32> = Vec::new();
        for (i, element) in data.chunks_exact(components).enumerate() {
            if element.iter().any(|&c| c != 0.0) {
                indices.push(i as u32);
                values.extend_from_slice(element);
            }
        }

        let sparse_count = indices.len();
        let sparse = if sparse_count == 0 {
            None
        } else {
            let indices_view = self.push_view(bytemuck::cast_slice(&indices), None);
            let values_view = self.push_view(bytemuck::cast_slice(&values), None);
            Some(json::accessor::sparse::Sparse {
                count: sparse_count.into(),
                indices: json::accessor::sparse::Indices {
                    buffer_view: indices_view,
                    byte_offset: 0u64.into(),
                    component_type: Valid(json::accessor::IndexComponentType(
                        json::accessor::ComponentType::U32,
                    )),
                    extensions: Default::default(),
                    extras: Default::default(),
                },
                values: json::accessor::sparse::Values {
                    buffer_view: values_view,
                    byte_offset: 0u64.into(),
                    extensions: Default::default(),
                    extras: Default::default(),
                },
                extensions: Default::default(),
                extras: Default::default(),
            })
        };

        Some(self.push_accessor(
            None,
            count,
            json::accessor::ComponentType::F32,
            type_,
            false,
            None,
            sparse,
        ))
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}
