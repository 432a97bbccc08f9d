//! GLB/GLTF generation utilities
//!
//! This library provides builder APIs for constructing GLB files:
//! - BufferBuilder: Pack binary data with automatic alignment (incl. sparse accessors and images)
//! - MeshBuilder: High-level primitive construction
//! - MaterialBuilder: Metallic-roughness materials with texture channels
//! - SkinBuilder: Joints, skeleton root and inverse bind matrices
//! - GltfBuilder: Top-level GLTF document construction
//!
//! # Example
//!
//! ```no_run
//! use glb_builder::*;
//!
//! let mut buffer = BufferBuilder::new();
//! let mesh = MeshBuilder::new()
//!     .positions(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0]])
//!     .normals(&[[0.0, 0.0, 1.0]; 3])
//!     .indices(&[0, 1, 2])
//!     .build(&mut buffer);
//!
//! let mut gltf = GltfBuilder::new();
//! gltf.buffer_byte_length(buffer.data().len() as u64);
//! gltf.add_mesh(Some("Triangle"), vec![mesh.primitive(None)]);
//!
//! let root = gltf.build(buffer.views(), buffer.accessors(), "glb-builder");
//! let glb_bytes = assemble_glb(&root, buffer.data()).unwrap();
//! ```

pub mod buffer;
pub mod document;
pub mod material;
pub mod mesh;
pub mod skin;
pub mod utils;

pub use buffer::{AccessorIndex, BufferBuilder, ViewIndex};
pub use document::{empty_node, GltfBuilder};
pub use material::MaterialBuilder;
pub use mesh::{MeshAccessors, MeshBuilder};
pub use skin::{SkinBuilder, IDENTITY_MAT4};
pub use utils::{align_buffer, assemble_glb, compute_bounds};

// Re-export commonly used gltf-json types
pub use gltf_json as json;
pub use gltf_json::validation::Checked::Valid;
