//! UV remapping into atlas tiles

use crate::document::{Document, Id, Mesh};

/// Scale `uvs` into tile `tile_index` of an `atlas_width × atlas_width` grid,
/// in place. Coordinates outside `[0, 1)` are not clamped and will sample
/// neighbouring tiles.
pub fn remap_uvs_to_atlas(uvs: &mut [[f32; 2]], tile_index: u32, atlas_width: u32) {
    let width = atlas_width as f32;
    let offset_u = (tile_index % atlas_width) as f32 / width;
    let offset_v = (tile_index / atlas_width) as f32 / width;
    for uv in uvs.iter_mut() {
        uv[0] = uv[0] / width + offset_u;
        uv[1] = uv[1] / width + offset_v;
    }
}

/// Remap TEXCOORD_0 of every primitive of `mesh`, using its list position as
/// the tile index. Primitives are visited last to first. Returns the number
/// of primitives remapped.
pub fn remap_mesh_uvs(doc: &mut Document, mesh: Id<Mesh>, atlas_width: u32) -> usize {
    let primitives = doc.meshes[mesh].primitives.clone();
    let mut remapped = 0;
    for (index, &id) in primitives.iter().enumerate().rev() {
        if let Some(uvs) = doc.primitives[id].tex_coords_mut(0) {
            remap_uvs_to_atlas(uvs, index as u32, atlas_width);
            remapped += 1;
        }
    }
    remapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Attribute, Primitive, Semantic};

    const SAMPLES: [[f32; 2]; 5] = [[0.0, 0.0], [0.5, 0.25], [0.999, 0.0], [0.0, 0.999], [0.75, 0.75]];

    #[test]
    fn test_uvs_confined_to_tile() {
        for atlas_width in 1..=5u32 {
            for tile in 0..atlas_width * atlas_width {
                let mut uvs = SAMPLES.to_vec();
                remap_uvs_to_atlas(&mut uvs, tile, atlas_width);

                let w = atlas_width as f32;
                let min_u = (tile % atlas_width) as f32 / w;
                let min_v = (tile / atlas_width) as f32 / w;
                for [u, v] in uvs {
                    assert!(u >= min_u && u < min_u + 1.0 / w, "u={u} tile={tile} w={w}");
                    assert!(v >= min_v && v < min_v + 1.0 / w, "v={v} tile={tile} w={w}");
                }
            }
        }
    }

    #[test]
    fn test_remap_values() {
        let mut uvs = vec![[0.5, 0.5]];
        remap_uvs_to_atlas(&mut uvs, 3, 2);
        assert_eq!(uvs, vec![[0.75, 0.75]]);
    }

    #[test]
    fn test_out_of_range_is_not_clamped() {
        let mut uvs = vec![[1.5, -0.5]];
        remap_uvs_to_atlas(&mut uvs, 0, 2);
        assert_eq!(uvs, vec![[0.75, -0.25]]);
    }

    #[test]
    fn test_remap_mesh_uses_list_position() {
        let mut doc = Document::new();
        let mesh = doc.create_mesh("body");
        for _ in 0..4 {
            let primitive = doc.create_primitive(
                Primitive::new().with_attribute(Semantic::TexCoord(0), Attribute::Vec2(vec![[0.0, 0.0]])),
            );
            doc.meshes[mesh].primitives.push(primitive);
        }
        let untextured = doc.create_primitive(Primitive::new());
        doc.meshes[mesh].primitives.push(untextured);

        assert_eq!(remap_mesh_uvs(&mut doc, mesh, 3), 4);

        let origins: Vec<_> = doc.meshes[mesh].primitives[..4]
            .iter()
            .map(|&id| match doc.primitives[id].attribute(Semantic::TexCoord(0)) {
                Some(Attribute::Vec2(uvs)) => uvs[0],
                _ => panic!("missing uvs"),
            })
            .collect();
        let third = 1.0 / 3.0;
        assert_eq!(origins, vec![[0.0, 0.0], [third, 0.0], [2.0 * third, 0.0], [0.0, third]]);
    }
}
