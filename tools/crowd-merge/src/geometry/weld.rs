//! Vertex welding

use hashbrown::HashMap;

use crate::document::{Document, Primitive};

/// Weld every primitive of the document. Returns the number of vertices removed.
pub fn weld(doc: &mut Document) -> usize {
    let mut removed = 0;
    for (_, primitive) in doc.primitives.iter_mut() {
        removed += weld_primitive(primitive);
    }
    if removed > 0 {
        tracing::debug!("Weld removed {} vertices", removed);
    }
    removed
}

/// Merge vertices whose attributes are bit-identical, adding an index list
/// to non-indexed primitives. Returns the number of vertices removed.
pub fn weld_primitive(primitive: &mut Primitive) -> usize {
    let vertex_count = primitive.vertex_count();
    if vertex_count == 0 || primitive.attributes.values().any(|a| a.len() != vertex_count) {
        return 0;
    }

    let mut unique: HashMap<Vec<u8>, u32> = HashMap::with_capacity(vertex_count);
    let mut remap = Vec::with_capacity(vertex_count);
    let mut keep = Vec::new();
    let mut key = Vec::new();
    for vertex in 0..vertex_count {
        key.clear();
        for attribute in primitive.attributes.values() {
            attribute.element_bytes(vertex, &mut key);
        }
        let next = keep.len() as u32;
        let index = *unique.entry(key.clone()).or_insert_with(|| {
            keep.push(vertex as u32);
            next
        });
        remap.push(index);
    }

    let indices = primitive.indices_or_sequential();
    if indices.iter().any(|&i| i as usize >= vertex_count) {
        return 0;
    }
    primitive.indices = Some(indices.into_iter().map(|i| remap[i as usize]).collect());

    let removed = vertex_count - keep.len();
    if removed > 0 {
        for attribute in primitive.attributes.values_mut() {
            *attribute = attribute.gather(&keep);
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Attribute, Semantic};

    #[test]
    fn test_weld_merges_identical_vertices() {
        // Two triangles sharing an edge, stored as a triangle soup
        let mut primitive = Primitive::new()
            .with_attribute(
                Semantic::Position,
                Attribute::Vec3(vec![
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [1.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                ]),
            );

        let removed = weld_primitive(&mut primitive);

        assert_eq!(removed, 2);
        assert_eq!(primitive.vertex_count(), 4);
        assert_eq!(primitive.indices.as_deref(), Some(&[0, 1, 2, 1, 3, 2][..]));
    }

    #[test]
    fn test_weld_respects_every_attribute() {
        let mut primitive = Primitive::new()
            .with_attribute(Semantic::Position, Attribute::Vec3(vec![[0.0; 3]; 2]))
            .with_attribute(Semantic::TexCoord(0), Attribute::Vec2(vec![[0.0, 0.0], [1.0, 0.0]]))
            .with_indices(vec![0, 1, 0]);

        assert_eq!(weld_primitive(&mut primitive), 0);
        assert_eq!(primitive.vertex_count(), 2);
    }

    #[test]
    fn test_weld_document() {
        let mut doc = Document::new();
        doc.create_primitive(
            Primitive::new()
                .with_attribute(Semantic::Position, Attribute::Vec3(vec![[0.0; 3]; 3]))
                .with_indices(vec![0, 1, 2]),
        );
        assert_eq!(weld(&mut doc), 2);
    }
}
