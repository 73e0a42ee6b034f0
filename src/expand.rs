//! Geometry expansion for the offset rasterizer.
//!
//! Every input triangle becomes nine vertex records: six forming a
//! screen-space quad that bounds everything the triangle's offset
//! primitives can touch, and three forming the triangle displaced along
//! its face normal. All nine records carry the triangle's raw vertex
//! positions; the vertex stage in `shaders/offset_raster.wgsl` selects the
//! actual geometry from the role index.

use bytemuck::{Pod, Zeroable};

/// Number of expanded records emitted per input triangle.
pub const RECORDS_PER_TRIANGLE: usize = 9;

/// One expanded vertex record.
///
/// Roles 0-5 select a bounding-quad corner, roles 6-8 a displaced triangle
/// vertex. Records are uploaded verbatim as the rasterizer's vertex buffer.
///
/// # Memory Layout
///
/// Total size: 40 bytes (3 x vec3 + u32), matching the vertex buffer
/// stride declared by the pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct RasterVertex {
    /// First triangle vertex position.
    pub a: [f32; 3],
    /// Second triangle vertex position.
    pub b: [f32; 3],
    /// Third triangle vertex position.
    pub c: [f32; 3],
    /// Role index, cycling 0..=8 within each triangle's run.
    pub role: u32,
}

/// Expand a triangle soup into rasterizer vertex records.
///
/// `vertices` is a flat `x y z` sequence with nine floats per triangle.
/// The length contract is validated at the public entry point; a trailing
/// partial triangle is silently dropped here.
///
/// # Example
///
/// ```
/// use mesh_heightfield::expand::{expand_triangles, RECORDS_PER_TRIANGLE};
///
/// let soup = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let records = expand_triangles(&soup);
/// assert_eq!(records.len(), RECORDS_PER_TRIANGLE);
/// ```
#[must_use]
pub fn expand_triangles(vertices: &[f32]) -> Vec<RasterVertex> {
    let triangle_count = vertices.len() / 9;
    let mut records = Vec::with_capacity(triangle_count * RECORDS_PER_TRIANGLE);

    for tri in vertices.chunks_exact(9) {
        let a = [tri[0], tri[1], tri[2]];
        let b = [tri[3], tri[4], tri[5]];
        let c = [tri[6], tri[7], tri[8]];

        #[allow(clippy::cast_possible_truncation)]
        // Truncation: RECORDS_PER_TRIANGLE is 9
        for role in 0..RECORDS_PER_TRIANGLE as u32 {
            records.push(RasterVertex { a, b, c, role });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_vertex_layout() {
        assert_eq!(std::mem::size_of::<RasterVertex>(), 40);
    }

    #[test]
    fn test_expand_empty() {
        assert!(expand_triangles(&[]).is_empty());
    }

    #[test]
    fn test_expand_record_count() {
        let soup = vec![0.0; 9 * 7];
        let records = expand_triangles(&soup);
        assert_eq!(records.len(), 7 * RECORDS_PER_TRIANGLE);
    }

    #[test]
    fn test_expand_role_cycle() {
        let soup = vec![0.0; 9 * 3];
        let records = expand_triangles(&soup);

        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.role, (i % RECORDS_PER_TRIANGLE) as u32);
        }
    }

    #[test]
    fn test_expand_broadcasts_positions() {
        let soup = [
            1.0, 2.0, 3.0, //
            4.0, 5.0, 6.0, //
            7.0, 8.0, 9.0, //
        ];
        let records = expand_triangles(&soup);

        for record in &records {
            assert_eq!(record.a, [1.0, 2.0, 3.0]);
            assert_eq!(record.b, [4.0, 5.0, 6.0]);
            assert_eq!(record.c, [7.0, 8.0, 9.0]);
        }
    }

    #[test]
    fn test_expand_drops_partial_triangle() {
        // 9 floats for one triangle plus 5 stray floats.
        let soup = vec![0.0; 14];
        let records = expand_triangles(&soup);
        assert_eq!(records.len(), RECORDS_PER_TRIANGLE);
    }
}
