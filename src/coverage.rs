//! Analytic coverage evaluation for the offset rasterizer.
//!
//! This is the CPU counterpart of the fragment stage in
//! `shaders/offset_raster.wgsl`. For a pixel of the bounding quad, the
//! offset surface height is the highest intersection of the orthographic
//! viewer ray (pointing `+z`) with three vertex spheres and three edge
//! cylinders of radius `offset`, all in device space. Keeping the
//! evaluation as pure functions makes the algorithm testable without a
//! GPU and serves as the reference oracle for the shader.

use nalgebra::Point3;

/// Squared-length threshold below which edges and triangle normals are
/// treated as degenerate.
const DEGENERATE_EPS: f32 = 1e-12;

/// Whether an edge's endpoints coincide in the view plane.
///
/// A degenerate edge contributes no cylinder; its endpoints are still
/// covered by the vertex sphere tests.
#[must_use]
pub fn degenerate_edge(a: Point3<f32>, b: Point3<f32>) -> bool {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy < DEGENERATE_EPS
}

/// Whether a triangle has no usable face normal.
///
/// A degenerate triangle contributes no displaced plane; its vertices and
/// edges are still covered by the sphere and cylinder tests.
#[must_use]
pub fn degenerate_triangle(tri: &[Point3<f32>; 3]) -> bool {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    n.norm_squared() < DEGENERATE_EPS
}

/// Height of the viewer ray at `(px, py)` on the sphere of radius
/// `offset` centered at `p`.
///
/// Returns `None` when the pixel lies outside the sphere's silhouette;
/// otherwise the point on the sphere nearest the viewer.
#[must_use]
pub fn sphere_height(px: f32, py: f32, p: Point3<f32>, offset: f32) -> Option<f32> {
    let dx = px - p.x;
    let dy = py - p.y;
    let rr = offset * offset - dx * dx - dy * dy;
    if rr < 0.0 {
        return None;
    }
    Some(p.z + rr.sqrt())
}

/// Height of the viewer ray at `(px, py)` on the infinite cylinder of
/// radius `offset` around the edge `(a, b)`, restricted to the segment.
///
/// Returns `None` when the edge is degenerate, the ray misses the
/// cylinder, or the intersection's projection onto the edge axis falls
/// outside `[0, |b - a|]`. The spherical end caps are handled separately
/// by the per-vertex sphere tests.
#[must_use]
pub fn capsule_height(px: f32, py: f32, a: Point3<f32>, b: Point3<f32>, offset: f32) -> Option<f32> {
    if degenerate_edge(a, b) {
        return None;
    }

    let d = b - a;
    let len = d.norm();
    let u = d / len;

    let mx = px - a.x;
    let my = py - a.y;
    let c0 = mx * u.x + my * u.y;

    // qa is the squared view-plane length of the unit axis; a
    // view-aligned edge has no cylinder silhouette.
    let qa = 1.0 - u.z * u.z;
    if qa < DEGENERATE_EPS {
        return None;
    }

    let qb = -2.0 * c0 * u.z;
    let qc = mx * mx + my * my - c0 * c0 - offset * offset;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return None;
    }

    // Larger root of the quadratic in z: the hit nearest the viewer.
    let w = (-qb + disc.sqrt()) / (2.0 * qa);
    let s = c0 + u.z * w;
    if !(0.0..=len).contains(&s) {
        return None;
    }

    Some(a.z + w)
}

/// The triangle displaced along its face normal by `offset`.
///
/// This is the exact contribution of the flat face region to the offset
/// surface, mirroring roles 6-8 of the vertex stage. Returns `None` for a
/// degenerate triangle.
#[must_use]
pub fn offset_triangle(tri: &[Point3<f32>; 3], offset: f32) -> Option<[Point3<f32>; 3]> {
    if degenerate_triangle(tri) {
        return None;
    }
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    let d = n.normalize() * offset;
    Some([tri[0] + d, tri[1] + d, tri[2] + d])
}

/// Highest intersection among a triangle's three vertex spheres and three
/// edge cylinders at the pixel `(px, py)`.
///
/// Returns `None` when the pixel lies outside all six primitives. The
/// candidates are folded with a max-by-height reducer, which is
/// commutative and associative, so evaluation order never matters.
///
/// # Example
///
/// ```
/// use mesh_heightfield::coverage::best_height;
/// use nalgebra::Point3;
///
/// let tri = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
///
/// // Directly over a vertex: apex of that vertex's sphere.
/// let h = best_height(0.0, 0.0, &tri, 0.1);
/// assert!((h.unwrap() - 0.1).abs() < 1e-6);
/// ```
#[must_use]
pub fn best_height(px: f32, py: f32, tri: &[Point3<f32>; 3], offset: f32) -> Option<f32> {
    const EDGES: [(usize, usize); 3] = [(0, 1), (1, 2), (2, 0)];

    let spheres = tri.iter().filter_map(|p| sphere_height(px, py, *p, offset));
    let cylinders = EDGES
        .iter()
        .filter_map(|&(i, j)| capsule_height(px, py, tri[i], tri[j], offset));

    spheres.chain(cylinders).fold(None, |best, h| match best {
        Some(b) if b >= h => Some(b),
        _ => Some(h),
    })
}
