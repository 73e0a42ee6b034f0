//! Projection and framing of the mesh into the device cube.
//!
//! A [`Frame`] maps mesh space into the `[-1, 1]` normalized device cube
//! with a uniform scale and a translation, leaving room for the offset
//! margin on every side. Projection and view are fused: there is no
//! separate camera, the view direction is always `+z`.

use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Floor applied to the offset distance when the framed extent would
/// otherwise collapse to zero (a point mesh with zero offset).
pub const MIN_OFFSET: f32 = 1e-6;

/// Uniform scale and translation mapping mesh space into the device cube.
///
/// Satisfies `scale * (max_extent + 2 * offset) ≈ 2`, so the entire offset
/// mesh fits `[-1, 1]³`. Device coordinates are `scale * p - center`.
///
/// # Example
///
/// ```
/// use mesh_heightfield::framing::Frame;
///
/// // A unit triangle in the xy plane.
/// let soup = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let frame = Frame::for_mesh(&soup, 0.1);
///
/// assert!((frame.scale * (1.0 + 0.2) - 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Uniform scale applied to mesh coordinates.
    pub scale: f32,
    /// Translation subtracted after scaling.
    pub center: Vector3<f32>,
    /// Offset distance in mesh units.
    pub offset: f32,
}

impl Frame {
    /// Compute the framing for a triangle soup and an offset distance.
    ///
    /// `vertices` is a flat `x y z` sequence. The offset is floored to
    /// [`MIN_OFFSET`] when the mesh bounding box is a point and the offset
    /// is zero, keeping the scale finite.
    #[must_use]
    pub fn for_mesh(vertices: &[f32], offset: f32) -> Self {
        let (min, max) = bounds(vertices);
        let extent = max - min;
        let max_size = extent.x.max(extent.y).max(extent.z).max(0.0);

        let offset = if max_size + 2.0 * offset < MIN_OFFSET {
            MIN_OFFSET
        } else {
            offset
        };

        let scale = 2.0 / (max_size + 2.0 * offset);
        let center = (min.coords + max.coords) * (scale / 2.0);

        Self {
            scale,
            center,
            offset,
        }
    }

    /// Offset distance in device units.
    #[must_use]
    pub fn offset_device(&self) -> f32 {
        self.offset * self.scale
    }

    /// Map a mesh-space point into the device cube.
    #[must_use]
    pub fn to_device(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::from(p.coords * self.scale - self.center)
    }

    /// Map a device-space point back to mesh space.
    #[must_use]
    pub fn to_mesh(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::from((p.coords + self.center) / self.scale)
    }

    /// The fused orthographic projection matrix.
    ///
    /// Uniform `scale` on the diagonal, translation `-center`; applying it
    /// to a homogeneous mesh-space point yields device coordinates.
    #[must_use]
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let mut m = Matrix4::from_diagonal(&Vector4::new(self.scale, self.scale, self.scale, 1.0));
        m.m14 = -self.center.x;
        m.m24 = -self.center.y;
        m.m34 = -self.center.z;
        m
    }
}

/// Axis-aligned bounding box of a triangle soup.
///
/// Returns a zero box at the origin for an empty soup.
fn bounds(vertices: &[f32]) -> (Point3<f32>, Point3<f32>) {
    let mut min = Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY);
    let mut max = Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY);

    for v in vertices.chunks_exact(3) {
        min.x = min.x.min(v[0]);
        min.y = min.y.min(v[1]);
        min.z = min.z.min(v[2]);
        max.x = max.x.max(v[0]);
        max.y = max.y.max(v[1]);
        max.z = max.z.max(v[2]);
    }

    if min.x > max.x {
        return (Point3::origin(), Point3::origin());
    }

    (min, max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> [f32; 9] {
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
    }

    #[test]
    fn test_framing_invariant() {
        let frame = Frame::for_mesh(&unit_triangle(), 0.1);
        assert_relative_eq!(frame.scale * (1.0 + 0.2), 2.0, epsilon = 1e-6);

        let frame = Frame::for_mesh(&unit_triangle(), 0.0);
        assert_relative_eq!(frame.scale * 1.0, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_center_formula() {
        let frame = Frame::for_mesh(&unit_triangle(), 0.1);
        // center = (min + max) * scale / 2
        assert_relative_eq!(frame.center.x, 0.5 * frame.scale, epsilon = 1e-6);
        assert_relative_eq!(frame.center.y, 0.5 * frame.scale, epsilon = 1e-6);
        assert_relative_eq!(frame.center.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_offset_mesh_fits_device_cube() {
        let soup = [
            -3.0, 0.0, 2.0, //
            5.0, 1.0, -4.0, //
            0.0, -2.0, 1.0, //
        ];
        let offset = 0.75;
        let frame = Frame::for_mesh(&soup, offset);
        let r = frame.offset_device();

        for v in soup.chunks_exact(3) {
            let d = frame.to_device(Point3::new(v[0], v[1], v[2]));
            for axis in [d.x, d.y, d.z] {
                assert!(axis - r >= -1.0 - 1e-5);
                assert!(axis + r <= 1.0 + 1e-5);
            }
        }
    }

    #[test]
    fn test_degenerate_point_mesh_stays_finite() {
        let soup = [2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        let frame = Frame::for_mesh(&soup, 0.0);

        assert!(frame.scale.is_finite());
        assert!(frame.offset >= MIN_OFFSET);
    }

    #[test]
    fn test_device_round_trip() {
        let frame = Frame::for_mesh(&unit_triangle(), 0.1);
        let p = Point3::new(0.3, 0.7, -0.2);
        let back = frame.to_mesh(frame.to_device(p));

        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, p.z, epsilon = 1e-5);
    }

    #[test]
    fn test_projection_matrix_matches_to_device() {
        let frame = Frame::for_mesh(&unit_triangle(), 0.25);
        let m = frame.projection_matrix();
        let p = Point3::new(0.4, -0.1, 0.9);

        let via_matrix = m.transform_point(&p);
        let via_frame = frame.to_device(p);

        assert_relative_eq!(via_matrix.x, via_frame.x, epsilon = 1e-6);
        assert_relative_eq!(via_matrix.y, via_frame.y, epsilon = 1e-6);
        assert_relative_eq!(via_matrix.z, via_frame.z, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_soup_bounds() {
        let frame = Frame::for_mesh(&[], 0.5);
        assert!(frame.scale.is_finite());
        assert_relative_eq!(frame.scale, 2.0, epsilon = 1e-6);
    }
}
