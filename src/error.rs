//! Error types for offset height-field computation.
//!
//! The error surface is narrow: input contract violations fail immediately,
//! GPU unavailability and resource exhaustion are hard failures for the
//! call, and degenerate geometry is never an error (the affected analytic
//! test simply contributes no intersection).

use thiserror::Error;

/// Errors that can occur while computing an offset height field.
///
/// # Example
///
/// ```
/// use mesh_heightfield::error::{HeightFieldError, HeightFieldResult};
///
/// fn check_gpu() -> HeightFieldResult<()> {
///     Err(HeightFieldError::NotAvailable)
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeightFieldError {
    /// GPU device is not available on this system.
    ///
    /// This can happen when no compatible GPU is present, drivers are not
    /// installed, or the system is headless without GPU support.
    #[error("GPU not available: no compatible device found")]
    NotAvailable,

    /// The input vertex slice does not describe a whole number of triangles.
    ///
    /// The input is a flat `x y z` sequence, nine floats per triangle, so
    /// its length must be a positive multiple of nine.
    #[error("invalid vertex count: {len} is not a positive multiple of 9")]
    InvalidVertexCount {
        /// Length of the input slice.
        len: usize,
    },

    /// The requested grid resolution is too small to carry a height field.
    ///
    /// The grid maps its corner samples onto the device cube edges, which
    /// requires at least two samples per axis.
    #[error("invalid resolution: {resolution}, minimum is 2")]
    InvalidResolution {
        /// Requested resolution.
        resolution: u32,
    },

    /// The offset distance is negative or not finite.
    ///
    /// Callers must clamp negative offsets before invoking; the height
    /// field only describes outward dilation.
    #[error("invalid offset distance: {offset}")]
    InvalidOffset {
        /// Requested offset distance.
        offset: f32,
    },

    /// The requested resolution exceeds the device render target limit.
    #[error("resolution too large for GPU: {resolution}, max supported: {max}")]
    ResolutionTooLarge {
        /// Requested resolution.
        resolution: u32,
        /// Maximum square render target edge supported by the device.
        max: u32,
    },

    /// The mesh has too many triangles for a single vertex buffer.
    #[error("mesh too large for GPU: {triangles} triangles, max supported: {max}")]
    MeshTooLarge {
        /// Number of triangles in the mesh.
        triangles: usize,
        /// Maximum supported triangles.
        max: usize,
    },

    /// GPU execution failed.
    ///
    /// A general error for device requests or command submission failures.
    #[error("GPU execution failed: {0}")]
    Execution(String),

    /// Reading the rendered target back from the GPU failed.
    #[error("buffer mapping failed: {0}")]
    BufferMapping(String),
}

/// Result type for height-field operations.
///
/// # Example
///
/// ```
/// use mesh_heightfield::error::HeightFieldResult;
///
/// fn heights() -> HeightFieldResult<Vec<f32>> {
///     Ok(vec![0.0, 0.5, 1.0])
/// }
/// ```
pub type HeightFieldResult<T> = Result<T, HeightFieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_available() {
        let err = HeightFieldError::NotAvailable;
        let msg = format!("{err}");
        assert!(msg.contains("not available"));
    }

    #[test]
    fn test_error_display_invalid_vertex_count() {
        let err = HeightFieldError::InvalidVertexCount { len: 7 };
        let msg = format!("{err}");
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_error_display_invalid_resolution() {
        let err = HeightFieldError::InvalidResolution { resolution: 1 };
        let msg = format!("{err}");
        assert!(msg.contains('1'));
    }

    #[test]
    fn test_error_display_invalid_offset() {
        let err = HeightFieldError::InvalidOffset { offset: -0.5 };
        let msg = format!("{err}");
        assert!(msg.contains("-0.5"));
    }

    #[test]
    fn test_error_display_resolution_too_large() {
        let err = HeightFieldError::ResolutionTooLarge {
            resolution: 65536,
            max: 16384,
        };
        let msg = format!("{err}");
        assert!(msg.contains("65536"));
        assert!(msg.contains("16384"));
    }

    #[test]
    fn test_error_display_mesh_too_large() {
        let err = HeightFieldError::MeshTooLarge {
            triangles: 10_000_000,
            max: 5_000_000,
        };
        let msg = format!("{err}");
        assert!(msg.contains("10000000"));
    }

    #[test]
    fn test_error_display_execution() {
        let err = HeightFieldError::Execution("submission failed".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("submission failed"));
    }

    #[test]
    fn test_error_display_buffer_mapping() {
        let err = HeightFieldError::BufferMapping("map cancelled".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("map cancelled"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HeightFieldError>();
    }
}
