//! GPU-rasterized offset-surface height fields for triangle meshes.
//!
//! This crate approximates the offset surface of a triangle mesh (its
//! Minkowski sum with a sphere) as a height field, viewed along `+z`.
//! Instead of marching a distance field, each triangle is expanded into a
//! handful of rasterizable primitives and a fragment shader recovers the
//! exact offset surface analytically: three vertex spheres, three edge
//! cylinders, and the displaced face plane per triangle. A greater-equal
//! depth test composites the highest hit per pixel, and the result is read
//! back and decoded into a grid of `f32` heights.
//!
//! # Architecture
//!
//! - [`context`]: lazy global wgpu device and queue
//! - [`framing`]: mesh-to-device-cube projection with offset margin
//! - [`expand`]: per-triangle geometry expansion into raster records
//! - [`coverage`]: CPU mirror of the analytic fragment tests
//! - [`encoding`]: 16-bit height packing across two color channels
//! - [`raster`]: render pipeline, readback, and the public entry points
//! - [`heightfield`]: the decoded grid with mesh-space queries
//!
//! # Example
//!
//! ```no_run
//! use mesh_heightfield::compute_offset_height_map;
//!
//! // One triangle, flat x y z coordinates.
//! let soup = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//!
//! let map = compute_offset_height_map(&soup, 0.1, 256)?;
//! println!(
//!     "{} of {} pixels covered",
//!     map.field.covered_count(),
//!     256 * 256
//! );
//!
//! // Heights are device-space; map a covered pixel back to mesh space.
//! if let Some(p) = map.field.mesh_position(128, 128) {
//!     println!("surface at ({}, {}, {})", p.x, p.y, p.z);
//! }
//! # Ok::<(), mesh_heightfield::HeightFieldError>(())
//! ```
//!
//! # GPU Requirements
//!
//! Requires a wgpu-compatible GPU (Vulkan, Metal, DX12, or GL). When no
//! adapter is available, [`compute_offset_height_map`] returns
//! [`HeightFieldError::NotAvailable`] and
//! [`try_compute_offset_height_map`] returns `None` so callers can fall
//! back to a CPU path.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod context;
pub mod coverage;
pub mod encoding;
pub mod error;
pub mod expand;
pub mod framing;
pub mod heightfield;
pub mod raster;

pub use context::{GpuAdapterInfo, GpuContext};
pub use coverage::best_height;
pub use encoding::{decode_height, encode_height, QUANTIZATION_STEP};
pub use error::{HeightFieldError, HeightFieldResult};
pub use expand::{expand_triangles, RasterVertex, RECORDS_PER_TRIANGLE};
pub use framing::Frame;
pub use heightfield::HeightField;
pub use raster::{
    compute_offset_height_map, try_compute_offset_height_map, OffsetHeightMap,
    OffsetRasterPipeline,
};
