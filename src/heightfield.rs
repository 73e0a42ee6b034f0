//! Decoded height grid.

use nalgebra::Point3;

use crate::encoding::decode_height;
use crate::framing::Frame;

/// A square grid of decoded offset-surface heights.
///
/// Heights are in device units `[-1, 1]`, viewed along `+z`. Pixels the
/// offset surface does not reach carry no value; [`HeightField::get`]
/// distinguishes them from valid heights (including a valid `-1.0`).
/// Row `iy = 0` is the device `y = -1` edge, so `iy` increases with
/// device y.
///
/// The grid owns the framing parameters it was rasterized with, which is
/// everything needed to map grid coordinates back to mesh space.
#[derive(Debug, Clone)]
pub struct HeightField {
    resolution: u32,
    values: Vec<f32>,
    covered: Vec<bool>,
    frame: Frame,
}

impl HeightField {
    /// Decode a tightly packed rgba byte buffer read back from the render
    /// target.
    ///
    /// `raw` must hold `resolution * resolution * 4` bytes with the render
    /// target's top row first; rows are flipped during decode so the grid
    /// runs bottom-up. A zero alpha channel marks a pixel without
    /// coverage.
    #[must_use]
    pub fn decode(raw: &[u8], resolution: u32, frame: Frame) -> Self {
        let res = resolution as usize;
        debug_assert_eq!(raw.len(), res * res * 4);

        let mut values = vec![0.0; res * res];
        let mut covered = vec![false; res * res];

        for iy in 0..res {
            let src_row = res - 1 - iy;
            for ix in 0..res {
                let texel = (src_row * res + ix) * 4;
                let idx = iy * res + ix;
                if raw[texel + 3] > 0 {
                    values[idx] = decode_height(raw[texel], raw[texel + 1]);
                    covered[idx] = true;
                }
            }
        }

        Self {
            resolution,
            values,
            covered,
            frame,
        }
    }

    /// Grid resolution (the grid is square).
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Framing parameters the grid was rasterized with.
    #[must_use]
    pub const fn frame(&self) -> Frame {
        self.frame
    }

    /// Decoded height at grid coordinates.
    ///
    /// Returns `None` outside the offset surface or out of bounds.
    #[must_use]
    pub fn get(&self, ix: u32, iy: u32) -> Option<f32> {
        if ix >= self.resolution || iy >= self.resolution {
            return None;
        }
        let idx = (iy * self.resolution + ix) as usize;
        self.covered[idx].then(|| self.values[idx])
    }

    /// Number of pixels the offset surface covers.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.covered.iter().filter(|&&c| c).count()
    }

    /// Mesh-space position of a covered grid point.
    ///
    /// Inverts the framing transform: grid corners map onto the device
    /// cube edges, then device coordinates map back through scale and
    /// center. Returns `None` for uncovered or out-of-bounds coordinates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    // Precision loss: grid indices are far below f32 integer range
    pub fn mesh_position(&self, ix: u32, iy: u32) -> Option<Point3<f32>> {
        let h = self.get(ix, iy)?;
        let span = (self.resolution - 1) as f32;
        let dx = 2.0 * ix as f32 / span - 1.0;
        let dy = 2.0 * iy as f32 / span - 1.0;
        Some(self.frame.to_mesh(Point3::new(dx, dy, h)))
    }
}
