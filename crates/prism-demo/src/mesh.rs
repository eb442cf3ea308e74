//! Unit quad geometry and the per-instance transform grid.

use glam::{Mat4, Vec3};
use prism_engine::buffers::StorageBuffer;

/// Corners in counter-clockwise order from the bottom left.
#[rustfmt::skip]
pub const POSITIONS: [f32; 12] = [
    -1.0, -1.0, 0.0,
     1.0, -1.0, 0.0,
     1.0,  1.0, 0.0,
    -1.0,  1.0, 0.0,
];

#[rustfmt::skip]
pub const COLORS: [f32; 12] = [
    1.0, 0.0, 0.0,
    0.0, 1.0, 0.0,
    0.0, 0.0, 1.0,
    1.0, 0.0, 1.0,
];

/// UVs per corner; V grows downwards in texture space.
#[rustfmt::skip]
pub const TEX_COORDS: [f32; 8] = [
    0.0, 1.0,
    1.0, 1.0,
    1.0, 0.0,
    0.0, 0.0,
];

pub const INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

pub const GRID_SIDE: usize = 150;
const SPACING: f32 = 1.1;
const BASE_SCALE: f32 = 0.5;
const SCALE_PER_ROW: f32 = 0.1;

/// One column-major 4x4 matrix per quad, row-major over the grid.
///
/// Quads are spaced `SPACING` apart and grow with their row index.
pub fn grid_transforms(side: usize) -> StorageBuffer {
    let mut transforms = StorageBuffer::new(16, side * side);

    for (i, row) in transforms.rows_mut().enumerate() {
        let (x, y) = ((i % side) as f32, (i / side) as f32);
        let scale = BASE_SCALE + y * SCALE_PER_ROW;

        let matrix = Mat4::from_translation(Vec3::new(x * SPACING, y * SPACING, 0.0))
            * Mat4::from_scale(Vec3::new(scale, scale, 0.0));
        row.copy_from_slice(&matrix.to_cols_array());
    }

    transforms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_buffers_agree() {
        assert_eq!(POSITIONS.len() / 3, 4);
        assert_eq!(COLORS.len() / 3, 4);
        assert_eq!(TEX_COORDS.len() / 2, 4);
        assert!(INDICES.iter().all(|&i| i < 4));
    }

    #[test]
    fn grid_places_and_scales_by_row() {
        let transforms = grid_transforms(3);
        assert_eq!(transforms.count(), 9);

        let origin = Mat4::from_cols_slice(transforms.row(0));
        assert_eq!(origin.w_axis.truncate(), Vec3::ZERO);
        assert_eq!(origin.x_axis.x, 0.5);

        // x = 1, y = 2
        let m = Mat4::from_cols_slice(transforms.row(7));
        assert!((m.w_axis.x - 1.1).abs() < 1e-6);
        assert!((m.w_axis.y - 2.2).abs() < 1e-6);
        assert!((m.x_axis.x - 0.7).abs() < 1e-6);
        assert_eq!(m.z_axis.z, 0.0);
    }
}
