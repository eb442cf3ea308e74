use glam::Mat4;

const MATRIX_LEN: usize = 16;

/// View and projection matrices stored back to back in one allocation.
///
/// `view` is the first 16 floats and `projection` the next 16, both column
/// major. The whole block is what the camera uniform buffer receives, so
/// writes through either window are part of the next upload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraBuffer([[f32; MATRIX_LEN]; 2]);

impl Default for CameraBuffer {
    fn default() -> Self {
        Self([Mat4::IDENTITY.to_cols_array(); 2])
    }
}

impl CameraBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &[f32; MATRIX_LEN] {
        &self.0[0]
    }

    pub fn view_mut(&mut self) -> &mut [f32; MATRIX_LEN] {
        &mut self.0[0]
    }

    pub fn projection(&self) -> &[f32; MATRIX_LEN] {
        &self.0[1]
    }

    pub fn projection_mut(&mut self) -> &mut [f32; MATRIX_LEN] {
        &mut self.0[1]
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array(self.view())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::from_cols_array(self.projection())
    }

    pub fn set_view(&mut self, view: Mat4) {
        *self.view_mut() = view.to_cols_array();
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        *self.projection_mut() = projection.to_cols_array();
    }

    /// Both matrices as one flat slice, view first.
    pub fn as_slice(&self) -> &[f32] {
        self.0.as_flattened()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Size of the whole block in bytes.
    pub const fn byte_length() -> u64 {
        (2 * MATRIX_LEN * size_of::<f32>()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_alias_the_backing_block() {
        let mut buf = CameraBuffer::new();

        buf.view_mut()[3] = 7.0;
        buf.projection_mut()[0] = 9.0;

        assert_eq!(buf.as_slice()[3], 7.0);
        assert_eq!(buf.as_slice()[16], 9.0);
        assert_eq!(buf.view()[3], 7.0);
        assert_eq!(buf.projection()[0], 9.0);
    }

    #[test]
    fn windows_do_not_overlap() {
        let mut buf = CameraBuffer::new();
        buf.set_view(Mat4::from_scale(glam::Vec3::splat(2.0)));

        assert_eq!(buf.projection_matrix(), Mat4::IDENTITY);
        assert_eq!(buf.as_slice()[0], 2.0);
        assert_eq!(buf.as_slice()[16], 1.0);
    }

    #[test]
    fn byte_view_covers_both_matrices() {
        let buf = CameraBuffer::new();
        assert_eq!(buf.as_slice().len(), 32);
        assert_eq!(buf.as_bytes().len(), 128);
        assert_eq!(CameraBuffer::byte_length(), 128);
    }
}
