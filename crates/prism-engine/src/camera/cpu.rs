use glam::{Mat4, Vec3};

use crate::coords::Viewport;

use super::{CameraBuffer, CameraError, Orthographic, Perspective, Projection};

/// Capability shared by every camera flavour.
///
/// A camera is usable once both [`init_projection`](Self::init_projection)
/// and [`recalculate`](Self::recalculate) have run; [`init`](Self::init) does
/// both in that order.
pub trait CameraControl {
    /// Rewrites the projection window of the camera buffer.
    fn init_projection(&mut self, window: Viewport);

    /// Re-derives the view window from the current position.
    fn recalculate(&mut self);

    /// Moves the camera by `delta` and re-derives the view immediately.
    fn translate(&mut self, delta: Vec3) -> &mut Self;

    fn init(&mut self, window: Viewport) {
        self.init_projection(window);
        self.recalculate();
    }
}

/// CPU-side camera: a position, a projection and the matrix block derived
/// from them.
///
/// The view matrix is always the inverse of the translation to `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    projection: Projection,
    buffer: CameraBuffer,
}

impl Camera {
    /// Builds a camera at the origin and initializes both matrices.
    pub fn new(projection: Projection, window: Viewport) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            projection,
            buffer: CameraBuffer::new(),
        };
        camera.init(window);
        camera
    }

    pub fn orthographic(window: Viewport) -> Self {
        Self::new(Projection::Orthographic(Orthographic::default()), window)
    }

    /// Perspective camera; `fov_degrees` defaults to 90.
    pub fn perspective(fov_degrees: Option<f32>, window: Viewport) -> Self {
        Self::new(Projection::Perspective(Perspective::new(fov_degrees)), window)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn buffer(&self) -> &CameraBuffer {
        &self.buffer
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.buffer.view_matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.buffer.projection_matrix()
    }

    /// Field of view in radians, for perspective cameras.
    pub fn fov(&self) -> Option<f32> {
        match &self.projection {
            Projection::Perspective(persp) => Some(persp.fov()),
            Projection::Orthographic(_) => None,
        }
    }

    /// Sets the field of view in degrees and re-projects against `window`.
    ///
    /// The view matrix is left untouched.
    pub fn set_fov(&mut self, fov_degrees: f32, window: Viewport) -> Result<&mut Self, CameraError> {
        let Projection::Perspective(persp) = &mut self.projection else {
            return Err(CameraError::NotPerspective);
        };
        persp.set_fov_degrees(fov_degrees);
        self.init_projection(window);
        Ok(self)
    }

    /// Replaces orthographic bounds and re-projects.
    pub fn set_bounds(&mut self, bounds: Orthographic) -> Result<&mut Self, CameraError> {
        let Projection::Orthographic(ortho) = &mut self.projection else {
            return Err(CameraError::NotOrthographic);
        };
        *ortho = bounds;
        self.buffer.set_projection(bounds.matrix());
        Ok(self)
    }
}

impl CameraControl for Camera {
    fn init_projection(&mut self, window: Viewport) {
        let matrix = self.projection.compute(window);
        self.buffer.set_projection(matrix);
    }

    fn recalculate(&mut self) {
        let staging = Mat4::from_translation(self.position);
        self.buffer.set_view(staging.inverse());
    }

    fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position += delta;
        self.recalculate();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Viewport = Viewport::new(800.0, 600.0);

    fn assert_view_follows_position(camera: &Camera) {
        let expected = Mat4::from_translation(camera.position()).inverse();
        assert!(camera.view_matrix().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn init_derives_view_from_position() {
        let camera = Camera::orthographic(WINDOW);
        assert_eq!(camera.position(), Vec3::ZERO);
        assert_view_follows_position(&camera);
        assert!(
            camera
                .projection_matrix()
                .abs_diff_eq(Orthographic::default().matrix(), 1e-6)
        );
    }

    #[test]
    fn translate_accumulates_and_recomputes_view() {
        let mut camera = Camera::perspective(None, WINDOW);
        camera.translate(Vec3::new(0.0, 0.0, 1.0));
        camera.translate(Vec3::new(0.5, -0.1, 0.0));

        assert!(camera.position().abs_diff_eq(Vec3::new(0.5, -0.1, 1.0), 1e-6));
        assert_view_follows_position(&camera);
        assert!((camera.view_matrix().w_axis.z + 1.0).abs() < 1e-6);
    }

    #[test]
    fn perspective_aspect_comes_from_window() {
        let camera = Camera::perspective(Some(90.0), WINDOW);
        let Projection::Perspective(persp) = camera.projection() else {
            panic!("expected perspective projection");
        };

        assert!((persp.aspect() - 800.0 / 600.0).abs() < 1e-6);
        assert!(camera.projection_matrix().abs_diff_eq(persp.matrix(), 1e-6));
    }

    #[test]
    fn set_fov_updates_projection_only() {
        let mut camera = Camera::perspective(None, WINDOW);
        camera.translate(Vec3::new(1.0, 2.0, 3.0));

        let view = *camera.buffer().view();
        let projection = *camera.buffer().projection();

        camera.set_fov(60.0, WINDOW).unwrap();

        assert_eq!(camera.buffer().view(), &view);
        assert_ne!(camera.buffer().projection(), &projection);
        assert!((camera.fov().unwrap() - 60f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn set_fov_on_orthographic_is_rejected() {
        let mut camera = Camera::orthographic(WINDOW);
        let before = camera.clone();

        let err = camera.set_fov(60.0, WINDOW).unwrap_err();

        assert_eq!(err, CameraError::NotPerspective);
        assert_eq!(camera, before);
        assert_eq!(camera.fov(), None);
    }

    #[test]
    fn set_bounds_reprojects() {
        let mut camera = Camera::orthographic(WINDOW);
        let bounds = Orthographic {
            left: 0.0,
            right: 800.0,
            bottom: 600.0,
            top: 0.0,
            ..Orthographic::default()
        };

        camera.set_bounds(bounds).unwrap();

        assert!(camera.projection_matrix().abs_diff_eq(bounds.matrix(), 1e-6));
        assert_eq!(
            Camera::perspective(None, WINDOW).set_bounds(bounds).unwrap_err(),
            CameraError::NotOrthographic
        );
    }
}
