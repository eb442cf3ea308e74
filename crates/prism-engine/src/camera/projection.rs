use glam::Mat4;

use crate::coords::Viewport;

pub const DEFAULT_FOV_DEGREES: f32 = 90.0;
pub const PERSPECTIVE_NEAR: f32 = 0.1;
pub const PERSPECTIVE_FAR: f32 = 100.0;

/// Box projection; bounds default to the unit cube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Orthographic {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Orthographic {
    fn default() -> Self {
        Self {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: -1.0,
            far: 1.0,
        }
    }
}

impl Orthographic {
    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Perspective projection with a field of view stored in degrees.
///
/// `aspect` is whatever the last [`Perspective::update_aspect`] computed from
/// the window; it does not follow resizes on its own.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Perspective {
    fov_degrees: f32,
    aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fov_degrees: DEFAULT_FOV_DEGREES,
            aspect: 1.0,
            near: PERSPECTIVE_NEAR,
            far: PERSPECTIVE_FAR,
        }
    }
}

impl Perspective {
    /// `None`, or an angle outside (0, 180), keeps the 90 degree default.
    pub fn new(fov_degrees: Option<f32>) -> Self {
        let mut perspective = Self::default();
        if let Some(fov) = fov_degrees {
            perspective.set_fov_degrees(fov);
        }
        perspective
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub(crate) fn set_fov_degrees(&mut self, fov: f32) {
        if fov > 0.0 && fov < 180.0 {
            self.fov_degrees = fov;
        } else {
            log::warn!("ignoring field of view {fov}; keeping {}", self.fov_degrees);
        }
    }

    pub(crate) fn update_aspect(&mut self, window: Viewport) {
        self.aspect = window.aspect_ratio().unwrap_or_else(|| {
            log::warn!(
                "window {}x{} has no aspect ratio; using 1.0",
                window.width,
                window.height
            );
            1.0
        });
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov(), self.aspect, self.near, self.far)
    }
}

/// The projection a [`Camera`](super::Camera) writes into its buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Projection {
    Orthographic(Orthographic),
    Perspective(Perspective),
}

impl Projection {
    /// Refreshes window-dependent parameters and returns the matrix.
    pub(crate) fn compute(&mut self, window: Viewport) -> Mat4 {
        match self {
            Self::Orthographic(ortho) => ortho.matrix(),
            Self::Perspective(persp) => {
                persp.update_aspect(window);
                persp.matrix()
            }
        }
    }
}
