/// Window size in logical pixels.
///
/// Cameras derive their aspect ratio from this; the back buffer itself is
/// sized in physical pixels (see `Context::canvas_size`).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// `width / height`, or `None` for a collapsed or non-finite viewport.
    #[inline]
    pub fn aspect_ratio(self) -> Option<f32> {
        self.is_valid().then(|| self.width / self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_of_valid_viewport() {
        let ratio = Viewport::new(800.0, 600.0).aspect_ratio().unwrap();
        assert!((ratio - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn collapsed_viewport_has_no_aspect_ratio() {
        assert_eq!(Viewport::new(800.0, 0.0).aspect_ratio(), None);
        assert_eq!(Viewport::default().aspect_ratio(), None);
        assert_eq!(Viewport::new(f32::INFINITY, 1.0).aspect_ratio(), None);
    }
}
