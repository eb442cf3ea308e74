//! Keyboard and wheel bindings for the camera.

use glam::Vec3;
use winit::event::MouseScrollDelta;
use winit::keyboard::KeyCode;

const KEY_STEP: f32 = 0.1;
const WHEEL_FACTOR: f32 = 0.001;
/// Pixels per wheel notch when the platform reports lines.
const LINE_HEIGHT: f32 = 100.0;

/// WASD pans the camera in its XY plane.
pub fn key_translation(code: KeyCode) -> Option<Vec3> {
    let (x, y) = match code {
        KeyCode::KeyW => (0.0, KEY_STEP),
        KeyCode::KeyS => (0.0, -KEY_STEP),
        KeyCode::KeyD => (KEY_STEP, 0.0),
        KeyCode::KeyA => (-KEY_STEP, 0.0),
        _ => return None,
    };
    Some(Vec3::new(x, y, 0.0))
}

/// Scrolling down pulls the camera back along +Z.
pub fn wheel_translation(delta: MouseScrollDelta) -> Vec3 {
    let pixels = match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    };
    Vec3::new(0.0, 0.0, pixels * WHEEL_FACTOR)
}
