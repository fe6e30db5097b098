//! Scalar helpers shared by the character animator and the reconciler.

use glam::Vec3;

/// Linear interpolation from `a` toward `b` by fraction `t`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Signed shortest turn from `current` to `target`, in degrees.
pub fn shortest_turn(current: f32, target: f32) -> f32 {
    wrap_degrees(target - current)
}

/// Rotate `v` about the Y axis by `yaw_degrees`.
pub fn rotate_yaw(v: Vec3, yaw_degrees: f32) -> Vec3 {
    let (sin, cos) = yaw_degrees.to_radians().sin_cos();
    Vec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}
