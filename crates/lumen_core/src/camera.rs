//! Pinhole camera looking through a rectangular screen.

use lumen_math::{Ray, Vec3, Vec3Ext};

/// A parallelogram in space, parameterised over [0, 1]².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    /// Bottom-left corner
    pub origin: Vec3,
    /// Edge from bottom-left to bottom-right
    pub bottom_side: Vec3,
    /// Edge from bottom-left to top-left
    pub left_side: Vec3,
}

impl Screen {
    pub fn new(origin: Vec3, bottom_side: Vec3, left_side: Vec3) -> Self {
        Self {
            origin,
            bottom_side,
            left_side,
        }
    }

    pub fn point_at(&self, u: f64, v: f64) -> Vec3 {
        self.origin + self.bottom_side * u + self.left_side * v
    }

    pub fn center(&self) -> Vec3 {
        self.point_at(0.5, 0.5)
    }
}

/// Camera for generating primary rays.
///
/// `ray(u, v)` passes through `screen.point_at(u, v)`, with v = 1 at the top.
#[derive(Debug, Clone)]
pub struct Camera {
    pub origin: Vec3,
    pub screen: Screen,
    /// Horizontal field of view in degrees
    fov: f64,
}

impl Camera {
    /// Camera at the origin looking down -Z through a 2x2 screen at distance 1.
    pub fn new() -> Self {
        Self {
            origin: Vec3::ZERO,
            screen: Screen::new(
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ),
            fov: 90.0,
        }
    }

    /// Set the eye point and screen explicitly.
    pub fn with_screen(mut self, origin: Vec3, screen: Screen) -> Self {
        self.origin = origin;
        self.screen = screen;
        self
    }

    /// Place the camera at `look_from` aiming at `look_at`.
    ///
    /// The screen sits at unit distance and is sized for `fov` (horizontal,
    /// degrees) at the given aspect ratio (width / height).
    pub fn look_at(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3, fov: f64, aspect: f64) -> Self {
        let w = (look_from - look_at).normalized();
        let u = vup.cross(w).normalized();
        let v = w.cross(u);

        let half_width = (fov.to_radians() / 2.0).tan();
        let half_height = half_width / aspect.max(f64::EPSILON);

        self.origin = look_from;
        self.fov = fov;
        self.screen = Screen::new(
            look_from - w - u * half_width - v * half_height,
            u * (2.0 * half_width),
            v * (2.0 * half_height),
        );
        self
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    /// Resize the screen about its center to match a new horizontal fov.
    pub fn with_fov(mut self, fov: f64) -> Self {
        self.set_fov(fov);
        self
    }

    pub fn set_fov(&mut self, fov: f64) {
        let fov = fov.clamp(1.0, 179.0);
        let center = self.screen.center();
        let distance = (center - self.origin).length();
        let current_half = self.screen.bottom_side.length() / 2.0;
        if distance == 0.0 || current_half == 0.0 {
            return;
        }

        let scale = distance * (fov.to_radians() / 2.0).tan() / current_half;
        let bottom = self.screen.bottom_side * scale;
        let left = self.screen.left_side * scale;
        self.screen = Screen::new(center - bottom / 2.0 - left / 2.0, bottom, left);
        self.fov = fov;
    }

    /// Normalized ray through screen coordinates (u, v).
    pub fn ray(&self, u: f64, v: f64) -> Ray {
        let point = self.screen.point_at(u, v);
        Ray::new(self.origin, (point - self.origin).normalized())
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.origin += offset;
        self.screen.origin += offset;
    }

    /// Rotate the screen about the eye point around the world X axis.
    pub fn rotate_x(&mut self, degrees: f64) {
        self.rotate_with(|v| v.rotated_x(degrees));
    }

    pub fn rotate_y(&mut self, degrees: f64) {
        self.rotate_with(|v| v.rotated_y(degrees));
    }

    pub fn rotate_z(&mut self, degrees: f64) {
        self.rotate_with(|v| v.rotated_z(degrees));
    }

    fn rotate_with(&mut self, rotate: impl Fn(Vec3) -> Vec3) {
        self.screen = Screen::new(
            self.origin + rotate(self.screen.origin - self.origin),
            rotate(self.screen.bottom_side),
            rotate(self.screen.left_side),
        );
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_default_center_ray() {
        let camera = Camera::new();
        let ray = camera.ray(0.5, 0.5);
        assert_eq!(ray.origin, Vec3::ZERO);
        assert!(near(ray.direction, Vec3::NEG_Z));
    }

    #[test]
    fn test_rays_are_normalized() {
        let camera = Camera::new();
        let ray = camera.ray(0.0, 1.0);
        assert!((ray.direction.length() - 1.0).abs() < 1e-12);
        // v = 1 is the top edge
        assert!(ray.direction.y > 0.0);
    }

    #[test]
    fn test_look_at() {
        let camera = Camera::new().look_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            90.0,
            2.0,
        );
        let ray = camera.ray(0.5, 0.5);
        assert!(near(ray.direction, Vec3::NEG_Z));
        assert!(near(camera.screen.bottom_side, Vec3::new(2.0, 0.0, 0.0)));
        assert!(near(camera.screen.left_side, Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_fov_rescales_screen() {
        let camera = Camera::new().with_fov(60.0);
        let expected = 2.0 * (30.0f64).to_radians().tan();
        assert!((camera.screen.bottom_side.length() - expected).abs() < 1e-9);
        assert!(near(camera.screen.center(), Vec3::NEG_Z));
        assert_eq!(camera.fov(), 60.0);
    }

    #[test]
    fn test_translate_and_rotate() {
        let mut camera = Camera::new();
        camera.translate(Vec3::new(1.0, 0.0, 0.0));
        assert!(near(camera.ray(0.5, 0.5).origin, Vec3::X));

        camera.rotate_y(90.0);
        // Looking down -Z, a quarter turn about Y looks down -X
        assert!(near(camera.ray(0.5, 0.5).direction, Vec3::NEG_X));
    }
}
