//! Light sources.

use lumen_math::{Vec3, Vec3Ext};

use crate::material::Color;

/// A light at a position, attenuated by 1 / (constant + linear*d + quadratic*d²).
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Color,
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl PointLight {
    /// An unattenuated point light.
    pub fn new(position: Vec3, color: Color) -> Self {
        Self {
            position,
            color,
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        }
    }

    pub fn with_attenuation(mut self, constant: f64, linear: f64, quadratic: f64) -> Self {
        self.constant = constant;
        self.linear = linear;
        self.quadratic = quadratic;
        self
    }

    pub fn attenuation(&self, distance: f64) -> f64 {
        let denom = self.constant + self.linear * distance + self.quadratic * distance * distance;
        if denom <= 0.0 {
            1.0
        } else {
            1.0 / denom
        }
    }
}

/// A light infinitely far away shining along `direction`.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    direction: Vec3,
    pub color: Color,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Color) -> Self {
        Self {
            direction: direction.normalized(),
            color,
        }
    }

    /// Unit direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }
}

/// Any light the scene can hold.
#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Point(PointLight),
    Directional(DirectionalLight),
    /// Wraps another light and multiplies its color component-wise.
    Filtered { light: Box<Light>, filter: Color },
}

impl Light {
    /// Put a color filter in front of this light.
    pub fn filtered(self, filter: Color) -> Self {
        Light::Filtered {
            light: Box::new(self),
            filter,
        }
    }

    /// Unit vector from `point` toward the light.
    pub fn direction_from(&self, point: Vec3) -> Vec3 {
        match self {
            Light::Point(p) => (p.position - point).normalized(),
            Light::Directional(d) => -d.direction,
            Light::Filtered { light, .. } => light.direction_from(point),
        }
    }

    /// Distance to the light, `None` when it is at infinity.
    pub fn distance_from(&self, point: Vec3) -> Option<f64> {
        match self {
            Light::Point(p) => Some((p.position - point).length()),
            Light::Directional(_) => None,
            Light::Filtered { light, .. } => light.distance_from(point),
        }
    }

    /// Light color arriving at `point`, including attenuation.
    pub fn color_at(&self, point: Vec3) -> Color {
        match self {
            Light::Point(p) => p.color * p.attenuation((p.position - point).length()),
            Light::Directional(d) => d.color,
            Light::Filtered { light, filter } => light.color_at(point) * *filter,
        }
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

/// Uniform light added to every lit surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
}

impl AmbientLight {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Color::splat(0.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_light_direction_and_distance() {
        let light = Light::from(PointLight::new(Vec3::new(0.0, 10.0, 0.0), Color::ONE));
        assert_eq!(light.direction_from(Vec3::ZERO), Vec3::Y);
        assert_eq!(light.distance_from(Vec3::ZERO), Some(10.0));
    }

    #[test]
    fn test_point_light_attenuation() {
        let light = Light::from(
            PointLight::new(Vec3::new(0.0, 2.0, 0.0), Color::ONE).with_attenuation(1.0, 0.5, 0.25),
        );
        // 1 / (1 + 0.5*2 + 0.25*4) = 1/3
        let c = light.color_at(Vec3::ZERO);
        assert!((c.x - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_directional_light() {
        let light = Light::from(DirectionalLight::new(Vec3::new(0.0, -2.0, 0.0), Color::splat(0.8)));
        assert_eq!(light.direction_from(Vec3::new(5.0, 5.0, 5.0)), Vec3::Y);
        assert_eq!(light.distance_from(Vec3::ZERO), None);
        assert_eq!(light.color_at(Vec3::new(100.0, 0.0, 0.0)), Color::splat(0.8));
    }

    #[test]
    fn test_filtered_light_multiplies_color() {
        let light = Light::from(DirectionalLight::new(Vec3::NEG_Y, Color::new(1.0, 0.5, 1.0)))
            .filtered(Color::new(0.5, 1.0, 0.0));
        assert_eq!(light.color_at(Vec3::ZERO), Color::new(0.5, 0.5, 0.0));
        assert_eq!(light.direction_from(Vec3::ZERO), Vec3::Y);
    }

    #[test]
    fn test_ambient_default() {
        assert_eq!(AmbientLight::default().color, Color::splat(0.1));
    }
}
