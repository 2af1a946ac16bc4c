//! Color filters applied to a shaded surface sample.
//!
//! A scene runs its shaders in insertion order on the color of every hit,
//! after lighting, reflection and refraction have been combined.

use lumen_math::{Ray, Vec3, Vec3Ext};

use crate::material::Color;

#[derive(Clone, Debug, PartialEq)]
pub enum Shader {
    /// Pass-through.
    Basic,
    /// Adds a white view-aligned highlight.
    Phong { specular_strength: f64, shininess: f64 },
    /// Posterizes color into bands and draws silhouettes black.
    Toon { levels: u32, edge_threshold: f64 },
    /// Blends toward a rim color at grazing angles.
    Fresnel { power: f64, rim_color: Color },
}

impl Shader {
    pub fn type_name(&self) -> &'static str {
        match self {
            Shader::Basic => "basic",
            Shader::Phong { .. } => "phong",
            Shader::Toon { .. } => "toon",
            Shader::Fresnel { .. } => "fresnel",
        }
    }

    /// Filter `color` seen along `ray` at a surface point with unit `normal`.
    pub fn apply(&self, color: Color, point: Vec3, normal: Vec3, ray: &Ray) -> Color {
        let view = (ray.origin - point).normalized();

        match *self {
            Shader::Basic => color,
            Shader::Phong {
                specular_strength,
                shininess,
            } => {
                let reflected = normal * 2.0 * normal.dot(view) - view;
                let spec = reflected.dot(view).max(0.0).powf(shininess);
                (color + Color::ONE * specular_strength * spec).clamp(Color::ZERO, Color::ONE)
            }
            Shader::Toon {
                levels,
                edge_threshold,
            } => {
                if normal.dot(view).abs() < edge_threshold {
                    return Color::ZERO;
                }
                let step = 1.0 / levels.max(1) as f64;
                (color / step).floor() * step
            }
            Shader::Fresnel { power, rim_color } => {
                let factor = (1.0 - normal.dot(view).abs()).powf(power);
                (color * (1.0 - factor) + rim_color * factor).clamp(Color::ZERO, Color::ONE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_ray() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)
    }

    #[test]
    fn test_basic_is_identity() {
        let c = Color::new(0.3, 2.0, -1.0);
        assert_eq!(Shader::Basic.apply(c, Vec3::ZERO, Vec3::Z, &facing_ray()), c);
    }

    #[test]
    fn test_phong_head_on_adds_full_highlight() {
        let shader = Shader::Phong {
            specular_strength: 0.5,
            shininess: 10.0,
        };
        let c = shader.apply(Color::splat(0.2), Vec3::ZERO, Vec3::Z, &facing_ray());
        assert!((c.x - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_toon_bands_and_edges() {
        let shader = Shader::Toon {
            levels: 4,
            edge_threshold: 0.2,
        };
        let c = shader.apply(Color::new(0.3, 0.6, 0.99), Vec3::ZERO, Vec3::Z, &facing_ray());
        assert!((c - Color::new(0.25, 0.5, 0.75)).length() < 1e-9);

        // Normal perpendicular to the view direction is an edge
        let edge = shader.apply(Color::ONE, Vec3::ZERO, Vec3::X, &facing_ray());
        assert_eq!(edge, Color::ZERO);
    }

    #[test]
    fn test_fresnel_rim() {
        let shader = Shader::Fresnel {
            power: 2.0,
            rim_color: Color::X,
        };
        let head_on = shader.apply(Color::Y, Vec3::ZERO, Vec3::Z, &facing_ray());
        assert!((head_on - Color::Y).length() < 1e-9);

        let grazing = shader.apply(Color::Y, Vec3::ZERO, Vec3::X, &facing_ray());
        assert!((grazing - Color::X).length() < 1e-9);
    }
}
