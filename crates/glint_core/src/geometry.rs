//! Scene primitives.

use glam::Vec3;
use serde::Serialize;

use crate::Material;

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sphere {
    pub material: Material,
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere. The radius is expected to be positive; a
    /// non-positive radius gives an invisible sphere.
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            material,
            center,
            radius,
        }
    }

    /// Return a copy moved by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            center: self.center + offset,
            ..*self
        }
    }
}

/// A finite planar patch spanned by corner `q` and edges `u`, `v`.
///
/// `normal`, `d` and `w` are derived together in `new` and are only valid as
/// a triple, so the geometry is read-only once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quad {
    pub material: Material,
    q: Vec3,
    u: Vec3,
    v: Vec3,
    normal: Vec3,
    d: f32,
    w: Vec3,
}

impl Quad {
    /// Create a new quad and derive its plane.
    ///
    /// Parallel edges give a zero-area quad with a NaN normal; this is not
    /// checked.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: Material) -> Self {
        let n = u.cross(v);
        let normal = n.normalize();
        Self {
            material,
            q,
            u,
            v,
            normal,
            d: normal.dot(q),
            w: n / n.dot(n),
        }
    }

    /// The all-zero quad used for unpopulated slots. The shader treats it
    /// as contributing nothing.
    pub fn inert() -> Self {
        Self {
            material: Material::Diffuse { albedo: Vec3::ZERO },
            q: Vec3::ZERO,
            u: Vec3::ZERO,
            v: Vec3::ZERO,
            normal: Vec3::ZERO,
            d: 0.0,
            w: Vec3::ZERO,
        }
    }

    /// Return a copy moved by `offset`, with the plane re-derived.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.q + offset, self.u, self.v, self.material)
    }

    #[inline]
    pub fn q(&self) -> Vec3 {
        self.q
    }

    #[inline]
    pub fn u(&self) -> Vec3 {
        self.u
    }

    #[inline]
    pub fn v(&self) -> Vec3 {
        self.v
    }

    /// Unit normal of the supporting plane.
    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Plane offset: `normal · p == d` for every point `p` on the plane.
    #[inline]
    pub fn d(&self) -> f32 {
        self.d
    }

    /// `cross(u, v) / |cross(u, v)|²`, used to project a hit point onto
    /// the (alpha, beta) patch coordinates.
    #[inline]
    pub fn w(&self) -> Vec3 {
        self.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_triple_consistent(quad: &Quad) {
        assert!((quad.normal().dot(quad.q()) - quad.d()).abs() < 1e-4);
        assert!((quad.u().cross(quad.v()).dot(quad.w()) - 1.0).abs() < 1e-4);
        assert!((quad.normal().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_quad_derived_triple() {
        let quad = Quad::new(
            Vec3::new(2.5, -2.5, -2.5),
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 5.0),
            Material::checker(1.2),
        );

        assert_triple_consistent(&quad);
        // cross(-X, +Z) = +Y
        assert!((quad.normal() - Vec3::Y).length() < 1e-5);
        assert!((quad.d() + 2.5).abs() < 1e-5);
        assert!((quad.w() - Vec3::new(0.0, 1.0 / 25.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_quad_triple_skewed_edges() {
        let quad = Quad::new(
            Vec3::new(0.3, 1.7, -4.0),
            Vec3::new(1.0, 2.0, 0.5),
            Vec3::new(-0.5, 0.25, 3.0),
            Material::default(),
        );
        assert_triple_consistent(&quad);
    }

    #[test]
    fn test_translated_quad_rederives_plane() {
        let quad = Quad::new(Vec3::ZERO, Vec3::X, Vec3::Z, Material::default());
        let moved = quad.translated(Vec3::new(0.0, 3.0, 0.0));

        assert_eq!(moved.q(), Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(moved.normal(), quad.normal());
        assert!((moved.d() - moved.normal().dot(moved.q())).abs() < 1e-6);
        assert_ne!(moved.d(), quad.d());
    }

    #[test]
    fn test_inert_quad_is_zero() {
        let quad = Quad::inert();
        assert_eq!(quad.w(), Vec3::ZERO);
        assert_eq!(quad.normal(), Vec3::ZERO);
        assert_eq!(quad.material.flatten(), Default::default());
    }

    #[test]
    fn test_sphere_translated() {
        let sphere = Sphere::new(Vec3::ZERO, 0.45, Material::dielectric(1.5));
        let moved = sphere.translated(Vec3::Y);
        assert_eq!(moved.center, Vec3::Y);
        assert_eq!(moved.radius, 0.45);
        assert_eq!(moved.material, sphere.material);
    }
}
