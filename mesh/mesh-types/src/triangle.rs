//! Concrete triangle with resolved vertex positions.

use crate::Aabb;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A triangle with three vertex positions.
///
/// Unlike a face of an [`crate::IndexedMesh`] (which stores indices), a
/// `Triangle` owns its positions and can answer geometric queries directly.
///
/// # Example
///
/// ```
/// use mesh_types::{Triangle, Point3};
///
/// let tri = Triangle::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// );
///
/// assert!((tri.area() - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// First vertex.
    pub a: Point3<f64>,
    /// Second vertex.
    pub b: Point3<f64>,
    /// Third vertex.
    pub c: Point3<f64>,
}

impl Triangle {
    /// Create a triangle from three vertex positions.
    #[inline]
    #[must_use]
    pub const fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self { a, b, c }
    }

    /// The (non-normalized) face normal `(b - a) × (c - a)`.
    #[must_use]
    pub fn normal_raw(&self) -> Vector3<f64> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// The unit face normal, or `None` for a degenerate triangle.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_raw();
        let len = n.norm();
        if len < 1e-12 {
            None
        } else {
            Some(n / len)
        }
    }

    /// The triangle area.
    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * self.normal_raw().norm()
    }

    /// The triangle centroid.
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::new(
            (self.a.x + self.b.x + self.c.x) / 3.0,
            (self.a.y + self.b.y + self.c.y) / 3.0,
            (self.a.z + self.b.z + self.c.z) / 3.0,
        )
    }

    /// The axis-aligned bounding box of the three vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::from_point(self.a);
        aabb.expand_to_include(&self.b);
        aabb.expand_to_include(&self.c);
        aabb
    }
}
