//! Quadric error metric.
//!
//! A quadric summarizes the squared distances from a point to a set of
//! planes. Each vertex accumulates the quadrics of its adjacent faces; the
//! cost of merging two vertices is the summed quadric evaluated at the merge
//! position.

use nalgebra::Point3;

/// Quadric error matrix (4x4 symmetric matrix stored as 10 values).
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadric {
    // Symmetric 4x4 matrix stored as upper triangle:
    // [a b c d]
    // [  e f g]
    // [    h i]
    // [      j]
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
    j: f64,
}

impl Quadric {
    /// Create a quadric from a plane equation (ax + by + cz + d = 0).
    ///
    /// The plane normal (a, b, c) should be normalized so the quadric
    /// measures true squared distances.
    #[must_use]
    pub fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            a: a * a,
            b: a * b,
            c: a * c,
            d: a * d,
            e: b * b,
            f: b * c,
            g: b * d,
            h: c * c,
            i: c * d,
            j: d * d,
        }
    }

    /// Create the plane quadric of a triangle, or `None` for a degenerate
    /// (zero-area) triangle.
    #[must_use]
    pub fn from_triangle(v0: &Point3<f64>, v1: &Point3<f64>, v2: &Point3<f64>) -> Option<Self> {
        let normal = (v1 - v0).cross(&(v2 - v0));
        let len = normal.norm();
        if len < 1e-10 {
            return None;
        }
        let n = normal / len;
        let d = -n.dot(&v0.coords);
        Some(Self::from_plane(n.x, n.y, n.z, d))
    }

    /// Add another quadric to this one.
    pub fn add(&mut self, other: &Self) {
        self.a += other.a;
        self.b += other.b;
        self.c += other.c;
        self.d += other.d;
        self.e += other.e;
        self.f += other.f;
        self.g += other.g;
        self.h += other.h;
        self.i += other.i;
        self.j += other.j;
    }

    /// Evaluate the quadric error for a point.
    ///
    /// Returns the sum of squared distances from the point to all planes
    /// that contributed to this quadric.
    #[must_use]
    pub fn evaluate(&self, point: &Point3<f64>) -> f64 {
        let (x, y, z) = (point.x, point.y, point.z);
        // v^T * Q * v where v = [x, y, z, 1]
        x.mul_add(
            x.mul_add(self.a, 2.0 * y.mul_add(self.b, z.mul_add(self.c, self.d))),
            y.mul_add(
                y.mul_add(self.e, 2.0 * z.mul_add(self.f, self.g)),
                z.mul_add(z.mul_add(self.h, 2.0 * self.i), self.j),
            ),
        )
    }

    /// Find the cheapest of `samples + 1` candidate positions spaced linearly
    /// from `p0` to `p1`.
    ///
    /// Returns `(cost, ratio)` where `ratio` is the interpolation parameter
    /// of the winning sample. Sampling sidesteps the closed-form optimum,
    /// which requires inverting a potentially singular 3x3 system.
    #[must_use]
    pub fn sampled_minimum(&self, p0: &Point3<f64>, p1: &Point3<f64>, samples: u32) -> (f64, f64) {
        let steps = samples.max(1);
        let mut best_cost = f64::INFINITY;
        let mut best_ratio = 0.0;
        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            let candidate = Point3::from(p0.coords.lerp(&p1.coords, t));
            let cost = self.evaluate(&candidate);
            if cost < best_cost {
                best_cost = cost;
                best_ratio = t;
            }
        }
        (best_cost, best_ratio)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_quadric() {
        let q = Quadric::default();
        assert!(q.evaluate(&Point3::new(1.0, 2.0, 3.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_plane_distance() {
        // Plane z = 0
        let q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);

        assert!(q.evaluate(&Point3::new(1.0, 2.0, 0.0)).abs() < 1e-10);
        assert_relative_eq!(q.evaluate(&Point3::new(0.0, 0.0, 2.0)), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_from_triangle() {
        let q = Quadric::from_triangle(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 1.0),
            &Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        // Plane z = 1
        assert!(q.evaluate(&Point3::new(5.0, -3.0, 1.0)).abs() < 1e-10);
        assert_relative_eq!(q.evaluate(&Point3::new(0.0, 0.0, 3.0)), 4.0, epsilon = 1e-10);
    }

    #[test]
    fn test_degenerate_triangle_has_no_quadric() {
        let q = Quadric::from_triangle(
            &Point3::origin(),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert!(q.is_none());
    }

    #[test]
    fn test_add_accumulates() {
        let mut q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);
        q.add(&Quadric::from_plane(0.0, 1.0, 0.0, 0.0));

        assert!(q.evaluate(&Point3::origin()).abs() < 1e-10);
        // Off both planes: errors add.
        assert_relative_eq!(q.evaluate(&Point3::new(0.0, 1.0, 1.0)), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_sampled_minimum_prefers_plane() {
        // Plane z = 0; p0 above it, p1 on it. The best sample is p1.
        let q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);
        let (cost, ratio) = q.sampled_minimum(
            &Point3::new(0.0, 0.0, 1.0),
            &Point3::new(1.0, 0.0, 0.0),
            10,
        );
        assert_relative_eq!(cost, 0.0, epsilon = 1e-10);
        assert_relative_eq!(ratio, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_sampled_minimum_interior_sample() {
        // Two parallel planes z = 0 and z = 1; minimum is halfway.
        let mut q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);
        q.add(&Quadric::from_plane(0.0, 0.0, 1.0, -1.0));
        let (_, ratio) = q.sampled_minimum(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 1.0),
            10,
        );
        assert_relative_eq!(ratio, 0.5, epsilon = 1e-10);
    }
}
