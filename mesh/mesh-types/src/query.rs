//! Geometric predicates shared by the meshing pipeline.
//!
//! Closest-point and ray queries against triangles, plus the circumsphere
//! and barycentric predicates used during tetrahedralization.

use nalgebra::{Matrix3, Point3, Vector3};

/// Tolerance below which a ray is considered parallel to a triangle.
const RAY_EPSILON: f64 = 1e-10;

/// Compute the closest point on a triangle to a query point.
///
/// This implements the algorithm from "Real-Time Collision Detection" by
/// Christer Ericson.
#[must_use]
pub fn closest_point_on_triangle(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Point3<f64> {
    let ab = v1 - v0;
    let ac = v2 - v0;
    let ap = point - v0;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);

    // Vertex region outside A
    if d1 <= 0.0 && d2 <= 0.0 {
        return v0;
    }

    let bp = point - v1;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);

    // Vertex region outside B
    if d3 >= 0.0 && d4 <= d3 {
        return v1;
    }

    // Edge region AB
    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return v0 + ab * v;
    }

    let cp = point - v2;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);

    // Vertex region outside C
    if d6 >= 0.0 && d5 <= d6 {
        return v2;
    }

    // Edge region AC
    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return v0 + ac * w;
    }

    // Edge region BC
    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return v1 + (v2 - v1) * w;
    }

    // Inside the face region
    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;

    v0 + ab * v + ac * w
}

/// Squared distance from a point to a triangle.
#[must_use]
pub fn point_triangle_distance_squared(
    point: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> f64 {
    (point - closest_point_on_triangle(point, v0, v1, v2)).norm_squared()
}

/// Squared distance from a point to a line segment.
#[must_use]
pub fn point_segment_distance_squared(point: Point3<f64>, a: Point3<f64>, b: Point3<f64>) -> f64 {
    let ab = b - a;
    let ap = point - a;

    let t = ap.dot(&ab) / ab.norm_squared().max(f64::EPSILON);
    let t_clamped = t.clamp(0.0, 1.0);

    let closest = a + ab * t_clamped;
    (point - closest).norm_squared()
}

/// Test if a ray intersects a triangle.
///
/// Uses the Möller–Trumbore algorithm. `ray_dir` does not need to be
/// normalized; the returned parameter is in units of `ray_dir`.
///
/// Returns `Some(t)` with `t > 0` at the hit, or `None` for a miss or a ray
/// parallel to the triangle plane.
#[must_use]
pub fn ray_triangle_intersect(
    ray_origin: Point3<f64>,
    ray_dir: Vector3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray_dir.cross(&edge2);
    let a = edge1.dot(&h);

    // Ray parallel to triangle
    if a.abs() < RAY_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray_dir.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);

    if t > RAY_EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Test if a line segment from `a` to `b` crosses a triangle.
///
/// Returns the parameter `t` in `(0, 1]` along the segment at the crossing.
#[must_use]
pub fn segment_triangle_intersect(
    a: Point3<f64>,
    b: Point3<f64>,
    v0: Point3<f64>,
    v1: Point3<f64>,
    v2: Point3<f64>,
) -> Option<f64> {
    let t = ray_triangle_intersect(a, b - a, v0, v1, v2)?;
    if t <= 1.0 {
        Some(t)
    } else {
        None
    }
}

/// Circumsphere of four points: the center and squared radius of the unique
/// sphere through all of them.
///
/// Returns `None` when the points are (numerically) coplanar and no such
/// sphere exists.
#[must_use]
pub fn circumsphere(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> Option<(Point3<f64>, f64)> {
    let b = p1 - p0;
    let c = p2 - p0;
    let d = p3 - p0;

    let m = Matrix3::from_rows(&[b.transpose(), c.transpose(), d.transpose()]);
    let rhs = Vector3::new(
        0.5 * b.norm_squared(),
        0.5 * c.norm_squared(),
        0.5 * d.norm_squared(),
    );

    let inv = m.try_inverse()?;
    let offset = inv * rhs;
    let center = p0 + offset;
    Some((center, offset.norm_squared()))
}

/// Barycentric coordinates of `point` with respect to a tetrahedron.
///
/// Returns `None` for a degenerate (flat) tetrahedron. The four weights sum
/// to 1; they are all non-negative exactly when the point lies inside.
#[must_use]
pub fn barycentric_coordinates(point: &Point3<f64>, corners: &[Point3<f64>; 4]) -> Option<[f64; 4]> {
    let b = corners[1] - corners[0];
    let c = corners[2] - corners[0];
    let d = corners[3] - corners[0];

    let m = Matrix3::from_columns(&[b, c, d]);
    let inv = m.try_inverse()?;
    let w = inv * (point - corners[0]);

    Some([1.0 - w.x - w.y - w.z, w.x, w.y, w.z])
}

/// Whether `point` lies inside (or on the boundary of) a tetrahedron, within
/// tolerance `eps` on the barycentric weights.
#[must_use]
pub fn point_in_tetrahedron(point: &Point3<f64>, corners: &[Point3<f64>; 4], eps: f64) -> bool {
    barycentric_coordinates(point, corners)
        .is_some_and(|bary| bary.iter().all(|&w| w >= -eps))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simple_triangle() -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(5.0, 10.0, 0.0),
        )
    }

    fn unit_tet() -> [Point3<f64>; 4] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
    }

    #[test]
    fn closest_point_inside_triangle() {
        let (v0, v1, v2) = simple_triangle();
        let point = Point3::new(5.0, 3.0, 5.0);

        let closest = closest_point_on_triangle(point, v0, v1, v2);

        assert_relative_eq!(closest.z, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-10);
        assert_relative_eq!(closest.y, 3.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_vertex_region() {
        let (v0, v1, v2) = simple_triangle();

        let point = Point3::new(-5.0, -5.0, 0.0);
        let closest = closest_point_on_triangle(point, v0, v1, v2);

        assert_relative_eq!(closest.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn closest_point_edge_region() {
        let (v0, v1, v2) = simple_triangle();

        let point = Point3::new(5.0, -5.0, 0.0);
        let closest = closest_point_on_triangle(point, v0, v1, v2);

        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(closest.x, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn triangle_distance() {
        let (v0, v1, v2) = simple_triangle();
        let d2 = point_triangle_distance_squared(Point3::new(5.0, 3.0, 4.0), v0, v1, v2);
        assert_relative_eq!(d2, 16.0, epsilon = 1e-10);
    }

    #[test]
    fn ray_hits_triangle() {
        let (v0, v1, v2) = simple_triangle();
        let hit = ray_triangle_intersect(
            Point3::new(5.0, 3.0, 5.0),
            Vector3::new(0.0, 0.0, -1.0),
            v0,
            v1,
            v2,
        );
        assert_relative_eq!(hit.unwrap(), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn ray_misses_triangle() {
        let (v0, v1, v2) = simple_triangle();
        let hit = ray_triangle_intersect(
            Point3::new(100.0, 100.0, 5.0),
            Vector3::new(0.0, 0.0, -1.0),
            v0,
            v1,
            v2,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn ray_parallel_to_triangle() {
        let (v0, v1, v2) = simple_triangle();
        let hit = ray_triangle_intersect(
            Point3::new(5.0, 3.0, 5.0),
            Vector3::new(1.0, 0.0, 0.0),
            v0,
            v1,
            v2,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn segment_crossing() {
        let (v0, v1, v2) = simple_triangle();
        let a = Point3::new(5.0, 3.0, 2.0);
        let b = Point3::new(5.0, 3.0, -2.0);
        let t = segment_triangle_intersect(a, b, v0, v1, v2).unwrap();
        assert_relative_eq!(t, 0.5, epsilon = 1e-10);

        // Segment stopping short of the plane
        let c = Point3::new(5.0, 3.0, 1.0);
        assert!(segment_triangle_intersect(a, c, v0, v1, v2).is_none());
    }

    #[test]
    fn segment_distance_midpoint() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(10.0, 0.0, 0.0);
        let point = Point3::new(5.0, 5.0, 0.0);
        assert_relative_eq!(
            point_segment_distance_squared(point, a, b),
            25.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn circumsphere_of_regular_points() {
        let (center, r2) = circumsphere(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(-1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(0.0, 0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(center.coords.norm(), 0.0, epsilon = 1e-10);
        assert_relative_eq!(r2, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn circumsphere_of_coplanar_points_is_none() {
        let result = circumsphere(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
        );
        assert!(result.is_none());
    }

    #[test]
    fn barycentric_at_corners_and_center() {
        let corners = unit_tet();
        let at_v0 = barycentric_coordinates(&corners[0], &corners).unwrap();
        assert_relative_eq!(at_v0[0], 1.0, epsilon = 1e-12);

        let center = Point3::new(0.25, 0.25, 0.25);
        let bary = barycentric_coordinates(&center, &corners).unwrap();
        for w in bary {
            assert_relative_eq!(w, 0.25, epsilon = 1e-12);
        }
    }

    #[test]
    fn point_in_tetrahedron_classification() {
        let corners = unit_tet();
        assert!(point_in_tetrahedron(
            &Point3::new(0.2, 0.2, 0.2),
            &corners,
            0.0
        ));
        assert!(!point_in_tetrahedron(
            &Point3::new(0.5, 0.5, 0.5),
            &corners,
            0.0
        ));
        // On a face, with tolerance
        assert!(point_in_tetrahedron(
            &Point3::new(0.2, 0.2, 0.0),
            &corners,
            1e-12
        ));
    }
}
