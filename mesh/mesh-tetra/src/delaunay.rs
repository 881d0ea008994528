//! Incremental Bowyer-Watson tetrahedralization.

use std::collections::HashMap;

use mesh_types::query::circumsphere;
use mesh_types::{Aabb, Point3, TetraFace, Tetrahedron};

/// A tetrahedral element with its cached circumsphere and tombstone flag.
#[derive(Debug, Clone)]
pub(crate) struct TetraData {
    pub vertices: [u32; 4],
    pub center: Point3<f64>,
    pub radius_squared: f64,
    pub deleted: bool,
}

/// Working tetrahedralization: a point arena plus tombstoned elements.
///
/// The four synthetic far vertices of the enclosing tetrahedron sit at the
/// end of the point array, at indices `>= first_far_vertex`.
#[derive(Debug)]
pub(crate) struct DelaunayMesh {
    pub points: Vec<Point3<f64>>,
    pub first_far_vertex: u32,
    pub tets: Vec<TetraData>,
}

impl DelaunayMesh {
    /// Start from the insertion points and one oversized enclosing
    /// tetrahedron whose circumsphere contains the whole working volume.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(points: Vec<Point3<f64>>, bounds: &Aabb) -> Self {
        let first_far_vertex = points.len() as u32;
        let mut mesh = Self {
            points,
            first_far_vertex,
            tets: Vec::new(),
        };

        // Regular tetrahedron with edge 3x the bounding diagonal, centered
        // on the volume.
        let a = 3.0 * bounds.diagonal().max(1.0);
        let x = 0.5 * a;
        let y0 = x / 3.0_f64.sqrt();
        let y1 = x * 3.0_f64.sqrt() - y0;
        let z0 = 0.25 * 6.0_f64.sqrt() * a;
        let z1 = a * 6.0_f64.sqrt() / 3.0 - z0;
        let c = bounds.center();

        mesh.points.push(Point3::new(c.x - x, c.y - y0, c.z - z0));
        mesh.points.push(Point3::new(c.x + x, c.y - y0, c.z - z0));
        mesh.points.push(Point3::new(c.x, c.y + y1, c.z - z0));
        mesh.points.push(Point3::new(c.x, c.y, c.z + z1));

        let f = first_far_vertex;
        mesh.add_tetra([f, f + 1, f + 2, f + 3]);
        mesh
    }

    /// Whether `vertex` is one of the synthetic far vertices.
    pub fn is_far_vertex(&self, vertex: u32) -> bool {
        vertex >= self.first_far_vertex
    }

    /// Append an element, caching its circumsphere.
    ///
    /// Returns the element index. A numerically flat element gets an
    /// unbounded circumsphere so the next insertion clears it away.
    pub fn add_tetra(&mut self, vertices: [u32; 4]) -> usize {
        let [p0, p1, p2, p3] = self.corner_positions(&vertices);
        let (center, radius_squared) = circumsphere(&p0, &p1, &p2, &p3).unwrap_or((
            Point3::from((p0.coords + p1.coords + p2.coords + p3.coords) / 4.0),
            f64::INFINITY,
        ));
        let index = self.tets.len();
        self.tets.push(TetraData {
            vertices,
            center,
            radius_squared,
            deleted: false,
        });
        index
    }

    pub fn delete_tetra(&mut self, index: usize) {
        self.tets[index].deleted = true;
    }

    /// Indices of live elements.
    pub fn live(&self) -> impl Iterator<Item = usize> + '_ {
        self.tets
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.deleted)
            .map(|(i, _)| i)
    }

    pub fn live_count(&self) -> usize {
        self.tets.iter().filter(|t| !t.deleted).count()
    }

    pub fn corner_positions(&self, vertices: &[u32; 4]) -> [Point3<f64>; 4] {
        [
            self.points[vertices[0] as usize],
            self.points[vertices[1] as usize],
            self.points[vertices[2] as usize],
            self.points[vertices[3] as usize],
        ]
    }

    /// Signed volume of an element.
    pub fn volume(&self, index: usize) -> f64 {
        let [p0, p1, p2, p3] = self.corner_positions(&self.tets[index].vertices);
        Tetrahedron::signed_volume(&p0, &p1, &p2, &p3)
    }

    /// Shape quality `6 * sqrt(2) * |V| / e^3` of the element spanned by
    /// four point indices (1.0 for a regular tetrahedron).
    pub fn quality_of(&self, vertices: [u32; 4]) -> f64 {
        let points = self.corner_positions(&vertices);
        let volume = Tetrahedron::signed_volume(&points[0], &points[1], &points[2], &points[3]);
        let mut longest: f64 = 0.0;
        for [a, b] in mesh_types::TET_EDGES {
            longest = longest.max((points[a] - points[b]).norm());
        }
        if longest <= 0.0 {
            return 0.0;
        }
        6.0 * std::f64::consts::SQRT_2 * volume.abs() / (longest * longest * longest)
    }

    /// Insert one point: remove every element whose circumsphere contains
    /// it, then re-triangulate the cavity boundary fan-wise around the
    /// point.
    ///
    /// Faces shared by two removed elements cancel (orientation-independent
    /// equality); the surviving faces form the cavity boundary.
    pub fn insert_vertex(&mut self, vertex: u32) {
        let point = self.points[vertex as usize];

        let mut boundary: HashMap<TetraFace, (TetraFace, u32)> = HashMap::new();
        for index in 0..self.tets.len() {
            if self.tets[index].deleted {
                continue;
            }
            let d = point - self.tets[index].center;
            if d.norm_squared() >= self.tets[index].radius_squared {
                continue;
            }
            self.tets[index].deleted = true;
            let [v0, v1, v2, v3] = self.tets[index].vertices;
            for face in Tetrahedron::new(v0, v1, v2, v3).faces() {
                boundary
                    .entry(face)
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert((face, 1));
            }
        }

        for (face, count) in boundary.into_values() {
            if count != 1 {
                continue;
            }
            // The stored winding faces out of the removed region, so the
            // reversed face plus the new point is positively oriented.
            let [f0, f1, f2] = face.vertices;
            self.add_tetra([f2, f1, f0, vertex]);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_types::query::point_in_tetrahedron;

    /// Cube corners with a small deterministic skew so no four points are
    /// coplanar and no five co-spherical.
    fn cube_corners() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        let mut salt = 0.0;
        for z in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for x in [0.0, 1.0] {
                    salt += 0.003;
                    points.push(Point3::new(x + salt, y + 2.0 * salt, z - salt));
                }
            }
        }
        points
    }

    fn triangulate(points: Vec<Point3<f64>>) -> DelaunayMesh {
        let bounds = Aabb::from_points(points.iter());
        let count = points.len() as u32;
        let mut mesh = DelaunayMesh::new(points, &bounds);
        for v in 0..count {
            mesh.insert_vertex(v);
        }
        mesh
    }

    #[test]
    fn test_enclosing_tetra_contains_volume() {
        let bounds = Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let mesh = DelaunayMesh::new(cube_corners(), &bounds);

        assert_eq!(mesh.live_count(), 1);
        assert!(mesh.volume(0) > 0.0);

        let corners = mesh.corner_positions(&mesh.tets[0].vertices);
        for p in cube_corners() {
            assert!(point_in_tetrahedron(&p, &corners, 1e-9));
        }
    }

    #[test]
    fn test_all_volumes_non_negative_after_insertions() {
        let mesh = triangulate(cube_corners());
        for index in mesh.live() {
            assert!(mesh.volume(index) >= 0.0, "negative element {index}");
        }
    }

    #[test]
    fn test_inserted_points_covered() {
        // Every inserted point must lie in some live element.
        let points = cube_corners();
        let mesh = triangulate(points.clone());
        for p in &points {
            let covered = mesh.live().any(|i| {
                let corners = mesh.corner_positions(&mesh.tets[i].vertices);
                point_in_tetrahedron(p, &corners, 1e-9)
            });
            assert!(covered);
        }
    }

    #[test]
    fn test_empty_circumsphere_property() {
        // No live element's circumsphere strictly contains another inserted
        // point (the Delaunay invariant, up to tolerance).
        let points = cube_corners();
        let mesh = triangulate(points.clone());
        for i in mesh.live() {
            for p in &points {
                let tet = &mesh.tets[i];
                if tet
                    .vertices
                    .iter()
                    .any(|&v| (mesh.points[v as usize] - p).norm_squared() < 1e-18)
                {
                    continue;
                }
                let d = (p - tet.center).norm_squared();
                assert!(d >= tet.radius_squared * (1.0 - 1e-9));
            }
        }
    }

    #[test]
    fn test_quality_of_regular_tet() {
        let points = vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, -1.0),
            Point3::new(-1.0, 1.0, -1.0),
            Point3::new(-1.0, -1.0, 1.0),
        ];
        let bounds = Aabb::from_points(points.iter());
        let mesh = DelaunayMesh::new(points, &bounds);
        let q = mesh.quality_of([0, 1, 2, 3]);
        assert!((q - 1.0).abs() < 1e-12);
    }
}
