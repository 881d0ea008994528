//! Triangulating the cut lattice into tetrahedra.
//!
//! Each cell is processed in three sweep directions (x, y, z). A sweep
//! decomposes one "wedge" per cube face quadrant: the tetrahedron spanned by
//! two adjacent corner points and the two center points on either side of
//! the face, together with up to 6 cut candidates on its edges. The wedge's
//! side triangles are split by direct case analysis of which edges are cut;
//! the resulting closed triangle shell is then chopped corner by corner into
//! tetrahedra by a generic polygon-closing step.

use std::collections::HashMap;

use mesh_types::{Point3, ProgressContext, TetMesh, Tetrahedron, Vertex};

use crate::error::{StuffError, StuffResult};
use crate::grid::{Grid, NO_VERTEX};

/// A sub-triangle of a wedge's surface: three point ids with the signed
/// density at each. Cut points carry density zero.
#[derive(Debug, Clone, Copy)]
struct WedgeTriangle {
    p: [u32; 3],
    d: [f64; 3],
}

impl WedgeTriangle {
    const fn new(p0: u32, p1: u32, p2: u32, d0: f64, d1: f64, d2: f64) -> Self {
        Self {
            p: [p0, p1, p2],
            d: [d0, d1, d2],
        }
    }

    fn contains(&self, point: u32) -> bool {
        self.p.contains(&point)
    }

    fn density_of(&self, point: u32) -> f64 {
        for i in 0..3 {
            if self.p[i] == point {
                return self.d[i];
            }
        }
        0.0
    }
}

/// Accumulates output vertices and tetrahedra while wedges are processed.
struct WedgeMesher {
    vertices: Vec<Point3<f64>>,
    tetrahedra: Vec<Tetrahedron>,
}

impl WedgeMesher {
    /// Emit the tetrahedron `(apex, triangle)` unless any of its corners is
    /// outside (negative density), flipping it positive if needed.
    fn add_tetra(&mut self, apex: u32, density: f64, triangle: &WedgeTriangle) {
        if density < 0.0 || triangle.d.iter().any(|&d| d < 0.0) {
            return;
        }
        let mut tetra = Tetrahedron::new(apex, triangle.p[0], triangle.p[1], triangle.p[2]);
        let [q0, q1, q2, q3] = tetra.vertices.map(|v| self.vertices[v as usize]);
        if Tetrahedron::signed_volume(&q0, &q1, &q2, &q3) < 0.0 {
            tetra.vertices.swap(0, 1);
        }
        self.tetrahedra.push(tetra);
    }

    /// Split one wedge face into sub-triangles according to its cuts.
    ///
    /// The face's long edge must come first (`p0`-`p1`); `cab`, `cbc`, `cca`
    /// are the cut ids on edges `p0`-`p1`, `p1`-`p2` and `p2`-`p0`
    /// (`NO_VERTEX` when uncut). A face has at most 2 cuts; the ambiguous
    /// two-short-cuts case is resolved by comparing the cut ids, which is
    /// arbitrary but deterministic and consistent between adjacent wedges.
    #[allow(clippy::too_many_arguments, clippy::similar_names)]
    fn add_face_triangles(
        &self,
        triangles: &mut Vec<WedgeTriangle>,
        p0: u32,
        p1: u32,
        p2: u32,
        d0: f64,
        d1: f64,
        d2: f64,
        c01: u32,
        c12: u32,
        c20: u32,
    ) {
        let cuts =
            usize::from(c01 != NO_VERTEX) + usize::from(c12 != NO_VERTEX) + usize::from(c20 != NO_VERTEX);
        debug_assert!(cuts < 3, "three cuts on one face");

        match cuts {
            0 => triangles.push(WedgeTriangle::new(p0, p1, p2, d0, d1, d2)),
            1 => {
                if c01 != NO_VERTEX {
                    triangles.push(WedgeTriangle::new(c01, p2, p0, 0.0, d2, d0));
                    triangles.push(WedgeTriangle::new(c01, p1, p2, 0.0, d1, d2));
                } else if c12 != NO_VERTEX {
                    triangles.push(WedgeTriangle::new(c12, p0, p1, 0.0, d0, d1));
                    triangles.push(WedgeTriangle::new(c12, p2, p0, 0.0, d2, d0));
                } else {
                    triangles.push(WedgeTriangle::new(c20, p1, p2, 0.0, d1, d2));
                    triangles.push(WedgeTriangle::new(c20, p0, p1, 0.0, d0, d1));
                }
            }
            _ => {
                if c12 == NO_VERTEX {
                    // Cuts on the long edge and on p2-p0.
                    triangles.push(WedgeTriangle::new(p0, c01, c20, d0, 0.0, 0.0));
                    triangles.push(WedgeTriangle::new(c01, p2, c20, 0.0, d2, 0.0));
                    triangles.push(WedgeTriangle::new(c01, p1, p2, 0.0, d1, d2));
                } else if c20 == NO_VERTEX {
                    // Cuts on the long edge and on p1-p2.
                    triangles.push(WedgeTriangle::new(p0, c01, p2, d0, 0.0, d2));
                    triangles.push(WedgeTriangle::new(c01, c12, p2, 0.0, 0.0, d2));
                    triangles.push(WedgeTriangle::new(c01, p1, c12, 0.0, d1, 0.0));
                } else {
                    // Both short edges cut: ambiguous quad.
                    triangles.push(WedgeTriangle::new(c20, c12, p2, 0.0, 0.0, d2));
                    if c20 > c12 {
                        triangles.push(WedgeTriangle::new(p0, c12, c20, d0, 0.0, 0.0));
                        triangles.push(WedgeTriangle::new(p0, p1, c12, d0, d1, 0.0));
                    } else {
                        triangles.push(WedgeTriangle::new(p0, p1, c20, d0, d1, 0.0));
                        triangles.push(WedgeTriangle::new(p1, c12, c20, d1, 0.0, 0.0));
                    }
                }
            }
        }
    }

    /// Decompose one wedge into tetrahedra.
    ///
    /// The wedge is the tetrahedron `(p0, p1, p2, p3)` whose long edges are
    /// `p0`-`p3` (corner-corner) and `p1`-`p2` (center-center); `cuts` holds
    /// the cut ids of edges 01, 12, 20, 03, 13, 23. Corners outside the
    /// surface carry `NO_VERTEX` and a negative density; they get temporary
    /// ids so the shell stays closed, and never reach the output.
    fn handle_wedge(&mut self, corners: [(u32, f64); 4], cuts: [u32; 6]) {
        let [(mut p0, d0), (mut p1, d1), (mut p2, d2), (mut p3, d3)] = corners;
        if d0 < 0.0 && d1 < 0.0 && d2 < 0.0 && d3 < 0.0 {
            return;
        }
        let [c01, c12, c20, c03, c13, c23] = cuts;

        #[allow(clippy::cast_possible_truncation)]
        let base = self.vertices.len() as u32;
        if p0 == NO_VERTEX {
            p0 = base;
        }
        if p1 == NO_VERTEX {
            p1 = base + 1;
        }
        if p2 == NO_VERTEX {
            p2 = base + 2;
        }
        if p3 == NO_VERTEX {
            p3 = base + 3;
        }

        // The wedge's closed shell, long edge first on every face.
        let mut triangles: Vec<WedgeTriangle> = Vec::with_capacity(12);
        self.add_face_triangles(&mut triangles, p2, p1, p0, d2, d1, d0, c12, c01, c20);
        self.add_face_triangles(&mut triangles, p3, p0, p1, d3, d0, d1, c03, c01, c13);
        self.add_face_triangles(&mut triangles, p1, p2, p3, d1, d2, d3, c12, c23, c13);
        self.add_face_triangles(&mut triangles, p0, p3, p2, d0, d3, d2, c03, c23, c20);

        let mut points: Vec<u32> = [p0, p1, p2, p3, c01, c12, c20, c03, c13, c23]
            .into_iter()
            .filter(|&p| p != NO_VERTEX)
            .collect();

        // Chop corners off the shell until nothing is left, preferring the
        // corner with the fewest adjacent triangles; ties favor corners with
        // non-zero density so snapped and cut points close out last.
        while points.len() > 3 {
            let mut chop: Option<(usize, usize)> = None;
            for (slot, &point) in points.iter().enumerate() {
                let mut adjacent = 0;
                let mut zero = true;
                for t in &triangles {
                    if t.contains(point) {
                        adjacent += 1;
                        if t.density_of(point) != 0.0 {
                            zero = false;
                        }
                    }
                }
                if zero {
                    continue;
                }
                if chop.is_none_or(|(_, best)| adjacent < best) {
                    chop = Some((slot, adjacent));
                }
            }
            for (slot, &point) in points.iter().enumerate() {
                let adjacent = triangles.iter().filter(|t| t.contains(point)).count();
                if chop.is_none_or(|(_, best)| adjacent < best) {
                    chop = Some((slot, adjacent));
                }
            }
            let Some((slot, adjacent)) = chop else {
                break;
            };
            let point = points[slot];

            // Remove the fan around the chopped corner, keeping its boundary
            // edges and corner densities for the closing step.
            let mut hole: Vec<(u32, u32)> = Vec::new();
            let mut densities: HashMap<u32, f64> = HashMap::new();
            let mut chop_density = 0.0;
            let mut i = 0;
            while i < triangles.len() {
                if triangles[i].contains(point) {
                    let t = triangles.swap_remove(i);
                    let k = t.p.iter().position(|&p| p == point).unwrap_or(0);
                    let a = (k + 1) % 3;
                    let b = (k + 2) % 3;
                    hole.push((t.p[a], t.p[b]));
                    densities.insert(t.p[a], t.d[a]);
                    densities.insert(t.p[b], t.d[b]);
                    chop_density = t.d[k];
                } else {
                    i += 1;
                }
            }

            if let Some(polygon) = chain_hole(hole) {
                let density = |p: u32| densities.get(&p).copied().unwrap_or(0.0);
                if adjacent == 3 && polygon.len() == 3 {
                    let tri = WedgeTriangle::new(
                        polygon[0],
                        polygon[1],
                        polygon[2],
                        density(polygon[0]),
                        density(polygon[1]),
                        density(polygon[2]),
                    );
                    self.add_tetra(point, chop_density, &tri);
                    triangles.push(tri);
                } else if adjacent == 4 && polygon.len() == 4 {
                    let (tri0, tri1) = split_quad(&polygon, &density, c12, c03);
                    self.add_tetra(point, chop_density, &tri0);
                    self.add_tetra(point, chop_density, &tri1);
                    triangles.push(tri0);
                    triangles.push(tri1);
                }
            }
            points.swap_remove(slot);
        }
    }
}

/// Chain hole boundary edges into a closed polygon, or `None` when the
/// edges do not form a single loop.
fn chain_hole(mut edges: Vec<(u32, u32)>) -> Option<Vec<u32>> {
    let (start, mut end) = edges.pop()?;
    let mut polygon = vec![start, end];
    while !edges.is_empty() {
        let pos = edges.iter().position(|&(a, _)| a == end)?;
        end = edges.swap_remove(pos).1;
        polygon.push(end);
    }
    if polygon.first() != polygon.last() {
        return None;
    }
    polygon.pop();
    if polygon.len() < 3 {
        return None;
    }
    Some(polygon)
}

/// Split a 4-sided hole into two triangles, preferring a diagonal anchored
/// at a long-edge cut so adjacent wedges agree on the split.
fn split_quad(
    polygon: &[u32],
    density: &dyn Fn(u32) -> f64,
    long_cut_a: u32,
    long_cut_b: u32,
) -> (WedgeTriangle, WedgeTriangle) {
    let anchored = |v: u32| v != NO_VERTEX && (v == long_cut_a || v == long_cut_b);
    let (q0, q1, q2, q3) = if anchored(polygon[1]) || anchored(polygon[3]) {
        (polygon[1], polygon[2], polygon[3], polygon[0])
    } else {
        (polygon[0], polygon[1], polygon[2], polygon[3])
    };
    (
        WedgeTriangle::new(q0, q1, q2, density(q0), density(q1), density(q2)),
        WedgeTriangle::new(q0, q2, q3, density(q0), density(q2), density(q3)),
    )
}

/// Number the lattice points and cuts that survive, then decompose every
/// cell's wedges into tetrahedra.
pub(crate) fn triangulate_grid(grid: &mut Grid, progress: &ProgressContext) -> StuffResult<TetMesh> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();

    // Assign output vertex numbers: lattice points that are inside or on
    // the surface (density >= 0) and every owned active cut.
    #[allow(clippy::cast_possible_truncation)]
    for xi in 1..grid.nx - 1 {
        if progress.is_cancelled() {
            return Err(StuffError::Cancelled);
        }
        for yi in 1..grid.ny - 1 {
            for zi in 1..grid.nz - 1 {
                for (edges, corner) in [
                    (grid.corner_edges(xi, yi, zi), true),
                    (grid.center_edges(xi, yi, zi), false),
                ] {
                    {
                        let cell = grid.cell_mut([xi, yi, zi]);
                        let (density, pos, vertex) = if corner {
                            (cell.corner_density, cell.corner_pos, &mut cell.corner_vertex)
                        } else {
                            (cell.center_density, cell.center_pos, &mut cell.center_vertex)
                        };
                        if density >= 0.0 {
                            *vertex = vertices.len() as u32;
                            vertices.push(pos);
                        } else {
                            *vertex = NO_VERTEX;
                        }
                    }
                    for edge in edges {
                        if !edge.owner {
                            continue;
                        }
                        let cut = grid.cut_mut(&edge);
                        if cut.active {
                            cut.vertex = vertices.len() as u32;
                            vertices.push(cut.pos);
                        }
                    }
                }
            }
        }
    }

    let mut mesher = WedgeMesher {
        vertices,
        tetrahedra: Vec::new(),
    };

    for xi in 1..grid.nx - 1 {
        if progress.is_cancelled() {
            return Err(StuffError::Cancelled);
        }
        for yi in 1..grid.ny - 1 {
            for zi in 1..grid.nz - 1 {
                triangulate_cell(grid, &mut mesher, xi, yi, zi);
            }
        }
    }

    let mut mesh = TetMesh::new();
    mesh.vertices = mesher.vertices.into_iter().map(Vertex::new).collect();
    mesh.tetrahedra = mesher.tetrahedra;
    Ok(mesh)
}

/// Process the three sweep directions of one cell.
#[allow(clippy::many_single_char_names)]
fn triangulate_cell(grid: &Grid, mesher: &mut WedgeMesher, xi: usize, yi: usize, zi: usize) {
    let corner = |c: [usize; 3]| {
        let cell = grid.cell(c);
        (cell.corner_vertex, cell.corner_density)
    };
    let center = |c: [usize; 3]| {
        let cell = grid.cell(c);
        (cell.center_vertex, cell.center_density)
    };
    let cc_cut = |c: [usize; 3], i: usize| {
        let slot = grid.cell(c).corner_corner[i];
        if slot.active { slot.vertex } else { NO_VERTEX }
    };
    let sc_cut = |c: [usize; 3], i: usize| {
        let slot = grid.cell(c).center_corner[i];
        if slot.active { slot.vertex } else { NO_VERTEX }
    };
    let hh_cut = |c: [usize; 3], i: usize| {
        let slot = grid.cell(c).center_center[i];
        if slot.active { slot.vertex } else { NO_VERTEX }
    };

    let this = [xi, yi, zi];
    let p4 = center(this);

    // x sweep: the four wedges between this center and the +x neighbor's.
    let p5 = center([xi + 1, yi, zi]);
    let p = [
        corner([xi + 1, yi, zi]),
        corner([xi + 1, yi + 1, zi]),
        corner([xi + 1, yi + 1, zi + 1]),
        corner([xi + 1, yi, zi + 1]),
    ];
    let e = [
        cc_cut([xi + 1, yi, zi], 1),
        cc_cut([xi + 1, yi + 1, zi], 2),
        cc_cut([xi + 1, yi, zi + 1], 1),
        cc_cut([xi + 1, yi, zi], 2),
    ];
    let f = [
        sc_cut(this, 1),
        sc_cut(this, 2),
        sc_cut(this, 6),
        sc_cut(this, 5),
    ];
    let g = [
        sc_cut([xi + 1, yi, zi], 0),
        sc_cut([xi + 1, yi, zi], 3),
        sc_cut([xi + 1, yi, zi], 7),
        sc_cut([xi + 1, yi, zi], 4),
    ];
    let h = hh_cut(this, 0);
    sweep(mesher, p4, p5, &p, &e, &f, &g, h);

    // y sweep.
    let p5 = center([xi, yi + 1, zi]);
    let p = [
        corner([xi + 1, yi + 1, zi]),
        corner([xi, yi + 1, zi]),
        corner([xi, yi + 1, zi + 1]),
        corner([xi + 1, yi + 1, zi + 1]),
    ];
    let e = [
        cc_cut([xi, yi + 1, zi], 0),
        cc_cut([xi, yi + 1, zi], 2),
        cc_cut([xi, yi + 1, zi + 1], 0),
        cc_cut([xi + 1, yi + 1, zi], 2),
    ];
    let f = [
        sc_cut(this, 2),
        sc_cut(this, 3),
        sc_cut(this, 7),
        sc_cut(this, 6),
    ];
    let g = [
        sc_cut([xi, yi + 1, zi], 1),
        sc_cut([xi, yi + 1, zi], 0),
        sc_cut([xi, yi + 1, zi], 4),
        sc_cut([xi, yi + 1, zi], 5),
    ];
    let h = hh_cut(this, 1);
    sweep(mesher, p4, p5, &p, &e, &f, &g, h);

    // z sweep.
    let p5 = center([xi, yi, zi + 1]);
    let p = [
        corner([xi, yi, zi + 1]),
        corner([xi + 1, yi, zi + 1]),
        corner([xi + 1, yi + 1, zi + 1]),
        corner([xi, yi + 1, zi + 1]),
    ];
    let e = [
        cc_cut([xi, yi, zi + 1], 0),
        cc_cut([xi + 1, yi, zi + 1], 1),
        cc_cut([xi, yi + 1, zi + 1], 0),
        cc_cut([xi, yi, zi + 1], 1),
    ];
    let f = [
        sc_cut(this, 4),
        sc_cut(this, 5),
        sc_cut(this, 6),
        sc_cut(this, 7),
    ];
    let g = [
        sc_cut([xi, yi, zi + 1], 0),
        sc_cut([xi, yi, zi + 1], 1),
        sc_cut([xi, yi, zi + 1], 2),
        sc_cut([xi, yi, zi + 1], 3),
    ];
    let h = hh_cut(this, 2);
    sweep(mesher, p4, p5, &p, &e, &f, &g, h);
}

/// Emit the four wedges of one sweep: each spans two adjacent face corners
/// and the two centers, with `e` the corner-corner cuts, `f`/`g` the
/// center-corner cuts towards the near and far center, and `h` the
/// center-center cut.
fn sweep(
    mesher: &mut WedgeMesher,
    p4: (u32, f64),
    p5: (u32, f64),
    p: &[(u32, f64); 4],
    e: &[u32; 4],
    f: &[u32; 4],
    g: &[u32; 4],
    h: u32,
) {
    for i in 0..4 {
        let j = (i + 1) % 4;
        mesher.handle_wedge([p[i], p4, p5, p[j]], [f[i], h, g[i], e[i], f[j], g[j]]);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mesher_with(points: &[[f64; 3]]) -> WedgeMesher {
        WedgeMesher {
            vertices: points
                .iter()
                .map(|p| Point3::new(p[0], p[1], p[2]))
                .collect(),
            tetrahedra: Vec::new(),
        }
    }

    #[test]
    fn test_uncut_wedge_yields_single_tetra() {
        let mut mesher = mesher_with(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        mesher.handle_wedge(
            [(0, 1.0), (1, 1.0), (2, 1.0), (3, 1.0)],
            [NO_VERTEX; 6],
        );
        assert_eq!(mesher.tetrahedra.len(), 1);
        assert_eq!(
            mesher.tetrahedra[0],
            Tetrahedron::new(0, 1, 2, 3)
        );
        let [q0, q1, q2, q3] = mesher.tetrahedra[0]
            .vertices
            .map(|v| mesher.vertices[v as usize]);
        assert!(Tetrahedron::signed_volume(&q0, &q1, &q2, &q3) > 0.0);
    }

    #[test]
    fn test_all_outside_wedge_yields_nothing() {
        let mut mesher = mesher_with(&[]);
        mesher.handle_wedge(
            [
                (NO_VERTEX, -1.0),
                (NO_VERTEX, -1.0),
                (NO_VERTEX, -1.0),
                (NO_VERTEX, -1.0),
            ],
            [NO_VERTEX; 6],
        );
        assert!(mesher.tetrahedra.is_empty());
    }

    #[test]
    fn test_half_cut_wedge_keeps_inside_part() {
        // Corner p0 is outside; the three edges from it are cut at their
        // midpoints. Only the inside part may produce tetrahedra, and all
        // of them must avoid the temporary outside id.
        let mut mesher = mesher_with(&[
            [0.0, 0.0, 0.0],   // 0: p1 inside
            [0.0, 1.0, 0.0],   // 1: p2 inside
            [0.0, 0.0, 1.0],   // 2: p3 inside
            [0.5, 0.0, 0.0],   // 3: cut on p0-p1
            [0.5, 0.5, 0.0],   // 4: cut on p2-p0
            [0.5, 0.0, 0.5],   // 5: cut on p0-p3
        ]);
        mesher.handle_wedge(
            [(NO_VERTEX, -1.0), (0, 1.0), (1, 1.0), (2, 1.0)],
            [3, NO_VERTEX, 4, 5, NO_VERTEX, NO_VERTEX],
        );
        assert!(!mesher.tetrahedra.is_empty());
        for tetra in &mesher.tetrahedra {
            for &v in &tetra.vertices {
                assert!((v as usize) < mesher.vertices.len(), "temporary id leaked");
            }
            let [q0, q1, q2, q3] = tetra.vertices.map(|v| mesher.vertices[v as usize]);
            assert!(Tetrahedron::signed_volume(&q0, &q1, &q2, &q3) >= 0.0);
        }
    }

    #[test]
    fn test_chain_hole() {
        let polygon = chain_hole(vec![(1, 2), (3, 1), (2, 3)]).unwrap();
        assert_eq!(polygon.len(), 3);
        assert!(chain_hole(vec![(1, 2), (3, 4)]).is_none());
    }
}
