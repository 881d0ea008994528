//! Edge-swap refinement.
//!
//! After insertion, some tetrahedralization edges cross the input surface at
//! a shallow incidence. Each such edge is removed and the ring of elements
//! around it re-triangulated fan-wise over its link polygon, which improves
//! how well element faces line up with the surface.
//!
//! An additional edge-splitting pass (inserting a new vertex where an edge
//! crosses the surface) would further improve surface conformity; it is a
//! known limitation that this pass only swaps.

use std::collections::BTreeSet;

use mesh_spatial::SpatialHash;
use mesh_types::query::{point_in_tetrahedron, segment_triangle_intersect};
use mesh_types::{Aabb, IndexedMesh, MeshTopology, ProgressContext};
use tracing::debug;

use crate::delaunay::DelaunayMesh;
use crate::error::{TetraError, TetraResult};

/// One refinement pass: swap every edge whose segment crosses a surface
/// triangle with both endpoints farther than `threshold` from the triangle's
/// plane. Returns the number of edges swapped.
pub(crate) fn swap_pass(
    mesh: &mut DelaunayMesh,
    surface: &IndexedMesh,
    tri_hash: &mut SpatialHash,
    threshold: f64,
    progress: &ProgressContext,
) -> TetraResult<usize> {
    // Unique undirected edges of the live elements, in deterministic order.
    let mut edges: BTreeSet<(u32, u32)> = BTreeSet::new();
    for index in mesh.live().collect::<Vec<_>>() {
        let v = mesh.tets[index].vertices;
        for [a, b] in mesh_types::TET_EDGES {
            let (lo, hi) = if v[a] < v[b] { (v[a], v[b]) } else { (v[b], v[a]) };
            edges.insert((lo, hi));
        }
    }

    let mut swapped = 0;
    for (v0, v1) in edges {
        if progress.is_cancelled() {
            return Err(TetraError::Cancelled);
        }
        if mesh.is_far_vertex(v0) || mesh.is_far_vertex(v1) {
            continue;
        }

        let p0 = mesh.points[v0 as usize];
        let p1 = mesh.points[v1 as usize];
        let mut edge_bounds = Aabb::new(p0, p1);
        edge_bounds.fatten(1e-9);

        let mut cut = false;
        for tri_index in tri_hash.query_unique(&edge_bounds, None) {
            let Some(face) = surface.faces.get(tri_index as usize) else {
                continue;
            };
            // Surface vertices keep their indices in the point arena, so an
            // edge ending on the triangle itself is not a crossing.
            if face.contains(&v0) || face.contains(&v1) {
                continue;
            }
            let Some(tri) = surface.triangle(tri_index as usize) else {
                continue;
            };
            if !tri.bounds().intersects(&edge_bounds) {
                continue;
            }
            let Some(normal) = tri.normal() else {
                continue;
            };
            // Both endpoints must clear the triangle plane; grazing contacts
            // are left alone.
            if normal.dot(&(p0 - tri.a)).abs() < threshold
                || normal.dot(&(p1 - tri.a)).abs() < threshold
            {
                continue;
            }
            if segment_triangle_intersect(p0, p1, tri.a, tri.b, tri.c).is_some() {
                cut = true;
                break;
            }
        }

        if cut && swap_edge(mesh, v0, v1) {
            swapped += 1;
        }
    }

    debug!(swapped, "edge-swap pass complete");
    Ok(swapped)
}

/// Remove the edge `(v0, v1)` and re-triangulate the ring of elements around
/// it fan-wise over its link polygon.
///
/// Each straddling element contributes one oriented link-polygon edge (its
/// two non-edge vertices, ordered so the polygon winds consistently). Ears
/// are clipped off the polygon one at a time, each producing two elements
/// (ear with `v1`, mirrored ear with `v0`). Returns `false` without touching
/// the mesh when the polygon is open, non-circular, or no valid ear exists.
pub(crate) fn swap_edge(mesh: &mut DelaunayMesh, v0: u32, v1: u32) -> bool {
    let mut straddling: Vec<usize> = Vec::new();
    let mut link_edges: Vec<(u32, u32)> = Vec::new();

    for index in 0..mesh.tets.len() {
        if mesh.tets[index].deleted {
            continue;
        }
        let t = mesh.tets[index].vertices;
        if !t.contains(&v0) || !t.contains(&v1) {
            continue;
        }
        let mut others = t.iter().copied().filter(|&v| v != v0 && v != v1);
        let (Some(v2), Some(v3)) = (others.next(), others.next()) else {
            continue;
        };
        straddling.push(index);

        let [q0, q1, q2, q3] = mesh.corner_positions(&[v0, v1, v2, v3]);
        if mesh_types::Tetrahedron::signed_volume(&q0, &q1, &q2, &q3) >= 0.0 {
            link_edges.push((v2, v3));
        } else {
            link_edges.push((v3, v2));
        }
    }

    if link_edges.len() < 3 {
        return false;
    }

    // Chain the oriented link edges into a closed polygon.
    let Some((start, mut end)) = link_edges.pop() else {
        return false;
    };
    let mut polygon = vec![start, end];
    while !link_edges.is_empty() {
        let Some(pos) = link_edges.iter().position(|&(a, _)| a == end) else {
            return false; // not connected
        };
        end = link_edges.swap_remove(pos).1;
        polygon.push(end);
    }
    if polygon.first() != polygon.last() {
        return false; // not circular
    }
    polygon.pop();
    if polygon.len() < 3 {
        return false;
    }

    // Clip ears until a triangle remains, preferring ears that improve the
    // worst of the three elements straddling the clipped corner.
    let mut new_tets: Vec<[u32; 4]> = Vec::new();
    while polygon.len() > 3 {
        let num = polygon.len();
        let quality: Vec<f64> = (0..num)
            .map(|i0| {
                let i1 = (i0 + 1) % num;
                let i2 = (i1 + 1) % num;
                mesh.quality_of([polygon[i0], polygon[i1], polygon[i2], v1])
            })
            .collect();

        let mut best: Option<(usize, f64)> = None;
        for i0 in 0..num {
            let i1 = (i0 + 1) % num;
            let i2 = (i1 + 1) % num;
            let ear0 = [polygon[i0], polygon[i1], polygon[i2], v1];
            let ear1 = [polygon[i2], polygon[i1], polygon[i0], v0];
            if ear_volume(mesh, &ear0) < 0.0 || ear_volume(mesh, &ear1) < 0.0 {
                continue;
            }
            let c0 = mesh.corner_positions(&ear0);
            let c1 = mesh.corner_positions(&ear1);
            let enclosed = (0..num)
                .filter(|&i| i != i0 && i != i1 && i != i2)
                .map(|i| mesh.points[polygon[i] as usize])
                .any(|p| {
                    point_in_tetrahedron(&p, &c0, 0.0) || point_in_tetrahedron(&p, &c1, 0.0)
                });
            if enclosed {
                continue;
            }
            // quality[i] scores the ear rooted at corner i; clipping corner
            // i1 should help its neighbors and keep the ear itself sound.
            let score = (1.0 - quality[(i0 + num - 1) % num]) + quality[i0]
                + (1.0 - quality[i1]);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i0, score));
            }
        }
        let Some((i0, _)) = best else {
            return false;
        };
        let i1 = (i0 + 1) % num;
        let i2 = (i1 + 1) % num;
        new_tets.push([polygon[i0], polygon[i1], polygon[i2], v1]);
        new_tets.push([polygon[i2], polygon[i1], polygon[i0], v0]);
        polygon.remove(i1);
    }

    let final0 = [polygon[0], polygon[1], polygon[2], v1];
    let final1 = [polygon[2], polygon[1], polygon[0], v0];
    if ear_volume(mesh, &final0) < 0.0 || ear_volume(mesh, &final1) < 0.0 {
        return false;
    }
    new_tets.push(final0);
    new_tets.push(final1);

    // Commit only now that the whole fan is known to be valid.
    for index in straddling {
        mesh.delete_tetra(index);
    }
    for vertices in new_tets {
        mesh.add_tetra(vertices);
    }
    true
}

fn ear_volume(mesh: &DelaunayMesh, vertices: &[u32; 4]) -> f64 {
    let [p0, p1, p2, p3] = mesh.corner_positions(vertices);
    mesh_types::Tetrahedron::signed_volume(&p0, &p1, &p2, &p3)
}
