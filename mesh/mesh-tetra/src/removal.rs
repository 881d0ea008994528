//! Exterior and sliver removal.

use mesh_spatial::SpatialHash;
use mesh_types::query::ray_triangle_intersect;
use mesh_types::{Aabb, IndexedMesh, MeshBounds, MeshTopology, Point3, ProgressContext, Vector3};
use tracing::debug;

use crate::delaunay::DelaunayMesh;
use crate::error::{TetraError, TetraResult};

/// Elements flatter than this quality are slivers and get dropped.
const SLIVER_QUALITY: f64 = 0.001;

/// Remove elements outside the input surface and sliver elements.
///
/// Elements touching a synthetic far vertex go outright. The rest are
/// classified by parity voting: six half-axis rays are cast from the
/// element's centroid, each contributing an inside vote when it crosses the
/// surface an odd number of times; fewer than 3 of 6 votes means outside.
/// Running the pass twice removes nothing the second time.
pub(crate) fn remove_outer_tetrahedra(
    mesh: &mut DelaunayMesh,
    surface: &IndexedMesh,
    tri_hash: &mut SpatialHash,
    progress: &ProgressContext,
) -> TetraResult<()> {
    let bounds = surface.bounds();
    let mut removed = 0;

    for index in 0..mesh.tets.len() {
        if mesh.tets[index].deleted {
            continue;
        }
        if progress.is_cancelled() {
            return Err(TetraError::Cancelled);
        }

        let vertices = mesh.tets[index].vertices;
        let far = vertices.iter().any(|&v| mesh.is_far_vertex(v));
        let remove = if far {
            true
        } else {
            let corners = mesh.corner_positions(&vertices);
            let centroid = Point3::from(
                (corners[0].coords + corners[1].coords + corners[2].coords + corners[3].coords)
                    / 4.0,
            );
            !is_inside(&centroid, surface, &bounds, tri_hash)
                || mesh.quality_of(vertices) < SLIVER_QUALITY
        };
        if remove {
            mesh.delete_tetra(index);
            removed += 1;
        }
    }

    debug!(removed, remaining = mesh.live_count(), "exterior/sliver removal");
    Ok(())
}

/// Majority vote over six half-axis parity rays from `point`.
fn is_inside(
    point: &Point3<f64>,
    surface: &IndexedMesh,
    bounds: &Aabb,
    tri_hash: &mut SpatialHash,
) -> bool {
    let mut votes = 0;
    for axis in 0..3 {
        let mut dir = Vector3::zeros();
        dir[axis] = 1.0;

        let mut ray_bounds = Aabb::from_point(*point);
        ray_bounds.min[axis] = bounds.min[axis];
        ray_bounds.max[axis] = bounds.max[axis];
        ray_bounds.fatten(1e-9);

        let mut positive = false;
        let mut negative = false;
        for tri_index in tri_hash.query_unique(&ray_bounds, None) {
            let Some(tri) = surface.triangle(tri_index as usize) else {
                continue;
            };
            if !tri.bounds().intersects(&ray_bounds) {
                continue;
            }
            if ray_triangle_intersect(*point, dir, tri.a, tri.b, tri.c).is_some() {
                positive = !positive;
            }
            if ray_triangle_intersect(*point, -dir, tri.a, tri.b, tri.c).is_some() {
                negative = !negative;
            }
        }
        if positive {
            votes += 1;
        }
        if negative {
            votes += 1;
        }
    }
    votes >= 3
}
