//! The isosurface stuffing pipeline.

use mesh_spatial::SpatialHash;
use mesh_types::{Aabb, IndexedMesh, MeshBounds, MeshTopology, ProgressContext, TetMesh, Vector3};
use tracing::info;

use crate::error::{StuffError, StuffResult};
use crate::grid::Grid;
use crate::params::{DensitySource, StuffParams};
use crate::triangulate::triangulate_grid;

/// Fill the volume described by a surface mesh with tetrahedra on a BCC
/// lattice.
///
/// Runs the full pipeline: lattice construction over the padded bounds,
/// density sampling and edge cuts (by distance-field splatting or by
/// ray-parity classification, per [`StuffParams::source`]), vertex snapping,
/// and wedge triangulation. Progress moves through fixed percentages at each
/// phase boundary; cancellation through `progress` discards all partial work
/// and returns [`StuffError::Cancelled`].
///
/// ```
/// use mesh_stuff::{stuff_mesh, DensitySource, StuffParams};
/// use mesh_types::{unit_cube, ProgressContext};
///
/// let cube = unit_cube();
/// let progress = ProgressContext::new();
/// let params = StuffParams::with_subdivision(4).with_source(DensitySource::Geometry);
/// let mesh = stuff_mesh(&cube, &params, &progress)?;
///
/// assert!(!mesh.is_empty());
/// # Ok::<(), mesh_stuff::StuffError>(())
/// ```
///
/// # Errors
///
/// Returns an error when the subdivision is zero, a face references a
/// missing vertex, or the run is cancelled.
pub fn stuff_mesh(
    surface: &IndexedMesh,
    params: &StuffParams,
    progress: &ProgressContext,
) -> StuffResult<TetMesh> {
    if params.subdivision == 0 {
        return Err(StuffError::InvalidSubdivision(0));
    }
    for (face_index, face) in surface.faces.iter().enumerate() {
        for &v in face {
            if v as usize >= surface.vertices.len() {
                return Err(StuffError::FaceIndexOutOfRange {
                    face: face_index,
                    vertex: v,
                    vertex_count: surface.vertices.len(),
                });
            }
        }
    }

    let bounds = surface.bounds();
    if surface.is_empty() || bounds.diagonal() <= 0.0 {
        return Ok(TetMesh::new());
    }

    info!(
        vertices = surface.vertex_count(),
        triangles = surface.face_count(),
        subdivision = params.subdivision,
        source = ?params.source,
        "stuffing surface"
    );
    progress.set_percent(0);

    let mut grid = Grid::new(&bounds, params.subdivision);
    match params.source {
        DensitySource::Field => {
            for triangle in surface.triangles() {
                if progress.is_cancelled() {
                    return Err(StuffError::Cancelled);
                }
                grid.splat_triangle(&triangle);
            }
            grid.compute_cut_points();
        }
        DensitySource::Geometry => {
            compute_geometry_cuts(&mut grid, surface, progress)?;
            sweep_parities(&mut grid);
            grid.remove_same_sign_cuts();
        }
    }
    progress.set_percent(40);

    grid.snap_vertices();
    progress.set_percent(60);

    let mut mesh = triangulate_grid(&mut grid, progress)?;
    mesh.compact_vertices();
    progress.set_percent(100);

    info!(
        vertices = mesh.vertex_count(),
        tetrahedra = mesh.tet_count(),
        "stuffing complete"
    );
    Ok(mesh)
}

/// Intersect every owned lattice edge against the nearby surface triangles
/// and record the first hit as that edge's cut.
fn compute_geometry_cuts(
    grid: &mut Grid,
    surface: &IndexedMesh,
    progress: &ProgressContext,
) -> StuffResult<()> {
    let mut hash = SpatialHash::try_new(grid.cell_size)?;
    for (index, triangle) in surface.triangles().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        hash.add_bounds(&triangle.bounds(), index as u32);
    }

    // The 14 edges a cell owns all live inside [corner, corner + 1.5h].
    let reach = Vector3::repeat(1.5 * grid.cell_size);
    for xi in 1..grid.nx - 1 {
        if progress.is_cancelled() {
            return Err(StuffError::Cancelled);
        }
        for yi in 1..grid.ny - 1 {
            for zi in 1..grid.nz - 1 {
                let corner = grid.cell([xi, yi, zi]).corner_pos;
                let mut query = Aabb::new(corner, corner + reach);
                query.fatten(0.01 * grid.cell_size);
                let candidates = hash.query_unique(&query, None);
                if candidates.is_empty() {
                    continue;
                }

                for (edges, from_corner) in [
                    (grid.corner_edges(xi, yi, zi), true),
                    (grid.center_edges(xi, yi, zi), false),
                ] {
                    let (_, p0) = grid.endpoint([xi, yi, zi], from_corner);
                    for edge in edges {
                        if !edge.owner {
                            continue;
                        }
                        let (_, p1) = grid.endpoint(edge.adj, edge.adj_corner);
                        let hit = candidates.iter().find_map(|&tri_index| {
                            let triangle = surface.triangle(tri_index as usize)?;
                            let t = mesh_types::query::segment_triangle_intersect(
                                p0, p1, triangle.a, triangle.b, triangle.c,
                            )?;
                            Some(p0 + (p1 - p0) * t)
                        });
                        if let Some(pos) = hit {
                            let cut = grid.cut_mut(&edge);
                            cut.active = true;
                            cut.pos = pos;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Classify every lattice sample by crossing parity.
///
/// For each axis, walk every lattice line starting outside; each active cut
/// on an axis-aligned edge flips the side. Every sample accumulates one
/// vote per axis, so the sum is odd and a sample is inside when the
/// majority of axes says so.
fn sweep_parities(grid: &mut Grid) {
    for cell in &mut grid.cells {
        cell.corner_density = 0.0;
        cell.center_density = 0.0;
    }

    for axis in 0..3 {
        let (nu, nv, len) = match axis {
            0 => (grid.ny, grid.nz, grid.nx),
            1 => (grid.nx, grid.nz, grid.ny),
            _ => (grid.nx, grid.ny, grid.nz),
        };
        for u in 0..nu {
            for v in 0..nv {
                let mut corner_side = -1.0;
                let mut center_side = -1.0;
                for w in 0..len {
                    let c = match axis {
                        0 => [w, u, v],
                        1 => [u, w, v],
                        _ => [u, v, w],
                    };
                    let cell = grid.cell_mut(c);
                    cell.corner_density += corner_side;
                    if cell.corner_corner[axis].active {
                        corner_side = -corner_side;
                    }
                    cell.center_density += center_side;
                    if cell.center_center[axis].active {
                        center_side = -center_side;
                    }
                }
            }
        }
    }
}
