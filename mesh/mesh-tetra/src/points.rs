//! Insertion point synthesis.
//!
//! The tetrahedralizer inserts the surface vertices themselves (with a tiny
//! deterministic jitter against degenerate co-spherical configurations) plus
//! interior points seeded on an axis-ray lattice and relaxed away from the
//! surface and from each other.

use mesh_spatial::SpatialHash;
use mesh_types::query::{closest_point_on_triangle, segment_triangle_intersect};
use mesh_types::{Aabb, IndexedMesh, MeshBounds, MeshTopology, Point3, ProgressContext, Vector3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{TetraError, TetraResult};
use crate::params::TetraParams;

/// Relative amplitude of the vertex jitter.
const JITTER_SCALE: f64 = 1.0e-4;

/// The complete insertion point set: jittered surface vertices first, then
/// any synthesized interior points.
pub(crate) fn generate_points(
    surface: &IndexedMesh,
    params: &TetraParams,
    progress: &ProgressContext,
) -> TetraResult<Vec<Point3<f64>>> {
    let bounds = surface.bounds();
    let diag = bounds.diagonal();

    let mut rng = SmallRng::seed_from_u64(params.seed);
    let amplitude = JITTER_SCALE * diag;
    let mut points: Vec<Point3<f64>> = surface
        .vertices
        .iter()
        .map(|v| {
            let jitter = Vector3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ) * amplitude;
            v.position + jitter
        })
        .collect();

    if params.interior_points && params.subdivision > 0 && diag > 0.0 {
        let spacing = 2.0 * diag / f64::from(params.subdivision);
        let mut interior = seed_interior_points(surface, &bounds, spacing, progress)?;
        relax_interior_points(
            surface,
            &mut interior,
            spacing,
            params.relax_iterations,
            progress,
        )?;
        debug!(
            surface_points = points.len(),
            interior_points = interior.len(),
            "generated insertion points"
        );
        points.extend(interior);
    }

    Ok(points)
}

/// Index the surface triangles into a spatial hash by their bounds.
fn hash_triangles(surface: &IndexedMesh, spacing: f64) -> TetraResult<SpatialHash> {
    let mut hash = SpatialHash::try_new(spacing)?;
    for (index, triangle) in surface.triangles().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        hash.add_bounds(&triangle.bounds(), index as u32);
    }
    Ok(hash)
}

/// Cast +x rays through the volume on a y/z lattice; crossing parameters
/// pair up by parity into inside intervals that receive seed points.
fn seed_interior_points(
    surface: &IndexedMesh,
    bounds: &Aabb,
    spacing: f64,
    progress: &ProgressContext,
) -> TetraResult<Vec<Point3<f64>>> {
    let mut hash = hash_triangles(surface, spacing)?;
    let mut points = Vec::new();

    let start_x = bounds.min.x - spacing;
    let end_x = bounds.max.x + spacing;

    let mut y = bounds.min.y + 0.5 * spacing;
    while y < bounds.max.y {
        if progress.is_cancelled() {
            return Err(TetraError::Cancelled);
        }
        let mut z = bounds.min.z + 0.5 * spacing;
        while z < bounds.max.z {
            let origin = Point3::new(start_x, y, z);
            let target = Point3::new(end_x, y, z);

            let mut ray_bounds = Aabb::new(origin, target);
            ray_bounds.fatten(1e-9);
            let candidates = hash.query_unique(&ray_bounds, None);

            let mut cuts: Vec<f64> = Vec::new();
            for tri_index in candidates {
                if let Some(tri) = surface.triangle(tri_index as usize) {
                    if let Some(t) = segment_triangle_intersect(origin, target, tri.a, tri.b, tri.c)
                    {
                        cuts.push(start_x + t * (end_x - start_x));
                    }
                }
            }
            cuts.sort_by(f64::total_cmp);

            for pair in cuts.chunks_exact(2) {
                let mut x = pair[0] + 0.5 * spacing;
                while x < pair[1] {
                    points.push(Point3::new(x, y, z));
                    x += spacing;
                }
            }
            z += spacing;
        }
        y += spacing;
    }

    Ok(points)
}

/// Push interior points away from the surface and apart from each other so
/// the Delaunay step stays well-conditioned.
fn relax_interior_points(
    surface: &IndexedMesh,
    points: &mut [Point3<f64>],
    spacing: f64,
    iterations: u32,
    progress: &ProgressContext,
) -> TetraResult<()> {
    if points.is_empty() {
        return Ok(());
    }
    let tri_hash = hash_triangles(surface, spacing)?;

    for _ in 0..iterations {
        if progress.is_cancelled() {
            return Err(TetraError::Cancelled);
        }

        let mut point_hash = SpatialHash::try_new(spacing)?;
        for (index, p) in points.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            point_hash.add_point(p, index as u32);
        }

        let mut forces = vec![Vector3::zeros(); points.len()];
        for (index, p) in points.iter().enumerate() {
            let mut query = Aabb::from_point(*p);
            query.fatten(spacing);

            // Away from nearby surface triangles.
            for tri_index in unique_candidates(&tri_hash, &query) {
                if let Some(tri) = surface.triangle(tri_index as usize) {
                    let cp = closest_point_on_triangle(*p, tri.a, tri.b, tri.c);
                    let d = *p - cp;
                    let dist = d.norm();
                    if dist > 1e-12 && dist < spacing {
                        forces[index] += d / dist * (spacing - dist);
                    }
                }
            }

            // Apart from nearby interior points.
            for other in point_hash.query(&query, None) {
                let other = other as usize;
                if other == index {
                    continue;
                }
                let d = *p - points[other];
                let dist = d.norm();
                if dist > 1e-12 && dist < spacing {
                    forces[index] += d / dist * (0.5 * (spacing - dist));
                }
            }
        }

        for (p, f) in points.iter_mut().zip(&forces) {
            *p += 0.5 * f;
        }
    }
    Ok(())
}

/// Duplicate-free triangle candidates for a query box.
fn unique_candidates(hash: &SpatialHash, query: &Aabb) -> Vec<u32> {
    let mut out = hash.query(query, None);
    out.sort_unstable();
    out.dedup();
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_types::unit_cube;

    #[test]
    fn test_surface_points_jittered_but_close() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        let points =
            generate_points(&cube, &TetraParams::default().with_interior_points(false), &progress)
                .unwrap();
        assert_eq!(points.len(), cube.vertices.len());
        for (p, v) in points.iter().zip(&cube.vertices) {
            assert!((p - v.position).norm() < 1e-3);
        }
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        let params = TetraParams::default().with_seed(7);
        let a = generate_points(&cube, &params, &progress).unwrap();
        let b = generate_points(&cube, &params, &progress).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_interior_points_inside_cube() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        let params = TetraParams::with_subdivision(8);
        let points = generate_points(&cube, &params, &progress).unwrap();
        assert!(points.len() > cube.vertices.len(), "no interior points");

        // Relaxation keeps interior points within (slightly fattened)
        // bounds.
        let mut bounds = cube.bounds();
        bounds.fatten(0.3);
        for p in &points[cube.vertices.len()..] {
            assert!(bounds.contains(p));
        }
    }

    #[test]
    fn test_cancellation() {
        let cube = unit_cube();
        let progress = ProgressContext::new();
        progress.cancel();
        let result = generate_points(&cube, &TetraParams::with_subdivision(8), &progress);
        assert!(matches!(result, Err(TetraError::Cancelled)));
    }
}
