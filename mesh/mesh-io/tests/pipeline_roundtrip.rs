//! End-to-end: generate a volume mesh, persist it, and read it back.

use approx::assert_relative_eq;
use mesh_io::{load_tet, save_tet};
use mesh_stuff::{stuff_mesh, DensitySource, StuffParams};
use mesh_tetra::{tetrahedralize, TetraParams};
use mesh_types::{unit_cube, ProgressContext};

#[test]
fn tetrahedralized_cube_survives_roundtrip() {
    let cube = unit_cube();
    let progress = ProgressContext::new();
    let result =
        tetrahedralize(&cube, &TetraParams::with_subdivision(4), &progress).unwrap();
    assert!(!result.mesh.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube.tet");
    save_tet(&result.mesh, &result.links, &path).unwrap();

    let (loaded, links) = load_tet(&path).unwrap();
    assert_eq!(loaded.vertex_count(), result.mesh.vertex_count());
    assert_eq!(loaded.tetrahedra, result.mesh.tetrahedra);
    assert_eq!(links.len(), result.links.len());
    for (a, b) in loaded.vertices.iter().zip(&result.mesh.vertices) {
        // Positions are written with 6 decimal places.
        assert_relative_eq!(a.position, b.position, epsilon = 1e-5);
    }
    for (a, b) in links.iter().zip(&result.links) {
        assert_eq!(a.tetrahedron, b.tetrahedron);
        for (wa, wb) in a.barycentric.iter().zip(&b.barycentric) {
            assert_relative_eq!(*wa, *wb, epsilon = 1e-5);
        }
    }
}

#[test]
fn stuffed_cube_survives_roundtrip() {
    let cube = unit_cube();
    let progress = ProgressContext::new();
    let params = StuffParams::with_subdivision(4).with_source(DensitySource::Geometry);
    let mesh = stuff_mesh(&cube, &params, &progress).unwrap();
    assert!(!mesh.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stuffed.tet");
    save_tet(&mesh, &[], &path).unwrap();

    let (loaded, links) = load_tet(&path).unwrap();
    assert!(links.is_empty());
    assert_eq!(loaded.tet_count(), mesh.tet_count());
    assert_relative_eq!(loaded.total_volume(), mesh.total_volume(), epsilon = 1e-3);
}
