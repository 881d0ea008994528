//! Line-oriented tetrahedral mesh text format.
//!
//! One record per line:
//!
//! ```text
//! v <x> <y> <z>               one per vertex, in vertex-index order
//! t <i0> <i1> <i2> <i3>       one per tetrahedron, indices into the v list
//! l <tetraNr> <bx> <by> <bz>  optional: one barycentric link per original
//!                             surface vertex (first weight implicit)
//! ```
//!
//! `#` comment lines and blank lines are ignored on load. Floats are written
//! with 6 decimal places.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use mesh_types::{TetMesh, Tetrahedron, Vertex, VertexLink};
use tracing::info;

use crate::error::{IoError, IoResult};

/// Write a tetrahedral mesh as text records.
///
/// The link section is only written when `links` is non-empty.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_tet<W: Write>(
    mesh: &TetMesh,
    links: &[VertexLink],
    mut writer: W,
) -> IoResult<()> {
    writeln!(writer, "# tetrahedral mesh")?;
    writeln!(writer)?;
    writeln!(writer, "# {} vertices", mesh.vertices.len())?;
    for vertex in &mesh.vertices {
        let p = vertex.position;
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }

    writeln!(writer)?;
    writeln!(writer, "# {} tetrahedra", mesh.tetrahedra.len())?;
    for tetra in &mesh.tetrahedra {
        let [i0, i1, i2, i3] = tetra.vertices;
        writeln!(writer, "t {i0} {i1} {i2} {i3}")?;
    }

    if !links.is_empty() {
        writeln!(writer)?;
        writeln!(
            writer,
            "# links from the vertices of the original mesh to the containing tetrahedron"
        )?;
        writeln!(
            writer,
            "# including barycentric coordinates w.r.t. the containing tetrahedron"
        )?;
        writeln!(writer, "# {} links", links.len())?;
        for link in links {
            // The first weight is implicit: 1 - bx - by - bz.
            let [_, bx, by, bz] = link.barycentric;
            writeln!(writer, "l {} {bx:.6} {by:.6} {bz:.6}", link.tetrahedron)?;
        }
    }
    Ok(())
}

/// Parse a tetrahedral mesh from text records.
///
/// Unknown record types are ignored, so the format can be extended without
/// breaking older readers.
///
/// # Errors
///
/// Returns an error if a record is malformed or a tetrahedron references a
/// vertex that has not been declared.
pub fn read_tet<R: BufRead>(reader: R) -> IoResult<(TetMesh, Vec<VertexLink>)> {
    let mut mesh = TetMesh::new();
    let mut links = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let number = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        match parts.next() {
            Some("v") => {
                let [x, y, z] = parse_floats(&mut parts, number)?;
                mesh.vertices.push(Vertex::from_coords(x, y, z));
            }
            Some("t") => {
                let mut indices = [0_u32; 4];
                for slot in &mut indices {
                    *slot = parse_token(&mut parts, number)?;
                }
                for &v in &indices {
                    if v as usize >= mesh.vertices.len() {
                        return Err(IoError::VertexOutOfRange {
                            line: number,
                            vertex: v,
                            vertex_count: mesh.vertices.len(),
                        });
                    }
                }
                mesh.tetrahedra.push(Tetrahedron::new(
                    indices[0], indices[1], indices[2], indices[3],
                ));
            }
            Some("l") => {
                let tetrahedron: u32 = parse_token(&mut parts, number)?;
                let [bx, by, bz] = parse_floats(&mut parts, number)?;
                links.push(VertexLink::new(
                    tetrahedron,
                    [1.0 - bx - by - bz, bx, by, bz],
                ));
            }
            _ => {}
        }
    }

    Ok((mesh, links))
}

fn parse_token<'a, T: std::str::FromStr>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> IoResult<T>
where
    T::Err: std::fmt::Display,
{
    let token = parts
        .next()
        .ok_or_else(|| IoError::invalid_content(line, "missing field"))?;
    token
        .parse()
        .map_err(|e: T::Err| IoError::invalid_content(line, format!("{token:?}: {e}")))
}

fn parse_floats<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> IoResult<[f64; 3]> {
    let mut values = [0.0_f64; 3];
    for slot in &mut values {
        *slot = parse_token(parts, line)?;
    }
    Ok(values)
}

/// Save a tetrahedral mesh to a text file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
///
/// # Example
///
/// ```no_run
/// use mesh_io::save_tet;
/// use mesh_types::TetMesh;
///
/// let mesh = TetMesh::new();
/// save_tet(&mesh, &[], "volume.tet")?;
/// # Ok::<(), mesh_io::IoError>(())
/// ```
pub fn save_tet<P: AsRef<Path>>(mesh: &TetMesh, links: &[VertexLink], path: P) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    write_tet(mesh, links, BufWriter::new(file))?;
    info!(
        path = %path.as_ref().display(),
        vertices = mesh.vertex_count(),
        tetrahedra = mesh.tet_count(),
        links = links.len(),
        "saved tetrahedral mesh"
    );
    Ok(())
}

/// Load a tetrahedral mesh from a text file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a record is malformed.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_tet;
///
/// let (mesh, links) = load_tet("volume.tet")?;
/// println!("{} tetrahedra, {} links", mesh.tet_count(), links.len());
/// # Ok::<(), mesh_io::IoError>(())
/// ```
pub fn load_tet<P: AsRef<Path>>(path: P) -> IoResult<(TetMesh, Vec<VertexLink>)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        }
    })?;
    let result = read_tet(BufReader::new(file))?;
    info!(
        path = %path.display(),
        vertices = result.0.vertex_count(),
        tetrahedra = result.0.tet_count(),
        links = result.1.len(),
        "loaded tetrahedral mesh"
    );
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_mesh() -> (TetMesh, Vec<VertexLink>) {
        let mut mesh = TetMesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 1.0));
        mesh.tetrahedra.push(Tetrahedron::new(0, 1, 2, 3));
        mesh.tetrahedra.push(Tetrahedron::new(1, 2, 3, 4));
        let links = vec![
            VertexLink::new(0, [0.25, 0.25, 0.25, 0.25]),
            VertexLink::new(1, [0.5, 0.125, 0.25, 0.125]),
        ];
        (mesh, links)
    }

    #[test]
    fn test_roundtrip_through_buffer() {
        let (mesh, links) = sample_mesh();
        let mut buffer = Vec::new();
        write_tet(&mesh, &links, &mut buffer).unwrap();

        let (loaded, loaded_links) = read_tet(&buffer[..]).unwrap();
        assert_eq!(loaded.vertex_count(), mesh.vertex_count());
        for (a, b) in loaded.vertices.iter().zip(&mesh.vertices) {
            assert_relative_eq!(a.position, b.position, epsilon = 1e-9);
        }
        // Equality is canonical, so reordered but identical elements match.
        assert_eq!(loaded.tetrahedra, mesh.tetrahedra);

        assert_eq!(loaded_links.len(), links.len());
        for (a, b) in loaded_links.iter().zip(&links) {
            assert_eq!(a.tetrahedron, b.tetrahedron);
            for (wa, wb) in a.barycentric.iter().zip(&b.barycentric) {
                assert_relative_eq!(*wa, *wb, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_roundtrip_through_file() {
        let (mesh, links) = sample_mesh();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.tet");

        save_tet(&mesh, &links, &path).unwrap();
        let (loaded, loaded_links) = load_tet(&path).unwrap();

        assert_eq!(loaded.vertex_count(), mesh.vertex_count());
        assert_eq!(loaded.tet_count(), mesh.tet_count());
        assert_eq!(loaded_links.len(), links.len());
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let text = "\
# header comment
v 0.0 0.0 0.0

v 1.0 0.0 0.0
v 0.0 1.0 0.0
# interleaved comment
v 0.0 0.0 1.0
t 0 1 2 3
";
        let (mesh, links) = read_tet(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.tet_count(), 1);
        assert!(links.is_empty());
    }

    #[test]
    fn test_link_weights_sum_to_one() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 0 0 1\nt 0 1 2 3\nl 0 0.1 0.2 0.3\n";
        let (_, links) = read_tet(text.as_bytes()).unwrap();
        assert_eq!(links.len(), 1);
        let sum: f64 = links[0].barycentric.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        assert_relative_eq!(links[0].barycentric[0], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_malformed_records() {
        assert!(matches!(
            read_tet("v 1.0 2.0".as_bytes()),
            Err(IoError::InvalidContent { line: 1, .. })
        ));
        assert!(matches!(
            read_tet("v not a number\n".as_bytes()),
            Err(IoError::InvalidContent { line: 1, .. })
        ));
        assert!(matches!(
            read_tet("v 0 0 0\nt 0 0 0 7\n".as_bytes()),
            Err(IoError::VertexOutOfRange {
                line: 2,
                vertex: 7,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_tet(dir.path().join("absent.tet")),
            Err(IoError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_unknown_records_are_skipped() {
        let text = "v 0 0 0\nn 1 0 0\nv 1 1 1\n";
        let (mesh, _) = read_tet(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 2);
    }
}
