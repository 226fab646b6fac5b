//! OFF text export and import of an [`ExactMesh`] boundary.
//!
//! ```text
//! OFF
//! <vertex count> <face count> 0
//! x y z                      (one line per vertex)
//! n i0 i1 .. in-1            (one line per face, 0-based indices)
//! ```

use crate::float_types::Real;
use crate::io::IoError;
use crate::mesh::ExactMesh;
use nalgebra::Point3;
use std::fmt::Write as _;
use std::path::Path;

/// Convert the boundary of `mesh` to an OFF document.
///
/// ```rust
/// # use stipplecsg::csg::{Prism, Primitive};
/// # use stipplecsg::io::off::{to_off, from_off};
/// let prism = Prism::new(2.0).mesh().expect("valid prism");
/// let text = to_off(&prism);
/// assert!(text.starts_with("OFF\n8 12 0\n"));
/// assert_eq!(from_off(&text).expect("round trip").face_count(), 12);
/// ```
pub fn to_off(mesh: &ExactMesh) -> String {
    let mut out = String::new();
    out.push_str("OFF\n");
    let _ = writeln!(out, "{} {} 0", mesh.vertex_count(), mesh.face_count());
    for p in mesh.vertices() {
        let _ = writeln!(out, "{} {} {}", p.x, p.y, p.z);
    }
    for face in mesh.faces() {
        let _ = write!(out, "{}", face.len());
        for index in face {
            let _ = write!(out, " {index}");
        }
        out.push('\n');
    }
    out
}

/// Write the OFF document for `mesh` to any writer.
pub fn write_off<W: std::io::Write>(mesh: &ExactMesh, mut writer: W) -> Result<(), IoError> {
    writer.write_all(to_off(mesh).as_bytes())?;
    Ok(())
}

pub fn save_off(mesh: &ExactMesh, path: impl AsRef<Path>) -> Result<(), IoError> {
    let file = std::fs::File::create(path)?;
    write_off(mesh, std::io::BufWriter::new(file))
}

/// Parse an OFF document. The leading `OFF` line is optional.
pub fn from_off(text: &str) -> Result<ExactMesh, IoError> {
    let mut lines = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty());

    let mut header = lines
        .next()
        .ok_or_else(|| IoError::MalformedInput("empty document".into()))?;
    if header == "OFF" {
        header = lines
            .next()
            .ok_or_else(|| IoError::MalformedInput("missing counts line".into()))?;
    }

    let counts: Vec<usize> = header
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()?;
    let (vertex_count, face_count) = match counts.as_slice() {
        [v, f] | [v, f, _] => (*v, *f),
        _ => return Err(IoError::MalformedInput(format!("bad counts line '{header}'"))),
    };
    let remaining = lines.clone().count();
    if vertex_count.saturating_add(face_count) > remaining {
        return Err(IoError::MalformedInput(format!(
            "header announces {vertex_count} vertices and {face_count} faces but only {remaining} lines follow"
        )));
    }

    let mut vertices = Vec::with_capacity(vertex_count);
    for n in 0..vertex_count {
        let line = lines
            .next()
            .ok_or_else(|| IoError::MalformedInput(format!("missing vertex {n}")))?;
        let coords: Vec<Real> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()?;
        let &[x, y, z] = coords.as_slice() else {
            return Err(IoError::MalformedInput(format!("vertex {n} needs 3 coordinates")));
        };
        vertices.push(Point3::new(x, y, z));
    }

    let mut faces = Vec::with_capacity(face_count);
    for n in 0..face_count {
        let line = lines
            .next()
            .ok_or_else(|| IoError::MalformedInput(format!("missing face {n}")))?;
        let values: Vec<usize> = line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()?;
        let Some((&len, indices)) = values.split_first() else {
            return Err(IoError::MalformedInput(format!("face {n} is empty")));
        };
        // trailing colour components are allowed
        if indices.len() < len {
            return Err(IoError::MalformedInput(format!(
                "face {n} announces {len} indices but lists {}",
                indices.len()
            )));
        }
        faces.push(indices[..len].to_vec());
    }

    ExactMesh::from_faces(vertices, faces)
        .map_err(|error| IoError::MalformedInput(error.to_string()))
}

pub fn load_off(path: impl AsRef<Path>) -> Result<ExactMesh, IoError> {
    from_off(&std::fs::read_to_string(path)?)
}
