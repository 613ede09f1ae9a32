//! ASCII PLY, used whenever per-vertex color must survive the export.
//!
//! The header declares positions as `float x/y/z` and colors as
//! `uchar red/green/blue`; faces are index triples. Everything is written
//! with plain `Display` formatting, so a given mesh always produces the
//! same bytes.

use crate::formats::manager::MeshExporter;
use crate::formats::{FormatError, OutputFormat, Result};
use crate::mesh::SolidMesh;

pub struct PlyFormat;

impl MeshExporter for PlyFormat {
    fn format(&self) -> OutputFormat {
        OutputFormat::Ply
    }

    fn detect(&self, data: &[u8]) -> bool {
        data.starts_with(b"ply\n")
    }

    fn supports(&self, mesh: &SolidMesh) -> bool {
        mesh.has_color()
    }

    fn write(&self, mesh: &SolidMesh) -> Result<Vec<u8>> {
        to_ply(mesh)
    }
}

/// Serializes `mesh` to ASCII PLY bytes with per-vertex color.
pub fn to_ply(mesh: &SolidMesh) -> Result<Vec<u8>> {
    if !mesh.has_color() {
        return Err(FormatError::Unsupported {
            format: OutputFormat::Ply,
            reason: "mesh has no per-vertex color",
        });
    }

    let mut out =
        String::with_capacity(256 + mesh.vertex_count() * 40 + mesh.triangle_count() * 24);
    out.push_str("ply\n");
    out.push_str("format ascii 1.0\n");
    out.push_str("comment exported by relievo\n");
    out.push_str(&format!("element vertex {}\n", mesh.vertex_count()));
    out.push_str("property float x\n");
    out.push_str("property float y\n");
    out.push_str("property float z\n");
    out.push_str("property uchar red\n");
    out.push_str("property uchar green\n");
    out.push_str("property uchar blue\n");
    out.push_str(&format!("element face {}\n", mesh.triangle_count()));
    out.push_str("property list uchar int vertex_indices\n");
    out.push_str("end_header\n");

    for vertex in &mesh.vertices {
        let [red, green, blue] = vertex.color.ok_or(FormatError::Unsupported {
            format: OutputFormat::Ply,
            reason: "vertex missing its color sample",
        })?;
        let [x, y, z] = vertex.position;
        out.push_str(&format!("{} {} {} {} {} {}\n", x, y, z, red, green, blue));
    }
    for triangle in &mesh.triangles {
        let [a, b, c] = triangle.indices;
        out.push_str(&format!("3 {} {} {}\n", a, b, c));
    }
    Ok(out.into_bytes())
}
