//! Binary STL, the lingua franca of slicers.
//!
//! Layout: an 80-byte header (padded with spaces, never starting with
//! `solid`), a little-endian `u32` triangle count, then one 50-byte record
//! per triangle: twelve little-endian `f32`s (facet normal followed by the
//! three vertices) and two attribute bytes that are always zero. The header
//! is a fixed constant, so identical meshes serialize to identical bytes.

use crate::formats::manager::MeshExporter;
use crate::formats::{FormatError, OutputFormat, Result};
use crate::mesh::SolidMesh;

pub const HEADER_LEN: usize = 80;
pub const TRIANGLE_RECORD_LEN: usize = 50;
const HEADER_TEXT: &[u8] = b"relievo heightmap solid";

pub struct StlFormat;

impl MeshExporter for StlFormat {
    fn format(&self) -> OutputFormat {
        OutputFormat::Stl
    }

    fn detect(&self, data: &[u8]) -> bool {
        if data.len() < HEADER_LEN + 4 {
            return false;
        }
        let count = read_u32_le(data, HEADER_LEN) as u64;
        data.len() as u64 == (HEADER_LEN + 4) as u64 + count * TRIANGLE_RECORD_LEN as u64
    }

    fn supports(&self, _mesh: &SolidMesh) -> bool {
        // Geometry-only: any mesh fits, color is dropped.
        true
    }

    fn write(&self, mesh: &SolidMesh) -> Result<Vec<u8>> {
        to_stl(mesh)
    }
}

/// One facet as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StlTriangle {
    pub normal: [f32; 3],
    pub vertices: [[f32; 3]; 3],
}

/// Serializes `mesh` to binary STL bytes.
pub fn to_stl(mesh: &SolidMesh) -> Result<Vec<u8>> {
    let count = u32::try_from(mesh.triangle_count()).map_err(|_| FormatError::Unsupported {
        format: OutputFormat::Stl,
        reason: "triangle count exceeds u32",
    })?;

    let mut buf =
        Vec::with_capacity(HEADER_LEN + 4 + mesh.triangle_count() * TRIANGLE_RECORD_LEN);
    buf.extend_from_slice(&header());
    buf.extend_from_slice(&count.to_le_bytes());
    for triangle in &mesh.triangles {
        for component in triangle.normal(&mesh.vertices) {
            buf.extend_from_slice(&component.to_le_bytes());
        }
        for &index in &triangle.indices {
            for component in mesh.vertices[index as usize].position {
                buf.extend_from_slice(&component.to_le_bytes());
            }
        }
        buf.extend_from_slice(&[0u8, 0u8]);
    }
    Ok(buf)
}

/// Parses binary STL bytes back into facets.
pub fn from_stl(data: &[u8]) -> Result<Vec<StlTriangle>> {
    if data.len() < HEADER_LEN + 4 {
        return Err(FormatError::Malformed {
            format: OutputFormat::Stl,
            reason: "data too short for header and triangle count".to_string(),
        });
    }
    let count = read_u32_le(data, HEADER_LEN) as u64;
    let expected = (HEADER_LEN + 4) as u64 + count * TRIANGLE_RECORD_LEN as u64;
    if data.len() as u64 != expected {
        return Err(FormatError::Malformed {
            format: OutputFormat::Stl,
            reason: format!(
                "length {} does not match {} declared triangles",
                data.len(),
                count
            ),
        });
    }

    let mut triangles = Vec::with_capacity(count as usize);
    let mut offset = HEADER_LEN + 4;
    for _ in 0..count {
        let normal = read_vec3(data, offset);
        let vertices = [
            read_vec3(data, offset + 12),
            read_vec3(data, offset + 24),
            read_vec3(data, offset + 36),
        ];
        triangles.push(StlTriangle { normal, vertices });
        offset += TRIANGLE_RECORD_LEN;
    }
    Ok(triangles)
}

/// The constant 80-byte header: identifying text, space-padded.
pub fn header() -> [u8; HEADER_LEN] {
    let mut header = [b' '; HEADER_LEN];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    header
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    let mut quad = [0u8; 4];
    quad.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(quad)
}

fn read_f32_le(data: &[u8], offset: usize) -> f32 {
    let mut quad = [0u8; 4];
    quad.copy_from_slice(&data[offset..offset + 4]);
    f32::from_le_bytes(quad)
}

fn read_vec3(data: &[u8], offset: usize) -> [f32; 3] {
    [
        read_f32_le(data, offset),
        read_f32_le(data, offset + 4),
        read_f32_le(data, offset + 8),
    ]
}
