//! End-to-end generation: images in, printable solid file out.
//!
//! [`generate`] runs the whole pipeline in order: validate the
//! [`BlockSpec`], sample the input images, displace the height field, build
//! the closed mesh, serialize, and write the artifact in one shot. The
//! output format is decided by the mesh itself: PLY when a color reference
//! was attached, STL otherwise. On any failure the error names the stage
//! that died and no partial file is left on disk.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::formats::{self, FormatError, OutputFormat};
use crate::height_field::{self, BlockSpec, ParamError};
use crate::mesh::{MeshBuilder, MeshError};
use crate::sampler::{self, SampleError, SamplerConfig};

/// Pipeline stage a [`GenerateError`] is tagged with.
///
/// Displacement has no stage of its own: once parameters and samples are
/// validated it cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Sample,
    Mesh,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::Sample => "sample",
            Self::Mesh => "mesh",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Error type for the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("validate stage: {0}")]
    Params(#[from] ParamError),

    #[error("sample stage: {0}")]
    Sample(#[from] SampleError),

    #[error("mesh stage: {0}")]
    Mesh(#[from] MeshError),

    #[error("write stage: {0}")]
    Format(#[from] FormatError),

    #[error("write stage: cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerateError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Params(_) => Stage::Validate,
            Self::Sample(_) => Stage::Sample,
            Self::Mesh(_) => Stage::Mesh,
            Self::Format(_) | Self::Write { .. } => Stage::Write,
        }
    }
}

/// Description of a file the generator wrote.
#[derive(Debug, Clone, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub byte_size: u64,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Generates a solid from `heightmap` and writes it to `output`.
///
/// Passing `color_reference` switches the artifact from binary STL to
/// colored ASCII PLY. Uses the default [`SamplerConfig`]; see
/// [`generate_with_config`] to tune the vertex budget.
pub fn generate(
    heightmap: &Path,
    output: &Path,
    params: &BlockSpec,
    color_reference: Option<&Path>,
) -> Result<OutputArtifact, GenerateError> {
    generate_with_config(
        heightmap,
        output,
        params,
        color_reference,
        &SamplerConfig::default(),
    )
}

pub fn generate_with_config(
    heightmap: &Path,
    output: &Path,
    params: &BlockSpec,
    color_reference: Option<&Path>,
    config: &SamplerConfig,
) -> Result<OutputArtifact, GenerateError> {
    params.validate()?;

    let heights = sampler::load_height_grid(heightmap, config)?;
    let colors = match color_reference {
        Some(path) => Some(sampler::load_color_grid(path, heights.rows(), heights.cols())?),
        None => None,
    };

    let vertices = height_field::displace(&heights, params);
    let mesh = MeshBuilder::new().build(&vertices, colors.as_ref())?;
    debug_assert!(mesh.is_watertight());

    let exporter = formats::get_manager()
        .exporter_for(&mesh)
        .ok_or(FormatError::NoExporter)?;
    let format = exporter.format();
    let bytes = exporter.write(&mesh)?;

    if let Err(source) = fs::write(output, &bytes) {
        // A failed write may leave a truncated file; remove it so callers
        // never see a partial artifact.
        let _ = fs::remove_file(output);
        return Err(GenerateError::Write {
            path: output.to_path_buf(),
            source,
        });
    }

    info!(
        path = %output.display(),
        format = %format,
        bytes = bytes.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "wrote solid"
    );

    Ok(OutputArtifact {
        path: output.to_path_buf(),
        format,
        byte_size: bytes.len() as u64,
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.triangle_count(),
    })
}
