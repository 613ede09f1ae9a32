//! Mesh serialization formats.
//!
//! Two writers are provided: binary STL for plain geometry and ASCII PLY
//! when per-vertex color must survive the export. Format selection is
//! driven by the mesh itself through [`FormatManager::exporter_for`];
//! callers never pick an extension by hand.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod manager;
pub mod ply;
pub mod stl;

pub use manager::{get_manager, FormatManager, MeshExporter};
pub use ply::PlyFormat;
pub use stl::StlFormat;

/// Serialization formats the crate can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Binary STL, geometry only.
    Stl,
    /// ASCII PLY with per-vertex color.
    Ply,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Ply => "ply",
        }
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error type for serialization and parsing.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("{format} cannot represent this mesh: {reason}")]
    Unsupported {
        format: OutputFormat,
        reason: &'static str,
    },

    #[error("no registered format can represent this mesh")]
    NoExporter,

    #[error("malformed {format} data: {reason}")]
    Malformed {
        format: OutputFormat,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, FormatError>;
