use std::sync::OnceLock;

use crate::formats::{OutputFormat, Result};
use crate::mesh::SolidMesh;

pub trait MeshExporter: Send + Sync {
    fn format(&self) -> OutputFormat;
    /// Sniffs serialized bytes previously produced by this format.
    fn detect(&self, data: &[u8]) -> bool;
    /// Whether this format can represent `mesh` without losing required
    /// attributes.
    fn supports(&self, mesh: &SolidMesh) -> bool;
    fn write(&self, mesh: &SolidMesh) -> Result<Vec<u8>>;
}

pub struct FormatManager {
    exporters: Vec<Box<dyn MeshExporter>>,
}

impl FormatManager {
    pub fn new() -> Self {
        Self {
            exporters: Vec::new(),
        }
    }

    pub fn register_exporter<E: MeshExporter + 'static>(&mut self, exporter: E) {
        self.exporters.push(Box::new(exporter));
    }

    pub fn detect_format(&self, data: &[u8]) -> Option<OutputFormat> {
        for exporter in &self.exporters {
            if exporter.detect(data) {
                return Some(exporter.format());
            }
        }
        None
    }

    /// Picks the first registered exporter that can represent `mesh`.
    pub fn exporter_for(&self, mesh: &SolidMesh) -> Option<&dyn MeshExporter> {
        for exporter in &self.exporters {
            if exporter.supports(mesh) {
                return Some(exporter.as_ref());
            }
        }
        None
    }

    pub fn write(&self, format: OutputFormat, mesh: &SolidMesh) -> Result<Vec<u8>> {
        for exporter in &self.exporters {
            if exporter.format() == format {
                return exporter.write(mesh);
            }
        }
        Err(crate::formats::FormatError::NoExporter)
    }

    pub fn list_exporters(&self) -> Vec<OutputFormat> {
        self.exporters.iter().map(|e| e.format()).collect()
    }
}

impl Default for FormatManager {
    fn default() -> Self {
        Self::new()
    }
}

static MANAGER: OnceLock<FormatManager> = OnceLock::new();

pub fn get_manager() -> &'static FormatManager {
    MANAGER.get_or_init(|| {
        let mut manager = FormatManager::new();
        // PLY first: STL accepts any mesh, so it must be the fallback.
        manager.register_exporter(crate::formats::ply::PlyFormat);
        manager.register_exporter(crate::formats::stl::StlFormat);
        manager
    })
}
