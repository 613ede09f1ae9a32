//! Relievo turns grayscale heightmap images into printable solid meshes.
//!
//! Every bright pixel becomes elevation: the image is sampled into a
//! normalized grid, displaced onto the top surface of a physical block
//! (dimensions in millimeters), closed into a watertight solid with a flat
//! bottom and vertical walls, and serialized to binary STL. Attaching a
//! color reference image upgrades the output to ASCII PLY with per-vertex
//! color.
//!
//! # Quick start
//!
//! ```ignore
//! use relievo::{generate, BlockSpec, DisplacementMode};
//!
//! let params = BlockSpec::new()
//!     .with_thickness(8.0)
//!     .with_depth(3.0)
//!     .with_mode(DisplacementMode::Engrave);
//!
//! let artifact = generate(
//!     "portrait.png".as_ref(),
//!     "portrait.stl".as_ref(),
//!     &params,
//!     None,
//! )?;
//! println!("{} triangles -> {}", artifact.triangle_count, artifact.path.display());
//! ```
//!
//! # Pipeline
//!
//! 1. [`sampler`] decodes the images into normalized grids, downsampling
//!    to a vertex budget when needed.
//! 2. [`height_field`] maps samples to physical positions following a
//!    [`BlockSpec`]: protrude raises the relief out of the slab, engrave
//!    carves it in.
//! 3. [`mesh`] stitches the displaced surface, bottom face, and walls into
//!    a closed two-manifold solid.
//! 4. [`formats`] serializes the mesh; [`generator`] sequences all of the
//!    above and writes the file atomically from the caller's point of
//!    view.

pub mod formats;
pub mod generator;
pub mod height_field;
pub mod mesh;
pub mod sampler;

pub use formats::{FormatError, FormatManager, MeshExporter, OutputFormat};
pub use generator::{generate, generate_with_config, GenerateError, OutputArtifact, Stage};
pub use height_field::{displace, BlockSpec, DisplacementMode, ParamError, VertexGrid};
pub use mesh::{MeshBuilder, MeshError, SolidMesh, Triangle, Vertex};
pub use sampler::{ColorGrid, HeightGrid, SampleError, SamplerConfig};
