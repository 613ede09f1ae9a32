//! Closed solid construction from a displaced height grid.
//!
//! [`MeshBuilder`] turns a [`VertexGrid`] into a watertight triangle mesh:
//! the displaced top surface, a flat bottom face at `z = 0`, and four
//! vertical walls stitching the two boundaries together. Boundary vertices
//! are shared between the surfaces and the walls, so closedness is a
//! property of the index structure itself: every edge is used by exactly
//! two triangles, once in each direction.
//!
//! Quads are split along the diagonal that runs from the low-row/low-col
//! corner to the high-row/high-col corner, and triangles wind
//! counter-clockwise when seen from outside the solid.

use std::collections::HashMap;

use tracing::debug;

use crate::height_field::VertexGrid;
use crate::sampler::ColorGrid;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error type for mesh construction.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("degenerate mesh: {0}")]
    Degenerate(&'static str),

    #[error("color grid is {color_rows}x{color_cols} but height grid is {rows}x{cols}")]
    ColorDimensionMismatch {
        rows: usize,
        cols: usize,
        color_rows: usize,
        color_cols: usize,
    },
}

pub type Result<T> = std::result::Result<T, MeshError>;

// ─── Mesh data ───────────────────────────────────────────────────────────────

/// A mesh vertex: position in millimeters, optional sRGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: Option<[u8; 3]>,
}

/// Indexed triangle. Indices reference [`SolidMesh::vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub indices: [u32; 3],
}

impl Triangle {
    /// Unit facet normal from the cross product of two edges.
    ///
    /// Returns the zero vector for a zero-area triangle; consumers that
    /// need a direction recompute from adjacent geometry.
    pub fn normal(&self, vertices: &[Vertex]) -> [f32; 3] {
        let [a, b, c] = self.indices;
        let pa = vertices[a as usize].position;
        let pb = vertices[b as usize].position;
        let pc = vertices[c as usize].position;
        let u = [pb[0] - pa[0], pb[1] - pa[1], pb[2] - pa[2]];
        let v = [pc[0] - pa[0], pc[1] - pa[1], pc[2] - pa[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > f32::EPSILON {
            [n[0] / len, n[1] / len, n[2] / len]
        } else {
            [0.0, 0.0, 0.0]
        }
    }
}

/// A closed triangle mesh ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidMesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    has_color: bool,
}

impl SolidMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// True when every vertex carries a color sample.
    pub fn has_color(&self) -> bool {
        self.has_color
    }

    /// Verifies two-manifold closedness over the index structure: every
    /// directed edge must occur exactly once, paired with its reverse.
    pub fn is_watertight(&self) -> bool {
        let mut edges: HashMap<(u32, u32), u32> = HashMap::new();
        for triangle in &self.triangles {
            let [a, b, c] = triangle.indices;
            for (from, to) in [(a, b), (b, c), (c, a)] {
                *edges.entry((from, to)).or_insert(0) += 1;
            }
        }
        edges
            .iter()
            .all(|(&(from, to), &count)| count == 1 && edges.get(&(to, from)) == Some(&1))
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Builds a [`SolidMesh`] from a displaced grid and an optional color grid.
#[derive(Debug, Clone, Default)]
pub struct MeshBuilder {
    base_color: Option<[u8; 3]>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paints the bottom face with a fixed color instead of inheriting the
    /// color of the top-surface vertex directly above. Only takes effect
    /// when a color grid is attached.
    pub fn with_base_color(mut self, color: [u8; 3]) -> Self {
        self.base_color = Some(color);
        self
    }

    pub fn build(&self, grid: &VertexGrid, color: Option<&ColorGrid>) -> Result<SolidMesh> {
        let (rows, cols) = (grid.rows(), grid.cols());
        if rows < 2 || cols < 2 {
            return Err(MeshError::Degenerate("height grid must be at least 2x2"));
        }
        if let Some(color) = color {
            if color.rows() != rows || color.cols() != cols {
                return Err(MeshError::ColorDimensionMismatch {
                    rows,
                    cols,
                    color_rows: color.rows(),
                    color_cols: color.cols(),
                });
            }
        }
        let x_extent = grid.get(0, cols - 1)[0] - grid.get(0, 0)[0];
        let y_extent = grid.get(rows - 1, 0)[1] - grid.get(0, 0)[1];
        if !(x_extent.is_finite() && x_extent > 0.0) {
            return Err(MeshError::Degenerate("footprint width collapsed to zero"));
        }
        if !(y_extent.is_finite() && y_extent > 0.0) {
            return Err(MeshError::Degenerate("footprint length collapsed to zero"));
        }

        let top_count = rows * cols;
        let mut vertices = Vec::with_capacity(2 * top_count);

        // Top surface vertices, then their projections on the base plane.
        // Bottom positions copy the top x/y so walls are exactly vertical.
        for row in 0..rows {
            for col in 0..cols {
                vertices.push(Vertex {
                    position: grid.get(row, col),
                    color: color.map(|c| c.get(row, col)),
                });
            }
        }
        for row in 0..rows {
            for col in 0..cols {
                let [x, y, _] = grid.get(row, col);
                let bottom_color = color.map(|c| self.base_color.unwrap_or(c.get(row, col)));
                vertices.push(Vertex {
                    position: [x, y, 0.0],
                    color: bottom_color,
                });
            }
        }

        let top = |row: usize, col: usize| (row * cols + col) as u32;
        let bottom = |row: usize, col: usize| (top_count + row * cols + col) as u32;

        let cell_count = (rows - 1) * (cols - 1);
        let wall_count = 2 * (rows - 1) + 2 * (cols - 1);
        let mut triangles = Vec::with_capacity(4 * cell_count + 2 * wall_count);
        let mut push = |a: u32, b: u32, c: u32| {
            triangles.push(Triangle { indices: [a, b, c] });
        };

        // Top face: normals up. Bottom face: same cells, winding reversed.
        for row in 0..rows - 1 {
            for col in 0..cols - 1 {
                let (a, b) = (top(row, col), top(row, col + 1));
                let (c, d) = (top(row + 1, col), top(row + 1, col + 1));
                push(a, b, d);
                push(a, d, c);

                let (a, b) = (bottom(row, col), bottom(row, col + 1));
                let (c, d) = (bottom(row + 1, col), bottom(row + 1, col + 1));
                push(a, d, b);
                push(a, c, d);
            }
        }

        // Walls along the row-0 and row-max boundaries.
        for col in 0..cols - 1 {
            let (t0, t1) = (top(0, col), top(0, col + 1));
            let (b0, b1) = (bottom(0, col), bottom(0, col + 1));
            push(b0, b1, t1);
            push(b0, t1, t0);

            let (t0, t1) = (top(rows - 1, col), top(rows - 1, col + 1));
            let (b0, b1) = (bottom(rows - 1, col), bottom(rows - 1, col + 1));
            push(b1, b0, t0);
            push(b1, t0, t1);
        }

        // Walls along the col-0 and col-max boundaries.
        for row in 0..rows - 1 {
            let (t0, t1) = (top(row, 0), top(row + 1, 0));
            let (b0, b1) = (bottom(row, 0), bottom(row + 1, 0));
            push(b1, b0, t0);
            push(b1, t0, t1);

            let (t0, t1) = (top(row, cols - 1), top(row + 1, cols - 1));
            let (b0, b1) = (bottom(row, cols - 1), bottom(row + 1, cols - 1));
            push(b0, b1, t1);
            push(b0, t1, t0);
        }

        debug!(
            vertices = vertices.len(),
            triangles = triangles.len(),
            colored = color.is_some(),
            "built solid mesh"
        );

        Ok(SolidMesh {
            vertices,
            triangles,
            has_color: color.is_some(),
        })
    }
}
