//! Image sampling: decode elevation and color reference images into
//! normalized grids.
//!
//! A heightmap is decoded to grayscale and normalized so every sample lies
//! in `[0.0, 1.0]` (black = 0, white = 1). When the source resolution would
//! exceed the configured vertex budget the image is downsampled with a
//! triangle filter before normalization; images under the budget are never
//! upscaled. An optional color reference image is resampled with
//! nearest-neighbor filtering onto the exact height grid dimensions so the
//! two grids share indices.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest grid that can produce a solid: two rows and two columns.
pub const MIN_GRID_DIM: usize = 2;

/// Errors produced while turning source images into sample grids.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("input image not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image yields a {rows}x{cols} grid, need at least {min}x{min}", min = MIN_GRID_DIM)]
    GridTooSmall { rows: usize, cols: usize },

    #[error("height sample at ({row}, {col}) is {value}, expected a finite value in [0, 1]")]
    SampleOutOfRange { row: usize, col: usize, value: f32 },

    #[error("sample buffer holds {len} values, expected {rows}x{cols} = {expected}")]
    SampleCountMismatch {
        rows: usize,
        cols: usize,
        len: usize,
        expected: usize,
    },
}

pub type Result<T> = std::result::Result<T, SampleError>;

/// Controls how source images are reduced to grids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Upper bound on `rows * cols` of the height grid. Larger images are
    /// downsampled to fit, preserving aspect ratio.
    pub max_vertices: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_vertices: 250_000,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    fn budget(&self) -> usize {
        self.max_vertices.max(MIN_GRID_DIM * MIN_GRID_DIM)
    }
}

/// Normalized elevation samples in row-major order.
///
/// `get(row, col)` addresses the sample for image row `row` (top of the
/// image first) and column `col` (left first).
#[derive(Debug, Clone, PartialEq)]
pub struct HeightGrid {
    rows: usize,
    cols: usize,
    samples: Vec<f32>,
}

impl HeightGrid {
    /// Builds a grid from raw samples, validating dimensions and range.
    pub fn from_samples(rows: usize, cols: usize, samples: Vec<f32>) -> Result<Self> {
        if rows < MIN_GRID_DIM || cols < MIN_GRID_DIM {
            return Err(SampleError::GridTooSmall { rows, cols });
        }
        let expected = rows * cols;
        if samples.len() != expected {
            return Err(SampleError::SampleCountMismatch {
                rows,
                cols,
                len: samples.len(),
                expected,
            });
        }
        for (i, &value) in samples.iter().enumerate() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SampleError::SampleOutOfRange {
                    row: i / cols,
                    col: i % cols,
                    value,
                });
            }
        }
        Ok(Self {
            rows,
            cols,
            samples,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn vertex_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.samples[row * self.cols + col]
    }
}

/// RGB texels aligned index-for-index with a [`HeightGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGrid {
    rows: usize,
    cols: usize,
    texels: Vec<[u8; 3]>,
}

impl ColorGrid {
    pub fn from_texels(rows: usize, cols: usize, texels: Vec<[u8; 3]>) -> Result<Self> {
        if rows < MIN_GRID_DIM || cols < MIN_GRID_DIM {
            return Err(SampleError::GridTooSmall { rows, cols });
        }
        let expected = rows * cols;
        if texels.len() != expected {
            return Err(SampleError::SampleCountMismatch {
                rows,
                cols,
                len: texels.len(),
                expected,
            });
        }
        Ok(Self { rows, cols, texels })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> [u8; 3] {
        self.texels[row * self.cols + col]
    }
}

/// Decodes `path` to grayscale and returns the normalized height grid.
pub fn load_height_grid(path: &Path, config: &SamplerConfig) -> Result<HeightGrid> {
    if !path.exists() {
        return Err(SampleError::PathNotFound(path.to_path_buf()));
    }
    let image = image::open(path).map_err(|source| SampleError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = height_grid_from_gray(image.to_luma8(), config)?;
    debug!(
        path = %path.display(),
        rows = grid.rows(),
        cols = grid.cols(),
        "sampled height grid"
    );
    Ok(grid)
}

/// Decodes `path` to RGB and resamples it onto a `rows` x `cols` grid.
pub fn load_color_grid(path: &Path, rows: usize, cols: usize) -> Result<ColorGrid> {
    if !path.exists() {
        return Err(SampleError::PathNotFound(path.to_path_buf()));
    }
    let image = image::open(path).map_err(|source| SampleError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = color_grid_from_rgb(image.to_rgb8(), rows, cols)?;
    debug!(
        path = %path.display(),
        rows = grid.rows(),
        cols = grid.cols(),
        "sampled color grid"
    );
    Ok(grid)
}

fn height_grid_from_gray(gray: GrayImage, config: &SamplerConfig) -> Result<HeightGrid> {
    let (width, height) = gray.dimensions();
    let (rows, cols) = (height as usize, width as usize);
    if rows < MIN_GRID_DIM || cols < MIN_GRID_DIM {
        return Err(SampleError::GridTooSmall { rows, cols });
    }

    let (target_cols, target_rows) = target_dims(cols, rows, config.budget());
    let gray = if (target_rows, target_cols) == (rows, cols) {
        gray
    } else {
        debug!(
            from_rows = rows,
            from_cols = cols,
            to_rows = target_rows,
            to_cols = target_cols,
            "downsampling heightmap to vertex budget"
        );
        imageops::resize(
            &gray,
            target_cols as u32,
            target_rows as u32,
            FilterType::Triangle,
        )
    };

    let samples = gray
        .pixels()
        .map(|pixel| f32::from(pixel.0[0]) / 255.0)
        .collect();
    HeightGrid::from_samples(target_rows, target_cols, samples)
}

fn color_grid_from_rgb(rgb: RgbImage, rows: usize, cols: usize) -> Result<ColorGrid> {
    let rgb = if rgb.dimensions() == (cols as u32, rows as u32) {
        rgb
    } else {
        imageops::resize(&rgb, cols as u32, rows as u32, FilterType::Nearest)
    };
    let texels = rgb.pixels().map(|pixel| pixel.0).collect();
    ColorGrid::from_texels(rows, cols, texels)
}

/// Picks output dimensions that keep `cols * rows` within `budget` while
/// preserving aspect ratio. Never upscales and never drops below
/// [`MIN_GRID_DIM`] on either axis.
fn target_dims(cols: usize, rows: usize, budget: usize) -> (usize, usize) {
    let native = cols * rows;
    if native <= budget {
        return (cols, rows);
    }
    let scale = (budget as f64 / native as f64).sqrt();
    let mut target_cols = ((cols as f64 * scale).floor() as usize).max(MIN_GRID_DIM);
    let mut target_rows = ((rows as f64 * scale).floor() as usize).max(MIN_GRID_DIM);
    // Extreme aspect ratios can pin one axis at the minimum; shrink the
    // other axis so the budget still holds.
    if target_cols * target_rows > budget {
        if target_cols == MIN_GRID_DIM {
            target_rows = (budget / MIN_GRID_DIM).max(MIN_GRID_DIM);
        } else if target_rows == MIN_GRID_DIM {
            target_cols = (budget / MIN_GRID_DIM).max(MIN_GRID_DIM);
        }
    }
    (target_cols, target_rows)
}
