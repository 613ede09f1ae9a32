//! Height field construction: map normalized samples to physical
//! top-surface positions.
//!
//! A [`BlockSpec`] describes the printed block in millimeters. Displacement
//! starts from the slab top at `thickness + base_height` and either raises
//! the surface by `depth * sample` ([`DisplacementMode::Protrude`]) or sinks
//! it by the same amount ([`DisplacementMode::Engrave`]). Engraved surfaces
//! are clamped at the base plane `z = 0` so a depth larger than the slab can
//! never push geometry below the bottom face.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sampler::HeightGrid;

/// Parameter validation errors for [`BlockSpec`].
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("invalid {field}: {value} ({reason})")]
    Invalid {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("unknown displacement mode {0:?}, expected \"protrude\" or \"engrave\"")]
    UnknownMode(String),
}

/// How elevation samples displace the block's top surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplacementMode {
    /// Bright samples rise out of the slab.
    Protrude,
    /// Bright samples carve into the slab.
    Engrave,
}

impl Default for DisplacementMode {
    fn default() -> Self {
        Self::Protrude
    }
}

impl fmt::Display for DisplacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protrude => write!(f, "protrude"),
            Self::Engrave => write!(f, "engrave"),
        }
    }
}

impl FromStr for DisplacementMode {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "protrude" => Ok(Self::Protrude),
            "engrave" => Ok(Self::Engrave),
            other => Err(ParamError::UnknownMode(other.to_string())),
        }
    }
}

/// Physical description of the output block, in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockSpec {
    /// Footprint extent along X.
    pub width: f32,
    /// Footprint extent along Y.
    pub length: f32,
    /// Slab height before displacement.
    pub thickness: f32,
    /// Maximum relief displacement.
    pub depth: f32,
    /// Extra offset between the slab top and the displaced surface origin.
    pub base_height: f32,
    pub mode: DisplacementMode,
    /// Flip samples (`h := 1 - h`) before displacing.
    pub invert: bool,
}

impl Default for BlockSpec {
    fn default() -> Self {
        Self {
            width: 100.0,
            length: 100.0,
            thickness: 10.0,
            depth: 5.0,
            base_height: 0.0,
            mode: DisplacementMode::Protrude,
            invert: false,
        }
    }
}

impl BlockSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    pub fn with_thickness(mut self, thickness: f32) -> Self {
        self.thickness = thickness;
        self
    }

    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_base_height(mut self, base_height: f32) -> Self {
        self.base_height = base_height;
        self
    }

    pub fn with_mode(mut self, mode: DisplacementMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Checks every parameter and names the first offending field.
    pub fn validate(&self) -> Result<(), ParamError> {
        for (field, value) in [
            ("width", self.width),
            ("length", self.length),
            ("thickness", self.thickness),
        ] {
            if !value.is_finite() {
                return Err(ParamError::Invalid {
                    field,
                    value,
                    reason: "must be a finite number",
                });
            }
            if value <= 0.0 {
                return Err(ParamError::Invalid {
                    field,
                    value,
                    reason: "must be positive",
                });
            }
        }
        if !self.depth.is_finite() || self.depth < 0.0 {
            return Err(ParamError::Invalid {
                field: "depth",
                value: self.depth,
                reason: "must be zero or positive",
            });
        }
        if !self.base_height.is_finite() {
            return Err(ParamError::Invalid {
                field: "base_height",
                value: self.base_height,
                reason: "must be a finite number",
            });
        }
        if self.thickness + self.base_height <= 0.0 {
            return Err(ParamError::Invalid {
                field: "base_height",
                value: self.base_height,
                reason: "thickness + base_height must be positive",
            });
        }
        Ok(())
    }

    /// Top of the undisplaced slab.
    pub fn surface_z(&self) -> f32 {
        self.thickness + self.base_height
    }
}

/// Physical top-surface positions, one per height sample, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGrid {
    rows: usize,
    cols: usize,
    positions: Vec<[f32; 3]>,
}

impl VertexGrid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> [f32; 3] {
        self.positions[row * self.cols + col]
    }
}

/// Maps every sample of `grid` to a physical position on the block's top
/// surface.
///
/// Row 0 / column 0 (the image's top-left corner) lands at the footprint
/// origin `(0, 0)`; the opposite corner lands at `(width, length)`. The
/// vertical placement follows `spec.mode` as described in the module docs.
pub fn displace(grid: &HeightGrid, spec: &BlockSpec) -> VertexGrid {
    let (rows, cols) = (grid.rows(), grid.cols());
    let col_span = (cols - 1) as f32;
    let row_span = (rows - 1) as f32;
    let surface = spec.surface_z();

    let mut positions = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let y = row as f32 / row_span * spec.length;
        for col in 0..cols {
            let x = col as f32 / col_span * spec.width;
            let mut sample = grid.get(row, col);
            if spec.invert {
                sample = 1.0 - sample;
            }
            let z = match spec.mode {
                DisplacementMode::Protrude => surface + spec.depth * sample,
                DisplacementMode::Engrave => (surface - spec.depth * sample).max(0.0),
            };
            positions.push([x, y, z]);
        }
    }

    VertexGrid {
        rows,
        cols,
        positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_grid(rows: usize, cols: usize, value: f32) -> HeightGrid {
        HeightGrid::from_samples(rows, cols, vec![value; rows * cols]).unwrap()
    }

    #[test]
    fn default_params_validate() {
        assert!(BlockSpec::default().validate().is_ok());
    }

    #[test]
    fn zero_width_is_rejected_with_field_name() {
        let err = BlockSpec::new().with_width(0.0).validate().unwrap_err();
        assert!(err.to_string().contains("width"));
    }

    #[test]
    fn nan_depth_is_rejected() {
        let err = BlockSpec::new().with_depth(f32::NAN).validate().unwrap_err();
        assert!(matches!(err, ParamError::Invalid { field: "depth", .. }));
    }

    #[test]
    fn negative_depth_is_rejected() {
        assert!(BlockSpec::new().with_depth(-1.0).validate().is_err());
    }

    #[test]
    fn sunken_slab_top_is_rejected() {
        let err = BlockSpec::new()
            .with_thickness(5.0)
            .with_base_height(-5.0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("base_height"));
    }

    #[test]
    fn mode_parses_exact_names_only() {
        assert_eq!(
            "protrude".parse::<DisplacementMode>().unwrap(),
            DisplacementMode::Protrude
        );
        assert_eq!(
            "engrave".parse::<DisplacementMode>().unwrap(),
            DisplacementMode::Engrave
        );
        let err = "emboss".parse::<DisplacementMode>().unwrap_err();
        assert!(matches!(err, ParamError::UnknownMode(_)));
    }

    #[test]
    fn mode_serde_round_trips_lowercase() {
        let json = serde_json::to_string(&DisplacementMode::Engrave).unwrap();
        assert_eq!(json, "\"engrave\"");
        let back: DisplacementMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DisplacementMode::Engrave);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: BlockSpec =
            serde_json::from_str(r#"{"depth": 2.5, "mode": "engrave"}"#).unwrap();
        assert_eq!(params.depth, 2.5);
        assert_eq!(params.mode, DisplacementMode::Engrave);
        assert_eq!(params.width, 100.0);
        assert!(!params.invert);
    }

    #[test]
    fn protrude_raises_surface_by_depth_times_sample() {
        let grid = uniform_grid(2, 2, 0.5);
        let params = BlockSpec::new()
            .with_thickness(10.0)
            .with_depth(5.0)
            .with_base_height(0.0);
        let vertices = displace(&grid, &params);
        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(vertices.get(row, col)[2], 12.5);
            }
        }
    }

    #[test]
    fn engrave_sinks_surface_by_depth_times_sample() {
        let grid = uniform_grid(2, 2, 1.0);
        let params = BlockSpec::new()
            .with_thickness(10.0)
            .with_depth(5.0)
            .with_mode(DisplacementMode::Engrave);
        let vertices = displace(&grid, &params);
        assert_eq!(vertices.get(0, 0)[2], 5.0);
    }

    #[test]
    fn engrave_clamps_at_base_plane() {
        let grid = uniform_grid(2, 2, 1.0);
        let params = BlockSpec::new()
            .with_thickness(10.0)
            .with_depth(50.0)
            .with_mode(DisplacementMode::Engrave);
        let vertices = displace(&grid, &params);
        assert_eq!(vertices.get(1, 1)[2], 0.0);
    }

    #[test]
    fn invert_flips_samples_before_displacing() {
        let grid = uniform_grid(2, 2, 1.0);
        let params = BlockSpec::new()
            .with_thickness(10.0)
            .with_depth(5.0)
            .with_invert(true);
        let vertices = displace(&grid, &params);
        // Inverted full-white behaves like black: no displacement.
        assert_eq!(vertices.get(0, 0)[2], 10.0);
    }

    #[test]
    fn zero_depth_modes_agree() {
        let grid = HeightGrid::from_samples(2, 3, vec![0.0, 0.3, 0.6, 0.9, 0.2, 1.0]).unwrap();
        let protrude = BlockSpec::new().with_depth(0.0);
        let engrave = BlockSpec::new()
            .with_depth(0.0)
            .with_mode(DisplacementMode::Engrave);
        assert_eq!(displace(&grid, &protrude), displace(&grid, &engrave));
    }

    #[test]
    fn footprint_spans_zero_to_extent() {
        let grid = uniform_grid(3, 5, 0.0);
        let params = BlockSpec::new().with_width(40.0).with_length(20.0);
        let vertices = displace(&grid, &params);
        assert_eq!(vertices.get(0, 0)[0], 0.0);
        assert_eq!(vertices.get(0, 4)[0], 40.0);
        assert_eq!(vertices.get(0, 0)[1], 0.0);
        assert_eq!(vertices.get(2, 0)[1], 20.0);
    }

    #[test]
    fn base_height_lifts_the_whole_surface() {
        let grid = uniform_grid(2, 2, 0.0);
        let params = BlockSpec::new().with_thickness(10.0).with_base_height(3.0);
        let vertices = displace(&grid, &params);
        assert_eq!(vertices.get(0, 0)[2], 13.0);
    }
}
