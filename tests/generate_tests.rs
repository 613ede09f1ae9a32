use std::fs;
use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use tempfile::tempdir;

use relievo::formats::stl::{from_stl, HEADER_LEN, TRIANGLE_RECORD_LEN};
use relievo::{
    generate, generate_with_config, BlockSpec, DisplacementMode, OutputFormat, SamplerConfig,
    Stage,
};

fn write_gradient(path: &Path, width: u32, height: u32) {
    GrayImage::from_fn(width, height, |x, _| {
        Luma([(x * 255 / (width - 1).max(1)) as u8])
    })
    .save(path)
    .unwrap();
}

fn write_uniform(path: &Path, width: u32, height: u32, value: u8) {
    GrayImage::from_pixel(width, height, Luma([value]))
        .save(path)
        .unwrap();
}

fn write_colors(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    })
    .save(path)
    .unwrap();
}

/// Plain heightmap in, binary STL out: artifact metadata, file length, and
/// parsed triangle count must all agree.
#[test]
fn generates_binary_stl_by_default() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("relief.png");
    let output = dir.path().join("relief.stl");
    write_gradient(&heightmap, 16, 12);

    let artifact = generate(&heightmap, &output, &BlockSpec::default(), None).unwrap();

    assert_eq!(artifact.format, OutputFormat::Stl);
    assert_eq!(artifact.path, output);
    // 16x12 pixels: top and bottom contribute 4 triangles per cell, the
    // walls 2 per boundary edge.
    assert_eq!(artifact.vertex_count, 2 * 16 * 12);
    assert_eq!(artifact.triangle_count, 4 * 15 * 11 + 4 * 15 + 4 * 11);

    let bytes = fs::read(&output).unwrap();
    assert_eq!(bytes.len() as u64, artifact.byte_size);
    assert_eq!(
        bytes.len(),
        HEADER_LEN + 4 + artifact.triangle_count * TRIANGLE_RECORD_LEN
    );
    assert_eq!(from_stl(&bytes).unwrap().len(), artifact.triangle_count);
}

/// Attaching a color reference switches the artifact to ASCII PLY, with
/// the reference resampled onto the height grid.
#[test]
fn generates_colored_ply_when_reference_is_given() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("relief.png");
    let reference = dir.path().join("colors.png");
    let output = dir.path().join("relief.ply");
    write_uniform(&heightmap, 8, 8, 96);
    write_colors(&reference, 32, 32);

    let artifact = generate(
        &heightmap,
        &output,
        &BlockSpec::default(),
        Some(&reference),
    )
    .unwrap();

    assert_eq!(artifact.format, OutputFormat::Ply);
    assert_eq!(artifact.vertex_count, 2 * 8 * 8);

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("ply\nformat ascii 1.0\n"));
    assert!(text.contains(&format!("element vertex {}\n", artifact.vertex_count)));
    assert!(text.contains(&format!("element face {}\n", artifact.triangle_count)));
}

/// A missing heightmap is a sample-stage error naming the path, and no
/// output file appears.
#[test]
fn missing_heightmap_fails_in_the_sample_stage() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("nope.png");
    let output = dir.path().join("out.stl");

    let err = generate(&heightmap, &output, &BlockSpec::default(), None).unwrap_err();
    assert_eq!(err.stage(), Stage::Sample);
    assert!(err.to_string().contains("nope.png"));
    assert!(!output.exists());
}

/// Bytes that are not an image fail decoding, tagged with the sample stage.
#[test]
fn undecodable_heightmap_fails_in_the_sample_stage() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("broken.png");
    let output = dir.path().join("out.stl");
    fs::write(&heightmap, b"this is not a png").unwrap();

    let err = generate(&heightmap, &output, &BlockSpec::default(), None).unwrap_err();
    assert_eq!(err.stage(), Stage::Sample);
    assert!(!output.exists());
}

/// Parameter validation runs before any file is touched: with both a bad
/// width and a missing heightmap, the width wins.
#[test]
fn invalid_parameters_fail_before_sampling() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("absent.png");
    let output = dir.path().join("out.stl");

    let params = BlockSpec::new().with_width(0.0);
    let err = generate(&heightmap, &output, &params, None).unwrap_err();
    assert_eq!(err.stage(), Stage::Validate);
    assert!(err.to_string().contains("width"));
    assert!(!output.exists());
}

/// A heightmap smaller than 2x2 cannot produce a solid.
#[test]
fn one_pixel_heightmap_is_rejected() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("dot.png");
    let output = dir.path().join("out.stl");
    write_uniform(&heightmap, 1, 1, 255);

    let err = generate(&heightmap, &output, &BlockSpec::default(), None).unwrap_err();
    assert_eq!(err.stage(), Stage::Sample);
    assert!(err.to_string().contains("at least"));
}

/// Running the same generation twice must produce byte-identical files,
/// for both formats.
#[test]
fn regeneration_is_byte_identical() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("relief.png");
    let reference = dir.path().join("colors.png");
    write_gradient(&heightmap, 10, 10);
    write_colors(&reference, 10, 10);

    let params = BlockSpec::new().with_depth(3.0);

    let first = dir.path().join("a.stl");
    let second = dir.path().join("b.stl");
    generate(&heightmap, &first, &params, None).unwrap();
    generate(&heightmap, &second, &params, None).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let first = dir.path().join("a.ply");
    let second = dir.path().join("b.ply");
    generate(&heightmap, &first, &params, Some(&reference)).unwrap();
    generate(&heightmap, &second, &params, Some(&reference)).unwrap();
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

/// When the filesystem refuses the write, the error carries the write
/// stage and nothing is left behind.
#[test]
fn failed_write_leaves_no_artifact() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("relief.png");
    let output = dir.path().join("no_such_dir").join("out.stl");
    write_gradient(&heightmap, 4, 4);

    let err = generate(&heightmap, &output, &BlockSpec::default(), None).unwrap_err();
    assert_eq!(err.stage(), Stage::Write);
    assert!(!output.exists());
}

/// Oversized inputs are downsampled to the vertex budget instead of
/// exploding the mesh.
#[test]
fn vertex_budget_caps_the_grid_resolution() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("big.png");
    let output = dir.path().join("big.stl");
    write_gradient(&heightmap, 200, 150);

    let config = SamplerConfig::new().with_max_vertices(5_000);
    let artifact = generate_with_config(
        &heightmap,
        &output,
        &BlockSpec::default(),
        None,
        &config,
    )
    .unwrap();

    assert!(
        artifact.vertex_count <= 2 * 5_000,
        "{} vertices exceed the budget",
        artifact.vertex_count
    );
    assert!(from_stl(&fs::read(&output).unwrap()).is_ok());
}

/// Engraving deeper than the slab clamps at the base plane: the whole
/// solid stays within [0, thickness].
#[test]
fn deep_engrave_never_pierces_the_base() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("relief.png");
    let output = dir.path().join("engraved.stl");
    write_gradient(&heightmap, 16, 8);

    let params = BlockSpec::new()
        .with_thickness(10.0)
        .with_depth(50.0)
        .with_mode(DisplacementMode::Engrave);
    generate(&heightmap, &output, &params, None).unwrap();

    let facets = from_stl(&fs::read(&output).unwrap()).unwrap();
    let mut min_z = f32::MAX;
    let mut max_z = f32::MIN;
    for facet in &facets {
        for vertex in &facet.vertices {
            min_z = min_z.min(vertex[2]);
            max_z = max_z.max(vertex[2]);
        }
    }
    assert_eq!(min_z, 0.0);
    assert_eq!(max_z, 10.0, "black pixels should keep the full slab");
}

/// A uniform mid-gray image lands exactly at the height the displacement
/// rule predicts for its sample value.
#[test]
fn uniform_gray_peaks_at_the_predicted_height() {
    let dir = tempdir().unwrap();
    let heightmap = dir.path().join("gray.png");
    let output = dir.path().join("gray.stl");
    write_uniform(&heightmap, 4, 4, 128);

    generate(&heightmap, &output, &BlockSpec::default(), None).unwrap();

    let expected = 10.0_f32 + 5.0 * (f32::from(128u8) / 255.0);
    let facets = from_stl(&fs::read(&output).unwrap()).unwrap();
    let max_z = facets
        .iter()
        .flat_map(|f| f.vertices.iter().map(|v| v[2]))
        .fold(f32::MIN, f32::max);
    assert_eq!(max_z, expected);
}
