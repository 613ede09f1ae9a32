use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use relievo::{generate_with_config, BlockSpec, DisplacementMode, SamplerConfig};

/// Turn a grayscale heightmap image into a printable solid block.
///
/// Writes binary STL by default. Passing --color-reference drapes a color
/// image over the relief and switches the output to ASCII PLY.
#[derive(Parser)]
#[command(name = "img2solid", version, about)]
struct Args {
    /// Grayscale heightmap image; bright pixels read as high
    heightmap: PathBuf,

    /// Output file path
    #[arg(short, long)]
    output: PathBuf,

    /// Color image to drape over the relief (switches output to PLY)
    #[arg(long)]
    color_reference: Option<PathBuf>,

    /// Block width in millimeters, along X
    #[arg(long, default_value_t = 100.0)]
    width: f32,

    /// Block length in millimeters, along Y
    #[arg(long, default_value_t = 100.0)]
    length: f32,

    /// Slab thickness in millimeters before displacement
    #[arg(long, default_value_t = 10.0)]
    thickness: f32,

    /// Maximum relief displacement in millimeters
    #[arg(long, default_value_t = 5.0)]
    depth: f32,

    /// Extra vertical offset of the displaced surface, in millimeters
    #[arg(long, default_value_t = 0.0)]
    base_height: f32,

    /// Displacement mode: protrude or engrave
    #[arg(long, default_value = "protrude")]
    mode: DisplacementMode,

    /// Invert the heightmap (white reads as low)
    #[arg(long)]
    invert: bool,

    /// Block parameters as a JSON object; overrides the individual flags
    #[arg(long, value_name = "JSON")]
    params: Option<String>,

    /// Upper bound on height grid vertices before downsampling kicks in
    #[arg(long, default_value_t = 250_000)]
    max_vertices: usize,

    /// Print the artifact description as JSON instead of a summary line
    #[arg(long)]
    json: bool,
}

fn block_params(args: &Args) -> Result<BlockSpec, serde_json::Error> {
    if let Some(json) = &args.params {
        return serde_json::from_str(json);
    }
    Ok(BlockSpec::new()
        .with_width(args.width)
        .with_length(args.length)
        .with_thickness(args.thickness)
        .with_depth(args.depth)
        .with_base_height(args.base_height)
        .with_mode(args.mode)
        .with_invert(args.invert))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let params = match block_params(&args) {
        Ok(params) => params,
        Err(err) => {
            eprintln!("error: invalid --params JSON: {err}");
            return ExitCode::FAILURE;
        }
    };
    let config = SamplerConfig::new().with_max_vertices(args.max_vertices);

    match generate_with_config(
        &args.heightmap,
        &args.output,
        &params,
        args.color_reference.as_deref(),
        &config,
    ) {
        Ok(artifact) => {
            if args.json {
                match serde_json::to_string_pretty(&artifact) {
                    Ok(json) => println!("{json}"),
                    Err(err) => {
                        eprintln!("error: {err}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!(
                    "wrote {} ({}, {} vertices, {} triangles, {} bytes)",
                    artifact.path.display(),
                    artifact.format,
                    artifact.vertex_count,
                    artifact.triangle_count,
                    artifact.byte_size
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
