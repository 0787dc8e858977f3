//! Brickify CLI - Convert triangle meshes into LDraw brick models
//!
//! Command-line interface for turning OBJ/JSON meshes into layered brick plans.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use brickify::{convert_mesh, load_mesh, write_atomic, ColorCatalog, ConvertConfig, OutputFormat};

#[derive(Parser)]
#[command(name = "brickify")]
#[command(author, version, about = "Convert triangle meshes into LDraw brick models")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// LDraw model file
    Ldr,
    /// Plain-text per-layer brick report
    Plan,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Ldr => OutputFormat::Ldr,
            FormatArg::Plan => OutputFormat::Plan,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a mesh file into a brick model
    Convert {
        /// Input mesh (.obj or .json)
        input: PathBuf,

        /// Output file path
        output: PathBuf,

        /// Target box edge in bricks (box is r × r × r/2)
        resolution: Option<u32>,

        /// Voxel edge length in target-box units
        #[arg(long)]
        pitch: Option<f32>,

        /// Maximum number of brick layers
        #[arg(long)]
        max_layers: Option<u32>,

        /// Keep slices hollow instead of filling enclosed voids
        #[arg(long)]
        no_fill: bool,

        /// Skip color assignment even when the mesh has vertex colors
        #[arg(long)]
        no_color: bool,

        /// LDraw color code for uncolored bricks
        #[arg(long)]
        default_color: Option<u32>,

        /// Color catalog file (.toml or LDConfig .ldr)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// TOML config file; command-line flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "ldr")]
        format: FormatArg,

        /// Model name written to the header (defaults to the output file name)
        #[arg(long)]
        name: Option<String>,

        /// Print the parts list after converting
        #[arg(long)]
        parts: bool,
    },

    /// List the colors of the active catalog
    Colors {
        /// Color catalog file (.toml or LDConfig .ldr)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            resolution,
            pitch,
            max_layers,
            no_fill,
            no_color,
            default_color,
            catalog,
            config,
            format,
            name,
            parts,
        } => {
            let mut settings = match &config {
                Some(path) => ConvertConfig::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => ConvertConfig::default(),
            };

            if let Some(resolution) = resolution {
                settings = settings.with_resolution(resolution);
            }
            if let Some(pitch) = pitch {
                settings = settings.with_pitch(pitch);
            }
            if let Some(max_layers) = max_layers {
                settings = settings.with_max_layers(max_layers);
            }
            if no_fill {
                settings = settings.with_fill_interior(false);
            }
            if no_color {
                settings = settings.with_assign_colors(false);
            }
            if let Some(code) = default_color {
                settings = settings.with_default_color(code);
            }
            if let Some(path) = catalog {
                settings = settings
                    .load_catalog(&path)
                    .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            }
            let model_name = name.or_else(|| settings.model_name.clone()).or_else(|| {
                output
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
            });
            if let Some(model_name) = model_name {
                settings = settings.with_model_name(model_name);
            }
            settings.validate()?;

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")?
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
            progress.enable_steady_tick(Duration::from_millis(100));

            progress.set_message(format!("Loading {}...", input.display()));
            let mesh = match load_mesh(&input) {
                Ok(mesh) => mesh,
                Err(e) => {
                    progress.finish_with_message("Failed to load mesh");
                    return Err(e).with_context(|| format!("Failed to load {}", input.display()));
                }
            };

            progress.set_message(format!(
                "Converting {} vertices, {} faces at resolution {}...",
                mesh.vertex_count(),
                mesh.face_count(),
                settings.resolution
            ));
            let conversion = match convert_mesh(&mesh, &settings) {
                Ok(conversion) => conversion,
                Err(e) => {
                    progress.finish_with_message("Conversion failed");
                    return Err(e.into());
                }
            };

            progress.set_message("Writing output file...");
            if let Err(e) = write_atomic(&output, &conversion.render(format.into())) {
                progress.finish_with_message("Failed to write output");
                return Err(e.into());
            }

            progress.finish_with_message(format!(
                "Wrote {} bricks in {} layers to {}",
                conversion.stats.bricks,
                conversion.stats.layers,
                output.display()
            ));

            if parts {
                println!("{}", conversion.document.parts_list());
            }
        }

        Commands::Colors { catalog } => {
            let catalog = match catalog {
                Some(path) => ColorCatalog::load(&path)
                    .with_context(|| format!("Failed to load catalog {}", path.display()))?,
                None => ColorCatalog::default(),
            };
            for color in catalog.colors() {
                println!("{:>4}  {}  {}", color.code, color.hex(), color.name);
            }
        }
    }

    Ok(())
}
