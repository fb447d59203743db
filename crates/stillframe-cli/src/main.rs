//! Stillframe CLI - Offscreen Scene Capture
//!
//! Renders a scene description without a window and writes the encoded image.

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

/// Stillframe - render 3D scenes to still images, off-screen
#[derive(Parser)]
#[command(name = "stillframe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a scene to an image
    Capture {
        /// Scene file (JSON); the cone demo scene if omitted
        #[arg(short, long)]
        scene: Option<String>,

        /// Output width
        #[arg(short, long, default_value = "300")]
        width: u32,

        /// Output height
        #[arg(long, default_value = "300")]
        height: u32,

        /// Encoded image format
        #[arg(short, long, value_enum, default_value = "png")]
        format: FormatArg,

        /// JPEG quality (1 - 100)
        #[arg(short, long, default_value = "90")]
        quality: u8,

        /// Rendering backend
        #[arg(short, long, value_enum, default_value = "raster")]
        backend: BackendArg,

        /// Output file
        #[arg(short, long)]
        output: Option<String>,

        /// Print the image as a data URL
        #[arg(long)]
        data_url: bool,

        /// Refuse surfaces with an edge longer than this
        #[arg(long)]
        max_dimension: Option<u32>,
    },

    /// Show backend capabilities
    Caps {
        /// Only report this backend
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,
    },

    /// Dump the demo scene as JSON
    Scene {
        /// Output file
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum BackendArg {
    /// CPU software rasterizer
    Raster,
    /// Hardware rendering through wgpu
    Gpu,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum FormatArg {
    /// Lossless PNG
    Png,
    /// Lossy JPEG
    Jpeg,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Capture {
            scene,
            width,
            height,
            format,
            quality,
            backend,
            output,
            data_url,
            max_dimension,
        } => {
            let args = commands::capture::CaptureArgs {
                scene,
                width,
                height,
                format,
                quality,
                output,
                data_url,
                max_dimension,
            };
            commands::capture::run(backend, args).await?;
        }

        Commands::Caps { backend } => {
            commands::caps::run(backend).await?;
        }

        Commands::Scene { output } => {
            commands::scene::run(output.as_deref())?;
        }
    }

    Ok(())
}
