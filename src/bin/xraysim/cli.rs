/// Command line interface for `xraysim` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "xraysim",
    about = "Simulate X-ray projections of triangle-mesh phantoms",
)]
pub (super) struct Cli {
    /// TOML file describing source, detector, spectrum, materials and surfaces
    pub config: PathBuf,

    /// Output image file [default: `xraysim-<command>.xrimg`]
    #[clap(short, long)]
    pub out: Option<PathBuf>,

    /// Compress the pixel data in the output file
    #[clap(short, long)]
    pub compress: bool,

    /// Also write the bare pixel values to `<out>.raw`
    #[clap(long)]
    pub raw: bool,

    /// Maximum number of rayon threads
    #[clap(short = 'j', long, default_value = "4")]
    pub threads: usize,

    #[clap(subcommand)]
    pub (super) command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub (super) enum Command {
    /// Transmitted fluence through the whole scene
    Image,

    /// Path length through a single surface, in cm
    Lbuffer {
        /// Label of the surface
        label: String,
    },

    /// Summed path length through all inner surfaces, in cm
    CumulatedLbuffer,

    /// Line integrals of every detector row over a full rotation
    Sinogram(Rotation),

    /// Fluence images over a full rotation
    Projections(Rotation),
}

/// Overrides of the `[rotation]` section of the configuration
#[derive(clap::Args, Debug, Clone)]
pub (super) struct Rotation {
    /// Number of equally spaced angles
    #[clap(short = 'n', long)]
    pub angles: Option<usize>,

    /// Angle of the first projection, in degrees
    #[clap(long)]
    pub offset: Option<f64>,
}

impl Command {
    pub (super) fn name(&self) -> &'static str {
        match self {
            Command::Image             => "image",
            Command::Lbuffer { .. }    => "lbuffer",
            Command::CumulatedLbuffer  => "cumulated-lbuffer",
            Command::Sinogram(_)       => "sinogram",
            Command::Projections(_)    => "projections",
        }
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
