mod cli;
mod progress;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Cli::parse();
    let mut timer = Progress::new();

    rayon::ThreadPoolBuilder::new().num_threads(args.threads).build_global()?;

    timer.start(&format!("Reading configuration from {}", args.config.display()));
    let config = read_config_file(&args.config)?;
    let mut engine = config.build_engine()?;
    timer.done();

    let out = args.out.clone()
        .unwrap_or_else(|| PathBuf::from(format!("xraysim-{}.xrimg", args.command.name())));
    // Before starting the potentially long computation, make sure that we can
    // write the result to the requested destination
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        create_dir_all(dir)?;
    }

    match &args.command {
        Command::Image => {
            timer.start("Computing X-ray image");
            let image = engine.compute_xray_image()?;
            timer.done();
            report(&image);
            engine.save_fluence_image(&out, args.compress)?;
            if args.raw { image.write_to_raw_file(&out.with_extension("raw"))? }
        },
        Command::Lbuffer { label } => {
            timer.start(&format!("Computing L-buffer of `{label}`"));
            let image = engine.compute_lbuffer(label)?;
            timer.done();
            report(&image);
            engine.save_lbuffer(&out, args.compress)?;
            if args.raw { image.write_to_raw_file(&out.with_extension("raw"))? }
        },
        Command::CumulatedLbuffer => {
            timer.start("Computing cumulated L-buffer");
            let image = engine.compute_cumulated_lbuffer()?;
            timer.done();
            report(&image);
            engine.save_cumulated_lbuffer(&out, args.compress)?;
            if args.raw { image.write_to_raw_file(&out.with_extension("raw"))? }
        },
        Command::Sinogram(rotation) => {
            let (centre, n, offset) = rotation_sequence(&config, rotation)?;
            let bar = AngleBar::new("Computing sinogram", n);
            let image = engine.compute_sinogram_with(centre, n, offset, |i, n| bar.angle_done(i, n))?;
            timer.done_with_message("Sinogram computed");
            report(&image);
            engine.save_sinogram(&out, args.compress)?;
            if args.raw { image.write_to_raw_file(&out.with_extension("raw"))? }
        },
        Command::Projections(rotation) => {
            let (centre, n, offset) = rotation_sequence(&config, rotation)?;
            let bar = AngleBar::new("Computing projection set", n);
            let image = engine.compute_projection_set_with(centre, n, offset, |i, n| bar.angle_done(i, n))?;
            timer.done_with_message("Projection set computed");
            report(&image);
            engine.save_projection_set(&out, args.compress)?;
            if args.raw { image.write_to_raw_file(&out.with_extension("raw"))? }
        },
    }
    println!("Wrote {}", out.display());
    Ok(())
}

/// The configured rotation sequence, with any command-line overrides applied
fn rotation_sequence(config: &Config, overrides: &cli::Rotation) -> Result<(Point, usize, Angle), FatalError> {
    let (centre, n, offset) = match config.rotation() {
        Ok(r) => r,
        // The command line may supply everything that is needed
        Err(e) => match overrides.angles {
            Some(n) => (Point::zero(), n, degree(0.0)),
            None    => return Err(e),
        },
    };
    Ok((centre,
        overrides.angles.unwrap_or(n),
        overrides.offset.map(degree).unwrap_or(offset)))
}

fn report<D: ndarray::Dimension>(image: &Image<D>) {
    let (Some(min), Some(max), Some(mean)) = (image.min(), image.max(), image.mean()) else { return };
    println!("{:?} pixels: min {min:.4e}  max {max:.4e}  mean {mean:.4e}", image.shape());
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::fs::create_dir_all;
use std::path::PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use units::{Angle, degree};
use xraysim::{FatalError, Image, Point};
use xraysim::config::{Config, read_config_file};
use xraysim::utils::timing::Progress;
use cli::{Cli, Command};
use progress::AngleBar;
