mod headless;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use materia_scene::DemoConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "materia-cli", about = "Headless tools for the materia viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory the texture and environment paths are relative to
    #[arg(long, default_value = "./static", global = true)]
    assets_dir: PathBuf,

    /// YAML file overriding the default scene configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the frame loop on a simulated clock and print the final frame
    Simulate {
        /// Simulated seconds
        #[arg(short, long, default_value = "10")]
        seconds: f32,
        /// Frames per simulated second
        #[arg(short, long, default_value = "60")]
        fps: f32,
    },
    /// Load every configured asset and report what failed
    CheckAssets {
        /// Give up on loads still running after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Print the effective configuration as YAML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("materia-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", materia_assets::crate_info());
            println!("render: {}", materia_render::crate_info());
            println!("tools: {}", materia_tools::crate_info());
            println!(
                "panel: {}",
                config
                    .panel
                    .iter()
                    .map(|s| s.property.label())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Commands::Simulate { seconds, fps } => {
            if seconds.is_nan() || seconds < 0.0 || fps.is_nan() || fps <= 0.0 {
                anyhow::bail!("seconds must be >= 0 and fps > 0");
            }
            let frames = (seconds * fps).round() as u64;
            println!("Simulating {frames} frames at {fps} fps");
            let text = headless::simulate(
                &config,
                &cli.assets_dir,
                frames,
                fps,
                Duration::from_secs(30),
            )?;
            print!("{text}");
        }
        Commands::CheckAssets { timeout } => {
            println!("Checking assets under {}", cli.assets_dir.display());
            let report =
                headless::check_assets(&config, &cli.assets_dir, Duration::from_secs(timeout))?;
            println!("{report}");
            // Loads still running at the timeout count as failures.
            let failures = report.failures();
            if failures > 0 {
                anyhow::bail!("{failures} asset(s) failed to load");
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
