mod app;
mod demo;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use materia_render::Viewport;
use materia_scene::DemoConfig;
use tracing_subscriber::EnvFilter;
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::GpuApp;
use crate::demo::Demo;

#[derive(Parser)]
#[command(name = "materia-desktop", about = "PBR material playground")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory the texture and environment paths are relative to
    #[arg(long, default_value = "./static")]
    assets_dir: PathBuf,

    /// YAML file overriding the default scene configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("materia-desktop starting");

    let config = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let demo = Demo::bootstrap(&config, cli.assets_dir, Viewport::default())?;
    let mut app = GpuApp::new(demo);
    event_loop.run_app(&mut app)?;

    Ok(())
}
