use clap::{Parser, Subcommand};
use earthview_assets::TextureLoader;
use earthview_input::ControlInput;
use earthview_lifecycle::{LoadStatus, TickOutcome, Viewer, ViewerConfig};
use earthview_render::DebugTextRenderer;
use earthview_tools::{SceneInspector, SceneSummary, StatsSnapshot};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "earthview-cli", about = "Headless earthview runner")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML viewer config; built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Asset root directory (overrides the config)
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    /// Earth texture path relative to the asset root (overrides the config)
    #[arg(long, global = true)]
    texture: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the effective configuration as YAML
    Config,
    /// Run the scene lifecycle against the text renderer
    Run {
        /// Number of frame-loop ticks
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Pause between ticks, in milliseconds
        #[arg(long, default_value = "16")]
        frame_interval_ms: u64,
        /// Horizontal orbit drag (pixels) applied every tick
        #[arg(long, default_value = "0")]
        orbit: f32,
        /// Print the last rendered frame description
        #[arg(long)]
        dump_frame: bool,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Outcome of a headless run.
#[derive(Debug, Serialize)]
struct RunReport {
    ticks: u64,
    renders: u64,
    view_change_renders: u64,
    load_status: String,
    earth_rotation_y: Option<f32>,
    camera_position: [f32; 3],
    scene: SceneSummary,
    stats: StatsSnapshot,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut config = ViewerConfig::load_or_default(cli.config.as_deref())?;
    if let Some(assets) = cli.assets {
        config.scene.asset_root = assets;
    }
    if let Some(texture) = cli.texture {
        config.scene.texture = texture;
    }

    match cli.command {
        Commands::Info => {
            println!("earthview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", earthview_assets::crate_info());
            println!("scene: {}", earthview_scene::crate_info());
            println!("render: {}", earthview_render::crate_info());
            println!("input: {}", earthview_input::crate_info());
            println!("tools: {}", earthview_tools::crate_info());
            println!("lifecycle: {}", earthview_lifecycle::crate_info());
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Run {
            frames,
            frame_interval_ms,
            orbit,
            dump_frame,
            json,
        } => {
            let report = run(
                &config,
                frames,
                Duration::from_millis(frame_interval_ms),
                orbit,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report.report)?);
            } else {
                print_report(&report.report);
            }
            if dump_frame {
                println!("{}", report.last_frame);
            }
        }
    }

    Ok(())
}

struct RunOutput {
    report: RunReport,
    last_frame: String,
}

fn run(
    config: &ViewerConfig,
    frames: u64,
    interval: Duration,
    orbit: f32,
) -> anyhow::Result<RunOutput> {
    let loader = TextureLoader::new(&config.scene.asset_root);
    let mut viewer = Viewer::start(config, &loader);
    let mut renderer = DebugTextRenderer::new();

    for _ in 0..frames {
        if orbit != 0.0 {
            viewer.handle_input(ControlInput::Rotate { dx: orbit, dy: 0.0 }, &mut renderer)?;
        }
        if viewer.tick(&mut renderer)? == TickOutcome::Cancelled {
            break;
        }
        if !interval.is_zero() {
            std::thread::sleep(interval);
        }
    }

    tracing::info!(
        ticks = viewer.frame_loop.ticks(),
        renders = renderer.render_count(),
        "headless run finished"
    );

    let load_status = match viewer.context.load_status() {
        LoadStatus::Pending => "pending".to_string(),
        LoadStatus::Loaded => "loaded".to_string(),
        LoadStatus::Failed(reason) => format!("failed: {reason}"),
    };

    let report = RunReport {
        ticks: viewer.frame_loop.ticks(),
        renders: renderer.render_count(),
        view_change_renders: viewer.helpers.change_renders(),
        load_status,
        earth_rotation_y: viewer.context.earth_rotation(),
        camera_position: viewer.context.camera.position.to_array(),
        scene: SceneInspector::summary(&viewer.context.scene),
        stats: viewer.frame_loop.stats().snapshot(),
    };
    Ok(RunOutput {
        report,
        last_frame: renderer.last_frame().to_string(),
    })
}

fn print_report(report: &RunReport) {
    println!("{}", report.scene);
    println!(
        "Ticks: {}  Renders: {}  (view changes: {})",
        report.ticks, report.renders, report.view_change_renders
    );
    println!("Texture: {}", report.load_status);
    match report.earth_rotation_y {
        Some(rot) => println!("Earth rotation y: {rot:.4} rad"),
        None => println!("Earth: not present"),
    }
    let [x, y, z] = report.camera_position;
    println!("Camera: ({x:.2}, {y:.2}, {z:.2})");
    println!("Stats: {}", report.stats);
}
