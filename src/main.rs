//! Quick Camera CLI
//!
//! Drives the camera façade against the simulated hardware: opens the
//! preview on a fake surface, takes still pictures and writes them to the
//! configured media directory.

use clap::Parser;
use quick_camera::{
    capture::CaptureError,
    config::FileConfig,
    hardware::SurfaceHandle,
    metrics::MetricsRegistry,
    Facing, HostCallbacks, QuickCamera, ResourceLocator,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "quick-camera", version, about = "Camera preview and still capture demo")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Media root directory (overrides the config file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of pictures to take
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Start on the front camera
    #[arg(long)]
    front: bool,

    /// Swap cameras after every picture
    #[arg(long)]
    swap: bool,

    /// Keep taking pictures until interrupted
    #[arg(long)]
    continuous: bool,
}

struct ConsoleCallbacks;

impl HostCallbacks for ConsoleCallbacks {
    fn display_camera_in_use_copy(&self, in_use: bool) {
        if in_use {
            warn!("camera is in use by another application");
        }
    }

    fn on_image_capture(&self, locator: &ResourceLocator) {
        println!("{}", locator.to_uri());
    }

    fn on_capture_failed(&self, error: &CaptureError) {
        warn!(error = %error, "capture failed");
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => FileConfig::default(),
    };
    if let Some(root) = args.output {
        config.storage.root = root;
    }
    if let Some(count) = args.count {
        config.output.capture_count = count;
    }
    if args.front {
        config.camera.facing = Facing::Front;
    }
    config.output.continuous |= args.continuous;
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("Quick Camera v{}", quick_camera::VERSION);
    info!("This is a demonstration using a simulated camera");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let mut camera = QuickCamera::new(
        config.camera.backend(),
        config.camera.display(),
        Arc::new(config.storage.media_directory()),
        Arc::new(ConsoleCallbacks),
        config.camera.facing,
    );
    match camera.layout_size() {
        Some(size) => info!(%size, "preview layout"),
        None => info!("preview fills parent"),
    }

    if let Err(e) = camera.surface_available(SurfaceHandle::new(1)) {
        eprintln!("Failed to start preview: {}", e);
        std::process::exit(1);
    }

    let interval = Duration::from_millis(config.output.interval_ms);
    let mut taken = 0u32;
    let mut failed = 0u32;

    while running.load(Ordering::SeqCst)
        && (config.output.continuous || taken + failed < config.output.capture_count)
    {
        match camera.take_picture().and_then(|pending| pending.wait()) {
            Ok(_) => taken += 1,
            Err(e) => {
                failed += 1;
                warn!(error = %e, "picture not saved");
            }
        }

        if args.swap && camera.has_multiple_cameras() {
            if let Err(e) = camera.swap_camera() {
                warn!(error = %e, "camera swap failed");
            }
        }

        std::thread::sleep(interval);
    }

    if let Err(e) = camera.surface_destroyed() {
        warn!(error = %e, "failed to stop preview");
    }

    info!("Took {} pictures ({} failed)", taken, failed);

    if config.output.print_metrics {
        match MetricsRegistry::new() {
            Ok(registry) => {
                registry.update(&camera.metrics_snapshot());
                match registry.encode() {
                    Ok(text) => print!("{}", text),
                    Err(e) => warn!(error = %e, "failed to encode metrics"),
                }
            }
            Err(e) => warn!(error = %e, "failed to create metrics registry"),
        }
    }
}
