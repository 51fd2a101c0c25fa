mod app;
mod confetti;
mod frame_view;
mod handler;
mod logging;
mod tui;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use wellminded_core::{camera, Config, VisionClient};

use crate::app::App;
use crate::tui::{EventHandler, Tui, TICK_RATE};

#[derive(Parser, Debug)]
#[command(name = "wellminded", version)]
#[command(about = "Capture a frame from your camera and talk about how you feel")]
struct Args {
    /// Endpoint that receives the image and message
    #[arg(long)]
    endpoint: Option<String>,

    /// Camera backend: gstreamer, synthetic or still
    #[arg(long)]
    camera: Option<String>,

    /// Video device for the gstreamer backend, e.g. /dev/video0
    #[arg(long)]
    device: Option<String>,

    /// Image file served by the still backend
    #[arg(long)]
    still_image: Option<PathBuf>,

    /// Start on the capture screen
    #[arg(long)]
    skip_landing: bool,

    /// Log file (default: <cache dir>/wellminded/wellminded.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_config: bool,
}

impl Args {
    /// Layer the flags over `config` and pick the endpoint. A flag on the
    /// command line beats the environment, which beats the config file.
    fn resolve(&self, mut config: Config) -> (Config, String) {
        self.apply(&mut config);
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| config.resolved_endpoint());
        (config, endpoint)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
        if let Some(camera) = &self.camera {
            config.camera = Some(camera.clone());
        }
        if let Some(device) = &self.device {
            config.device = Some(device.clone());
        }
        if let Some(still_image) = &self.still_image {
            config.still_image = Some(still_image.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_path = logging::init(args.log_file.clone())?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        Config::new()
    });
    let (config, endpoint) = args.resolve(config);

    if args.save_config {
        let path = config.save()?;
        info!(path = %path.display(), "saved config");
        println!("Saved configuration to {}", path.display());
    }

    let camera = camera::backend_for(&config)?;
    let chat = Arc::new(VisionClient::new(&endpoint));

    info!(
        endpoint = %endpoint,
        camera = camera.name(),
        log = %log_path.display(),
        "starting wellminded"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(camera, chat, Instant::now());
    if args.skip_landing {
        app.enter_capture(Instant::now());
    }

    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    info!("exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event);
        }

        app.poll_tasks().await;
    }

    Ok(())
}
