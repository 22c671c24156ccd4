mod action;
mod app;
mod app_state;
mod assets;
mod charts;
mod component;
mod components;
mod core;
mod idle;
mod mpv;
mod presentation;
mod router;
mod sync;
mod theme;
mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use kiosk_shared::clock::{FixedClock, LocalMidnightClock, SyncClock};
use kiosk_shared::config::Config;
use kiosk_shared::content::{AssetKind, Content, TabDataset};
use tokio::sync::{broadcast, mpsc};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// What the ScreensaverCore broadcasts to the UI.
#[derive(Debug, Clone)]
pub enum BroadcastMessage {
    /// The ScreensaverState changed; receivers should fetch from StateManager.
    StateUpdated,
    /// The visitor tapped mpv's video window.
    ScreensaverTap,
    /// A WARN/ERROR line forwarded from tracing.
    Log(String),
}

/// A custom tracing layer that forwards log messages to the broadcast channel
struct BroadcastLayer {
    sender: broadcast::Sender<BroadcastMessage>,
}

impl BroadcastLayer {
    fn new(sender: broadcast::Sender<BroadcastMessage>) -> Self {
        Self { sender }
    }
}

impl<S> tracing_subscriber::Layer<S> for BroadcastLayer
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        // Only WARN and ERROR reach the debug overlay.
        let level = event.metadata().level();
        if !matches!(*level, tracing::Level::WARN | tracing::Level::ERROR) {
            return;
        }

        let mut message = format!("{} [{}] ", chrono::Local::now().format("%H:%M:%S"), level);
        let mut visitor = MessageVisitor(&mut message);
        event.record(&mut visitor);

        // No receivers yet is fine.
        let _ = self.sender.send(BroadcastMessage::Log(message));
    }
}

struct MessageVisitor<'a>(&'a mut String);

impl<'a> tracing::field::Visit for MessageVisitor<'a> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0.push_str(&format!("{:?}", value));
        } else {
            self.0.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

/// Touch-screen exhibition kiosk
#[derive(Parser)]
#[command(name = "kiosk")]
#[command(version)]
#[command(about = "Attract-mode video loop, dashboards and slide decks for a touch kiosk")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: <config_dir>/config.toml, created on first run)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content file, overriding `[kiosk] content_file`
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// Prefer mpv from PATH over a bundled copy
    #[arg(long, global = true)]
    system_deps: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the kiosk (default)
    Run,

    /// Validate content, resolve the playlist and check every asset
    Check {
        /// Resolve at this many seconds past midnight instead of now
        #[arg(long)]
        at: Option<f64>,
    },

    /// Render one dashboard tab to an SVG file
    ExportSvg {
        /// Tab id, e.g. `incidents` or `kanban`
        #[arg(long)]
        tab: String,

        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    kiosk_shared::platform::set_use_system_deps(cli.system_deps);

    // Setup broadcast channel first so we can use it for logging
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(256);

    let data_dir = kiosk_shared::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("kiosk.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(BroadcastLayer::new(broadcast_tx.clone()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,kiosk=debug")),
        )
        .init();

    info!("kiosk starting, log file: {:?}", log_path);

    // ── Config + content: any problem here aborts before the terminal is taken
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(content) = &cli.content {
        config.kiosk.content_file = content.clone();
    }
    let content = Content::load(&config.kiosk.content_file)?;
    let assets_dir = config.kiosk.resolved_assets_dir();
    info!(
        "content loaded from {:?}: {} cards, {} tabs, {} playlist entries",
        config.kiosk.content_file,
        content.cards.len(),
        content.dashboards.tabs.len(),
        content.screensaver.playlist.len()
    );

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, content, assets_dir, broadcast_tx, broadcast_rx).await,
        Commands::Check { at } => check(&content, &assets_dir, at).await,
        Commands::ExportSvg { tab, out } => export_svg(&content, &tab, &out),
    }
}

async fn run(
    config: Config,
    content: Content,
    assets_dir: PathBuf,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    broadcast_rx: broadcast::Receiver<BroadcastMessage>,
) -> anyhow::Result<()> {
    let playlist = content.playlist()?;
    let clock: Arc<dyn SyncClock> = Arc::new(LocalMidnightClock::new(content.video_sync_offset));

    // ── CoreEvent channel (UI/mpv/timers → ScreensaverCore) ─────────────────
    let (event_tx, event_rx) = mpsc::channel::<core::CoreEvent>(256);

    let screensaver_core = core::ScreensaverCore::new(
        playlist,
        config.sync.clone(),
        config.mpv.clone(),
        clock,
        assets_dir.clone(),
        broadcast_tx,
        event_tx.clone(),
    );
    let state_manager = screensaver_core.state_manager();

    let core_task = tokio::spawn(async move {
        if let Err(e) = screensaver_core.run(event_rx).await {
            tracing::error!("ScreensaverCore exited with error: {}", e);
        }
    });

    let app = app::App::new(Arc::new(content), assets_dir, &config, event_tx, state_manager);
    app.run(broadcast_rx).await?;

    // The app sent Shutdown on its way out; let mpv be cleaned up.
    let _ = core_task.await;
    Ok(())
}

async fn check(content: &Content, assets_dir: &Path, at: Option<f64>) -> anyhow::Result<()> {
    let playlist = content.playlist()?;
    let clock: Box<dyn SyncClock> = match at {
        Some(secs) => Box::new(FixedClock(secs + content.video_sync_offset)),
        None => Box::new(LocalMidnightClock::new(content.video_sync_offset)),
    };
    let position = playlist.resolve(clock.now_secs());

    println!(
        "playlist: {} entries, cycle {:.2} s",
        playlist.len(),
        playlist.total_duration_secs()
    );
    if let Some(entry) = playlist.get(position.entry_index) {
        println!(
            "now: entry #{} {} @ {:.2} s",
            position.entry_index, entry.media_file, position.offset_secs
        );
    }

    for tab in &content.dashboards.tabs {
        match TabDataset::parse(&tab.id, &tab.data) {
            TabDataset::Unavailable(reason) => println!("tab {}: placeholder ({})", tab.id, reason),
            _ => println!("tab {}: ok", tab.id),
        }
    }

    let report = assets::preflight(assets_dir, &content.referenced_assets()).await;
    println!("{}", report.summary());
    for missing in &report.missing {
        println!("  missing {:?}: {}", missing.kind, missing.path);
    }
    let media = report.missing_of(AssetKind::Media);
    if media > 0 {
        println!("{} screensaver media file(s) missing; playback will keep retrying", media);
    }
    Ok(())
}

fn export_svg(content: &Content, tab_id: &str, out: &Path) -> anyhow::Result<()> {
    let tab = content
        .tab(tab_id)
        .with_context(|| format!("no dashboard tab '{}'", tab_id))?;
    let dataset = TabDataset::parse(&tab.id, &tab.data);
    let drawing = charts::render(&tab.subtitle, &dataset, &charts::ChartState::default())
        .with_context(|| format!("tab '{}' is a text layout, not a chart", tab_id))?;
    std::fs::write(out, drawing.to_svg())
        .with_context(|| format!("writing {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}
