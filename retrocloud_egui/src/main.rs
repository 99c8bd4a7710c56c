#![cfg(not(target_arch = "wasm32"))]

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use argh::FromArgs;
use retrocloud_core::fetch::FileFetcher;
use retrocloud_core::library::UnavailableLibrary;
use retrocloud_core::logging;
use retrocloud_core::LauncherConfig;
use retrocloud_egui::LauncherApp;
use tracing_chrome::ChromeLayerBuilder;
use tracing_subscriber::prelude::*;

/// RetroCloud retro game launcher
#[derive(FromArgs)]
struct LauncherArgs {
    /// launcher configuration (JSON)
    #[argh(option)]
    config: Option<PathBuf>,

    /// open the player for this game id
    #[argh(option)]
    game: Option<String>,

    /// enable generation of trace files
    #[argh(option)]
    trace_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args: LauncherArgs = argh::from_env();
    let _tracing_guard = if let Some(trace_file) = args.trace_file {
        let (chrome_layer, guard) = ChromeLayerBuilder::new().file(trace_file).build();
        tracing_subscriber::registry().with(chrome_layer).init();
        Some(guard)
    } else {
        None
    };

    let config = match &args.config {
        Some(path) => LauncherConfig::from_json_file(path)?,
        None => LauncherConfig::default(),
    };
    let catalog = config.load_catalog()?;
    if let Some(game_id) = &args.game {
        catalog
            .game_by_id(game_id)
            .with_context(|| format!("Unknown game `{game_id}`"))?;
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 860.0])
            .with_fullscreen(config.start_fullscreen),
        ..Default::default()
    };

    // Natively there is no emulation library; every ROM runs in demo mode.
    let fetcher = FileFetcher::new(config.rom_root.clone());
    eframe::run_native(
        "RetroCloud",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(LauncherApp::with_creation_context(
                cc,
                config,
                catalog,
                Box::new(UnavailableLibrary),
                Box::new(fetcher),
                args.game.as_deref(),
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
}
