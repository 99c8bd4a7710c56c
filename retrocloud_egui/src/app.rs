use eframe::CreationContext;
use eframe::Frame;
use egui::Context;
use egui::FontId;
use egui::Key;
use egui::RichText;
use egui::Ui;
use egui::ViewportCommand;
use log::info;
use log::warn;
use retrocloud_core::bridge::BridgeOptions;
use retrocloud_core::fetch::RomFetcher;
use retrocloud_core::library::LibraryFactory;
use retrocloud_core::selection::Screen;
use retrocloud_core::selection::SelectionState;
use retrocloud_core::Catalog;
use retrocloud_core::EmulatorBridge;
use retrocloud_core::LauncherConfig;
use tracing::instrument;

use crate::console_selector::console_selector;
use crate::game_library::game_library;
use crate::game_player::GamePlayer;

/// Actions the user can trigger. Views return them and [`LauncherApp::handle_action`] applies
/// them after the frame is laid out.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SelectConsole(String),
    PlayGame(String),
    Back,
    ToggleFullscreen,
}

pub struct LauncherApp {
    config: LauncherConfig,
    catalog: Catalog,
    selection: SelectionState,
    bridge: EmulatorBridge,
    player: Option<GamePlayer>,
    fullscreen: bool,
}

impl LauncherApp {
    pub fn new(
        config: LauncherConfig,
        catalog: Catalog,
        factory: Box<dyn LibraryFactory>,
        fetcher: Box<dyn RomFetcher>,
    ) -> Self {
        let bridge = EmulatorBridge::new(factory, fetcher, BridgeOptions::from(&config));
        Self {
            fullscreen: config.start_fullscreen,
            config,
            catalog,
            selection: SelectionState::default(),
            bridge,
            player: None,
        }
    }

    /// Called once before the first frame.
    pub fn with_creation_context(
        cc: &CreationContext<'_>,
        config: LauncherConfig,
        catalog: Catalog,
        factory: Box<dyn LibraryFactory>,
        fetcher: Box<dyn RomFetcher>,
        initial_game: Option<&str>,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let mut app = Self::new(config, catalog, factory, fetcher);
        if let Some(game_id) = initial_game {
            app.handle_action(&cc.egui_ctx, UiAction::PlayGame(game_id.to_string()));
        }
        app
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn bridge(&self) -> &EmulatorBridge {
        &self.bridge
    }

    pub fn player(&self) -> Option<&GamePlayer> {
        self.player.as_ref()
    }

    #[instrument(skip(self, ctx))]
    pub fn handle_action(&mut self, ctx: &Context, action: UiAction) {
        match action {
            UiAction::SelectConsole(console_id) => self.selection.select_console(&console_id),
            UiAction::PlayGame(game_id) => self.play(&game_id),
            UiAction::Back => {
                if self.selection.is_playing() {
                    self.close_player();
                }
                self.selection.back();
            }
            UiAction::ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                info!("Fullscreen {}", if self.fullscreen { "on" } else { "off" });
                ctx.send_viewport_cmd(ViewportCommand::Fullscreen(self.fullscreen));
            }
        }
    }

    fn play(&mut self, game_id: &str) {
        let Some(game) = self.catalog.game_by_id(game_id).cloned() else {
            warn!("Unknown game {game_id}");
            return;
        };
        if self.selection.console().is_none() {
            if let Some(console) = self
                .catalog
                .consoles()
                .iter()
                .find(|console| console.name == game.console)
            {
                self.selection.select_console(&console.id);
            }
        }
        self.close_player();
        let rom = self.catalog.playable_rom(&game).cloned();
        self.selection.select_game(game.clone());
        self.player = Some(GamePlayer::open(game, rom, &mut self.bridge, &self.config));
    }

    fn close_player(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.close(&mut self.bridge);
        }
    }

    /// Lays out one frame.
    pub fn ui(&mut self, ctx: &Context) {
        let mut actions = Vec::new();
        if ctx.input(|input| input.key_pressed(Key::F11)) {
            actions.push(UiAction::ToggleFullscreen);
        }

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            actions.extend(self.header(ui));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink(false)
                .show(ui, |ui| {
                    let action = match self.selection.screen() {
                        Screen::Consoles => console_selector(ui, &self.catalog),
                        Screen::Library => game_library(
                            ui,
                            &self.catalog,
                            self.selection.console().unwrap_or_default(),
                        ),
                        Screen::Player => self
                            .player
                            .as_mut()
                            .and_then(|player| player.show(ui, &mut self.bridge)),
                    };
                    actions.extend(action);
                });
        });

        for action in actions {
            self.handle_action(ctx, action);
        }
    }

    fn header(&self, ui: &mut Ui) -> Option<UiAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            if self.selection.can_go_back() && ui.button("⬅ Back").clicked() {
                action = Some(UiAction::Back);
            }
            ui.label(
                RichText::new("🎮 RetroCloud")
                    .font(FontId::proportional(22.0))
                    .strong(),
            );
        });
        action
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &Context, _frame: &mut Frame) {
        self.ui(ctx);
    }
}
