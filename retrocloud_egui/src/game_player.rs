//! The player screen: game header, emulator screen, on-screen controls and stats.
use std::cell::RefCell;
use std::rc::Rc;

use egui::Align;
use egui::Align2;
use egui::Button;
use egui::Color32;
use egui::FontId;
use egui::Layout;
use egui::Painter;
use egui::Pos2;
use egui::Rect;
use egui::RichText;
use egui::Sense;
use egui::Stroke;
use egui::TextureHandle;
use egui::TextureOptions;
use egui::Ui;
use egui_hooks::UseHookExt;
use log::info;
use retrocloud_core::bridge::BridgeCallbacks;
use retrocloud_core::catalog::Game;
use retrocloud_core::catalog::RomInfo;
use retrocloud_core::framebuffer::SCREEN_HEIGHT;
use retrocloud_core::framebuffer::SCREEN_WIDTH;
use retrocloud_core::input::InputBus;
use retrocloud_core::input::VirtualPad;
use retrocloud_core::util::RateMeter;
use retrocloud_core::BridgeMode;
use retrocloud_core::BridgeState;
use retrocloud_core::EmulatorBridge;
use retrocloud_core::LauncherConfig;

use crate::app::UiAction;
use crate::audio::AudioOutput;
use crate::keyboard::KeyboardInput;
use crate::util::EguiImage;
use crate::virtual_controls::virtual_controls;

const MAX_SCREEN_WIDTH: f32 = 768.0;
const CONTROLS_HINT: &str = "Arrows: move   X: A   Z: B   Enter: Start   Backspace: Select";

/// What the bridge reported through its callbacks.
#[derive(Default)]
struct PlayerStatus {
    loaded: bool,
    error: Option<String>,
}

pub struct GamePlayer {
    game: Game,
    rom: Option<RomInfo>,
    pad: VirtualPad,
    keyboard: KeyboardInput,
    screen: Option<TextureHandle>,
    screen_generation: Option<u64>,
    fps: RateMeter,
    status: Rc<RefCell<PlayerStatus>>,
    controls_hint_secs: f64,
    rom_root: String,
}

impl GamePlayer {
    /// Points `bridge` at the game's ROM. Games without real emulation get no ROM and show a
    /// placeholder instead.
    pub fn open(
        game: Game,
        rom: Option<RomInfo>,
        bridge: &mut EmulatorBridge,
        config: &LauncherConfig,
    ) -> Self {
        let status = Rc::new(RefCell::new(PlayerStatus::default()));
        let load_status = status.clone();
        let error_status = status.clone();
        let title = game.title.clone();
        bridge.set_callbacks(
            BridgeCallbacks::default()
                .on_load(move || {
                    info!("{title} is running on the emulator");
                    let mut status = load_status.borrow_mut();
                    status.loaded = true;
                    status.error = None;
                })
                .on_error(move |message| {
                    error_status.borrow_mut().error = Some(message.to_string());
                }),
        );
        bridge.set_audio_sink(Box::new(AudioOutput::new()));
        bridge.set_rom_url(rom.as_ref().map(|rom| rom.rom_url.as_str()));

        Self {
            game,
            rom,
            pad: VirtualPad::new(InputBus::default(), config.tap_release_ms),
            keyboard: KeyboardInput::default(),
            screen: None,
            screen_generation: None,
            fps: RateMeter::default(),
            status,
            controls_hint_secs: config.controls_hint_secs as f64,
            rom_root: config.rom_root.display().to_string(),
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn is_loaded(&self) -> bool {
        self.status.borrow().loaded
    }

    pub fn error(&self) -> Option<String> {
        self.status.borrow().error.clone()
    }

    /// Releases everything still held and tears the bridge down.
    pub fn close(&mut self, bridge: &mut EmulatorBridge) {
        self.pad.release_all();
        self.keyboard.release_all(self.pad.bus());
        bridge.drain_input(self.pad.bus());
        bridge.unmount();
    }

    pub fn show(&mut self, ui: &mut Ui, bridge: &mut EmulatorBridge) -> Option<UiAction> {
        let now = ui.input(|input| input.time);
        self.update_input(ui, bridge, now);
        if bridge.tick(now) {
            self.fps.tick(now);
        }
        if !bridge.is_running() {
            self.fps.reset();
        }
        self.update_screen(ui, bridge);

        let mut action = None;
        let id = self.game.id.clone();
        ui.push_id(id, |ui| {
            action = self.header(ui, bridge);
            ui.separator();
            if self.rom.is_some() {
                self.emulator_screen(ui, bridge, now);
                self.error_panel(ui);
                ui.add_space(8.0);
                ui.vertical_centered(|ui| virtual_controls(ui, &mut self.pad, now));
            } else {
                self.in_development(ui);
            }
            ui.separator();
            self.stats(ui, bridge);
        });

        if bridge.is_running()
            || bridge.state() == BridgeState::Loading
            || self.pad.has_pending_taps()
        {
            ui.ctx().request_repaint();
        }
        action
    }

    fn update_input(&mut self, ui: &Ui, bridge: &mut EmulatorBridge, now: f64) {
        let bus = self.pad.bus().clone();
        ui.input(|input| self.keyboard.update(|key| input.key_down(key), &bus));
        self.pad.update(now);
        bridge.drain_input(&bus);
    }

    fn update_screen(&mut self, ui: &Ui, bridge: &EmulatorBridge) {
        let framebuffer = bridge.framebuffer();
        if self.screen.is_some() && self.screen_generation == Some(framebuffer.generation()) {
            return;
        }
        self.screen_generation = Some(framebuffer.generation());
        let EguiImage(image) = framebuffer.to_rgba::<EguiImage>();
        match &mut self.screen {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.screen = Some(ui.ctx().load_texture(
                    "nes_screen",
                    image,
                    TextureOptions::NEAREST,
                ))
            }
        }
    }

    fn header(&self, ui: &mut Ui, bridge: &mut EmulatorBridge) -> Option<UiAction> {
        let mut action = None;
        ui.horizontal(|ui| {
            ui.add(
                egui::Image::from_uri(self.game.image.as_str())
                    .fit_to_exact_size(egui::vec2(96.0, 72.0)),
            );
            ui.vertical(|ui| {
                ui.label(RichText::new(&self.game.title).font(FontId::proportional(24.0)));
                ui.horizontal(|ui| {
                    ui.label(self.game.console.as_str());
                    ui.label(
                        RichText::new(format!("★ {:.1}", self.game.rating)).color(Color32::GOLD),
                    );
                    if let Some(rom) = self.rom.as_ref().filter(|rom| rom.is_homebrew) {
                        ui.label(
                            RichText::new("HOMEBREW")
                                .small()
                                .strong()
                                .color(Color32::LIGHT_BLUE),
                        );
                        if let Some(author) = &rom.author {
                            ui.label(RichText::new(format!("by {author}")).weak());
                        }
                    }
                });
            });
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("⛶ Fullscreen").clicked() {
                    action = Some(UiAction::ToggleFullscreen);
                }
                let can_play = matches!(bridge.state(), BridgeState::Ready | BridgeState::Fallback);
                let label = if bridge.is_running() {
                    "⏸ Pause"
                } else {
                    "▶ Play"
                };
                if ui.add_enabled(can_play, Button::new(label)).clicked() {
                    bridge.toggle();
                }
            });
        });
        action
    }

    fn emulator_screen(&self, ui: &mut Ui, bridge: &EmulatorBridge, now: f64) {
        let opened_at = ui.use_state(|| now, ());
        let aspect = SCREEN_WIDTH as f32 / SCREEN_HEIGHT as f32;
        let width = ui.available_width().min(MAX_SCREEN_WIDTH);
        let size = egui::vec2(width, width / aspect);

        ui.vertical_centered(|ui| {
            let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
            let painter = ui.painter_at(rect);
            match &self.screen {
                Some(texture) => {
                    egui::Image::new((texture.id(), texture.size_vec2())).paint_at(ui, rect)
                }
                None => {
                    painter.rect_filled(rect, 0.0, Color32::BLACK);
                }
            }

            match bridge.state() {
                BridgeState::Loading => {
                    painter.rect_filled(rect, 0.0, Color32::from_black_alpha(160));
                    centered_text(&painter, rect.center(), "Loading ROM…", 22.0);
                }
                BridgeState::Fallback => {
                    let band = Rect::from_min_size(rect.min, egui::vec2(rect.width(), 64.0));
                    painter.rect_filled(band, 0.0, Color32::from_black_alpha(140));
                    centered_text(
                        &painter,
                        band.center() - egui::vec2(0.0, 12.0),
                        &self.game.title,
                        22.0,
                    );
                    centered_text(&painter, band.center() + egui::vec2(0.0, 14.0), "Demo mode", 14.0);
                }
                BridgeState::Error => {
                    centered_text(&painter, rect.center(), "⚠ Unable to start the game", 22.0);
                }
                BridgeState::Ready if !bridge.is_running() => {
                    painter.rect_filled(rect, 0.0, Color32::from_black_alpha(100));
                    centered_text(&painter, rect.center(), "⏸ Paused", 22.0);
                }
                _ => {}
            }

            if now - *opened_at < self.controls_hint_secs {
                let band = Rect::from_min_max(
                    Pos2::new(rect.left(), rect.bottom() - 32.0),
                    rect.max,
                );
                painter.rect_filled(band, 0.0, Color32::from_black_alpha(160));
                centered_text(&painter, band.center(), CONTROLS_HINT, 13.0);
            }
        });
    }

    fn error_panel(&self, ui: &mut Ui) {
        let status = self.status.borrow();
        let Some(message) = &status.error else {
            return;
        };
        egui::Frame::group(ui.style())
            .stroke(Stroke::new(1.0, Color32::RED))
            .show(ui, |ui| {
                ui.colored_label(Color32::RED, format!("⚠ {message}"));
                if let Some(rom) = &self.rom {
                    ui.label(format!(
                        "To play with real emulation, place the ROM file at {}{}. \
                         Showing demo mode meanwhile.",
                        self.rom_root, rom.rom_url
                    ));
                }
            });
    }

    fn in_development(&self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            ui.label(RichText::new("🚧").font(FontId::proportional(64.0)));
            ui.label(RichText::new("Emulator in development").heading());
            ui.label(format!(
                "{} emulation is not available yet.",
                self.game.console
            ));
            ui.add_space(48.0);
        });
    }

    fn stats(&self, ui: &mut Ui, bridge: &EmulatorBridge) {
        let mode = match bridge.mode() {
            BridgeMode::Real => "Real",
            BridgeMode::Demo => "Demo",
        };
        let kind = match &self.rom {
            Some(rom) if rom.is_homebrew => "Homebrew",
            _ => "Official",
        };
        let emulator = if self.rom.is_some() {
            "NES"
        } else {
            "In development"
        };
        let fps = self
            .fps
            .rate()
            .map(|rate| format!("{rate:.0}"))
            .unwrap_or_else(|| "-".to_string());

        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 32.0;
            for (name, value) in [
                ("Mode", mode),
                ("Type", kind),
                ("Emulator", emulator),
                ("FPS", fps.as_str()),
            ] {
                ui.vertical(|ui| {
                    ui.label(RichText::new(name).weak());
                    ui.label(RichText::new(value).strong());
                });
            }
        });
    }
}

fn centered_text(painter: &Painter, pos: Pos2, text: &str, size: f32) {
    painter.text(
        pos,
        Align2::CENTER_CENTER,
        text,
        FontId::proportional(size),
        Color32::WHITE,
    );
}
