use egui::CursorIcon;
use egui::FontId;
use egui::Label;
use egui::RichText;
use egui::Sense;
use egui::Ui;
use retrocloud_core::catalog::ConsoleInfo;
use retrocloud_core::Catalog;

use crate::app::UiAction;
use crate::util::accent_color;

pub fn console_selector(ui: &mut Ui, catalog: &Catalog) -> Option<UiAction> {
    let mut action = None;
    ui.vertical_centered(|ui| {
        ui.add_space(16.0);
        ui.label(RichText::new("Choose your console").font(FontId::proportional(32.0)));
        ui.label("Pick a system to browse its games.");
        ui.add_space(16.0);
    });

    ui.horizontal_wrapped(|ui| {
        for console in catalog.consoles() {
            let count = catalog.game_count(&console.id);
            if console_card(ui, console, count) {
                action = Some(UiAction::SelectConsole(console.id.clone()));
            }
        }
    });

    ui.add_space(24.0);
    ui.separator();
    ui.collapsing("Adding games", |ui| {
        ui.label("1. Put the ROM file into public/roms/, e.g. public/roms/my-game.nes.");
        ui.label("2. Add a ROM entry and a game entry with the same id to the catalog.");
        ui.label("3. Set has_real_emulation on the game to run it on the emulator.");
    });
    action
}

/// Returns true if the card was clicked.
fn console_card(ui: &mut Ui, console: &ConsoleInfo, game_count: usize) -> bool {
    let mut clicked = false;
    egui::Frame::window(ui.style())
        .stroke(egui::Stroke::new(2.0, accent_color(console.accent)))
        .show(ui, |ui| {
            ui.set_width(220.0);
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(&console.icon).font(FontId::proportional(48.0)));
                clicked |= ui
                    .add(Label::new(RichText::new(&console.name).heading()).sense(Sense::click()))
                    .on_hover_cursor(CursorIcon::PointingHand)
                    .clicked();
                ui.label(console.description.as_str());
                let plural = if game_count == 1 { "" } else { "s" };
                ui.label(
                    RichText::new(format!("{game_count} functional game{plural}"))
                        .color(accent_color(console.accent)),
                );
                clicked |= ui.button("Browse games").clicked();
            });
        });
    clicked
}
