use egui::Color32;
use egui::FontId;
use egui::RichText;
use egui::Ui;
use itertools::Itertools;
use retrocloud_core::catalog::Game;
use retrocloud_core::Catalog;

use crate::app::UiAction;

const CARD_WIDTH: f32 = 240.0;
const CARD_SPACING: f32 = 12.0;
const COVER_HEIGHT: f32 = 150.0;

pub fn game_library(ui: &mut Ui, catalog: &Catalog, console_id: &str) -> Option<UiAction> {
    let mut action = None;
    let heading = match catalog.console(console_id) {
        Some(console) => format!("{} {} Games", console.icon, console.name),
        None => "Games".to_string(),
    };
    ui.label(RichText::new(heading).font(FontId::proportional(28.0)));
    ui.add_space(8.0);

    let games = catalog.games_by_console(console_id);
    if games.is_empty() {
        ui.label("No games available for this console yet.");
        return None;
    }

    let columns = ((ui.available_width() + CARD_SPACING) / (CARD_WIDTH + CARD_SPACING))
        .floor()
        .max(1.0) as usize;

    for row in &games.into_iter().chunks(columns) {
        ui.horizontal_top(|ui| {
            ui.spacing_mut().item_spacing.x = CARD_SPACING;
            for game in row {
                if game_card(ui, game) {
                    action = Some(UiAction::PlayGame(game.id.clone()));
                }
            }
        });
        ui.add_space(CARD_SPACING);
    }
    action
}

/// Returns true if "Play now" was clicked.
fn game_card(ui: &mut Ui, game: &Game) -> bool {
    let mut play = false;
    egui::Frame::window(ui.style()).show(ui, |ui| {
        ui.set_width(CARD_WIDTH);
        ui.vertical(|ui| {
            ui.add(
                egui::Image::from_uri(game.image.as_str())
                    .fit_to_exact_size(egui::vec2(CARD_WIDTH, COVER_HEIGHT)),
            );
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("★ {:.1}", game.rating)).color(Color32::GOLD));
                if game.has_real_emulation {
                    ui.label(RichText::new("PLAYABLE").small().color(Color32::LIGHT_GREEN));
                }
            });
            ui.label(RichText::new(&game.title).heading());
            ui.label(game.description.as_str());
            ui.label(RichText::new(format!("{} • {}", game.year, game.genre)).weak());
            play = ui.button("▶ Play now").clicked();
        });
    });
    play
}
