//! On-screen gamepad.
//!
//! The d-pad and A/B are held for as long as the pointer is down on them. Select and Start are
//! tapped: pressed on click and released by [`VirtualPad::update`] a moment later.
use egui::Button;
use egui::CursorIcon;
use egui::Response;
use egui::RichText;
use egui::Ui;
use egui::Vec2;
use retrocloud_core::input::VirtualPad;
use retrocloud_core::LogicalButton;

const DPAD_BUTTON_SIZE: Vec2 = Vec2::splat(44.0);
const ACTION_BUTTON_SIZE: Vec2 = Vec2::splat(56.0);
const MENU_BUTTON_SIZE: Vec2 = Vec2::new(72.0, 24.0);

pub fn virtual_controls(ui: &mut Ui, pad: &mut VirtualPad, now: f64) {
    ui.horizontal(|ui| {
        dpad(ui, pad);
        ui.add_space(32.0);
        ui.vertical(|ui| {
            ui.add_space(20.0);
            ui.horizontal(|ui| {
                tap_button(ui, pad, LogicalButton::Select, now);
                tap_button(ui, pad, LogicalButton::Start, now);
            });
        });
        ui.add_space(32.0);
        ui.horizontal(|ui| {
            hold_button(ui, pad, LogicalButton::B, ACTION_BUTTON_SIZE);
            hold_button(ui, pad, LogicalButton::A, ACTION_BUTTON_SIZE);
        });
    });
}

fn dpad(ui: &mut Ui, pad: &mut VirtualPad) {
    egui::Grid::new("dpad")
        .spacing([2.0, 2.0])
        .show(ui, |ui| {
            ui.label("");
            hold_button(ui, pad, LogicalButton::Up, DPAD_BUTTON_SIZE);
            ui.end_row();

            hold_button(ui, pad, LogicalButton::Left, DPAD_BUTTON_SIZE);
            ui.label("");
            hold_button(ui, pad, LogicalButton::Right, DPAD_BUTTON_SIZE);
            ui.end_row();

            ui.label("");
            hold_button(ui, pad, LogicalButton::Down, DPAD_BUTTON_SIZE);
            ui.end_row();
        });
}

fn pad_button(ui: &mut Ui, pad: &VirtualPad, button: LogicalButton, size: Vec2) -> Response {
    ui.add(
        Button::new(RichText::new(button.label()).strong())
            .selected(pad.is_pressed(button))
            .min_size(size),
    )
    .on_hover_cursor(CursorIcon::PointingHand)
}

fn hold_button(ui: &mut Ui, pad: &mut VirtualPad, button: LogicalButton, size: Vec2) {
    if pad_button(ui, pad, button, size).is_pointer_button_down_on() {
        pad.press(button);
    } else {
        pad.release(button);
    }
}

fn tap_button(ui: &mut Ui, pad: &mut VirtualPad, button: LogicalButton, now: f64) {
    if pad_button(ui, pad, button, MENU_BUTTON_SIZE).clicked() {
        pad.tap(button, now);
    }
}
