use std::collections::BTreeSet;

use egui::Key;
use retrocloud_core::input::ButtonEvent;
use retrocloud_core::input::InputBus;
use retrocloud_core::LogicalButton;

const KEY_MAP: &[(Key, LogicalButton)] = &[
    (Key::ArrowUp, LogicalButton::Up),
    (Key::ArrowDown, LogicalButton::Down),
    (Key::ArrowLeft, LogicalButton::Left),
    (Key::ArrowRight, LogicalButton::Right),
    (Key::X, LogicalButton::A),
    (Key::Z, LogicalButton::B),
    (Key::Enter, LogicalButton::Start),
    (Key::Backspace, LogicalButton::Select),
];

/// Turns keyboard state into button events. Only changes are sent.
#[derive(Default)]
pub struct KeyboardInput {
    held: BTreeSet<LogicalButton>,
}

impl KeyboardInput {
    pub fn update(&mut self, key_down: impl Fn(Key) -> bool, bus: &InputBus) {
        for &(key, button) in KEY_MAP {
            if key_down(key) {
                if self.held.insert(button) {
                    bus.send(ButtonEvent::press(button));
                }
            } else if self.held.remove(&button) {
                bus.send(ButtonEvent::release(button));
            }
        }
    }

    pub fn release_all(&mut self, bus: &InputBus) {
        for button in std::mem::take(&mut self.held) {
            bus.send(ButtonEvent::release(button));
        }
    }
}
