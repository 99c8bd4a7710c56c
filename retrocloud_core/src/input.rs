//! Logical gamepad buttons and the event bus carrying them from controls to the bridge.
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::rc::Rc;

use log::trace;
use strum::EnumIter;
use strum::EnumString;
use strum::IntoStaticStr;

/// The fixed vocabulary of buttons, independent of any input device.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogicalButton {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Select,
    Start,
}

impl LogicalButton {
    /// Button index understood by the emulation library's controller API.
    pub fn library_index(self) -> u8 {
        match self {
            LogicalButton::A => 0,
            LogicalButton::B => 1,
            LogicalButton::Select => 2,
            LogicalButton::Start => 3,
            LogicalButton::Up => 4,
            LogicalButton::Down => 5,
            LogicalButton::Left => 6,
            LogicalButton::Right => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogicalButton::Up => "⏶",
            LogicalButton::Down => "⏷",
            LogicalButton::Left => "⏴",
            LogicalButton::Right => "⏵",
            LogicalButton::A => "A",
            LogicalButton::B => "B",
            LogicalButton::Select => "SELECT",
            LogicalButton::Start => "START",
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: LogicalButton,
    pub pressed: bool,
}

impl ButtonEvent {
    pub fn press(button: LogicalButton) -> Self {
        Self {
            button,
            pressed: true,
        }
    }

    pub fn release(button: LogicalButton) -> Self {
        Self {
            button,
            pressed: false,
        }
    }
}

/// Queue of button events shared by reference between the controls that produce them and the
/// bridge that consumes them. Clones refer to the same queue.
#[derive(Clone, Default)]
pub struct InputBus {
    queue: Rc<RefCell<VecDeque<ButtonEvent>>>,
}

impl InputBus {
    pub fn send(&self, event: ButtonEvent) {
        trace!(
            "{} {}",
            event.button.name(),
            if event.pressed { "pressed" } else { "released" }
        );
        self.queue.borrow_mut().push_back(event);
    }

    pub fn drain(&self) -> Vec<ButtonEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// State behind the on-screen gamepad.
///
/// Tracks which buttons are held for pressed-state styling and turns press, release and tap
/// gestures into events on the [`InputBus`]. The pressed set has no gameplay meaning.
pub struct VirtualPad {
    bus: InputBus,
    pressed: BTreeSet<LogicalButton>,
    pending_releases: Vec<(LogicalButton, f64)>,
    tap_duration: f64,
}

impl VirtualPad {
    pub fn new(bus: InputBus, tap_release_ms: u64) -> Self {
        Self {
            bus,
            pressed: BTreeSet::new(),
            pending_releases: Vec::new(),
            tap_duration: tap_release_ms as f64 / 1000.0,
        }
    }

    pub fn bus(&self) -> &InputBus {
        &self.bus
    }

    pub fn is_pressed(&self, button: LogicalButton) -> bool {
        self.pressed.contains(&button)
    }

    /// Returns true if this started a new press.
    pub fn press(&mut self, button: LogicalButton) -> bool {
        if !self.pressed.insert(button) {
            return false;
        }
        self.bus.send(ButtonEvent::press(button));
        true
    }

    /// Returns true if the button was held.
    pub fn release(&mut self, button: LogicalButton) -> bool {
        if !self.pressed.remove(&button) {
            return false;
        }
        self.pending_releases.retain(|(pending, _)| *pending != button);
        self.bus.send(ButtonEvent::release(button));
        true
    }

    /// Presses `button` now and releases it automatically once the tap duration has passed.
    pub fn tap(&mut self, button: LogicalButton, now: f64) {
        if self.press(button) {
            self.pending_releases.push((button, now + self.tap_duration));
        }
    }

    /// Emits releases for taps that are due. `now` is in seconds on the same clock as
    /// [`VirtualPad::tap`].
    pub fn update(&mut self, now: f64) {
        let due: Vec<LogicalButton> = self
            .pending_releases
            .iter()
            .filter(|(_, deadline)| *deadline <= now)
            .map(|(button, _)| *button)
            .collect();
        for button in due {
            self.release(button);
        }
    }

    pub fn has_pending_taps(&self) -> bool {
        !self.pending_releases.is_empty()
    }

    pub fn release_all(&mut self) {
        let held: Vec<LogicalButton> = self.pressed.iter().copied().collect();
        for button in held {
            self.release(button);
        }
    }
}
