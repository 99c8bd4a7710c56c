//! Which screen the launcher shows.
use log::info;

use crate::catalog::Game;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Consoles,
    Library,
    Player,
}

/// Selected console, selected game and whether the game is playing.
///
/// Only changed through the operations below, in response to user actions. Nothing is
/// persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    console: Option<String>,
    game: Option<Game>,
    playing: bool,
}

impl SelectionState {
    pub fn console(&self) -> Option<&str> {
        self.console.as_deref()
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn screen(&self) -> Screen {
        match (&self.console, &self.game, self.playing) {
            (_, Some(_), true) => Screen::Player,
            (Some(_), _, _) => Screen::Library,
            (None, _, _) => Screen::Consoles,
        }
    }

    pub fn select_console(&mut self, console_id: &str) {
        info!("Selected console {console_id}");
        self.console = Some(console_id.to_string());
        self.game = None;
        self.playing = false;
    }

    pub fn select_game(&mut self, game: Game) {
        info!("Selected game {}", game.id);
        self.game = Some(game);
        self.playing = true;
    }

    pub fn back_to_library(&mut self) {
        self.game = None;
        self.playing = false;
    }

    pub fn back_to_consoles(&mut self) {
        self.console = None;
        self.game = None;
        self.playing = false;
    }

    /// Whether the header shows a back button.
    pub fn can_go_back(&self) -> bool {
        self.console.is_some() || self.playing
    }

    /// The header's back button: leaves the player for the library, or the library for the
    /// console list.
    pub fn back(&mut self) {
        if self.console.is_some() && !self.playing {
            self.back_to_consoles();
        } else {
            self.back_to_library();
        }
    }
}
