//! egui frontend of the RetroCloud launcher.
//!
//! Runs natively through eframe and in the browser, where the wasm module binds to the jsnes
//! emulation library.
mod app;
mod audio;
mod console_selector;
mod game_library;
mod game_player;
mod keyboard;
mod util;
mod virtual_controls;
mod wasm;

pub use app::LauncherApp;
pub use app::UiAction;
pub use game_player::GamePlayer;
