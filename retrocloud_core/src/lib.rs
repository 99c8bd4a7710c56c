//! Launcher logic that does not depend on a UI toolkit.
//!
//! The [`bridge::EmulatorBridge`] adapts ROM URLs and logical button events into calls against an
//! external NES emulation library (see [`library::NesLibrary`]). Everything else in this crate is
//! static catalog data, selection state and the plumbing around the bridge.
pub mod bridge;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod framebuffer;
pub mod ines;
pub mod input;
pub mod library;
pub mod logging;
pub mod selection;
pub mod util;

pub use bridge::BridgeMode;
pub use bridge::BridgeState;
pub use bridge::EmulatorBridge;
pub use catalog::Catalog;
pub use config::LauncherConfig;
pub use input::LogicalButton;
