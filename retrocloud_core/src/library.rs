//! Interface to the external NES emulation library.
//!
//! The launcher does not emulate anything itself. A [`LibraryFactory`] constructs a library
//! instance, handing it callbacks through which the library delivers finished frames and audio
//! samples. The shape follows the jsnes API the browser build binds to.

/// Player number used for all input.
pub const PLAYER_ONE: u8 = 1;

/// Called by the library with one frame of 256x240 pixels packed as `0x00BBGGRR`.
pub type FrameCallback = Box<dyn FnMut(&[u32])>;

/// Called by the library with one stereo audio sample.
pub type AudioSampleCallback = Box<dyn FnMut(f32, f32)>;

pub struct LibraryCallbacks {
    pub on_frame: FrameCallback,
    pub on_audio_sample: AudioSampleCallback,
}

/// A running instance of the emulation library. Errors carry the library's own message.
pub trait NesLibrary {
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), String>;

    /// Emulates one frame. The frame callback is invoked during this call.
    fn frame(&mut self) -> Result<(), String>;

    fn button_down(&mut self, player: u8, button: u8);

    fn button_up(&mut self, player: u8, button: u8);
}

pub trait LibraryFactory {
    fn create(&self, callbacks: LibraryCallbacks) -> Result<Box<dyn NesLibrary>, String>;
}

/// Factory for platforms without an emulation library. Always fails, which puts the bridge into
/// fallback rendering.
#[derive(Default)]
pub struct UnavailableLibrary;

impl LibraryFactory for UnavailableLibrary {
    fn create(&self, _callbacks: LibraryCallbacks) -> Result<Box<dyn NesLibrary>, String> {
        Err("no NES emulation library is available on this platform".to_string())
    }
}

/// Destination for audio samples produced by the library.
pub trait AudioSink {
    fn push_samples(&mut self, samples: &[(f32, f32)]);

    /// Releases the underlying audio device. Called when the bridge is unmounted.
    fn close(&mut self);
}
