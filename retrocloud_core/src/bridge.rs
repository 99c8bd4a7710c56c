//! The emulator bridge: connects a ROM URL and button events to the external emulation library
//! and renders its output.
//!
//! The bridge is an explicit state machine:
//!
//! ```text
//!                  set_rom_url(Some)
//!  Uninitialized ───────────────────▶ Loading ──── fetch, validate, create, load ───▶ Ready
//!        ▲                               │                                           │
//!        │ set_rom_url(None) / unmount   │ any failure                frame error │
//!        │                               ▼                                           ▼
//!        └────────────────────────── Fallback (or Error if fallback is disabled) ◀───┘
//! ```
//!
//! Every failure is reported once through the error callback and leaves the bridge showing the
//! fallback animation. Nothing is retried: setting the ROM URL again starts over.
//!
//! Frames are driven from outside by calling [`EmulatorBridge::tick`] once per display refresh.
use std::cell::Cell;
use std::cell::Ref;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use log::debug;
use log::error;
use log::info;
use tracing::instrument;

use crate::config::LauncherConfig;
use crate::error::BridgeError;
use crate::fallback::render_error_screen;
use crate::fallback::FallbackRenderer;
use crate::fetch::FetchResult;
use crate::fetch::RomFetcher;
use crate::framebuffer::Framebuffer;
use crate::framebuffer::Rgba32;
use crate::ines::InesHeader;
use crate::input::InputBus;
use crate::input::LogicalButton;
use crate::library::AudioSink;
use crate::library::LibraryCallbacks;
use crate::library::LibraryFactory;
use crate::library::NesLibrary;
use crate::library::PLAYER_ONE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Loading,
    Ready,
    Fallback,
    Error,
}

/// Whether the screen shows real emulation or a placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeMode {
    Real,
    Demo,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeOptions {
    pub fallback_on_failure: bool,
    pub fallback_fps: u32,
    /// Start running as soon as the ROM is loaded.
    pub autostart: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            fallback_on_failure: true,
            fallback_fps: 30,
            autostart: true,
        }
    }
}

impl From<&LauncherConfig> for BridgeOptions {
    fn from(config: &LauncherConfig) -> Self {
        Self {
            fallback_on_failure: config.fallback_on_failure,
            fallback_fps: config.fallback_fps,
            autostart: config.autostart,
        }
    }
}

/// The two signals the bridge reports to its owner.
#[derive(Default)]
pub struct BridgeCallbacks {
    on_load: Option<Box<dyn FnMut()>>,
    on_error: Option<Box<dyn FnMut(&str)>>,
}

impl BridgeCallbacks {
    pub fn on_load(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_load = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }
}

enum Runtime {
    Uninitialized,
    Loading,
    Ready(Box<dyn NesLibrary>),
    Fallback(FallbackRenderer),
    Error,
}

type CompletedFetch = Rc<RefCell<Option<(u64, FetchResult)>>>;

pub struct EmulatorBridge {
    factory: Box<dyn LibraryFactory>,
    fetcher: Box<dyn RomFetcher>,
    options: BridgeOptions,
    callbacks: BridgeCallbacks,
    audio_sink: Option<Box<dyn AudioSink>>,

    runtime: Runtime,
    rom_url: Option<String>,
    /// Incremented whenever the ROM URL changes, so late fetch results can be recognized.
    generation: Rc<Cell<u64>>,
    running: bool,
    /// Number of input sources holding each button.
    held: BTreeMap<LogicalButton, u32>,
    last_error: Option<String>,

    framebuffer: Rc<RefCell<Framebuffer>>,
    audio_samples: Rc<RefCell<Vec<(f32, f32)>>>,
    completed_fetch: CompletedFetch,
}

impl EmulatorBridge {
    pub fn new(
        factory: Box<dyn LibraryFactory>,
        fetcher: Box<dyn RomFetcher>,
        options: BridgeOptions,
    ) -> Self {
        Self {
            factory,
            fetcher,
            options,
            callbacks: BridgeCallbacks::default(),
            audio_sink: None,
            runtime: Runtime::Uninitialized,
            rom_url: None,
            generation: Rc::new(Cell::new(0)),
            running: false,
            held: BTreeMap::new(),
            last_error: None,
            framebuffer: Rc::new(RefCell::new(Framebuffer::default())),
            audio_samples: Rc::new(RefCell::new(Vec::new())),
            completed_fetch: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_callbacks(&mut self, callbacks: BridgeCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        if let Some(mut previous) = self.audio_sink.replace(sink) {
            previous.close();
        }
    }

    pub fn state(&self) -> BridgeState {
        match self.runtime {
            Runtime::Uninitialized => BridgeState::Uninitialized,
            Runtime::Loading => BridgeState::Loading,
            Runtime::Ready(_) => BridgeState::Ready,
            Runtime::Fallback(_) => BridgeState::Fallback,
            Runtime::Error => BridgeState::Error,
        }
    }

    pub fn mode(&self) -> BridgeMode {
        match self.runtime {
            Runtime::Ready(_) => BridgeMode::Real,
            _ => BridgeMode::Demo,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.runtime, Runtime::Ready(_))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn rom_url(&self) -> Option<&str> {
        self.rom_url.as_deref()
    }

    pub fn framebuffer(&self) -> Ref<'_, Framebuffer> {
        self.framebuffer.borrow()
    }

    /// Switches to a new ROM. The previous library instance is released and any fetch still in
    /// flight for it is ignored when it completes. Setting the current URL again does nothing.
    #[instrument(skip(self))]
    pub fn set_rom_url(&mut self, url: Option<&str>) {
        if url.is_some() && url == self.rom_url.as_deref() {
            return;
        }
        self.release_library();
        self.next_generation();
        self.rom_url = url.map(str::to_string);

        let Some(url) = url else {
            self.runtime = Runtime::Uninitialized;
            return;
        };

        info!("Loading ROM {url}");
        self.runtime = Runtime::Loading;
        self.framebuffer.borrow_mut().fill(Rgba32::BLACK);

        let generation = self.generation.get();
        let current_generation = self.generation.clone();
        let completed_fetch = self.completed_fetch.clone();
        self.fetcher.fetch(
            url,
            Box::new(move |result| {
                if current_generation.get() == generation {
                    *completed_fetch.borrow_mut() = Some((generation, result));
                } else {
                    debug!("Dropping result of stale ROM fetch (generation {generation})");
                }
            }),
        );
    }

    /// Processes a completed ROM fetch, if there is one. Also called by [`EmulatorBridge::tick`].
    pub fn poll(&mut self) {
        let Some((generation, result)) = self.completed_fetch.borrow_mut().take() else {
            return;
        };
        if generation != self.generation.get() || !matches!(self.runtime, Runtime::Loading) {
            debug!("Ignoring result of stale ROM fetch (generation {generation})");
            return;
        }
        let url = self.rom_url.clone().unwrap_or_default();
        match self.start_library(&url, result) {
            Ok(library) => {
                info!("ROM {url} loaded");
                self.runtime = Runtime::Ready(library);
                self.last_error = None;
                self.running = self.options.autostart;
                if let Some(on_load) = self.callbacks.on_load.as_mut() {
                    on_load();
                }
            }
            Err(err) => self.fail(err),
        }
    }

    #[instrument(skip_all)]
    fn start_library(
        &mut self,
        url: &str,
        result: FetchResult,
    ) -> Result<Box<dyn NesLibrary>, BridgeError> {
        let rom = result.map_err(|err| BridgeError::from_fetch(url, err))?;
        let header = InesHeader::parse(&rom)?;
        debug!(
            "iNES header: mapper {}, {} KiB PRG, {} KiB CHR",
            header.mapper,
            header.prg_rom_size / 1024,
            header.chr_rom_size / 1024
        );

        let framebuffer = self.framebuffer.clone();
        let audio_samples = self.audio_samples.clone();
        let callbacks = LibraryCallbacks {
            on_frame: Box::new(move |pixels| {
                framebuffer.borrow_mut().blit_packed(pixels);
            }),
            on_audio_sample: Box::new(move |left, right| {
                audio_samples.borrow_mut().push((left, right));
            }),
        };
        let mut library = self.factory.create(callbacks).map_err(BridgeError::library)?;
        library.load_rom(&rom).map_err(BridgeError::library)?;
        Ok(library)
    }

    fn fail(&mut self, err: BridgeError) {
        let message = err.to_string();
        error!("{message}");
        self.held.clear();
        self.audio_samples.borrow_mut().clear();
        if self.options.fallback_on_failure {
            let mut renderer = FallbackRenderer::new(
                self.rom_url.as_deref().unwrap_or_default(),
                self.options.fallback_fps,
            );
            renderer.render(&mut self.framebuffer.borrow_mut());
            self.runtime = Runtime::Fallback(renderer);
            self.running = true;
        } else {
            render_error_screen(&mut self.framebuffer.borrow_mut());
            self.runtime = Runtime::Error;
            self.running = false;
        }
        self.last_error = Some(message.clone());
        if let Some(on_error) = self.callbacks.on_error.as_mut() {
            on_error(&message);
        }
    }

    pub fn start(&mut self) {
        match self.runtime {
            Runtime::Ready(_) | Runtime::Fallback(_) => {
                debug!("Playback started");
                self.running = true;
            }
            _ => debug!("Nothing to start in state {:?}", self.state()),
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!("Playback stopped");
        }
        self.running = false;
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Advances by one display refresh. `now` is a monotonic time in seconds.
    ///
    /// Asks the library for exactly one frame while running, or advances the fallback animation
    /// at its own rate. Returns true if the framebuffer changed.
    #[instrument(skip(self))]
    pub fn tick(&mut self, now: f64) -> bool {
        self.poll();
        if !self.running {
            return false;
        }
        match &mut self.runtime {
            Runtime::Ready(library) => {
                if let Err(message) = library.frame() {
                    self.fail(BridgeError::library(message));
                    return true;
                }
                self.flush_audio();
                true
            }
            Runtime::Fallback(renderer) => renderer.advance(now, &mut self.framebuffer.borrow_mut()),
            _ => false,
        }
    }

    fn flush_audio(&mut self) {
        let samples = std::mem::take(&mut *self.audio_samples.borrow_mut());
        if let Some(sink) = self.audio_sink.as_mut() {
            if !samples.is_empty() {
                sink.push_samples(&samples);
            }
        }
    }

    /// Forwards a press to the library. Several sources may hold the same button, the library
    /// only sees the first press. Ignored if no library is running.
    pub fn press(&mut self, button: LogicalButton) {
        let Runtime::Ready(library) = &mut self.runtime else {
            debug!("Ignoring {} press in state {:?}", button.name(), self.state());
            return;
        };
        let holders = self.held.entry(button).or_default();
        *holders += 1;
        if *holders == 1 {
            library.button_down(PLAYER_ONE, button.library_index());
        }
    }

    /// Forwards a release to the library once the last source holding the button lets go.
    pub fn release(&mut self, button: LogicalButton) {
        let Runtime::Ready(library) = &mut self.runtime else {
            return;
        };
        let Some(holders) = self.held.get_mut(&button) else {
            return;
        };
        *holders -= 1;
        if *holders == 0 {
            self.held.remove(&button);
            library.button_up(PLAYER_ONE, button.library_index());
        }
    }

    /// Applies all queued button events in order.
    pub fn drain_input(&mut self, bus: &InputBus) {
        for event in bus.drain() {
            if event.pressed {
                self.press(event.button);
            } else {
                self.release(event.button);
            }
        }
    }

    /// Tears the bridge down: stops playback, drops the library, closes audio output and makes
    /// sure a fetch still in flight is ignored.
    pub fn unmount(&mut self) {
        self.release_library();
        self.next_generation();
        self.rom_url = None;
        self.runtime = Runtime::Uninitialized;
        if let Some(mut sink) = self.audio_sink.take() {
            sink.close();
        }
    }

    fn next_generation(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    fn release_library(&mut self) {
        self.running = false;
        self.held.clear();
        self.last_error = None;
        self.audio_samples.borrow_mut().clear();
        self.completed_fetch.borrow_mut().take();
        if matches!(self.runtime, Runtime::Ready(_)) {
            debug!("Releasing emulation library");
        }
        self.runtime = Runtime::Uninitialized;
    }
}

impl Drop for EmulatorBridge {
    fn drop(&mut self) {
        self.unmount();
    }
}
