//! Drives the emulator bridge with a recording stand-in for the emulation library and a fetcher
//! serving ROMs from memory.
use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use retrocloud_core::bridge::BridgeCallbacks;
use retrocloud_core::bridge::BridgeOptions;
use retrocloud_core::fetch::FetchCallback;
use retrocloud_core::fetch::FetchError;
use retrocloud_core::fetch::FetchResult;
use retrocloud_core::fetch::RomFetcher;
use retrocloud_core::framebuffer::Rgba32;
use retrocloud_core::framebuffer::SCREEN_PIXELS;
use retrocloud_core::input::ButtonEvent;
use retrocloud_core::input::InputBus;
use retrocloud_core::library::AudioSink;
use retrocloud_core::library::LibraryCallbacks;
use retrocloud_core::library::LibraryFactory;
use retrocloud_core::library::NesLibrary;
use retrocloud_core::library::UnavailableLibrary;
use retrocloud_core::logging;
use retrocloud_core::BridgeMode;
use retrocloud_core::BridgeState;
use retrocloud_core::EmulatorBridge;
use retrocloud_core::LogicalButton;

const VALID_ROM_URL: &str = "/roms/test.nes";
const MISSING_ROM_URL: &str = "/roms/missing.nes";
const FRAME_COLOR: u32 = 0x00_30_20_10;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    LoadRom(usize),
    Frame,
    Down(u8, u8),
    Up(u8, u8),
}

#[derive(Clone, Copy, Default)]
struct Faults {
    create: bool,
    load: bool,
    frame: bool,
}

type CallLog = Rc<RefCell<Vec<Call>>>;

struct RecordingLibrary {
    calls: CallLog,
    callbacks: LibraryCallbacks,
    faults: Faults,
}

impl NesLibrary for RecordingLibrary {
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), String> {
        self.calls.borrow_mut().push(Call::LoadRom(rom.len()));
        if self.faults.load {
            return Err("unsupported mapper".to_string());
        }
        Ok(())
    }

    fn frame(&mut self) -> Result<(), String> {
        self.calls.borrow_mut().push(Call::Frame);
        if self.faults.frame {
            return Err("CPU jammed".to_string());
        }
        (self.callbacks.on_frame)(&vec![FRAME_COLOR; SCREEN_PIXELS]);
        (self.callbacks.on_audio_sample)(0.25, -0.25);
        Ok(())
    }

    fn button_down(&mut self, player: u8, button: u8) {
        self.calls.borrow_mut().push(Call::Down(player, button));
    }

    fn button_up(&mut self, player: u8, button: u8) {
        self.calls.borrow_mut().push(Call::Up(player, button));
    }
}

struct RecordingFactory {
    calls: CallLog,
    faults: Faults,
}

impl LibraryFactory for RecordingFactory {
    fn create(&self, callbacks: LibraryCallbacks) -> Result<Box<dyn NesLibrary>, String> {
        if self.faults.create {
            return Err("jsnes is not defined".to_string());
        }
        Ok(Box::new(RecordingLibrary {
            calls: self.calls.clone(),
            callbacks,
            faults: self.faults,
        }))
    }
}

/// Serves ROMs from memory. In deferred mode requests are held until `complete_all`.
#[derive(Clone, Default)]
struct MemoryFetcher {
    files: Rc<HashMap<String, Vec<u8>>>,
    deferred: bool,
    pending: Rc<RefCell<Vec<(String, FetchCallback)>>>,
}

impl MemoryFetcher {
    fn result_for(files: &HashMap<String, Vec<u8>>, url: &str) -> FetchResult {
        files
            .get(url)
            .cloned()
            .ok_or(FetchError::NotFound { status: 404 })
    }

    fn complete_all(&self) {
        let pending: Vec<_> = self.pending.borrow_mut().drain(..).collect();
        for (url, done) in pending {
            done(Self::result_for(&self.files, &url));
        }
    }
}

impl RomFetcher for MemoryFetcher {
    fn fetch(&self, url: &str, done: FetchCallback) {
        if self.deferred {
            self.pending.borrow_mut().push((url.to_string(), done));
        } else {
            done(Self::result_for(&self.files, url));
        }
    }
}

#[derive(Default)]
struct RecordingAudio {
    samples: Rc<RefCell<Vec<(f32, f32)>>>,
    closed: Rc<Cell<bool>>,
}

impl AudioSink for RecordingAudio {
    fn push_samples(&mut self, samples: &[(f32, f32)]) {
        self.samples.borrow_mut().extend_from_slice(samples);
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

/// A minimal NROM image: header, 16 KiB PRG, 8 KiB CHR.
fn nrom_image() -> Vec<u8> {
    let mut rom = b"NES\x1A\x01\x01\x00\x00".to_vec();
    rom.resize(16 + 16 * 1024 + 8 * 1024, 0);
    rom
}

struct Fixture {
    bridge: EmulatorBridge,
    calls: CallLog,
    fetcher: MemoryFetcher,
    loads: Rc<Cell<u32>>,
    errors: Rc<RefCell<Vec<String>>>,
}

fn fixture_with(faults: Faults, deferred: bool, options: BridgeOptions) -> Fixture {
    logging::test_init(false);
    let calls = CallLog::default();
    let mut files = HashMap::new();
    files.insert(VALID_ROM_URL.to_string(), nrom_image());
    files.insert("/roms/tiny.nes".to_string(), b"NES\x1A".to_vec());
    let mut header_only = b"NES\x1A".to_vec();
    header_only.resize(16, 0);
    files.insert("/roms/header_only.nes".to_string(), header_only);
    files.insert(
        "/roms/Donkey Kong Country.smc".to_string(),
        vec![0x78; 32 * 1024],
    );
    let fetcher = MemoryFetcher {
        files: Rc::new(files),
        deferred,
        ..Default::default()
    };
    let mut bridge = EmulatorBridge::new(
        Box::new(RecordingFactory {
            calls: calls.clone(),
            faults,
        }),
        Box::new(fetcher.clone()),
        options,
    );
    let loads = Rc::new(Cell::new(0));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let loads_ref = loads.clone();
    let errors_ref = errors.clone();
    bridge.set_callbacks(
        BridgeCallbacks::default()
            .on_load(move || loads_ref.set(loads_ref.get() + 1))
            .on_error(move |message| errors_ref.borrow_mut().push(message.to_string())),
    );
    Fixture {
        bridge,
        calls,
        fetcher,
        loads,
        errors,
    }
}

fn fixture() -> Fixture {
    fixture_with(
        Faults::default(),
        false,
        BridgeOptions {
            autostart: false,
            ..Default::default()
        },
    )
}

fn frame_calls(calls: &CallLog) -> usize {
    calls
        .borrow()
        .iter()
        .filter(|call| **call == Call::Frame)
        .count()
}

#[test]
fn test_valid_rom_loads_once_and_renders() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.tick(0.0);

    assert_eq!(f.bridge.state(), BridgeState::Ready);
    assert_eq!(f.bridge.mode(), BridgeMode::Real);
    assert_eq!(f.loads.get(), 1);
    assert!(f.errors.borrow().is_empty());
    assert_eq!(
        *f.calls.borrow(),
        vec![Call::LoadRom(16 + 24 * 1024)]
    );

    // Nothing runs before playback starts.
    assert!(!f.bridge.tick(0.016));
    assert_eq!(frame_calls(&f.calls), 0);

    f.bridge.start();
    assert!(f.bridge.tick(0.033));
    assert_eq!(frame_calls(&f.calls), 1);
    assert_eq!(
        f.bridge.framebuffer().get(10, 10),
        Rgba32::rgb(0x10, 0x20, 0x30)
    );

    for i in 0..5 {
        f.bridge.tick(0.05 + i as f64 * 0.016);
    }
    assert_eq!(frame_calls(&f.calls), 6);
    assert_eq!(f.loads.get(), 1);
}

#[test]
fn test_autostart_runs_after_load() {
    let mut f = fixture_with(Faults::default(), false, BridgeOptions::default());
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.tick(0.0);
    assert!(f.bridge.is_running());
    assert_eq!(frame_calls(&f.calls), 1);
}

#[test]
fn test_short_buffer_falls_back() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some("/roms/tiny.nes"));
    f.bridge.tick(0.0);
    f.bridge.tick(1.0);

    assert_eq!(f.bridge.state(), BridgeState::Fallback);
    assert_eq!(f.bridge.mode(), BridgeMode::Demo);
    assert_eq!(f.loads.get(), 0);
    assert_eq!(f.errors.borrow().len(), 1);
    assert!(f.errors.borrow()[0].contains("malformed"), "{:?}", f.errors);
    // The library is never constructed for a malformed ROM.
    assert!(f.calls.borrow().is_empty());
}

#[test]
fn test_bare_header_is_handed_to_library() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some("/roms/header_only.nes"));
    f.bridge.tick(0.0);
    f.bridge.tick(1.0);

    assert_eq!(f.bridge.state(), BridgeState::Ready);
    assert_eq!(f.bridge.mode(), BridgeMode::Real);
    assert_eq!(f.loads.get(), 1);
    assert!(f.errors.borrow().is_empty());
    assert_eq!(*f.calls.borrow(), vec![Call::LoadRom(16)]);
}

#[test]
fn test_missing_rom_reports_not_found_and_animates() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(MISSING_ROM_URL));
    f.bridge.tick(0.0);

    assert_eq!(f.bridge.state(), BridgeState::Fallback);
    assert_eq!(
        *f.errors.borrow(),
        vec!["ROM not found at /roms/missing.nes (HTTP 404)".to_string()]
    );
    assert_eq!(f.bridge.last_error(), Some(f.errors.borrow()[0].as_str()));

    let before = f.bridge.framebuffer().generation();
    assert!(f.bridge.tick(1.0));
    assert!(f.bridge.tick(2.0));
    assert!(f.bridge.framebuffer().generation() > before);
    assert_eq!(f.errors.borrow().len(), 1);
}

#[test]
fn test_non_nes_image_is_malformed() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some("/roms/Donkey Kong Country.smc"));
    f.bridge.tick(0.0);
    assert_eq!(f.bridge.state(), BridgeState::Fallback);
    assert_eq!(f.errors.borrow().len(), 1);
}

#[test]
fn test_library_construction_failure_falls_back() {
    let mut f = fixture_with(
        Faults {
            create: true,
            ..Default::default()
        },
        false,
        BridgeOptions::default(),
    );
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.tick(0.0);
    assert_eq!(f.bridge.state(), BridgeState::Fallback);
    assert_eq!(f.loads.get(), 0);
    assert_eq!(
        *f.errors.borrow(),
        vec!["Emulation library failed to start: jsnes is not defined".to_string()]
    );
}

#[test]
fn test_library_load_failure_falls_back() {
    let mut f = fixture_with(
        Faults {
            load: true,
            ..Default::default()
        },
        false,
        BridgeOptions::default(),
    );
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.tick(0.0);
    assert_eq!(f.bridge.state(), BridgeState::Fallback);
    assert_eq!(f.errors.borrow().len(), 1);
}

#[test]
fn test_frame_failure_falls_back() {
    let mut f = fixture_with(
        Faults {
            frame: true,
            ..Default::default()
        },
        false,
        BridgeOptions::default(),
    );
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.tick(0.0);
    assert_eq!(f.loads.get(), 1);
    assert_eq!(f.bridge.state(), BridgeState::Fallback);
    assert_eq!(
        *f.errors.borrow(),
        vec!["Emulation library failed to start: CPU jammed".to_string()]
    );
    f.bridge.tick(1.0);
    assert_eq!(frame_calls(&f.calls), 1);
}

#[test]
fn test_unavailable_library_falls_back() {
    let fetcher = MemoryFetcher {
        files: Rc::new(HashMap::from([(VALID_ROM_URL.to_string(), nrom_image())])),
        ..Default::default()
    };
    let mut bridge = EmulatorBridge::new(
        Box::new(UnavailableLibrary),
        Box::new(fetcher),
        BridgeOptions::default(),
    );
    bridge.set_rom_url(Some(VALID_ROM_URL));
    bridge.tick(0.0);
    assert_eq!(bridge.state(), BridgeState::Fallback);
    assert!(bridge.last_error().unwrap().contains("no NES emulation library"));
}

#[test]
fn test_error_state_when_fallback_disabled() {
    let mut f = fixture_with(
        Faults::default(),
        false,
        BridgeOptions {
            fallback_on_failure: false,
            ..Default::default()
        },
    );
    f.bridge.set_rom_url(Some(MISSING_ROM_URL));
    f.bridge.tick(0.0);
    assert_eq!(f.bridge.state(), BridgeState::Error);
    assert!(!f.bridge.is_running());
    assert!(!f.bridge.tick(1.0));
    assert_eq!(f.errors.borrow().len(), 1);
}

#[test]
fn test_press_release_forwarded_once() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.poll();
    f.calls.borrow_mut().clear();

    f.bridge.press(LogicalButton::A);
    f.bridge.press(LogicalButton::A);
    f.bridge.release(LogicalButton::A);
    f.bridge.release(LogicalButton::A);
    f.bridge.press(LogicalButton::Right);
    f.bridge.release(LogicalButton::Right);

    assert_eq!(
        *f.calls.borrow(),
        vec![
            Call::Down(1, 0),
            Call::Up(1, 0),
            Call::Down(1, 7),
            Call::Up(1, 7),
        ]
    );
}

#[test]
fn test_input_bus_is_applied_in_order() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.poll();
    f.calls.borrow_mut().clear();

    let bus = InputBus::default();
    bus.send(ButtonEvent::press(LogicalButton::Start));
    bus.send(ButtonEvent::release(LogicalButton::Start));
    bus.send(ButtonEvent::press(LogicalButton::Up));
    f.bridge.drain_input(&bus);

    assert!(bus.is_empty());
    assert_eq!(
        *f.calls.borrow(),
        vec![Call::Down(1, 3), Call::Up(1, 3), Call::Down(1, 4)]
    );
}

#[test]
fn test_button_held_by_two_sources_releases_last() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.poll();
    f.calls.borrow_mut().clear();

    // Keyboard and on-screen pad both feed the same bus.
    let bus = InputBus::default();
    bus.send(ButtonEvent::press(LogicalButton::A));
    bus.send(ButtonEvent::press(LogicalButton::A));
    bus.send(ButtonEvent::release(LogicalButton::A));
    f.bridge.drain_input(&bus);
    assert_eq!(*f.calls.borrow(), vec![Call::Down(1, 0)]);

    bus.send(ButtonEvent::release(LogicalButton::A));
    f.bridge.drain_input(&bus);
    assert_eq!(*f.calls.borrow(), vec![Call::Down(1, 0), Call::Up(1, 0)]);

    // Stray releases are ignored.
    bus.send(ButtonEvent::release(LogicalButton::A));
    f.bridge.drain_input(&bus);
    assert_eq!(f.calls.borrow().len(), 2);
}

#[test]
fn test_input_ignored_without_library() {
    let mut f = fixture();
    f.bridge.press(LogicalButton::B);
    f.bridge.set_rom_url(Some(MISSING_ROM_URL));
    f.bridge.poll();
    f.bridge.press(LogicalButton::B);
    f.bridge.release(LogicalButton::B);
    assert!(f.calls.borrow().is_empty());
}

#[test]
fn test_stop_prevents_frames() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.start();
    f.bridge.tick(0.0);
    f.bridge.start();
    f.bridge.tick(0.016);
    assert_eq!(frame_calls(&f.calls), 1);

    f.bridge.stop();
    for i in 0..10 {
        assert!(!f.bridge.tick(0.1 + i as f64));
    }
    assert_eq!(frame_calls(&f.calls), 1);

    f.bridge.toggle();
    f.bridge.tick(20.0);
    assert_eq!(frame_calls(&f.calls), 2);
}

#[test]
fn test_stale_fetch_is_ignored() {
    let mut f = fixture_with(
        Faults::default(),
        true,
        BridgeOptions {
            autostart: false,
            ..Default::default()
        },
    );
    f.bridge.set_rom_url(Some(MISSING_ROM_URL));
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    assert_eq!(f.bridge.state(), BridgeState::Loading);

    // Both requests complete; only the second one counts.
    f.fetcher.complete_all();
    f.bridge.tick(0.0);

    assert_eq!(f.bridge.state(), BridgeState::Ready);
    assert_eq!(f.loads.get(), 1);
    assert!(f.errors.borrow().is_empty());
}

#[test]
fn test_fetch_after_unmount_is_ignored() {
    let mut f = fixture_with(Faults::default(), true, BridgeOptions::default());
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.unmount();
    f.fetcher.complete_all();
    f.bridge.tick(0.0);

    assert_eq!(f.bridge.state(), BridgeState::Uninitialized);
    assert_eq!(f.loads.get(), 0);
    assert!(f.calls.borrow().is_empty());
}

#[test]
fn test_same_url_does_not_reload() {
    let mut f = fixture();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.poll();
    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.poll();
    assert_eq!(f.loads.get(), 1);
    assert_eq!(f.bridge.state(), BridgeState::Ready);

    f.bridge.set_rom_url(None);
    assert_eq!(f.bridge.state(), BridgeState::Uninitialized);
}

#[test]
fn test_audio_is_forwarded_and_closed_on_unmount() {
    let mut f = fixture_with(Faults::default(), false, BridgeOptions::default());
    let audio = RecordingAudio::default();
    let samples = audio.samples.clone();
    let closed = audio.closed.clone();
    f.bridge.set_audio_sink(Box::new(audio));

    f.bridge.set_rom_url(Some(VALID_ROM_URL));
    f.bridge.tick(0.0);
    f.bridge.tick(0.016);
    assert_eq!(*samples.borrow(), vec![(0.25, -0.25), (0.25, -0.25)]);

    assert!(!closed.get());
    f.bridge.unmount();
    assert!(closed.get());
    assert!(!f.bridge.is_running());
    f.bridge.tick(1.0);
    assert_eq!(frame_calls(&f.calls), 2);
}
