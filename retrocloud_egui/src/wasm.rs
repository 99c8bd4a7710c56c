#![cfg(target_arch = "wasm32")]
//! Browser entry point, ROM downloads and the binding to the jsnes emulation library.
use js_sys::Object;
use js_sys::Reflect;
use js_sys::Uint32Array;
use js_sys::Uint8Array;
use log::error;
use retrocloud_core::fetch::FetchCallback;
use retrocloud_core::fetch::FetchError;
use retrocloud_core::fetch::FetchResult;
use retrocloud_core::fetch::RomFetcher;
use retrocloud_core::library::LibraryCallbacks;
use retrocloud_core::library::LibraryFactory;
use retrocloud_core::library::NesLibrary;
use retrocloud_core::LauncherConfig;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlCanvasElement;
use web_sys::Response;

use crate::LauncherApp;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = jsnes, js_name = NES)]
    type JsNes;

    #[wasm_bindgen(constructor, js_namespace = jsnes, js_class = "NES", catch)]
    fn new(options: &JsValue) -> Result<JsNes, JsValue>;

    #[wasm_bindgen(method, js_name = loadROM, catch)]
    fn load_rom(this: &JsNes, data: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn frame(this: &JsNes) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = buttonDown)]
    fn button_down(this: &JsNes, player: u8, button: u8);

    #[wasm_bindgen(method, js_name = buttonUp)]
    fn button_up(this: &JsNes, player: u8, button: u8);
}

fn js_message(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| String::from(err.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

/// A `jsnes.NES` instance. Owns the closures handed to it so they outlive the instance.
struct JsnesLibrary {
    nes: JsNes,
    _on_frame: Closure<dyn FnMut(JsValue)>,
    _on_audio_sample: Closure<dyn FnMut(f32, f32)>,
}

impl NesLibrary for JsnesLibrary {
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), String> {
        // jsnes expects a binary string with one character per byte.
        let binary: String = rom.iter().map(|&byte| byte as char).collect();
        self.nes.load_rom(&binary).map_err(js_message)
    }

    fn frame(&mut self) -> Result<(), String> {
        self.nes.frame().map_err(js_message)
    }

    fn button_down(&mut self, player: u8, button: u8) {
        self.nes.button_down(player, button);
    }

    fn button_up(&mut self, player: u8, button: u8) {
        self.nes.button_up(player, button);
    }
}

struct JsnesFactory;

impl LibraryFactory for JsnesFactory {
    fn create(&self, callbacks: LibraryCallbacks) -> Result<Box<dyn NesLibrary>, String> {
        let LibraryCallbacks {
            mut on_frame,
            mut on_audio_sample,
        } = callbacks;
        let on_frame = Closure::<dyn FnMut(JsValue)>::new(move |buffer: JsValue| {
            let pixels = Uint32Array::new(&buffer).to_vec();
            on_frame(&pixels);
        });
        let on_audio_sample =
            Closure::<dyn FnMut(f32, f32)>::new(move |left: f32, right: f32| {
                on_audio_sample(left, right);
            });

        let options = Object::new();
        Reflect::set(&options, &"onFrame".into(), on_frame.as_ref()).map_err(js_message)?;
        Reflect::set(&options, &"onAudioSample".into(), on_audio_sample.as_ref())
            .map_err(js_message)?;
        let nes = JsNes::new(&options).map_err(js_message)?;
        Ok(Box::new(JsnesLibrary {
            nes,
            _on_frame: on_frame,
            _on_audio_sample: on_audio_sample,
        }))
    }
}

/// Downloads ROMs with the browser's fetch API.
struct HttpFetcher;

impl RomFetcher for HttpFetcher {
    fn fetch(&self, url: &str, done: FetchCallback) {
        let url = url.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            done(download(&url).await);
        });
    }
}

async fn download(url: &str) -> FetchResult {
    let network_error = |value: JsValue| FetchError::Network(js_message(value));
    let window =
        web_sys::window().ok_or_else(|| FetchError::Network("no window".to_string()))?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(network_error)?
        .dyn_into()
        .map_err(network_error)?;
    match response.status() {
        200..=299 => {}
        status @ (403 | 404 | 410) => return Err(FetchError::NotFound { status }),
        status => return Err(FetchError::Network(format!("HTTP {status}"))),
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(network_error)?)
        .await
        .map_err(network_error)?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

#[wasm_bindgen]
pub fn start_app(canvas_id: &str) {
    // Make sure panics are logged using `console.error`.
    console_error_panic_hook::set_once();

    // Redirect tracing to console.log and friends:
    tracing_wasm::set_as_global_default();

    let canvas = match web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(canvas_id))
        .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
    {
        Some(canvas) => canvas,
        None => {
            error!("No canvas with id {canvas_id}");
            return;
        }
    };

    let config = LauncherConfig::default();
    let catalog = match config.load_catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("{err:#}");
            return;
        }
    };

    wasm_bindgen_futures::spawn_local(async move {
        let result = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|cc| {
                    Ok(Box::new(LauncherApp::with_creation_context(
                        cc,
                        config,
                        catalog,
                        Box::new(JsnesFactory),
                        Box::new(HttpFetcher),
                        None,
                    )))
                }),
            )
            .await;
        if let Err(err) = result {
            error!("Failed to start eframe: {err:?}");
        }
    });
}
