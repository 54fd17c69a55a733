//! Asynchronous character loading.
//!
//! Requests run off the frame thread (a worker thread natively, a `fetch`
//! future on WASM) and push their result through an mpsc channel. The frame
//! loop drains the channel between simulation steps, so the character swap
//! always happens on the single simulation/render thread. Overlapping
//! requests are not guarded against; results install in arrival order.

use std::cell::Cell;
use std::sync::mpsc::{channel, Receiver, Sender};

use tracing::info;

use crate::asset::{AssetError, ParsedCharacter};

pub struct LoadedAsset {
    pub name: String,
    pub result: Result<ParsedCharacter, AssetError>,
}

pub struct AssetLoader {
    #[cfg(not(target_arch = "wasm32"))]
    root: std::path::PathBuf,
    #[cfg(target_arch = "wasm32")]
    base_url: String,
    tx: Sender<LoadedAsset>,
    rx: Receiver<LoadedAsset>,
    in_flight: Cell<usize>,
}

impl AssetLoader {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        let (tx, rx) = channel();
        Self {
            root: root.into(),
            tx,
            rx,
            in_flight: Cell::new(0),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(base_url: impl Into<String>) -> Self {
        let (tx, rx) = channel();
        Self {
            base_url: base_url.into(),
            tx,
            rx,
            in_flight: Cell::new(0),
        }
    }

    /// Kick off a load for the named asset. Completion is observed later via
    /// [`AssetLoader::poll`].
    pub fn request(&self, name: &str) {
        info!(%name, "requesting character asset");
        self.in_flight.set(self.in_flight.get() + 1);
        let name = name.to_string();
        let tx = self.tx.clone();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let path = self.root.join(format!("{name}.glb"));
            std::thread::spawn(move || {
                let result = std::fs::read(&path)
                    .map_err(AssetError::from)
                    .and_then(|bytes| crate::asset::parse_character(&name, &bytes));
                // The receiver only disappears on shutdown.
                let _ = tx.send(LoadedAsset { name, result });
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            let url = format!("{}/{}.glb", self.base_url, name);
            wasm_bindgen_futures::spawn_local(async move {
                let result = match fetch_bytes(&url).await {
                    Ok(bytes) => crate::asset::parse_character(&name, &bytes),
                    Err(e) => Err(e),
                };
                let _ = tx.send(LoadedAsset { name, result });
            });
        }
    }

    /// Take one completed load, if any arrived since the last call.
    pub fn poll(&self) -> Option<LoadedAsset> {
        match self.rx.try_recv() {
            Ok(loaded) => {
                self.in_flight.set(self.in_flight.get().saturating_sub(1));
                Some(loaded)
            }
            Err(_) => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(url: &str) -> Result<Vec<u8>, AssetError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or_else(|| AssetError::Fetch("no window".into()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(js_error)?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| AssetError::Fetch("fetch did not yield a Response".into()))?;
    if !response.ok() {
        return Err(AssetError::Fetch(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(js_error)?)
        .await
        .map_err(js_error)?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

#[cfg(target_arch = "wasm32")]
fn js_error(value: wasm_bindgen::JsValue) -> AssetError {
    AssetError::Fetch(format!("{value:?}"))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &AssetLoader) -> LoadedAsset {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(loaded) = loader.poll() {
                return loaded;
            }
            assert!(Instant::now() < deadline, "load never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_file_reports_io_error() {
        let loader = AssetLoader::new("/nonexistent/assets");
        loader.request("Samba Dancing");
        assert_eq!(loader.in_flight(), 1);

        let loaded = wait_for(&loader);
        assert_eq!(loaded.name, "Samba Dancing");
        assert!(matches!(loaded.result, Err(AssetError::Io(_))));
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn poll_on_idle_loader_is_none() {
        let loader = AssetLoader::new("assets");
        assert!(loader.poll().is_none());
    }
}
