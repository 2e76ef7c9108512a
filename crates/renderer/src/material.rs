//! Surface appearance: a base color and an optional texture that may still
//! be loading on a background thread. Readiness is polled, never awaited.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use asset::TextureData;
use parking_lot::Mutex;

enum LoadState {
    Loading,
    Ready(Arc<TextureData>),
    Failed(String),
}

#[derive(Clone)]
enum TextureSlot {
    None,
    Ready(Arc<TextureData>),
    Pending(Arc<Mutex<LoadState>>),
}

#[derive(Clone)]
pub struct Material {
    name: String,
    color: [f32; 4],
    texture: TextureSlot,
}

impl Material {
    pub fn from_color(name: impl Into<String>, color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            color,
            texture: TextureSlot::None,
        }
    }

    /// Material whose texture is available immediately.
    pub fn from_texture(name: impl Into<String>, texture: TextureData) -> Self {
        Self {
            name: name.into(),
            color: [1.0; 4],
            texture: TextureSlot::Ready(Arc::new(texture)),
        }
    }

    /// Starts loading a PNG in the background.
    pub fn load_texture(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::from_loader(name, move || TextureData::load_png(&path))
    }

    /// Runs `load` on its own thread; the material reports loading until it returns.
    /// A failed load leaves the material untextured.
    pub fn from_loader<F>(name: impl Into<String>, load: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<TextureData> + Send + 'static,
    {
        let name = name.into();
        let slot = Arc::new(Mutex::new(LoadState::Loading));
        let thread_slot = Arc::clone(&slot);
        let thread_name = name.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("texture-{name}"))
            .spawn(move || {
                let state = match panic::catch_unwind(AssertUnwindSafe(load)) {
                    Ok(Ok(tex)) => {
                        log::info!("material '{thread_name}': texture {}x{} ready", tex.width, tex.height);
                        LoadState::Ready(Arc::new(tex))
                    }
                    Ok(Err(err)) => {
                        log::warn!("material '{thread_name}': texture load failed: {err:#}");
                        LoadState::Failed(format!("{err:#}"))
                    }
                    Err(payload) => {
                        let msg = panic_message(payload.as_ref());
                        log::error!("material '{thread_name}': texture loader panicked: {msg}");
                        LoadState::Failed(format!("loader panicked: {msg}"))
                    }
                };
                *thread_slot.lock() = state;
            });
        if let Err(err) = spawned {
            log::warn!("material '{name}': cannot spawn loader thread: {err}");
            *slot.lock() = LoadState::Failed(err.to_string());
        }

        Self {
            name,
            color: [1.0; 4],
            texture: TextureSlot::Pending(slot),
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Non-blocking: `true` while a background texture load is in flight.
    pub fn is_loading(&self) -> bool {
        match &self.texture {
            TextureSlot::Pending(slot) => matches!(*slot.lock(), LoadState::Loading),
            _ => false,
        }
    }

    /// The texture once available; `None` when untextured, loading or failed.
    pub fn texture(&self) -> Option<Arc<TextureData>> {
        match &self.texture {
            TextureSlot::None => None,
            TextureSlot::Ready(tex) => Some(Arc::clone(tex)),
            TextureSlot::Pending(slot) => match &*slot.lock() {
                LoadState::Ready(tex) => Some(Arc::clone(tex)),
                LoadState::Loading | LoadState::Failed(_) => None,
            },
        }
    }

    /// Load error message, if the background load failed.
    pub fn load_error(&self) -> Option<String> {
        match &self.texture {
            TextureSlot::Pending(slot) => match &*slot.lock() {
                LoadState::Failed(msg) => Some(msg.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("color", &self.color)
            .field("loading", &self.is_loading())
            .finish()
    }
}
