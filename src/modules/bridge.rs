// Bridge operations exposed to the content layer - no Tauri imports.
//
// Each operation is a no-op returning `None` when no window exists.
// The Tauri commands in `commands.rs` are thin wrappers over these.

use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use url::Url;

use crate::error::ShellResult;
use crate::modules::navigation::NavigationPolicy;
use crate::settings::SettingsStore;

/// What the bridge needs from the window hosting the content.
pub trait ContentView: Clone {
    fn navigate_to(&self, url: Url) -> ShellResult<()>;
    fn reload(&self) -> ShellResult<()>;
    fn current_url(&self) -> ShellResult<Url>;
}

/// Holds the one main window, or nothing.
pub struct MainWindowSlot<W> {
    inner: Mutex<Option<W>>,
}

impl<W: Clone> MainWindowSlot<W> {
    pub fn new() -> Self {
        Self { inner: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<W>> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set(&self, window: W) {
        *self.lock() = Some(window);
    }

    pub fn clear(&self) -> Option<W> {
        self.lock().take()
    }

    /// Cloned handle so callers never hold the lock across window calls.
    pub fn current(&self) -> Option<W> {
        self.lock().clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }
}

impl<W: Clone> Default for MainWindowSlot<W> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get_store_value<W: Clone>(
    slot: &MainWindowSlot<W>,
    store: &SettingsStore,
    key: &str,
    default: Value,
) -> Option<Value> {
    if !slot.is_open() {
        return None;
    }
    Some(store.get(key, default))
}

pub fn set_store_value<W: Clone>(
    slot: &MainWindowSlot<W>,
    store: &SettingsStore,
    key: &str,
    value: Value,
) -> ShellResult<Option<()>> {
    if !slot.is_open() {
        return Ok(None);
    }
    store.set(key, value)?;
    Ok(Some(()))
}

/// Navigate to an arbitrary URL. The load is granted past the navigation policy.
pub fn load_url<W: ContentView>(
    slot: &MainWindowSlot<W>,
    policy: &NavigationPolicy,
    raw: &str,
) -> ShellResult<Option<()>> {
    let Some(window) = slot.current() else {
        return Ok(None);
    };
    let url = Url::parse(raw)?;
    policy.grant_once(&url);
    start_load(&window, policy, url);
    Ok(Some(()))
}

pub fn go_home<W: ContentView>(slot: &MainWindowSlot<W>, policy: &NavigationPolicy) -> ShellResult<Option<()>> {
    let Some(window) = slot.current() else {
        return Ok(None);
    };
    let url = Url::parse(policy.allowed_origin())?;
    start_load(&window, policy, url);
    Ok(Some(()))
}

/// Reload whatever is showing. A reload passes through the navigation hook
/// like any other load, so a page reached through `load_url` needs a fresh grant.
pub fn reload_page<W: ContentView>(slot: &MainWindowSlot<W>, policy: &NavigationPolicy) -> Option<()> {
    let window = slot.current()?;
    let current = match window.current_url() {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!("[Bridge] Could not read current URL: {}", e);
            None
        }
    };
    if let Some(url) = &current {
        policy.grant_once(url);
    }
    if let Err(e) = window.reload() {
        log::error!("[Bridge] Reload failed: {}", e);
        if let Some(url) = &current {
            policy.revoke(url);
        }
    }
    Some(())
}

// Load failures are logged and swallowed; the window stays as it is.
fn start_load<W: ContentView>(window: &W, policy: &NavigationPolicy, url: Url) {
    log::info!("[Bridge] Loading {}", url);
    if let Err(e) = window.navigate_to(url.clone()) {
        log::error!("[Load Error] {}", e);
        policy.revoke(&url);
    }
}
