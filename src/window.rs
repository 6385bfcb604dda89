// Main window: creation, geometry persistence, request filtering and navigation hooks.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tauri::webview::{NewWindowResponse, PageLoadEvent};
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use url::Url;

use crate::config::{MAIN_WINDOW_LABEL, WINDOW_BOUNDS_KEY};
use crate::error::ShellResult;
use crate::modules::bounds::WindowBounds;
use crate::modules::bridge::ContentView;
use crate::modules::debounce::Debouncer;
use crate::modules::request_filter::interceptor_script;
use crate::settings::SettingsStore;
use crate::state::AppState;

// Show the window even if the first load never reports completion.
const READY_TIMEOUT: Duration = Duration::from_secs(5);

impl ContentView for WebviewWindow {
    fn navigate_to(&self, url: Url) -> ShellResult<()> {
        self.navigate(url)?;
        Ok(())
    }

    fn reload(&self) -> ShellResult<()> {
        WebviewWindow::reload(self)?;
        Ok(())
    }

    fn current_url(&self) -> ShellResult<Url> {
        Ok(self.url()?)
    }
}

/// Creates the main window, or focuses it if one already exists.
pub fn create_window(app: &AppHandle) -> ShellResult<WebviewWindow> {
    let state = app.state::<AppState>();

    if let Some(existing) = state.main_window.current() {
        focus(&existing);
        return Ok(existing);
    }

    let config = &state.config;
    let bounds = WindowBounds::from_stored(Some(state.store.get(WINDOW_BOUNDS_KEY, Value::Null))).clamped(config);
    let home = Url::parse(&config.home_url)?;
    log::info!("[Window] Creating {}x{} window for {}", bounds.width, bounds.height, home);

    let shown = Arc::new(AtomicBool::new(false));

    let nav_policy = state.policy.clone();
    let popup_policy = state.policy.clone();
    let cosmetic = state.adblock.clone();
    let shown_on_load = shown.clone();

    let mut builder = WebviewWindowBuilder::new(app, MAIN_WINDOW_LABEL, WebviewUrl::External(home))
        .title(config.window_title.as_str())
        .inner_size(bounds.width as f64, bounds.height as f64)
        .min_inner_size(config.min_width as f64, config.min_height as f64)
        .decorations(true)
        .visible(false)
        .devtools(cfg!(debug_assertions))
        // Applied before the first navigation.
        .user_agent(&config.user_agent)
        // Runs before any script of the top-level document.
        .initialization_script(interceptor_script())
        .on_navigation(move |url| nav_policy.check(url).proceeds())
        .on_new_window(move |url, _features| {
            if popup_policy.allow_popup(&url) {
                NewWindowResponse::Allow
            } else {
                NewWindowResponse::Deny
            }
        })
        .on_page_load(move |window, payload| {
            if !matches!(payload.event(), PageLoadEvent::Finished) {
                return;
            }
            if !shown_on_load.swap(true, Ordering::AcqRel) {
                log::info!("[Window] Ready, showing");
                if let Err(e) = window.show() {
                    log::error!("[Window] Failed to show: {}", e);
                }
            }
            if let Some(script) = cosmetic.cosmetic_script(payload.url().as_str()) {
                if let Err(e) = window.eval(&script) {
                    log::warn!("[AdBlock] Cosmetic injection failed: {}", e);
                }
            }
        });

    builder = match bounds.position() {
        Some((x, y)) => builder.position(x as f64, y as f64),
        None => builder.center(),
    };
    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone())?;
    }

    let window = builder.build()?;
    state.main_window.set(window.clone());

    wire_window_events(app, &window, state.store.clone(), config.bounds_debounce);
    show_after_timeout(window.clone(), shown);

    Ok(window)
}

fn wire_window_events(app: &AppHandle, window: &WebviewWindow, store: Arc<SettingsStore>, delay: Duration) {
    let saver = Debouncer::new(
        delay,
        tauri::async_runtime::handle().inner().clone(),
        move |bounds: WindowBounds| match store.set_as(WINDOW_BOUNDS_KEY, &bounds) {
            Ok(()) => log::debug!("[Store] Saved window bounds {:?}", bounds),
            Err(e) => log::error!("[Store] Failed to save window bounds: {}", e),
        },
    );

    let handle = app.clone();
    let win = window.clone();
    window.on_window_event(move |event| match event {
        WindowEvent::Resized(_) | WindowEvent::Moved(_) => match capture_bounds(&win) {
            Ok(Some(bounds)) => saver.push(bounds),
            Ok(None) => {}
            Err(e) => log::warn!("[Window] Could not read geometry: {}", e),
        },
        WindowEvent::Destroyed => {
            saver.flush();
            handle.state::<AppState>().main_window.clear();
            log::info!("[Window] Closed");
        }
        _ => {}
    });
}

/// Current logical geometry, or `None` while minimized (the size is meaningless then).
fn capture_bounds(window: &WebviewWindow) -> ShellResult<Option<WindowBounds>> {
    if window.is_minimized()? {
        return Ok(None);
    }
    let scale = window.scale_factor()?;
    let size = window.inner_size()?.to_logical::<f64>(scale);
    let position = window.outer_position()?.to_logical::<f64>(scale);

    Ok(Some(WindowBounds {
        x: Some(position.x.round() as i32),
        y: Some(position.y.round() as i32),
        width: size.width.round() as u32,
        height: size.height.round() as u32,
    }))
}

fn show_after_timeout(window: WebviewWindow, shown: Arc<AtomicBool>) {
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(READY_TIMEOUT).await;
        if !shown.swap(true, Ordering::AcqRel) {
            log::warn!("[Window] Page not ready after {:?}, showing anyway", READY_TIMEOUT);
            if let Err(e) = window.show() {
                log::error!("[Window] Failed to show: {}", e);
            }
        }
    });
}

pub fn focus(window: &WebviewWindow) {
    if window.is_minimized().unwrap_or(false) {
        let _ = window.unminimize();
    }
    let _ = window.show();
    let _ = window.set_focus();
}
