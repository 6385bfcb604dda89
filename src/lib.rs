// Site Shell Library Entry Point
// Exposes all modules so they can be tested independently of main.rs.

use std::future::Future;
use std::panic;
use tauri::{AppHandle, Manager, RunEvent};
use tauri_plugin_log::{Target, TargetKind};

// Tauri-facing modules
pub mod adblock_manager;
pub mod commands;
pub mod config;
pub mod error;
pub mod settings;
pub mod state;
pub mod window;

// Pure logic modules (no Tauri imports)
pub mod modules;

use adblock_manager::AdBlockManager;
use config::ShellConfig;
use error::ShellResult;
use modules::lifecycle::{filter_startup, Action, FilterStartup, LifecycleEvent};
use settings::SettingsStore;
use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    install_panic_hook();

    let log_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let app = tauri::Builder::default()
        // Must be registered first: a second launch just reactivates this one.
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            log::info!("[Lifecycle] Second launch, activating existing instance");
            activate(app);
        }))
        .plugin(
            tauri_plugin_log::Builder::default()
                .level(log_level)
                .targets([
                    Target::new(TargetKind::Stdout),
                    Target::new(TargetKind::LogDir { file_name: None }),
                ])
                .build(),
        )
        .setup(|app| {
            let handle = app.handle().clone();
            let config = ShellConfig::default();
            let store = SettingsStore::load(&handle)?;
            log::info!("[Store] Using {:?}", store.path());

            let app_dir = handle.path().app_data_dir()?;
            let adblock = AdBlockManager::new(app_dir, config.filter_list_urls.clone())
                .with_timeouts(config.fetch_connect_timeout, config.fetch_timeout);

            app.manage(AppState::new(config, store, adblock));
            spawn_logged("startup", on_ready(handle));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_store_value,
            commands::set_store_value,
            commands::load_url,
            commands::go_home,
            commands::reload_page,
            commands::check_request
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| match event {
        // `code: None` means the last window went away rather than an explicit exit.
        RunEvent::ExitRequested { code: None, api, .. } => {
            let Some(state) = handle.try_state::<AppState>() else {
                return;
            };
            match state.advance(LifecycleEvent::AllWindowsClosed) {
                Action::StayResident => {
                    log::info!("[Lifecycle] Last window closed, staying resident");
                    api.prevent_exit();
                }
                Action::Exit => log::info!("[Lifecycle] Last window closed, quitting"),
                _ => {}
            }
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => activate(handle),
        _ => {}
    });
}

/// Filter first, then the window, so the first page load is already filtered.
async fn on_ready(app: AppHandle) -> ShellResult<()> {
    let state = app.state::<AppState>();

    let adblock = state.adblock.clone();
    let had_cache = adblock.is_active();
    let fetched = adblock.initialize().await;
    let reason = fetched.as_ref().err().map(ToString::to_string).unwrap_or_default();
    match filter_startup(&fetched, had_cache) {
        FilterStartup::Fresh { lines } => log::info!("[AdBlock] Active with {} filter lines", lines),
        FilterStartup::Cached => log::warn!("[AdBlock] Ruleset fetch failed ({}), keeping cached engine", reason),
        FilterStartup::Unprotected => {
            log::error!("[AdBlock] Ruleset fetch failed ({}), launching unprotected", reason)
        }
    }

    let created = window::create_window(&app);
    state.advance(LifecycleEvent::Ready);

    if let Err(e) = created {
        // Nothing to show: behave as if the window was closed.
        if state.advance(LifecycleEvent::AllWindowsClosed) == Action::Exit {
            app.exit(1);
        }
        return Err(e);
    }
    Ok(())
}

/// Dock click or second launch: bring the window back, recreating it if needed.
fn activate(app: &AppHandle) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };

    if let Some(window) = state.main_window.current() {
        state.advance(LifecycleEvent::Activated { open_windows: 1 });
        window::focus(&window);
        return;
    }

    if state.advance(LifecycleEvent::Activated { open_windows: 0 }) == Action::CreateWindow {
        log::info!("[Lifecycle] Activated with no window, recreating");
        if let Err(e) = window::create_window(app) {
            log::error!("[Window] Failed to recreate window: {}", e);
        }
    }
}

// Last-resort net for background work: failures are logged, never propagated.
fn spawn_logged<F>(task: &'static str, fut: F)
where
    F: Future<Output = ShellResult<()>> + Send + 'static,
{
    tauri::async_runtime::spawn(async move {
        if let Err(e) = fut.await {
            log::error!("[Lifecycle] {} failed: {}", task, e);
        }
    });
}

/// Logs panics through the log pipeline. Panics inside async tasks only end
/// that task, so the process keeps running.
fn install_panic_hook() {
    let _default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        log::error!("[Uncaught Panic] {}", info);

        #[cfg(debug_assertions)]
        {
            _default_hook(info);
        }
    }));
}
