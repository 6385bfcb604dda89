// Shared application context, managed by Tauri and reached from every handler
// through the AppHandle. Replaces process-wide globals for the window and engine.

use std::sync::{Arc, Mutex};
use tauri::WebviewWindow;

use crate::adblock_manager::AdBlockManager;
use crate::config::ShellConfig;
use crate::modules::bridge::MainWindowSlot;
use crate::modules::lifecycle::{transition, Action, ClosePolicy, LifecycleEvent, Phase};
use crate::modules::navigation::NavigationPolicy;
use crate::settings::SettingsStore;

pub struct AppState {
    pub config: ShellConfig,
    pub store: Arc<SettingsStore>,
    pub adblock: Arc<AdBlockManager>,
    pub policy: Arc<NavigationPolicy>,
    pub main_window: MainWindowSlot<WebviewWindow>,
    phase: Mutex<Phase>,
    close_policy: ClosePolicy,
}

impl AppState {
    pub fn new(config: ShellConfig, store: SettingsStore, adblock: AdBlockManager) -> Self {
        let policy = NavigationPolicy::new(config.home_url.clone());
        Self {
            config,
            store: Arc::new(store),
            adblock: Arc::new(adblock),
            policy: Arc::new(policy),
            main_window: MainWindowSlot::new(),
            phase: Mutex::new(Phase::Starting),
            close_policy: ClosePolicy::for_current_platform(),
        }
    }

    /// Feed a lifecycle event through the state machine and return what to do.
    pub fn advance(&self, event: LifecycleEvent) -> Action {
        let mut phase = match self.phase.lock() {
            Ok(p) => p,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (next, action) = transition(*phase, event, self.close_policy);
        if next != *phase {
            log::info!("[Lifecycle] {:?} -> {:?}", *phase, next);
        }
        *phase = next;
        action
    }
}
