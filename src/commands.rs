// Commands callable from the page via `invoke`.
// The bridge commands return null and do nothing when there is no main window.

use serde_json::Value;
use tauri::State;

use crate::error::ShellError;
use crate::modules::bridge;
use crate::state::AppState;

/// JS: `invoke('get_store_value', { key, defaultValue })`
#[tauri::command]
pub fn get_store_value(state: State<'_, AppState>, key: String, default_value: Option<Value>) -> Option<Value> {
    bridge::get_store_value(&state.main_window, &state.store, &key, default_value.unwrap_or(Value::Null))
}

#[tauri::command]
pub fn set_store_value(state: State<'_, AppState>, key: String, value: Value) -> Result<(), ShellError> {
    bridge::set_store_value(&state.main_window, &state.store, &key, value)?;
    Ok(())
}

#[tauri::command]
pub fn load_url(state: State<'_, AppState>, url: String) -> Result<(), ShellError> {
    bridge::load_url(&state.main_window, &state.policy, &url)?;
    Ok(())
}

#[tauri::command]
pub fn go_home(state: State<'_, AppState>) -> Result<(), ShellError> {
    bridge::go_home(&state.main_window, &state.policy)?;
    Ok(())
}

/// Asked by the page's request filter before each subresource load.
#[tauri::command]
pub fn check_request(
    state: State<'_, AppState>,
    url: String,
    source_url: Option<String>,
    request_type: Option<String>,
) -> bool {
    let source = source_url.unwrap_or_else(|| state.config.home_url.clone());
    state.adblock.check_page_request(&url, &source, request_type.as_deref())
}

#[tauri::command]
pub fn reload_page(state: State<'_, AppState>) {
    bridge::reload_page(&state.main_window, &state.policy);
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    const CAPABILITY: &str = include_str!("../capabilities/main-window.json");
    const BUILD_SCRIPT: &str = include_str!("../build.rs");

    const COMMANDS: &[&str] = &[
        "get_store_value",
        "set_store_value",
        "load_url",
        "go_home",
        "reload_page",
        "check_request",
    ];

    fn permissions() -> Vec<String> {
        let capability: Value = serde_json::from_str(CAPABILITY).unwrap();
        capability["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_remote_page_gets_only_shell_commands() {
        let mut granted = permissions();
        granted.sort();
        let mut expected: Vec<String> = COMMANDS.iter().map(|c| format!("allow-{}", c.replace('_', "-"))).collect();
        expected.sort();
        assert_eq!(granted, expected);
        assert!(granted.iter().all(|p| !p.contains(':')), "no plugin or core permission sets");
    }

    #[test]
    fn test_every_command_is_declared_for_the_manifest() {
        for command in COMMANDS {
            assert!(BUILD_SCRIPT.contains(&format!("\"{}\"", command)), "{} missing from build.rs", command);
        }
    }
}
