fn main() {
    // Commands the remote page may be granted in capabilities/.
    let commands = tauri_build::AppManifest::new().commands(&[
        "get_store_value",
        "set_store_value",
        "load_url",
        "go_home",
        "reload_page",
        "check_request",
    ]);
    tauri_build::try_build(tauri_build::Attributes::new().app_manifest(commands))
        .expect("failed to run tauri-build");
}
