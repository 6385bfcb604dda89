use adblock::engine::Engine;
use adblock::lists::{FilterSet, ParseOptions};
use arc_swap::ArcSwap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ShellError, ShellResult};
use crate::modules::request_filter::{is_checkable, resolve_request_type};

const ENGINE_CACHE_FILE: &str = "adblock_engine.bin";
const COSMETIC_STYLE_ID: &str = "site-shell-cosmetic";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AdBlockManager {
    // Lock-free reader for the hot path
    engine: ArcSwap<Engine>,
    has_rules: AtomicBool,
    app_dir: PathBuf,
    list_urls: Vec<String>,
    connect_timeout: Duration,
    fetch_timeout: Duration,
}

impl AdBlockManager {
    /// Creates the manager, starting from the engine cached by the last
    /// successful build if there is one.
    pub fn new(app_dir: PathBuf, list_urls: Vec<String>) -> Self {
        if let Err(e) = fs::create_dir_all(&app_dir) {
            log::warn!("[AdBlock] Could not create {:?}: {}", app_dir, e);
        }
        let cache_path = app_dir.join(ENGINE_CACHE_FILE);

        let (engine, has_rules) = if cache_path.exists() {
            log::info!("[AdBlock] Loading cached engine from {:?}...", cache_path);
            match Self::load_engine_from_disk(&cache_path) {
                Ok(engine) => (engine, true),
                Err(e) => {
                    log::warn!("[AdBlock] {}, using empty engine", e);
                    (Engine::default(), false)
                }
            }
        } else {
            log::info!("[AdBlock] No cache found, starting with empty engine");
            (Engine::default(), false)
        };

        Self {
            engine: ArcSwap::from_pointee(engine),
            has_rules: AtomicBool::new(has_rules),
            app_dir,
            list_urls,
            connect_timeout: CONNECT_TIMEOUT,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// `connect` bounds reaching a list host, `total` the whole download of one list.
    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = connect;
        self.fetch_timeout = total;
        self
    }

    /// Whether any rules are loaded, from cache or from a fresh fetch.
    pub fn is_active(&self) -> bool {
        self.has_rules.load(Ordering::Acquire)
    }

    /// Fetches the filter lists, builds a fresh engine and swaps it in.
    ///
    /// Lists that fail to download are skipped. Fails only when nothing at
    /// all could be loaded; the previous engine then stays in place.
    pub async fn initialize(self: &Arc<Self>) -> ShellResult<usize> {
        log::info!("[AdBlock] Fetching filter lists...");

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.fetch_timeout)
            .build()?;
        let mut lines = Vec::new();
        let mut last_error = None;

        for url in &self.list_urls {
            match Self::fetch_list(&client, url).await {
                Ok(text) => {
                    let before = lines.len();
                    lines.extend(text.lines().map(str::to_owned));
                    log::info!("[AdBlock] Loaded {} lines from {}", lines.len() - before, url);
                }
                Err(e) => {
                    log::warn!("[AdBlock] Failed to fetch {}: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        if lines.is_empty() {
            return Err(last_error.unwrap_or(ShellError::NoFilters));
        }

        // Building the engine is CPU bound; keep it off the async workers.
        let manager = self.clone();
        tokio::task::spawn_blocking(move || manager.install_rules(&lines))
            .await
            .map_err(|e| ShellError::Other(format!("engine build task failed: {}", e)))?
    }

    async fn fetch_list(client: &reqwest::Client, url: &str) -> ShellResult<String> {
        let text = client.get(url).send().await?.error_for_status()?.text().await?;
        Ok(text)
    }

    /// Builds an engine from raw filter lines, swaps it in and caches it.
    pub fn install_rules<S: AsRef<str>>(&self, lines: &[S]) -> ShellResult<usize> {
        let rules: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();
        if rules.iter().all(|l| l.trim().is_empty()) {
            return Err(ShellError::NoFilters);
        }

        let mut filter_set = FilterSet::new(false);
        filter_set.add_filters(&rules, ParseOptions::default());

        log::info!("[AdBlock] Building engine from {} lines...", rules.len());
        let engine = Engine::from_filter_set(filter_set, true);

        let serialized = engine.serialize();
        if let Err(e) = fs::write(self.app_dir.join(ENGINE_CACHE_FILE), serialized) {
            log::warn!("[AdBlock] Failed to cache engine: {}", e);
        }

        self.engine.store(Arc::new(engine));
        self.has_rules.store(true, Ordering::Release);
        log::info!("[AdBlock] Engine updated and cached.");

        Ok(rules.len())
    }

    fn load_engine_from_disk(path: &Path) -> ShellResult<Engine> {
        let data = fs::read(path)?;
        let mut engine = Engine::default();
        engine.deserialize(&data).map_err(|_| ShellError::EngineCache)?;
        Ok(engine)
    }

    // --- Hot Path: Network Check ---

    /// Check if a request should be blocked.
    /// Uses lock-free ArcSwap::load() so request interception never waits on a rebuild.
    pub fn should_block_request(&self, url: &str, source_url: &str, request_type: &str) -> bool {
        let engine = self.engine.load();
        match adblock::request::Request::new(url, source_url, request_type) {
            Ok(req) => engine.check_network_request(&req).matched,
            Err(_) => false,
        }
    }

    /// Verdict for a request reported by the page. `type_hint` is what the
    /// page knows about the load, if anything.
    pub fn check_page_request(&self, url: &str, source_url: &str, type_hint: Option<&str>) -> bool {
        if !is_checkable(url) {
            return false;
        }
        let request_type = resolve_request_type(url, type_hint);
        let blocked = self.should_block_request(url, source_url, request_type);
        if blocked {
            log::debug!("[AdBlock] Blocked {} ({})", url, request_type);
        }
        blocked
    }

    // --- Cosmetic CSS ---

    /// Get cosmetic hiding CSS for a URL.
    pub fn get_cosmetic_css(&self, url: &str) -> String {
        let engine = self.engine.load();
        let resources = engine.url_cosmetic_resources(url);

        let mut css = String::with_capacity(resources.hide_selectors.len() * 50);
        for selector in resources.hide_selectors {
            css.push_str(selector.as_str());
            css.push_str(" { display: none !important; }\n");
        }
        css
    }

    /// Script that injects the cosmetic CSS into the page, or `None` when
    /// nothing applies to `url`.
    pub fn cosmetic_script(&self, url: &str) -> Option<String> {
        let css = self.get_cosmetic_css(url);
        if css.is_empty() {
            return None;
        }
        let literal = serde_json::to_string(&css).ok()?;
        Some(format!(
            "(function() {{\n  if (document.getElementById('{id}')) return;\n  var s = document.createElement('style');\n  s.id = '{id}';\n  s.textContent = {css};\n  (document.head || document.documentElement).appendChild(s);\n}})();",
            id = COSMETIC_STYLE_ID,
            css = literal
        ))
    }
}
