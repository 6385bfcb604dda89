// Process-wide shell configuration.
// There are no CLI flags or environment overrides: everything here is fixed at build time.

use std::time::Duration;

pub const HOME_URL: &str = "https://www.example.org/";
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const WINDOW_BOUNDS_KEY: &str = "windowBounds";

const EASYLIST_URL: &str = "https://easylist.to/easylist/easylist.txt";
const EASYPRIVACY_URL: &str = "https://easylist.to/easylist/easyprivacy.txt";

#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// The only site allowed at the top level. Also the prefix every navigation is checked against.
    pub home_url: String,
    pub user_agent: String,
    pub window_title: String,
    pub min_width: u32,
    pub min_height: u32,
    /// Quiet period before a burst of resize/move events is written to the store.
    pub bounds_debounce: Duration,
    pub filter_list_urls: Vec<String>,
    /// Limits on each filter list download, so a stalled host cannot hold back the window.
    pub fetch_connect_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            home_url: HOME_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            window_title: "Site Shell".to_string(),
            min_width: 800,
            min_height: 600,
            bounds_debounce: Duration::from_millis(300),
            filter_list_urls: vec![EASYLIST_URL.to_string(), EASYPRIVACY_URL.to_string()],
            fetch_connect_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(30),
        }
    }
}
