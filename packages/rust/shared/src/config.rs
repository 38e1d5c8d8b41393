//! Application configuration for csindex.
//!
//! User config lives at `~/.csindex/csindex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CsIndexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "csindex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".csindex";

/// Names accepted in `[browser] strategies`, in their default order.
pub const STRATEGY_NAMES: [&str; 5] = [
    "next-button",
    "next-text",
    "page-number",
    "page-input",
    "scroll",
];

// ---------------------------------------------------------------------------
// Config structs (matching csindex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Direct export endpoint settings.
    #[serde(default)]
    pub direct: DirectConfig,

    /// Headless browser crawl settings.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Output files and spreadsheet layout.
    #[serde(default)]
    pub export: ExportConfig,
}

/// `[direct]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectConfig {
    /// Endpoint answering the POST with an `.xlsx` payload.
    #[serde(default = "default_export_url")]
    pub export_url: String,

    /// Values sent as `indexFilter.indexSeries`.
    #[serde(default = "default_index_series")]
    pub index_series: Vec<String>,

    /// `pager.pageNum` hint.
    #[serde(default = "default_page_num")]
    pub page_num: u32,

    /// `pager.pageSize` hint.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            export_url: default_export_url(),
            index_series: default_index_series(),
            page_num: default_page_num(),
            page_size: default_page_size(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_export_url() -> String {
    "https://www.csindex.com.cn/csindex-home/exportExcel/indexAll/CH".into()
}
fn default_index_series() -> Vec<String> {
    vec!["1".into()]
}
fn default_page_num() -> u32 {
    1
}
fn default_page_size() -> u32 {
    10
}
fn default_request_timeout() -> u64 {
    60
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Index list page rendered by the browser.
    #[serde(default = "default_list_url")]
    pub list_url: String,

    /// Run Chromium without a window.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// User-Agent presented by the browser context.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound for the initial page load, in seconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,

    /// Settle time after the initial load, in milliseconds.
    #[serde(default = "default_initial_wait")]
    pub initial_wait_ms: u64,

    /// Settle time after each page advance, in milliseconds.
    #[serde(default = "default_advance_wait")]
    pub advance_wait_ms: u64,

    /// Pauses of the scroll fallback (bottom, top, bottom), in milliseconds.
    #[serde(default = "default_scroll_pauses")]
    pub scroll_pauses_ms: [u64; 3],

    /// Hard cap on the page counter.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Rows with fewer cells are treated as noise.
    #[serde(default = "default_min_cells")]
    pub min_cells: usize,

    /// Re-read the table after each advance and require a change.
    #[serde(default = "default_true")]
    pub verify_advance: bool,

    /// Advance strategies, tried in order.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,

    /// DOM selectors of the paginated table.
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            list_url: default_list_url(),
            headless: true,
            user_agent: default_user_agent(),
            load_timeout_secs: default_load_timeout(),
            initial_wait_ms: default_initial_wait(),
            advance_wait_ms: default_advance_wait(),
            scroll_pauses_ms: default_scroll_pauses(),
            max_pages: default_max_pages(),
            min_cells: default_min_cells(),
            verify_advance: true,
            strategies: default_strategies(),
            selectors: SelectorsConfig::default(),
        }
    }
}

fn default_list_url() -> String {
    "https://www.csindex.com.cn/#/indices/family/list".into()
}
fn default_true() -> bool {
    true
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .into()
}
fn default_load_timeout() -> u64 {
    60
}
fn default_initial_wait() -> u64 {
    3000
}
fn default_advance_wait() -> u64 {
    5000
}
fn default_scroll_pauses() -> [u64; 3] {
    [3000, 1000, 5000]
}
fn default_max_pages() -> u32 {
    288
}
fn default_min_cells() -> usize {
    6
}
fn default_strategies() -> Vec<String> {
    STRATEGY_NAMES.iter().map(|s| s.to_string()).collect()
}

/// `[browser.selectors]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorsConfig {
    /// Container of the rendered table.
    #[serde(default = "default_table")]
    pub table: String,
    /// Body rows, relative to the table.
    #[serde(default = "default_rows")]
    pub rows: String,
    /// "Next page" control.
    #[serde(default = "default_next_button")]
    pub next_button: String,
    /// Buttons searched by visible text.
    #[serde(default = "default_text_button")]
    pub text_button: String,
    /// Visible text of the "next page" button.
    #[serde(default = "default_next_text")]
    pub next_text: String,
    /// Enumerated page-number controls.
    #[serde(default = "default_page_items")]
    pub page_items: String,
    /// Page-index input of the quick jumper.
    #[serde(default = "default_page_input")]
    pub page_input: String,
}

impl Default for SelectorsConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            rows: default_rows(),
            next_button: default_next_button(),
            text_button: default_text_button(),
            next_text: default_next_text(),
            page_items: default_page_items(),
            page_input: default_page_input(),
        }
    }
}

fn default_table() -> String {
    ".ivu-table".into()
}
fn default_rows() -> String {
    ".ivu-table-body tr".into()
}
fn default_next_button() -> String {
    ".ivu-page-next".into()
}
fn default_text_button() -> String {
    "button".into()
}
fn default_next_text() -> String {
    "下一页".into()
}
fn default_page_items() -> String {
    ".ivu-page-item".into()
}
fn default_page_input() -> String {
    ".ivu-page-options input".into()
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving every output file.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Spreadsheet file prefix of the direct pipeline.
    #[serde(default = "default_direct_prefix")]
    pub direct_prefix: String,
    /// Spreadsheet file prefix of the browser pipeline.
    #[serde(default = "default_browser_prefix")]
    pub browser_prefix: String,
    /// Raw row dump file name.
    #[serde(default = "default_raw_json")]
    pub raw_json: String,
    /// Structured record dump file name.
    #[serde(default = "default_structured_json")]
    pub structured_json: String,
    /// Added to the widest cell of each column.
    #[serde(default = "default_width_margin")]
    pub width_margin: f64,
    /// Upper bound of any column width.
    #[serde(default = "default_max_width")]
    pub max_column_width: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            direct_prefix: default_direct_prefix(),
            browser_prefix: default_browser_prefix(),
            raw_json: default_raw_json(),
            structured_json: default_structured_json(),
            width_margin: default_width_margin(),
            max_column_width: default_max_width(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}
fn default_direct_prefix() -> String {
    "1_中证指数列表".into()
}
fn default_browser_prefix() -> String {
    "2_中证指数有限公司_指数列表".into()
}
fn default_raw_json() -> String {
    "csindex_raw_data.json".into()
}
fn default_structured_json() -> String {
    "csindex_structured_data.json".into()
}
fn default_width_margin() -> f64 {
    3.0
}
fn default_max_width() -> f64 {
    80.0
}

impl ExportConfig {
    /// Resolve a file name against the output directory.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(file_name)
    }
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pagination settings, with durations resolved.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Hard cap on the page counter.
    pub max_pages: u32,
    /// Rows with fewer cells are dropped at extraction.
    pub min_cells: usize,
    /// Settle time after each advance.
    pub advance_wait: Duration,
    /// Pauses of the scroll fallback.
    pub scroll_pauses: [Duration; 3],
    /// Require a changed table after an advance.
    pub verify_advance: bool,
    /// Strategy names, in order.
    pub strategies: Vec<String>,
    /// DOM selectors.
    pub selectors: SelectorsConfig,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        let browser = &config.browser;
        Self {
            max_pages: browser.max_pages,
            min_cells: browser.min_cells,
            advance_wait: Duration::from_millis(browser.advance_wait_ms),
            scroll_pauses: browser.scroll_pauses_ms.map(Duration::from_millis),
            verify_advance: browser.verify_advance,
            strategies: browser.strategies.clone(),
            selectors: browser.selectors.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.csindex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CsIndexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.csindex/csindex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CsIndexError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        CsIndexError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CsIndexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CsIndexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CsIndexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

impl AppConfig {
    /// Reject values the pipelines cannot work with.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.direct.export_url).map_err(|e| {
            CsIndexError::config(format!("invalid direct.export_url '{}': {e}", self.direct.export_url))
        })?;
        Url::parse(&self.browser.list_url).map_err(|e| {
            CsIndexError::config(format!("invalid browser.list_url '{}': {e}", self.browser.list_url))
        })?;

        if self.browser.max_pages == 0 {
            return Err(CsIndexError::config("browser.max_pages must be at least 1"));
        }

        if self.browser.strategies.is_empty() {
            return Err(CsIndexError::config("browser.strategies must not be empty"));
        }
        for name in &self.browser.strategies {
            if !STRATEGY_NAMES.contains(&name.as_str()) {
                return Err(CsIndexError::config(format!(
                    "unknown advance strategy '{name}', expected one of: {}",
                    STRATEGY_NAMES.join(", ")
                )));
            }
        }

        if self.export.max_column_width < self.export.width_margin {
            return Err(CsIndexError::config(
                "export.max_column_width must not be smaller than export.width_margin",
            ));
        }

        Ok(())
    }
}
