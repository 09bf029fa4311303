//! Application configuration for biddoc.
//!
//! User config lives at `~/.biddoc/biddoc.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BidDocError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "biddoc.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".biddoc";

/// Default prefix of exported document names.
pub const DEFAULT_OUTPUT_PREFIX: &str = "招标文件_";

// ---------------------------------------------------------------------------
// Config structs (matching biddoc.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document export settings.
    #[serde(default)]
    pub export: ExportSection,

    /// Backend API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Draft persistence settings.
    #[serde(default)]
    pub drafts: DraftsConfig,

    /// Additional bidding subjects (code → legal entity name).
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
}

/// `[export]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// Template package path or URL.
    #[serde(default = "default_template")]
    pub template: String,

    /// Directory exported documents are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Prefix of generated file names.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// UTC offset (hours) used when rendering dates.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            template: default_template(),
            output_dir: default_output_dir(),
            output_prefix: default_output_prefix(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_template() -> String {
    "templates/招标文件模板.docx".into()
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_output_prefix() -> String {
    DEFAULT_OUTPUT_PREFIX.into()
}
fn default_utc_offset_hours() -> i32 {
    8
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the bidding backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[drafts]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftsConfig {
    /// Draft directory; defaults to `~/.biddoc/drafts`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// `[[subjects]]` entry: an extra bidding subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectEntry {
    /// Code stored in the form's `bidSubject`.
    pub code: String,
    /// Legal entity name printed in the document.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Export config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime export configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Template package path or URL.
    pub template: String,
    /// Output directory.
    pub output_dir: PathBuf,
    /// File name prefix.
    pub output_prefix: String,
    /// UTC offset (hours) for date rendering.
    pub utc_offset_hours: i32,
    /// Extra subject labels.
    pub subjects: Vec<SubjectEntry>,
    /// Timeout for remote template downloads.
    pub timeout_secs: u64,
}

impl From<&AppConfig> for ExportConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            template: config.export.template.clone(),
            output_dir: expand_home(&config.export.output_dir),
            output_prefix: config.export.output_prefix.clone(),
            utc_offset_hours: config.export.utc_offset_hours,
            subjects: config.subjects.clone(),
            timeout_secs: config.api.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.biddoc/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| BidDocError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.biddoc/biddoc.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the draft directory from config, defaulting to `~/.biddoc/drafts`.
pub fn drafts_dir(config: &AppConfig) -> Result<PathBuf> {
    match &config.drafts.dir {
        Some(dir) => Ok(expand_home(dir)),
        None => Ok(config_dir()?.join("drafts")),
    }
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
    let content = std::fs::read_to_string(path).map_err(|e| BidDocError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| BidDocError::config(format!("failed to parse {}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BidDocError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BidDocError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BidDocError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would make every export fail.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if !(-12..=14).contains(&config.export.utc_offset_hours) {
        return Err(BidDocError::config(format!(
            "utc_offset_hours must be between -12 and 14, got {}",
            config.export.utc_offset_hours
        )));
    }
    if config.export.template.trim().is_empty() {
        return Err(BidDocError::config("export.template must not be empty"));
    }
    if let Some(dup) = config
        .subjects
        .iter()
        .enumerate()
        .find(|(i, s)| config.subjects[..*i].iter().any(|o| o.code == s.code))
    {
        return Err(BidDocError::config(format!(
            "subject code '{}' is defined more than once",
            dup.1.code
        )));
    }
    Ok(())
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
