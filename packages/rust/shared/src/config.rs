//! Application configuration for newsbrief.
//!
//! User config lives at `~/.newsbrief/newsbrief.toml`.
//! CLI flags override config file values, which override defaults.
//! Mail secrets never live in the file: `[mail]` names the environment
//! variables they are read from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NewsbriefError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsbrief.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsbrief";

// ---------------------------------------------------------------------------
// Config structs (matching newsbrief.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Link spreadsheet location.
    #[serde(default)]
    pub input: InputConfig,

    /// Page fetching and extraction.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Language model endpoint.
    #[serde(default)]
    pub model: ModelConfig,

    /// Outgoing mail.
    #[serde(default)]
    pub mail: MailConfig,
}

/// `[input]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Spreadsheet path, relative to the working directory.
    #[serde(default = "default_links_path")]
    pub path: PathBuf,

    /// Header of the column holding article URLs.
    #[serde(default = "default_url_column")]
    pub url_column: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_links_path(),
            url_column: default_url_column(),
        }
    }
}

fn default_links_path() -> PathBuf {
    PathBuf::from("NewsLinks.xlsx")
}
fn default_url_column() -> String {
    "URL".into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Strip cookie/consent banners and modal overlays before extraction.
    #[serde(default = "default_true")]
    pub remove_overlay_elements: bool,

    /// Minimum extracted word count for a page to count as fetched.
    #[serde(default = "default_word_count_threshold")]
    pub word_count_threshold: usize,

    /// Maximum characters of article text handed to the model.
    #[serde(default = "default_max_article_chars")]
    pub max_article_chars: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            remove_overlay_elements: true,
            word_count_threshold: default_word_count_threshold(),
            max_article_chars: default_max_article_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_word_count_threshold() -> usize {
    30
}
fn default_max_article_chars() -> usize {
    3000
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama-compatible server.
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// Model name as known to the server.
    #[serde(default = "default_model_name")]
    pub name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            name: default_model_name(),
        }
    }
}

fn default_model_base_url() -> String {
    "http://127.0.0.1:11434".into()
}
fn default_model_name() -> String {
    "llama3.2:3b".into()
}

/// `[mail]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host (implicit TLS).
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP submission port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Subject line of every briefing.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Env var holding the sender address (also the SMTP username).
    #[serde(default = "default_sender_env")]
    pub sender_env: String,

    /// Env var holding the SMTP password.
    #[serde(default = "default_password_env")]
    pub password_env: String,

    /// Env var holding the recipient address.
    #[serde(default = "default_recipient_env")]
    pub recipient_env: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            subject: default_subject(),
            sender_env: default_sender_env(),
            password_env: default_password_env(),
            recipient_env: default_recipient_env(),
        }
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    465
}
fn default_subject() -> String {
    "🤖 Your AI Intelligence Briefing".into()
}
fn default_sender_env() -> String {
    "EMAIL_ADDRESS".into()
}
fn default_password_env() -> String {
    "EMAIL_PASSWORD".into()
}
fn default_recipient_env() -> String {
    "RECIPIENT_EMAIL".into()
}

// ---------------------------------------------------------------------------
// Mail settings (runtime, resolved from config + environment)
// ---------------------------------------------------------------------------

/// Mail settings resolved once, at dispatcher construction.
///
/// Missing credentials are kept as `None` rather than rejected here: the
/// dispatcher reports them as an authentication failure at send time.
#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub subject: String,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub recipient: Option<String>,
    /// Env var names, kept for error messages.
    pub sender_env: String,
    pub password_env: String,
    pub recipient_env: String,
}

impl MailSettings {
    /// Resolve settings from the process environment.
    pub fn from_env(config: &MailConfig) -> Self {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve settings with a custom variable lookup.
    pub fn resolve_with(config: &MailConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            subject: config.subject.clone(),
            sender: read(&config.sender_env),
            password: read(&config.password_env),
            recipient: read(&config.recipient_env),
            sender_env: config.sender_env.clone(),
            password_env: config.password_env.clone(),
            recipient_env: config.recipient_env.clone(),
        }
    }
}

impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("subject", &self.subject)
            .field("sender", &self.sender)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("recipient", &self.recipient)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsbrief/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsbriefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsbrief/newsbrief.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| NewsbriefError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NewsbriefError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write a default config file at `path`, replacing whatever is there.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| NewsbriefError::io(dir, e))?;
    }

    let path = path.to_path_buf();
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsbriefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsbriefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
