//! File-backed defaults for the CLI.
//!
//! The file is a flat list of `key = value` lines at
//! `$XDG_CONFIG_HOME/docket-fetch/config.toml` (or
//! `$HOME/.config/docket-fetch/config.toml`). Strings are double-quoted,
//! `#` starts a comment. Command-line flags always win over file values.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use docket_fetch::{DEFAULT_PORTAL_BASE_URL, HttpTimeouts};

const CONFIG_DIR: &str = "docket-fetch";
const CONFIG_FILE: &str = "config.toml";

/// Parsed `config.toml` values. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Portal root that year listing pages hang off.
    pub portal_base_url: Option<String>,
    /// Directory under which `utc_<docket>` folders are created.
    pub output_root: Option<PathBuf>,
    /// Pause after each downloaded document, in milliseconds.
    pub pace_ms: Option<u64>,
    /// Listing page request timeout in seconds.
    pub listing_timeout_secs: Option<u64>,
    /// Document request timeout in seconds.
    pub document_timeout_secs: Option<u64>,
    /// User-Agent override.
    pub user_agent: Option<String>,
    /// Reject bodies that do not start with `%PDF-`.
    pub require_pdf_header: Option<bool>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(pace_ms) = self.pace_ms
            && pace_ms > 60_000
        {
            bail!("Invalid config value for `pace_ms`: {pace_ms}. Expected range: 0..=60000");
        }
        validate_timeout_secs("listing_timeout_secs", self.listing_timeout_secs)?;
        validate_timeout_secs("document_timeout_secs", self.document_timeout_secs)?;

        if let Some(url) = &self.portal_base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            bail!("Invalid config value for `portal_base_url`: '{url}'. Expected an http(s) URL");
        }
        Ok(())
    }

    /// Portal root to scan, falling back to the public portal.
    #[must_use]
    pub fn portal_base_url(&self) -> &str {
        self.portal_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PORTAL_BASE_URL)
    }

    /// Pause between downloads, if configured.
    #[must_use]
    pub fn pace(&self) -> Option<Duration> {
        self.pace_ms.map(Duration::from_millis)
    }

    /// HTTP timeouts with file overrides applied over the defaults.
    #[must_use]
    pub fn timeouts(&self) -> HttpTimeouts {
        let mut timeouts = HttpTimeouts::default();
        if let Some(secs) = self.listing_timeout_secs {
            timeouts.listing = Duration::from_secs(secs);
        }
        if let Some(secs) = self.document_timeout_secs {
            timeouts.document = Duration::from_secs(secs);
        }
        timeouts
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// File values; all `None` when no file exists.
    pub config: FileConfig,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/docket-fetch/config.toml`
/// 2. `$HOME/.config/docket-fetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(CONFIG_DIR)
                .join(CONFIG_FILE),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(CONFIG_DIR)
            .join(CONFIG_FILE),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            ..LoadedConfig::default()
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "portal_base_url" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.portal_base_url = Some(parsed.trim_end_matches('/').to_string());
            }
            "output_root" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.output_root = Some(PathBuf::from(parsed));
            }
            "pace_ms" => {
                cfg.pace_ms = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "listing_timeout_secs" => {
                cfg.listing_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "document_timeout_secs" => {
                cfg.document_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "user_agent" => {
                cfg.user_agent = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "require_pdf_header" => {
                cfg.require_pdf_header = Some(parse_boolean(value).with_context(invalid)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
