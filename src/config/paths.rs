use crate::utils::error::{IngestError, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct ConfigFile {
    paths: Option<PathsSection>,
}

#[derive(Debug, Default, Deserialize)]
struct PathsSection {
    input_folder: Option<String>,
    archive_folder: Option<String>,
    error_folder: Option<String>,
}

/// The three folders named in the `[paths]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPaths {
    pub input_folder: PathBuf,
    pub archive_folder: PathBuf,
    pub error_folder: PathBuf,
}

impl FolderPaths {
    /// 從 TOML 檔案載入 `[paths]`; `${VAR}` values come from `lookup`
    pub fn from_file<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| IngestError::ConfigError {
            message: format!("Could not find or read config file at '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&content, lookup)
    }

    pub fn from_toml_str<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed_content = substitute_env_vars(content, &lookup)?;

        let parsed: ConfigFile =
            toml::from_str(&processed_content).map_err(|e| IngestError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;

        let section = parsed.paths.ok_or_else(|| IngestError::MissingConfigError {
            field: "paths".to_string(),
        })?;

        Ok(Self {
            input_folder: folder("paths.input_folder", section.input_folder)?,
            archive_folder: folder("paths.archive_folder", section.archive_folder)?,
            error_folder: folder("paths.error_folder", section.error_folder)?,
        })
    }
}

fn folder(field: &str, raw: Option<String>) -> Result<PathBuf> {
    let value = raw.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IngestError::InvalidConfigValueError {
            field: field.to_string(),
            value,
            reason: "Path cannot be empty".to_string(),
        });
    }
    Ok(expand_home(trimmed))
}

/// `~` and `~/rest` resolve against the home directory; other paths are returned as-is.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };

    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// 替換環境變數 (例如 ${ARCHIVE_DIR}); unknown names are left untouched.
fn substitute_env_vars<F>(content: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| IngestError::ConfigError {
        message: format!("Invalid substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}
