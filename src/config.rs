use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{assistant, hebcal, sefaria};

/// Errors that can occur when loading configuration. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{var} is required but not set")]
    Missing { var: &'static str },
    /// A variable is set to something unusable.
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
    /// The env file exists but could not be read or parsed.
    #[error("failed to read env file '{}': {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

pub const LOG_FILE_NAME: &str = "sefaria_bot.log";

pub struct Config {
    pub discord_token: String,
    /// Conversation is disabled when unset.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub sefaria_base_url: String,
    pub hebcal_base_url: String,
    /// Minimum spacing between outbound text-service requests.
    pub min_interval: Duration,
    /// Liveness endpoint port. No endpoint when unset.
    pub port: Option<u16>,
    /// Directory holding the append-only log file.
    pub log_dir: PathBuf,
}

impl Config {
    /// Load from the process environment, reading `.env` first if one exists.
    /// Variables already set in the environment win over the file.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            return Err(ConfigError::EnvFile {
                path: PathBuf::from(".env"),
                source: e,
            });
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load only from the given env file, ignoring the process environment.
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let env_file_error = |source| ConfigError::EnvFile {
            path: path.clone(),
            source,
        };

        let vars: HashMap<String, String> = dotenvy::from_path_iter(&path)
            .map_err(env_file_error)?
            .collect::<Result<_, _>>()
            .map_err(env_file_error)?;

        Self::from_lookup(|var| vars.get(var).cloned())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing { var: "DISCORD_TOKEN" })?;
        if discord_token.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                var: "DISCORD_TOKEN",
                value: "<redacted>".to_string(),
                reason: "token must not contain whitespace".to_string(),
            });
        }

        let port = get("PORT")
            .map(|value| match value.parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(ConfigError::Invalid {
                    var: "PORT",
                    value,
                    reason: "expected a port number between 1 and 65535".to_string(),
                }),
            })
            .transpose()?;

        let min_interval = match get("SEFARIA_MIN_INTERVAL_MS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::Invalid {
                    var: "SEFARIA_MIN_INTERVAL_MS",
                    value,
                    reason: e.to_string(),
                })?,
            None => sefaria::DEFAULT_MIN_INTERVAL,
        };

        Ok(Self {
            discord_token,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: base_url(&get, "OPENAI_BASE_URL", assistant::DEFAULT_BASE_URL)?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| assistant::DEFAULT_MODEL.to_string()),
            sefaria_base_url: base_url(&get, "SEFARIA_BASE_URL", sefaria::DEFAULT_BASE_URL)?,
            hebcal_base_url: base_url(&get, "HEBCAL_BASE_URL", hebcal::DEFAULT_BASE_URL)?,
            min_interval,
            port,
            log_dir: get("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    pub fn conversation_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

fn base_url<F>(get: &F, var: &'static str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = get(var) else {
        return Ok(default.to_string());
    };
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected an http:// or https:// URL".to_string(),
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}
