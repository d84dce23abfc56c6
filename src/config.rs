use crate::constants::{
    DEFAULT_IMAGES_DIR, DEFAULT_NUM_THREADS, DEFAULT_R2_REGION, DEFAULT_TINIFY_ENDPOINT,
    ENV_BUCKET_NAME, ENV_IMAGES_DIR, ENV_NUM_THREADS, ENV_PREFIX, ENV_R2_ACCESS_KEY_ID,
    ENV_R2_ENDPOINT_URL, ENV_R2_REGION, ENV_R2_SECRET_ACCESS_KEY, ENV_REMOVE_ORIGINALS,
    ENV_TINIFY_ENDPOINT, ENV_TINIFY_TOKEN,
};
use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Settings for one run. Built once in `main` and lent to everything else.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub tinify_token: String,
    pub tinify_endpoint: String,
    pub prefix: String,
    pub bucket_name: String,
    pub r2_endpoint_url: String,
    pub r2_region: String,
    pub r2_access_key: String,
    pub r2_secret_access_key: String,
    pub num_threads: usize,
    pub images_dir: PathBuf,
    pub remove_originals: bool,
}

/// Values given on the command line. They take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub images_dir: Option<PathBuf>,
    pub num_threads: Option<usize>,
    pub remove_originals: bool,
}

/// Loads `path` into the process environment if it exists.
///
/// Variables that are already set are left alone. A missing file is not an error,
/// but a file that exists and cannot be parsed is.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::InvalidValue {
        key: "env file",
        value: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(true)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key/value source.
    ///
    /// Blank values count as unset. Every missing required key is reported in a
    /// single error rather than one at a time.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut require = |key: &'static str| {
            let value = get(key);
            if value.is_none() {
                missing.push(key);
            }
            value.unwrap_or_default()
        };

        let tinify_token = require(ENV_TINIFY_TOKEN);
        let bucket_name = require(ENV_BUCKET_NAME);
        let r2_endpoint_url = require(ENV_R2_ENDPOINT_URL);
        let r2_access_key = require(ENV_R2_ACCESS_KEY_ID);
        let r2_secret_access_key = require(ENV_R2_SECRET_ACCESS_KEY);

        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys(missing));
        }

        let num_threads = match get(ENV_NUM_THREADS) {
            Some(raw) => parse_num_threads(&raw)?,
            None => DEFAULT_NUM_THREADS,
        };
        let remove_originals = match get(ENV_REMOVE_ORIGINALS) {
            Some(raw) => parse_bool(ENV_REMOVE_ORIGINALS, &raw)?,
            None => false,
        };

        let config = Self {
            tinify_token,
            tinify_endpoint: get(ENV_TINIFY_ENDPOINT)
                .unwrap_or_else(|| DEFAULT_TINIFY_ENDPOINT.to_string()),
            prefix: get(ENV_PREFIX).unwrap_or_default(),
            bucket_name,
            r2_endpoint_url,
            r2_region: get(ENV_R2_REGION).unwrap_or_else(|| DEFAULT_R2_REGION.to_string()),
            r2_access_key,
            r2_secret_access_key,
            num_threads,
            images_dir: get(ENV_IMAGES_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_DIR)),
            remove_originals,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(dir) = &overrides.images_dir {
            self.images_dir = dir.clone();
        }
        if let Some(threads) = overrides.num_threads {
            self.num_threads = threads;
        }
        self.remove_originals |= overrides.remove_originals;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_NUM_THREADS,
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        for (key, url) in [
            (ENV_R2_ENDPOINT_URL, &self.r2_endpoint_url),
            (ENV_TINIFY_ENDPOINT, &self.tinify_endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: url.clone(),
                    reason: "must start with http:// or https://".to_string(),
                });
            }
        }
        Ok(())
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tinify_token", &"<redacted>")
            .field("tinify_endpoint", &self.tinify_endpoint)
            .field("prefix", &self.prefix)
            .field("bucket_name", &self.bucket_name)
            .field("r2_endpoint_url", &self.r2_endpoint_url)
            .field("r2_region", &self.r2_region)
            .field("r2_access_key", &self.r2_access_key)
            .field("r2_secret_access_key", &"<redacted>")
            .field("num_threads", &self.num_threads)
            .field("images_dir", &self.images_dir)
            .field("remove_originals", &self.remove_originals)
            .finish()
    }
}

fn parse_num_threads(raw: &str) -> Result<usize, ConfigError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err(ConfigError::InvalidValue {
            key: ENV_NUM_THREADS,
            value: raw.to_string(),
            reason: "must be at least 1".to_string(),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            key: ENV_NUM_THREADS,
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
