use crate::waiter::{WaitConfig, DEFAULT_POLLING_INTERVAL};

use std::{collections::BTreeMap, env, path::PathBuf, str::FromStr, time::Duration};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Environment variable pointing to a configuration file to use instead of the default one.
pub const CONFIG_PATH_ENV: &str = "STEPWAIT_CONFIG";

fn deserialize_fromstr<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let string = String::deserialize(deserializer)?;
    T::from_str(&string)
        .map_err(|e| de::Error::custom(format!("Error parsing '{}': {}", string, e)))
}

pub fn serialize_to_string<T: std::fmt::Display, S: Serializer>(
    field: T,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(&field.to_string())
}

fn default_loglevel() -> log::LevelFilter {
    log::LevelFilter::Info
}

fn default_polling_interval() -> f64 {
    DEFAULT_POLLING_INTERVAL.as_secs_f64()
}

/// Process-wide settings shared by all the waits of a test run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// What messages to log
    #[serde(
        deserialize_with = "deserialize_fromstr",
        serialize_with = "serialize_to_string",
        default = "default_loglevel"
    )]
    pub log_level: log::LevelFilter,
    /// Default time to sleep between two attempts, in seconds
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: f64,
    /// Per-operation timeouts in seconds, such as `volume_available = 300`
    #[serde(default)]
    pub timeouts: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_loglevel(),
            polling_interval_secs: default_polling_interval(),
            timeouts: BTreeMap::new(),
        }
    }
}

#[derive(PartialEq, Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not locate the configuration directory.")]
    DatadirNotFound,
    #[error("Could not locate the configuration file.")]
    FileNotFound,
    #[error("Failed to read configuration file: {0}")]
    ReadingFile(String),
    #[error("Invalid timeout '{0}': must be a non-negative number of seconds.")]
    InvalidTimeout(f64),
    #[error("Invalid polling interval '{0}': must be a positive number of seconds.")]
    InvalidPollingInterval(f64),
    #[error("Invalid backoff rate '{0}': must be a finite number not lower than 1.")]
    InvalidBackoffRate(f64),
    #[error("No timeout configured for '{0}'.")]
    UnknownTimeout(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound,
            _ => Self::ReadingFile(e.to_string()),
        }
    }
}

/// Get the absolute path to the stepwait configuration folder.
///
/// It's a "stepwait/" directory in the XDG standard configuration directory for all OSes but
/// Linux-based ones, for which it's `~/.stepwait/`.
pub fn config_folder_path() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    let configs_dir = dirs::home_dir();

    #[cfg(not(target_os = "linux"))]
    let configs_dir = dirs::config_dir();

    if let Some(mut path) = configs_dir {
        #[cfg(target_os = "linux")]
        path.push(".stepwait");

        #[cfg(not(target_os = "linux"))]
        path.push("Stepwait");

        return Some(path);
    }

    None
}

fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }

    config_folder_path().map(|mut path| {
        path.push("stepwait.toml");
        path
    })
}

impl Config {
    /// Get our configuration out of a configuration file.
    ///
    /// Without a custom path, the file is looked up at the path set in the `STEPWAIT_CONFIG`
    /// environment variable or else in the configuration folder.
    pub fn from_file(custom_path: Option<PathBuf>) -> Result<Config, ConfigError> {
        let config_file = match custom_path {
            Some(path) => path,
            None => config_file_path().ok_or(ConfigError::DatadirNotFound)?,
        };

        let config = toml::from_slice::<Config>(&std::fs::read(&config_file)?)
            .map_err(|e| ConfigError::ReadingFile(format!("Parsing configuration file: {}", e)))?;
        config.check()?;

        log::debug!("Loaded configuration from '{}'.", config_file.display());
        Ok(config)
    }

    /// Make sure the settings are sane.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.polling_interval_secs.is_nan() || self.polling_interval_secs <= 0.0 {
            return Err(ConfigError::InvalidPollingInterval(
                self.polling_interval_secs,
            ));
        }

        if let Some(timeout) = self
            .timeouts
            .values()
            .find(|t| t.is_nan() || **t < 0.0 || t.is_infinite())
        {
            return Err(ConfigError::InvalidTimeout(*timeout));
        }

        Ok(())
    }

    /// The timeout configured for this operation.
    pub fn timeout(&self, name: &str) -> Result<Duration, ConfigError> {
        let secs = self
            .timeouts
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTimeout(name.to_string()))?;
        Duration::try_from_secs_f64(*secs).map_err(|_| ConfigError::InvalidTimeout(*secs))
    }

    /// A single attempt wait using our polling interval, should the timeout be raised.
    pub fn default_wait_config<E>(&self) -> WaitConfig<E> {
        WaitConfig::new().polling_interval_secs(self.polling_interval_secs)
    }

    /// A wait for this operation: its configured timeout, our polling interval. The wait is
    /// named after the operation.
    pub fn wait_config<E>(&self, name: &str) -> Result<WaitConfig<E>, ConfigError> {
        let timeout = self.timeout(name)?;
        Ok(self.default_wait_config().timeout(timeout).name(name))
    }
}
