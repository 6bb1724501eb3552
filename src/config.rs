use eyre::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::daemon::{Intervals, MAX_INTERVAL};
use crate::scheduler::{AccrualConfig, DEFAULT_WARN_AFTER, LEADERBOARD_EVERY, LEADERBOARD_SIZE};
use crate::storage::LEDGER_FILE_NAME;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Downstream target players are queued for
    pub target_server: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub points_increment_seconds: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub connect_first_player_seconds: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub send_priority_messages_seconds: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub probe_timeout_ms: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub leaderboard_every: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub leaderboard_size: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub probe_failure_warn_after: u64,
    pub bonus_points_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            target_server: "pokemon".to_string(),
            points_increment_seconds: 1,
            connect_first_player_seconds: 5,
            send_priority_messages_seconds: 30,
            probe_timeout_ms: 3000,
            leaderboard_every: LEADERBOARD_EVERY as u64,
            leaderboard_size: LEADERBOARD_SIZE as u64,
            probe_failure_warn_after: DEFAULT_WARN_AFTER as u64,
            bonus_points_file: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(env!("CARGO_PKG_NAME"))
                .join(LEDGER_FILE_NAME),
        }
    }
}

/// Accept `5` or `"5"`, as hand-edited YAML often quotes numbers.
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(value) => Ok(value),
        Number::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected a positive integer, got {:?}", text))),
    }
}

const DEFAULT_CONFIG: &str = r#"# admitq configuration

# The downstream target players are queued for
target-server: pokemon

# Timer settings
# How often (in seconds) queued players receive a point
points-increment-seconds: 1
# How often (in seconds) the first player is checked for admission
connect-first-player-seconds: 5
# How often (in seconds) players receive their queue status
send-priority-messages-seconds: 30

# Capacity probe
probe-timeout-ms: 3000
# Consecutive probe failures before a warning is logged
probe-failure-warn-after: 12

# Leaderboard: sent every N points, showing the top M players
leaderboard-every: 10
leaderboard-size: 5

# Log filter used when RUST_LOG is unset
log-level: info

# Where bonus points are stored (defaults to the user data directory)
# bonus-points-file: /var/lib/admitq/bonus_points.json
"#;

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config = Self::from_yaml(&content)?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero or oversized intervals, zero limits, and unknown log levels
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("points-increment-seconds", self.points_increment_seconds),
            ("connect-first-player-seconds", self.connect_first_player_seconds),
            ("send-priority-messages-seconds", self.send_priority_messages_seconds),
            ("probe-timeout-ms", self.probe_timeout_ms),
            ("leaderboard-every", self.leaderboard_every),
            ("leaderboard-size", self.leaderboard_size),
            ("probe-failure-warn-after", self.probe_failure_warn_after),
        ];
        for (key, value) in positive {
            if value == 0 {
                bail!("{} must be positive", key);
            }
        }

        let max_secs = MAX_INTERVAL.as_secs();
        let periods = [
            ("points-increment-seconds", self.points_increment_seconds),
            ("connect-first-player-seconds", self.connect_first_player_seconds),
            ("send-priority-messages-seconds", self.send_priority_messages_seconds),
            ("probe-timeout-ms", self.probe_timeout_ms / 1000),
        ];
        for (key, secs) in periods {
            if secs > max_secs {
                bail!("{} must not exceed {} seconds", key, max_secs);
            }
        }
        if self.target_server.trim().is_empty() {
            bail!("target-server must not be empty");
        }
        self.log_filter()?;
        Ok(())
    }

    /// Write the commented default config, creating parent directories
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, DEFAULT_CONFIG).context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Parsed `log-level`
    pub fn log_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .trim()
            .parse()
            .map_err(|_| eyre::eyre!("log-level must be one of off, error, warn, info, debug, trace"))
    }

    pub fn intervals(&self) -> Intervals {
        Intervals {
            accrual: Duration::from_secs(self.points_increment_seconds),
            admission: Duration::from_secs(self.connect_first_player_seconds),
            status: Duration::from_secs(self.send_priority_messages_seconds),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn accrual(&self) -> AccrualConfig {
        AccrualConfig {
            leaderboard_every: i64::try_from(self.leaderboard_every).unwrap_or(i64::MAX),
            leaderboard_size: usize::try_from(self.leaderboard_size).unwrap_or(usize::MAX),
        }
    }

    pub fn warn_after(&self) -> u32 {
        u32::try_from(self.probe_failure_warn_after).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target_server, "pokemon");
        assert_eq!(config.points_increment_seconds, 1);
        assert_eq!(config.connect_first_player_seconds, 5);
        assert_eq!(config.send_priority_messages_seconds, 30);
        assert!(config.bonus_points_file.ends_with(LEDGER_FILE_NAME));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("target-server: survival\n").unwrap();
        assert_eq!(config.target_server, "survival");
        assert_eq!(config.connect_first_player_seconds, 5);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let config = Config::from_yaml("points-increment-seconds: \"2\"\nprobe-timeout-ms: 250\n").unwrap();
        assert_eq!(config.points_increment_seconds, 2);
        assert_eq!(config.probe_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_garbage_interval_rejected() {
        assert!(Config::from_yaml("points-increment-seconds: soon\n").is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = Config::from_yaml("connect-first-player-seconds: 0\n").unwrap_err();
        assert!(err.to_string().contains("connect-first-player-seconds"));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let err = Config::from_yaml("points-increment-seconds: 18446744073709551615\n").unwrap_err();
        assert!(err.to_string().contains("points-increment-seconds"));

        let err = Config::from_yaml("probe-timeout-ms: 86400001000\n").unwrap_err();
        assert!(err.to_string().contains("probe-timeout-ms"));

        assert!(Config::from_yaml("send-priority-messages-seconds: 86400\n").is_ok());
    }

    #[test]
    fn test_log_level() {
        let config = Config::from_yaml("log-level: debug\n").unwrap();
        assert_eq!(config.log_filter().unwrap(), log::LevelFilter::Debug);

        let err = Config::from_yaml("log-level: chatty\n").unwrap_err();
        assert!(err.to_string().contains("log-level"));
    }

    #[test]
    fn test_intervals() {
        let config = Config::from_yaml(
            "points-increment-seconds: 2\nconnect-first-player-seconds: 3\nsend-priority-messages-seconds: 4\n",
        )
        .unwrap();
        let intervals = config.intervals();
        assert_eq!(intervals.accrual, Duration::from_secs(2));
        assert_eq!(intervals.admission, Duration::from_secs(3));
        assert_eq!(intervals.status, Duration::from_secs(4));
    }

    #[test]
    fn test_default_file_parses_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf/admitq.yml");
        Config::write_default(&path).unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let defaults = Config::default();
        assert_eq!(config.target_server, defaults.target_server);
        assert_eq!(config.leaderboard_every, defaults.leaderboard_every);
        assert_eq!(config.bonus_points_file, defaults.bonus_points_file);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let missing = PathBuf::from("/definitely/not/here/admitq.yml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
