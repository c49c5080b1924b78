//! Configuration types for chat-media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Progress reporting configuration
///
/// Controls how often user-visible progress updates are emitted. The defaults
/// keep the edit rate well under typical chat-provider rate limits while
/// still guaranteeing a final 100% update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Minimum interval between emitted updates (default: 2s)
    #[serde(default = "default_min_interval")]
    pub min_interval: Duration,

    /// Minimum integer percentage advance that forces an update (default: 2)
    #[serde(default = "default_min_percent_step")]
    pub min_percent_step: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            min_interval: default_min_interval(),
            min_percent_step: default_min_percent_step(),
        }
    }
}

/// Main configuration for [`MediaPipeline`](crate::MediaPipeline)
///
/// All fields have sensible defaults; `Config::default()` yields a working
/// pipeline writing under `./downloads` with two workers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Root download directory; category folders are created beneath it
    /// (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Number of concurrent workers, fixed at startup (default: 2)
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Wall-clock ceiling for a single transfer (default: 6 hours)
    ///
    /// Measured from the moment a task becomes Active. A transfer exceeding
    /// it is cancelled and the task reaches TimedOut; sibling tasks are
    /// unaffected.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout: Duration,

    /// How long the completion notice stays visible before the status
    /// messages are deleted (default: 2s)
    #[serde(default = "default_completion_notice_delay")]
    pub completion_notice_delay: Duration,

    /// Pause between finishing one task and dequeuing the next (default: 1s)
    ///
    /// Deliberate rate limiting toward the external transfer service, not an
    /// incidental delay.
    #[serde(default = "default_inter_task_pause")]
    pub inter_task_pause: Duration,

    /// Progress reporting settings
    #[serde(default)]
    pub progress: ProgressConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            worker_count: default_worker_count(),
            transfer_timeout: default_transfer_timeout(),
            completion_notice_delay: default_completion_notice_delay(),
            inter_task_pause: default_inter_task_pause(),
            progress: ProgressConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key when a value is out
    /// of range.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Config {
                message: "worker_count must be at least 1".to_string(),
                key: Some("worker_count".to_string()),
            });
        }

        if self.transfer_timeout.is_zero() {
            return Err(Error::Config {
                message: "transfer_timeout must be positive".to_string(),
                key: Some("transfer_timeout".to_string()),
            });
        }

        if self.progress.min_percent_step == 0 || self.progress.min_percent_step > 100 {
            return Err(Error::Config {
                message: "min_percent_step must be between 1 and 100".to_string(),
                key: Some("progress.min_percent_step".to_string()),
            });
        }

        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_worker_count() -> usize {
    2
}

fn default_transfer_timeout() -> Duration {
    Duration::from_secs(6 * 3600)
}

fn default_completion_notice_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_inter_task_pause() -> Duration {
    Duration::from_secs(1)
}

fn default_min_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_min_percent_step() -> u8 {
    2
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();

        assert_eq!(config.download_dir, PathBuf::from("./downloads"));
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.transfer_timeout, Duration::from_secs(6 * 3600));
        assert_eq!(config.completion_notice_delay, Duration::from_secs(2));
        assert_eq!(config.inter_task_pause, Duration::from_secs(1));
        assert_eq!(config.progress.min_interval, Duration::from_secs(2));
        assert_eq!(config.progress.min_percent_step, 2);
    }

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = Config {
            worker_count: 0,
            ..Default::default()
        };

        match config.validate() {
            Err(Error::Config { key, .. }) => {
                assert_eq!(key.as_deref(), Some("worker_count"));
            }
            other => panic!("expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn out_of_range_percent_step_is_rejected() {
        let config = Config {
            progress: ProgressConfig {
                min_percent_step: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            progress: ProgressConfig {
                min_percent_step: 101,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.worker_count, 2);
        assert_eq!(config.progress.min_percent_step, 2);
    }
}
