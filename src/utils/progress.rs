// src/utils/progress.rs

use indicatif::{MultiProgress, ProgressStyle};
use std::env;

/// Configuration for progress tracking throughout the pipeline
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Whether to show progress bars at all
    pub enabled: bool,
    /// Whether to show detailed sub-progress bars
    pub detailed: bool,
    /// Refresh rate for progress bars in milliseconds
    pub refresh_rate_ms: u64,
    /// Maximum number of concurrent progress bars
    pub max_concurrent_bars: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detailed: true,
            refresh_rate_ms: 100,
            max_concurrent_bars: 10,
        }
    }
}

impl ProgressConfig {
    /// Create progress configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("PROGRESS_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            detailed: env::var("PROGRESS_DETAILED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            refresh_rate_ms: env::var("PROGRESS_REFRESH_RATE_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            max_concurrent_bars: env::var("PROGRESS_MAX_CONCURRENT_BARS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        }
    }

    /// Create a MultiProgress instance if progress is enabled, None otherwise
    pub fn create_multi_progress(&self) -> Option<MultiProgress> {
        if self.enabled {
            Some(MultiProgress::new())
        } else {
            None
        }
    }

    /// Check if detailed progress should be shown
    pub fn should_show_detailed(&self) -> bool {
        self.enabled && self.detailed
    }
}

/// Shared bar style for the phase-level progress bars.
pub fn phase_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap()
        .progress_chars("█▉▊▋▌▍▎▏  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert!(config.enabled);
        assert!(config.detailed);
        assert_eq!(config.refresh_rate_ms, 100);
        assert_eq!(config.max_concurrent_bars, 10);
    }

    #[test]
    fn test_env_config() {
        env::set_var("PROGRESS_ENABLED", "false");
        env::set_var("PROGRESS_DETAILED", "false");
        env::set_var("PROGRESS_REFRESH_RATE_MS", "50");
        env::set_var("PROGRESS_MAX_CONCURRENT_BARS", "5");

        let config = ProgressConfig::from_env();
        assert!(!config.enabled);
        assert!(!config.detailed);
        assert_eq!(config.refresh_rate_ms, 50);
        assert_eq!(config.max_concurrent_bars, 5);

        env::remove_var("PROGRESS_ENABLED");
        env::remove_var("PROGRESS_DETAILED");
        env::remove_var("PROGRESS_REFRESH_RATE_MS");
        env::remove_var("PROGRESS_MAX_CONCURRENT_BARS");
    }

    #[test]
    fn test_multi_progress_creation() {
        let mut config = ProgressConfig::default();

        config.enabled = true;
        assert!(config.create_multi_progress().is_some());

        config.enabled = false;
        assert!(config.create_multi_progress().is_none());
    }

    #[test]
    fn test_should_show_detailed() {
        let mut config = ProgressConfig::default();

        config.enabled = true;
        config.detailed = true;
        assert!(config.should_show_detailed());

        config.enabled = false;
        assert!(!config.should_show_detailed());

        config.enabled = true;
        config.detailed = false;
        assert!(!config.should_show_detailed());
    }
}
