// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub segments: SegmentConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SegmentConfig {
    pub url_root: String,
    pub retries: u32,
    pub timeout_secs: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// `debug` or `mp`, optionally followed by `,key=value` options.
    pub mode: String,
    pub cpus: usize,
    /// Negative means one task per available cpu.
    pub task_parallelism: i64,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CC_MINIFY")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            segments: SegmentConfig {
                url_root: "https://data.commoncrawl.org".to_string(),
                retries: 3,
                timeout_secs: 300,
                initial_backoff_ms: 500,
                max_backoff_ms: 16_000,
            },
            execution: ExecutionConfig {
                mode: "mp".to_string(),
                cpus: 1,
                task_parallelism: -1,
                log_dir: PathBuf::from("./logs"),
            },
        }
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_url(&self.segments.url_root)?;

        if self.segments.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.segments.initial_backoff_ms > self.segments.max_backoff_ms {
            return Err(PipelineError::Config(
                "initial_backoff_ms must not exceed max_backoff_ms".to_string(),
            ));
        }

        if self.execution.cpus == 0 {
            return Err(PipelineError::Config(
                "cpus must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.segments.retries, 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[segments]
url_root = "https://mirror.example.org"
retries = 5
timeout_secs = 30
initial_backoff_ms = 10
max_backoff_ms = 100

[execution]
mode = "debug"
cpus = 2
task_parallelism = 8
log_dir = "/tmp/cc_minify_logs"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.segments.url_root, "https://mirror.example.org");
        assert_eq!(config.segments.retries, 5);
        assert_eq!(config.execution.mode, "debug");
        assert_eq!(config.execution.task_parallelism, 8);
    }

    #[test]
    fn test_rejects_bad_backoff() {
        let mut config = Config::default_config();
        config.segments.initial_backoff_ms = 10;
        config.segments.max_backoff_ms = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_http_root() {
        let mut config = Config::default_config();
        config.segments.url_root = "ftp://example.org".to_string();
        assert!(config.validate().is_err());
    }
}
