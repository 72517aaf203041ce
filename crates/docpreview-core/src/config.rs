//! Configuration module
//!
//! The service configuration is read once at startup by [`Config::from_env`]
//! and then shared by reference. Nothing downstream reads the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_PDF_INFO_PATH: &str = "pdfinfo";
const DEFAULT_CONVERTER_PATH: &str = "lowriter";
const DEFAULT_BUGSNAG_NOTIFY_URL: &str = "https://notify.bugsnag.com";
const MAX_CONCURRENT_JOBS: usize = 4;
const JOB_QUEUE_SIZE: usize = 1000;
const SHUTDOWN_GRACE_SECS: u64 = 30;
const CALLBACK_TIMEOUT_SECS: u64 = 30;

/// Crash reporter settings. Reporting is enabled only when an API key is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrashReporterConfig {
    pub api_key: Option<String>,
    pub notify_url: String,
}

impl Default for CrashReporterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            notify_url: DEFAULT_BUGSNAG_NOTIFY_URL.to_string(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    /// Release stage label attached to crash reports.
    pub environment: String,
    pub crash_reporter: CrashReporterConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub local_storage_path: Option<String>,
    // External tools
    pub converter_path: String,
    pub pdf_info_path: String,
    /// Parent directory for per-job working directories.
    pub work_dir: PathBuf,
    // Job execution
    pub max_concurrent_jobs: usize,
    pub job_queue_size: usize,
    pub shutdown_grace_secs: u64,
    pub callback_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            environment: DEFAULT_ENVIRONMENT.to_string(),
            crash_reporter: CrashReporterConfig::default(),
            storage_backend: StorageBackend::S3,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            converter_path: DEFAULT_CONVERTER_PATH.to_string(),
            pdf_info_path: DEFAULT_PDF_INFO_PATH.to_string(),
            work_dir: env::temp_dir(),
            max_concurrent_jobs: MAX_CONCURRENT_JOBS,
            job_queue_size: JOB_QUEUE_SIZE,
            shutdown_grace_secs: SHUTDOWN_GRACE_SECS,
            callback_timeout_secs: CALLBACK_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let number = |name: &str| -> Result<Option<u64>, anyhow::Error> {
            var(name)
                .map(|value| {
                    value
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| anyhow::anyhow!("{} must be a valid number", name))
                })
                .transpose()
        };

        let server_port = match var("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => DEFAULT_PORT,
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(backend) => backend.parse()?,
            None => StorageBackend::S3,
        };

        let config = Config {
            server_port,
            environment: var("ENV")
                .or_else(|| var("ENVIRONMENT"))
                .unwrap_or(defaults.environment),
            crash_reporter: CrashReporterConfig {
                api_key: var("BUGSNAG_API_KEY"),
                notify_url: var("BUGSNAG_NOTIFY_URL")
                    .unwrap_or(defaults.crash_reporter.notify_url),
            },
            storage_backend,
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            converter_path: var("CONVERTER_PATH").unwrap_or(defaults.converter_path),
            pdf_info_path: var("PDF_INFO_PATH").unwrap_or(defaults.pdf_info_path),
            work_dir: var("WORK_DIR").map(PathBuf::from).unwrap_or(defaults.work_dir),
            max_concurrent_jobs: number("MAX_CONCURRENT_JOBS")?
                .map_or(MAX_CONCURRENT_JOBS, |n| n as usize)
                .max(1),
            job_queue_size: number("JOB_QUEUE_SIZE")?
                .map_or(JOB_QUEUE_SIZE, |n| n as usize)
                .max(1),
            shutdown_grace_secs: number("SHUTDOWN_GRACE_SECS")?.unwrap_or(SHUTDOWN_GRACE_SECS),
            callback_timeout_secs: number("CALLBACK_TIMEOUT_SECS")?
                .unwrap_or(CALLBACK_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.converter_path.trim().is_empty() {
            return Err(anyhow::anyhow!("CONVERTER_PATH must not be empty"));
        }

        if self.pdf_info_path.trim().is_empty() {
            return Err(anyhow::anyhow!("PDF_INFO_PATH must not be empty"));
        }

        if self.max_concurrent_jobs == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_JOBS must be at least 1"));
        }

        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when using local storage backend"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.pdf_info_path, "pdfinfo");
        assert_eq!(config.converter_path, "lowriter");
        assert_eq!(config.environment, "development");
        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert!(config.crash_reporter.api_key.is_none());
        assert_eq!(config.max_concurrent_jobs, 4);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("PDF_INFO_PATH", "/opt/bin/pdfinfo"),
            ("ENV", "production"),
            ("BUGSNAG_API_KEY", "abc123"),
            ("MAX_CONCURRENT_JOBS", "0"),
        ])
        .unwrap();
        assert_eq!(config.server_port, 9090);
        assert_eq!(config.pdf_info_path, "/opt/bin/pdfinfo");
        assert!(config.is_production());
        assert_eq!(config.crash_reporter.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.max_concurrent_jobs, 1);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = config_from(&[("PORT", ""), ("ENV", "")]).unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.environment, "development");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "http")]).is_err());
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        for name in [
            "MAX_CONCURRENT_JOBS",
            "JOB_QUEUE_SIZE",
            "SHUTDOWN_GRACE_SECS",
            "CALLBACK_TIMEOUT_SECS",
        ] {
            let err = config_from(&[(name, "ten")]).unwrap_err();
            assert_eq!(err.to_string(), format!("{} must be a valid number", name));
        }
        assert!(config_from(&[("JOB_QUEUE_SIZE", "-1")]).is_err());
    }

    #[test]
    fn test_numeric_overrides() {
        let config = config_from(&[
            ("JOB_QUEUE_SIZE", " 25 "),
            ("SHUTDOWN_GRACE_SECS", "5"),
            ("CALLBACK_TIMEOUT_SECS", "12"),
        ])
        .unwrap();
        assert_eq!(config.job_queue_size, 25);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(5));
        assert_eq!(config.callback_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_local_backend_requires_path() {
        assert!(config_from(&[("STORAGE_BACKEND", "local")]).is_err());
        let config =
            config_from(&[("STORAGE_BACKEND", "local"), ("LOCAL_STORAGE_PATH", "/srv/blobs")])
                .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
    }

    #[test]
    fn test_aws_region_fallback() {
        let config = config_from(&[("AWS_REGION", "eu-west-1")]).unwrap();
        assert_eq!(config.s3_region.as_deref(), Some("eu-west-1"));
    }
}
