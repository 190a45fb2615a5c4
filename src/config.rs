//! Startup configuration.
//!
//! Every option can be given as a flag or through its `CARDGATE_*`
//! environment variable; flags win.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser};

#[derive(Debug, Parser)]
#[command(name = "cardgate", version, about = "HTTP host for the card API")]
pub struct Config {
    /// Interface to bind. Empty binds every interface.
    #[arg(long, env = "CARDGATE_HOST", default_value = "")]
    pub host: String,

    #[arg(long, env = "CARDGATE_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seconds in-flight requests get to finish on shutdown.
    #[arg(long, env = "CARDGATE_GRACE_SECS", default_value_t = 5)]
    pub grace_secs: u64,

    #[command(flatten)]
    pub log: LogConfig,
}

/// Settings consumed by [`telemetry::init`](crate::telemetry::init).
#[derive(Clone, Debug, Args)]
pub struct LogConfig {
    /// JSON lines to `--log-file` at info level instead of console output at debug level.
    #[arg(long = "log-production", env = "CARDGATE_LOG_PRODUCTION")]
    pub production: bool,

    #[arg(long, env = "CARDGATE_LOG_FILE", default_value = "logs/api.log")]
    pub log_file: PathBuf,

    #[arg(long, env = "CARDGATE_LOG_MAX_SIZE_MB", default_value_t = 100)]
    pub log_max_size_mb: u64,

    #[arg(long, env = "CARDGATE_LOG_MAX_BACKUPS", default_value_t = 30)]
    pub log_max_backups: u32,

    #[arg(long, env = "CARDGATE_LOG_MAX_AGE_DAYS", default_value_t = 30)]
    pub log_max_age_days: u32,

    #[arg(long, env = "CARDGATE_LOG_COMPRESS", default_value_t = true, action = ArgAction::Set)]
    pub log_compress: bool,
}

impl Config {
    /// `host:port` as accepted by [`Server::start`](crate::Server::start).
    pub fn bind_addr(&self) -> String {
        match self.host.as_str() {
            "" => format!("0.0.0.0:{}", self.port),
            host if host.contains(':') && !host.starts_with('[') => format!("[{host}]:{}", self.port),
            host => format!("{host}:{}", self.port),
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_every_interface_on_8080() {
        let cfg = Config::try_parse_from(["cardgate"]).unwrap();

        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.grace_period(), Duration::from_secs(5));
        assert!(!cfg.log.production);
        assert_eq!(cfg.log.log_file, PathBuf::from("logs/api.log"));
        assert_eq!(cfg.log.log_max_size_mb, 100);
        assert!(cfg.log.log_compress);
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = Config::try_parse_from([
            "cardgate", "--host", "::1", "--port", "9000", "--log-compress", "false",
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr(), "[::1]:9000");
        assert!(!cfg.log.log_compress);
    }
}
