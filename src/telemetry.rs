//! Process-wide `tracing` subscriber setup.
//!
//! Development: coloured console output on stdout, `debug` and up.
//! Production: JSON lines appended to the configured file, `info` and up.
//! `RUST_LOG` overrides the level in both modes.
//!
//! The production file rotates in-process once it passes `--log-max-size-mb`:
//! the live file becomes `<file>.1`, older backups shift up, and at most
//! `--log-max-backups` are kept (gzipped when `--log-compress` is set).
//! Backups older than `--log-max-age-days` are removed at startup.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;
use crate::error::Error;

const MIB: usize = 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Installs the global subscriber. Call once, before anything logs.
pub fn init(cfg: &LogConfig) -> Result<(), Error> {
    let default_level = if cfg.production { "info" } else { "debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let mut pruned = 0;
    let (file_layer, console_layer) = if cfg.production {
        if let Some(dir) = cfg.log_file.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| Error::Telemetry(format!("creating {}: {e}", dir.display())))?;
        }
        pruned = prune_expired(&cfg.log_file, DAY * cfg.log_max_age_days);

        let writer = rotating_writer(
            &cfg.log_file,
            cfg.log_max_size_mb as usize * MIB,
            cfg.log_max_backups as usize,
            cfg.log_compress,
        );
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(Mutex::new(writer));
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Telemetry(e.to_string()))?;

    if cfg.production {
        info!(
            file = %cfg.log_file.display(),
            max_size_mb = cfg.log_max_size_mb,
            max_backups = cfg.log_max_backups,
            max_age_days = cfg.log_max_age_days,
            compress = cfg.log_compress,
            pruned,
            "file logging enabled"
        );
    }
    Ok(())
}

/// A writer that appends to `path` and rotates it once it grows past
/// `max_bytes`, keeping `backups` numbered copies.
pub fn rotating_writer(path: &Path, max_bytes: usize, backups: usize, compress: bool) -> FileRotate<AppendCount> {
    let compression = if compress { Compression::OnRotate(0) } else { Compression::None };
    FileRotate::new(
        path,
        AppendCount::new(backups),
        ContentLimit::BytesSurpassed(max_bytes.max(1)),
        compression,
        #[cfg(unix)]
        None,
    )
}

/// Deletes rotated backups of `path` last modified more than `max_age` ago.
/// The live file is never touched. Returns how many were removed.
pub fn prune_expired(path: &Path, max_age: Duration) -> usize {
    let (Some(dir), Some(name)) = (path.parent(), path.file_name().and_then(|n| n.to_str())) else {
        return 0;
    };
    let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let prefix = format!("{name}.");
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(suffix) = file_name.to_str().and_then(|f| f.strip_prefix(&prefix)) else {
            continue;
        };
        if !is_backup_suffix(suffix) {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .map(|modified| now.duration_since(modified).unwrap_or_default() > max_age)
            .unwrap_or(false);
        if !expired {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %entry.path().display(), "failed to remove expired log: {e}"),
        }
    }
    removed
}

// `1`, `2`, … or `1.gz`, `2.gz`, …
fn is_backup_suffix(suffix: &str) -> bool {
    let digits = suffix.strip_suffix(".gz").unwrap_or(suffix);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
