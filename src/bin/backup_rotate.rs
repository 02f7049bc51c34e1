//! Standalone sweep of old table snapshots. Run it from cron or by hand; it
//! never touches the live tables, only `<data_dir>/backups/`.
//!
//! Snapshot directories end in `_YYYYMMDD_HHMMSS`; anything whose embedded
//! stamp is older than BACKUP_RETENTION_DAYS is removed. Directories without
//! a parseable stamp are left alone.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, FixedOffset, NaiveDateTime, Utc};
use dotenvy::dotenv;
use tracing::{info, warn};

fn snapshot_stamp(name: &str) -> Option<NaiveDateTime> {
    // prefix_YYYYMMDD_HHMMSS → take the last two underscore-separated parts.
    let mut parts = name.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    NaiveDateTime::parse_from_str(&format!("{date}_{time}"), "%Y%m%d_%H%M%S").ok()
}

fn sweep(backups_dir: &Path, cutoff: NaiveDateTime) -> Result<usize> {
    if !backups_dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in
        fs::read_dir(backups_dir).with_context(|| format!("read {}", backups_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(stamp) = snapshot_stamp(&name) else {
            continue;
        };
        if stamp < cutoff {
            match fs::remove_dir_all(entry.path()) {
                Ok(()) => {
                    info!(snapshot = %name, "Removed expired snapshot");
                    removed += 1;
                }
                Err(e) => warn!(snapshot = %name, error = %e, "Failed to remove snapshot"),
            }
        }
    }
    Ok(removed)
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| ".".to_string());
    let retention_days: i64 = env::var("BACKUP_RETENTION_DAYS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .context("BACKUP_RETENTION_DAYS must be a number")?;
    let tz_offset_hours: i32 = env::var("TZ_OFFSET_HOURS")
        .unwrap_or_else(|_| "9".to_string())
        .parse()
        .context("TZ_OFFSET_HOURS must be a number")?;

    if retention_days <= 0 {
        info!("Retention disabled, nothing to do");
        return Ok(());
    }

    let offset = FixedOffset::east_opt(tz_offset_hours * 3600)
        .context("TZ_OFFSET_HOURS must be within -23..=23")?;
    let now = Utc::now().with_timezone(&offset).naive_local();
    let cutoff = now - Duration::days(retention_days);

    let backups_dir = Path::new(&data_dir).join("backups");
    let removed = sweep(&backups_dir, cutoff)?;
    info!(removed, retention_days, "Backup sweep finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn stamps_parse_from_snapshot_names() {
        assert_eq!(
            snapshot_stamp("backup_20250801_183000"),
            Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap().and_hms_opt(18, 30, 0).unwrap())
        );
        assert_eq!(
            snapshot_stamp("pre_wipe_20250801_183000").is_some(),
            true
        );
        assert_eq!(snapshot_stamp("notes"), None);
        assert_eq!(snapshot_stamp("backup_2025_bad"), None);
    }

    #[test]
    fn sweep_removes_only_expired_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let backups = dir.path().join("backups");
        fs::create_dir_all(backups.join("backup_20250101_000000")).unwrap();
        fs::create_dir_all(backups.join("backup_20250801_000000")).unwrap();
        fs::create_dir_all(backups.join("keep_me")).unwrap();

        let removed = sweep(&backups, stamp(2025, 6, 1)).unwrap();

        assert_eq!(removed, 1);
        assert!(!backups.join("backup_20250101_000000").exists());
        assert!(backups.join("backup_20250801_000000").exists());
        assert!(backups.join("keep_me").exists());
    }

    #[test]
    fn sweep_on_missing_dir_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(sweep(&dir.path().join("backups"), stamp(2025, 6, 1)).unwrap(), 0);
    }
}
