// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records scalar training metrics to a CSV file.
//
// Every row is one (step, tag, value) triple:
//
//   step,tag,value
//   4,train/loss,2.614021
//   4,eval/loss,2.598310
//   8,train/loss,2.401876
//
// `step` is the optimiser step count at the time of logging.
// The Trainer writes `train/loss` once per epoch and
// `eval/loss` after every evaluation.
//
// The file is appended to across runs; the header is written
// only when the file is first created.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::traits::MetricsSink;

const HEADER: &str = "step,tag,value";

/// Appends scalar metrics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl MetricsSink for MetricsLogger {
    fn log_scalar(&self, tag: &str, value: f64, step: usize) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{step},{tag},{value:.6}")?;
        tracing::debug!("{tag} = {value:.4} at step {step}");
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rows_are_appended() {
        let dir    = TempDir::new().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();

        logger.log_scalar("train/loss", 2.5, 4).unwrap();
        logger.log_scalar("eval/loss", 2.25, 4).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text, "step,tag,value\n4,train/loss,2.500000\n4,eval/loss,2.250000\n");
    }

    #[test]
    fn test_header_written_once() {
        let dir = TempDir::new().unwrap();
        MetricsLogger::new(dir.path()).unwrap().log_scalar("train/loss", 1.0, 1).unwrap();
        MetricsLogger::new(dir.path()).unwrap().log_scalar("train/loss", 0.5, 2).unwrap();

        let text = fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(text.matches(HEADER).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir    = TempDir::new().unwrap();
        let nested = dir.path().join("runs").join("first");
        let logger = MetricsLogger::new(&nested).unwrap();
        assert!(logger.csv_path().exists());
    }
}
