//! Disk workload: sequential whole-file writes then reads of one temp file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use isoprobe_common::constants::DISK_BLOCK_BYTES;
use isoprobe_common::error::ProbeError;
use isoprobe_common::types::{WorkloadKind, round2};
use serde::Serialize;

use super::{FailureParams, Status, WorkloadFailure, elapsed_ms};

/// Result of the disk workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskReport {
    /// Always [`Status::Completed`].
    pub status: Status,
    /// Workload label.
    pub test: &'static str,
    /// Requested operations, after clamping.
    pub operations: u64,
    /// Whole-file writes performed.
    pub write_operations: u64,
    /// Whole-file reads performed.
    pub read_operations: u64,
    /// Wall-clock duration including cleanup.
    pub duration_ms: u64,
    /// `2 * operations / seconds`; `None` if the run took no measurable time.
    pub ops_per_second: Option<f64>,
    /// Summary line.
    pub message: String,
}

/// A uniquely named temp file removed on drop.
///
/// Removal happens on every exit path, so a failed write or read never
/// leaks the file.
#[derive(Debug)]
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("stress-test-{}.tmp", uuid::Uuid::new_v4())),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!(path = %self.path.display(), "scratch file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove scratch file"
                );
            }
        }
    }
}

#[derive(Default)]
struct Progress {
    writes: u64,
    reads: u64,
}

fn write_then_read(
    scratch: &ScratchFile,
    operations: u64,
    progress: &mut Progress,
) -> isoprobe_common::error::Result<()> {
    let block = [b'x'; DISK_BLOCK_BYTES];
    for _ in 0..operations {
        std::fs::write(&scratch.path, block).map_err(|e| ProbeError::io(&scratch.path, e))?;
        progress.writes += 1;
    }
    for _ in 0..operations {
        let data = std::fs::read(&scratch.path).map_err(|e| ProbeError::io(&scratch.path, e))?;
        let _ = std::hint::black_box(data);
        progress.reads += 1;
    }
    Ok(())
}

/// Writes a 1 KiB block `operations` times, reads it back as often, and
/// deletes the file.
///
/// # Errors
///
/// Returns a [`WorkloadFailure`] with the counts reached before the
/// failure, e.g. on a read-only or full filesystem.
pub fn run_disk(dir: &Path, operations: u64) -> Result<DiskReport, WorkloadFailure> {
    tracing::info!(operations, dir = %dir.display(), "Disk I/O stress test started");
    let start = Instant::now();
    let mut progress = Progress::default();

    let outcome = {
        let scratch = ScratchFile::new(dir);
        write_then_read(&scratch, operations, &mut progress)
    };
    let elapsed = start.elapsed();
    let duration_ms = elapsed_ms(start);

    if let Err(e) = outcome {
        tracing::error!(operations, error = %e, "Disk I/O stress test failed");
        return Err(WorkloadFailure::new(
            WorkloadKind::Disk,
            &e,
            FailureParams::Disk {
                operations,
                write_operations: progress.writes,
                read_operations: progress.reads,
            },
        ));
    }

    tracing::info!(operations, duration_ms, "Disk I/O stress test completed");
    #[allow(clippy::cast_precision_loss)]
    let ops_per_second = (elapsed.as_secs_f64() > 0.0)
        .then(|| round2(operations.saturating_mul(2) as f64 / elapsed.as_secs_f64()));

    Ok(DiskReport {
        status: Status::Completed,
        test: WorkloadKind::Disk.test_label(),
        operations,
        write_operations: progress.writes,
        read_operations: progress.reads,
        duration_ms,
        ops_per_second,
        message: format!("Disk I/O test completed in {duration_ms}ms"),
    })
}
