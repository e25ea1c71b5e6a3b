//! File-persisted cooldown gate for remote analysis calls.
//!
//! At most one fetch is allowed per cooldown window. The last-acquired
//! timestamp lives in a small JSON record on disk so the gate survives
//! process restarts and page refreshes, and so independent processes
//! sharing the record agree on who may fetch.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Cooldown windows accepted by the gate, in seconds.
pub const ALLOWED_WINDOWS: &[u64] = &[60, 120];

#[derive(Debug, Error)]
pub enum CooldownError {
    #[error("Unsupported cooldown window: {0}s (allowed: 60s, 120s)")]
    InvalidWindow(u64),

    #[error("Cooldown state I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of an acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquire {
    /// The caller may fetch; the reservation is already persisted.
    Granted,
    /// Still inside the window.
    Denied { remaining: Duration },
}

/// Persisted record. Field name is the on-disk contract; independent
/// process instances read the same shape.
#[derive(Debug, Serialize, Deserialize)]
struct CooldownRecord {
    last_analysis_time: f64,
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Gate limiting remote fetches to one per cooldown window.
///
/// The persisted timestamp is the only shared mutable state; `try_acquire`
/// serializes read-check-write under an exclusive lock on a sidecar lock
/// file, while `remaining` and `last_acquired` are lock-free pure reads.
#[derive(Debug)]
pub struct CooldownGate {
    path: PathBuf,
    window: Duration,
}

impl CooldownGate {
    /// Create a gate over the record at `path`.
    ///
    /// Only 60s and 120s windows are accepted.
    pub fn new(path: impl Into<PathBuf>, window_secs: u64) -> Result<Self, CooldownError> {
        if !ALLOWED_WINDOWS.contains(&window_secs) {
            return Err(CooldownError::InvalidWindow(window_secs));
        }
        Ok(Self {
            path: path.into(),
            window: Duration::from_secs(window_secs),
        })
    }

    /// Switch to a different cooldown window. Same restriction as [`new`](Self::new).
    pub fn set_window(&mut self, window_secs: u64) -> Result<(), CooldownError> {
        if !ALLOWED_WINDOWS.contains(&window_secs) {
            return Err(CooldownError::InvalidWindow(window_secs));
        }
        self.window = Duration::from_secs(window_secs);
        Ok(())
    }

    /// The active cooldown window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Attempt to reserve a fetch at `now` (seconds since epoch).
    ///
    /// On grant the new timestamp is durably written before returning, so
    /// an overlapping caller (second tab, refreshed page) is denied even
    /// while the fetch itself is still in flight. A later failed fetch does
    /// not roll the reservation back.
    pub fn try_acquire(&self, now: f64) -> Result<Acquire, CooldownError> {
        let lock = self.lock_exclusive()?;

        if let Some(last) = read_record(&self.path) {
            let elapsed = now - last;
            if elapsed < self.window.as_secs_f64() {
                drop(lock);
                return Ok(Acquire::Denied {
                    remaining: self.clamp_remaining(elapsed),
                });
            }
        }

        self.write_record(now)?;
        drop(lock);

        debug!("Cooldown reservation recorded at {}", now);
        Ok(Acquire::Granted)
    }

    /// Time left in the window at `now`. Pure read: never mutates state,
    /// returns zero once the window has elapsed and never more than the
    /// window itself, even if the persisted timestamp sits in the future.
    pub fn remaining(&self, now: f64) -> Duration {
        match read_record(&self.path) {
            None => Duration::ZERO,
            Some(last) => self.clamp_remaining(now - last),
        }
    }

    /// The persisted last-acquired timestamp, if any. Pure read.
    pub fn last_acquired(&self) -> Option<f64> {
        read_record(&self.path)
    }

    /// Delete the persisted record. Idempotent.
    pub fn reset(&self) -> Result<(), CooldownError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clamp_remaining(&self, elapsed: f64) -> Duration {
        let window = self.window.as_secs_f64();
        Duration::from_secs_f64((window - elapsed).clamp(0.0, window))
    }

    /// Take the exclusive advisory lock guarding the record.
    ///
    /// The lock lives on a sidecar file rather than the record itself: the
    /// record inode changes on every atomic replace, the sidecar's never
    /// does, so all processes contend on the same lock.
    fn lock_exclusive(&self) -> Result<File, CooldownError> {
        let mut lock_path = self.path.as_os_str().to_owned();
        lock_path.push(".lock");

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(Path::new(&lock_path))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// Atomic replace: write to a temp file, then rename over the record.
    /// A crash mid-write leaves either the old record or none, never a
    /// truncated one.
    fn write_record(&self, timestamp: f64) -> Result<(), CooldownError> {
        let record = CooldownRecord {
            last_analysis_time: timestamp,
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut tmp_path = self.path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Read the persisted timestamp. Missing or unparseable records are
/// treated as "never acquired" (fail-open): a corrupt file must not lock
/// the user out permanently.
fn read_record(path: &Path) -> Option<f64> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read cooldown record {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<CooldownRecord>(&raw) {
        Ok(record) => Some(record.last_analysis_time),
        Err(e) => {
            warn!(
                "Corrupt cooldown record {} ({}), treating as never acquired",
                path.display(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn gate_at(dir: &tempfile::TempDir, window: u64) -> CooldownGate {
        CooldownGate::new(dir.path().join("state.json"), window).unwrap()
    }

    #[test]
    fn rejects_unsupported_window() {
        let dir = tempfile::tempdir().unwrap();
        let result = CooldownGate::new(dir.path().join("state.json"), 90);
        assert!(matches!(result, Err(CooldownError::InvalidWindow(90))));
    }

    #[test]
    fn first_acquire_is_granted() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);

        assert_eq!(gate.try_acquire(1_000.0).unwrap(), Acquire::Granted);
        assert_eq!(gate.last_acquired(), Some(1_000.0));
    }

    #[test]
    fn denies_within_window_with_exact_remaining() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);

        assert_eq!(gate.try_acquire(1_000.0).unwrap(), Acquire::Granted);

        match gate.try_acquire(1_030.0).unwrap() {
            Acquire::Denied { remaining } => {
                assert!((remaining.as_secs_f64() - 30.0).abs() < 1e-9);
            }
            other => panic!("expected Denied, got {:?}", other),
        }

        // Denial must not move the persisted timestamp.
        assert_eq!(gate.last_acquired(), Some(1_000.0));
    }

    #[test]
    fn grants_once_window_elapsed() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);

        assert_eq!(gate.try_acquire(1_000.0).unwrap(), Acquire::Granted);
        assert_eq!(gate.try_acquire(1_060.0).unwrap(), Acquire::Granted);
        assert_eq!(gate.last_acquired(), Some(1_060.0));
    }

    #[test]
    fn remaining_is_pure_and_expires() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);

        gate.try_acquire(1_000.0).unwrap();

        for _ in 0..3 {
            assert!((gate.remaining(1_045.0).as_secs_f64() - 15.0).abs() < 1e-9);
        }
        assert_eq!(gate.last_acquired(), Some(1_000.0));

        // Zero after expiry even though try_acquire was never called again.
        assert_eq!(gate.remaining(1_060.0), Duration::ZERO);
        assert_eq!(gate.remaining(5_000.0), Duration::ZERO);
    }

    #[test]
    fn remaining_before_first_acquire_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);
        assert_eq!(gate.remaining(1_000.0), Duration::ZERO);
    }

    #[test]
    fn clock_moved_backward_clamps_to_window() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);

        gate.try_acquire(1_000.0).unwrap();

        // Timestamp now sits in the caller's future.
        let remaining = gate.remaining(900.0);
        assert_eq!(remaining, Duration::from_secs(60));

        match gate.try_acquire(900.0).unwrap() {
            Acquire::Denied { remaining } => {
                assert_eq!(remaining, Duration::from_secs(60));
            }
            other => panic!("expected Denied, got {:?}", other),
        }
    }

    #[test]
    fn corrupt_record_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{\"last_analysis_ti").unwrap();

        let gate = CooldownGate::new(&path, 60).unwrap();
        assert_eq!(gate.remaining(1_000.0), Duration::ZERO);
        assert_eq!(gate.try_acquire(1_000.0).unwrap(), Acquire::Granted);
        assert_eq!(gate.last_acquired(), Some(1_000.0));
    }

    #[test]
    fn reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 60);

        gate.try_acquire(1_000.0).unwrap();
        gate.reset().unwrap();
        assert_eq!(gate.last_acquired(), None);

        // Second reset with no record present.
        gate.reset().unwrap();
        assert_eq!(gate.try_acquire(1_001.0).unwrap(), Acquire::Granted);
    }

    #[test]
    fn record_survives_gate_recreation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let gate = CooldownGate::new(&path, 60).unwrap();
        gate.try_acquire(1_000.0).unwrap();
        drop(gate);

        // Fresh instance over the same path, as after a process restart.
        let gate = CooldownGate::new(&path, 60).unwrap();
        assert!(matches!(
            gate.try_acquire(1_030.0).unwrap(),
            Acquire::Denied { .. }
        ));
    }

    #[test]
    fn concurrent_acquirers_share_one_grant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let gate = CooldownGate::new(path, 60).unwrap();
                    barrier.wait();
                    gate.try_acquire(1_000.0).unwrap()
                })
            })
            .collect();

        let outcomes: Vec<Acquire> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let granted = outcomes
            .iter()
            .filter(|o| matches!(o, Acquire::Granted))
            .count();
        assert_eq!(granted, 1, "exactly one caller may win the window");
    }

    #[test]
    fn window_of_120_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_at(&dir, 120);

        gate.try_acquire(1_000.0).unwrap();
        assert!(matches!(
            gate.try_acquire(1_090.0).unwrap(),
            Acquire::Denied { .. }
        ));
        assert_eq!(gate.try_acquire(1_120.0).unwrap(), Acquire::Granted);
    }

    #[test]
    fn set_window_validates() {
        let dir = tempfile::tempdir().unwrap();
        let mut gate = gate_at(&dir, 60);

        assert!(gate.set_window(45).is_err());
        assert_eq!(gate.window(), Duration::from_secs(60));

        gate.set_window(120).unwrap();
        assert_eq!(gate.window(), Duration::from_secs(120));
    }
}
