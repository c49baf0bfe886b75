//! Canonical in-memory view of the results file.
//!
//! - load/save over the results log
//! - deterministic queries by index
//! - lock-scoped read-modify-write for concurrent recorders
//! - lock-scoped claims for concurrent `next` callers

use crate::log::{LogError, append_to_log, read_log, rewrite_log};
use crate::record::ResultRecord;
use chrono::Utc;
use regress_kernel::{IndexSpace, Outcome, State};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ResultStoreError {
    #[error(transparent)]
    Log(#[from] LogError),

    #[error("results file is locked by another process: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("failed to acquire results lock {lock_path}: {message}")]
    LockIo { lock_path: String, message: String },
}

/// Results keyed by index, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultStore {
    records: BTreeMap<u64, ResultRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate indices resolve to the record that comes last, matching
    /// append-style writers.
    pub fn from_records(records: impl IntoIterator<Item = ResultRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.upsert(record);
        }
        store
    }

    /// Load the results log. A missing log is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResultStoreError> {
        Ok(Self::from_records(read_log(path.as_ref())?))
    }

    /// Rewrite the log with one line per index.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ResultStoreError> {
        rewrite_log(path.as_ref(), self.records.values())?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: u64) -> Option<&ResultRecord> {
        self.records.get(&index)
    }

    /// All records in index order.
    pub fn records(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.values()
    }

    /// Insert or replace the record for its index. Returns the previous one.
    pub fn upsert(&mut self, record: ResultRecord) -> Option<ResultRecord> {
        self.records.insert(record.index, record)
    }

    /// Records with a reported outcome inside `[lo, hi]`.
    pub fn evaluated_in(&self, lo: u64, hi: u64) -> Vec<&ResultRecord> {
        if lo > hi {
            return Vec::new();
        }
        self.records
            .range(lo..=hi)
            .map(|(_, record)| record)
            .filter(|record| !record.is_pending())
            .collect()
    }

    pub fn dirty(&self) -> Vec<&ResultRecord> {
        self.records
            .values()
            .filter(|record| record.outcome.is_dirty())
            .collect()
    }

    /// Handed out, nothing reported yet.
    pub fn pending(&self) -> Vec<&ResultRecord> {
        self.records
            .values()
            .filter(|record| record.is_pending())
            .collect()
    }

    /// Drop every dirty record so its index can be handed out again.
    pub fn clear_dirty(&mut self) -> Vec<u64> {
        let dirty: Vec<u64> = self.dirty().iter().map(|record| record.index).collect();
        for index in &dirty {
            self.records.remove(index);
        }
        dirty
    }

    /// Every recorded index as a state, pending ones included.
    pub fn states(&self, space: IndexSpace) -> Vec<State> {
        self.records
            .values()
            .map(|record| record.state(space))
            .collect()
    }

    /// Neighbouring conclusive results whose outcomes differ.
    ///
    /// Dirty and pending records in between are skipped.
    pub fn outcome_changes(&self) -> Vec<(&ResultRecord, &ResultRecord)> {
        let conclusive: Vec<&ResultRecord> = self
            .records
            .values()
            .filter(|record| record.outcome.is_conclusive())
            .collect();
        conclusive
            .windows(2)
            .filter(|pair| pair[0].outcome != pair[1].outcome)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    /// Count of records per outcome.
    pub fn tally(&self) -> BTreeMap<&'static str, usize> {
        let mut tally = BTreeMap::new();
        for outcome in [
            Outcome::Positive,
            Outcome::Negative,
            Outcome::Dirty,
            Outcome::Unknown,
        ] {
            tally.insert(outcome.as_str(), 0);
        }
        for record in self.records.values() {
            *tally.entry(record.outcome.as_str()).or_insert(0) += 1;
        }
        tally
    }
}

pub fn lock_path(results_path: &Path) -> PathBuf {
    let mut path: OsString = results_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

/// Load, mutate and (when `mutator` reports a change) save the results file
/// while holding its lock file.
pub fn mutate_results<T, F>(path: impl AsRef<Path>, mutator: F) -> Result<T, ResultStoreError>
where
    F: FnOnce(&mut ResultStore) -> (T, bool),
{
    let path = path.as_ref();
    let _guard = ResultsLockGuard::acquire(path)?;
    let mut store = ResultStore::load(path)?;
    let (value, changed) = mutator(&mut store);
    if changed {
        store.save(path)?;
    }
    Ok(value)
}

/// Append `record` as a pending hand-out unless its index is already in the
/// log. Returns `false` when another caller got there first.
pub fn claim_pending(
    path: impl AsRef<Path>,
    record: &ResultRecord,
) -> Result<bool, ResultStoreError> {
    let path = path.as_ref();
    let _guard = ResultsLockGuard::acquire(path)?;
    if ResultStore::load(path)?.get(record.index).is_some() {
        return Ok(false);
    }
    append_to_log(path, record)?;
    Ok(true)
}

struct ResultsLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl ResultsLockGuard {
    fn acquire(path: &Path) -> Result<Self, ResultStoreError> {
        let lock_path = lock_path(path);
        let lock_io = |message: String| ResultStoreError::LockIo {
            lock_path: lock_path.display().to_string(),
            message,
        };
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| lock_io(e.to_string()))?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                let _ = writeln!(
                    file,
                    "pid={}\nutc={}",
                    std::process::id(),
                    Utc::now().to_rfc3339()
                );
                Ok(Self {
                    lock_path,
                    _file: file,
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ResultStoreError::LockBusy {
                    lock_path: lock_path.display().to_string(),
                })
            }
            Err(err) => Err(lock_io(err.to_string())),
        }
    }
}

impl Drop for ResultsLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn record(index: u64, outcome: Outcome) -> ResultRecord {
        ResultRecord::new(index, outcome)
    }

    fn temp_dir(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "regress-store-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("temp dir should be created");
        dir
    }

    #[test]
    fn duplicate_indices_keep_the_last_record() {
        let store = ResultStore::from_records(vec![
            record(5, Outcome::Unknown),
            record(2, Outcome::Positive),
            record(5, Outcome::Dirty),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(5).map(|r| r.outcome), Some(Outcome::Dirty));
        let indices: Vec<u64> = store.records().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 5]);
    }

    #[test]
    fn queries_split_pending_dirty_and_evaluated() {
        let store = ResultStore::from_records(vec![
            record(0, Outcome::Positive),
            record(10, Outcome::Unknown),
            record(20, Outcome::Dirty),
            record(30, Outcome::Negative),
        ]);

        let evaluated: Vec<u64> = store.evaluated_in(0, 25).iter().map(|r| r.index).collect();
        assert_eq!(evaluated, vec![0, 20]);
        assert!(store.evaluated_in(9, 3).is_empty());
        assert_eq!(store.pending()[0].index, 10);
        assert_eq!(store.dirty()[0].index, 20);
        assert_eq!(store.tally()["unknown"], 1);
        assert_eq!(store.states(IndexSpace::Commit).len(), 4);
    }

    #[test]
    fn outcome_changes_skip_inconclusive_records() {
        let store = ResultStore::from_records(vec![
            record(0, Outcome::Positive),
            record(10, Outcome::Positive),
            record(20, Outcome::Dirty),
            record(30, Outcome::Negative),
            record(40, Outcome::Unknown),
            record(50, Outcome::Positive),
        ]);
        let changes: Vec<(u64, u64)> = store
            .outcome_changes()
            .iter()
            .map(|(a, b)| (a.index, b.index))
            .collect();
        assert_eq!(changes, vec![(10, 30), (30, 50)]);
    }

    #[test]
    fn clear_dirty_removes_only_dirty_records() {
        let mut store = ResultStore::from_records(vec![
            record(1, Outcome::Dirty),
            record(2, Outcome::Negative),
            record(3, Outcome::Dirty),
        ]);
        assert_eq!(store.clear_dirty(), vec![1, 3]);
        assert_eq!(store.len(), 1);
        assert!(store.dirty().is_empty());
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = temp_dir("missing");
        let store = ResultStore::load(dir.join("results.jsonl")).expect("load");
        assert!(store.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn mutation_persists_only_when_changed_and_releases_the_lock() {
        let dir = temp_dir("mutate");
        let path = dir.join("results.jsonl");

        let replaced = mutate_results(&path, |store| {
            (store.upsert(record(4, Outcome::Positive)).is_some(), true)
        })
        .expect("mutation should succeed");
        assert!(!replaced);
        assert!(!lock_path(&path).exists());

        let seen = mutate_results(&path, |store| (store.len(), false)).expect("read-only");
        assert_eq!(seen, 1);
        assert_eq!(
            ResultStore::load(&path)
                .expect("reload")
                .get(4)
                .map(|r| r.outcome),
            Some(Outcome::Positive)
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn claims_append_once_per_index() {
        let dir = temp_dir("claim");
        let path = dir.join("results.jsonl");
        mutate_results(&path, |store| (store.upsert(record(3, Outcome::Negative)), true))
            .expect("seed result");

        assert!(claim_pending(&path, &ResultRecord::pending(8)).expect("claim 8"));
        assert!(!claim_pending(&path, &ResultRecord::pending(8)).expect("second claim 8"));
        assert!(!claim_pending(&path, &ResultRecord::pending(3)).expect("claim recorded 3"));
        assert!(!lock_path(&path).exists());

        let store = ResultStore::load(&path).expect("reload");
        assert_eq!(store.get(3).map(|r| r.outcome), Some(Outcome::Negative));
        assert_eq!(store.pending().len(), 1);
        let lines = fs::read_to_string(&path).expect("log").lines().count();
        assert_eq!(lines, 2);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn later_log_lines_win_until_the_next_rewrite() {
        let dir = temp_dir("compact");
        let path = dir.join("results.jsonl");
        assert!(claim_pending(&path, &ResultRecord::pending(5)).expect("claim"));
        append_to_log(&path, &record(5, Outcome::Positive)).expect("append result");
        assert_eq!(
            ResultStore::load(&path).expect("load").get(5).map(|r| r.outcome),
            Some(Outcome::Positive)
        );

        mutate_results(&path, |store| ((), store.pending().is_empty())).expect("compact");
        let lines = fs::read_to_string(&path).expect("log").lines().count();
        assert_eq!(lines, 1);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn held_lock_is_reported_as_busy() {
        let dir = temp_dir("busy");
        let path = dir.join("results.jsonl");
        fs::write(lock_path(&path), "pid=1\n").expect("lock fixture");

        match mutate_results(&path, |_| ((), true)) {
            Err(ResultStoreError::LockBusy { lock_path }) => {
                assert!(lock_path.ends_with("results.jsonl.lock"))
            }
            other => panic!("expected busy lock, got {other:?}"),
        }
        let _ = fs::remove_dir_all(dir);
    }
}
