//! Shared state mutated by the scan and polled by the presentation layer.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::format::percentage;
use crate::scanner::{PhaseCell, ScanPhase, ScanProgress};

/// One row of the ranked usage table
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRow {
    /// 1-based position in the ranking
    pub rank: usize,
    pub library: PathBuf,
    pub uses: u64,
    /// Share of all dependency edges in the snapshot
    pub percent: f64,
}

#[derive(Debug, Default)]
struct Counters {
    libraries_discovered: AtomicU64,
    libraries_resolved: AtomicU64,
    binaries_discovered: AtomicU64,
    binaries_resolved: AtomicU64,
    libraries_observed: AtomicU64,
    edges: AtomicU64,
    in_flight: AtomicU64,
}

/// Bounded diagnostic log; the oldest entries are evicted once full
#[derive(Debug)]
struct MessageLog {
    entries: VecDeque<String>,
    capacity: usize,
    evicted: u64,
}

impl MessageLog {
    fn push(&mut self, message: String) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.evicted += 1;
        }
        self.entries.push_back(message);
    }
}

/// Library usage counts, progress counters, binary inventory and diagnostics
/// for one scan.
///
/// Shared as `Arc<UsageAggregate>` between the walkers, the dispatcher, the
/// resolver workers and the UI. Only the scan mutates it.
#[derive(Debug)]
pub struct UsageAggregate {
    /// Library path -> use count. Slot creation needs the lock, increments don't.
    libraries: Mutex<HashMap<PathBuf, Arc<AtomicU64>>>,
    /// Library candidates already accepted for resolution
    scanned: Mutex<HashSet<PathBuf>>,
    binaries: Mutex<Vec<PathBuf>>,
    messages: Mutex<MessageLog>,
    counters: Counters,
    phase: PhaseCell,
}

/// Every critical section leaves its data consistent, so a poisoned lock is
/// still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UsageAggregate {
    pub fn new(message_capacity: usize) -> Self {
        Self {
            libraries: Mutex::new(HashMap::new()),
            scanned: Mutex::new(HashSet::new()),
            binaries: Mutex::new(Vec::new()),
            messages: Mutex::new(MessageLog {
                entries: VecDeque::new(),
                capacity: message_capacity,
                evicted: 0,
            }),
            counters: Counters::default(),
            phase: PhaseCell::new(),
        }
    }

    // ---- scan side -------------------------------------------------------

    /// Test-and-set membership of a library candidate. Returns `true` if the
    /// caller is the first to claim `path` and should resolve it.
    pub fn claim_library(&self, path: &Path) -> bool {
        let mut scanned = lock(&self.scanned);
        if !scanned.insert(path.to_path_buf()) {
            return false;
        }
        self.counters
            .libraries_discovered
            .fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Append a discovered binary to the inventory
    pub fn record_binary(&self, path: PathBuf) {
        lock(&self.binaries).push(path);
        self.counters
            .binaries_discovered
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Fold one dependency edge on `library` into the usage map
    pub fn record_dependency(&self, library: PathBuf) {
        let slot = {
            let mut libraries = lock(&self.libraries);
            let slot = libraries.entry(library).or_insert_with(|| {
                self.counters
                    .libraries_observed
                    .fetch_add(1, Ordering::Relaxed);
                Arc::new(AtomicU64::new(0))
            });
            Arc::clone(slot)
        };
        slot.fetch_add(1, Ordering::Relaxed);
        self.counters.edges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish_library(&self) {
        self.counters
            .libraries_resolved
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn finish_binary(&self) {
        self.counters
            .binaries_resolved
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn job_queued(&self) {
        self.counters.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn job_finished(&self) {
        self.counters.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    /// Append a human-readable diagnostic
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        lock(&self.messages).push(message);
    }

    pub(crate) fn advance_phase(&self, next: ScanPhase) -> bool {
        let advanced = self.phase.advance(next);
        if advanced {
            tracing::info!(phase = %next, "scan phase changed");
        }
        advanced
    }

    // ---- read side -------------------------------------------------------

    pub fn phase(&self) -> ScanPhase {
        self.phase.get()
    }

    pub fn progress(&self) -> ScanProgress {
        let c = &self.counters;
        ScanProgress {
            libraries_discovered: c.libraries_discovered.load(Ordering::Relaxed),
            libraries_resolved: c.libraries_resolved.load(Ordering::Relaxed),
            binaries_discovered: c.binaries_discovered.load(Ordering::Relaxed),
            binaries_resolved: c.binaries_resolved.load(Ordering::Relaxed),
            libraries_observed: c.libraries_observed.load(Ordering::Relaxed),
            edges: c.edges.load(Ordering::Relaxed),
            in_flight: c.in_flight.load(Ordering::Acquire),
        }
    }

    /// Use count for one library, if it has been observed
    pub fn uses(&self, library: &Path) -> Option<u64> {
        lock(&self.libraries)
            .get(library)
            .map(|count| count.load(Ordering::Relaxed))
    }

    /// Unordered copy of the usage map
    pub fn usage(&self) -> HashMap<PathBuf, u64> {
        lock(&self.libraries)
            .iter()
            .map(|(path, count)| (path.clone(), count.load(Ordering::Relaxed)))
            .collect()
    }

    /// Usage ranked by count descending, ties broken by path ascending
    pub fn ranked(&self) -> Vec<UsageRow> {
        let mut usage: Vec<(PathBuf, u64)> = self.usage().into_iter().collect();
        let total: u64 = usage.iter().map(|(_, uses)| uses).sum();

        usage.sort_unstable_by(|(a_path, a_uses), (b_path, b_uses)| {
            b_uses.cmp(a_uses).then_with(|| a_path.cmp(b_path))
        });

        usage
            .into_iter()
            .enumerate()
            .map(|(i, (library, uses))| UsageRow {
                rank: i + 1,
                library,
                uses,
                percent: percentage(uses, total),
            })
            .collect()
    }

    /// Binaries discovered so far, in discovery order
    pub fn binaries(&self) -> Vec<PathBuf> {
        lock(&self.binaries).clone()
    }

    /// Number of library candidates accepted for resolution
    pub fn scanned_count(&self) -> usize {
        lock(&self.scanned).len()
    }

    /// The last `n` diagnostics, oldest first
    pub fn recent_messages(&self, n: usize) -> Vec<String> {
        let log = lock(&self.messages);
        let skip = log.entries.len().saturating_sub(n);
        log.entries.iter().skip(skip).cloned().collect()
    }

    /// Number of diagnostics dropped because the log was full
    pub fn evicted_messages(&self) -> u64 {
        lock(&self.messages).evicted
    }
}

impl Default for UsageAggregate {
    fn default() -> Self {
        Self::new(crate::ScanConfig::default().message_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_claim_library_is_idempotent() {
        let agg = UsageAggregate::default();
        let path = Path::new("/usr/lib/libz.so.1");
        assert!(agg.claim_library(path));
        assert!(!agg.claim_library(path));
        assert_eq!(agg.scanned_count(), 1);
        assert_eq!(agg.progress().libraries_discovered, 1);
    }

    #[test]
    fn test_concurrent_edges_on_new_library() {
        const K: usize = 64;
        let agg = Arc::new(UsageAggregate::default());
        let handles: Vec<_> = (0..K)
            .map(|_| {
                let agg = Arc::clone(&agg);
                thread::spawn(move || agg.record_dependency(PathBuf::from("/lib/libc.so.6")))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(agg.usage().len(), 1);
        assert_eq!(agg.uses(Path::new("/lib/libc.so.6")), Some(K as u64));
        let progress = agg.progress();
        assert_eq!(progress.libraries_observed, 1);
        assert_eq!(progress.edges, K as u64);
    }

    #[test]
    fn test_concurrent_claims_admit_one_winner() {
        let agg = Arc::new(UsageAggregate::default());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let agg = Arc::clone(&agg);
                thread::spawn(move || agg.claim_library(Path::new("/lib/libm.so.6")))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_ranked_orders_by_uses_then_path() {
        let agg = UsageAggregate::default();
        for lib in ["/lib/b.so", "/lib/a.so", "/lib/c.so", "/lib/c.so"] {
            agg.record_dependency(PathBuf::from(lib));
        }

        let rows = agg.ranked();
        let order: Vec<_> = rows.iter().map(|r| r.library.to_str().unwrap()).collect();
        assert_eq!(order, ["/lib/c.so", "/lib/a.so", "/lib/b.so"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].percent, 50.0);
        assert_eq!(rows[2].percent, 25.0);
    }

    #[test]
    fn test_message_log_is_bounded() {
        let agg = UsageAggregate::new(3);
        for i in 0..5 {
            agg.report(format!("msg {i}"));
        }
        assert_eq!(agg.recent_messages(10), ["msg 2", "msg 3", "msg 4"]);
        assert_eq!(agg.recent_messages(1), ["msg 4"]);
        assert_eq!(agg.evicted_messages(), 2);
    }

    #[test]
    fn test_binary_inventory() {
        let agg = UsageAggregate::default();
        agg.record_binary(PathBuf::from("/bin/ls"));
        agg.record_binary(PathBuf::from("/bin/ls"));
        assert_eq!(agg.binaries().len(), 2);
        assert_eq!(agg.progress().binaries_discovered, 2);
    }
}
