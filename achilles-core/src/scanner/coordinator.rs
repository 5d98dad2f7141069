use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use super::walker::{Candidate, CandidateKind, DirectoryWalker, ScanRoot};
use crate::aggregate::UsageAggregate;

/// Receiving ends of the two candidate streams
pub struct CandidateStreams {
    pub libraries: Receiver<Candidate>,
    pub binaries: Receiver<Candidate>,
}

/// Join handle over every walker of both streams
pub struct SearchHandle {
    walkers: Vec<(ScanRoot, JoinHandle<usize>)>,
}

impl SearchHandle {
    /// Block until every walker has finished. Returns the total number of
    /// candidates emitted.
    pub fn wait(self, aggregate: &UsageAggregate) -> usize {
        let mut total = 0;
        for (root, handle) in self.walkers {
            match handle.join() {
                Ok(emitted) => total += emitted,
                Err(_) => aggregate.report(format!(
                    "walker for {} panicked",
                    root.path.display()
                )),
            }
        }
        total
    }
}

/// Fans out one [`DirectoryWalker`] per root into the library and binary
/// streams
pub struct ScanCoordinator {
    roots: Vec<ScanRoot>,
    walk_threads: usize,
    capacity: usize,
}

impl ScanCoordinator {
    pub fn new(roots: Vec<ScanRoot>, walk_threads: usize, capacity: usize) -> Self {
        Self {
            roots,
            walk_threads,
            capacity,
        }
    }

    /// Spawn all walkers.
    ///
    /// Each walker owns a clone of its stream's sender, so a stream
    /// disconnects exactly when its last walker finishes (or immediately if
    /// it has no roots).
    pub fn start(self, aggregate: &Arc<UsageAggregate>) -> (CandidateStreams, SearchHandle) {
        let (lib_tx, lib_rx) = crossbeam_channel::bounded(self.capacity);
        let (bin_tx, bin_rx) = crossbeam_channel::bounded(self.capacity);

        let walkers = self
            .roots
            .into_iter()
            .map(|root| {
                let tx: Sender<Candidate> = match root.kind {
                    CandidateKind::Library => lib_tx.clone(),
                    CandidateKind::Binary => bin_tx.clone(),
                };
                let aggregate = Arc::clone(aggregate);
                let walker = DirectoryWalker::new(root.clone(), self.walk_threads);
                let handle = std::thread::spawn(move || walker.walk(tx, &aggregate));
                (root, handle)
            })
            .collect();

        // Only walkers hold senders from here on
        drop(lib_tx);
        drop(bin_tx);

        (
            CandidateStreams {
                libraries: lib_rx,
                binaries: bin_rx,
            },
            SearchHandle { walkers },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_streams_close_after_walkers() {
        let libs_a = TempDir::new().unwrap();
        let libs_b = TempDir::new().unwrap();
        fs::write(libs_a.path().join("liba.so"), b"").unwrap();
        fs::write(libs_b.path().join("libb.so.1"), b"").unwrap();

        let aggregate = Arc::new(UsageAggregate::default());
        let coordinator = ScanCoordinator::new(
            vec![ScanRoot::library(libs_a.path()), ScanRoot::library(libs_b.path())],
            0,
            1,
        );
        let (streams, search) = coordinator.start(&aggregate);

        // Iteration ends only once both walkers have dropped their senders
        let libraries: Vec<_> = streams.libraries.iter().collect();
        assert_eq!(libraries.len(), 2);
        assert!(libraries.iter().all(|c| c.kind == CandidateKind::Library));

        // No binary roots: that stream is closed from the start
        assert!(streams.binaries.recv().is_err());
        assert_eq!(search.wait(&aggregate), 2);
    }

    #[test]
    fn test_no_roots() {
        let aggregate = Arc::new(UsageAggregate::default());
        let (streams, search) = ScanCoordinator::new(Vec::new(), 0, 4).start(&aggregate);
        assert!(streams.libraries.recv().is_err());
        assert!(streams.binaries.recv().is_err());
        assert_eq!(search.wait(&aggregate), 0);
    }
}
