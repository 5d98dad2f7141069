use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};

use super::coordinator::ScanCoordinator;
use super::dependency::DependencyScanner;
use super::progress::{ScanMessage, ScanPhase};
use super::resolver::DependencyResolver;
use super::walker::ScanRoot;
use crate::aggregate::UsageAggregate;
use crate::config::ScanConfig;

/// Runs one complete scan: discovery, resolution and aggregation
pub struct Scanner {
    config: ScanConfig,
    roots: Vec<ScanRoot>,
    resolver: Arc<dyn DependencyResolver>,
    aggregate: Arc<UsageAggregate>,
}

impl Scanner {
    pub fn new(config: ScanConfig, resolver: Arc<dyn DependencyResolver>) -> Self {
        let roots = config
            .library_roots
            .iter()
            .map(ScanRoot::library)
            .chain(config.binary_roots.iter().map(ScanRoot::binary))
            .collect();
        let aggregate = Arc::new(UsageAggregate::new(config.message_capacity));

        Self {
            config,
            roots,
            resolver,
            aggregate,
        }
    }

    /// Replace the roots derived from the config, e.g. to use custom filters
    pub fn with_roots(mut self, roots: Vec<ScanRoot>) -> Self {
        self.roots = roots;
        self
    }

    /// The aggregate this scan writes to; poll it for live results
    pub fn aggregate(&self) -> Arc<UsageAggregate> {
        Arc::clone(&self.aggregate)
    }

    /// Run the scan in the background.
    /// Returns a receiver for phase notifications and the scan thread handle.
    pub fn scan(self) -> (Receiver<ScanMessage>, JoinHandle<Arc<UsageAggregate>>) {
        let (tx, rx) = crossbeam_channel::unbounded();

        let handle = std::thread::spawn(move || self.scan_sync(tx));

        (rx, handle)
    }

    /// Run the scan on the current thread until it is done
    pub fn run(self) -> Arc<UsageAggregate> {
        let (tx, _rx) = crossbeam_channel::unbounded();
        self.scan_sync(tx)
    }

    fn scan_sync(self, tx: Sender<ScanMessage>) -> Arc<UsageAggregate> {
        let aggregate = self.aggregate;
        let _ = tx.send(ScanMessage::Phase(ScanPhase::Searching));
        tracing::info!(
            roots = self.roots.len(),
            workers = self.config.worker_count(),
            "scan started"
        );

        let coordinator = ScanCoordinator::new(
            self.roots,
            self.config.walk_threads,
            self.config.queue_capacity,
        );
        let (streams, search) = coordinator.start(&aggregate);

        let scanner = DependencyScanner::new(self.resolver, Arc::clone(&aggregate));
        let pool = scanner.spawn_workers(self.config.worker_count(), self.config.queue_capacity);

        // Returns once both streams are closed, i.e. every walker has finished
        scanner.dispatch(streams, &pool);
        let emitted = search.wait(&aggregate);
        tracing::debug!(emitted, "all walkers finished");
        if aggregate.advance_phase(ScanPhase::Scanning) {
            let _ = tx.send(ScanMessage::Phase(ScanPhase::Scanning));
        }

        // No more jobs can be queued past this point
        pool.finish(&aggregate);

        if aggregate.advance_phase(ScanPhase::Done) {
            let _ = tx.send(ScanMessage::Phase(ScanPhase::Done));
            let _ = tx.send(ScanMessage::Completed);
        }

        let progress = aggregate.progress();
        tracing::info!(
            libraries = progress.libraries_resolved,
            binaries = progress.binaries_resolved,
            observed = progress.libraries_observed,
            edges = progress.edges,
            "scan completed"
        );

        aggregate
    }
}
