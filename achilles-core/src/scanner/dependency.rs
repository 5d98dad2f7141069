use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, select};

use super::coordinator::CandidateStreams;
use super::resolver::DependencyResolver;
use super::walker::{Candidate, CandidateKind};
use crate::aggregate::UsageAggregate;
use crate::canonical::canonicalize;

/// Turns candidates into dependency edges in the shared [`UsageAggregate`]
#[derive(Clone)]
pub struct DependencyScanner {
    resolver: Arc<dyn DependencyResolver>,
    aggregate: Arc<UsageAggregate>,
}

/// Fixed set of resolver workers fed through a bounded queue
pub struct WorkerPool {
    jobs: Sender<Candidate>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Close the queue and wait until every queued job has run
    pub fn finish(self, aggregate: &UsageAggregate) {
        drop(self.jobs);
        for handle in self.workers {
            if handle.join().is_err() {
                aggregate.report("resolver worker panicked");
            }
        }
    }
}

impl DependencyScanner {
    pub fn new(resolver: Arc<dyn DependencyResolver>, aggregate: Arc<UsageAggregate>) -> Self {
        Self {
            resolver,
            aggregate,
        }
    }

    /// Start `workers` threads draining a queue of `capacity` jobs
    pub fn spawn_workers(&self, workers: usize, capacity: usize) -> WorkerPool {
        let (jobs, queue) = crossbeam_channel::bounded::<Candidate>(capacity);
        let workers = (0..workers.max(1))
            .map(|_| {
                let scanner = self.clone();
                let queue: Receiver<Candidate> = queue.clone();
                std::thread::spawn(move || {
                    for candidate in queue.iter() {
                        scanner.resolve(&candidate);
                        scanner.aggregate.job_finished();
                    }
                })
            })
            .collect();

        WorkerPool { jobs, workers }
    }

    /// Consume both candidate streams until they are closed, queueing a job
    /// for every binary and for every library not seen before.
    pub fn dispatch(&self, streams: CandidateStreams, pool: &WorkerPool) {
        let CandidateStreams {
            libraries,
            binaries,
        } = streams;
        let never = crossbeam_channel::never();
        let mut libraries_open = true;
        let mut binaries_open = true;

        while libraries_open || binaries_open {
            let lib_rx = if libraries_open { &libraries } else { &never };
            let bin_rx = if binaries_open { &binaries } else { &never };

            select! {
                recv(lib_rx) -> msg => match msg {
                    Ok(candidate) => {
                        if self.aggregate.claim_library(&candidate.path) {
                            self.queue(pool, candidate);
                        }
                    }
                    Err(_) => {
                        tracing::debug!("library stream closed");
                        libraries_open = false;
                    }
                },
                recv(bin_rx) -> msg => match msg {
                    Ok(candidate) => {
                        self.aggregate.record_binary(candidate.path.clone());
                        self.queue(pool, candidate);
                    }
                    Err(_) => {
                        tracing::debug!("binary stream closed");
                        binaries_open = false;
                    }
                },
            }
        }
    }

    fn queue(&self, pool: &WorkerPool, candidate: Candidate) {
        self.aggregate.job_queued();
        if let Err(err) = pool.jobs.send(candidate) {
            // Every worker is gone; account for the job as done
            self.aggregate.job_finished();
            self.aggregate.report(format!(
                "no resolver worker left for {}",
                err.into_inner().path.display()
            ));
        }
    }

    /// Resolve one candidate and fold its dependencies into the aggregate.
    /// Always counts the candidate as resolved, whatever the outcome, even
    /// if the resolver panics.
    pub fn resolve(&self, candidate: &Candidate) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.fold_dependencies(&candidate.path)
        }));
        if outcome.is_err() {
            self.aggregate.report(format!(
                "resolver panicked on {}",
                candidate.path.display()
            ));
        }
        match candidate.kind {
            CandidateKind::Library => self.aggregate.finish_library(),
            CandidateKind::Binary => self.aggregate.finish_binary(),
        }
    }

    fn fold_dependencies(&self, path: &Path) {
        // ldd mis-parses arguments containing spaces
        if path.to_string_lossy().contains(' ') {
            tracing::debug!(path = %path.display(), "skipping path with a space");
            return;
        }

        let dependencies = match self.resolver.resolve(path) {
            Ok(deps) => deps,
            Err(err) if err.is_not_applicable() => {
                tracing::trace!(path = %path.display(), "not dynamically linked");
                return;
            }
            Err(err) => {
                self.aggregate.report(err.to_string());
                return;
            }
        };

        for dependency in dependencies {
            match canonicalize(&dependency) {
                Ok(library) => self.aggregate.record_dependency(library),
                Err(err) if err.is_benign() => {}
                Err(err) => self.aggregate.report(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Resolver answering from a fixed table and recording every call
    #[derive(Default)]
    struct TableResolver {
        table: HashMap<PathBuf, Vec<PathBuf>>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl DependencyResolver for TableResolver {
        fn resolve(&self, path: &Path) -> Result<Vec<PathBuf>, ResolveError> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            self.table
                .get(path)
                .cloned()
                .ok_or_else(|| ResolveError::NotDynamic(path.to_path_buf()))
        }
    }

    fn scanner_with(resolver: TableResolver) -> (DependencyScanner, Arc<TableResolver>) {
        let resolver = Arc::new(resolver);
        let scanner = DependencyScanner::new(
            Arc::clone(&resolver) as Arc<dyn DependencyResolver>,
            Arc::new(UsageAggregate::default()),
        );
        (scanner, resolver)
    }

    #[test]
    fn test_space_in_path_is_skipped() {
        let (scanner, resolver) = scanner_with(TableResolver::default());
        scanner.resolve(&Candidate {
            path: PathBuf::from("/opt/My App/bin/app"),
            kind: CandidateKind::Binary,
        });

        assert!(resolver.calls.lock().unwrap().is_empty());
        assert!(scanner.aggregate.usage().is_empty());
        assert_eq!(scanner.aggregate.progress().binaries_resolved, 1);
    }

    #[test]
    fn test_failed_resolution_still_counts() {
        let (scanner, resolver) = scanner_with(TableResolver::default());
        scanner.resolve(&Candidate {
            path: PathBuf::from("/bin/static"),
            kind: CandidateKind::Binary,
        });

        assert_eq!(resolver.calls.lock().unwrap().len(), 1);
        assert!(scanner.aggregate.usage().is_empty());
        assert_eq!(scanner.aggregate.progress().binaries_resolved, 1);
        assert!(scanner.aggregate.recent_messages(1).is_empty());
    }

    struct CrashingResolver;

    impl DependencyResolver for CrashingResolver {
        fn resolve(&self, path: &Path) -> Result<Vec<PathBuf>, ResolveError> {
            panic!("cannot parse {}", path.display());
        }
    }

    #[test]
    fn test_resolver_panic_is_contained() {
        let scanner = DependencyScanner::new(
            Arc::new(CrashingResolver),
            Arc::new(UsageAggregate::default()),
        );
        scanner.resolve(&Candidate {
            path: PathBuf::from("/lib/libweird.so"),
            kind: CandidateKind::Library,
        });

        assert_eq!(scanner.aggregate.progress().libraries_resolved, 1);
        let log = scanner.aggregate.recent_messages(10);
        assert_eq!(log, ["resolver panicked on /lib/libweird.so"]);
    }

    #[test]
    fn test_missing_dependency_skips_only_that_edge() {
        let temp = TempDir::new().unwrap();
        let lib = temp.path().join("libok.so");
        fs::write(&lib, b"").unwrap();
        let bin = PathBuf::from("/bin/app");

        let mut resolver = TableResolver::default();
        resolver
            .table
            .insert(bin.clone(), vec![temp.path().join("libgone.so"), lib.clone()]);
        let (scanner, _) = scanner_with(resolver);

        scanner.resolve(&Candidate {
            path: bin,
            kind: CandidateKind::Binary,
        });

        let usage = scanner.aggregate.usage();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[&canonicalize(&lib).unwrap()], 1);
    }

    #[test]
    fn test_fold_is_order_independent() {
        let temp = TempDir::new().unwrap();
        let libs: Vec<PathBuf> = ["liba.so", "libb.so", "libc.so"]
            .iter()
            .map(|name| {
                let path = temp.path().join(name);
                fs::write(&path, b"").unwrap();
                path
            })
            .collect();

        let mut table = HashMap::new();
        table.insert(PathBuf::from("/bin/one"), vec![libs[0].clone(), libs[1].clone()]);
        table.insert(PathBuf::from("/bin/two"), vec![libs[1].clone(), libs[2].clone()]);
        table.insert(PathBuf::from("/bin/three"), vec![libs[0].clone()]);

        let candidates: Vec<Candidate> = ["/bin/one", "/bin/two", "/bin/three"]
            .iter()
            .map(|p| Candidate {
                path: PathBuf::from(p),
                kind: CandidateKind::Binary,
            })
            .collect();

        let run = |order: &[usize]| {
            let (scanner, _) = scanner_with(TableResolver {
                table: table.clone(),
                ..Default::default()
            });
            for &i in order {
                scanner.resolve(&candidates[i]);
            }
            scanner.aggregate.usage()
        };

        let expected = run([0, 1, 2].as_slice());
        for order in [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            assert_eq!(run(order.as_slice()), expected);
        }
    }
}
