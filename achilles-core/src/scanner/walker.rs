use std::fs::Metadata;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use jwalk::WalkDir;

use crate::aggregate::UsageAggregate;
use crate::canonical::canonicalize;

/// Decides whether a (canonical) path is a candidate. Gets the metadata of
/// the resolved file, never of a symlink.
pub type CandidateFilter = fn(&Path, &Metadata) -> bool;

/// Which stream a candidate belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Library,
    Binary,
}

/// A discovered file, canonical and tagged with its origin stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

/// A directory to walk, plus how to classify what is found in it
#[derive(Debug, Clone)]
pub struct ScanRoot {
    pub path: PathBuf,
    pub kind: CandidateKind,
    pub filter: CandidateFilter,
}

impl ScanRoot {
    pub fn library(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: CandidateKind::Library,
            filter: is_candidate_library,
        }
    }

    pub fn binary(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: CandidateKind::Binary,
            filter: is_candidate_executable,
        }
    }

    pub fn with_filter(mut self, filter: CandidateFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// `libfoo.so` or versioned `libfoo.so.1.2`
pub fn is_candidate_library(path: &Path, _metadata: &Metadata) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| name.ends_with(".so") || name.contains(".so."))
}

/// Any non-directory with at least one execute bit
pub fn is_candidate_executable(_path: &Path, metadata: &Metadata) -> bool {
    !metadata.is_dir() && metadata.permissions().mode() & 0o111 != 0
}

/// Recursively enumerates one [`ScanRoot`]
pub struct DirectoryWalker {
    root: ScanRoot,
    /// Threads in this walker's own rayon pool (0 = rayon's default size)
    threads: usize,
}

impl DirectoryWalker {
    pub fn new(root: ScanRoot, threads: usize) -> Self {
        Self { root, threads }
    }

    /// Walk the root and send every matching canonical path to `tx`.
    ///
    /// Takes the sender by value: dropping it when the walk ends is how this
    /// walker signals completion to the stream. Returns the number of
    /// candidates emitted.
    pub fn walk(self, tx: Sender<Candidate>, aggregate: &UsageAggregate) -> usize {
        let root_path = match canonicalize(&self.root.path) {
            Ok(p) => p,
            Err(e) => {
                if e.is_benign() {
                    tracing::debug!(root = %self.root.path.display(), "scan root does not exist");
                } else {
                    aggregate.report(e.to_string());
                }
                return 0;
            }
        };

        tracing::debug!(root = %root_path.display(), kind = ?self.root.kind, "walking");

        // Walkers run concurrently, one per root. A shared rayon pool can be
        // too busy to start a walk, which jwalk reports by aborting it.
        let walker = WalkDir::new(&root_path)
            .skip_hidden(false)
            .follow_links(false)
            .sort(false)
            .parallelism(jwalk::Parallelism::RayonNewPool(self.threads));

        let mut emitted = 0;
        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) if err.is_busy() || err.depth() == 0 => {
                    aggregate.report(format!("walking {}: {err}", root_path.display()));
                    continue;
                }
                // Unreadable subdirectories and vanished entries are expected
                Err(err) => {
                    tracing::debug!(root = %root_path.display(), error = %err, "skipping entry");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let canonical = match canonicalize(&path) {
                Ok(p) => p,
                Err(e) => {
                    if !e.is_benign() {
                        aggregate.report(e.to_string());
                    }
                    continue;
                }
            };

            if canonical == root_path {
                continue;
            }

            // Symlinks are classified by what they point at
            let Ok(metadata) = std::fs::metadata(&canonical) else {
                continue;
            };
            if metadata.is_dir() || !(self.root.filter)(&canonical, &metadata) {
                continue;
            }

            let candidate = Candidate {
                path: canonical,
                kind: self.root.kind,
            };
            if tx.send(candidate).is_err() {
                // Consumer is gone; nothing left to do
                break;
            }
            emitted += 1;
        }

        tracing::debug!(root = %root_path.display(), emitted, "walk finished");
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_executable(path: &Path) {
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    fn collect(root: ScanRoot) -> (Vec<PathBuf>, UsageAggregate) {
        let aggregate = UsageAggregate::default();
        let (tx, rx) = crossbeam_channel::unbounded();
        let emitted = DirectoryWalker::new(root, 0).walk(tx, &aggregate);
        let mut paths: Vec<_> = rx.iter().map(|c| c.path).collect();
        assert_eq!(paths.len(), emitted);
        paths.sort();
        (paths, aggregate)
    }

    #[test]
    fn test_library_filter() {
        let meta = fs::metadata(".").unwrap();
        assert!(is_candidate_library(Path::new("/lib/libz.so"), &meta));
        assert!(is_candidate_library(Path::new("/lib/libz.so.1.3"), &meta));
        assert!(!is_candidate_library(Path::new("/lib/libz.a"), &meta));
        assert!(!is_candidate_library(Path::new("/lib/libsomething.sox"), &meta));
    }

    #[test]
    fn test_walk_libraries() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("liba.so"), b"").unwrap();
        fs::write(temp.path().join("nested/libb.so.2"), b"").unwrap();
        fs::write(temp.path().join("readme.txt"), b"").unwrap();

        let (paths, aggregate) = collect(ScanRoot::library(temp.path()));
        let root = canonicalize(temp.path()).unwrap();
        assert_eq!(paths, [root.join("liba.so"), root.join("nested/libb.so.2")]);
        assert!(aggregate.recent_messages(10).is_empty());
    }

    #[test]
    fn test_walk_binaries_requires_exec_bit() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("tool"), b"").unwrap();
        make_executable(&temp.path().join("tool"));
        fs::write(temp.path().join("data"), b"").unwrap();
        fs::create_dir(temp.path().join("subdir")).unwrap();

        let (paths, _) = collect(ScanRoot::binary(temp.path()));
        let root = canonicalize(temp.path()).unwrap();
        assert_eq!(paths, [root.join("tool")]);
    }

    #[test]
    fn test_symlinks_are_canonicalized() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("libreal.so.1"), b"").unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("libreal.so.1"),
            temp.path().join("libreal.so"),
        )
        .unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.so"), temp.path().join("broken.so"))
            .unwrap();

        let (paths, aggregate) = collect(ScanRoot::library(temp.path()));
        let real = canonicalize(temp.path().join("libreal.so.1")).unwrap();
        assert_eq!(paths, [real.clone(), real]);
        // The dangling link is silently dropped
        assert!(aggregate.recent_messages(10).is_empty());
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let (paths, aggregate) = collect(ScanRoot::library(temp.path().join("absent")));
        assert!(paths.is_empty());
        assert!(aggregate.recent_messages(10).is_empty());
    }

    #[test]
    fn test_custom_filter() {
        fn only_txt(path: &Path, _: &Metadata) -> bool {
            path.extension().is_some_and(|ext| ext == "txt")
        }

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), b"").unwrap();
        fs::write(temp.path().join("b.so"), b"").unwrap();

        let (paths, _) = collect(ScanRoot::library(temp.path()).with_filter(only_txt));
        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("a.txt"));
    }
}
