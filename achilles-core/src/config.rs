use std::path::PathBuf;

/// Directories searched for shared libraries by default
pub const DEFAULT_LIBRARY_ROOTS: &[&str] = &[
    "/lib",
    "/lib32",
    "/usr/lib",
    "/usr/lib32",
    "/usr/local/lib",
    "/usr/local/lib32",
];

/// Directories searched for executables by default
pub const DEFAULT_BINARY_ROOTS: &[&str] = &[
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/local/bin",
    "/usr/local/sbin",
];

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Roots walked for library candidates
    pub library_roots: Vec<PathBuf>,
    /// Roots walked for binary candidates
    pub binary_roots: Vec<PathBuf>,
    /// Number of resolver worker threads (0 = auto)
    pub workers: usize,
    /// Capacity of the queue between the dispatcher and the workers
    pub queue_capacity: usize,
    /// Threads in each walker's own pool (0 = rayon default size)
    pub walk_threads: usize,
    /// Maximum number of diagnostic messages retained
    pub message_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            library_roots: DEFAULT_LIBRARY_ROOTS.iter().map(PathBuf::from).collect(),
            binary_roots: DEFAULT_BINARY_ROOTS.iter().map(PathBuf::from).collect(),
            workers: 0, // auto
            queue_capacity: 1024,
            walk_threads: 0,
            message_capacity: 500,
        }
    }
}

impl ScanConfig {
    /// Effective size of the resolver worker pool
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}
