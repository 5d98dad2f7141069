mod coordinator;
mod dependency;
mod pipeline;
mod progress;
mod resolver;
mod walker;

pub use coordinator::{CandidateStreams, ScanCoordinator, SearchHandle};
pub use dependency::{DependencyScanner, WorkerPool};
pub use pipeline::Scanner;
pub(crate) use progress::PhaseCell;
pub use progress::{ScanMessage, ScanPhase, ScanProgress};
pub use resolver::{DependencyResolver, LddResolver, parse_ldd_output};
pub use walker::{
    Candidate, CandidateFilter, CandidateKind, DirectoryWalker, ScanRoot, is_candidate_executable,
    is_candidate_library,
};
