pub mod aggregate;
pub mod canonical;
pub mod config;
pub mod error;
pub mod format;
pub mod scanner;

pub use aggregate::{UsageAggregate, UsageRow};
pub use canonical::canonicalize;
pub use config::{DEFAULT_BINARY_ROOTS, DEFAULT_LIBRARY_ROOTS, ScanConfig};
pub use error::{ResolveError, Result, ScanError};
pub use format::{format_count, format_percent, fraction, percentage};
pub use scanner::{
    Candidate, CandidateKind, DependencyResolver, LddResolver, ScanMessage, ScanPhase,
    ScanProgress, ScanRoot, Scanner,
};
