use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Coarse scan state. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScanPhase {
    /// Directory walkers are still discovering candidates
    Searching,
    /// All walkers finished, resolver jobs still running
    Scanning,
    /// Every resolver job has completed
    Done,
}

impl ScanPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Searching,
            1 => Self::Scanning,
            _ => Self::Done,
        }
    }

    fn predecessor(self) -> Option<Self> {
        match self {
            Self::Searching => None,
            Self::Scanning => Some(Self::Searching),
            Self::Done => Some(Self::Scanning),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Searching => "Searching",
            Self::Scanning => "Scanning",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Atomic holder for the current [`ScanPhase`]
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(ScanPhase::Searching as u8))
    }

    pub(crate) fn get(&self) -> ScanPhase {
        ScanPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if the current phase is its direct predecessor.
    /// Returns true only for the call that performed the transition.
    pub(crate) fn advance(&self, next: ScanPhase) -> bool {
        let Some(prev) = next.predecessor() else {
            return false;
        };
        self.0
            .compare_exchange(prev as u8, next as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Notification sent by the scanner as the scan progresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMessage {
    /// The phase changed
    Phase(ScanPhase),
    /// Scan completed; sent once, after `Phase(Done)`
    Completed,
}

/// Point-in-time copy of the scan counters.
///
/// Each field is read separately, so fields may be mutually inconsistent
/// while the scan is running (e.g. a grown denominator with a stale numerator).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanProgress {
    /// Library candidates accepted for resolution
    pub libraries_discovered: u64,
    /// Library candidates whose resolution finished
    pub libraries_resolved: u64,
    /// Binary candidates discovered
    pub binaries_discovered: u64,
    /// Binary candidates whose resolution finished
    pub binaries_resolved: u64,
    /// Distinct libraries seen as a dependency of something
    pub libraries_observed: u64,
    /// Total dependency edges folded into the aggregate
    pub edges: u64,
    /// Resolver jobs queued but not yet finished
    pub in_flight: u64,
}

impl ScanProgress {
    pub fn total_discovered(&self) -> u64 {
        self.libraries_discovered + self.binaries_discovered
    }

    pub fn total_resolved(&self) -> u64 {
        self.libraries_resolved + self.binaries_resolved
    }

    /// Overall completion in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        crate::format::fraction(self.total_resolved(), self.total_discovered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_moves_forward_once() {
        let cell = PhaseCell::new();
        assert_eq!(cell.get(), ScanPhase::Searching);

        assert!(!cell.advance(ScanPhase::Done));
        assert!(cell.advance(ScanPhase::Scanning));
        assert!(!cell.advance(ScanPhase::Scanning));
        assert!(!cell.advance(ScanPhase::Searching));
        assert_eq!(cell.get(), ScanPhase::Scanning);

        assert!(cell.advance(ScanPhase::Done));
        assert!(!cell.advance(ScanPhase::Done));
        assert_eq!(cell.get(), ScanPhase::Done);
    }

    #[test]
    fn test_progress_fraction() {
        let progress = ScanProgress {
            libraries_discovered: 3,
            libraries_resolved: 1,
            binaries_discovered: 1,
            binaries_resolved: 1,
            ..Default::default()
        };
        assert_eq!(progress.total_discovered(), 4);
        assert_eq!(progress.fraction(), 0.5);
        assert_eq!(ScanProgress::default().fraction(), 0.0);
    }
}
