//! Decision trace
//!
//! Every evaluation returns the structured reasons a bar did or did not
//! produce a signal, so callers can log, assert on, or aggregate them instead
//! of grepping log lines.

use crate::session::SessionId;
use crate::types::{SetupKind, Signal};

/// Why a matcher rejected the current bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Not enough prior bars for the pattern's lookback
    InsufficientHistory,
    /// No qualifying price pattern on this bar
    NoPattern,
    /// Second entry requires a recorded first entry
    NoPriorEntry,
    /// Bar never touched the decision zone
    PriceOutsideZone,
    /// Move from the first entry below the minimum
    MoveTooSmall,
    /// Pullback from the first entry too shallow
    PullbackInsufficient,
    /// Bar volume below the session spike threshold
    VolumeBelowThreshold,
    /// Candle direction disagrees with the setup
    BearishClose,
}

/// One step of a bar evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// Bar time falls in no configured session window
    OutsideSessions,
    /// Session already has its one trade for the day
    SessionLocked(SessionId),
    /// Profile landmarks absent for the session
    ProfileUnavailable(SessionId),
    /// ATR still warming up
    AtrUnavailable,
    Rejected {
        session: SessionId,
        setup: SetupKind,
        reason: RejectReason,
    },
    Matched {
        session: SessionId,
        setup: SetupKind,
    },
}

/// Outcome of evaluating one bar: at most one signal, plus the full trace
#[derive(Debug, Default)]
pub struct SignalEvaluation {
    pub signal: Option<Signal>,
    pub trace: Vec<TraceEvent>,
}

impl SignalEvaluation {
    pub fn rejected_for(&self, reason: RejectReason) -> bool {
        self.trace.iter().any(
            |e| matches!(e, TraceEvent::Rejected { reason: r, .. } if *r == reason),
        )
    }
}
