//! Fetch cycle outcomes

use std::fmt;

/// Reason recorded when a cycle is interrupted by a stop request.
pub const CANCELLED: &str = "cancelled";

/// The result of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The mirror matches the previous cycle.
    Unchanged,
    /// The mirror content may differ from the previous cycle.
    Changed,
    /// The cycle did not complete; it is retried on the next tick.
    Failed(String),
}

impl FetchOutcome {
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }

    pub fn cancelled() -> Self {
        Self::Failed(CANCELLED.to_string())
    }

    pub fn from_changed(changed: bool) -> Self {
        if changed { Self::Changed } else { Self::Unchanged }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Failed(reason) if reason == CANCELLED)
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Changed => write!(f, "changed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_a_failure() {
        let outcome = FetchOutcome::cancelled();
        assert!(outcome.is_failed());
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.to_string(), "failed: cancelled");
        assert!(!FetchOutcome::failed("timeout").is_cancelled());
    }
}
