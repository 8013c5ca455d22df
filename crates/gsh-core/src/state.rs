//! Batch state machine types

/// States of one batch run
///
/// `Dispatching -> Collecting -> {Completed, TimedOut}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Dispatching,
    Collecting,
    Completed,
    TimedOut,
}

impl BatchState {
    /// Check whether moving to `next` is allowed
    #[must_use]
    pub fn can_transition_to(self, next: BatchState) -> bool {
        matches!(
            (self, next),
            (BatchState::Dispatching, BatchState::Collecting)
                | (
                    BatchState::Collecting,
                    BatchState::Completed | BatchState::TimedOut
                )
        )
    }

    /// No further transitions possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Completed | BatchState::TimedOut)
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BatchState::Dispatching => "dispatching",
            BatchState::Collecting => "collecting",
            BatchState::Completed => "completed",
            BatchState::TimedOut => "timed_out",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(BatchState::Dispatching.can_transition_to(BatchState::Collecting));
        assert!(BatchState::Collecting.can_transition_to(BatchState::Completed));
        assert!(BatchState::Collecting.can_transition_to(BatchState::TimedOut));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!BatchState::Dispatching.can_transition_to(BatchState::Completed));
        assert!(!BatchState::Completed.can_transition_to(BatchState::Collecting));
        assert!(!BatchState::TimedOut.can_transition_to(BatchState::Completed));
        assert!(!BatchState::Collecting.can_transition_to(BatchState::Dispatching));
    }

    #[test]
    fn test_terminal_states() {
        assert!(BatchState::Completed.is_terminal());
        assert!(BatchState::TimedOut.is_terminal());
        assert!(!BatchState::Collecting.is_terminal());
    }
}
