/// URL lifecycle definitions for the frontier
///
/// This module defines every state a detail-page URL can be in during a run.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a detail URL in the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlState {
    // ===== Active States =====
    /// URL has been sighted by listing discovery
    Discovered,

    /// URL sits in the worklist waiting for a worker
    Queued,

    /// A worker has claimed the URL and is fetching it
    Fetching,

    // ===== Terminal States =====
    /// A record was produced for the URL
    Done,

    /// The URL could not be fetched or yielded no usable record
    Failed,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if a worker may claim a URL in this state
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Discovered | Self::Queued)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// The only legal paths are Discovered -> Queued -> Fetching -> Done|Failed,
    /// with Discovered -> Fetching allowed for entries claimed before queueing.
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Queued)
                | (Self::Discovered, Self::Fetching)
                | (Self::Queued, Self::Fetching)
                | (Self::Fetching, Self::Done)
                | (Self::Fetching, Self::Failed)
        )
    }

    /// Short lowercase label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible URL states
    pub fn all_states() -> [Self; 5] {
        [
            Self::Discovered,
            Self::Queued,
            Self::Fetching,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detail-page URL known to the frontier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlEntry {
    /// Canonical URL, the frontier key
    pub url: String,

    /// Current lifecycle state
    pub state: UrlState,

    /// Number of times a worker claimed this URL
    pub attempts: u32,

    /// Reason of the last failure, if any
    pub last_error: Option<String>,
}

impl UrlEntry {
    /// Creates a freshly discovered entry
    pub fn discovered(url: String) -> Self {
        Self {
            url,
            state: UrlState::Discovered,
            attempts: 0,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!UrlState::Discovered.is_terminal());
        assert!(!UrlState::Queued.is_terminal());
        assert!(!UrlState::Fetching.is_terminal());
        assert!(UrlState::Done.is_terminal());
        assert!(UrlState::Failed.is_terminal());
    }

    #[test]
    fn test_is_claimable() {
        assert!(UrlState::Discovered.is_claimable());
        assert!(UrlState::Queued.is_claimable());
        assert!(!UrlState::Fetching.is_claimable());
        assert!(!UrlState::Done.is_claimable());
        assert!(!UrlState::Failed.is_claimable());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(UrlState::Discovered.can_transition_to(UrlState::Queued));
        assert!(UrlState::Queued.can_transition_to(UrlState::Fetching));
        assert!(UrlState::Fetching.can_transition_to(UrlState::Done));
        assert!(UrlState::Fetching.can_transition_to(UrlState::Failed));
    }

    #[test]
    fn test_terminal_states_never_leave() {
        for terminal in [UrlState::Done, UrlState::Failed] {
            for next in UrlState::all_states() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} should be illegal",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_cannot_finish_without_fetching() {
        assert!(!UrlState::Queued.can_transition_to(UrlState::Done));
        assert!(!UrlState::Discovered.can_transition_to(UrlState::Failed));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", UrlState::Discovered), "discovered");
        assert_eq!(format!("{}", UrlState::Done), "done");
    }

    #[test]
    fn test_new_entry() {
        let entry = UrlEntry::discovered("https://example.com/course/a".to_string());
        assert_eq!(entry.state, UrlState::Discovered);
        assert_eq!(entry.attempts, 0);
        assert!(entry.last_error.is_none());
    }
}
