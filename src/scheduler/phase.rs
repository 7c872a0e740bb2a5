//! Session lifecycle phase.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a session is in its lifecycle.
///
/// `Idle → Armed` on `init`, `Armed → Running` on `start`, `Running → Ended`
/// on `stop` or when the end beat is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No session.
    #[default]
    Idle,
    /// Session loaded, not ticking.
    Armed,
    /// Ticking and emitting.
    Running,
    /// Stopped or finished. Needs `start` (or `seek` then `start`) to play again.
    Ended,
}

impl Phase {
    /// Whether `start` is accepted in this phase.
    pub fn can_start(self) -> bool {
        matches!(self, Phase::Armed | Phase::Ended)
    }

    /// Whether `seek` is accepted in this phase.
    pub fn can_seek(self) -> bool {
        matches!(self, Phase::Armed | Phase::Running | Phase::Ended)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Armed => "armed",
            Phase::Running => "running",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert_eq!(Phase::default(), Phase::Idle);
    }

    #[test]
    fn start_acceptance() {
        assert!(!Phase::Idle.can_start());
        assert!(Phase::Armed.can_start());
        assert!(!Phase::Running.can_start());
        assert!(Phase::Ended.can_start());
    }

    #[test]
    fn seek_acceptance() {
        assert!(!Phase::Idle.can_seek());
        assert!(Phase::Armed.can_seek());
        assert!(Phase::Running.can_seek());
        assert!(Phase::Ended.can_seek());
    }

    #[test]
    fn display_matches_serde() {
        for phase in [Phase::Idle, Phase::Armed, Phase::Running, Phase::Ended] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(json, format!("\"{phase}\""));
        }
    }
}
