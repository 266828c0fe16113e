//! Per-block progress tracking.

use tracing::*;

/// Where a block call is.  Phases only move forward.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlockPhase {
    Analyzing,
    Leveled { levels: usize },
    Executing(usize),
    Merging(usize),
    Done,

    /// Stopped early, on gas exhaustion or a fatal error.
    Halted,
}

impl BlockPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Halted)
    }

    pub fn can_advance_to(&self, next: &BlockPhase) -> bool {
        use BlockPhase::*;
        match (self, next) {
            (Done | Halted, _) => false,
            (_, Halted) => true,
            (Analyzing, Leveled { .. }) => true,
            (Leveled { .. }, Executing(_) | Done) => true,
            (Executing(i), Merging(j)) => i == j,
            (Merging(i), Executing(j)) => j > i,
            (Merging(_), Done) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct PhaseTracker {
    phase: BlockPhase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            phase: BlockPhase::Analyzing,
        }
    }

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    pub fn advance(&mut self, next: BlockPhase) {
        let ok = self.phase.can_advance_to(&next);
        debug_assert!(ok, "bad block phase transition {:?} -> {next:?}", self.phase);
        if !ok {
            warn!(from = ?self.phase, to = ?next, "unexpected block phase transition");
        }
        trace!(from = ?self.phase, to = ?next, "block phase");
        self.phase = next;
    }
}
