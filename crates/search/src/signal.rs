use crate::state::Side;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio_util::sync::CancellationToken;

/// How an engine run ended; none of these are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Work-list drained
    Completed,

    /// Stopped at a checkpoint after the sibling engine finished
    Cancelled,

    /// Bottom-up admitted the target itself
    TargetReached,

    /// Bottom-up swept every tier without reaching the target
    TiersExhausted,
}

const OPEN: u8 = 0;

/// One-shot "done" broadcast shared by the two halves of a bidirectional run
///
/// Only the first engine to finish closes the signal; later `finish` calls
/// are no-ops. Workers poll [`DoneSignal::is_done`] at their checkpoints.
#[derive(Debug, Default)]
pub struct DoneSignal {
    winner: AtomicU8,
    token: CancellationToken,
}

impl DoneSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the signal on behalf of `side`
    ///
    /// Returns `true` only for the first finisher.
    pub fn finish(&self, side: Side) -> bool {
        let claimed = self
            .winner
            .compare_exchange(OPEN, side.code(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.token.cancel();
        }
        claimed
    }

    /// Non-blocking checkpoint
    #[inline]
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Suspend until the signal is closed
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub fn winner(&self) -> Option<Side> {
        Side::from_code(self.winner.load(Ordering::Acquire)).filter(|side| *side != Side::Undetermined)
    }
}
