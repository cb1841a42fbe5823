//! Runs one top-down and one bottom-up engine against the same state.
//!
//! The first engine to return closes the shared [`DoneSignal`]; the other
//! notices at its next checkpoint. Both are awaited before the caller
//! exports, and whatever the cancelled side admitted is kept.

use std::future::Future;
use std::sync::Arc;

use crafting_graph::ItemId;
use serde::Serialize;

use crate::bottom_up::BottomUpEngine;
use crate::config::SearchConfig;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::signal::{DoneSignal, Termination};
use crate::state::{SearchState, Side};
use crate::top_down::TopDownEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BidirectionalOutcome {
    pub top: Termination,
    pub bottom: Termination,

    /// Engine that closed the done signal
    pub winner: Option<Side>,
}

pub async fn run_bidirectional(
    state: Arc<SearchState>,
    target: ItemId,
    config: &SearchConfig,
    progress: ProgressSink,
) -> Result<BidirectionalOutcome> {
    let done = Arc::new(DoneSignal::new());

    let top = Arc::new(
        TopDownEngine::new(state.clone(), target, config)
            .with_progress(progress)
            .with_done(done.clone()),
    );
    let bottom = Arc::new(BottomUpEngine::new(state, target, config).with_done(done.clone()));

    let top_task = tokio::spawn(finish_on_return(top.run(), done.clone(), Side::Top));
    let bottom_task = tokio::spawn(finish_on_return(bottom.run(), done.clone(), Side::Bottom));

    let (top, bottom) = tokio::join!(top_task, bottom_task);
    let outcome = BidirectionalOutcome {
        top: top??,
        bottom: bottom??,
        winner: done.winner(),
    };
    log::info!(
        "Bidirectional search finished: top {:?}, bottom {:?}, winner {:?}",
        outcome.top,
        outcome.bottom,
        outcome.winner
    );
    Ok(outcome)
}

/// Close `done` for `side` once `run` returns, whatever the result
async fn finish_on_return<F>(run: F, done: Arc<DoneSignal>, side: Side) -> Result<Termination>
where
    F: Future<Output = Result<Termination>>,
{
    let result = run.await;
    if done.finish(side) {
        log::debug!("{side:?} side finished first");
    }
    result
}
