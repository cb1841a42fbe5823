//! Request-level entry point: validate, search, export.

use std::sync::Arc;

use crafting_graph::{Catalog, ItemId};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::bidirectional::{run_bidirectional, BidirectionalOutcome};
use crate::config::{SearchConfig, SearchMode};
use crate::error::{Result, SearchError};
use crate::export::{export, ExportElement};
use crate::progress::ProgressSink;
use crate::signal::Termination;
use crate::state::{SearchState, SearchStats};
use crate::top_down::TopDownEngine;

/// Buffered snapshots before the forwarder waits on the consumer
const SNAPSHOT_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunOutcome {
    TopDown { termination: Termination },
    Bidirectional(BidirectionalOutcome),
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub tree: Option<ExportElement>,
    pub stats: SearchStats,
    pub outcome: RunOutcome,
}

/// Intermediate or final tree of a streamed search
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Tier of the item whose expansion triggered this snapshot
    pub depth: u32,
    pub tree: Option<ExportElement>,
    pub is_final: bool,
}

/// Runs searches against one immutable catalog
///
/// Every call gets its own [`SearchState`], so concurrent requests never
/// share admissions or quota.
#[derive(Debug, Clone)]
pub struct Solver {
    catalog: Arc<Catalog>,
}

impl Solver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub async fn solve(&self, target: &str, config: &SearchConfig) -> Result<Solution> {
        let root = self.prepare(target, config)?;
        let state = Arc::new(SearchState::new(self.catalog.clone(), config.recipe_limit));

        let outcome = run_mode(state.clone(), root, config.clone(), ProgressSink::disabled()).await?;

        let tree = export(&self.catalog, &state.snapshot(), root);
        let stats = state.stats();
        log::info!(
            "Solved {target}: {} items, {} recipes",
            stats.items_admitted,
            stats.recipes_chosen
        );
        Ok(Solution {
            tree,
            stats,
            outcome,
        })
    }

    /// Start a search and stream a snapshot per expanded item
    ///
    /// Validation errors are returned before anything is spawned. The last
    /// message has `is_final` set and is sent after the search has fully
    /// finished. Dropping the receiver stops the snapshots; the search itself
    /// runs to completion in the background.
    pub fn stream(&self, target: &str, config: &SearchConfig) -> Result<mpsc::Receiver<Snapshot>> {
        let root = self.prepare(target, config)?;
        let state = Arc::new(SearchState::new(self.catalog.clone(), config.recipe_limit));
        let (progress, mut events) = ProgressSink::channel();
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);

        let run = tokio::spawn(run_mode(state.clone(), root, config.clone(), progress));

        let catalog = self.catalog.clone();
        let delay = config.snapshot_delay;
        tokio::spawn(async move {
            // Closes once the engines (and their progress sinks) are dropped.
            while let Some(event) = events.recv().await {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let snapshot = Snapshot {
                    depth: event.tier,
                    tree: export(&catalog, &state.snapshot(), root),
                    is_final: false,
                };
                if tx.send(snapshot).await.is_err() {
                    log::debug!("Snapshot receiver dropped");
                    return;
                }
            }

            match run.await {
                Ok(Ok(outcome)) => log::debug!("Streamed search finished: {outcome:?}"),
                Ok(Err(err)) => log::warn!("Streamed search failed: {err}"),
                Err(err) => log::warn!("Streamed search task failed: {err}"),
            }

            let last = Snapshot {
                depth: catalog.tier(root),
                tree: export(&catalog, &state.snapshot(), root),
                is_final: true,
            };
            let _ = tx.send(last).await;
        });

        Ok(rx)
    }

    /// Checks that must pass before any concurrent work starts
    fn prepare(&self, target: &str, config: &SearchConfig) -> Result<ItemId> {
        config.validate()?;
        self.catalog
            .lookup(target)
            .ok_or_else(|| SearchError::UnknownItem(target.to_string()))
    }
}

async fn run_mode(
    state: Arc<SearchState>,
    root: ItemId,
    config: SearchConfig,
    progress: ProgressSink,
) -> Result<RunOutcome> {
    match config.mode {
        SearchMode::TopDown => {
            let engine = Arc::new(TopDownEngine::new(state, root, &config).with_progress(progress));
            let termination = engine.run().await?;
            Ok(RunOutcome::TopDown { termination })
        }
        SearchMode::Bidirectional => {
            let outcome = run_bidirectional(state, root, &config, progress).await?;
            Ok(RunOutcome::Bidirectional(outcome))
        }
    }
}
