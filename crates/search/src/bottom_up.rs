//! Bottom-up expansion from the base items toward the target.
//!
//! The tiered sweep processes result tiers strictly in order. Each tier's
//! candidate recipes are split across a small worker pool; admitted results
//! are published on a bounded channel that is drained while the workers run
//! and until it has been quiet for `drain_idle`.

use std::sync::Arc;
use std::time::Duration;

use crafting_graph::{ItemId, RecipeId};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::{BottomUpStrategy, SearchConfig};
use crate::error::Result;
use crate::signal::{DoneSignal, Termination};
use crate::state::{SearchState, Side};

pub struct BottomUpEngine {
    state: Arc<SearchState>,
    target: ItemId,
    strategy: BottomUpStrategy,
    workers: usize,
    result_capacity: usize,
    drain_idle: Duration,
    done: Option<Arc<DoneSignal>>,
}

impl BottomUpEngine {
    pub fn new(state: Arc<SearchState>, target: ItemId, config: &SearchConfig) -> Self {
        Self {
            state,
            target,
            strategy: config.bottom_up,
            workers: config.bottom_up_workers.max(1),
            result_capacity: config.result_capacity.max(1),
            drain_idle: config.drain_idle,
            done: None,
        }
    }

    pub fn with_done(mut self, done: Arc<DoneSignal>) -> Self {
        self.done = Some(done);
        self
    }

    pub async fn run(self: Arc<Self>) -> Result<Termination> {
        let target_name = self.state.catalog().name(self.target).to_string();
        log::info!("Bottom-up search for {target_name} ({:?})", self.strategy);

        let termination = match self.strategy {
            BottomUpStrategy::Tiered => self.run_tiered().await,
            BottomUpStrategy::DepthFirst => {
                let engine = Arc::clone(&self);
                tokio::task::spawn_blocking(move || engine.run_depth_first()).await?
            }
        };

        log::info!("Bottom-up search for {target_name} finished: {termination:?}");
        Ok(termination)
    }

    /// Admit every base item on the bottom side
    fn seed(&self) -> Vec<ItemId> {
        let bases = self.state.catalog().base_items();
        for &base in &bases {
            self.state.claim(base, Side::Bottom);
        }
        bases
    }

    fn is_cancelled(&self) -> bool {
        self.done.as_ref().is_some_and(|done| done.is_done())
    }

    async fn wait_cancelled(&self) {
        match &self.done {
            Some(done) => done.cancelled().await,
            None => std::future::pending().await,
        }
    }

    async fn run_tiered(self: &Arc<Self>) -> Termination {
        let catalog = self.state.catalog();
        self.seed();
        if catalog.item(self.target).is_base() {
            return Termination::TargetReached;
        }

        let target_tier = catalog.tier(self.target);
        let (tx, mut rx) = mpsc::channel::<ItemId>(self.result_capacity);

        // Tiers without recipes are skipped by the index.
        for (tier, candidates) in catalog.result_tiers_through(target_tier) {
            if self.is_cancelled() {
                log::debug!("Bottom-up cancelled before tier {tier}");
                return Termination::Cancelled;
            }
            log::debug!("Tier {tier}: {} candidate recipes", candidates.len());

            let chunk_size = candidates.len().div_ceil(self.workers);
            let mut workers = JoinSet::new();
            for (worker, chunk) in candidates.chunks(chunk_size).enumerate() {
                let engine = Arc::clone(self);
                let chunk = chunk.to_vec();
                let tx = tx.clone();
                workers.spawn(async move { engine.sweep(worker, chunk, tx).await });
            }

            let mut discovered = 0usize;
            loop {
                tokio::select! {
                    biased;
                    _ = self.wait_cancelled() => {
                        // Workers observe the same signal and stop at their next checkpoint.
                        while workers.join_next().await.is_some() {}
                        return Termination::Cancelled;
                    }
                    Some(item) = rx.recv() => {
                        discovered += 1;
                        if item == self.target {
                            log::info!(
                                "Bottom-up reached {} at tier {tier}",
                                catalog.name(item)
                            );
                            workers.shutdown().await;
                            return Termination::TargetReached;
                        }
                    }
                    joined = workers.join_next(), if !workers.is_empty() => {
                        if let Some(Err(err)) = joined {
                            log::warn!("Bottom-up worker failed: {err}");
                        }
                    }
                    _ = tokio::time::sleep(self.drain_idle), if workers.is_empty() => break,
                }
            }
            log::debug!("Tier {tier} drained, {discovered} new items");
        }

        Termination::TiersExhausted
    }

    async fn sweep(&self, worker: usize, recipes: Vec<RecipeId>, tx: mpsc::Sender<ItemId>) {
        let catalog = self.state.catalog();
        for recipe in recipes {
            if self.is_cancelled() {
                log::debug!("[worker {worker}] cancelled");
                return;
            }
            if !catalog.is_well_formed(recipe) {
                self.skip_malformed(recipe);
                continue;
            }
            let Some(item) = self.state.admit_forward(recipe, self.target, Side::Bottom) else {
                continue;
            };
            log::debug!(
                "[worker {worker}] discovered {} (tier {})",
                catalog.name(item),
                catalog.tier(item)
            );

            tokio::select! {
                biased;
                _ = self.wait_cancelled() => return,
                sent = tx.send(item) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }

    /// Forward walk from the base items through the recipes consuming them
    pub fn run_depth_first(&self) -> Termination {
        let catalog = self.state.catalog();
        let mut stack = self.seed();

        while let Some(current) = stack.pop() {
            if self.is_cancelled() {
                return Termination::Cancelled;
            }
            if current == self.target {
                log::info!("Bottom-up reached {}", catalog.name(current));
                return Termination::TargetReached;
            }

            for &recipe in catalog.consumers_of(current) {
                if !catalog.is_well_formed(recipe) {
                    self.skip_malformed(recipe);
                    continue;
                }
                if let Some(result) = self.state.admit_forward(recipe, self.target, Side::Bottom)
                {
                    log::debug!(
                        "Discovered {} (tier {}) from {}",
                        catalog.name(result),
                        catalog.tier(result),
                        catalog.name(current)
                    );
                    stack.push(result);
                }
            }
        }

        Termination::TiersExhausted
    }

    fn skip_malformed(&self, recipe: RecipeId) {
        let catalog = self.state.catalog();
        if let Some(defect) = catalog.defect(recipe) {
            let result = catalog.recipe(recipe).result;
            log::debug!("Skipping recipe for {}: {defect}", catalog.name(result));
        }
        self.state.record_malformed_skip();
    }
}
